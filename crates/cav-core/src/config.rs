//! Engine configuration
//!
//! Loaded from YAML. Every key is optional and falls back to the defaults
//! below. Environment variables override file values:
//!
//! - `CAV_CONFIG`: path of the YAML file
//! - `CAV_VERIFY_STEP`, `CAV_VERIFY_PERIOD_MS`
//! - `CAV_REGISTER_STEP`, `CAV_REGISTER_PERIOD_MS`
//! - `CAV_HASH_MODE` (`digest` | `random`)

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info};

use crate::error::CavError;
use crate::operation::{OperationKind, ProgressProfile};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    #[serde(deserialize_with = "verification_cadence")]
    pub verification: CadenceConfig,
    #[serde(deserialize_with = "registration_cadence")]
    pub registration: CadenceConfig,
    pub simulation: SimulationConfig,
    pub ledger: LedgerConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            verification: CadenceConfig::from_profile(
                OperationKind::Verification.default_profile(),
            ),
            registration: CadenceConfig::from_profile(
                OperationKind::Registration.default_profile(),
            ),
            simulation: SimulationConfig::default(),
            ledger: LedgerConfig::default(),
        }
    }
}

/// Progress cadence as written in config files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CadenceConfig {
    pub step: u8,
    pub period_ms: u64,
}

impl CadenceConfig {
    fn from_profile(profile: ProgressProfile) -> Self {
        Self {
            step: profile.step,
            period_ms: profile.period.as_millis() as u64,
        }
    }

    pub fn profile(&self) -> ProgressProfile {
        ProgressProfile::new(self.step, Duration::from_millis(self.period_ms))
    }
}

/// A cadence section as written; absent keys come from the kind's profile.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CadenceSection {
    step: Option<u8>,
    period_ms: Option<u64>,
}

impl CadenceSection {
    fn merge(self, kind: OperationKind) -> CadenceConfig {
        let base = CadenceConfig::from_profile(kind.default_profile());
        CadenceConfig {
            step: self.step.unwrap_or(base.step),
            period_ms: self.period_ms.unwrap_or(base.period_ms),
        }
    }
}

fn verification_cadence<'de, D: Deserializer<'de>>(d: D) -> Result<CadenceConfig, D::Error> {
    CadenceSection::deserialize(d).map(|c| c.merge(OperationKind::Verification))
}

fn registration_cadence<'de, D: Deserializer<'de>>(d: D) -> Result<CadenceConfig, D::Error> {
    CadenceSection::deserialize(d).map(|c| c.merge(OperationKind::Registration))
}

/// How simulated results derive their content hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashMode {
    /// blake3 digest of the content reference
    #[default]
    Digest,
    /// 64 random hex characters, unrelated to the content
    Random,
}

impl std::str::FromStr for HashMode {
    type Err = CavError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "digest" => Ok(Self::Digest),
            "random" => Ok(Self::Random),
            other => Err(CavError::ConfigError(format!("unknown hash mode '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub hash_mode: HashMode,
    /// Probability that a verification flags the content as AI-generated
    pub ai_probability: f64,
    /// Probability that a verification flags the content as tampered
    pub tamper_probability: f64,
    /// Signal scores at or above this are reported with high confidence
    pub high_confidence_threshold: f64,
    pub networks: Vec<String>,
    pub default_network: String,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            hash_mode: HashMode::Digest,
            ai_probability: 0.2,
            tamper_probability: 0.1,
            high_confidence_threshold: 0.7,
            networks: vec![
                "ethereum".to_string(),
                "polygon".to_string(),
                "solana".to_string(),
            ],
            default_network: "ethereum".to_string(),
        }
    }
}

/// Proof-of-work beyond this many leading zeros takes minutes per block.
pub const MAX_LEDGER_DIFFICULTY: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Leading hex zeros required of a block hash
    pub difficulty: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self { difficulty: 2 }
    }
}

impl EngineConfig {
    /// Parse a YAML document.
    pub fn from_yaml(text: &str) -> Result<Self, CavError> {
        // An empty document deserializes to unit, not to a mapping.
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(|e| CavError::ConfigError(e.to_string()))
    }

    /// Load and validate a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CavError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| CavError::ConfigError(format!("{}: {e}", path.display())))?;
        let config = Self::from_yaml(&text)?;
        config.validate()?;
        info!(path = %path.display(), "Loaded engine config");
        Ok(config)
    }

    /// Defaults, then the file named by `CAV_CONFIG`, then single-value overrides.
    pub fn from_env() -> Result<Self, CavError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same layering as [`EngineConfig::from_env`] with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CavError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup("CAV_CONFIG") {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_overrides(lookup)?;
        config.validate()?;
        Ok(config)
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), CavError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("CAV_VERIFY_STEP") {
            self.verification.step = parse_var("CAV_VERIFY_STEP", &v)?;
        }
        if let Some(v) = lookup("CAV_VERIFY_PERIOD_MS") {
            self.verification.period_ms = parse_var("CAV_VERIFY_PERIOD_MS", &v)?;
        }
        if let Some(v) = lookup("CAV_REGISTER_STEP") {
            self.registration.step = parse_var("CAV_REGISTER_STEP", &v)?;
        }
        if let Some(v) = lookup("CAV_REGISTER_PERIOD_MS") {
            self.registration.period_ms = parse_var("CAV_REGISTER_PERIOD_MS", &v)?;
        }
        if let Some(v) = lookup("CAV_HASH_MODE") {
            self.simulation.hash_mode = v.parse()?;
        }
        debug!(config = ?self, "Applied environment overrides");
        Ok(())
    }

    pub fn validate(&self) -> Result<(), CavError> {
        self.verification.profile().validate()?;
        self.registration.profile().validate()?;

        let sim = &self.simulation;
        for (name, p) in [
            ("ai_probability", sim.ai_probability),
            ("tamper_probability", sim.tamper_probability),
            ("high_confidence_threshold", sim.high_confidence_threshold),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(CavError::ConfigError(format!(
                    "{name} must be in 0.0..=1.0, got {p}"
                )));
            }
        }
        if sim.networks.is_empty() {
            return Err(CavError::ConfigError("networks must not be empty".to_string()));
        }
        if !sim.networks.contains(&sim.default_network) {
            return Err(CavError::ConfigError(format!(
                "default network '{}' is not in networks",
                sim.default_network
            )));
        }
        if self.ledger.difficulty > MAX_LEDGER_DIFFICULTY {
            return Err(CavError::ConfigError(format!(
                "ledger difficulty must be at most {MAX_LEDGER_DIFFICULTY}, got {}",
                self.ledger.difficulty
            )));
        }
        Ok(())
    }

    /// Cadence for operations of `kind`.
    pub fn profile(&self, kind: OperationKind) -> ProgressProfile {
        match kind {
            OperationKind::Verification => self.verification.profile(),
            OperationKind::Registration => self.registration.profile(),
        }
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, CavError> {
    value
        .trim()
        .parse()
        .map_err(|_| CavError::ConfigError(format!("{key}: invalid value '{value}'")))
}
