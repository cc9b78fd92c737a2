//! Operation kinds, input validation, and progress profiles
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::data_model::OperationInput;
use crate::error::CavError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Verification,
    Registration,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Verification => "verification",
            Self::Registration => "registration",
        }
    }

    /// Checks `input` before an operation of this kind may start.
    ///
    /// Content presence is checked first; a registration missing both its
    /// content and its creator fields reports `InvalidInputError`.
    pub fn validate(&self, input: &OperationInput) -> Result<(), CavError> {
        if input.content().is_none() {
            return Err(CavError::InvalidInputError);
        }

        let missing = self.missing_fields(input);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(CavError::MissingFieldsError(missing))
        }
    }

    fn missing_fields(&self, input: &OperationInput) -> Vec<String> {
        match self {
            Self::Verification => Vec::new(),
            Self::Registration => [
                ("creatorName", &input.creator_name),
                ("creatorEmail", &input.creator_email),
            ]
            .into_iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| name.to_string())
            .collect(),
        }
    }

    pub fn default_profile(&self) -> ProgressProfile {
        match self {
            Self::Verification => ProgressProfile::new(10, Duration::from_millis(200)),
            Self::Registration => ProgressProfile::new(5, Duration::from_millis(150)),
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cadence of the progress emitter: `step` percentage points every `period`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressProfile {
    pub step: u8,
    pub period: Duration,
}

impl ProgressProfile {
    pub const fn new(step: u8, period: Duration) -> Self {
        Self { step, period }
    }

    pub fn validate(&self) -> Result<(), CavError> {
        if self.step == 0 || self.step > 100 {
            return Err(CavError::ConfigError(format!(
                "step must be in 1..=100, got {}",
                self.step
            )));
        }
        if self.period.is_zero() {
            return Err(CavError::ConfigError("period must be non-zero".to_string()));
        }
        Ok(())
    }

    /// Number of ticks needed to go from 0 to 100.
    pub fn ticks_to_complete(&self) -> u32 {
        let step = u32::from(self.step.max(1));
        (100 + step - 1) / step
    }

    /// Progress after one more tick, clamped to 100.
    pub fn advance(&self, progress: u8) -> u8 {
        progress.saturating_add(self.step).min(100)
    }
}
