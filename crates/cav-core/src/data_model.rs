//! Data Model: OperationInput, OperationState, OperationResult
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Length of the hex digest carried by content and transaction hashes.
pub const HASH_HEX_LEN: usize = 64;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationInput {
    /// Opaque reference to the selected content (URI, file path, picker id)
    #[serde(default)]
    pub content_ref: Option<String>,
    #[serde(default)]
    pub creator_name: String,
    #[serde(default)]
    pub creator_email: String,
    #[serde(default)]
    pub description: String,
    /// Network identifier selected for registration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
}

impl OperationInput {
    pub fn new(content_ref: impl Into<String>) -> Self {
        Self {
            content_ref: Some(content_ref.into()),
            ..Self::default()
        }
    }

    pub fn with_creator(mut self, name: impl Into<String>, email: impl Into<String>) -> Self {
        self.creator_name = name.into();
        self.creator_email = email.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_network(mut self, network: impl Into<String>) -> Self {
        self.network = Some(network.into());
        self
    }

    /// The content reference, or `None` when it is missing or blank.
    pub fn content(&self) -> Option<&str> {
        self.content_ref
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum OperationState {
    Idle,
    Running { progress: u8 },
    Complete { result: OperationResult },
}

impl OperationState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running { .. })
    }

    pub fn progress(&self) -> Option<u8> {
        match self {
            Self::Running { progress } => Some(*progress),
            Self::Complete { .. } => Some(100),
            Self::Idle => None,
        }
    }

    pub fn result(&self) -> Option<&OperationResult> {
        match self {
            Self::Complete { result } => Some(result),
            _ => None,
        }
    }

    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running { .. } => "running",
            Self::Complete { .. } => "complete",
        }
    }
}

impl Default for OperationState {
    fn default() -> Self {
        Self::Idle
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum OperationResult {
    Verification(VerificationResult),
    Registration(RegistrationResult),
}

impl OperationResult {
    pub fn content_hash(&self) -> &str {
        match self {
            Self::Verification(v) => &v.content_hash,
            Self::Registration(r) => &r.content_hash,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Verification(v) => v.timestamp,
            Self::Registration(r) => r.timestamp,
        }
    }

    pub fn as_verification(&self) -> Option<&VerificationResult> {
        match self {
            Self::Verification(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_registration(&self) -> Option<&RegistrationResult> {
        match self {
            Self::Registration(r) => Some(r),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    /// Authenticity score in [0, 1]
    pub authenticity_score: f64,
    pub is_ai_generated: bool,
    pub is_tampered: bool,
    pub signals: Vec<DetectionSignal>,
    /// Findings for signals scoring above 0.5
    #[serde(default)]
    pub evidence: Vec<String>,
    pub content_hash: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionSignal {
    pub name: String,
    pub score: f64,
    pub confidence: ConfidenceLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    High,
    Medium,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResult {
    pub content_hash: String,
    pub transaction_hash: String,
    pub block_number: u64,
    pub timestamp: DateTime<Utc>,
    pub network: String,
    pub creator_name: String,
    pub status: RegistrationStatus,
    /// Decimal string, e.g. "0.002310"
    pub fee: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Confirmed,
}

/// Checks the `0x` + 64 lowercase hex shape shared by content and transaction hashes.
pub fn is_hex_hash(value: &str) -> bool {
    match value.strip_prefix("0x") {
        Some(digits) => {
            digits.len() == HASH_HEX_LEN
                && digits
                    .chars()
                    .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        }
        None => false,
    }
}
