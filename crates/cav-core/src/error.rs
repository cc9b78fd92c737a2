//! Unified Error Model
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CavError {
    /// No content reference was supplied.
    #[error("INPUT/no content selected")]
    InvalidInputError,

    /// Operation-specific text fields are blank.
    #[error("INPUT/missing required fields: {}", .0.join(", "))]
    MissingFieldsError(Vec<String>),

    /// The operation was reset while running. Informational.
    #[error("OP/cancelled")]
    CancelledError,

    #[error("OP/{0}")]
    InvalidTransition(String),

    #[error("PROVIDER/{0}")]
    ProviderError(String),

    #[error("SCHED/{0}")]
    SchedulerError(String),

    #[error("CONFIG/{0}")]
    ConfigError(String),

    #[error("LEDGER/{0}")]
    LedgerError(String),
}

impl CavError {
    /// True for errors caused by what the caller supplied to `start()`.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::InvalidInputError | Self::MissingFieldsError(_))
    }
}
