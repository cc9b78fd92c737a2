//! CAV Core: data model, errors, and the ResultProvider contract
//!
//! Shared vocabulary for content authenticity operations (verification and
//! registration). The engine that drives operations lives in `cav-engine`;
//! result generators live in `cav-sim` and `cav-ledger`.

pub mod config;
pub mod context;
pub mod data_model;
pub mod error;
pub mod operation;
pub mod provider;

pub use config::{EngineConfig, HashMode, LedgerConfig, SimulationConfig, MAX_LEDGER_DIFFICULTY};
pub use context::OperationContext;
pub use data_model::{
    is_hex_hash, ConfidenceLevel, DetectionSignal, OperationInput, OperationResult,
    OperationState, RegistrationResult, RegistrationStatus, VerificationResult,
};
pub use error::CavError;
pub use operation::{OperationKind, ProgressProfile};
pub use provider::ResultProvider;

/// Version of the CAV engine
pub const CAV_VERSION: &str = "1.0.0";
