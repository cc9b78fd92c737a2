//! CAV Ledger: local registration ledger
//!
//! A hash-chained, proof-of-work ledger held in memory. Each block records a
//! content hash signed by its creator's ed25519 identity.
//! [`LedgerRegistrar`] exposes it as a registration `ResultProvider`.

pub mod block;
pub mod chain;
pub mod identity;
pub mod registrar;
pub mod report;

pub use block::Block;
pub use chain::Ledger;
pub use identity::{verify_signature, CreatorIdentity, IdentityRegistry};
pub use registrar::LedgerRegistrar;
pub use report::{RegistrationRecord, ReportStatus, VerificationReport};

/// Content hash in the form used across the ledger: `0x` + blake3 hex.
pub fn digest(content: &str) -> String {
    format!("0x{}", blake3::hash(content.as_bytes()).to_hex())
}
