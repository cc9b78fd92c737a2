//! Registration against the local ledger.
use std::sync::{Mutex, MutexGuard, PoisonError};

use cav_core::{
    CavError, LedgerConfig, OperationContext, OperationInput, OperationKind, OperationResult,
    RegistrationResult, RegistrationStatus, ResultProvider,
};
use tracing::info;

use crate::chain::Ledger;
use crate::identity::IdentityRegistry;
use crate::report::VerificationReport;

pub const LOCAL_NETWORK: &str = "local";
pub const LOCAL_FEE: &str = "0.000000";

/// `ResultProvider` that records registrations as signed ledger blocks.
///
/// Deterministic apart from block timestamps: the same content registered
/// twice is rejected instead of producing a second receipt.
pub struct LedgerRegistrar {
    state: Mutex<State>,
}

struct State {
    ledger: Ledger,
    identities: IdentityRegistry,
}

impl LedgerRegistrar {
    pub fn new(config: &LedgerConfig) -> Self {
        Self::with_parts(Ledger::from_config(config), IdentityRegistry::new())
    }

    pub fn with_parts(ledger: Ledger, identities: IdentityRegistry) -> Self {
        Self {
            state: Mutex::new(State { ledger, identities }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Provenance report for a content reference.
    pub fn verification_report(&self, content: &str) -> VerificationReport {
        self.lock()
            .ledger
            .verification_report(&crate::digest(content.trim()))
    }

    /// Snapshot of the chain as it stands.
    pub fn ledger(&self) -> Ledger {
        self.lock().ledger.clone()
    }

    /// Public key of a creator seen by this registrar.
    pub fn creator_public_key(&self, name: &str) -> Option<String> {
        self.lock().identities.get(name).map(|i| i.public_key_hex())
    }
}

impl ResultProvider for LedgerRegistrar {
    fn kind(&self) -> OperationKind {
        OperationKind::Registration
    }

    fn id(&self) -> &'static str {
        "ledger.registrar"
    }

    fn generate(
        &self,
        input: &OperationInput,
        ctx: &OperationContext,
    ) -> Result<OperationResult, CavError> {
        let content = input.content().ok_or(CavError::InvalidInputError)?;
        let creator = input.creator_name.trim();
        if creator.is_empty() {
            return Err(CavError::MissingFieldsError(vec!["creatorName".to_string()]));
        }
        let content_hash = crate::digest(content);

        let mut state = self.lock();
        let State { ledger, identities } = &mut *state;
        let identity = identities.identity_for(creator);
        let signature = identity.sign(content_hash.as_bytes());
        let block = ledger.append(&content_hash, &identity.public_key_hex(), &signature)?;

        info!(
            operation_id = %ctx.operation_id,
            block = block.index,
            creator,
            "Registered content in local ledger"
        );

        Ok(OperationResult::Registration(RegistrationResult {
            content_hash,
            transaction_hash: format!("0x{}", block.hash),
            block_number: block.index,
            timestamp: block.timestamp,
            network: LOCAL_NETWORK.to_string(),
            creator_name: creator.to_string(),
            status: RegistrationStatus::Confirmed,
            fee: LOCAL_FEE.to_string(),
        }))
    }
}
