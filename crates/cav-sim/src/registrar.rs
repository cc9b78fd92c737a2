//! Simulated registration on a public network.
use cav_core::{
    CavError, OperationContext, OperationInput, OperationKind, OperationResult,
    RegistrationResult, RegistrationStatus, ResultProvider, SimulationConfig,
};
use chrono::Utc;
use rand::Rng;
use tracing::debug;

use crate::hashing::{content_hash, random_hash};
use crate::SimRng;

pub const BLOCK_RANGE: std::ops::Range<u64> = 18_000_000..19_000_000;

/// Fee bounds in millionths of a coin: `[0.0005, 0.0050)`.
const FEE_MICROS: std::ops::Range<u64> = 500..5_000;

pub struct SimulatedRegistrar {
    config: SimulationConfig,
    rng: SimRng,
}

impl SimulatedRegistrar {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            rng: SimRng::from_entropy(),
        }
    }

    pub fn with_seed(config: SimulationConfig, seed: u64) -> Self {
        Self {
            config,
            rng: SimRng::seeded(seed),
        }
    }

    /// The requested network if it is one we simulate, else the default.
    pub fn resolve_network(&self, requested: Option<&str>) -> Result<String, CavError> {
        let requested = requested.map(str::trim).filter(|n| !n.is_empty());
        match requested {
            None => Ok(self.config.default_network.clone()),
            Some(name) => self
                .config
                .networks
                .iter()
                .find(|n| n.eq_ignore_ascii_case(name))
                .cloned()
                .ok_or_else(|| CavError::ProviderError(format!("unknown network '{name}'"))),
        }
    }
}

fn format_fee(micros: u64) -> String {
    format!("{}.{:06}", micros / 1_000_000, micros % 1_000_000)
}

impl ResultProvider for SimulatedRegistrar {
    fn kind(&self) -> OperationKind {
        OperationKind::Registration
    }

    fn id(&self) -> &'static str {
        "sim.registrar"
    }

    fn generate(
        &self,
        input: &OperationInput,
        ctx: &OperationContext,
    ) -> Result<OperationResult, CavError> {
        let content = input.content().ok_or(CavError::InvalidInputError)?;
        let network = self.resolve_network(input.network.as_deref())?;
        let mut rng = self.rng.lock();

        let content_hash = content_hash(self.config.hash_mode, content, &mut *rng);
        let transaction_hash = random_hash(&mut *rng);
        let block_number = rng.gen_range(BLOCK_RANGE);
        let fee = format_fee(rng.gen_range(FEE_MICROS));

        debug!(
            operation_id = %ctx.operation_id,
            generation = ctx.generation,
            network = %network,
            block_number,
            "Simulated registration"
        );

        Ok(OperationResult::Registration(RegistrationResult {
            content_hash,
            transaction_hash,
            block_number,
            timestamp: Utc::now(),
            network,
            creator_name: input.creator_name.trim().to_string(),
            status: RegistrationStatus::Confirmed,
            fee,
        }))
    }
}
