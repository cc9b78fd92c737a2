//! ResultProvider: the one contract every result source implements
use crate::context::OperationContext;
use crate::data_model::{OperationInput, OperationResult};
use crate::error::CavError;
use crate::operation::OperationKind;

/// Produces the terminal payload of an operation.
///
/// The engine calls `generate` exactly once per run, at the moment progress
/// reaches 100. Simulated generators and real detector or ledger clients
/// sit behind the same trait.
///
/// `generate` is synchronous and runs on the tick source's thread. The tokio
/// ticker moves it off the async worker with `block_in_place` on multi-thread
/// runtimes; on a current-thread runtime it blocks the runtime until it
/// returns, so keep the work bounded there.
pub trait ResultProvider: Send + Sync {
    /// Which operation this provider serves. Drives validation and cadence.
    fn kind(&self) -> OperationKind;

    /// Short identifier used in logs (ex: "sim.verification.v1")
    fn id(&self) -> &'static str;

    fn generate(
        &self,
        input: &OperationInput,
        ctx: &OperationContext,
    ) -> Result<OperationResult, CavError>;
}

impl<P: ResultProvider + ?Sized> ResultProvider for std::sync::Arc<P> {
    fn kind(&self) -> OperationKind {
        (**self).kind()
    }

    fn id(&self) -> &'static str {
        (**self).id()
    }

    fn generate(
        &self,
        input: &OperationInput,
        ctx: &OperationContext,
    ) -> Result<OperationResult, CavError> {
        (**self).generate(input, ctx)
    }
}
