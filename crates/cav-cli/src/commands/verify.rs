//! `cav verify`
use anyhow::Result;
use cav_core::{OperationInput, OperationResult};
use cav_sim::SimulatedVerifier;
use clap::Args;

use super::{load_config, run_operation, GlobalArgs};

#[derive(Args, Debug, Clone)]
pub struct VerifyArgs {
    /// Reference to the content to verify (path, URL, or id)
    #[arg(value_name = "CONTENT_REF", default_value = "")]
    pub content_ref: String,
}

pub async fn run(global: &GlobalArgs, args: &VerifyArgs) -> Result<OperationResult> {
    let config = load_config(global)?;
    let verifier = match global.seed {
        Some(seed) => SimulatedVerifier::with_seed(config.simulation.clone(), seed),
        None => SimulatedVerifier::new(config.simulation.clone()),
    };
    run_operation(verifier, &config, OperationInput::new(&args.content_ref), global).await
}
