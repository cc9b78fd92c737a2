//! `cav register`
use anyhow::Result;
use cav_core::{OperationInput, OperationResult};
use cav_ledger::LedgerRegistrar;
use cav_sim::SimulatedRegistrar;
use clap::Args;

use super::{load_config, run_operation, GlobalArgs};

#[derive(Args, Debug, Clone)]
pub struct RegisterArgs {
    /// Reference to the content to register
    #[arg(value_name = "CONTENT_REF", default_value = "")]
    pub content_ref: String,

    /// Creator name recorded with the registration
    #[arg(long, value_name = "NAME", default_value = "")]
    pub creator: String,

    /// Creator contact email
    #[arg(long, value_name = "EMAIL", default_value = "")]
    pub email: String,

    #[arg(long)]
    pub description: Option<String>,

    /// Target network (defaults to the configured default network)
    #[arg(long, value_name = "NETWORK")]
    pub network: Option<String>,

    /// Record in a local signed ledger instead of a simulated network
    #[arg(long, conflicts_with = "network")]
    pub ledger: bool,
}

impl RegisterArgs {
    fn input(&self) -> OperationInput {
        let mut input =
            OperationInput::new(&self.content_ref).with_creator(&self.creator, &self.email);
        if let Some(description) = &self.description {
            input = input.with_description(description);
        }
        if let Some(network) = &self.network {
            input = input.with_network(network);
        }
        input
    }
}

pub async fn run(global: &GlobalArgs, args: &RegisterArgs) -> Result<OperationResult> {
    let config = load_config(global)?;
    let input = args.input();

    if args.ledger {
        let registrar = LedgerRegistrar::new(&config.ledger);
        return run_operation(registrar, &config, input, global).await;
    }

    let registrar = match global.seed {
        Some(seed) => SimulatedRegistrar::with_seed(config.simulation.clone(), seed),
        None => SimulatedRegistrar::new(config.simulation.clone()),
    };
    run_operation(registrar, &config, input, global).await
}
