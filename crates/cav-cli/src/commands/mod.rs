//! CLI command definitions and the shared operation runner.

pub mod register;
pub mod verify;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use cav_core::{CavError, EngineConfig, OperationInput, OperationResult, OperationState, ResultProvider};
use cav_engine::{ManualTicker, Operation, TokioTicker};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use crate::output::ProgressPrinter;

/// Content authenticity verification and registration
#[derive(Parser)]
#[command(name = "cav")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// YAML configuration file (defaults to $CAV_CONFIG)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Run on virtual time and finish immediately
    #[arg(long, global = true)]
    pub instant: bool,

    /// Seed for simulated results
    #[arg(long, global = true, value_name = "N")]
    pub seed: Option<u64>,

    /// Suppress progress output
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check content for AI generation and tampering
    Verify(verify::VerifyArgs),
    /// Register content on a network or the local ledger
    Register(register::RegisterArgs),
}

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    Error = 1,
    InvalidInput = 2,
}

impl ExitCode {
    pub fn from_error(error: &anyhow::Error) -> Self {
        match error.downcast_ref::<CavError>() {
            Some(e) if e.is_input_error() => Self::InvalidInput,
            _ => Self::Error,
        }
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code as u8)
    }
}

/// `--config` takes the place of `$CAV_CONFIG`; env overrides still apply.
pub fn load_config(global: &GlobalArgs) -> Result<EngineConfig> {
    let config = match &global.config {
        Some(path) => {
            let path = path.to_string_lossy().into_owned();
            EngineConfig::from_lookup(|key| {
                if key == "CAV_CONFIG" {
                    Some(path.clone())
                } else {
                    std::env::var(key).ok()
                }
            })
        }
        None => EngineConfig::from_env(),
    };
    config.context("loading configuration")
}

/// Drive one operation to completion and return its result.
pub async fn run_operation<P>(
    provider: P,
    config: &EngineConfig,
    input: OperationInput,
    global: &GlobalArgs,
) -> Result<OperationResult>
where
    P: ResultProvider + 'static,
{
    let kind = provider.kind();
    let profile = config.profile(kind);
    let manual = ManualTicker::new();
    let ticker: Arc<dyn cav_engine::Ticker> = if global.instant {
        Arc::new(manual.clone())
    } else {
        Arc::new(TokioTicker::current()?)
    };

    let op = Operation::new(provider, ticker).with_profile(profile)?;
    if !global.quiet {
        op.observe(Arc::new(ProgressPrinter::new(kind)));
    }
    info!(operation_id = %op.id(), %kind, instant = global.instant, "Running operation");

    op.start(input)?;

    if global.instant {
        manual.run_until_idle(profile.ticks_to_complete() as usize);
        let snapshot = op.snapshot();
        return match snapshot.state {
            OperationState::Complete { result } => Ok(result),
            _ => Err(snapshot
                .failure
                .unwrap_or_else(|| CavError::InvalidTransition("operation did not complete".to_string()))
                .into()),
        };
    }

    tokio::select! {
        result = op.wait_for_completion() => Ok(result?),
        _ = tokio::signal::ctrl_c() => {
            op.reset();
            Err(CavError::CancelledError.into())
        }
    }
}
