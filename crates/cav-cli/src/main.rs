//! cav: verify or register content from the command line.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod output;

use commands::{Cli, Commands, ExitCode};

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over -v when set.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match cli.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        })
    });
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let outcome = match &cli.command {
        Commands::Verify(args) => commands::verify::run(&cli.global, args).await,
        Commands::Register(args) => commands::register::run(&cli.global, args).await,
    };

    let code = match outcome {
        Ok(result) => match output::print_result(&result) {
            Ok(()) => ExitCode::Success,
            Err(e) => {
                eprintln!("error: {e:#}");
                ExitCode::Error
            }
        },
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from_error(&e)
        }
    };
    code.into()
}
