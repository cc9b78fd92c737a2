//! Terminal output: progress on stderr, results as JSON on stdout.
use std::io::Write;

use anyhow::Result;
use cav_core::{OperationKind, OperationResult};
use cav_engine::{OperationEvent, OperationObserver};

/// Prints one line per transition to stderr.
pub struct ProgressPrinter {
    kind: OperationKind,
}

impl ProgressPrinter {
    pub fn new(kind: OperationKind) -> Self {
        Self { kind }
    }
}

impl OperationObserver for ProgressPrinter {
    fn on_event(&self, event: &OperationEvent) {
        let kind = self.kind;
        match event {
            OperationEvent::Started { .. } => eprintln!("{kind}: started"),
            OperationEvent::Progress { progress } => eprintln!("{kind}: {progress:>3}%"),
            OperationEvent::Completed { .. } => eprintln!("{kind}: complete"),
            OperationEvent::Cancelled { progress } => {
                eprintln!("{kind}: cancelled at {progress}%")
            }
            OperationEvent::Reset => eprintln!("{kind}: reset"),
            OperationEvent::Failed { error } => eprintln!("{kind}: failed: {error}"),
        }
    }
}

pub fn print_result(result: &OperationResult) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, result)?;
    writeln!(out)?;
    Ok(())
}
