//! CAV Engine: operation state machine and progress emitter
//!
//! An [`Operation`] drives one verification or registration through
//! `Idle → Running(0..=100) → Complete` on a [`Ticker`], and asks its
//! `ResultProvider` for a result exactly once per run.

pub mod machine;
pub mod manual;
pub mod metrics;
pub mod observer;
pub mod ticker;

pub use machine::{Operation, Snapshot};
pub use manual::ManualTicker;
pub use metrics::EngineMetrics;
pub use observer::{EventLog, OperationEvent, OperationObserver};
pub use ticker::{TickCallback, TickControl, Ticker, TokioTicker};
