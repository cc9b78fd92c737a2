//! Transition events for presentation collaborators.

use std::sync::{Arc, Mutex, PoisonError};

use cav_core::{CavError, OperationResult};

/// One observable transition of an operation.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationEvent {
    /// Idle → Running(0)
    Started { generation: u64 },
    /// Running → Running
    Progress { progress: u8 },
    /// Running(100) → Complete
    Completed { result: OperationResult },
    /// Running → Idle via `reset()`
    Cancelled { progress: u8 },
    /// Complete → Idle via `reset()`
    Reset,
    /// The result provider failed; the operation is back at Idle
    Failed { error: CavError },
}

impl OperationEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Started { .. } => "started",
            Self::Progress { .. } => "progress",
            Self::Completed { .. } => "completed",
            Self::Cancelled { .. } => "cancelled",
            Self::Reset => "reset",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Receives every transition in order.
///
/// Called while the operation holds its state lock: implementations must
/// return quickly and must not call back into the same operation.
pub trait OperationObserver: Send + Sync {
    fn on_event(&self, event: &OperationEvent);
}

impl<F> OperationObserver for F
where
    F: Fn(&OperationEvent) + Send + Sync,
{
    fn on_event(&self, event: &OperationEvent) {
        self(event)
    }
}

/// Observer that keeps every event it sees.
#[derive(Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<OperationEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<OperationEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Progress values in emission order.
    pub fn progress_values(&self) -> Vec<u8> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                OperationEvent::Progress { progress } => Some(progress),
                _ => None,
            })
            .collect()
    }

    pub fn completions(&self) -> Vec<OperationResult> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                OperationEvent::Completed { result } => Some(result),
                _ => None,
            })
            .collect()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.events().iter().map(OperationEvent::name).collect()
    }
}

impl OperationObserver for EventLog {
    fn on_event(&self, event: &OperationEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}
