//! Operation Context: identity of one run, handed to the result provider
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::operation::OperationKind;

#[derive(Debug, Clone)]
pub struct OperationContext {
    /// Stable id of the owning operation instance
    pub operation_id: Uuid,
    pub kind: OperationKind,
    /// Incremented on every `start()`; used to discard stale work
    pub generation: u64,
    /// When `start()` was accepted. Results carry their own generation time.
    pub requested_at: DateTime<Utc>,
}

impl OperationContext {
    pub fn new(operation_id: Uuid, kind: OperationKind, generation: u64) -> Self {
        Self {
            operation_id,
            kind,
            generation,
            requested_at: Utc::now(),
        }
    }

    /// Context for calling a provider outside of an engine (tests, tools).
    pub fn detached(kind: OperationKind) -> Self {
        Self::new(Uuid::new_v4(), kind, 1)
    }
}
