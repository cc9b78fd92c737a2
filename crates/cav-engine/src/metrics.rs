//! Prometheus counters for operation lifecycles.
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

use crate::observer::OperationEvent;

#[derive(Clone)]
pub struct EngineMetrics {
    registry: Registry,
    started: IntCounterVec,
    completed: IntCounterVec,
    cancelled: IntCounterVec,
    failed: IntCounterVec,
}

impl EngineMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        Self::with_registry(Registry::new())
    }

    pub fn with_registry(registry: Registry) -> Result<Self, prometheus::Error> {
        let counter = |name: &str, help: &str| -> Result<IntCounterVec, prometheus::Error> {
            let c = IntCounterVec::new(Opts::new(name, help), &["kind"])?;
            registry.register(Box::new(c.clone()))?;
            Ok(c)
        };

        Ok(Self {
            started: counter("cav_operations_started_total", "Operations started")?,
            completed: counter("cav_operations_completed_total", "Operations completed")?,
            cancelled: counter("cav_operations_cancelled_total", "Operations reset while running")?,
            failed: counter("cav_operations_failed_total", "Operations whose provider failed")?,
            registry,
        })
    }

    pub(crate) fn record(&self, kind: &str, event: &OperationEvent) {
        let counter = match event {
            OperationEvent::Started { .. } => &self.started,
            OperationEvent::Completed { .. } => &self.completed,
            OperationEvent::Cancelled { .. } => &self.cancelled,
            OperationEvent::Failed { .. } => &self.failed,
            OperationEvent::Progress { .. } | OperationEvent::Reset => return,
        };
        counter.with_label_values(&[kind]).inc();
    }

    pub fn started(&self, kind: &str) -> u64 {
        self.started.with_label_values(&[kind]).get()
    }

    pub fn completed(&self, kind: &str) -> u64 {
        self.completed.with_label_values(&[kind]).get()
    }

    pub fn cancelled(&self, kind: &str) -> u64 {
        self.cancelled.with_label_values(&[kind]).get()
    }

    pub fn failed(&self, kind: &str) -> u64 {
        self.failed.with_label_values(&[kind]).get()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Text exposition format of every registered metric.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).to_string())
    }
}
