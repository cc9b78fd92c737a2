//! Operation State Machine
//!
//! `Idle → Running(0) → … → Running(100) → Complete`, with `reset()` back to
//! `Idle` from anywhere. One [`Operation`] is owned by one screen controller.
//!
//! Every `start()` and every `reset()` bumps the generation number. Tick
//! callbacks and result generation carry the generation they were scheduled
//! under and are dropped on arrival if it is no longer current, so a reset
//! can never be undone by a callback that was already in flight.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use cav_core::{
    CavError, OperationContext, OperationInput, OperationKind, OperationResult, OperationState,
    ProgressProfile, ResultProvider,
};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::metrics::EngineMetrics;
use crate::observer::{OperationEvent, OperationObserver};
use crate::ticker::{TickCallback, TickControl, Ticker};

/// Latest published state plus the generation it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub generation: u64,
    pub state: OperationState,
    /// Set when the provider failed during this generation
    pub failure: Option<CavError>,
}

pub struct Operation {
    id: Uuid,
    kind: OperationKind,
    profile: ProgressProfile,
    ticker: Arc<dyn Ticker>,
    shared: Arc<Shared>,
}

struct Shared {
    id: Uuid,
    kind: OperationKind,
    provider: Arc<dyn ResultProvider>,
    core: Mutex<Core>,
    /// Held across `generate`: at most one result generation at a time.
    generation_gate: Mutex<()>,
    snapshot: watch::Sender<Snapshot>,
}

#[derive(Default)]
struct Core {
    state: OperationState,
    generation: u64,
    cancel: Option<CancellationToken>,
    input: Option<OperationInput>,
    failure: Option<CavError>,
    observers: Vec<Arc<dyn OperationObserver>>,
    metrics: Option<EngineMetrics>,
}

impl Operation {
    /// New idle operation using the provider's default cadence.
    pub fn new<P>(provider: P, ticker: Arc<dyn Ticker>) -> Self
    where
        P: ResultProvider + 'static,
    {
        let kind = provider.kind();
        let id = Uuid::new_v4();
        let (snapshot, _) = watch::channel(Snapshot {
            generation: 0,
            state: OperationState::Idle,
            failure: None,
        });

        Self {
            id,
            kind,
            profile: kind.default_profile(),
            ticker,
            shared: Arc::new(Shared {
                id,
                kind,
                provider: Arc::new(provider),
                core: Mutex::new(Core::default()),
                generation_gate: Mutex::new(()),
                snapshot,
            }),
        }
    }

    /// Replace the progress cadence. Only valid before the first `start()`.
    pub fn with_profile(mut self, profile: ProgressProfile) -> Result<Self, CavError> {
        profile.validate()?;
        self.profile = profile;
        Ok(self)
    }

    pub fn with_metrics(self, metrics: EngineMetrics) -> Self {
        self.set_metrics(metrics);
        self
    }

    /// Count transitions from now on, replacing any earlier registry.
    pub fn set_metrics(&self, metrics: EngineMetrics) {
        self.shared.lock_core().metrics = Some(metrics);
    }

    pub fn with_observer(self, observer: Arc<dyn OperationObserver>) -> Self {
        self.observe(observer);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn profile(&self) -> ProgressProfile {
        self.profile
    }

    pub fn state(&self) -> OperationState {
        self.shared.lock_core().state.clone()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.shared.snapshot.borrow().clone()
    }

    /// Latest-value subscription for polling presenters.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.shared.snapshot.subscribe()
    }

    /// Register an observer for every subsequent transition.
    pub fn observe(&self, observer: Arc<dyn OperationObserver>) {
        self.shared.lock_core().observers.push(observer);
    }

    /// `Idle → Running(0)` and schedule progress ticks.
    ///
    /// Invalid input is reported without touching state.
    pub fn start(&self, input: OperationInput) -> Result<(), CavError> {
        if let Err(e) = self.kind.validate(&input) {
            debug!(operation_id = %self.id, kind = %self.kind, error = %e, "Rejected start");
            return Err(e);
        }

        let mut core = self.shared.lock_core();
        if !core.state.is_idle() {
            return Err(CavError::InvalidTransition(format!(
                "cannot start while {}",
                core.state.label()
            )));
        }

        let generation = core.generation + 1;
        let cancel = CancellationToken::new();
        let ctx = OperationContext::new(self.id, self.kind, generation);
        let shared = Arc::clone(&self.shared);
        let profile = self.profile;
        let on_tick: TickCallback = Box::new(move || shared.on_tick(&ctx, profile));

        self.ticker
            .schedule(self.profile.period, cancel.clone(), on_tick)?;

        core.generation = generation;
        core.cancel = Some(cancel);
        core.input = Some(input);
        core.failure = None;
        core.state = OperationState::Running { progress: 0 };
        self.shared
            .publish(&core, OperationEvent::Started { generation });

        info!(
            operation_id = %self.id,
            kind = %self.kind,
            generation,
            step = self.profile.step,
            period_ms = self.profile.period.as_millis() as u64,
            "Operation started"
        );
        Ok(())
    }

    /// Back to `Idle` from any state. Pending ticks are cancelled and any
    /// in-flight result is discarded. A no-op when already idle.
    pub fn reset(&self) {
        self.shared.reset("reset");
    }

    /// Resolve with the result of the current run.
    ///
    /// Returns `CancelledError` if the run is reset (or the operation is
    /// dropped) first, and the provider error if generation fails.
    pub async fn wait_for_completion(&self) -> Result<OperationResult, CavError> {
        let mut rx = self.shared.snapshot.subscribe();
        let generation = rx.borrow().generation;

        loop {
            {
                let snapshot = rx.borrow_and_update();
                if snapshot.generation != generation {
                    return Err(CavError::CancelledError);
                }
                match &snapshot.state {
                    OperationState::Complete { result } => return Ok(result.clone()),
                    OperationState::Running { .. } => {}
                    OperationState::Idle => {
                        return Err(snapshot.failure.clone().unwrap_or_else(|| {
                            CavError::InvalidTransition("operation is not running".to_string())
                        }))
                    }
                }
            }
            if rx.changed().await.is_err() {
                return Err(CavError::CancelledError);
            }
        }
    }
}

impl Drop for Operation {
    fn drop(&mut self) {
        self.shared.reset("dropped");
    }
}

impl std::fmt::Debug for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Operation")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("profile", &self.profile)
            .field("state", &self.state())
            .finish()
    }
}

impl Shared {
    fn lock_core(&self) -> MutexGuard<'_, Core> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, core: &Core, event: OperationEvent) {
        self.snapshot.send_replace(Snapshot {
            generation: core.generation,
            state: core.state.clone(),
            failure: core.failure.clone(),
        });
        if let Some(metrics) = &core.metrics {
            metrics.record(self.kind.as_str(), &event);
        }
        for observer in &core.observers {
            observer.on_event(&event);
        }
    }

    fn reset(&self, reason: &str) {
        let mut core = self.lock_core();
        let event = match &core.state {
            OperationState::Idle => return,
            OperationState::Running { progress } => OperationEvent::Cancelled {
                progress: *progress,
            },
            OperationState::Complete { .. } => OperationEvent::Reset,
        };

        core.generation += 1;
        if let Some(cancel) = core.cancel.take() {
            cancel.cancel();
        }
        core.input = None;
        core.failure = None;
        core.state = OperationState::Idle;
        self.publish(&core, event.clone());

        info!(
            operation_id = %self.id,
            kind = %self.kind,
            generation = core.generation,
            event = event.name(),
            reason,
            "Operation reset"
        );
    }

    /// One progress tick for generation `ctx.generation`.
    fn on_tick(&self, ctx: &OperationContext, profile: ProgressProfile) -> TickControl {
        let input = {
            let mut core = self.lock_core();
            if core.generation != ctx.generation {
                debug!(operation_id = %self.id, generation = ctx.generation, "Stale tick ignored");
                return TickControl::Stop;
            }
            let OperationState::Running { progress } = core.state else {
                return TickControl::Stop;
            };

            let next = profile.advance(progress);
            core.state = OperationState::Running { progress: next };
            self.publish(&core, OperationEvent::Progress { progress: next });
            debug!(operation_id = %self.id, progress = next, "Progress");

            if next < 100 {
                return TickControl::Continue;
            }
            core.cancel = None;
            match core.input.take() {
                Some(input) => input,
                None => return TickControl::Stop,
            }
        };

        self.finish(ctx, &input);
        TickControl::Stop
    }

    /// Run the provider outside the state lock and commit only if the
    /// generation survived.
    fn finish(&self, ctx: &OperationContext, input: &OperationInput) {
        let outcome = {
            let _gate = self
                .generation_gate
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if self.lock_core().generation != ctx.generation {
                debug!(operation_id = %self.id, generation = ctx.generation, "Skipped generation for reset run");
                return;
            }
            self.provider.generate(input, ctx)
        };

        let mut core = self.lock_core();
        if core.generation != ctx.generation {
            debug!(
                operation_id = %self.id,
                generation = ctx.generation,
                "Discarded result of reset run"
            );
            return;
        }

        match outcome {
            Ok(result) => {
                core.state = OperationState::Complete {
                    result: result.clone(),
                };
                self.publish(&core, OperationEvent::Completed { result });
                info!(
                    operation_id = %self.id,
                    kind = %self.kind,
                    provider = self.provider.id(),
                    generation = ctx.generation,
                    "Operation complete"
                );
            }
            Err(error) => {
                warn!(
                    operation_id = %self.id,
                    kind = %self.kind,
                    provider = self.provider.id(),
                    error = %error,
                    "Result generation failed"
                );
                core.state = OperationState::Idle;
                core.failure = Some(error.clone());
                self.publish(&core, OperationEvent::Failed { error });
            }
        }
    }
}
