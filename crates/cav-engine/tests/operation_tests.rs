//! Integration tests for the operation state machine.
//!
//! Virtual time comes from `ManualTicker` for the deterministic scenarios and
//! from tokio's paused clock for the `TokioTicker` ones.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;

use cav_core::{
    CavError, OperationContext, OperationInput, OperationKind, OperationResult, OperationState,
    ProgressProfile, RegistrationResult, RegistrationStatus, ResultProvider, VerificationResult,
};
use cav_engine::{EngineMetrics, EventLog, ManualTicker, Operation, OperationEvent, TokioTicker};

// =============================================================================
// Test providers
// =============================================================================

/// Deterministic provider that counts how often it is asked for a result.
struct Counting {
    kind: OperationKind,
    calls: Arc<AtomicUsize>,
}

impl Counting {
    fn new(kind: OperationKind) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                kind,
                calls: Arc::clone(&calls),
            },
            calls,
        )
    }
}

impl ResultProvider for Counting {
    fn kind(&self) -> OperationKind {
        self.kind
    }

    fn id(&self) -> &'static str {
        "test.counting"
    }

    fn generate(
        &self,
        input: &OperationInput,
        ctx: &OperationContext,
    ) -> Result<OperationResult, CavError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let hash = format!("0x{:064x}", ctx.generation);
        let result = match self.kind {
            OperationKind::Verification => OperationResult::Verification(VerificationResult {
                authenticity_score: 0.9,
                is_ai_generated: false,
                is_tampered: false,
                signals: Vec::new(),
                evidence: Vec::new(),
                content_hash: hash,
                timestamp: chrono::Utc::now(),
            }),
            OperationKind::Registration => OperationResult::Registration(RegistrationResult {
                content_hash: hash,
                transaction_hash: format!("0x{}", "ab".repeat(32)),
                block_number: 18_000_001,
                timestamp: chrono::Utc::now(),
                network: input.network.clone().unwrap_or_else(|| "ethereum".to_string()),
                creator_name: input.creator_name.clone(),
                status: RegistrationStatus::Confirmed,
                fee: "0.001000".to_string(),
            }),
        };
        Ok(result)
    }
}

struct Failing;

impl ResultProvider for Failing {
    fn kind(&self) -> OperationKind {
        OperationKind::Verification
    }

    fn id(&self) -> &'static str {
        "test.failing"
    }

    fn generate(&self, _: &OperationInput, _: &OperationContext) -> Result<OperationResult, CavError> {
        Err(CavError::ProviderError("backend unavailable".to_string()))
    }
}

/// Blocks inside `generate` until the test releases it.
struct Gated {
    inner: Counting,
    entered: mpsc::Sender<()>,
    release: Mutex<mpsc::Receiver<()>>,
}

impl ResultProvider for Gated {
    fn kind(&self) -> OperationKind {
        self.inner.kind()
    }

    fn id(&self) -> &'static str {
        "test.gated"
    }

    fn generate(
        &self,
        input: &OperationInput,
        ctx: &OperationContext,
    ) -> Result<OperationResult, CavError> {
        self.entered.send(()).unwrap();
        self.release.lock().unwrap().recv().unwrap();
        self.inner.generate(input, ctx)
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn verification() -> (Operation, ManualTicker, EventLog, Arc<AtomicUsize>) {
    let ticker = ManualTicker::new();
    let (provider, calls) = Counting::new(OperationKind::Verification);
    let log = EventLog::new();
    let op = Operation::new(provider, Arc::new(ticker.clone())).with_observer(Arc::new(log.clone()));
    (op, ticker, log, calls)
}

fn registration() -> (Operation, ManualTicker, EventLog, Arc<AtomicUsize>) {
    let ticker = ManualTicker::new();
    let (provider, calls) = Counting::new(OperationKind::Registration);
    let log = EventLog::new();
    let op = Operation::new(provider, Arc::new(ticker.clone())).with_observer(Arc::new(log.clone()));
    (op, ticker, log, calls)
}

fn registration_input() -> OperationInput {
    OperationInput::new("img1").with_creator("Alice", "a@b.com")
}

// =============================================================================
// Start
// =============================================================================

#[test]
fn test_valid_start_enters_running_zero() {
    let (op, ticker, log, _) = verification();

    op.start(OperationInput::new("img1")).unwrap();

    assert_eq!(op.state(), OperationState::Running { progress: 0 });
    assert_eq!(ticker.pending(), 1);
    assert_eq!(log.events(), vec![OperationEvent::Started { generation: 1 }]);
}

#[test]
fn test_start_without_content_stays_idle() {
    for input in [
        OperationInput::default(),
        OperationInput::new(""),
        OperationInput::new("   "),
    ] {
        let (op, ticker, log, _) = verification();

        let err = op.start(input).unwrap_err();

        assert_eq!(err, CavError::InvalidInputError);
        assert_eq!(op.state(), OperationState::Idle);
        assert_eq!(ticker.pending(), 0);
        assert!(log.is_empty());
    }
}

#[test]
fn test_registration_missing_fields() {
    let (op, ticker, _, calls) = registration();
    let input = OperationInput::new("img1").with_creator("", "a@b.com");

    let err = op.start(input).unwrap_err();
    assert_eq!(err, CavError::MissingFieldsError(vec!["creatorName".to_string()]));
    assert!(err.is_input_error());
    assert_eq!(op.state(), OperationState::Idle);

    let err = op
        .start(OperationInput::new("img1").with_creator(" ", "\t"))
        .unwrap_err();
    assert_eq!(
        err,
        CavError::MissingFieldsError(vec!["creatorName".to_string(), "creatorEmail".to_string()])
    );

    ticker.advance(Duration::from_secs(10));
    assert_eq!(op.state(), OperationState::Idle);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_registration_without_content_reports_content_first() {
    let (op, _, _, _) = registration();
    let err = op.start(OperationInput::default()).unwrap_err();
    assert_eq!(err, CavError::InvalidInputError);
}

#[test]
fn test_start_while_complete_is_rejected() {
    let (op, ticker, _, calls) = verification();
    op.start(OperationInput::new("img1")).unwrap();
    ticker.run_until_idle(100);

    let err = op.start(OperationInput::new("img2")).unwrap_err();
    assert!(matches!(err, CavError::InvalidTransition(_)));
    assert!(op.state().result().is_some());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

// =============================================================================
// Progress
// =============================================================================

#[test]
fn test_verification_scenario_ten_ticks() {
    let (op, ticker, log, calls) = verification();
    op.start(OperationInput::new("img1")).unwrap();

    for expected in (10..100).step_by(10) {
        ticker.advance(Duration::from_millis(200));
        assert_eq!(op.state(), OperationState::Running { progress: expected as u8 });
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    ticker.advance(Duration::from_millis(200));

    assert!(matches!(op.state(), OperationState::Complete { .. }));
    assert_eq!(ticker.now(), Duration::from_millis(2000));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        log.progress_values(),
        vec![10, 20, 30, 40, 50, 60, 70, 80, 90, 100]
    );
    assert_eq!(log.names().last(), Some(&"completed"));
}

#[test]
fn test_registration_scenario_twenty_ticks() {
    let (op, ticker, log, calls) = registration();
    op.start(registration_input()).unwrap();

    ticker.advance(Duration::from_millis(150 * 19));
    assert_eq!(op.state(), OperationState::Running { progress: 95 });

    ticker.advance(Duration::from_millis(150));

    let state = op.state();
    let result = state.result().and_then(OperationResult::as_registration).unwrap();
    assert!(result.block_number > 0);
    assert_eq!(result.status, RegistrationStatus::Confirmed);
    assert_eq!(result.creator_name, "Alice");
    assert_eq!(log.progress_values().len(), 20);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_progress_clamps_to_exactly_one_hundred() {
    let ticker = ManualTicker::new();
    let (provider, _) = Counting::new(OperationKind::Verification);
    let log = EventLog::new();
    let op = Operation::new(provider, Arc::new(ticker.clone()))
        .with_profile(ProgressProfile::new(30, Duration::from_millis(50)))
        .unwrap()
        .with_observer(Arc::new(log.clone()));

    op.start(OperationInput::new("img1")).unwrap();
    ticker.run_until_idle(100);

    assert_eq!(log.progress_values(), vec![30, 60, 90, 100]);
    assert_eq!(ticker.pending(), 0);
}

#[test]
fn test_progress_is_monotone_and_completes_once() {
    let (op, ticker, log, calls) = registration();
    op.start(registration_input()).unwrap();

    ticker.advance(Duration::from_secs(60));

    let progress = log.progress_values();
    assert!(progress.windows(2).all(|w| w[0] <= w[1]));
    assert!(progress.iter().all(|p| *p <= 100));
    assert_eq!(progress.last(), Some(&100));
    assert_eq!(log.completions().len(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // Completion is terminal until reset.
    assert_eq!(ticker.advance(Duration::from_secs(60)), 0);
    assert_eq!(log.completions().len(), 1);
}

// =============================================================================
// Reset
// =============================================================================

#[test]
fn test_reset_mid_run_stops_all_ticks() {
    let (op, ticker, log, calls) = verification();
    op.start(OperationInput::new("img1")).unwrap();
    ticker.advance(Duration::from_millis(600));
    assert_eq!(op.state(), OperationState::Running { progress: 30 });

    op.reset();

    assert_eq!(op.state(), OperationState::Idle);
    assert_eq!(ticker.pending(), 0);
    assert_eq!(ticker.advance(Duration::from_secs(10)), 0);
    assert_eq!(op.state(), OperationState::Idle);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(
        log.events().last(),
        Some(&OperationEvent::Cancelled { progress: 30 })
    );
}

#[test]
fn test_reset_from_complete_discards_result() {
    let (op, ticker, log, _) = verification();
    op.start(OperationInput::new("img1")).unwrap();
    ticker.run_until_idle(100);
    assert!(op.state().result().is_some());

    op.reset();

    assert_eq!(op.state(), OperationState::Idle);
    assert_eq!(log.events().last(), Some(&OperationEvent::Reset));
}

#[test]
fn test_double_reset_is_noop() {
    let (op, ticker, log, _) = verification();
    op.start(OperationInput::new("img1")).unwrap();
    ticker.advance(Duration::from_millis(200));

    op.reset();
    let events = log.len();
    let generation = op.snapshot().generation;

    op.reset();

    assert_eq!(op.state(), OperationState::Idle);
    assert_eq!(log.len(), events);
    assert_eq!(op.snapshot().generation, generation);
}

#[test]
fn test_reset_on_fresh_operation_is_noop() {
    let (op, _, log, _) = verification();
    op.reset();
    assert_eq!(op.state(), OperationState::Idle);
    assert!(log.is_empty());
}

#[test]
fn test_restart_after_reset_runs_clean_cycle() {
    let (op, ticker, log, calls) = verification();
    op.start(OperationInput::new("img1")).unwrap();
    ticker.advance(Duration::from_millis(400));
    op.reset();

    op.start(OperationInput::new("img2")).unwrap();
    assert_eq!(op.state(), OperationState::Running { progress: 0 });
    ticker.run_until_idle(100);

    let state = op.state();
    let result = state.result().unwrap();
    // The counting provider encodes the generation into the hash.
    assert_eq!(result.content_hash(), format!("0x{:064x}", 3));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(log.progress_values(), vec![10, 20, 10, 20, 30, 40, 50, 60, 70, 80, 90, 100]);
}

#[test]
fn test_reset_during_generation_discards_result() {
    let ticker = ManualTicker::new();
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let (inner, calls) = Counting::new(OperationKind::Verification);
    let log = EventLog::new();
    let op = Operation::new(
        Gated {
            inner,
            entered: entered_tx,
            release: Mutex::new(release_rx),
        },
        Arc::new(ticker.clone()),
    )
    .with_observer(Arc::new(log.clone()));

    op.start(OperationInput::new("img1")).unwrap();
    let driver = {
        let ticker = ticker.clone();
        std::thread::spawn(move || ticker.run_until_idle(100))
    };

    entered_rx.recv().unwrap();
    assert_eq!(op.state(), OperationState::Running { progress: 100 });
    op.reset();
    release_tx.send(()).unwrap();
    driver.join().unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(op.state(), OperationState::Idle);
    assert!(log.completions().is_empty());
    assert_eq!(
        log.events().last(),
        Some(&OperationEvent::Cancelled { progress: 100 })
    );
}

// =============================================================================
// Failure
// =============================================================================

#[test]
fn test_provider_failure_returns_to_idle() {
    let ticker = ManualTicker::new();
    let log = EventLog::new();
    let metrics = EngineMetrics::new().unwrap();
    let op = Operation::new(Failing, Arc::new(ticker.clone()))
        .with_metrics(metrics.clone())
        .with_observer(Arc::new(log.clone()));

    op.start(OperationInput::new("img1")).unwrap();
    ticker.run_until_idle(100);

    assert_eq!(op.state(), OperationState::Idle);
    assert_eq!(
        op.snapshot().failure,
        Some(CavError::ProviderError("backend unavailable".to_string()))
    );
    assert_eq!(log.names().last(), Some(&"failed"));
    assert_eq!(metrics.failed("verification"), 1);

    // A failed run can be retried.
    op.start(OperationInput::new("img1")).unwrap();
    assert_eq!(op.snapshot().failure, None);
}

// =============================================================================
// Tokio ticker
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_wait_for_completion_on_tokio_clock() {
    let (provider, calls) = Counting::new(OperationKind::Verification);
    let op = Operation::new(provider, Arc::new(TokioTicker::current().unwrap()));
    let started = tokio::time::Instant::now();

    op.start(OperationInput::new("img1")).unwrap();
    let result = op.wait_for_completion().await.unwrap();

    assert!(result.as_verification().is_some());
    assert!(started.elapsed() >= Duration::from_millis(2000));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_subscribe_sees_latest_progress() {
    let (provider, _) = Counting::new(OperationKind::Registration);
    let op = Operation::new(provider, Arc::new(TokioTicker::current().unwrap()));
    let rx = op.subscribe();

    op.start(registration_input()).unwrap();
    tokio::time::sleep(Duration::from_millis(160)).await;
    assert_eq!(rx.borrow().state, OperationState::Running { progress: 5 });

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(rx.borrow().state, OperationState::Running { progress: 10 });
    assert_eq!(rx.borrow().generation, 1);
}

#[tokio::test(start_paused = true)]
async fn test_reset_resolves_waiter_with_cancelled() {
    let (provider, calls) = Counting::new(OperationKind::Verification);
    let op = Arc::new(Operation::new(
        provider,
        Arc::new(TokioTicker::current().unwrap()),
    ));
    op.start(OperationInput::new("img1")).unwrap();

    let resetter = {
        let op = Arc::clone(&op);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            op.reset();
        })
    };

    let err = op.wait_for_completion().await.unwrap_err();
    resetter.await.unwrap();

    assert_eq!(err, CavError::CancelledError);
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(op.state(), OperationState::Idle);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_wait_without_start_is_invalid_transition() {
    let (provider, _) = Counting::new(OperationKind::Verification);
    let op = Operation::new(provider, Arc::new(ManualTicker::new()));
    let err = op.wait_for_completion().await.unwrap_err();
    assert!(matches!(err, CavError::InvalidTransition(_)));
}
