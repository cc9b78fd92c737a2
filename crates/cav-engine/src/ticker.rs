//! Tick sources: the scheduled-callback capability behind the progress emitter.
//!
//! A [`Ticker`] invokes a callback every `period` until the callback returns
//! [`TickControl::Stop`] or the cancellation token fires. Once the token is
//! cancelled the callback is never invoked again.

use std::time::Duration;

use cav_core::CavError;
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickControl {
    Continue,
    Stop,
}

pub type TickCallback = Box<dyn FnMut() -> TickControl + Send + 'static>;

pub trait Ticker: Send + Sync {
    /// Fire `on_tick` every `period`, first after one full period.
    fn schedule(
        &self,
        period: Duration,
        cancel: CancellationToken,
        on_tick: TickCallback,
    ) -> Result<(), CavError>;
}

/// Real-time ticker backed by a tokio task per schedule.
///
/// On a multi-thread runtime each callback runs under `block_in_place`, so a
/// slow callback (ledger mining, say) does not starve other tasks on the
/// worker. A current-thread runtime runs callbacks inline.
#[derive(Clone, Debug)]
pub struct TokioTicker {
    handle: Handle,
}

impl TokioTicker {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Ticker bound to the runtime of the calling thread.
    pub fn current() -> Result<Self, CavError> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|e| CavError::SchedulerError(e.to_string()))
    }
}

impl Ticker for TokioTicker {
    fn schedule(
        &self,
        period: Duration,
        cancel: CancellationToken,
        mut on_tick: TickCallback,
    ) -> Result<(), CavError> {
        if period.is_zero() {
            return Err(CavError::SchedulerError("period must be non-zero".to_string()));
        }

        let blocking = self.handle.runtime_flavor() == RuntimeFlavor::MultiThread;

        self.handle.spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            // A stalled runtime shifts the cadence instead of bursting ticks.
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        trace!("tick source cancelled");
                        break;
                    }
                    _ = ticker.tick() => {
                        if cancel.is_cancelled() {
                            break;
                        }
                        let control = if blocking {
                            tokio::task::block_in_place(&mut on_tick)
                        } else {
                            on_tick()
                        };
                        if control == TickControl::Stop {
                            break;
                        }
                    }
                }
            }
        });

        Ok(())
    }
}
