//! Virtual-time ticker
//!
//! Nothing fires until the owner moves the clock with [`ManualTicker::advance`]
//! or [`ManualTicker::tick`]. Due callbacks run in time order, ties broken by
//! schedule order, with the internal lock released so callbacks may schedule
//! or cancel freely.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use cav_core::CavError;
use tokio_util::sync::CancellationToken;

use crate::ticker::{TickCallback, TickControl, Ticker};

#[derive(Clone, Default)]
pub struct ManualTicker {
    inner: Arc<Mutex<Clock>>,
}

#[derive(Default)]
struct Clock {
    now: Duration,
    next_id: u64,
    tasks: Vec<Scheduled>,
}

struct Scheduled {
    id: u64,
    period: Duration,
    due: Duration,
    cancel: CancellationToken,
    on_tick: TickCallback,
}

impl ManualTicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual time elapsed since creation.
    pub fn now(&self) -> Duration {
        self.lock().now
    }

    /// Live (not cancelled, not stopped) schedules. Cancelled ones are
    /// dropped here, releasing whatever their callbacks captured.
    pub fn pending(&self) -> usize {
        let mut clock = self.lock();
        clock.prune();
        clock.tasks.len()
    }

    /// Move the clock forward by `by`, firing every callback that falls due.
    /// Returns the number of callbacks invoked.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.lock().now + by;
        let mut fired = 0;

        while let Some(mut task) = self.take_next_due(target) {
            if task.cancel.is_cancelled() {
                continue;
            }
            fired += 1;
            if (task.on_tick)() == TickControl::Continue && !task.cancel.is_cancelled() {
                task.due += task.period;
                self.lock().tasks.push(task);
            }
        }

        let mut clock = self.lock();
        if clock.now < target {
            clock.now = target;
        }
        fired
    }

    /// Jump to the earliest due time and fire what is due there.
    /// Returns 0 when nothing is pending.
    pub fn tick(&self) -> usize {
        let next = {
            let mut clock = self.lock();
            clock.prune();
            let now = clock.now;
            clock.tasks.iter().map(|t| t.due).min().map(|due| due - now)
        };
        match next {
            Some(by) => self.advance(by),
            None => 0,
        }
    }

    /// Tick until no schedule is left or `max_ticks` callbacks have run.
    pub fn run_until_idle(&self, max_ticks: usize) -> usize {
        let mut fired = 0;
        while fired < max_ticks {
            let n = self.tick();
            if n == 0 {
                break;
            }
            fired += n;
        }
        fired
    }

    fn take_next_due(&self, target: Duration) -> Option<Scheduled> {
        let mut clock = self.lock();
        let index = clock
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= target)
            .min_by_key(|(_, t)| (t.due, t.id))
            .map(|(i, _)| i)?;
        let task = clock.tasks.swap_remove(index);
        if clock.now < task.due {
            clock.now = task.due;
        }
        Some(task)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Clock> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Clock {
    fn prune(&mut self) {
        self.tasks.retain(|t| !t.cancel.is_cancelled());
    }
}

impl Ticker for ManualTicker {
    fn schedule(
        &self,
        period: Duration,
        cancel: CancellationToken,
        on_tick: TickCallback,
    ) -> Result<(), CavError> {
        if period.is_zero() {
            return Err(CavError::SchedulerError("period must be non-zero".to_string()));
        }

        let mut clock = self.lock();
        clock.prune();
        let id = clock.next_id;
        clock.next_id += 1;
        let due = clock.now + period;
        clock.tasks.push(Scheduled {
            id,
            period,
            due,
            cancel,
            on_tick,
        });
        Ok(())
    }
}

impl std::fmt::Debug for ManualTicker {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let clock = self.lock();
        f.debug_struct("ManualTicker")
            .field("now", &clock.now)
            .field("tasks", &clock.tasks.len())
            .finish()
    }
}
