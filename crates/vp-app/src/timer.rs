//! Cancellable one-second countdown used for the OTP resend cooldown and the
//! capture countdown.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::AbortHandle;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};
use tracing::debug;

const TICK: Duration = Duration::from_secs(1);

#[derive(Default)]
struct TimerSlot {
    generation: u64,
    handle: Option<AbortHandle>,
    remaining: u32,
}

/// A single countdown owned by one use case.
///
/// Starting again replaces the running countdown. Callbacks run with the
/// timer's lock held: once `cancel` returns, neither callback fires again.
/// They must not call back into the same timer.
pub struct CountdownTimer {
    owner: &'static str,
    slot: Arc<Mutex<TimerSlot>>,
}

impl CountdownTimer {
    pub fn new(owner: &'static str) -> Self {
        Self {
            owner,
            slot: Arc::new(Mutex::new(TimerSlot::default())),
        }
    }

    /// Counts down from `seconds`, calling `on_tick` with the remaining
    /// seconds after each elapsed second and `on_complete` once it reaches zero.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<T, C>(&self, seconds: u32, on_tick: T, on_complete: C)
    where
        T: FnMut(u32) + Send + 'static,
        C: FnOnce() + Send + 'static,
    {
        let mut slot = lock(&self.slot);
        slot.generation = slot.generation.wrapping_add(1);
        if let Some(existing) = slot.handle.take() {
            existing.abort();
        }
        slot.remaining = seconds;

        if seconds == 0 {
            on_complete();
            return;
        }

        let generation = slot.generation;
        let shared = Arc::clone(&self.slot);
        let owner = self.owner;
        let task = tokio::spawn(async move {
            let mut on_tick = on_tick;
            let mut on_complete = Some(on_complete);
            let mut ticks = interval_at(Instant::now() + TICK, TICK);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Burst);

            loop {
                ticks.tick().await;
                let mut slot = lock(&shared);
                if slot.generation != generation {
                    return;
                }
                slot.remaining = slot.remaining.saturating_sub(1);
                on_tick(slot.remaining);
                if slot.remaining == 0 {
                    slot.handle = None;
                    if let Some(done) = on_complete.take() {
                        done();
                    }
                    debug!(owner, "countdown completed");
                    return;
                }
            }
        });

        slot.handle = Some(task.abort_handle());
        debug!(owner = self.owner, seconds, "countdown started");
    }

    pub fn cancel(&self) {
        let mut slot = lock(&self.slot);
        slot.generation = slot.generation.wrapping_add(1);
        slot.remaining = 0;
        if let Some(handle) = slot.handle.take() {
            handle.abort();
            debug!(owner = self.owner, "countdown cancelled");
        }
    }

    pub fn remaining(&self) -> u32 {
        lock(&self.slot).remaining
    }

    pub fn is_running(&self) -> bool {
        lock(&self.slot).handle.is_some()
    }
}

impl Drop for CountdownTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn lock(slot: &Mutex<TimerSlot>) -> MutexGuard<'_, TimerSlot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}
