//! Cancellable periodic tick loop with an injectable clock.

use crate::{Error, Result};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Source of time for the tick loop
pub trait Clock: Send + Sync {
    /// Current time in milliseconds since the Unix epoch
    fn now_ms(&self) -> i64;

    /// Block for `duration`
    fn sleep(&self, duration: Duration);
}

/// Wall clock backed by `SystemTime` and `thread::sleep`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Deterministic clock: `sleep` advances time instantly
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    #[must_use]
    pub fn new(start_ms: i64) -> Self {
        Self {
            now: AtomicI64::new(start_ms),
        }
    }

    /// Move time forward by `ms`
    pub fn advance(&self, ms: i64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }

    fn sleep(&self, duration: Duration) {
        self.advance(i64::try_from(duration.as_millis()).unwrap_or(i64::MAX));
    }
}

/// Shared stop flag; cloning yields a handle to the same flag
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What the loop does after a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickControl {
    Continue,
    Stop,
}

/// Runs one tick at a time at a fixed interval until stopped or cancelled
pub struct TickScheduler {
    clock: Arc<dyn Clock>,
    interval: Duration,
    cancel: CancelHandle,
}

impl TickScheduler {
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, interval: Duration) -> Self {
        Self {
            clock,
            interval,
            cancel: CancelHandle::new(),
        }
    }

    /// Scheduler ticking `fps` times per second
    ///
    /// # Errors
    ///
    /// Returns an error if `fps` is not a positive finite number
    pub fn with_fps(clock: Arc<dyn Clock>, fps: f64) -> Result<Self> {
        if !(fps.is_finite() && fps > 0.0) {
            return Err(Error::ConfigError(format!("Target FPS must be positive, got {fps}")));
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // fps checked positive
        let micros = (1_000_000.0 / fps).round() as u64;
        Ok(Self::new(clock, Duration::from_micros(micros)))
    }

    /// Use an existing stop flag, e.g. one shared with a pipeline
    #[must_use]
    pub fn with_cancel_handle(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Handle that stops the loop before its next tick
    #[must_use]
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    #[must_use]
    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    /// Run `tick(now_ms)` until it returns [`TickControl::Stop`] or the loop is
    /// cancelled; returns the number of ticks executed
    ///
    /// A tick that overruns the interval is followed immediately by the next
    /// one; missed ticks are not replayed.
    pub fn run<F>(&self, mut tick: F) -> u64
    where
        F: FnMut(i64) -> TickControl,
    {
        let mut ticks = 0u64;
        while !self.cancel.is_cancelled() {
            let started = self.clock.now_ms();
            ticks += 1;
            if tick(started) == TickControl::Stop {
                break;
            }

            let elapsed = Duration::from_millis(u64::try_from(self.clock.now_ms() - started).unwrap_or(0));
            if let Some(remaining) = self.interval.checked_sub(elapsed) {
                if !remaining.is_zero() && !self.cancel.is_cancelled() {
                    self.clock.sleep(remaining);
                }
            }
        }
        log::debug!("Tick loop finished after {} ticks", ticks);
        ticks
    }
}
