use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use tracing::{debug, warn};

const TICK: Duration = Duration::from_secs(1);

/// Broadcast side of the session expiry.
///
/// Clones share one flag. The flag only ever goes from `false` to `true`.
#[derive(Debug, Clone, Default)]
pub struct ExpiryLatch(Rc<Cell<bool>>);

impl ExpiryLatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trip(&self) {
        self.0.set(true);
    }

    pub fn is_tripped(&self) -> bool {
        self.0.get()
    }
}

/// Cosmetic urgency level derived from the remaining/total ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayTier {
    Nominal,
    Warning,
    Critical,
}

impl DisplayTier {
    pub fn from_remaining(remaining_seconds: u64, total_seconds: u64) -> Self {
        if total_seconds == 0 {
            return DisplayTier::Critical;
        }
        let ratio = remaining_seconds as f64 / total_seconds as f64;
        if ratio > 0.5 {
            DisplayTier::Nominal
        } else if ratio > 0.25 {
            DisplayTier::Warning
        } else {
            DisplayTier::Critical
        }
    }
}

/// `mm:ss`, both fields zero padded. Minutes are not wrapped into hours.
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Snapshot handed to the clock display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockView {
    pub remaining_seconds: u64,
    pub total_seconds: u64,
    pub tier: DisplayTier,
    pub started: bool,
    pub expired: bool,
}

impl ClockView {
    pub fn display(&self) -> String {
        format_clock(self.remaining_seconds)
    }
}

type ExpireCallback = Box<dyn FnMut()>;

/// Single countdown for a play session.
///
/// The clock does not own a timer. The caller feeds it whole ticks or real
/// elapsed time; `advance` converts elapsed time into one-second ticks and
/// carries the remainder.
pub struct SessionClock {
    total_seconds: u64,
    remaining_seconds: u64,
    running: bool,
    started: bool,
    expired: bool,
    torn_down: bool,
    carry: Duration,
    latch: ExpiryLatch,
    on_expire: Option<ExpireCallback>,
}

impl fmt::Debug for SessionClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionClock")
            .field("total_seconds", &self.total_seconds)
            .field("remaining_seconds", &self.remaining_seconds)
            .field("running", &self.running)
            .field("expired", &self.expired)
            .field("has_callback", &self.on_expire.is_some())
            .finish()
    }
}

impl SessionClock {
    pub fn new(total_seconds: u64) -> Self {
        Self {
            total_seconds,
            remaining_seconds: total_seconds,
            running: false,
            started: false,
            expired: false,
            torn_down: false,
            carry: Duration::ZERO,
            latch: ExpiryLatch::new(),
            on_expire: None,
        }
    }

    /// Registers the expiry callback. A later registration replaces the
    /// earlier one. Never called if the clock is stopped first.
    pub fn on_expire<F>(&mut self, callback: F)
    where
        F: FnMut() + 'static,
    {
        if self.expired {
            return;
        }
        self.on_expire = Some(Box::new(callback));
    }

    pub fn subscribe(&self) -> ExpiryLatch {
        self.latch.clone()
    }

    /// Idempotent: a running, stopped or expired clock is left alone.
    pub fn start(&mut self) {
        if self.started || self.torn_down {
            return;
        }
        self.started = true;
        self.running = true;
        debug!(total_seconds = self.total_seconds, "session clock started");
        if self.remaining_seconds == 0 {
            self.expire();
        }
    }

    /// Applies one elapsed second. Returns true if this tick expired the clock.
    pub fn tick(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds == 0 {
            self.expire();
            return true;
        }
        false
    }

    /// Converts real elapsed time into ticks. Returns true if the clock
    /// expired during this call.
    pub fn advance(&mut self, elapsed: Duration) -> bool {
        if !self.running {
            return false;
        }
        self.carry += elapsed;
        let mut expired = false;
        while self.running && self.carry >= TICK {
            self.carry -= TICK;
            expired |= self.tick();
        }
        expired
    }

    /// Teardown: stops ticking and drops the callback.
    pub fn stop(&mut self) {
        self.torn_down = true;
        self.running = false;
        self.carry = Duration::ZERO;
        self.on_expire = None;
    }

    fn expire(&mut self) {
        self.running = false;
        self.expired = true;
        self.carry = Duration::ZERO;
        self.latch.trip();
        warn!(total_seconds = self.total_seconds, "session clock expired");
        if let Some(mut callback) = self.on_expire.take() {
            callback();
        }
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.remaining_seconds
    }

    pub fn total_seconds(&self) -> u64 {
        self.total_seconds
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn has_started(&self) -> bool {
        self.started
    }

    pub fn has_expired(&self) -> bool {
        self.expired
    }

    pub fn view(&self) -> ClockView {
        ClockView {
            remaining_seconds: self.remaining_seconds,
            total_seconds: self.total_seconds,
            tier: DisplayTier::from_remaining(self.remaining_seconds, self.total_seconds),
            started: self.started,
            expired: self.expired,
        }
    }
}

impl Drop for SessionClock {
    fn drop(&mut self) {
        self.stop();
    }
}
