/// Result of recording a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lockout {
    /// Attempts remain; the round stays open.
    Open { remaining: u32 },
    /// The budget is spent (or the guard was already locked).
    Locked,
}

/// Attempt budget and lock state for one round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockoutGuard {
    max_attempts: u32,
    attempts_remaining: u32,
    locked: bool,
}

impl LockoutGuard {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            attempts_remaining: max_attempts,
            locked: max_attempts == 0,
        }
    }

    pub fn record_failure(&mut self) -> Lockout {
        if self.locked {
            return Lockout::Locked;
        }
        self.attempts_remaining = self.attempts_remaining.saturating_sub(1);
        if self.attempts_remaining == 0 {
            self.locked = true;
            Lockout::Locked
        } else {
            Lockout::Open {
                remaining: self.attempts_remaining,
            }
        }
    }

    /// Locks regardless of the remaining budget. Used on session expiry.
    pub fn force_lock(&mut self) {
        self.locked = true;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn attempts_remaining(&self) -> u32 {
        self.attempts_remaining
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}
