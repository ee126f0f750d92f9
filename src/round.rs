use tracing::{debug, info, warn};

use crate::campaign::RoundConfig;
use crate::clock::ExpiryLatch;
use crate::hints::HintLadder;
use crate::lockout::{Lockout, LockoutGuard};
use crate::validator::validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundStatus {
    Active,
    Complete,
    Locked,
}

impl RoundStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RoundStatus::Active)
    }
}

/// Why a round ended up `Locked`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockReason {
    Exhausted,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    System,
    Success,
    Failure,
    Hint,
    Lockdown,
}

/// One line of the round's terminal output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub kind: LogKind,
    pub text: String,
}

/// One evaluated submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptRecord {
    pub candidate: String,
    pub matched: bool,
    pub attempts_remaining: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Correct answer; the round is complete.
    Accepted { next_route: String },
    /// Wrong answer with budget left.
    Rejected { attempts_remaining: u32 },
    /// Wrong answer that spent the last attempt.
    LockedOut,
    /// The round was already complete; nothing was evaluated.
    AlreadyComplete,
    /// The round is locked (budget or deadline); nothing was evaluated.
    SystemLocked,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HintOutcome {
    Revealed { number: usize, text: String },
    /// Every hint is already out.
    Exhausted,
    /// The round is no longer active.
    Unavailable,
}

/// Read-only snapshot for the presentation layer.
#[derive(Debug, Clone, Copy)]
pub struct RoundView<'a> {
    pub id: u32,
    pub title: &'a str,
    pub status: RoundStatus,
    pub lock_reason: Option<LockReason>,
    pub attempts_remaining: u32,
    pub max_attempts: u32,
    pub hints_revealed: usize,
    pub max_hints: usize,
    pub log: &'a [LogLine],
}

/// Lifecycle of a single round: `Active` until the answer is found
/// (`Complete`) or the budget or session deadline runs out (`Locked`).
///
/// Every operation first checks the session expiry latch, so a submission
/// can never be evaluated after the deadline has passed.
#[derive(Debug)]
pub struct RoundController {
    config: RoundConfig,
    hints: HintLadder,
    guard: LockoutGuard,
    status: RoundStatus,
    lock_reason: Option<LockReason>,
    expiry: ExpiryLatch,
    log: Vec<LogLine>,
    attempts: Vec<AttemptRecord>,
}

impl RoundController {
    /// A round created after the session expired starts out locked.
    pub fn new(config: RoundConfig, expiry: ExpiryLatch) -> Self {
        let hints = HintLadder::new(config.hints.clone(), config.max_hints);
        let guard = LockoutGuard::new(config.max_attempts);
        let log = config
            .boot_lines
            .iter()
            .map(|text| LogLine {
                kind: LogKind::System,
                text: text.clone(),
            })
            .collect();

        let mut round = Self {
            config,
            hints,
            guard,
            status: RoundStatus::Active,
            lock_reason: None,
            expiry,
            log,
            attempts: Vec::new(),
        };
        if !round.sync_expiry() {
            info!(round = round.config.id, "round activated");
        }
        round
    }

    /// Applies a pending session expiry. Returns true if the round is locked.
    pub fn sync_expiry(&mut self) -> bool {
        if self.status == RoundStatus::Active && self.expiry.is_tripped() {
            self.lock_on_expiry();
        }
        self.status == RoundStatus::Locked
    }

    /// Session-wide deadline reached. Locks this round only; the shared
    /// latch belongs to the clock. No effect on a finished round.
    pub fn on_session_expired(&mut self) {
        if self.status == RoundStatus::Active {
            self.lock_on_expiry();
        }
    }

    fn lock_on_expiry(&mut self) {
        self.guard.force_lock();
        self.status = RoundStatus::Locked;
        self.lock_reason = Some(LockReason::Expired);
        let lines = self.config.expiry_lines.clone();
        for text in lines {
            self.push(LogKind::Lockdown, text);
        }
        warn!(
            round = self.config.id,
            attempts_remaining = self.guard.attempts_remaining(),
            "round locked by session expiry"
        );
    }

    pub fn submit(&mut self, candidate: &str) -> SubmitOutcome {
        self.sync_expiry();
        match self.status {
            RoundStatus::Complete => return SubmitOutcome::AlreadyComplete,
            RoundStatus::Locked => return SubmitOutcome::SystemLocked,
            RoundStatus::Active => {}
        }

        if validate(candidate, &self.config.canonical_answer) {
            self.status = RoundStatus::Complete;
            self.record(candidate, true);
            let lines = self.config.success_lines.clone();
            for text in lines {
                self.push(LogKind::Success, text);
            }
            info!(
                round = self.config.id,
                attempts_used = self.attempts.len(),
                "round complete"
            );
            return SubmitOutcome::Accepted {
                next_route: self.config.next_route.clone(),
            };
        }

        match self.guard.record_failure() {
            Lockout::Open { remaining } => {
                self.record(candidate, false);
                self.push(LogKind::Failure, self.config.failure_message(remaining));
                if let Some(line) = self.config.escalation_for(remaining) {
                    let line = line.to_string();
                    self.push(LogKind::Hint, line);
                }
                debug!(round = self.config.id, remaining, "answer rejected");
                SubmitOutcome::Rejected {
                    attempts_remaining: remaining,
                }
            }
            Lockout::Locked => {
                self.record(candidate, false);
                self.status = RoundStatus::Locked;
                self.lock_reason = Some(LockReason::Exhausted);
                self.push(LogKind::Failure, self.config.failure_message(0));
                let lines = self.config.lockdown_lines.clone();
                for text in lines {
                    self.push(LogKind::Lockdown, text);
                }
                warn!(round = self.config.id, "attempt budget exhausted");
                SubmitOutcome::LockedOut
            }
        }
    }

    /// Never consumes an attempt.
    pub fn request_hint(&mut self) -> HintOutcome {
        self.sync_expiry();
        if self.status != RoundStatus::Active {
            return HintOutcome::Unavailable;
        }
        let max = self.hints.max_hints();
        match self.hints.reveal().map(str::to_string) {
            Some(text) => {
                let number = self.hints.revealed();
                self.push(LogKind::Hint, format!("HINT {number}/{max}: {text}"));
                debug!(round = self.config.id, number, "hint revealed");
                HintOutcome::Revealed { number, text }
            }
            None => HintOutcome::Exhausted,
        }
    }

    fn push(&mut self, kind: LogKind, text: String) {
        self.log.push(LogLine { kind, text });
    }

    fn record(&mut self, candidate: &str, matched: bool) {
        self.attempts.push(AttemptRecord {
            candidate: candidate.to_string(),
            matched,
            attempts_remaining: self.guard.attempts_remaining(),
        });
    }

    pub fn id(&self) -> u32 {
        self.config.id
    }

    pub fn config(&self) -> &RoundConfig {
        &self.config
    }

    pub fn status(&self) -> RoundStatus {
        self.status
    }

    pub fn lock_reason(&self) -> Option<LockReason> {
        self.lock_reason
    }

    pub fn attempts_remaining(&self) -> u32 {
        self.guard.attempts_remaining()
    }

    pub fn hints_revealed(&self) -> usize {
        self.hints.revealed()
    }

    pub fn revealed_hints(&self) -> &[String] {
        self.hints.revealed_hints()
    }

    pub fn log(&self) -> &[LogLine] {
        &self.log
    }

    pub fn attempts(&self) -> &[AttemptRecord] {
        &self.attempts
    }

    pub fn view(&self) -> RoundView<'_> {
        RoundView {
            id: self.config.id,
            title: &self.config.title,
            status: self.status,
            lock_reason: self.lock_reason,
            attempts_remaining: self.guard.attempts_remaining(),
            max_attempts: self.guard.max_attempts(),
            hints_revealed: self.hints.revealed(),
            max_hints: self.hints.max_hints(),
            log: &self.log,
        }
    }
}
