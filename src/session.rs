use std::time::Duration;

use chrono::{DateTime, Local, TimeDelta};
use tracing::info;

use crate::campaign::Campaign;
use crate::clock::{ClockView, SessionClock};
use crate::error::CampaignError;
use crate::round::{HintOutcome, RoundController, RoundStatus, SubmitOutcome};

/// How the countdown relates to rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimerPolicy {
    /// One deadline for the whole session.
    #[default]
    Shared,
    /// A fresh countdown every time a round is activated.
    PerRound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub session_seconds: u64,
    pub timer_policy: TimerPolicy,
}

impl SessionConfig {
    pub fn from_campaign(campaign: &Campaign) -> Self {
        Self {
            session_seconds: campaign.session_seconds,
            timer_policy: TimerPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundTransition {
    /// The next round is now active. `route` is the completed round's
    /// opaque pointer to it.
    Next { id: u32, route: String },
    /// The final round was completed.
    Escaped,
    /// The active round is not complete.
    Blocked,
}

/// One play-through: the countdown plus the active round.
///
/// Rounds are activated strictly in campaign order. Under the shared timer
/// policy a round activated after the deadline starts out locked.
#[derive(Debug)]
pub struct Session {
    campaign: Campaign,
    config: SessionConfig,
    clock: SessionClock,
    round: RoundController,
    index: usize,
    clock_started_at: Option<DateTime<Local>>,
    escaped: bool,
}

impl Session {
    pub fn new(campaign: Campaign, config: SessionConfig) -> Result<Self, CampaignError> {
        campaign.validate()?;
        let clock = SessionClock::new(config.session_seconds);
        let round = RoundController::new(campaign.rounds[0].clone(), clock.subscribe());
        Ok(Self {
            campaign,
            config,
            clock,
            round,
            index: 0,
            clock_started_at: None,
            escaped: false,
        })
    }

    /// Starts the countdown. Repeated calls are no-ops.
    pub fn begin(&mut self) {
        if self.clock.has_started() {
            return;
        }
        self.clock.start();
        self.clock_started_at = Some(Local::now());
        info!(
            campaign = %self.campaign.name,
            seconds = self.config.session_seconds,
            policy = ?self.config.timer_policy,
            "session started"
        );
        self.round.sync_expiry();
    }

    /// Feeds real elapsed time to the clock. Returns true if the deadline
    /// passed during this call.
    pub fn advance(&mut self, elapsed: Duration) -> bool {
        let expired = self.clock.advance(elapsed);
        self.propagate_expiry(expired);
        expired
    }

    /// One whole second.
    pub fn tick(&mut self) -> bool {
        let expired = self.clock.tick();
        self.propagate_expiry(expired);
        expired
    }

    fn propagate_expiry(&mut self, expired: bool) {
        if expired {
            self.round.on_session_expired();
        } else {
            self.round.sync_expiry();
        }
    }

    pub fn submit(&mut self, candidate: &str) -> SubmitOutcome {
        self.round.submit(candidate)
    }

    pub fn request_hint(&mut self) -> HintOutcome {
        self.round.request_hint()
    }

    /// Moves on once the active round is complete.
    pub fn advance_round(&mut self) -> RoundTransition {
        if self.round.status() != RoundStatus::Complete {
            return RoundTransition::Blocked;
        }
        if self.escaped {
            return RoundTransition::Escaped;
        }
        let route = self.round.config().next_route.clone();

        if self.index + 1 >= self.campaign.len() {
            self.escaped = true;
            self.clock.stop();
            info!(
                campaign = %self.campaign.name,
                remaining_seconds = self.clock.remaining_seconds(),
                "campaign escaped"
            );
            return RoundTransition::Escaped;
        }

        self.index += 1;
        if self.config.timer_policy == TimerPolicy::PerRound {
            self.clock = SessionClock::new(self.config.session_seconds);
            self.clock.start();
            self.clock_started_at = Some(Local::now());
        }
        let config = self.campaign.rounds[self.index].clone();
        self.round = RoundController::new(config, self.clock.subscribe());
        RoundTransition::Next {
            id: self.round.id(),
            route,
        }
    }

    /// Teardown. The clock never fires after this.
    pub fn end(&mut self) {
        self.clock.stop();
    }

    pub fn round(&self) -> &RoundController {
        &self.round
    }

    pub fn round_number(&self) -> usize {
        self.index + 1
    }

    pub fn campaign(&self) -> &Campaign {
        &self.campaign
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn clock_view(&self) -> ClockView {
        self.clock.view()
    }

    pub fn is_expired(&self) -> bool {
        self.clock.has_expired()
    }

    pub fn is_escaped(&self) -> bool {
        self.escaped
    }

    pub fn has_started(&self) -> bool {
        self.clock.has_started()
    }

    /// Wall-clock time the running countdown reaches zero. `None` before the
    /// clock starts or when the deadline is past what chrono can represent.
    pub fn deadline(&self) -> Option<DateTime<Local>> {
        let started = self.clock_started_at?;
        let seconds = i64::try_from(self.config.session_seconds).ok()?;
        started.checked_add_signed(TimeDelta::try_seconds(seconds)?)
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.clock.remaining_seconds()
    }
}
