use std::time::Duration;

use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{info, warn};

use crate::celebration::Fireworks;
use crate::clock::{ClockView, SessionClock};
use crate::round::{HintOutcome, RoundStatus, SubmitOutcome};
use crate::session::{RoundTransition, Session};

pub const ESCAPE_BANNER: &str = "ESCAPED";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    /// Mission control: synopsis and a decorative countdown. The session
    /// clock has not started yet.
    Briefing,
    Round,
    Locked,
    Escaped,
}

/// What the event loop should do after a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    Continue,
    Quit,
}

/// Front-end state around a [`Session`]: current screen, the input line and
/// transient notices.
#[derive(Debug)]
pub struct App {
    pub session: Session,
    pub state: AppState,
    pub input: String,
    pub notice: Option<String>,
    pub fireworks: Fireworks,
    briefing_clock: SessionClock,
    size: (u16, u16),
}

impl App {
    pub fn new(session: Session, skip_briefing: bool) -> Self {
        let mut briefing_clock = SessionClock::new(session.campaign().briefing_seconds);
        briefing_clock.on_expire(|| warn!("briefing countdown ran out"));

        let mut app = Self {
            session,
            state: AppState::Briefing,
            input: String::new(),
            notice: None,
            fireworks: Fireworks::default(),
            briefing_clock,
            size: (80, 24),
        };
        if skip_briefing {
            app.enter_rounds();
        } else {
            app.briefing_clock.start();
        }
        app
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.size = (width, height);
        if self.fireworks.is_active {
            self.fireworks.width = width as f64;
            self.fireworks.height = height as f64;
        }
    }

    /// Feeds real elapsed time to whichever clock is on screen.
    pub fn on_tick(&mut self, elapsed: Duration) {
        match self.state {
            AppState::Briefing => {
                self.briefing_clock.advance(elapsed);
            }
            AppState::Round | AppState::Locked => {
                if self.session.advance(elapsed) {
                    self.notice = None;
                    self.input.clear();
                }
            }
            AppState::Escaped => {}
        }
        self.fireworks.update(elapsed.as_secs_f64());
        self.sync_state();
    }

    pub fn on_key(&mut self, key: KeyEvent) -> AppAction {
        if key.code == KeyCode::Esc
            || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
        {
            return AppAction::Quit;
        }

        match self.state {
            AppState::Briefing => {
                if key.code == KeyCode::Enter {
                    self.enter_rounds();
                }
            }
            AppState::Round => self.on_round_key(key),
            AppState::Locked => {}
            AppState::Escaped => {
                if key.code == KeyCode::Char('q') {
                    return AppAction::Quit;
                }
            }
        }
        self.sync_state();
        AppAction::Continue
    }

    fn on_round_key(&mut self, key: KeyEvent) {
        if self.session.round().status() == RoundStatus::Complete {
            if key.code == KeyCode::Enter {
                self.next_round();
            }
            return;
        }

        match key.code {
            KeyCode::Enter => self.submit(),
            KeyCode::Tab | KeyCode::F(1) => self.hint(),
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.input.push(c);
            }
            _ => {}
        }
    }

    fn enter_rounds(&mut self) {
        self.briefing_clock.stop();
        self.session.begin();
        if let Some(deadline) = self.session.deadline() {
            info!(deadline = %deadline.format("%H:%M:%S"), "countdown running");
        }
        self.state = AppState::Round;
    }

    fn submit(&mut self) {
        let candidate = std::mem::take(&mut self.input);
        self.notice = match self.session.submit(&candidate) {
            SubmitOutcome::Accepted { .. } => {
                let label = &self.session.round().config().next_label;
                Some(if label.is_empty() {
                    "Press Enter to continue".to_string()
                } else {
                    format!("Press Enter: {label}")
                })
            }
            SubmitOutcome::Rejected { .. } | SubmitOutcome::LockedOut => None,
            SubmitOutcome::AlreadyComplete | SubmitOutcome::SystemLocked => {
                Some("Input ignored".to_string())
            }
        };
    }

    fn hint(&mut self) {
        self.notice = match self.session.request_hint() {
            HintOutcome::Revealed { .. } => None,
            HintOutcome::Exhausted => Some("No more hints for this round".to_string()),
            HintOutcome::Unavailable => Some("Hints unavailable".to_string()),
        };
    }

    fn next_round(&mut self) {
        self.notice = None;
        match self.session.advance_round() {
            RoundTransition::Next { id, route } => {
                info!(round = id, %route, "moved to next round");
            }
            RoundTransition::Escaped => {
                info!(
                    escaped_at = %Local::now().format("%Y-%m-%d %H:%M:%S"),
                    remaining_seconds = self.session.remaining_seconds(),
                    "final round escaped"
                );
                self.state = AppState::Escaped;
                self.fireworks.start(self.size.0, self.size.1, ESCAPE_BANNER);
            }
            RoundTransition::Blocked => {}
        }
    }

    fn sync_state(&mut self) {
        if self.state == AppState::Escaped || self.state == AppState::Briefing {
            return;
        }
        self.state = if self.session.round().status() == RoundStatus::Locked {
            AppState::Locked
        } else {
            AppState::Round
        };
    }

    /// Clock for the screen currently shown.
    pub fn clock_view(&self) -> ClockView {
        match self.state {
            AppState::Briefing => self.briefing_clock.view(),
            _ => self.session.clock_view(),
        }
    }

    /// Tears down both clocks.
    pub fn shutdown(&mut self) {
        self.briefing_clock.stop();
        self.session.end();
        self.fireworks.stop();
    }
}
