mod ui;

use breach::{
    app::{App, AppAction},
    campaign::{Campaign, DEFAULT_CAMPAIGN},
    config::{Config, ConfigStore, FileConfigStore},
    runtime::{CrosstermEventSource, FixedTicker, GameEvent, Runner},
    session::{Session, SessionConfig, TimerPolicy},
};
use clap::{error::ErrorKind, CommandFactory, Parser, ValueEnum};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use directories::ProjectDirs;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::{self, File},
    io::{self, stdin},
    path::{Path, PathBuf},
    sync::Mutex,
    time::{Duration, Instant},
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::ui::AppWidget;

const TICK_RATE_MS: u64 = 100;
const LOG_ENV: &str = "BREACH_LOG";
const MAX_SESSION_SECONDS: u64 = 24 * 60 * 60;

/// timed escape-room puzzles in your terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Break out of a sequence of locked rooms before the countdown runs out. Every round has a limited number of attempts, and some offer hints."
)]
pub struct Cli {
    /// built-in campaign to play
    #[clap(short = 'c', long, value_enum)]
    campaign: Option<CampaignName>,

    /// play a campaign from a JSON file instead of a built-in one
    #[clap(long, conflicts_with = "campaign")]
    campaign_file: Option<PathBuf>,

    /// override the session countdown, in seconds (at most one day)
    #[clap(
        short = 's',
        long,
        value_parser = clap::value_parser!(u64).range(1..=MAX_SESSION_SECONDS)
    )]
    seconds: Option<u64>,

    /// restart the countdown every time a new round opens
    #[clap(long, overrides_with = "shared_timer")]
    per_round_timer: bool,

    /// one countdown for the whole session, even if the config says otherwise
    #[clap(long, overrides_with = "per_round_timer")]
    shared_timer: bool,

    /// go straight to the first round
    #[clap(long, overrides_with = "briefing")]
    skip_briefing: bool,

    /// show the briefing, even if the config skips it
    #[clap(long, overrides_with = "skip_briefing")]
    briefing: bool,

    /// preferences file to use instead of the one in the config directory
    #[clap(long)]
    config: Option<PathBuf>,

    /// where to write the log (the terminal belongs to the game)
    #[clap(long)]
    log_file: Option<PathBuf>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum CampaignName {
    BehindTheCrime,
}

impl Cli {
    /// Settings for this launch: CLI flags win over stored preferences.
    fn merge(&self, stored: Config) -> Config {
        Config {
            campaign: self
                .campaign
                .map(|c| c.to_string())
                .unwrap_or(stored.campaign),
            session_seconds: self.seconds.or(stored.session_seconds),
            per_round_timer: !self.shared_timer
                && (self.per_round_timer || stored.per_round_timer),
            skip_briefing: !self.briefing && (self.skip_briefing || stored.skip_briefing),
        }
    }

    /// What gets written back: only the campaign choice is remembered.
    /// Timer and briefing flags apply to one launch.
    fn remembered(&self, stored: Config) -> Config {
        Config {
            campaign: self
                .campaign
                .map(|c| c.to_string())
                .unwrap_or(stored.campaign),
            ..stored
        }
    }

    fn config_store(&self) -> FileConfigStore {
        match &self.config {
            Some(path) => FileConfigStore::with_path(path),
            None => FileConfigStore::new(),
        }
    }

    fn load_campaign(&self, config: &Config) -> Result<Campaign, breach::error::CampaignError> {
        match &self.campaign_file {
            Some(path) => Campaign::from_path(path),
            None => Campaign::builtin(&config.campaign),
        }
    }
}

fn session_config(campaign: &Campaign, config: &Config) -> SessionConfig {
    let mut settings = SessionConfig::from_campaign(campaign);
    if let Some(seconds) = config.session_seconds {
        settings.session_seconds = seconds;
    }
    if config.per_round_timer {
        settings.timer_policy = TimerPolicy::PerRound;
    }
    settings
}

fn default_log_path() -> PathBuf {
    ProjectDirs::from("", "", "breach")
        .map(|pd| pd.data_local_dir().join("breach.log"))
        .unwrap_or_else(|| PathBuf::from("breach.log"))
}

fn init_logging(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = File::options().create(true).append(true).open(path)?;
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let log_path = cli.log_file.clone().unwrap_or_else(default_log_path);
    init_logging(&log_path)?;

    let store = cli.config_store();
    let stored = store.load();
    let config = cli.merge(stored.clone());
    let campaign = cli.load_campaign(&config)?;
    let settings = session_config(&campaign, &config);
    let session = Session::new(campaign, settings)?;
    if cli.campaign_file.is_none() {
        if let Err(e) = store.save(&cli.remembered(stored)) {
            warn!(path = %store.path().display(), error = %e, "could not save preferences");
        }
    }
    info!(
        campaign = %session.campaign().name,
        rounds = session.campaign().len(),
        "starting"
    );

    let mut app = App::new(session, config.skip_briefing);

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);
    app.shutdown();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let interval = Duration::from_millis(TICK_RATE_MS);
    let runner = Runner::new(CrosstermEventSource::new(interval), FixedTicker::new(interval));

    let size = terminal.size()?;
    app.resize(size.width, size.height);

    let mut last = Instant::now();
    loop {
        terminal.draw(|f| f.render_widget(AppWidget(app), f.area()))?;

        let event = runner.step();
        // time passes before any input is judged
        let now = Instant::now();
        app.on_tick(now.duration_since(last));
        last = now;

        match event {
            GameEvent::Tick => {}
            GameEvent::Resize => {
                let size = terminal.size()?;
                app.resize(size.width, size.height);
            }
            GameEvent::Key(key) => {
                if app.on_key(key) == AppAction::Quit {
                    break;
                }
            }
        }
    }

    Ok(())
}
