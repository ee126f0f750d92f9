use breach::{
    app::{App, AppState},
    celebration::Fireworks,
    clock::{format_clock, DisplayTier},
    round::{LockReason, LogKind, LogLine, RoundStatus},
};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

const HORIZONTAL_MARGIN: u16 = 3;
const VERTICAL_MARGIN: u16 = 1;
const PROMPT: &str = "> ";

pub struct AppWidget<'a>(pub &'a App);

impl Widget for AppWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let app = self.0;
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1), // header
                Constraint::Length(1), // padding
                Constraint::Min(1),    // body
                Constraint::Length(1), // notice
                Constraint::Length(1), // legend
            ])
            .split(area);

        render_header(app, chunks[0], buf);

        match app.state {
            AppState::Briefing => render_briefing(app, chunks[2], buf),
            AppState::Round => render_round(app, chunks[2], buf),
            AppState::Locked => render_locked(app, chunks[2], buf),
            AppState::Escaped => render_escaped(app, chunks[2], buf),
        }

        if let Some(notice) = &app.notice {
            Paragraph::new(Span::styled(
                notice.as_str(),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::ITALIC),
            ))
            .alignment(Alignment::Center)
            .render(chunks[3], buf);
        }

        Paragraph::new(Span::styled(
            legend(app),
            Style::default().add_modifier(Modifier::ITALIC),
        ))
        .render(chunks[4], buf);

        if app.fireworks.is_active {
            render_fireworks(&app.fireworks, area, buf);
        }
    }
}

fn tier_style(tier: DisplayTier) -> Style {
    let color = match tier {
        DisplayTier::Nominal => Color::Green,
        DisplayTier::Warning => Color::Yellow,
        DisplayTier::Critical => Color::Red,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

fn render_header(app: &App, area: Rect, buf: &mut Buffer) {
    let campaign = app.session.campaign();
    let clock = app.clock_view();
    let title = match app.state {
        AppState::Briefing => format!("{} // MISSION CONTROL", campaign.title),
        AppState::Escaped => format!("{} // ESCAPED", campaign.title),
        AppState::Round | AppState::Locked => {
            let round = app.session.round().view();
            format!(
                "ROUND {}/{} // {}",
                app.session.round_number(),
                campaign.len(),
                round.title
            )
        }
    };

    let time = format!("T-{}", clock.display());
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(time.width() as u16),
        ])
        .split(area);

    Paragraph::new(Span::styled(
        title,
        Style::default().add_modifier(Modifier::BOLD),
    ))
    .render(halves[0], buf);
    Paragraph::new(Span::styled(time, tier_style(clock.tier)))
        .alignment(Alignment::Right)
        .render(halves[1], buf);
}

fn render_briefing(app: &App, area: Rect, buf: &mut Buffer) {
    let campaign = app.session.campaign();
    let mut lines: Vec<Line> = campaign
        .synopsis
        .iter()
        .map(|l| Line::from(l.as_str()))
        .collect();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!(
            "{} rounds. {} to escape.",
            campaign.len(),
            format_clock(app.session.config().session_seconds)
        ),
        Style::default().add_modifier(Modifier::DIM),
    )));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Press Enter to begin the mission",
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    )));

    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(area, buf);
}

fn log_style(kind: LogKind) -> Style {
    match kind {
        LogKind::System => Style::default().fg(Color::Gray),
        LogKind::Success => Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD),
        LogKind::Failure => Style::default().fg(Color::Red),
        LogKind::Hint => Style::default().fg(Color::Yellow),
        LogKind::Lockdown => Style::default()
            .fg(Color::Red)
            .add_modifier(Modifier::BOLD),
    }
}

/// The newest log lines that fit in `height` rows
fn log_tail(log: &[LogLine], height: u16) -> Vec<Line<'_>> {
    let skip = log.len().saturating_sub(height as usize);
    log[skip..]
        .iter()
        .map(|l| Line::from(Span::styled(format!("{PROMPT}{}", l.text), log_style(l.kind))))
        .collect()
}

/// Keeps the end of the input visible when it is wider than the line
fn visible_input(input: &str, width: usize) -> &str {
    let room = width.saturating_sub(PROMPT.width() + 1);
    if input.width() <= room {
        return input;
    }
    let mut start = 0;
    for (idx, _) in input.char_indices() {
        if input[idx..].width() <= room {
            start = idx;
            break;
        }
        start = input.len();
    }
    &input[start..]
}

fn render_round(app: &App, area: Rect, buf: &mut Buffer) {
    let round = app.session.round();
    let config = round.config();
    let riddle_height = (config.riddle.len() as u16 + 2).min(area.height / 2);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(riddle_height),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);

    let riddle: Vec<Line> = config
        .riddle
        .iter()
        .map(|l| Line::from(l.as_str()))
        .collect();
    Paragraph::new(riddle)
        .block(
            Block::default()
                .borders(Borders::TOP | Borders::BOTTOM)
                .title(format!(" {} ", config.difficulty)),
        )
        .wrap(Wrap { trim: false })
        .render(chunks[0], buf);

    Paragraph::new(log_tail(round.log(), chunks[1].height))
        .wrap(Wrap { trim: false })
        .render(chunks[1], buf);

    let input_line = if round.status() == RoundStatus::Complete {
        Line::from(Span::styled(
            format!("{PROMPT}{}", config.next_label),
            Style::default().fg(Color::Green),
        ))
    } else {
        let mut spans = vec![
            Span::styled(PROMPT, Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(visible_input(&app.input, chunks[2].width as usize)),
            Span::styled(
                "_",
                Style::default().add_modifier(Modifier::SLOW_BLINK),
            ),
        ];
        if app.input.is_empty() && !config.answer_format.is_empty() {
            spans.push(Span::styled(
                format!(" {}", config.answer_format),
                Style::default().add_modifier(Modifier::DIM),
            ));
        }
        Line::from(spans)
    };
    Paragraph::new(input_line).render(chunks[2], buf);
}

fn render_locked(app: &App, area: Rect, buf: &mut Buffer) {
    let round = app.session.round();
    let view = round.view();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(3)])
        .split(area);

    Paragraph::new(log_tail(view.log, chunks[0].height))
        .wrap(Wrap { trim: false })
        .render(chunks[0], buf);

    let reason = match view.lock_reason {
        Some(LockReason::Expired) => "TIME LIMIT EXCEEDED",
        _ => "ATTEMPT LIMIT REACHED",
    };
    Paragraph::new(vec![
        Line::from(Span::styled(
            round.config().locked_message.as_str(),
            log_style(LogKind::Lockdown),
        )),
        Line::from(Span::styled(
            reason,
            Style::default().add_modifier(Modifier::DIM),
        )),
    ])
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::TOP))
    .render(chunks[1], buf);
}

fn render_escaped(app: &App, area: Rect, buf: &mut Buffer) {
    let left = app.session.remaining_seconds();
    let lines = vec![
        Line::from(Span::styled(
            "ALL SYSTEMS BREACHED",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(format!("{} remaining on the clock", format_clock(left))),
    ];
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(60),
            Constraint::Length(lines.len() as u16),
            Constraint::Min(0),
        ])
        .split(area);
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .render(chunks[1], buf);
}

fn legend(app: &App) -> &'static str {
    match app.state {
        AppState::Briefing => "(enter) begin / (esc)ape",
        AppState::Round if app.session.round().status() == RoundStatus::Complete => {
            "(enter) continue / (esc)ape"
        }
        AppState::Round => "(enter) submit / (tab) hint / (esc)ape",
        AppState::Locked => "(esc)ape",
        AppState::Escaped => "(q)uit / (esc)ape",
    }
}

/// Draw fireworks over whatever is already in the buffer
fn render_fireworks(fireworks: &Fireworks, area: Rect, buf: &mut Buffer) {
    let colors = [
        Color::Yellow,
        Color::Magenta,
        Color::Cyan,
        Color::Green,
        Color::Red,
        Color::Blue,
        Color::LightYellow,
    ];

    for spark in &fireworks.sparks {
        if spark.x < 0.0 || spark.y < 0.0 {
            continue;
        }
        let x = spark.x as u16;
        let y = spark.y as u16;

        if x < area.width && y < area.height {
            let color = colors[spark.color_index % colors.len()];
            let brightness = spark.brightness();
            let style = if brightness > 0.6 {
                Style::default().fg(color).add_modifier(Modifier::BOLD)
            } else if brightness > 0.25 {
                Style::default().fg(color)
            } else {
                Style::default().fg(color).add_modifier(Modifier::DIM)
            };

            if let Some(cell) = buf.cell_mut((area.x + x, area.y + y)) {
                cell.set_symbol(&spark.symbol.to_string());
                cell.set_style(style);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use breach::{
        campaign::{Campaign, DEFAULT_CAMPAIGN},
        session::{Session, SessionConfig, TimerPolicy},
    };
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use std::time::Duration;

    fn create_test_app(seconds: u64, skip_briefing: bool) -> App {
        let campaign = Campaign::builtin(DEFAULT_CAMPAIGN).unwrap();
        let session = Session::new(
            campaign,
            SessionConfig {
                session_seconds: seconds,
                timer_policy: TimerPolicy::Shared,
            },
        )
        .unwrap();
        App::new(session, skip_briefing)
    }

    fn send(app: &mut App, text: &str) {
        for c in text.chars() {
            app.on_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE));
        }
        app.on_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
    }

    fn rendered(app: &App, width: u16, height: u16) -> String {
        let area = Rect::new(0, 0, width, height);
        let mut buffer = Buffer::empty(area);
        AppWidget(app).render(area, &mut buffer);
        buffer
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect::<String>()
    }

    #[test]
    fn test_briefing_screen() {
        let app = create_test_app(600, false);
        let out = rendered(&app, 100, 30);
        assert!(out.contains("MISSION CONTROL"));
        assert!(out.contains("Press Enter to begin the mission"));
        assert!(out.contains("T-28:00"));
    }

    #[test]
    fn test_round_screen_shows_clock_and_input() {
        let mut app = create_test_app(600, true);
        app.on_key(KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE));
        let out = rendered(&app, 100, 30);
        assert!(out.contains("ROUND 1/7"));
        assert!(out.contains("T-10:00"));
        assert!(out.contains("> a_"));
    }

    fn clock_color(app: &App) -> Option<Color> {
        let area = Rect::new(0, 0, 80, 24);
        let mut buffer = Buffer::empty(area);
        AppWidget(app).render(area, &mut buffer);
        let cells = buffer.content();
        cells
            .windows(2)
            .find(|pair| pair[0].symbol() == "T" && pair[1].symbol() == "-")
            .map(|pair| pair[0].fg)
    }

    #[test]
    fn test_clock_color_follows_tier() {
        let mut app = create_test_app(100, true);
        assert_eq!(clock_color(&app), Some(Color::Green));

        app.on_tick(Duration::from_secs(60));
        assert_eq!(clock_color(&app), Some(Color::Yellow));

        app.on_tick(Duration::from_secs(20));
        assert_eq!(clock_color(&app), Some(Color::Red));
    }

    #[test]
    fn test_failure_line_rendered() {
        let mut app = create_test_app(600, true);
        send(&mut app, "wrong");
        let out = rendered(&app, 120, 40);
        assert!(out.contains("4 attempts remaining"));
    }

    #[test]
    fn test_locked_screen() {
        let mut app = create_test_app(2, true);
        app.on_tick(Duration::from_secs(2));
        assert_eq!(app.state, AppState::Locked);
        let out = rendered(&app, 120, 40);
        assert!(out.contains("TIME LIMIT EXCEEDED"));
        assert!(out.contains("T-00:00"));
    }

    #[test]
    fn test_escaped_screen_with_fireworks() {
        let mut app = create_test_app(600, true);
        for _ in 0..7 {
            let answer = app.session.round().config().canonical_answer.clone();
            send(&mut app, &answer);
            app.on_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
        }
        assert!(app.fireworks.is_active);
        let area = Rect::new(0, 0, 80, 24);
        let mut buffer = Buffer::empty(area);
        AppWidget(&app).render(area, &mut buffer);
        assert!(*buffer.area() == area);
    }

    #[test]
    fn test_small_area_does_not_panic() {
        let app = create_test_app(600, true);
        for (w, h) in [(1, 1), (10, 3), (20, 5)] {
            let area = Rect::new(0, 0, w, h);
            let mut buffer = Buffer::empty(area);
            AppWidget(&app).render(area, &mut buffer);
        }
    }

    #[test]
    fn test_visible_input_keeps_tail() {
        assert_eq!(visible_input("abc", 20), "abc");
        assert_eq!(visible_input("abcdefghij", 8), "fghij");
        assert_eq!(visible_input("", 0), "");
    }

    #[test]
    fn test_log_tail_keeps_newest() {
        let log: Vec<LogLine> = (0..5)
            .map(|i| LogLine {
                kind: LogKind::System,
                text: format!("line {i}"),
            })
            .collect();
        let tail = log_tail(&log, 2);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[1].to_string(), "> line 4");
    }
}
