use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Widget},
    Frame,
};

use crate::{
    app::App,
    clock::Clock,
    config::{format_clock, Preset},
    engine::PeriodKind,
    sequencer::{SequencerStatus, TimerSnapshot},
};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;

pub fn draw<C: Clock>(app: &App<C>, f: &mut Frame) {
    f.render_widget(app, f.area());
}

/// Remaining time as `MM:SS`
pub fn format_time(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn round_label(snap: &TimerSnapshot) -> String {
    match snap.period {
        PeriodKind::Active => format!("Round {}", snap.current_round),
        PeriodKind::Rest => String::from("Rest Period"),
    }
}

fn status_label(snap: &TimerSnapshot) -> &'static str {
    match (snap.status, snap.period) {
        (SequencerStatus::Idle, _) => "Ready",
        (SequencerStatus::Stopped, _) => "Stopped",
        (SequencerStatus::Running, PeriodKind::Active) => "Fight Time",
        (SequencerStatus::Running, PeriodKind::Rest) => "Rest Time",
    }
}

fn period_color(period: PeriodKind) -> Color {
    match period {
        PeriodKind::Active => Color::Red,
        PeriodKind::Rest => Color::Blue,
    }
}

impl<C: Clock> Widget for &App<C> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let snap = self.snapshot();
        let config = self.sequencer().config();

        // styles
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let dim_style = Style::default().add_modifier(Modifier::DIM);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);
        let accent = period_color(snap.period);

        let outer = Block::default()
            .borders(Borders::ALL)
            .title(Span::styled(" ringside ", bold_style));
        let inner = outer.inner(area);
        outer.render(area, buf);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints(
                [
                    Constraint::Length(1), // round label
                    Constraint::Length(1), // n of m
                    Constraint::Length(1),
                    Constraint::Length(3), // time
                    Constraint::Length(1), // progress
                    Constraint::Length(1),
                    Constraint::Length(1), // status
                    Constraint::Min(0),
                    Constraint::Length(3), // settings summary
                    Constraint::Length(1), // legend
                ]
                .as_ref(),
            )
            .split(inner);

        Paragraph::new(Span::styled(
            round_label(&snap),
            Style::default().patch(bold_style).fg(accent),
        ))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

        Paragraph::new(Span::styled(
            format!("{} of {} rounds", snap.current_round, snap.total_rounds),
            dim_style,
        ))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

        Paragraph::new(Span::styled(
            format_time(snap.seconds_remaining),
            Style::default().patch(bold_style).fg(Color::White),
        ))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL))
        .render(chunks[3], buf);

        Gauge::default()
            .gauge_style(Style::default().fg(accent).bg(Color::DarkGray))
            .ratio(snap.progress)
            .label("")
            .render(chunks[4], buf);

        Paragraph::new(Span::styled(
            status_label(&snap),
            Style::default().patch(bold_style).fg(match snap.status {
                SequencerStatus::Running => accent,
                _ => Color::Yellow,
            }),
        ))
        .alignment(Alignment::Center)
        .render(chunks[6], buf);

        let preset = self
            .last_preset()
            .map(|p| format!("  [{p}]"))
            .unwrap_or_default();
        let summary = vec![
            Line::from(format!(
                "{} rounds  |  {} per round  |  {} rest  |  total {}{}",
                config.total_rounds(),
                format_clock(u64::from(config.round_seconds())),
                format_clock(u64::from(config.rest_seconds())),
                format_clock(config.total_seconds()),
                preset,
            )),
            Line::from(
                Preset::ALL
                    .iter()
                    .enumerate()
                    .map(|(i, p)| format!("({}) {}", i + 1, p))
                    .collect::<Vec<_>>()
                    .join("  "),
            ),
        ];
        Paragraph::new(summary)
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center)
            .render(chunks[8], buf);

        let toggle = match snap.status {
            SequencerStatus::Idle => "(space) start",
            SequencerStatus::Running => "(space) stop",
            SequencerStatus::Stopped => "(space) resume",
        };
        Paragraph::new(Span::styled(
            format!("{toggle} / (s) restart / (r)eset / (q)uit"),
            italic_style,
        ))
        .alignment(Alignment::Center)
        .render(chunks[9], buf);
    }
}
