use std::collections::VecDeque;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph};

use kartline::{ParticipantKind, RacePhase};

use crate::server::{ServerStats, Standing};

const MAX_LOG_LINES: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogLevel {
    Info,
    Warn,
}

impl LogLevel {
    fn color(self) -> Color {
        match self {
            Self::Info => Color::White,
            Self::Warn => Color::Yellow,
        }
    }
}

pub struct TuiState {
    log: VecDeque<(LogLevel, String)>,
    scroll: usize,
}

impl TuiState {
    pub fn new() -> Self {
        Self {
            log: VecDeque::new(),
            scroll: 0,
        }
    }

    pub fn log_info(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Info, message.into());
    }

    pub fn log_warn(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Warn, message.into());
    }

    pub fn scroll_up(&mut self) {
        self.scroll = (self.scroll + 5).min(self.log.len().saturating_sub(1));
    }

    pub fn scroll_down(&mut self) {
        self.scroll = self.scroll.saturating_sub(5);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll = 0;
    }

    fn push(&mut self, level: LogLevel, message: String) {
        if self.log.len() == MAX_LOG_LINES {
            self.log.pop_front();
        }
        self.log.push_back((level, message));
    }

    fn visible(&self, height: usize) -> impl Iterator<Item = &(LogLevel, String)> {
        let end = self.log.len().saturating_sub(self.scroll);
        let start = end.saturating_sub(height);
        self.log.range(start..end)
    }
}

pub fn render(frame: &mut Frame, state: &TuiState, stats: &ServerStats) {
    let standings_height = stats.standings.len() as u16 + 2;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(standings_height.max(3)),
            Constraint::Min(5),
            Constraint::Length(3),
        ])
        .split(frame.area());

    render_header(frame, chunks[0], stats);
    render_status(frame, chunks[1], stats);
    render_standings(frame, chunks[2], stats);
    render_log(frame, chunks[3], state);
    render_help(frame, chunks[4]);
}

fn render_header(frame: &mut Frame, area: Rect, stats: &ServerStats) {
    let uptime = format_duration(stats.uptime_secs);
    let title = format!(" Kartline - Uptime: {} ", uptime);

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let text = format!(
        "Tick: {}  |  Phase: {}  |  Laps: {}  |  Snapshot: {}B",
        stats.tick,
        stats.phase.as_str(),
        stats.required_laps,
        stats.snapshot_bytes
    );

    let paragraph = Paragraph::new(text)
        .block(block)
        .style(Style::default().fg(Color::White));

    frame.render_widget(paragraph, area);
}

fn render_status(frame: &mut Frame, area: Rect, stats: &ServerStats) {
    let block = Block::default()
        .title(" Status ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));

    let readiness = stats.readiness;
    let ratio = if readiness.expected == 0 {
        0.0
    } else {
        readiness.ready as f64 / readiness.expected as f64
    };

    let (label, color) = match (&stats.winner, &stats.countdown_text) {
        (Some(winner), _) => (format!("{} wins the race!", winner), Color::Magenta),
        (None, Some(text)) => (text.clone(), Color::Yellow),
        (None, None) if stats.phase == RacePhase::Racing => ("Racing".to_string(), Color::Green),
        (None, None) => (readiness.label(), Color::Green),
    };

    let gauge = Gauge::default()
        .block(block)
        .gauge_style(Style::default().fg(color))
        .ratio(ratio.min(1.0))
        .label(label);

    frame.render_widget(gauge, area);
}

fn render_standings(frame: &mut Frame, area: Rect, stats: &ServerStats) {
    let block = Block::default()
        .title(" Standings ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let lines: Vec<Line> = stats
        .standings
        .iter()
        .map(|standing| standing_line(standing, stats.required_laps))
        .collect();

    let paragraph = Paragraph::new(lines).block(block);
    frame.render_widget(paragraph, area);
}

fn standing_line(standing: &Standing, required: u32) -> Line<'static> {
    let kind_color = match standing.kind {
        ParticipantKind::Player => Color::Cyan,
        ParticipantKind::Npc => Color::Gray,
    };

    let status = if standing.finished {
        Span::styled("finished", Style::default().fg(Color::Magenta))
    } else if standing.ready {
        Span::styled("ready", Style::default().fg(Color::Green))
    } else {
        Span::styled("waiting", Style::default().fg(Color::DarkGray))
    };

    Line::from(vec![
        Span::styled(
            format!("#{:<5}", standing.id),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            format!("{:<12}", standing.name),
            Style::default().fg(Color::White),
        ),
        Span::styled(
            format!("{:<8}", standing.kind.as_str()),
            Style::default().fg(kind_color),
        ),
        Span::styled(
            format!("{}/{} laps  ", standing.laps, required),
            Style::default().fg(Color::White),
        ),
        status,
    ])
}

fn render_log(frame: &mut Frame, area: Rect, state: &TuiState) {
    let title = if state.scroll > 0 {
        format!(" Events (scrolled {}) ", state.scroll)
    } else {
        " Events ".to_string()
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Blue));

    let height = area.height.saturating_sub(2) as usize;
    let lines: Vec<Line> = state
        .visible(height)
        .map(|(level, message)| {
            Line::from(Span::styled(
                message.clone(),
                Style::default().fg(level.color()),
            ))
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_help(frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .title(" Controls ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let text = Paragraph::new(
        "r ready | n add/reset NPC | x remove NPC | c cancel countdown | g restart | b pause NPCs | PgUp/PgDn scroll | q quit",
    )
    .block(block)
    .style(
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
    );

    frame.render_widget(text, area);
}

fn format_duration(secs: u64) -> String {
    let hours = secs / 3600;
    let mins = (secs % 3600) / 60;
    let secs = secs % 60;
    format!("{:02}:{:02}:{:02}", hours, mins, secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_are_clock_formatted() {
        assert_eq!(format_duration(0), "00:00:00");
        assert_eq!(format_duration(3723), "01:02:03");
    }

    #[test]
    fn log_window_follows_scroll() {
        let mut state = TuiState::new();
        for i in 0..10 {
            state.log_info(format!("line {}", i));
        }

        let newest: Vec<&str> = state.visible(3).map(|(_, m)| m.as_str()).collect();
        assert_eq!(newest, ["line 7", "line 8", "line 9"]);

        state.scroll_up();
        let scrolled: Vec<&str> = state.visible(3).map(|(_, m)| m.as_str()).collect();
        assert_eq!(scrolled, ["line 2", "line 3", "line 4"]);

        state.scroll_to_bottom();
        assert_eq!(state.visible(20).count(), 10);
    }
}
