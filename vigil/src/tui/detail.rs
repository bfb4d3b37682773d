//! Drill-down detail view: one process, three trend graphs.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Sparkline},
    Frame,
};

use crate::domain::Pid;
use crate::metrics::snapshot::ProcessRecord;
use crate::tui::history::{DetailHistory, HistoryBuffer};

use super::theme::{INFO_DIM, PANEL_BORDER};

/// Human-readable elapsed time: `2d 4h 23m 9s`, dropping leading zero units.
#[must_use]
pub fn format_uptime(total_secs: u64) -> String {
    let days = total_secs / 86_400;
    let hours = (total_secs % 86_400) / 3_600;
    let minutes = (total_secs % 3_600) / 60;
    let seconds = total_secs % 60;

    if days > 0 {
        format!("{days}d {hours}h {minutes}m {seconds}s")
    } else if hours > 0 {
        format!("{hours}h {minutes}m {seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}

pub fn render(
    f: &mut Frame,
    area: Rect,
    pid: Pid,
    record: Option<&ProcessRecord>,
    history: &DetailHistory,
) {
    let Some(record) = record else {
        render_not_found(f, area, pid);
        return;
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    let info = Paragraph::new(vec![
        Line::from(vec![
            Span::styled("PID: ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(pid.to_string()),
        ]),
        Line::from(vec![
            Span::styled("Name: ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(record.name.clone()),
        ]),
        Line::from(vec![
            Span::styled("Uptime: ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(format_uptime(record.elapsed_secs)),
        ]),
        Line::from(vec![
            Span::styled("Command: ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(record.command.clone()),
        ]),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Process Details ")
            .border_style(Style::default().fg(PANEL_BORDER)),
    );
    f.render_widget(info, rows[0]);

    let graphs = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(33),
            Constraint::Percentage(33),
            Constraint::Percentage(34),
        ])
        .split(rows[1]);

    render_trend(f, graphs[0], "CPU (%)", &history.cpu, Color::Green);
    render_trend(f, graphs[1], "Memory (KB)", &history.memory, Color::Blue);
    render_trend(f, graphs[2], "Network (B)", &history.network, Color::Cyan);

    let keys = Line::from(vec![
        Span::styled("ESC", Style::default().fg(PANEL_BORDER)),
        Span::styled(": Return  ", Style::default().fg(INFO_DIM)),
        Span::styled("Backspace", Style::default().fg(PANEL_BORDER)),
        Span::styled(": SIGTERM  ", Style::default().fg(INFO_DIM)),
        Span::styled("Delete", Style::default().fg(PANEL_BORDER)),
        Span::styled(": SIGKILL", Style::default().fg(INFO_DIM)),
    ]);
    f.render_widget(Paragraph::new(vec![keys]), rows[2]);
}

fn render_trend(f: &mut Frame, area: Rect, title: &str, buffer: &HistoryBuffer, color: Color) {
    let peak = buffer.max().unwrap_or(0.0);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let data: Vec<u64> = buffer.iter().map(|value| value.max(0.0).round() as u64).collect();

    let sparkline = Sparkline::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {title} (peak {peak:.0}) "))
                .border_style(Style::default().fg(PANEL_BORDER)),
        )
        .style(Style::default().fg(color))
        .data(&data);
    f.render_widget(sparkline, area);
}

fn render_not_found(f: &mut Frame, area: Rect, pid: Pid) {
    let message = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("process {pid} is no longer running"),
            Style::default().fg(INFO_DIM),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("ESC", Style::default().fg(PANEL_BORDER)),
            Span::styled(": Return", Style::default().fg(INFO_DIM)),
        ]),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Process Details ")
            .border_style(Style::default().fg(PANEL_BORDER)),
    );
    f.render_widget(message, area);
}
