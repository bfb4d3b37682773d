//! # Terminal User Interface (TUI)
//!
//! Interactive terminal UI using `ratatui` for the live process table.
//!
//! ## View Modes
//!
//! - **Normal** - Process table with navigation, sort and kill keys
//! - **Search** - Text input filtering by name or pid
//! - **Detail** - Drill-down into one process with trend graphs
//!
//! ## Sub-Modules
//!
//! - `table` - Projection (sort/filter/clamp) and hit regions
//! - `input` - Event routing and kill mediation
//! - `state` - Interaction state machine
//! - `history` - Ring buffers behind the trend graphs
//! - `detail` - Drill-down view
//! - `status` - Host aggregate header
//! - `theme` - Color scheme
//!
//! The shell below stays thin: it owns the terminal, copies snapshots out
//! of the shared lock, and delegates everything the core cares about to the
//! testable sub-modules.

// TUI rendering intentionally uses precision-losing casts for display
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::too_many_lines
)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossbeam_channel::Receiver;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind,
        KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::warn;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};

pub mod detail;
pub mod history;
pub mod input;
pub mod state;
pub mod status;
pub mod table;
mod theme;

use crate::advisor::{self, Recommender};
use crate::metrics::snapshot::{ProcessRecord, SharedSnapshot, Snapshot};
use crate::signals::SignalSender;
use input::{EventRouter, Outcome};
use state::{Mode, SortColumn, ViewState};
use status::StatusPanel;
use table::{column_layout, HitMap, Projection};
use theme::{
    ADVISED_AMBER, HOVER_BG, INFO_DIM, KILL_RED, PANEL_BORDER, SEARCH_YELLOW, SELECTED_BG,
    TERM_RED,
};

#[derive(Debug, Clone)]
pub struct UiConfig {
    /// Sampler refresh period; gates history recording.
    pub refresh: Duration,
    /// Samples retained per trend graph.
    pub history_capacity: usize,
}

/// Run the foreground render/input loop until the user quits.
///
/// The loop never blocks on the sampler: a contended snapshot lock means
/// this frame reuses the previous copy.
///
/// # Errors
/// Returns an error if terminal setup or rendering fails
pub fn run<S: SignalSender>(
    shared: &SharedSnapshot,
    redraw_rx: &Receiver<()>,
    signals: S,
    recommender: Option<Arc<dyn Recommender>>,
    runtime: &tokio::runtime::Handle,
    config: &UiConfig,
) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_loop(&mut terminal, shared, redraw_rx, signals, recommender, runtime, config);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    result
}

fn run_loop<S: SignalSender>(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    shared: &SharedSnapshot,
    redraw_rx: &Receiver<()>,
    signals: S,
    recommender: Option<Arc<dyn Recommender>>,
    runtime: &tokio::runtime::Handle,
    config: &UiConfig,
) -> Result<()> {
    let mut view = ViewState::new(config.history_capacity);
    let router = EventRouter::new(signals);
    let mut snapshot = shared.copy();
    let mut hits = HitMap::empty();
    let mut pending: Option<advisor::RecommendationTask> = None;

    loop {
        // Fresh copy when the sampler signaled; skip the frame's copy on
        // lock contention rather than stalling input handling
        if redraw_rx.try_recv().is_ok() {
            if let Some(fresh) = shared.try_copy() {
                snapshot = fresh;
            }
        }

        if let Some(task) = pending.as_mut() {
            if let Some(outcome) = task.poll() {
                match outcome {
                    Ok(pid) => view.recommended = Some(pid),
                    Err(e) => warn!("advisor: {e}"),
                }
                pending = None;
            }
        }

        let projection = table::project(&snapshot.processes, &view);
        view.selected = projection.selected;
        view.visible_rows = projection.rows.len();
        view.displayed_pids = projection.displayed_pids();

        if view.mode == Mode::Detail {
            let record = view.detail_pid.and_then(|pid| snapshot.find(pid)).cloned();
            view.history.record(record.as_ref(), config.refresh, Instant::now());
        }

        terminal.draw(|f| {
            hits = render_frame(f, &snapshot, &projection, &view);
        })?;

        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if key.code == KeyCode::Char('c')
                        && key.modifiers.contains(KeyModifiers::CONTROL)
                    {
                        break;
                    }
                    // Kill and drill actions index the live list, not the
                    // rendered copy
                    let fresh = shared.try_copy().unwrap_or_else(|| snapshot.clone());
                    match router.handle_key(&mut view, &fresh, key.code, Instant::now()) {
                        Outcome::Quit => break,
                        Outcome::Recommend => {
                            if pending.is_none() {
                                if let Some(recommender) = recommender.as_ref() {
                                    pending = Some(advisor::spawn(
                                        runtime,
                                        Arc::clone(recommender),
                                        &projection.rows,
                                    ));
                                }
                            }
                        }
                        Outcome::Handled | Outcome::Ignored => {}
                    }
                }
                Event::Mouse(mouse) => {
                    let fresh = shared.try_copy().unwrap_or_else(|| snapshot.clone());
                    router.handle_mouse(&mut view, &fresh, &hits, mouse, Instant::now());
                }
                _ => {}
            }
        }
    }

    Ok(())
}

// =============================================================================
// FRAME RENDERING
// =============================================================================

fn render_frame(
    f: &mut Frame,
    snapshot: &Snapshot,
    projection: &Projection,
    view: &ViewState,
) -> HitMap {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Host status
            Constraint::Min(0),    // Table or detail
            Constraint::Length(1), // Search bar / key hints
        ])
        .split(f.area());

    StatusPanel::new(&snapshot.host).render(f, outer[0]);

    let hits = if view.mode == Mode::Detail {
        if let Some(pid) = view.detail_pid {
            detail::render(f, outer[1], pid, snapshot.find(pid), &view.history);
        }
        HitMap::empty()
    } else {
        render_table(f, outer[1], projection, view)
    };

    render_footer(f, outer[2], view);
    hits
}

fn render_table(f: &mut Frame, area: Rect, projection: &Projection, view: &ViewState) -> HitMap {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(table_title(projection, view))
        .border_style(Style::default().fg(PANEL_BORDER));
    let inner = block.inner(area);
    f.render_widget(block, area);

    if inner.height < 2 {
        return HitMap::empty();
    }

    // One header line, the rest data; keep the selection visible
    let visible = (inner.height - 1) as usize;
    let first_row = view.selected.saturating_sub(visible.saturating_sub(1));
    let shown = projection.rows.len().saturating_sub(first_row).min(visible);

    let mut lines = vec![header_line(inner, view)];
    for (offset, record) in projection.rows.iter().skip(first_row).take(shown).enumerate() {
        let row = first_row + offset;
        lines.push(row_line(inner, record, row, view));
    }
    f.render_widget(Paragraph::new(lines), inner);

    HitMap::build(inner, first_row, shown)
}

fn table_title(projection: &Projection, view: &ViewState) -> String {
    if view.filter.is_empty() {
        format!(" Processes ({}) ", projection.rows.len())
    } else {
        format!(" Processes ({} matching \"{}\") ", projection.rows.len(), view.filter)
    }
}

fn sort_indicator(view: &ViewState, column: SortColumn) -> &'static str {
    if view.sort_column != column {
        ""
    } else if view.sort_ascending {
        " ▲"
    } else {
        " ▼"
    }
}

fn header_line(area: Rect, view: &ViewState) -> Line<'static> {
    let cell = |label: &str, column: SortColumn, width: u16| {
        fit(&format!("{label}{}", sort_indicator(view, column)), width as usize)
    };

    let text = format!(
        "{} {} {} {} {} {} {} {}",
        fit("Kill", table::COL_KILL_WIDTH as usize),
        cell("PID", SortColumn::Pid, table::COL_PID_WIDTH),
        cell("Name", SortColumn::Name, table::COL_NAME_WIDTH),
        cell("MEM (KB)", SortColumn::Memory, table::COL_MEMORY_WIDTH),
        cell("CPU (%)", SortColumn::Cpu, table::COL_CPU_WIDTH),
        cell("NET (B)", SortColumn::Network, table::COL_NETWORK_WIDTH),
        cell("TIME+", SortColumn::Time, table::COL_TIME_WIDTH),
        cell("Command", SortColumn::Command, remaining_width(area)),
    );
    Line::from(Span::styled(text, Style::default().add_modifier(Modifier::BOLD)))
}

fn row_line(area: Rect, record: &ProcessRecord, row: usize, view: &ViewState) -> Line<'static> {
    let sigterm_style = if view.hover_sigterm == Some(row) {
        Style::default().fg(TERM_RED).bg(ratatui::style::Color::White).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(TERM_RED)
    };
    let sigkill_style = if view.hover_sigkill == Some(row) {
        Style::default().fg(KILL_RED).bg(ratatui::style::Color::White).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(KILL_RED)
    };

    let body = format!(
        "{} {} {} {} {} {} {}",
        fit(&record.pid.to_string(), table::COL_PID_WIDTH as usize),
        fit(&record.name, table::COL_NAME_WIDTH as usize),
        fit(&record.memory_kb.to_string(), table::COL_MEMORY_WIDTH as usize),
        fit(&format!("{:.2}", record.cpu_percent), table::COL_CPU_WIDTH as usize),
        fit(&record.net_delta.to_string(), table::COL_NETWORK_WIDTH as usize),
        fit(&detail::format_uptime(record.elapsed_secs), table::COL_TIME_WIDTH as usize),
        fit(&record.command, remaining_width(area) as usize),
    );

    let mut body_style = Style::default();
    if view.recommended == Some(record.pid) {
        body_style = body_style.fg(ADVISED_AMBER);
    }
    if row == view.selected {
        body_style = body_style.bg(SELECTED_BG).add_modifier(Modifier::BOLD);
    } else if view.hover_row == Some(row) {
        body_style = body_style.bg(HOVER_BG);
    }

    Line::from(vec![
        Span::styled("x", sigterm_style),
        Span::raw(" "),
        Span::styled("☠ ", sigkill_style),
        Span::raw(" "),
        Span::styled(body, body_style),
    ])
}

fn render_footer(f: &mut Frame, area: Rect, view: &ViewState) {
    let line = if view.mode == Mode::Search || !view.filter.is_empty() {
        let cursor = if view.mode == Mode::Search { "_" } else { "" };
        Line::from(Span::styled(
            format!("/{}{cursor}", view.filter),
            Style::default().fg(SEARCH_YELLOW).add_modifier(Modifier::BOLD),
        ))
    } else {
        Line::from(vec![
            Span::styled("q", Style::default().fg(PANEL_BORDER)),
            Span::styled(":Quit  ", Style::default().fg(INFO_DIM)),
            Span::styled("/", Style::default().fg(PANEL_BORDER)),
            Span::styled(":Search  ", Style::default().fg(INFO_DIM)),
            Span::styled("Enter", Style::default().fg(PANEL_BORDER)),
            Span::styled(":Detail  ", Style::default().fg(INFO_DIM)),
            Span::styled("Backspace", Style::default().fg(PANEL_BORDER)),
            Span::styled(":SIGTERM  ", Style::default().fg(INFO_DIM)),
            Span::styled("Delete", Style::default().fg(PANEL_BORDER)),
            Span::styled(":SIGKILL  ", Style::default().fg(INFO_DIM)),
            Span::styled("r", Style::default().fg(PANEL_BORDER)),
            Span::styled(":Advise", Style::default().fg(INFO_DIM)),
        ])
    };
    f.render_widget(Paragraph::new(vec![line]), area);
}

fn remaining_width(area: Rect) -> u16 {
    let layout = column_layout(area);
    layout.right.saturating_sub(layout.command_x)
}

/// Pad or truncate to an exact display width.
fn fit(text: &str, width: usize) -> String {
    let mut out: String = text.chars().take(width).collect();
    while out.chars().count() < width {
        out.push(' ');
    }
    out
}
