//! Interaction state for the process table.
//!
//! Owned exclusively by the foreground thread; the sampler never touches
//! it. Timing-sensitive transitions take an `Instant` so tests control the
//! clock.

use std::time::{Duration, Instant};

use crate::domain::Pid;
use crate::tui::history::DetailHistory;

/// Two clicks on the same row within this window drill down.
pub const DOUBLE_CLICK_WINDOW: Duration = Duration::from_millis(300);

/// Current view mode determines what's displayed and how input is routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Process table with navigation and kill keys.
    Normal,
    /// Text input editing the filter; editing keys are consumed here.
    Search,
    /// Detail view of a single process with trend graphs.
    Detail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Pid,
    Name,
    Memory,
    Cpu,
    Network,
    Time,
    Command,
}

impl SortColumn {
    /// Direction applied when a header click switches to this column.
    #[must_use]
    pub fn default_ascending(self) -> bool {
        matches!(self, SortColumn::Pid | SortColumn::Name | SortColumn::Command)
    }
}

pub struct ViewState {
    pub mode: Mode,
    /// Index into the *visible* (projected) row list, never the raw list.
    pub selected: usize,
    pub hover_row: Option<usize>,
    pub hover_sigterm: Option<usize>,
    pub hover_sigkill: Option<usize>,
    /// Free-text filter; empty passes everything.
    pub filter: String,
    pub sort_column: SortColumn,
    pub sort_ascending: bool,
    pub detail_pid: Option<Pid>,
    pub history: DetailHistory,
    /// Pid highlighted as the advisor's kill candidate.
    pub recommended: Option<Pid>,
    /// Row count of the last projection; bounds selection movement.
    pub visible_rows: usize,
    /// Pids of the last projection in display order, for click resolution.
    pub displayed_pids: Vec<Pid>,
    last_click: Option<(usize, Instant)>,
}

impl ViewState {
    #[must_use]
    pub fn new(history_capacity: usize) -> Self {
        Self {
            mode: Mode::Normal,
            selected: 0,
            hover_row: None,
            hover_sigterm: None,
            hover_sigkill: None,
            filter: String::new(),
            sort_column: SortColumn::Cpu,
            sort_ascending: false,
            detail_pid: None,
            history: DetailHistory::new(history_capacity),
            recommended: None,
            visible_rows: 0,
            displayed_pids: Vec::new(),
            last_click: None,
        }
    }

    /// Move the selection by `delta` rows, clamped to the visible list.
    pub fn move_selection(&mut self, delta: isize) {
        if self.visible_rows == 0 {
            self.selected = 0;
            return;
        }
        let max = self.visible_rows - 1;
        #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
        {
            let moved = (self.selected as isize + delta).clamp(0, max as isize);
            self.selected = moved as usize;
        }
    }

    /// Header click: toggle direction on the active column, otherwise
    /// switch columns and reset to that column's default direction.
    pub fn toggle_sort(&mut self, column: SortColumn) {
        if self.sort_column == column {
            self.sort_ascending = !self.sort_ascending;
        } else {
            self.sort_column = column;
            self.sort_ascending = column.default_ascending();
        }
    }

    pub fn enter_search(&mut self) {
        self.mode = Mode::Search;
        self.filter.clear();
        self.selected = 0;
    }

    /// Enter keeps the filter; Escape discards it.
    pub fn leave_search(&mut self, keep_filter: bool) {
        self.mode = Mode::Normal;
        if !keep_filter {
            self.filter.clear();
            self.selected = 0;
        }
    }

    pub fn enter_detail(&mut self, pid: Pid, now: Instant) {
        self.mode = Mode::Detail;
        self.detail_pid = Some(pid);
        self.history.clear();
        self.history.mark(now);
    }

    pub fn leave_detail(&mut self) {
        self.mode = Mode::Normal;
        self.detail_pid = None;
        self.history.clear();
    }

    /// Register a left click on a visible row. Selects the row and reports
    /// whether this was the second click of a double-click.
    pub fn register_click(&mut self, row: usize, now: Instant) -> bool {
        let double = matches!(
            self.last_click,
            Some((last_row, at)) if last_row == row && now.duration_since(at) < DOUBLE_CLICK_WINDOW
        );
        self.selected = row;
        self.last_click = Some((row, now));
        double
    }
}
