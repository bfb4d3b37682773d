//! Input routing.
//!
//! Dispatches raw keyboard/mouse events against the view state, mediates
//! kill actions, and never mutates the shared snapshot directly. Kill keys
//! re-run the current sort+filter projection against a fresh snapshot copy
//! before indexing, because the raw list may have changed since the last
//! render.

use std::time::Instant;

use crossterm::event::{KeyCode, MouseButton, MouseEvent, MouseEventKind};

use crate::metrics::snapshot::Snapshot;
use crate::signals::{SignalSender, SIGKILL, SIGTERM};
use crate::tui::state::{Mode, ViewState};
use crate::tui::table::{self, HitMap, HitTarget};

/// What the caller should do after routing one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ignored,
    Handled,
    /// Launch an advisor recommendation over the current projection.
    Recommend,
    Quit,
}

pub struct EventRouter<S: SignalSender> {
    signals: S,
}

impl<S: SignalSender> EventRouter<S> {
    pub fn new(signals: S) -> Self {
        Self { signals }
    }

    pub fn handle_key(
        &self,
        view: &mut ViewState,
        snapshot: &Snapshot,
        code: KeyCode,
        now: Instant,
    ) -> Outcome {
        match view.mode {
            Mode::Search => Self::handle_search_key(view, code),
            Mode::Detail => self.handle_detail_key(view, snapshot, code),
            Mode::Normal => self.handle_normal_key(view, snapshot, code, now),
        }
    }

    fn handle_search_key(view: &mut ViewState, code: KeyCode) -> Outcome {
        match code {
            KeyCode::Esc => view.leave_search(false),
            KeyCode::Enter => view.leave_search(true),
            // Backspace edits the phrase here; it is never a kill key
            // while the filter is being edited
            KeyCode::Backspace => {
                if view.filter.pop().is_some() {
                    view.selected = 0;
                }
            }
            KeyCode::Char(c) => {
                view.filter.push(c);
                view.selected = 0;
            }
            _ => {}
        }
        // Everything else is consumed while editing
        Outcome::Handled
    }

    fn handle_normal_key(
        &self,
        view: &mut ViewState,
        snapshot: &Snapshot,
        code: KeyCode,
        now: Instant,
    ) -> Outcome {
        match code {
            KeyCode::Char('q') => Outcome::Quit,
            KeyCode::Char('/') => {
                view.enter_search();
                Outcome::Handled
            }
            KeyCode::Char('r') => Outcome::Recommend,
            KeyCode::Esc if !view.filter.is_empty() => {
                view.filter.clear();
                view.selected = 0;
                view.recommended = None;
                Outcome::Handled
            }
            KeyCode::Up | KeyCode::Char('k') => {
                view.move_selection(-1);
                Outcome::Handled
            }
            KeyCode::Down | KeyCode::Char('j') => {
                view.move_selection(1);
                Outcome::Handled
            }
            KeyCode::PageUp => {
                view.move_selection(-10);
                Outcome::Handled
            }
            KeyCode::PageDown => {
                view.move_selection(10);
                Outcome::Handled
            }
            KeyCode::Enter => {
                let projection = table::project(&snapshot.processes, view);
                if let Some(row) = projection.selected_row() {
                    view.enter_detail(row.pid, now);
                }
                Outcome::Handled
            }
            KeyCode::Backspace => self.kill_selected(view, snapshot, SIGTERM),
            KeyCode::Delete => self.kill_selected(view, snapshot, SIGKILL),
            _ => Outcome::Ignored,
        }
    }

    /// Kill the process at the selected *visible* row.
    fn kill_selected(&self, view: &mut ViewState, snapshot: &Snapshot, signal: i32) -> Outcome {
        let projection = table::project(&snapshot.processes, view);
        if let Some(row) = projection.rows.get(projection.selected) {
            self.signals.send(row.pid, signal);
            view.recommended = None;
        }
        Outcome::Handled
    }

    fn handle_detail_key(
        &self,
        view: &mut ViewState,
        snapshot: &Snapshot,
        code: KeyCode,
    ) -> Outcome {
        match code {
            KeyCode::Esc => view.leave_detail(),
            KeyCode::Backspace | KeyCode::Delete => {
                let signal = if code == KeyCode::Backspace { SIGTERM } else { SIGKILL };
                // Kill by id, only while the process is still present
                if let Some(pid) = view.detail_pid {
                    if snapshot.find(pid).is_some() {
                        self.signals.send(pid, signal);
                        view.recommended = None;
                    }
                }
                view.leave_detail();
            }
            _ => {}
        }
        Outcome::Handled
    }

    pub fn handle_mouse(
        &self,
        view: &mut ViewState,
        snapshot: &Snapshot,
        hits: &HitMap,
        event: MouseEvent,
        now: Instant,
    ) -> Outcome {
        if view.mode == Mode::Detail {
            return Outcome::Ignored;
        }

        match event.kind {
            MouseEventKind::ScrollUp => {
                view.move_selection(-1);
                Outcome::Handled
            }
            MouseEventKind::ScrollDown => {
                view.move_selection(1);
                Outcome::Handled
            }
            MouseEventKind::Moved => {
                Self::update_hover(view, hits, event.column, event.row);
                Outcome::Handled
            }
            MouseEventKind::Up(MouseButton::Left) => {
                self.handle_left_click(view, snapshot, hits, event.column, event.row, now)
            }
            _ => Outcome::Ignored,
        }
    }

    fn update_hover(view: &mut ViewState, hits: &HitMap, x: u16, y: u16) {
        view.hover_row = None;
        view.hover_sigterm = None;
        view.hover_sigkill = None;
        match hits.hit(x, y) {
            Some(HitTarget::Row(row)) => view.hover_row = Some(row),
            Some(HitTarget::SigTerm(row)) => {
                view.hover_row = Some(row);
                view.hover_sigterm = Some(row);
            }
            Some(HitTarget::SigKill(row)) => {
                view.hover_row = Some(row);
                view.hover_sigkill = Some(row);
            }
            _ => {}
        }
    }

    fn handle_left_click(
        &self,
        view: &mut ViewState,
        snapshot: &Snapshot,
        hits: &HitMap,
        x: u16,
        y: u16,
        now: Instant,
    ) -> Outcome {
        match hits.hit(x, y) {
            Some(HitTarget::Header(column)) => {
                view.toggle_sort(column);
                Outcome::Handled
            }
            // Kill buttons act on the row without changing selection
            Some(HitTarget::SigTerm(row)) => self.kill_row(view, snapshot, row, SIGTERM),
            Some(HitTarget::SigKill(row)) => self.kill_row(view, snapshot, row, SIGKILL),
            Some(HitTarget::Row(row)) => {
                if view.register_click(row, now) {
                    if let Some(&pid) = view.displayed_pids.get(row) {
                        view.enter_detail(pid, now);
                    }
                }
                Outcome::Handled
            }
            None => Outcome::Ignored,
        }
    }

    fn kill_row(
        &self,
        view: &mut ViewState,
        snapshot: &Snapshot,
        row: usize,
        signal: i32,
    ) -> Outcome {
        let projection = table::project(&snapshot.processes, view);
        if let Some(target) = projection.rows.get(row) {
            self.signals.send(target.pid, signal);
            view.recommended = None;
        }
        Outcome::Handled
    }
}
