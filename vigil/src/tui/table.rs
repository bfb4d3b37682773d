//! Table projection: sort, filter, selection clamp, hit regions.
//!
//! `project` is a pure function from a snapshot copy and the view state to
//! the ordered row list; nothing here touches the terminal or the shared
//! snapshot lock. The hit map is a plain value rebuilt each projection so
//! mouse routing stays testable independent of rendering.

use ratatui::layout::{Position, Rect};

use crate::domain::Pid;
use crate::metrics::snapshot::ProcessRecord;
use crate::tui::state::{SortColumn, ViewState};

/// Sorting is skipped above this row count to bound worst-case tick
/// latency; the previous order carries through the stable input.
pub const SORT_GUARD: usize = 10_000;

// Column widths; the command column takes the remaining width.
pub const COL_KILL_WIDTH: u16 = 4;
pub const COL_PID_WIDTH: u16 = 10;
pub const COL_NAME_WIDTH: u16 = 20;
pub const COL_MEMORY_WIDTH: u16 = 12;
pub const COL_CPU_WIDTH: u16 = 10;
pub const COL_NETWORK_WIDTH: u16 = 12;
pub const COL_TIME_WIDTH: u16 = 12;

/// The sorted, filtered view of a snapshot ready for display.
#[derive(Debug, Clone)]
pub struct Projection {
    pub rows: Vec<ProcessRecord>,
    /// Selection re-clamped to `[0, rows.len())` (0 when empty).
    pub selected: usize,
}

impl Projection {
    #[must_use]
    pub fn selected_row(&self) -> Option<&ProcessRecord> {
        self.rows.get(self.selected)
    }

    #[must_use]
    pub fn displayed_pids(&self) -> Vec<Pid> {
        self.rows.iter().map(|row| row.pid).collect()
    }
}

/// Project a snapshot copy through the view state.
#[must_use]
pub fn project(records: &[ProcessRecord], view: &ViewState) -> Projection {
    let mut rows: Vec<ProcessRecord> = records.to_vec();

    if rows.len() <= SORT_GUARD {
        sort_rows(&mut rows, view.sort_column, view.sort_ascending);
    }

    if !view.filter.is_empty() {
        let needle = view.filter.to_lowercase();
        rows.retain(|row| matches_filter(row, &needle));
    }

    let selected = clamp_selection(view.selected, rows.len());
    Projection { rows, selected }
}

/// Case-insensitive substring match on the name, or substring of the pid's
/// decimal string. `needle` must already be lowercased.
#[must_use]
pub fn matches_filter(record: &ProcessRecord, needle: &str) -> bool {
    record.name.to_lowercase().contains(needle) || record.pid.to_string().contains(needle)
}

#[must_use]
pub fn clamp_selection(selected: usize, row_count: usize) -> usize {
    if row_count == 0 {
        0
    } else {
        selected.min(row_count - 1)
    }
}

fn sort_rows(rows: &mut [ProcessRecord], column: SortColumn, ascending: bool) {
    // Stable sort: equal keys keep their prior relative order
    rows.sort_by(|a, b| {
        let ordering = match column {
            SortColumn::Pid => a.pid.cmp(&b.pid),
            SortColumn::Name => a.name.cmp(&b.name),
            SortColumn::Memory => a.memory_kb.cmp(&b.memory_kb),
            SortColumn::Cpu => a.cpu_percent.total_cmp(&b.cpu_percent),
            SortColumn::Network => a.net_delta.cmp(&b.net_delta),
            SortColumn::Time => a.elapsed_secs.cmp(&b.elapsed_secs),
            SortColumn::Command => a.command.cmp(&b.command),
        };
        if ascending {
            ordering
        } else {
            ordering.reverse()
        }
    });
}

/// Left x of each column within a table area.
#[derive(Debug, Clone, Copy)]
pub struct ColumnLayout {
    pub kill_x: u16,
    pub pid_x: u16,
    pub name_x: u16,
    pub memory_x: u16,
    pub cpu_x: u16,
    pub network_x: u16,
    pub time_x: u16,
    pub command_x: u16,
    pub right: u16,
}

#[must_use]
pub fn column_layout(area: Rect) -> ColumnLayout {
    let kill_x = area.x;
    let pid_x = kill_x + COL_KILL_WIDTH + 1;
    let name_x = pid_x + COL_PID_WIDTH + 1;
    let memory_x = name_x + COL_NAME_WIDTH + 1;
    let cpu_x = memory_x + COL_MEMORY_WIDTH + 1;
    let network_x = cpu_x + COL_CPU_WIDTH + 1;
    let time_x = network_x + COL_NETWORK_WIDTH + 1;
    let command_x = time_x + COL_TIME_WIDTH + 1;
    ColumnLayout {
        kill_x,
        pid_x,
        name_x,
        memory_x,
        cpu_x,
        network_x,
        time_x,
        command_x,
        right: area.x + area.width,
    }
}

/// What a mouse position resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    /// Row index into the full projection.
    Row(usize),
    /// Terminate button of the given row.
    SigTerm(usize),
    /// Force-kill button of the given row.
    SigKill(usize),
    Header(SortColumn),
}

/// Bounding regions of every interactive cell, rebuilt each render.
#[derive(Debug, Clone, Default)]
pub struct HitMap {
    rows: Vec<(usize, Rect)>,
    sigterm: Vec<(usize, Rect)>,
    sigkill: Vec<(usize, Rect)>,
    headers: Vec<(SortColumn, Rect)>,
}

impl HitMap {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build regions for a table occupying `area`: one header line, then
    /// `visible` data rows starting at absolute row `first_row`.
    #[must_use]
    pub fn build(area: Rect, first_row: usize, visible: usize) -> Self {
        let layout = column_layout(area);
        let header_y = area.y;
        let cell = |x: u16, y: u16, width: u16| Rect::new(x, y, width, 1);

        let headers = vec![
            (SortColumn::Pid, cell(layout.pid_x, header_y, COL_PID_WIDTH)),
            (SortColumn::Name, cell(layout.name_x, header_y, COL_NAME_WIDTH)),
            (SortColumn::Memory, cell(layout.memory_x, header_y, COL_MEMORY_WIDTH)),
            (SortColumn::Cpu, cell(layout.cpu_x, header_y, COL_CPU_WIDTH)),
            (SortColumn::Network, cell(layout.network_x, header_y, COL_NETWORK_WIDTH)),
            (SortColumn::Time, cell(layout.time_x, header_y, COL_TIME_WIDTH)),
            (
                SortColumn::Command,
                cell(layout.command_x, header_y, layout.right.saturating_sub(layout.command_x)),
            ),
        ];

        let mut rows = Vec::with_capacity(visible);
        let mut sigterm = Vec::with_capacity(visible);
        let mut sigkill = Vec::with_capacity(visible);
        for offset in 0..visible {
            #[allow(clippy::cast_possible_truncation)]
            let y = header_y + 1 + offset as u16;
            if y >= area.y + area.height {
                break;
            }
            let row = first_row + offset;
            rows.push((row, cell(area.x, y, area.width)));
            sigterm.push((row, cell(layout.kill_x, y, 1)));
            sigkill.push((row, cell(layout.kill_x + 2, y, 2)));
        }

        Self { rows, sigterm, sigkill, headers }
    }

    /// Resolve a position. Kill-button cells win over the enclosing row's
    /// general region; headers are checked before rows.
    #[must_use]
    pub fn hit(&self, x: u16, y: u16) -> Option<HitTarget> {
        let position = Position { x, y };
        let find = |cells: &[(usize, Rect)]| {
            cells.iter().find(|(_, rect)| rect.contains(position)).map(|(row, _)| *row)
        };

        if let Some(row) = find(&self.sigterm) {
            return Some(HitTarget::SigTerm(row));
        }
        if let Some(row) = find(&self.sigkill) {
            return Some(HitTarget::SigKill(row));
        }
        if let Some(&(column, _)) =
            self.headers.iter().find(|(_, rect)| rect.contains(position))
        {
            return Some(HitTarget::Header(column));
        }
        find(&self.rows).map(HitTarget::Row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::state::ViewState;

    fn record(pid: i32, name: &str, memory_kb: u64, cpu: f64, net: u64) -> ProcessRecord {
        ProcessRecord {
            pid: Pid(pid),
            name: name.to_string(),
            memory_kb,
            cpu_percent: cpu,
            net_delta: net,
            elapsed_secs: u64::try_from(pid).unwrap_or(0),
            command: format!("/usr/bin/{name}"),
        }
    }

    fn view() -> ViewState {
        ViewState::new(60)
    }

    #[test]
    fn test_default_sort_is_cpu_descending() {
        let records =
            [record(1, "a", 0, 5.0, 0), record(2, "b", 0, 9.0, 0), record(3, "c", 0, 7.0, 0)];
        let projection = project(&records, &view());
        let pids: Vec<i32> = projection.rows.iter().map(|r| r.pid.0).collect();
        assert_eq!(pids, vec![2, 3, 1]);
    }

    #[test]
    fn test_sort_is_stable_on_ties() {
        let records =
            [record(1, "a", 0, 5.0, 0), record(2, "b", 0, 5.0, 0), record(3, "c", 0, 9.0, 0)];
        let projection = project(&records, &view());
        let pids: Vec<i32> = projection.rows.iter().map(|r| r.pid.0).collect();
        assert_eq!(pids, vec![3, 1, 2]);
    }

    #[test]
    fn test_sort_by_name_ascending_is_case_preserved_lexicographic() {
        let mut state = view();
        state.sort_column = SortColumn::Name;
        state.sort_ascending = true;
        let records =
            [record(1, "chrome", 0, 0.0, 0), record(2, "Bash", 0, 0.0, 0), record(3, "awk", 0, 0.0, 0)];
        let projection = project(&records, &state);
        let names: Vec<&str> = projection.rows.iter().map(|r| r.name.as_str()).collect();
        // Uppercase sorts before lowercase in a case-preserved comparison
        assert_eq!(names, vec!["Bash", "awk", "chrome"]);
    }

    #[test]
    fn test_numeric_columns_compare_numerically() {
        let mut state = view();
        state.sort_column = SortColumn::Memory;
        state.sort_ascending = true;
        let records =
            [record(1, "a", 900, 0.0, 0), record(2, "b", 20, 0.0, 0), record(3, "c", 100, 0.0, 0)];
        let projection = project(&records, &state);
        let memory: Vec<u64> = projection.rows.iter().map(|r| r.memory_kb).collect();
        assert_eq!(memory, vec![20, 100, 900]);
    }

    #[test]
    fn test_filter_matches_name_case_insensitively() {
        let mut state = view();
        state.filter = "CH".to_string();
        let records = [record(1000, "chrome", 0, 0.0, 0), record(2000, "firefox", 0, 0.0, 0)];
        let projection = project(&records, &state);
        assert_eq!(projection.rows.len(), 1);
        assert_eq!(projection.rows[0].pid, Pid(1000));
    }

    #[test]
    fn test_filter_matches_pid_substring() {
        let mut state = view();
        state.filter = "200".to_string();
        let records = [record(1000, "chrome", 0, 0.0, 0), record(2000, "firefox", 0, 0.0, 0)];
        let projection = project(&records, &state);
        assert_eq!(projection.rows.len(), 1);
        assert_eq!(projection.rows[0].pid, Pid(2000));
    }

    #[test]
    fn test_empty_filter_passes_everything() {
        let records = [record(1, "a", 0, 0.0, 0), record(2, "b", 0, 0.0, 0)];
        let projection = project(&records, &view());
        assert_eq!(projection.rows.len(), 2);
    }

    #[test]
    fn test_selection_clamps_when_filter_narrows() {
        let mut state = view();
        state.selected = 5;
        let records = [
            record(1000, "chrome", 0, 0.0, 0),
            record(2000, "firefox", 0, 0.0, 0),
            record(3000, "code", 0, 0.0, 0),
            record(4000, "terminal", 0, 0.0, 0),
        ];
        state.filter = "code".to_string();
        let projection = project(&records, &state);
        assert_eq!(projection.rows.len(), 1);
        assert_eq!(projection.selected, 0);
    }

    #[test]
    fn test_selection_zero_when_nothing_matches() {
        let mut state = view();
        state.selected = 2;
        state.filter = "no-such-process".to_string();
        let projection = project(&[record(1, "a", 0, 0.0, 0)], &state);
        assert!(projection.rows.is_empty());
        assert_eq!(projection.selected, 0);
        assert!(projection.selected_row().is_none());
    }

    #[test]
    fn test_sort_guard_preserves_input_order() {
        let records: Vec<ProcessRecord> =
            (0..=SORT_GUARD as i32).map(|i| record(i, "p", 0, f64::from(i), 0)).collect();
        let projection = project(&records, &view());
        // CPU descending would reverse; the guard keeps input order
        assert_eq!(projection.rows[0].pid, Pid(0));
        assert_eq!(projection.rows.len(), SORT_GUARD + 1);
    }

    #[test]
    fn test_hit_map_resolves_cells() {
        let area = Rect::new(0, 0, 120, 20);
        let hits = HitMap::build(area, 0, 5);
        let layout = column_layout(area);

        // Header cells
        assert_eq!(hits.hit(layout.pid_x, 0), Some(HitTarget::Header(SortColumn::Pid)));
        assert_eq!(hits.hit(layout.cpu_x + 3, 0), Some(HitTarget::Header(SortColumn::Cpu)));
        assert_eq!(hits.hit(layout.command_x + 10, 0), Some(HitTarget::Header(SortColumn::Command)));

        // Kill buttons win over the row's general region
        assert_eq!(hits.hit(layout.kill_x, 1), Some(HitTarget::SigTerm(0)));
        assert_eq!(hits.hit(layout.kill_x + 2, 3), Some(HitTarget::SigKill(2)));

        // Anywhere else in a data row resolves to the row
        assert_eq!(hits.hit(layout.name_x + 4, 2), Some(HitTarget::Row(1)));

        // Below the last visible row is a miss
        assert_eq!(hits.hit(10, 12), None);
    }

    #[test]
    fn test_hit_map_offsets_rows_by_scroll_position() {
        let area = Rect::new(0, 0, 120, 20);
        let hits = HitMap::build(area, 7, 3);
        assert_eq!(hits.hit(50, 1), Some(HitTarget::Row(7)));
        assert_eq!(hits.hit(50, 3), Some(HitTarget::Row(9)));
    }

    #[test]
    fn test_hit_map_never_extends_past_the_area() {
        let area = Rect::new(0, 0, 120, 4);
        // Asked for more rows than fit: header + 3 data lines
        let hits = HitMap::build(area, 0, 10);
        assert_eq!(hits.hit(50, 3), Some(HitTarget::Row(2)));
        assert_eq!(hits.hit(50, 4), None);
    }
}
