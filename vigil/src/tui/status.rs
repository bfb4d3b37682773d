//! Host status panel - aggregate CPU, memory and process counts.

use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::metrics::snapshot::HostMetrics;

use super::theme::{load_color, INFO_DIM, PANEL_BORDER};

pub struct StatusPanel {
    cpu_label: String,
    cpu_value: Option<f64>,
    core_summary: String,
    memory_label: String,
    memory_pct: Option<f64>,
    process_label: String,
}

impl StatusPanel {
    #[must_use]
    pub fn new(host: &HostMetrics) -> Self {
        // An undefined reading renders as a dash, never as a false zero
        let cpu_label = host
            .cpu
            .overall
            .map_or_else(|| "CPU --".to_string(), |pct| format!("CPU {pct:5.1}%"));

        let defined = host.cpu.per_core.iter().flatten().count();
        let core_summary = format!("{defined}/{} cores reporting", host.cpu.core_count());

        let used_mb = host.mem_used_kb() / 1024;
        let total_mb = host.mem_total_kb / 1024;
        let memory_label = format!("MEM {used_mb} / {total_mb} MB");
        #[allow(clippy::cast_precision_loss)]
        let memory_pct = (host.mem_total_kb > 0)
            .then(|| 100.0 * host.mem_used_kb() as f64 / host.mem_total_kb as f64);

        Self {
            cpu_label,
            cpu_value: host.cpu.overall,
            core_summary,
            memory_label,
            memory_pct,
            process_label: format!("{} processes", host.process_count),
        }
    }

    pub fn render(&self, f: &mut Frame, area: Rect) {
        let cpu_style = self
            .cpu_value
            .map_or_else(|| Style::default().fg(INFO_DIM), |pct| Style::default().fg(load_color(pct)));
        let memory_style = self
            .memory_pct
            .map_or_else(|| Style::default().fg(INFO_DIM), |pct| Style::default().fg(load_color(pct)));

        let line = Line::from(vec![
            Span::styled(self.cpu_label.clone(), cpu_style),
            Span::styled("  |  ", Style::default().fg(INFO_DIM)),
            Span::styled(self.core_summary.clone(), Style::default().fg(INFO_DIM)),
            Span::styled("  |  ", Style::default().fg(INFO_DIM)),
            Span::styled(self.memory_label.clone(), memory_style),
            Span::styled("  |  ", Style::default().fg(INFO_DIM)),
            Span::raw(self.process_label.clone()),
        ]);

        let panel = Paragraph::new(vec![line]).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" vigil ")
                .border_style(Style::default().fg(PANEL_BORDER)),
        );
        f.render_widget(panel, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::cpu::CpuUtilization;

    #[test]
    fn test_undefined_cpu_renders_dash_not_zero() {
        let panel = StatusPanel::new(&HostMetrics::default());
        assert_eq!(panel.cpu_label, "CPU --");
    }

    #[test]
    fn test_defined_cpu_and_memory_labels() {
        let host = HostMetrics {
            cpu: CpuUtilization { overall: Some(42.5), per_core: vec![Some(40.0), None] },
            mem_total_kb: 8 * 1024 * 1024,
            mem_available_kb: 6 * 1024 * 1024,
            process_count: 123,
        };
        let panel = StatusPanel::new(&host);
        assert_eq!(panel.cpu_label, "CPU  42.5%");
        assert_eq!(panel.core_summary, "1/2 cores reporting");
        assert_eq!(panel.memory_label, "MEM 2048 / 8192 MB");
        assert_eq!(panel.process_label, "123 processes");
    }
}
