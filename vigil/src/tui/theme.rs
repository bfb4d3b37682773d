//! TUI color theme

use ratatui::style::Color;

pub const SELECTED_BG: Color = Color::Blue;
pub const HOVER_BG: Color = Color::DarkGray;
pub const TERM_RED: Color = Color::Red;
pub const KILL_RED: Color = Color::LightRed;
pub const SEARCH_YELLOW: Color = Color::Yellow;
pub const ADVISED_AMBER: Color = Color::Rgb(255, 191, 0);
pub const INFO_DIM: Color = Color::Rgb(140, 140, 140);
pub const PANEL_BORDER: Color = Color::Rgb(0, 180, 0);

/// Load color by utilization percentage.
/// - Above 80%: red
/// - Above 40%: amber
/// - Otherwise: green
#[must_use]
pub fn load_color(percentage: f64) -> Color {
    if percentage > 80.0 {
        Color::Red
    } else if percentage > 40.0 {
        ADVISED_AMBER
    } else {
        Color::Green
    }
}
