//! TUI color theme

use ratatui::style::Color;

pub const HUD_GREEN: Color = Color::Rgb(0, 255, 0);
pub const CRITICAL_RED: Color = Color::Rgb(255, 0, 0);
pub const CAUTION_AMBER: Color = Color::Rgb(255, 191, 0);
pub const INFO_DIM: Color = Color::Rgb(0, 180, 0);

/// Selection markers around the highlighted row
pub const SEL_LEFT: &str = "▶";
pub const SEL_RIGHT: &str = "◀";

/// Header color for the active sampling mode
///
/// Amber while a counter is isolated for call-chain attribution, red when
/// nothing is sampled.
#[must_use]
pub fn mode_color(mode: crate::domain::SamplingMode) -> Color {
    use crate::domain::SamplingMode;
    match mode {
        SamplingMode::Idle => CRITICAL_RED,
        SamplingMode::Profiling | SamplingMode::LowLatency => HUD_GREEN,
        SamplingMode::CallchainPartial(_) => CAUTION_AMBER,
    }
}

/// Text gauge `[####------]` filled to `percentage` of `width`
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn gauge_bar(percentage: f64, width: usize) -> String {
    let filled = ((percentage.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gauge_bar() {
        assert_eq!(gauge_bar(0.0, 4), "[----]");
        assert_eq!(gauge_bar(50.0, 4), "[##--]");
        assert_eq!(gauge_bar(250.0, 4), "[####]");
    }
}
