//! Theme configuration for the TUI.
//!
//! Supports light and dark themes with automatic terminal detection, plus
//! the per-appliance color palette used for chart lines.

use std::collections::BTreeMap;
use std::str::FromStr;

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;
use tracing::warn;

use crate::session::SessionState;

/// Color and style theme for the TUI.
///
/// Use [`Theme::auto_detect()`] for automatic theme selection based on
/// terminal background, or [`Theme::dark()`]/[`Theme::light()`] explicitly.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Accent color for highlights and active elements.
    pub highlight: Color,
    /// Color for the live (monitoring) indicator.
    pub live: Color,
    /// Color for the idle indicator.
    pub idle: Color,
    /// Color for a stopped-on-error poll chain.
    pub failure: Color,
    /// Color for borders and separators.
    pub border: Color,
    /// Style for section titles.
    pub header: Style,
    /// Style for the cursor row in a list.
    pub selected: Style,
    /// Border style (rounded, plain, etc.).
    pub border_type: BorderType,
}

impl Theme {
    /// Create a dark theme suitable for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            highlight: Color::Cyan,
            live: Color::Green,
            idle: Color::Gray,
            failure: Color::Red,
            border: Color::Gray,
            header: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD),
            border_type: BorderType::Rounded,
        }
    }

    /// Create a light theme suitable for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            highlight: Color::Blue,
            live: Color::Green,
            idle: Color::DarkGray,
            failure: Color::Red,
            border: Color::DarkGray,
            header: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::LightBlue).add_modifier(Modifier::BOLD),
            border_type: BorderType::Rounded,
        }
    }

    /// Auto-detect based on terminal background
    pub fn auto_detect() -> Self {
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(),
            _ => Self::dark(),
        }
    }

    /// Get style for the session indicator
    pub fn session_style(&self, state: SessionState) -> Style {
        match state {
            SessionState::Monitoring => Style::default().fg(self.live).add_modifier(Modifier::BOLD),
            SessionState::Idle => Style::default().fg(self.idle),
        }
    }
}

/// Fallback line colors, assigned in roster order.
const FALLBACK_COLORS: &[Color] = &[
    Color::Cyan,
    Color::Magenta,
    Color::Yellow,
    Color::Green,
    Color::LightRed,
    Color::LightBlue,
    Color::LightMagenta,
    Color::LightGreen,
];

/// Chart line color per appliance.
///
/// Configured colors win; other hostnames get the next fallback color the
/// first time they are seen and keep it afterwards.
#[derive(Debug, Clone, Default)]
pub struct Palette {
    assigned: BTreeMap<String, Color>,
    next_fallback: usize,
}

impl Palette {
    /// Build from configured `hostname → color` entries.
    pub fn new(configured: &BTreeMap<String, String>) -> Self {
        let mut palette = Self::default();
        for (hostname, name) in configured {
            match Color::from_str(name) {
                Ok(color) => {
                    palette.assigned.insert(hostname.clone(), color);
                }
                Err(_) => warn!(hostname = %hostname, color = %name, "ignoring unknown color"),
            }
        }
        palette
    }

    /// Give every hostname without a color the next fallback color.
    pub fn assign<'a, I: IntoIterator<Item = &'a str>>(&mut self, hostnames: I) {
        for hostname in hostnames {
            if !self.assigned.contains_key(hostname) {
                let color = FALLBACK_COLORS[self.next_fallback % FALLBACK_COLORS.len()];
                self.next_fallback += 1;
                self.assigned.insert(hostname.to_string(), color);
            }
        }
    }

    pub fn color(&self, hostname: &str) -> Color {
        self.assigned.get(hostname).copied().unwrap_or(Color::White)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_colors_win_over_fallback() {
        let mut configured = BTreeMap::new();
        configured.insert("dp1".to_string(), "#ff0000".to_string());
        configured.insert("dp2".to_string(), "not-a-color".to_string());

        let mut palette = Palette::new(&configured);
        palette.assign(["dp1", "dp2", "dp3"]);

        assert_eq!(palette.color("dp1"), Color::Rgb(255, 0, 0));
        assert_eq!(palette.color("dp2"), FALLBACK_COLORS[0]);
        assert_eq!(palette.color("dp3"), FALLBACK_COLORS[1]);
    }

    #[test]
    fn test_assignment_is_stable() {
        let mut palette = Palette::default();
        palette.assign(["a", "b"]);
        let before = palette.color("b");
        palette.assign(["b", "a", "c"]);
        assert_eq!(palette.color("b"), before);
        assert_eq!(palette.color("unknown"), Color::White);
    }
}
