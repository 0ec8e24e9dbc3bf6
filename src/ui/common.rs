//! Common UI components.
//!
//! This module contains the header bar, status bar, and help overlay.

use std::time::{Duration, Instant};

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::App;

/// Render the header bar with the session overview.
///
/// Displays: session indicator, monitored appliances, charts, next tick.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let session = app.monitor.session();
    let now = Instant::now();

    let next_tick = match app.monitor.time_to_next_tick(now) {
        Some(remaining) => format!("next in {}", format_duration(remaining)),
        None if app.monitor.poll_loop().in_flight() > 0 => "fetching".to_string(),
        None => "no tick pending".to_string(),
    };

    let line = Line::from(vec![
        Span::styled(" ● ", app.theme.session_style(session)),
        Span::styled("FLEETWATCH ", Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(session.label(), app.theme.session_style(session)),
        Span::raw(" │ "),
        Span::styled(
            format!("{}", app.monitor.devices().len()),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!("/{} appliances │ ", app.appliances.len())),
        Span::styled(
            format!("{}", app.monitor.registry().len()),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(" charts │ "),
        Span::raw(format!(
            "every {} ",
            format_duration(app.monitor.poll_loop().interval())
        )),
        Span::styled(next_tick, Style::default().add_modifier(Modifier::DIM)),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

/// Format a duration for display (e.g., 500ms, 4.2s, 2m05s).
pub fn format_duration(d: Duration) -> String {
    let ms = d.as_millis();
    if ms < 1_000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.1}s", d.as_secs_f64())
    } else {
        format!("{}m{:02}s", ms / 60_000, (ms % 60_000) / 1_000)
    }
}

/// Render the status bar at the bottom.
///
/// Shows: metrics source, time since last update, available controls.
/// Also displays temporary status messages and a failed poll chain.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    // Check for temporary status message first
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    let poll = app.monitor.poll_loop();
    if let Some(reason) = poll.last_failure() {
        if app.monitor.is_monitoring() && poll.pending_timers() == 0 && poll.in_flight() == 0 {
            let status = format!(" Polling stopped: {} | s twice:restart q:quit", reason);
            let paragraph = Paragraph::new(status).style(Style::default().fg(app.theme.failure));
            frame.render_widget(paragraph, area);
            return;
        }
    }

    let updated = match app.last_update {
        Some(at) => format!("Updated {:.1}s ago", at.elapsed().as_secs_f64()),
        None => "No data yet".to_string(),
    };

    let status = format!(
        " {} | {} | s:{} Tab:{} Space:toggle e:export ?:help q:quit",
        app.source_description(),
        updated,
        app.monitor.session().action_label().to_lowercase(),
        app.focus.next().label().to_lowercase(),
    );

    let paragraph = Paragraph::new(status).style(Style::default().add_modifier(Modifier::DIM));
    frame.render_widget(paragraph, area);
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the charts.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        Line::from(vec![Span::styled(
            " Session",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  s / m       Start or stop monitoring"),
        Line::from(""),
        Line::from(vec![Span::styled(
            " Selection",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  Tab         Switch list"),
        Line::from("  ←/→ h/l     Providers / appliances"),
        Line::from("  ↑/↓ j/k     Move cursor"),
        Line::from("  Space/Enter Toggle item"),
        Line::from("  Click       Select, click again to toggle"),
        Line::from(""),
        Line::from(vec![Span::styled(
            " General",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  e           Export charts to JSON"),
        Line::from("  q / Esc     Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    // Center the help overlay - responsive to terminal size
    let help_width = 46u16.min(area.width.saturating_sub(4));
    let help_height = 21u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    // Clear the area behind the help
    frame.render_widget(ratatui::widgets::Clear, help_area);
    frame.render_widget(paragraph, help_area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(500)), "500ms");
        assert_eq!(format_duration(Duration::from_millis(4200)), "4.2s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m05s");
    }
}
