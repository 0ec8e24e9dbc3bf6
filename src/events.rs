use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};

use crate::app::{App, Focus};

/// Where `e` writes the chart export.
pub const EXPORT_PATH: &str = "fleetwatch_export.json";

/// Poll for events with a timeout
pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Handle a key event
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    // If help is shown, any key closes it
    if app.show_help {
        app.show_help = false;
        return;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit(),

        // Session
        KeyCode::Char('s') | KeyCode::Char('m') => app.toggle_monitoring(Instant::now()),

        // Switch between the provider and appliance lists
        KeyCode::Tab | KeyCode::BackTab => app.next_focus(),
        KeyCode::Left | KeyCode::Char('h') => app.focus = Focus::Providers,
        KeyCode::Right | KeyCode::Char('l') => app.focus = Focus::Devices,

        // Navigation
        KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),

        KeyCode::Char(' ') | KeyCode::Enter => app.toggle_selected(),

        KeyCode::Char('?') => app.toggle_help(),

        KeyCode::Char('e') => {
            let export_path = std::path::PathBuf::from(EXPORT_PATH);
            match app.export_state(&export_path) {
                Ok(()) => {
                    app.set_status_message(format!("Exported to {}", export_path.display()));
                }
                Err(e) => {
                    app.set_status_message(format!("Export failed: {}", e));
                }
            }
        }

        _ => {}
    }
}

/// Handle mouse events
///
/// `lists_start_row` is the first row of the provider list; the appliance
/// list follows it after the catalog and two border rows.
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent, lists_start_row: u16) {
    match mouse.kind {
        MouseEventKind::ScrollUp => app.select_prev(),
        MouseEventKind::ScrollDown => app.select_next(),

        // Click a row to move the cursor there, click again to toggle it
        MouseEventKind::Down(MouseButton::Left) => {
            if mouse.row <= lists_start_row {
                return;
            }
            let row = (mouse.row - lists_start_row - 1) as usize;
            let providers = app.catalog.len();

            let (focus, index) = if row < providers {
                (Focus::Providers, row)
            } else if row >= providers + 2 && row - providers - 2 < app.appliances.len() {
                (Focus::Devices, row - providers - 2)
            } else {
                return;
            };

            let current = match focus {
                Focus::Providers => app.selected_provider_index,
                Focus::Devices => app.selected_device_index,
            };
            if app.focus == focus && current == index {
                app.toggle_selected();
            } else {
                app.focus = focus;
                match focus {
                    Focus::Providers => app.selected_provider_index = index,
                    Focus::Devices => app.selected_device_index = index,
                }
            }
        }

        _ => {}
    }
}
