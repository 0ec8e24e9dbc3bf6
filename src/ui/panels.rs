//! Provider and appliance checklists.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

use crate::app::{App, Focus};

fn checkbox(checked: bool) -> &'static str {
    if checked {
        "[x] "
    } else {
        "[ ] "
    }
}

/// Height of the provider panel, borders included.
pub fn providers_height(app: &App) -> u16 {
    app.catalog.len() as u16 + 2
}

/// Render both checklists stacked in `area`.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::vertical([
        Constraint::Length(providers_height(app)),
        Constraint::Min(3),
    ])
    .split(area);

    render_providers(frame, app, chunks[0]);
    render_appliances(frame, app, chunks[1]);
}

fn panel_block(app: &App, title: String, focused: bool) -> Block<'static> {
    let border = if focused { app.theme.highlight } else { app.theme.border };
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(border))
}

fn render_providers(frame: &mut Frame, app: &App, area: Rect) {
    let selection = app.monitor.selection();
    let items: Vec<ListItem> = app
        .catalog
        .iter()
        .map(|provider| {
            let checked = selection.contains(provider);
            let style = if checked {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default().add_modifier(Modifier::DIM)
            };
            ListItem::new(Line::from(vec![
                Span::raw(checkbox(checked)),
                Span::styled(provider.to_string(), style),
            ]))
        })
        .collect();

    let focused = app.focus == Focus::Providers;
    let title = format!(" Providers ({}/{}) ", selection.len(), app.catalog.len());
    let list = List::new(items)
        .block(panel_block(app, title, focused))
        .highlight_style(if focused { app.theme.selected } else { Style::default() });

    let mut state = ListState::default();
    state.select(Some(app.selected_provider_index));
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_appliances(frame: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .appliances
        .iter()
        .map(|device| {
            let checked = app.is_monitored(device);
            let mut style = Style::default().fg(app.palette.color(&device.hostname));
            if !checked {
                style = style.add_modifier(Modifier::DIM);
            }
            ListItem::new(Line::from(vec![
                Span::raw(checkbox(checked)),
                Span::styled(device.hostname.clone(), style),
            ]))
        })
        .collect();

    let focused = app.focus == Focus::Devices;
    let title = format!(
        " Appliances ({}/{}) ",
        app.monitor.devices().len(),
        app.appliances.len()
    );
    let list = List::new(items)
        .block(panel_block(app, title, focused))
        .highlight_style(if focused { app.theme.selected } else { Style::default() });

    let mut state = ListState::default();
    if !app.appliances.is_empty() {
        state.select(Some(app.selected_device_index));
    }
    frame.render_stateful_widget(list, area, &mut state);
}
