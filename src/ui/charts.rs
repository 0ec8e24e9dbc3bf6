//! Live line charts, one per active provider.
//!
//! Each chart draws one line per appliance in the chart's device order,
//! colored by the palette. The x axis is the sample slot, so the newest
//! sample is always on the right once the window is full.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use crate::app::App;
use crate::chart::ChartWidget;

/// Charts per column before the area is split into two columns.
const CHARTS_PER_COLUMN: usize = 3;

/// Render every active chart in `area`.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let registry = app.monitor.registry();
    let widgets: Vec<&ChartWidget> = registry
        .providers()
        .iter()
        .filter_map(|provider| registry.handle(provider))
        .filter_map(|handle| registry.backend().widget(handle))
        .collect();

    if widgets.is_empty() {
        let msg = Paragraph::new(" No providers selected. Pick one from the list on the left.")
            .style(Style::default().add_modifier(Modifier::DIM))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(app.theme.border_type)
                    .border_style(Style::default().fg(app.theme.border)),
            );
        frame.render_widget(msg, area);
        return;
    }

    let columns = if widgets.len() > CHARTS_PER_COLUMN { 2 } else { 1 };
    let column_areas =
        Layout::horizontal(vec![Constraint::Ratio(1, columns as u32); columns]).split(area);
    let per_column = widgets.len().div_ceil(columns);

    for (column, chunk) in widgets.chunks(per_column).enumerate() {
        let rows = Layout::vertical(vec![Constraint::Ratio(1, chunk.len() as u32); chunk.len()])
            .split(column_areas[column]);
        for (widget, row) in chunk.iter().zip(rows.iter()) {
            render_chart(frame, app, widget, *row);
        }
    }
}

fn render_chart(frame: &mut Frame, app: &App, widget: &ChartWidget, area: Rect) {
    let datasets: Vec<Dataset> = widget
        .device_order
        .iter()
        .enumerate()
        .map(|(index, hostname)| {
            Dataset::default()
                .name(hostname.clone())
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(app.palette.color(hostname)))
                .data(widget.points(index))
        })
        .collect();

    let max_x = app.monitor.registry().max_points().saturating_sub(1).max(1) as f64;
    let [min_y, max_y] = widget.value_bounds();

    let labels = widget.labels();
    let x_labels: Vec<Span> = match (labels.first(), labels.last()) {
        (Some(first), Some(last)) => {
            vec![Span::raw(format_timestamp(*first)), Span::raw(format_timestamp(*last))]
        }
        _ => vec![Span::raw(""), Span::raw("")],
    };

    let latest: Vec<Span> = widget
        .latest()
        .iter()
        .zip(&widget.device_order)
        .filter_map(|(value, hostname)| {
            value.map(|v| {
                Span::styled(
                    format!(" {}={} ", hostname, format_value(v)),
                    Style::default().fg(app.palette.color(hostname)),
                )
            })
        })
        .collect();

    let title = Line::from(
        std::iter::once(Span::styled(format!(" {} ", widget.provider), app.theme.header))
            .chain(latest)
            .collect::<Vec<_>>(),
    );

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_type(app.theme.border_type)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .x_axis(
            Axis::default()
                .style(Style::default().fg(app.theme.border))
                .bounds([0.0, max_x])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(app.theme.border))
                .bounds([min_y, max_y])
                .labels(vec![Span::raw(format_value(min_y)), Span::raw(format_value(max_y))]),
        );

    frame.render_widget(chart, area);
}

/// Format a sample timestamp as `hh:mm:ss`.
///
/// Appliance timestamps arrive as `YYYYMMDDhhmmss` numbers; anything
/// smaller is treated as seconds since the epoch (UTC).
pub fn format_timestamp(timestamp: f64) -> String {
    if !timestamp.is_finite() || timestamp < 0.0 {
        return "--:--:--".to_string();
    }
    let ts = timestamp as u64;
    if ts >= 10_000_000_000_000 {
        let clock = ts % 1_000_000;
        format!("{:02}:{:02}:{:02}", clock / 10_000, clock / 100 % 100, clock % 100)
    } else {
        let secs = ts % 86_400;
        format!("{:02}:{:02}:{:02}", secs / 3600, secs / 60 % 60, secs % 60)
    }
}

/// Format a value compactly for axis labels and legends.
fn format_value(v: f64) -> String {
    if v.fract().abs() < f64::EPSILON {
        format!("{:.0}", v)
    } else {
        format!("{:.1}", v)
    }
}
