//! In-memory chart widgets rendered with ratatui.
//!
//! Widgets keep their own copy of the plotted points, mirroring what the
//! registry appends and evicts. Points become visible to the renderer only
//! after [`ChartBackend::refresh`].

use std::collections::{BTreeMap, VecDeque};

use super::backend::{ChartBackend, ChartHandle};
use crate::data::ProviderId;

/// One live chart: x-axis labels plus a sub-series per device.
#[derive(Debug, Clone)]
pub struct ChartWidget {
    pub provider: ProviderId,
    pub device_order: Vec<String>,
    labels: VecDeque<f64>,
    pending: Vec<VecDeque<f64>>,
    /// Plotted points per device, as (slot, value), rebuilt on refresh.
    visible: Vec<Vec<(f64, f64)>>,
    visible_labels: Vec<f64>,
}

impl ChartWidget {
    fn new(provider: ProviderId, device_order: Vec<String>) -> Self {
        let devices = device_order.len();
        Self {
            provider,
            device_order,
            labels: VecDeque::new(),
            pending: vec![VecDeque::new(); devices],
            visible: vec![Vec::new(); devices],
            visible_labels: Vec::new(),
        }
    }

    /// Visible points for one device.
    pub fn points(&self, device_index: usize) -> &[(f64, f64)] {
        self.visible.get(device_index).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Visible x-axis labels, oldest first.
    pub fn labels(&self) -> &[f64] {
        &self.visible_labels
    }

    /// Number of visible slots on the x axis.
    pub fn width(&self) -> usize {
        self.visible_labels.len()
    }

    /// Min and max of all visible values, padded so a flat line still has height.
    pub fn value_bounds(&self) -> [f64; 2] {
        let mut values = self.visible.iter().flatten().map(|(_, v)| *v);
        let Some(first) = values.next() else {
            return [0.0, 1.0];
        };
        let (min, max) = values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
        if (max - min).abs() < f64::EPSILON {
            [min - 1.0, max + 1.0]
        } else {
            [min, max]
        }
    }

    /// Latest visible value per device.
    pub fn latest(&self) -> Vec<Option<f64>> {
        self.visible.iter().map(|points| points.last().map(|(_, v)| *v)).collect()
    }
}

/// [`ChartBackend`] holding widgets for the terminal UI.
#[derive(Debug, Default)]
pub struct TerminalCharts {
    next_id: u64,
    widgets: BTreeMap<ChartHandle, ChartWidget>,
}

impl TerminalCharts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn widget(&self, handle: ChartHandle) -> Option<&ChartWidget> {
        self.widgets.get(&handle)
    }

    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }
}

impl ChartBackend for TerminalCharts {
    fn create(&mut self, provider: &ProviderId, device_order: &[String]) -> ChartHandle {
        self.next_id += 1;
        let handle = ChartHandle(self.next_id);
        self.widgets.insert(handle, ChartWidget::new(provider.clone(), device_order.to_vec()));
        handle
    }

    fn destroy(&mut self, handle: ChartHandle) {
        self.widgets.remove(&handle);
    }

    fn append_sample(&mut self, handle: ChartHandle, device_index: usize, value: f64) {
        if let Some(points) =
            self.widgets.get_mut(&handle).and_then(|w| w.pending.get_mut(device_index))
        {
            points.push_back(value);
        }
    }

    fn append_label(&mut self, handle: ChartHandle, timestamp: f64) {
        if let Some(widget) = self.widgets.get_mut(&handle) {
            widget.labels.push_back(timestamp);
        }
    }

    fn evict_oldest(&mut self, handle: ChartHandle) {
        if let Some(widget) = self.widgets.get_mut(&handle) {
            widget.labels.pop_front();
            for points in &mut widget.pending {
                points.pop_front();
            }
        }
    }

    fn refresh(&mut self, handle: ChartHandle) {
        let Some(widget) = self.widgets.get_mut(&handle) else {
            return;
        };
        widget.visible = widget
            .pending
            .iter()
            .map(|values| values.iter().enumerate().map(|(slot, v)| (slot as f64, *v)).collect())
            .collect();
        widget.visible_labels = widget.labels.iter().copied().collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order() -> Vec<String> {
        vec!["a".to_string(), "b".to_string()]
    }

    #[test]
    fn test_points_hidden_until_refresh() {
        let mut charts = TerminalCharts::new();
        let handle = charts.create(&ProviderId::from("cpu"), &order());

        charts.append_label(handle, 1.0);
        charts.append_sample(handle, 0, 10.0);
        charts.append_sample(handle, 1, 20.0);
        assert!(charts.widget(handle).unwrap().points(0).is_empty());

        charts.refresh(handle);
        let widget = charts.widget(handle).unwrap();
        assert_eq!(widget.points(0), &[(0.0, 10.0)]);
        assert_eq!(widget.points(1), &[(0.0, 20.0)]);
        assert_eq!(widget.labels(), &[1.0]);
    }

    #[test]
    fn test_evict_oldest_shifts_slots() {
        let mut charts = TerminalCharts::new();
        let handle = charts.create(&ProviderId::from("cpu"), &order()[..1]);
        for ts in 1..=3 {
            charts.append_label(handle, ts as f64);
            charts.append_sample(handle, 0, ts as f64 * 2.0);
        }
        charts.evict_oldest(handle);
        charts.refresh(handle);

        let widget = charts.widget(handle).unwrap();
        assert_eq!(widget.points(0), &[(0.0, 4.0), (1.0, 6.0)]);
        assert_eq!(widget.labels(), &[2.0, 3.0]);
        assert_eq!(widget.latest(), vec![Some(6.0)]);
    }

    #[test]
    fn test_calls_on_destroyed_handle_are_ignored() {
        let mut charts = TerminalCharts::new();
        let handle = charts.create(&ProviderId::from("cpu"), &order());
        charts.destroy(handle);

        charts.append_label(handle, 1.0);
        charts.append_sample(handle, 0, 1.0);
        charts.evict_oldest(handle);
        charts.refresh(handle);
        assert!(charts.widget(handle).is_none());
        assert!(charts.is_empty());
    }

    #[test]
    fn test_value_bounds_pads_flat_series() {
        let mut charts = TerminalCharts::new();
        let handle = charts.create(&ProviderId::from("cpu"), &order()[..1]);
        assert_eq!(charts.widget(handle).unwrap().value_bounds(), [0.0, 1.0]);

        charts.append_sample(handle, 0, 5.0);
        charts.refresh(handle);
        assert_eq!(charts.widget(handle).unwrap().value_bounds(), [4.0, 6.0]);
    }
}
