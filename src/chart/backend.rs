//! The chart widget surface the registry drives.

use std::fmt;

use crate::data::ProviderId;

/// Opaque handle to one chart widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChartHandle(pub(crate) u64);

impl fmt::Display for ChartHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chart#{}", self.0)
    }
}

/// Rendering primitives for live charts.
///
/// A widget's per-device layout is fixed when it is created; the registry
/// destroys and recreates widgets instead of reshaping them.
pub trait ChartBackend {
    /// Create a widget with one sub-series per device, in `device_order`.
    fn create(&mut self, provider: &ProviderId, device_order: &[String]) -> ChartHandle;

    fn destroy(&mut self, handle: ChartHandle);

    /// Append a value to one device's sub-series.
    fn append_sample(&mut self, handle: ChartHandle, device_index: usize, value: f64);

    /// Append an x-axis label for the newest point.
    fn append_label(&mut self, handle: ChartHandle, timestamp: f64);

    /// Drop the oldest label and the oldest value of every sub-series.
    fn evict_oldest(&mut self, handle: ChartHandle);

    /// Make appended points visible.
    fn refresh(&mut self, handle: ChartHandle);
}
