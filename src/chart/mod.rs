//! Chart widgets and their reconciliation with the current selection.
//!
//! - [`backend`]: The widget API ([`ChartBackend`], [`ChartHandle`])
//! - [`registry`]: [`ChartRegistry`], one widget and series per active provider
//! - [`terminal`]: [`TerminalCharts`], widgets drawn by the TUI

pub mod backend;
pub mod registry;
pub mod terminal;

pub use backend::{ChartBackend, ChartHandle};
pub use registry::{ChartRegistry, CommitReport, SyncReport};
pub use terminal::{ChartWidget, TerminalCharts};
