//! Application state and interaction logic.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tokio::runtime::Handle;
use tokio::sync::{broadcast, mpsc};
use tracing::debug;

use crate::chart::TerminalCharts;
use crate::data::{Device, ProviderCatalog};
use crate::error::TelemetryError;
use crate::monitor::{DueFetch, Monitor, Signal, TickResult};
use crate::poll::{FetchResponse, MetricsFetcher, TickTicket};
use crate::ui::{Palette, Theme};

type TickOutcome = (TickTicket, Result<FetchResponse, TelemetryError>);

/// Which list receives navigation keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Providers,
    Devices,
}

impl Focus {
    pub fn next(self) -> Self {
        match self {
            Focus::Providers => Focus::Devices,
            Focus::Devices => Focus::Providers,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Focus::Providers => "Providers",
            Focus::Devices => "Appliances",
        }
    }
}

/// Main application state.
pub struct App {
    pub running: bool,
    pub show_help: bool,
    pub focus: Focus,

    // Engine
    pub monitor: Monitor<TerminalCharts>,
    fetcher: Arc<dyn MetricsFetcher>,
    runtime: Handle,
    results_tx: mpsc::UnboundedSender<TickOutcome>,
    results_rx: mpsc::UnboundedReceiver<TickOutcome>,
    signals: broadcast::Receiver<Signal>,
    pub last_update: Option<Instant>,

    // Selection lists
    pub catalog: ProviderCatalog,
    pub appliances: Vec<Device>,
    pub selected_provider_index: usize,
    pub selected_device_index: usize,

    // UI
    pub theme: Theme,
    pub palette: Palette,

    // Status message (temporary feedback)
    pub status_message: Option<(String, Instant)>,
}

impl App {
    /// Create the app around an initialized monitor.
    ///
    /// `appliances` is every known appliance; the monitor's device set is
    /// the monitored subset. Fetches are spawned on `runtime`.
    pub fn new(
        monitor: Monitor<TerminalCharts>,
        fetcher: Arc<dyn MetricsFetcher>,
        runtime: Handle,
        catalog: ProviderCatalog,
        appliances: Vec<Device>,
        theme: Theme,
        mut palette: Palette,
    ) -> Self {
        let (results_tx, results_rx) = mpsc::unbounded_channel();
        let signals = monitor.subscribe();
        palette.assign(appliances.iter().map(|d| d.hostname.as_str()));

        Self {
            running: true,
            show_help: false,
            focus: Focus::Providers,
            monitor,
            fetcher,
            runtime,
            results_tx,
            results_rx,
            signals,
            last_update: None,
            catalog,
            appliances,
            selected_provider_index: 0,
            selected_device_index: 0,
            theme,
            palette,
            status_message: None,
        }
    }

    /// Returns a description of the current metrics source.
    pub fn source_description(&self) -> &str {
        self.fetcher.description()
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired (3 seconds).
    pub fn get_status_message(&self) -> Option<&str> {
        if let Some((msg, time)) = &self.status_message {
            if time.elapsed() < Duration::from_secs(3) {
                return Some(msg);
            }
        }
        None
    }

    /// Advance the engine: apply finished fetches, then issue a due tick.
    ///
    /// Called from the event loop between input events, so chart changes
    /// never interleave with a commit.
    pub fn tick(&mut self, now: Instant) {
        while let Ok((ticket, outcome)) = self.results_rx.try_recv() {
            match self.monitor.complete_tick(ticket, outcome, now) {
                TickResult::Committed { report, .. } => {
                    if !report.appended.is_empty() {
                        self.last_update = Some(now);
                    }
                }
                TickResult::Failed(err) if err.is_tick_failure() => {
                    self.set_status_message(format!("Polling stopped: {}", err));
                }
                TickResult::Failed(err) => self.set_status_message(err.to_string()),
            }
        }

        while let Ok(signal) = self.signals.try_recv() {
            match signal {
                Signal::StartMonitoring => self.set_status_message("Monitoring started".to_string()),
                Signal::StopMonitoring => self.set_status_message("Monitoring stopped".to_string()),
                _ => {}
            }
        }

        if let Some(due) = self.monitor.poll_due(now) {
            self.spawn_fetch(due);
        }
    }

    fn spawn_fetch(&self, due: DueFetch) {
        let fetcher = self.fetcher.clone();
        let results = self.results_tx.clone();
        debug!(tick = due.ticket.id, source = fetcher.description(), "spawning fetch");
        self.runtime.spawn(async move {
            let outcome = fetcher.fetch(&due.request).await;
            let _ = results.send((due.ticket, outcome));
        });
    }

    /// Start or stop monitoring.
    pub fn toggle_monitoring(&mut self, now: Instant) {
        self.monitor.toggle_monitoring(now);
    }

    /// Toggle the provider or appliance under the cursor.
    pub fn toggle_selected(&mut self) {
        match self.focus {
            Focus::Providers => {
                if let Some(provider) = self.catalog.get(self.selected_provider_index).cloned() {
                    self.monitor.toggle_provider(&provider);
                }
            }
            Focus::Devices => self.toggle_device(self.selected_device_index),
        }
    }

    /// Add or remove one known appliance from the monitored roster.
    ///
    /// The roster keeps configuration order.
    pub fn toggle_device(&mut self, index: usize) {
        let Some(target) = self.appliances.get(index) else {
            return;
        };
        let target = target.hostname.clone();
        let roster: Vec<Device> = self
            .appliances
            .iter()
            .filter(|d| {
                let monitored = self.monitor.devices().contains(&d.hostname);
                if d.hostname == target {
                    !monitored
                } else {
                    monitored
                }
            })
            .cloned()
            .collect();

        if let Err(err) = self.monitor.set_devices(roster) {
            self.set_status_message(err.to_string());
        }
    }

    /// Whether an appliance is in the monitored roster.
    pub fn is_monitored(&self, device: &Device) -> bool {
        self.monitor.devices().contains(&device.hostname)
    }

    pub fn next_focus(&mut self) {
        self.focus = self.focus.next();
    }

    /// Move the cursor down by one item.
    pub fn select_next(&mut self) {
        match self.focus {
            Focus::Providers => {
                let max = self.catalog.len().saturating_sub(1);
                self.selected_provider_index = (self.selected_provider_index + 1).min(max);
            }
            Focus::Devices => {
                let max = self.appliances.len().saturating_sub(1);
                self.selected_device_index = (self.selected_device_index + 1).min(max);
            }
        }
    }

    /// Move the cursor up by one item.
    pub fn select_prev(&mut self) {
        match self.focus {
            Focus::Providers => {
                self.selected_provider_index = self.selected_provider_index.saturating_sub(1);
            }
            Focus::Devices => {
                self.selected_device_index = self.selected_device_index.saturating_sub(1);
            }
        }
    }

    /// Toggle the help overlay.
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Signal the application to quit.
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Export every active chart's series to a JSON file.
    pub fn export_state(&self, path: &Path) -> Result<()> {
        let registry = self.monitor.registry();
        if registry.is_empty() {
            anyhow::bail!("No charts to export");
        }

        let mut charts = serde_json::Map::new();
        for provider in registry.providers() {
            let devices = registry.layout(&provider).unwrap_or_default();
            let samples: Vec<serde_json::Value> = registry
                .series(&provider)
                .map(|series| {
                    series.iter().map(|s| serde_json::json!({"timestamp": s.timestamp, "values": s.values})).collect()
                })
                .unwrap_or_default();
            charts.insert(
                provider.to_string(),
                serde_json::json!({ "devices": devices, "samples": samples }),
            );
        }

        let export = serde_json::json!({
            "session": self.monitor.session().label(),
            "source": self.source_description(),
            "max_points": registry.max_points(),
            "charts": charts,
        });

        let json = serde_json::to_string_pretty(&export)?;
        std::fs::write(path, json)
            .map_err(|e| TelemetryError::Export(e.to_string()))
            .with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::PlainEncoding;
    use crate::data::{Credentials, DeviceSet, ProviderId, ProviderSelection};
    use crate::monitor::MonitorSettings;
    use crate::source::ScriptedFetcher;

    fn appliances() -> Vec<Device> {
        ["dp1", "dp2", "dp3"]
            .iter()
            .map(|h| Device::new(*h, Credentials::new("admin:admin")))
            .collect()
    }

    fn app(monitored: &[&str]) -> App {
        let roster: Vec<Device> =
            appliances().into_iter().filter(|d| monitored.contains(&d.hostname.as_str())).collect();
        let settings = MonitorSettings {
            interval: Duration::from_millis(200),
            max_points: 5,
            ..MonitorSettings::default()
        };
        let mut monitor = Monitor::new(
            settings,
            TerminalCharts::new(),
            Box::new(PlainEncoding),
            DeviceSet::new(roster).unwrap(),
            ProviderSelection::new([ProviderId::from("CPUUsage.tenSeconds")]),
        );
        monitor.init(Instant::now());
        App::new(
            monitor,
            Arc::new(ScriptedFetcher::new()),
            Handle::current(),
            ProviderCatalog::default(),
            appliances(),
            Theme::dark(),
            Palette::default(),
        )
    }

    #[tokio::test]
    async fn test_tick_fetches_and_commits_samples() {
        let mut app = app(&["dp1", "dp2"]);
        app.toggle_monitoring(Instant::now());
        let cpu = ProviderId::from("CPUUsage.tenSeconds");

        for _ in 0..50 {
            app.tick(Instant::now());
            if app.last_update.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert!(app.last_update.is_some());
        let series = app.monitor.registry().series(&cpu).unwrap();
        assert_eq!(series.latest().unwrap().values.len(), 2);
        assert_eq!(app.get_status_message(), Some("Monitoring started"));
    }

    #[tokio::test]
    async fn test_toggle_device_keeps_configuration_order() {
        let mut app = app(&["dp1", "dp3"]);
        app.toggle_device(1);
        assert_eq!(app.monitor.devices().hostnames(), vec!["dp1", "dp2", "dp3"]);

        app.toggle_device(0);
        assert_eq!(app.monitor.devices().hostnames(), vec!["dp2", "dp3"]);
        assert!(!app.is_monitored(&appliances()[0]));
    }

    #[tokio::test]
    async fn test_toggle_selected_provider_updates_charts() {
        let mut app = app(&["dp1"]);
        app.select_next();
        app.toggle_selected();

        let second = app.catalog.get(1).unwrap().clone();
        assert!(app.monitor.selection().contains(&second));
        assert!(app.monitor.registry().handle(&second).is_some());
    }

    #[tokio::test]
    async fn test_cursor_is_clamped() {
        let mut app = app(&["dp1"]);
        app.next_focus();
        for _ in 0..10 {
            app.select_next();
        }
        assert_eq!(app.selected_device_index, 2);
        app.select_prev();
        assert_eq!(app.selected_device_index, 1);
    }

    #[tokio::test]
    async fn test_export_writes_series() {
        let app = app(&["dp1"]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.json");

        app.export_state(&path).unwrap();
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["session"], "IDLE");
        assert_eq!(written["charts"]["CPUUsage.tenSeconds"]["devices"][0], "dp1");
    }
}
