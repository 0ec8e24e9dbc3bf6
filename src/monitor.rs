//! The telemetry subsystem: session, roster, selection, charts and poll loop
//! wired together.
//!
//! ```text
//!   Signal::StartMonitoring ──▶ SessionToggle ──▶ ChartRegistry::sync + PollLoop::start
//!   Signal::DeviceSetChanged ─▶ DeviceSet ──────▶ ChartRegistry::sync (while monitoring)
//!   Signal::ProviderSelectionChanged ─▶ ProviderSelection ─▶ ChartRegistry::sync
//!
//!   poll_due() ──▶ FetchRequest ──(fetcher, async)──▶ complete_tick() ──▶ ChartRegistry::commit
//! ```
//!
//! All methods take the current time so scheduling is driven by the
//! caller's event loop. Fetches themselves run elsewhere; only their
//! results come back through [`Monitor::complete_tick`], one batch per call.

use std::time::{Duration, Instant};

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::chart::{ChartBackend, ChartRegistry, CommitReport, SyncReport};
use crate::credentials::CredentialEncoding;
use crate::data::{Device, DeviceSet, ProviderId, ProviderSelection};
use crate::error::TelemetryError;
use crate::poll::{FetchOptions, FetchRequest, FetchResponse, PollLoop, TickTicket};
use crate::session::{SessionState, SessionToggle};

/// In-process notifications the subsystem reacts to and emits.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    StartMonitoring,
    StopMonitoring,
    DeviceSetChanged(Vec<Device>),
    ProviderSelectionChanged(Vec<ProviderId>),
}

/// Engine settings taken from configuration.
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub max_points: usize,
    pub interval: Duration,
    pub start_on_load: bool,
    pub fetch: FetchOptions,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            max_points: crate::data::DEFAULT_MAX_POINTS,
            interval: Duration::from_secs(5),
            start_on_load: false,
            fetch: FetchOptions::default(),
        }
    }
}

/// A fetch the caller must run and report back.
#[derive(Debug, Clone)]
pub struct DueFetch {
    pub ticket: TickTicket,
    pub request: FetchRequest,
}

/// Result of applying one fetch outcome.
#[derive(Debug)]
pub enum TickResult {
    Committed {
        report: CommitReport,
        rescheduled: bool,
    },
    /// The batch was dropped and the chain ended.
    Failed(TelemetryError),
}

/// The live-telemetry engine.
#[derive(Debug)]
pub struct Monitor<B: ChartBackend> {
    devices: DeviceSet,
    selection: ProviderSelection,
    session: SessionToggle,
    registry: ChartRegistry<B>,
    poll: PollLoop,
    encoding: Box<dyn CredentialEncoding>,
    fetch_options: FetchOptions,
    start_on_load: bool,
    signals: broadcast::Sender<Signal>,
}

impl<B: ChartBackend> Monitor<B> {
    pub fn new(
        settings: MonitorSettings,
        backend: B,
        encoding: Box<dyn CredentialEncoding>,
        devices: DeviceSet,
        selection: ProviderSelection,
    ) -> Self {
        let (signals, _) = broadcast::channel(32);
        Self {
            devices,
            selection,
            session: SessionToggle::new(),
            registry: ChartRegistry::new(backend, settings.max_points),
            poll: PollLoop::new(settings.interval),
            encoding,
            fetch_options: settings.fetch,
            start_on_load: settings.start_on_load,
            signals,
        }
    }

    /// Build the initial charts and honour `start_on_load`.
    pub fn init(&mut self, now: Instant) {
        if self.start_on_load {
            self.start_monitoring(now);
        } else {
            self.sync();
        }
    }

    /// Receive the signals this subsystem emits (session transitions).
    pub fn subscribe(&self) -> broadcast::Receiver<Signal> {
        self.signals.subscribe()
    }

    /// Apply an incoming signal.
    pub fn dispatch(&mut self, signal: Signal, now: Instant) -> Result<(), TelemetryError> {
        match signal {
            Signal::StartMonitoring => {
                self.start_monitoring(now);
            }
            Signal::StopMonitoring => {
                self.stop_monitoring();
            }
            Signal::DeviceSetChanged(devices) => {
                self.set_devices(devices)?;
            }
            Signal::ProviderSelectionChanged(providers) => {
                self.set_providers(ProviderSelection::new(providers));
            }
        }
        Ok(())
    }

    /// Idle → Monitoring: sync charts and open a new poll chain.
    pub fn start_monitoring(&mut self, now: Instant) -> bool {
        if !self.session.start() {
            return false;
        }
        info!(devices = self.devices.len(), providers = self.selection.len(), "monitoring started");
        self.sync();
        self.poll.start(now);
        let _ = self.signals.send(Signal::StartMonitoring);
        true
    }

    /// Monitoring → Idle. The pending timer is left alone; the next tick
    /// sees the idle state and does not reschedule.
    pub fn stop_monitoring(&mut self) -> bool {
        if !self.session.stop() {
            return false;
        }
        info!("monitoring stopped");
        let _ = self.signals.send(Signal::StopMonitoring);
        true
    }

    pub fn toggle_monitoring(&mut self, now: Instant) -> SessionState {
        if self.session.is_monitoring() {
            self.stop_monitoring();
        } else {
            self.start_monitoring(now);
        }
        self.session.state()
    }

    /// Replace the device roster; charts are rebuilt if monitoring.
    pub fn set_devices(&mut self, devices: Vec<Device>) -> Result<Option<SyncReport>, TelemetryError> {
        let changed = self.devices.replace(devices)?;
        debug!(changed, devices = self.devices.len(), "device set updated");
        Ok(self.session.is_monitoring().then(|| self.sync()))
    }

    /// Replace the provider selection; charts are always resynced.
    pub fn set_providers(&mut self, selection: ProviderSelection) -> SyncReport {
        self.selection = selection;
        self.sync()
    }

    /// Flip one provider's selection and resync.
    pub fn toggle_provider(&mut self, provider: &ProviderId) -> bool {
        let selected = self.selection.toggle(provider);
        self.sync();
        selected
    }

    fn sync(&mut self) -> SyncReport {
        self.registry.sync(self.selection.as_set(), &self.devices)
    }

    /// Fire the poll timer if due and build the request to issue.
    ///
    /// With no devices or no providers selected nothing is fetched; the loop
    /// keeps its cadence while monitoring so polling resumes once there is
    /// something to ask for.
    pub fn poll_due(&mut self, now: Instant) -> Option<DueFetch> {
        let chain = self.poll.fire(now)?;

        if self.devices.is_empty() || self.selection.is_empty() {
            debug!(
                devices = self.devices.len(),
                providers = self.selection.len(),
                "nothing to poll, skipping tick"
            );
            self.poll.skip(chain, self.session.is_monitoring(), now);
            return None;
        }

        let request = FetchRequest::build(
            &self.devices,
            &self.selection,
            self.encoding.as_ref(),
            self.fetch_options,
        );
        let ticket = self.poll.begin(chain, request.layout(), request.providers.clone());
        debug!(tick = ticket.id, chain, devices = ticket.layout.len(), "issuing status fetch");
        Some(DueFetch { ticket, request })
    }

    /// Apply a fetch outcome in one pass.
    ///
    /// On success every requested provider gets its sample (subject to the
    /// registry's liveness and layout checks) and the loop reschedules if
    /// still monitoring. Any error drops the whole batch and ends the chain.
    pub fn complete_tick(
        &mut self,
        ticket: TickTicket,
        outcome: Result<FetchResponse, TelemetryError>,
        now: Instant,
    ) -> TickResult {
        let batch =
            outcome.and_then(|response| response.into_samples(&ticket.providers, &ticket.layout));

        match batch {
            Ok(batch) => {
                let report = self.registry.commit(batch, &ticket.layout);
                if !report.stale.is_empty() {
                    debug!(tick = ticket.id, stale = report.stale.len(), "rejected samples for rebuilt charts");
                }
                if !report.out_of_order.is_empty() {
                    debug!(tick = ticket.id, late = report.out_of_order.len(), "rejected samples older than series tail");
                }
                let rescheduled = self.poll.finish(&ticket, self.session.is_monitoring(), now);
                debug!(tick = ticket.id, appended = report.appended.len(), rescheduled, "tick committed");
                TickResult::Committed { report, rescheduled }
            }
            Err(err) => {
                warn!(tick = ticket.id, error = %err, "status fetch failed, polling stopped");
                self.poll.fail(&ticket, err.to_string());
                TickResult::Failed(err)
            }
        }
    }

    pub fn session(&self) -> SessionState {
        self.session.state()
    }

    pub fn is_monitoring(&self) -> bool {
        self.session.is_monitoring()
    }

    pub fn devices(&self) -> &DeviceSet {
        &self.devices
    }

    pub fn selection(&self) -> &ProviderSelection {
        &self.selection
    }

    pub fn registry(&self) -> &ChartRegistry<B> {
        &self.registry
    }

    pub fn poll_loop(&self) -> &PollLoop {
        &self.poll
    }

    /// Time until the pending timer fires, if one is pending.
    pub fn time_to_next_tick(&self, now: Instant) -> Option<Duration> {
        self.poll.next_due().map(|due| due.saturating_duration_since(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::registry::tests::{devices, RecordingBackend};
    use crate::credentials::PlainEncoding;
    use crate::data::Credentials;
    use crate::poll::PollPhase;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn monitor(hosts: &[&str], providers: &[&str], max_points: usize) -> Monitor<RecordingBackend> {
        let settings = MonitorSettings {
            max_points,
            interval: ms(1000),
            ..MonitorSettings::default()
        };
        Monitor::new(
            settings,
            RecordingBackend::default(),
            Box::new(PlainEncoding),
            devices(hosts),
            ProviderSelection::new(providers.iter().map(|p| ProviderId::from(*p))),
        )
    }

    fn response_for(request: &FetchRequest, timestamp: f64) -> FetchResponse {
        request.providers.iter().fold(FetchResponse::new(timestamp), |resp, provider| {
            let values: Vec<f64> = (0..request.devices.len()).map(|i| i as f64 + timestamp).collect();
            resp.with_values(provider, &values)
        })
    }

    #[test]
    fn test_start_syncs_charts_and_schedules_immediate_tick() {
        let t0 = Instant::now();
        let mut monitor = monitor(&["a", "b"], &["cpu"], 10);
        monitor.init(t0);
        assert_eq!(monitor.registry().len(), 1);
        assert_eq!(monitor.poll_loop().phase(), PollPhase::Idle);

        assert!(monitor.start_monitoring(t0));
        assert!(!monitor.start_monitoring(t0));
        let due = monitor.poll_due(t0).expect("tick due at start");
        assert_eq!(due.request.layout(), vec!["a", "b"]);
        assert_eq!(due.request.devices[0].credentials, "admin:admin");
    }

    #[test]
    fn test_start_on_load_begins_monitoring() {
        let t0 = Instant::now();
        let settings = MonitorSettings {
            start_on_load: true,
            ..MonitorSettings::default()
        };
        let mut monitor = Monitor::new(
            settings,
            RecordingBackend::default(),
            Box::new(PlainEncoding),
            devices(&["a"]),
            ProviderSelection::new([ProviderId::from("cpu")]),
        );
        let mut signals = monitor.subscribe();
        monitor.init(t0);

        assert!(monitor.is_monitoring());
        assert_eq!(signals.try_recv().unwrap(), Signal::StartMonitoring);
        assert!(monitor.poll_due(t0).is_some());
    }

    #[test]
    fn test_stop_mid_interval_lets_timer_fire_once_without_reschedule() {
        let t0 = Instant::now();
        let mut monitor = monitor(&["a"], &["cpu"], 10);
        monitor.start_monitoring(t0);

        let first = monitor.poll_due(t0).unwrap();
        let response = response_for(&first.request, 1.0);
        let result = monitor.complete_tick(first.ticket, Ok(response), t0);
        assert!(matches!(result, TickResult::Committed { rescheduled: true, .. }));
        assert_eq!(monitor.time_to_next_tick(t0), Some(ms(1000)));

        monitor.stop_monitoring();
        assert!(monitor.poll_due(t0 + ms(500)).is_none());

        let second = monitor.poll_due(t0 + ms(1000)).expect("pending timer still fires");
        let response = response_for(&second.request, 2.0);
        let result = monitor.complete_tick(second.ticket, Ok(response), t0 + ms(1100));
        assert!(matches!(result, TickResult::Committed { rescheduled: false, .. }));

        let cpu = ProviderId::from("cpu");
        assert_eq!(monitor.registry().series(&cpu).unwrap().len(), 2);
        assert_eq!(monitor.poll_loop().pending_timers(), 0);
        assert_eq!(monitor.poll_loop().phase(), PollPhase::Idle);
    }

    #[test]
    fn test_missing_provider_drops_batch_and_ends_chain() {
        let t0 = Instant::now();
        let mut monitor = monitor(&["a", "b"], &["cpu", "memory"], 10);
        monitor.start_monitoring(t0);

        let due = monitor.poll_due(t0).unwrap();
        let partial = FetchResponse::new(1.0).with_values(&ProviderId::from("cpu"), &[1.0, 2.0]);
        let result = monitor.complete_tick(due.ticket, Ok(partial), t0);

        assert!(matches!(result, TickResult::Failed(TelemetryError::Malformed(_))));
        for provider in ["cpu", "memory"] {
            assert!(monitor.registry().series(&ProviderId::from(provider)).unwrap().is_empty());
        }
        assert_eq!(monitor.poll_loop().pending_timers(), 0);
        assert!(monitor.poll_loop().last_failure().is_some());
        assert!(monitor.is_monitoring());
    }

    #[test]
    fn test_transport_error_does_not_reschedule() {
        let t0 = Instant::now();
        let mut monitor = monitor(&["a"], &["cpu"], 10);
        monitor.start_monitoring(t0);

        let due = monitor.poll_due(t0).unwrap();
        let err = TelemetryError::Transport("connection refused".to_string());
        monitor.complete_tick(due.ticket, Err(err), t0);

        assert!(monitor.poll_due(t0 + ms(5000)).is_none());
        assert_eq!(monitor.poll_loop().phase(), PollPhase::Idle);

        monitor.stop_monitoring();
        monitor.start_monitoring(t0 + ms(6000));
        assert!(monitor.poll_due(t0 + ms(6000)).is_some());
    }

    #[test]
    fn test_empty_device_set_skips_fetch_and_keeps_cadence() {
        let t0 = Instant::now();
        let mut monitor = monitor(&[], &["cpu"], 10);
        monitor.start_monitoring(t0);

        assert!(monitor.poll_due(t0).is_none());
        assert_eq!(monitor.poll_loop().in_flight(), 0);
        assert_eq!(monitor.time_to_next_tick(t0), Some(ms(1000)));

        monitor
            .set_devices(vec![Device::new("a", Credentials::new("x"))])
            .unwrap();
        let due = monitor.poll_due(t0 + ms(1000)).expect("polling resumes");
        assert_eq!(due.request.layout(), vec!["a"]);
    }

    #[test]
    fn test_empty_device_set_while_stopped_goes_idle() {
        let t0 = Instant::now();
        let mut monitor = monitor(&[], &["cpu"], 10);
        monitor.start_monitoring(t0);
        monitor.stop_monitoring();

        assert!(monitor.poll_due(t0).is_none());
        assert_eq!(monitor.poll_loop().phase(), PollPhase::Idle);
    }

    #[test]
    fn test_device_change_while_in_flight_rejects_stale_samples() {
        let t0 = Instant::now();
        let mut monitor = monitor(&["A", "B"], &["cpu"], 10);
        monitor.start_monitoring(t0);
        let due = monitor.poll_due(t0).unwrap();

        let report = monitor
            .set_devices(vec![Device::new("A", Credentials::new("x"))])
            .unwrap()
            .expect("sync while monitoring");
        assert_eq!(report.rebuilt, vec![ProviderId::from("cpu")]);

        let response = response_for(&due.request, 1.0);
        let result = monitor.complete_tick(due.ticket, Ok(response), t0);
        match result {
            TickResult::Committed { report, rescheduled } => {
                assert_eq!(report.stale, vec![ProviderId::from("cpu")]);
                assert!(rescheduled);
            }
            TickResult::Failed(err) => panic!("unexpected failure: {}", err),
        }
        assert!(monitor.registry().series(&ProviderId::from("cpu")).unwrap().is_empty());
    }

    #[test]
    fn test_late_reply_from_previous_chain_keeps_series_ordered() {
        let t0 = Instant::now();
        let cpu = ProviderId::from("cpu");
        let mut monitor = monitor(&["a"], &["cpu"], 10);
        monitor.start_monitoring(t0);
        let old = monitor.poll_due(t0).unwrap();

        monitor.stop_monitoring();
        monitor.start_monitoring(t0 + ms(100));
        let new = monitor.poll_due(t0 + ms(100)).expect("restart fires immediately");

        let response = response_for(&new.request, 2.0);
        let result = monitor.complete_tick(new.ticket, Ok(response), t0 + ms(200));
        assert!(matches!(result, TickResult::Committed { rescheduled: true, .. }));

        let response = response_for(&old.request, 1.0);
        match monitor.complete_tick(old.ticket, Ok(response), t0 + ms(300)) {
            TickResult::Committed { report, rescheduled } => {
                assert_eq!(report.out_of_order, vec![cpu.clone()]);
                assert!(report.appended.is_empty());
                assert!(!rescheduled);
            }
            TickResult::Failed(err) => panic!("unexpected failure: {}", err),
        }

        assert_eq!(monitor.registry().series(&cpu).unwrap().timestamps(), vec![2.0]);
        assert_eq!(monitor.poll_loop().pending_timers(), 1);
    }

    #[test]
    fn test_device_change_while_idle_does_not_rebuild() {
        let t0 = Instant::now();
        let mut monitor = monitor(&["A", "B"], &["cpu"], 10);
        monitor.init(t0);
        let created = monitor.registry().backend().created.len();

        let report = monitor.set_devices(vec![Device::new("A", Credentials::new("x"))]).unwrap();
        assert!(report.is_none());
        assert_eq!(monitor.registry().backend().created.len(), created);
    }

    #[test]
    fn test_provider_deselected_while_idle_removes_chart() {
        let t0 = Instant::now();
        let mut monitor = monitor(&["a"], &["cpu", "memory"], 10);
        monitor.init(t0);

        assert!(!monitor.toggle_provider(&ProviderId::from("memory")));
        assert_eq!(
            monitor.registry().providers().into_iter().collect::<Vec<_>>(),
            vec![ProviderId::from("cpu")]
        );
    }

    #[test]
    fn test_provider_deselected_mid_flight_is_skipped() {
        let t0 = Instant::now();
        let mut monitor = monitor(&["a"], &["cpu", "memory"], 10);
        monitor.start_monitoring(t0);
        let due = monitor.poll_due(t0).unwrap();

        monitor.toggle_provider(&ProviderId::from("memory"));
        let response = response_for(&due.request, 1.0);
        match monitor.complete_tick(due.ticket, Ok(response), t0) {
            TickResult::Committed { report, .. } => {
                assert_eq!(report.appended, vec![ProviderId::from("cpu")]);
                assert_eq!(report.inactive, vec![ProviderId::from("memory")]);
            }
            TickResult::Failed(err) => panic!("unexpected failure: {}", err),
        }
    }

    #[test]
    fn test_timer_invariant_over_toggle_sequences() {
        let t0 = Instant::now();
        let mut monitor = monitor(&["a"], &["cpu"], 5);
        let mut in_flight = Vec::new();
        let mut now = t0;

        for step in 0..200u64 {
            now += ms(137);
            match step % 7 {
                0 | 3 => {
                    monitor.toggle_monitoring(now);
                }
                1 | 4 | 5 => {
                    if let Some(due) = monitor.poll_due(now) {
                        in_flight.push(due);
                    }
                }
                _ => {
                    if let Some(due) = in_flight.pop() {
                        let response = response_for(&due.request, now.duration_since(t0).as_secs_f64());
                        monitor.complete_tick(due.ticket, Ok(response), now);
                    }
                }
            }
            assert!(monitor.poll_loop().pending_timers() <= 1);
            assert!(monitor.registry().series(&ProviderId::from("cpu")).unwrap().len() <= 5);
        }
    }

    #[test]
    fn test_dispatch_routes_signals() {
        let t0 = Instant::now();
        let mut monitor = monitor(&["a"], &["cpu"], 10);
        let mut signals = monitor.subscribe();

        monitor.dispatch(Signal::StartMonitoring, t0).unwrap();
        assert!(monitor.is_monitoring());
        monitor
            .dispatch(Signal::ProviderSelectionChanged(vec![ProviderId::from("load")]), t0)
            .unwrap();
        assert!(monitor.registry().handle(&ProviderId::from("load")).is_some());
        monitor.dispatch(Signal::StopMonitoring, t0).unwrap();
        assert!(!monitor.is_monitoring());

        assert_eq!(signals.try_recv().unwrap(), Signal::StartMonitoring);
        assert_eq!(signals.try_recv().unwrap(), Signal::StopMonitoring);

        let dup = vec![
            Device::new("x", Credentials::new("1")),
            Device::new("x", Credentials::new("2")),
        ];
        assert!(monitor.dispatch(Signal::DeviceSetChanged(dup), t0).is_err());
    }
}
