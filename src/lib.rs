//! # fleetwatch
//!
//! A live telemetry console for a fleet of network appliances.
//!
//! While monitoring is on, fleetwatch periodically asks a status endpoint
//! for the selected metric providers across every monitored appliance, keeps
//! a bounded window of samples per provider, and draws one line chart per
//! provider with one line per appliance.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Application                          │
//! │  ┌─────────┐    ┌──────────┐    ┌─────────┐    ┌─────────┐ │
//! │  │  app    │───▶│ monitor  │───▶│   ui    │───▶│ Terminal│ │
//! │  │ (state) │    │ (engine) │    │(rendering)   │         │ │
//! │  └────┬────┘    └────┬─────┘    └─────────┘    └─────────┘ │
//! │       │              │                                      │
//! │       ▼              ▼                                      │
//! │  ┌─────────┐    ┌──────────┐                                │
//! │  │ source  │    │  chart   │◀── ChartRegistry + SeriesBuffer │
//! │  │ (fetch) │    │ (widgets)│                                │
//! │  └─────────┘    └──────────┘                                │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`monitor`]**: The engine. Owns the device roster, provider selection,
//!   session toggle, chart registry and poll loop, and reacts to [`Signal`]s
//! - **[`poll`]**: The timer state machine ([`PollLoop`]) and the fetch
//!   contract ([`MetricsFetcher`], [`FetchRequest`], [`FetchResponse`])
//! - **[`chart`]**: Chart widgets kept in step with the selection
//!   ([`ChartRegistry`]) and their terminal implementation
//! - **[`data`]**: Devices, providers, samples and the bounded [`SeriesBuffer`]
//! - **[`source`]**: Fetchers for the HTTP status endpoint and synthetic data
//! - **[`config`]**: Settings from a TOML file and `FLEETWATCH__*` variables
//! - **[`app`]**, **[`events`]**, **[`ui`]**: The terminal front end
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Poll the appliances listed in fleetwatch.toml
//! fleetwatch --config fleetwatch.toml --start
//!
//! # Run against synthetic data
//! fleetwatch --demo
//! ```
//!
//! ### Driving the engine directly
//!
//! ```
//! use std::time::Instant;
//!
//! use fleetwatch::credentials::PlainEncoding;
//! use fleetwatch::data::{Credentials, Device, DeviceSet, ProviderId, ProviderSelection};
//! use fleetwatch::monitor::{MonitorSettings, TickResult};
//! use fleetwatch::poll::MetricsFetcher;
//! use fleetwatch::{Monitor, ScriptedFetcher, TerminalCharts};
//!
//! # tokio_test::block_on(async {
//! let devices = DeviceSet::new(vec![Device::new("dp1", Credentials::new("admin:secret"))]).unwrap();
//! let selection = ProviderSelection::new([ProviderId::from("CPUUsage.tenSeconds")]);
//! let mut monitor = Monitor::new(
//!     MonitorSettings::default(),
//!     TerminalCharts::new(),
//!     Box::new(PlainEncoding),
//!     devices,
//!     selection,
//! );
//!
//! let now = Instant::now();
//! monitor.start_monitoring(now);
//! let due = monitor.poll_due(now).expect("first tick is immediate");
//!
//! let fetcher = ScriptedFetcher::new();
//! let outcome = fetcher.fetch(&due.request).await;
//! let result = monitor.complete_tick(due.ticket, outcome, now);
//! assert!(matches!(result, TickResult::Committed { rescheduled: true, .. }));
//! # });
//! ```

pub mod app;
pub mod chart;
pub mod config;
pub mod credentials;
pub mod data;
pub mod error;
pub mod events;
pub mod monitor;
pub mod poll;
pub mod session;
pub mod source;
pub mod ui;

// Re-export main types for convenience
pub use app::App;
pub use chart::{ChartBackend, ChartRegistry, TerminalCharts};
pub use config::Settings;
pub use data::{Device, DeviceSet, ProviderId, ProviderSelection, Sample, SeriesBuffer};
pub use error::TelemetryError;
pub use monitor::{Monitor, Signal};
pub use poll::{FetchRequest, FetchResponse, MetricsFetcher, PollLoop};
pub use session::{SessionState, SessionToggle};
pub use source::{HttpFetcher, ScriptedFetcher};
