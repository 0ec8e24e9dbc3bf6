//! Console configuration.
//!
//! Settings are read once at startup from an optional TOML file, then
//! overridden by `FLEETWATCH__*` environment variables:
//!
//! ```toml
//! providers = ["CPUUsage.tenSeconds", "MemoryStatus.Usage"]
//!
//! [charts]
//! animation = "true"
//! animation_steps = 15
//! datapoints = 60
//! interval = 5000
//! start_on_load = "false"
//!
//! [endpoint]
//! url = "https://console.example.com/status"
//! check_hostname = "true"
//!
//! [colors]
//! "dp1.example.com" = "#e06c75"
//!
//! [[appliances]]
//! hostname = "dp1.example.com"
//! credentials = "admin:secret"
//! ```
//!
//! Boolean flags accept real booleans or their string spellings.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::de::{self, Deserializer};
use serde::Deserialize;

use crate::data::{Credentials, Device, DeviceSet, ProviderId, ProviderSelection};
use crate::error::TelemetryError;
use crate::monitor::MonitorSettings;
use crate::poll::FetchOptions;

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "FLEETWATCH";

/// Shortest poll interval accepted.
pub const MIN_INTERVAL_MS: u64 = 100;

/// Chart behaviour.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ChartSettings {
    #[serde(deserialize_with = "flag")]
    pub animation: bool,
    pub animation_steps: u32,
    /// Points kept per chart.
    pub datapoints: usize,
    /// Poll interval in milliseconds.
    pub interval: u64,
    #[serde(deserialize_with = "flag")]
    pub start_on_load: bool,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            animation: true,
            animation_steps: 15,
            datapoints: crate::data::DEFAULT_MAX_POINTS,
            interval: 5000,
            start_on_load: false,
        }
    }
}

/// Where status batches are fetched from.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EndpointSettings {
    /// Status endpoint URL. Without one the console runs on synthetic data.
    pub url: Option<String>,
    #[serde(deserialize_with = "flag")]
    pub check_hostname: bool,
    /// Transport timeout; the HTTP client default applies when unset.
    pub timeout_ms: Option<u64>,
}

impl Default for EndpointSettings {
    fn default() -> Self {
        Self {
            url: None,
            check_hostname: true,
            timeout_ms: None,
        }
    }
}

/// One known appliance.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApplianceEntry {
    pub hostname: String,
    pub credentials: Credentials,
    /// Whether the appliance starts in the monitored roster.
    #[serde(default = "enabled", deserialize_with = "flag")]
    pub monitored: bool,
}

fn enabled() -> bool {
    true
}

/// Top-level settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub charts: ChartSettings,
    pub endpoint: EndpointSettings,
    /// Hostname → color; hosts without an entry get a palette color.
    pub colors: BTreeMap<String, String>,
    pub appliances: Vec<ApplianceEntry>,
    /// Providers selected at startup.
    pub providers: Vec<ProviderId>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            charts: ChartSettings::default(),
            endpoint: EndpointSettings::default(),
            colors: BTreeMap::new(),
            appliances: Vec::new(),
            providers: vec![ProviderId::from("CPUUsage.tenSeconds")],
        }
    }
}

impl Settings {
    /// Load from an optional file plus `FLEETWATCH__*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, TelemetryError> {
        Self::load_with_prefix(path, ENV_PREFIX)
    }

    fn load_with_prefix(path: Option<&Path>, prefix: &str) -> Result<Self, TelemetryError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }
        let config = builder
            .add_source(Environment::with_prefix(prefix).separator("__").try_parsing(true))
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<(), TelemetryError> {
        if self.charts.datapoints == 0 {
            return Err(TelemetryError::Config("charts.datapoints must be positive".to_string()));
        }
        if self.charts.interval < MIN_INTERVAL_MS {
            return Err(TelemetryError::Config(format!(
                "charts.interval must be at least {}ms",
                MIN_INTERVAL_MS
            )));
        }
        if let Some(entry) = self.appliances.iter().find(|a| a.hostname.trim().is_empty()) {
            return Err(TelemetryError::Config(format!(
                "appliance with empty hostname (credentials {:?})",
                entry.credentials
            )));
        }
        DeviceSet::new(self.all_devices())?;
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.charts.interval)
    }

    pub fn monitor_settings(&self) -> MonitorSettings {
        MonitorSettings {
            max_points: self.charts.datapoints,
            interval: self.interval(),
            start_on_load: self.charts.start_on_load,
            fetch: FetchOptions {
                check_hostname: self.endpoint.check_hostname,
            },
        }
    }

    /// Every configured appliance, in file order.
    pub fn all_devices(&self) -> Vec<Device> {
        self.appliances
            .iter()
            .map(|a| Device::new(a.hostname.clone(), a.credentials.clone()))
            .collect()
    }

    /// The appliances monitored at startup.
    pub fn monitored_devices(&self) -> Vec<Device> {
        self.appliances
            .iter()
            .filter(|a| a.monitored)
            .map(|a| Device::new(a.hostname.clone(), a.credentials.clone()))
            .collect()
    }

    pub fn selection(&self) -> ProviderSelection {
        ProviderSelection::new(self.providers.iter().cloned())
    }
}

/// Accept `true`/`false` or their string spellings.
fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(value) => Ok(value),
        Flag::Text(text) => parse_flag(&text)
            .ok_or_else(|| de::Error::custom(format!("expected a boolean, got {:?}", text))),
    }
}

fn parse_flag(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}
