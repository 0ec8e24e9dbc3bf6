//! Synthetic status data for running without an appliance endpoint.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;

use crate::error::TelemetryError;
use crate::poll::{FetchRequest, FetchResponse, MetricsFetcher};

/// Produces smooth, deterministic values per device and provider.
///
/// Each device gets its own phase (derived from the hostname) so the
/// sub-series of a chart are distinguishable.
#[derive(Debug, Default)]
pub struct ScriptedFetcher {
    ticks: AtomicU64,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of batches produced so far.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    fn value(tick: u64, hostname: &str, provider: &str) -> f64 {
        let phase = hostname.bytes().map(f64::from).sum::<f64>() / 17.0;
        let (base, swing) = match provider.split('.').next().unwrap_or(provider) {
            "CPUUsage" | "MemoryStatus" => (45.0, 35.0),
            "SystemUsage" => (30.0, 25.0),
            "TCPSummary" => (200.0, 120.0),
            "FilesystemStatus" => (2048.0, 256.0),
            _ => (50.0, 40.0),
        };
        let wave = (tick as f64 / 4.0 + phase).sin();
        (base + swing * wave).max(0.0).round()
    }
}

#[async_trait]
impl MetricsFetcher for ScriptedFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, TelemetryError> {
        let tick = self.ticks.fetch_add(1, Ordering::Relaxed);
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64()
            .floor();

        let layout = request.layout();
        let response = request.providers.iter().fold(
            FetchResponse::new(timestamp).with_appliances(&layout),
            |response, provider| {
                let values: Vec<f64> = layout
                    .iter()
                    .map(|host| Self::value(tick, host, provider.as_str()))
                    .collect();
                response.with_values(provider, &values)
            },
        );
        Ok(response)
    }

    fn description(&self) -> &str {
        "demo: synthetic data"
    }
}
