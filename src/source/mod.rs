//! Metrics fetchers.
//!
//! This module provides the [`MetricsFetcher`](crate::poll::MetricsFetcher)
//! implementations the console can poll: the appliance status endpoint over
//! HTTP, and a synthetic source for running without one.

mod http;
mod scripted;

pub use http::HttpFetcher;
pub use scripted::ScriptedFetcher;

use std::sync::Arc;

use crate::config::EndpointSettings;
use crate::error::TelemetryError;
use crate::poll::MetricsFetcher;

/// Pick the fetcher for the configured endpoint.
///
/// Falls back to synthetic data when no URL is configured or `demo` is set.
pub fn from_settings(
    endpoint: &EndpointSettings,
    demo: bool,
) -> Result<Arc<dyn MetricsFetcher>, TelemetryError> {
    match (&endpoint.url, demo) {
        (Some(url), false) => {
            let timeout = endpoint.timeout_ms.map(std::time::Duration::from_millis);
            Ok(Arc::new(HttpFetcher::new(url.clone(), timeout)?))
        }
        _ => Ok(Arc::new(ScriptedFetcher::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_flag_forces_synthetic_source() {
        let endpoint = EndpointSettings {
            url: Some("http://localhost:5000/status".to_string()),
            ..EndpointSettings::default()
        };
        assert!(from_settings(&endpoint, true).unwrap().description().starts_with("demo"));
        assert!(from_settings(&endpoint, false).unwrap().description().starts_with("http"));
        assert!(from_settings(&EndpointSettings::default(), false)
            .unwrap()
            .description()
            .starts_with("demo"));
    }
}
