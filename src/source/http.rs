//! Status endpoint fetcher over HTTP.
//!
//! Posts one form per tick to the console's status endpoint, which queries
//! every appliance and answers with a flat JSON object of provider values.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::error::TelemetryError;
use crate::poll::{FetchRequest, FetchResponse, MetricsFetcher};

/// Fetches status batches from an HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    url: String,
    description: String,
}

impl HttpFetcher {
    /// Create a fetcher for `url`.
    ///
    /// Without a timeout the HTTP client's default applies.
    pub fn new(url: impl Into<String>, timeout: Option<Duration>) -> Result<Self, TelemetryError> {
        let url = url.into();
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;
        let description = format!("http: {}", url);
        Ok(Self {
            client,
            url,
            description,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl MetricsFetcher for HttpFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, TelemetryError> {
        debug!(url = %self.url, devices = request.devices.len(), "posting status request");

        let response = self.client.post(&self.url).form(&request.form_fields()).send().await?;

        if !response.status().is_success() {
            return Err(TelemetryError::Transport(format!(
                "endpoint returned status {}",
                response.status()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| TelemetryError::Malformed(e.to_string()))?;
        FetchResponse::from_value(body)
    }

    fn description(&self) -> &str {
        &self.description
    }
}
