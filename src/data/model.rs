//! Core value types: devices, providers and samples.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque appliance credentials.
///
/// The engine never inspects these; they are handed to a
/// [`CredentialEncoding`](crate::credentials::CredentialEncoding) when a
/// fetch request is built. `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credentials(String);

impl Credentials {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The raw credential string, for encoders only.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credentials(***)")
    }
}

/// A managed remote appliance. Identity is the hostname.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub hostname: String,
    pub credentials: Credentials,
}

impl Device {
    pub fn new(hostname: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            hostname: hostname.into(),
            credentials,
        }
    }
}

/// Identifier of a metric family, e.g. `CPUUsage.tenSeconds`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderId(String);

impl ProviderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The status class queried on the appliance (the part before the first dot).
    pub fn status_class(&self) -> &str {
        self.0.split('.').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProviderId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// One point in time for one provider: a value per device, in device order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    pub timestamp: f64,
    pub values: Vec<f64>,
}

impl Sample {
    pub fn new(timestamp: f64, values: Vec<f64>) -> Self {
        Self { timestamp, values }
    }
}
