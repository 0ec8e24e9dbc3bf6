//! Status response parsing and validation.
//!
//! The endpoint answers with a flat JSON object:
//!
//! ```text
//! { "appliances": ["dp1", "dp2"], "time": "20240102030405",
//!   "CPUUsage.tenSeconds": ["3", "7"], ... }
//! ```
//!
//! Numbers may arrive as JSON numbers or numeric strings.

use serde_json::{Map, Value};

use crate::data::{ProviderId, Sample};
use crate::error::TelemetryError;

const TIME_KEY: &str = "time";
const APPLIANCES_KEY: &str = "appliances";

/// A raw status response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchResponse {
    fields: Map<String, Value>,
}

impl FetchResponse {
    /// Wrap a decoded JSON body. Anything but an object is malformed.
    pub fn from_value(value: Value) -> Result<Self, TelemetryError> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(TelemetryError::Malformed(format!(
                "expected a JSON object, got {}",
                kind_of(&other)
            ))),
        }
    }

    /// Build a response in memory (offline fetchers, tests).
    pub fn new(timestamp: f64) -> Self {
        let mut fields = Map::new();
        fields.insert(TIME_KEY.to_string(), Value::from(timestamp));
        Self { fields }
    }

    pub fn with_values(mut self, provider: &ProviderId, values: &[f64]) -> Self {
        self.fields.insert(provider.to_string(), Value::from(values.to_vec()));
        self
    }

    pub fn with_appliances(mut self, hostnames: &[String]) -> Self {
        self.fields.insert(APPLIANCES_KEY.to_string(), Value::from(hostnames.to_vec()));
        self
    }

    pub fn timestamp(&self) -> Result<f64, TelemetryError> {
        let value = self
            .fields
            .get(TIME_KEY)
            .ok_or_else(|| TelemetryError::Malformed("missing \"time\"".to_string()))?;
        number(value).ok_or_else(|| TelemetryError::Malformed(format!("non-numeric time: {}", value)))
    }

    /// Build one sample per requested provider, failing the whole batch on
    /// any missing key, non-numeric value or device-count mismatch.
    pub fn into_samples(
        &self,
        providers: &[ProviderId],
        layout: &[String],
    ) -> Result<Vec<(ProviderId, Sample)>, TelemetryError> {
        if let Some(echo) = self.fields.get(APPLIANCES_KEY) {
            let matches = echo
                .as_array()
                .map(|names| {
                    names.len() == layout.len()
                        && names.iter().zip(layout).all(|(n, h)| n.as_str() == Some(h.as_str()))
                })
                .unwrap_or(false);
            if !matches {
                return Err(TelemetryError::Malformed(
                    "appliance list does not match request order".to_string(),
                ));
            }
        }

        let timestamp = self.timestamp()?;
        providers
            .iter()
            .map(|provider| {
                let values = self.values(provider, layout.len())?;
                Ok((provider.clone(), Sample::new(timestamp, values)))
            })
            .collect()
    }

    fn values(&self, provider: &ProviderId, expected: usize) -> Result<Vec<f64>, TelemetryError> {
        let raw = self
            .fields
            .get(provider.as_str())
            .ok_or_else(|| TelemetryError::Malformed(format!("missing provider {}", provider)))?;
        let items = raw
            .as_array()
            .ok_or_else(|| TelemetryError::Malformed(format!("{} is not a list", provider)))?;
        if items.len() != expected {
            return Err(TelemetryError::Malformed(format!(
                "{} has {} values for {} devices",
                provider,
                items.len(),
                expected
            )));
        }
        items
            .iter()
            .map(|item| {
                number(item).ok_or_else(|| {
                    TelemetryError::Malformed(format!("{} has non-numeric value {}", provider, item))
                })
            })
            .collect()
    }
}

/// A finite numeric value, either a JSON number or a numeric string.
fn number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn layout() -> Vec<String> {
        vec!["dp1".to_string(), "dp2".to_string()]
    }

    fn providers(ids: &[&str]) -> Vec<ProviderId> {
        ids.iter().map(|id| ProviderId::from(*id)).collect()
    }

    #[test]
    fn test_parses_string_encoded_numbers() {
        let response = FetchResponse::from_value(json!({
            "appliances": ["dp1", "dp2"],
            "time": "20240102030405",
            "cpu": ["3", 7]
        }))
        .unwrap();

        let batch = response.into_samples(&providers(&["cpu"]), &layout()).unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].1.timestamp, 20240102030405.0);
        assert_eq!(batch[0].1.values, vec![3.0, 7.0]);
    }

    #[test]
    fn test_missing_provider_fails_whole_batch() {
        let response = FetchResponse::new(1.0).with_values(&ProviderId::from("cpu"), &[1.0, 2.0]);
        let err = response.into_samples(&providers(&["cpu", "memory"]), &layout()).unwrap_err();
        assert!(matches!(err, TelemetryError::Malformed(msg) if msg.contains("memory")));
    }

    #[test]
    fn test_non_finite_strings_are_malformed() {
        for raw in ["NaN", "inf", "-inf"] {
            let response = FetchResponse::from_value(json!({"time": 1, "cpu": [raw]})).unwrap();
            let err = response
                .into_samples(&providers(&["cpu"]), &["dp1".to_string()])
                .unwrap_err();
            assert!(matches!(err, TelemetryError::Malformed(msg) if msg.contains("non-numeric")));
        }
    }

    #[test]
    fn test_device_count_mismatch_is_malformed() {
        let response = FetchResponse::new(1.0).with_values(&ProviderId::from("cpu"), &[1.0]);
        assert!(response.into_samples(&providers(&["cpu"]), &layout()).is_err());
    }

    #[test]
    fn test_appliance_echo_must_match_order() {
        let response = FetchResponse::new(1.0)
            .with_values(&ProviderId::from("cpu"), &[1.0, 2.0])
            .with_appliances(&["dp2".to_string(), "dp1".to_string()]);
        assert!(response.into_samples(&providers(&["cpu"]), &layout()).is_err());
    }

    #[test]
    fn test_non_numeric_values_are_malformed() {
        let response = FetchResponse::from_value(json!({"time": 1, "cpu": ["n/a", "2"]})).unwrap();
        assert!(response.into_samples(&providers(&["cpu"]), &layout()).is_err());

        let response = FetchResponse::from_value(json!({"time": "soon", "cpu": [1, 2]})).unwrap();
        assert!(response.into_samples(&providers(&["cpu"]), &layout()).is_err());
    }

    #[test]
    fn test_non_object_body_is_rejected() {
        assert!(FetchResponse::from_value(json!([1, 2])).is_err());
    }
}
