//! Fetch request construction.

use serde::Serialize;

use crate::credentials::CredentialEncoding;
use crate::data::{DeviceSet, ProviderId, ProviderSelection};

/// Transport flags sent with every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FetchOptions {
    /// Verify appliance TLS hostnames.
    pub check_hostname: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self { check_hostname: true }
    }
}

/// A device as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncodedDevice {
    pub hostname: String,
    pub credentials: String,
}

/// One batch request: every monitored device × every selected provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchRequest {
    pub devices: Vec<EncodedDevice>,
    pub providers: Vec<ProviderId>,
    pub options: FetchOptions,
}

impl FetchRequest {
    /// Snapshot the current roster and selection into a request.
    pub fn build(
        devices: &DeviceSet,
        selection: &ProviderSelection,
        encoding: &dyn CredentialEncoding,
        options: FetchOptions,
    ) -> Self {
        Self {
            devices: devices
                .devices()
                .iter()
                .map(|d| EncodedDevice {
                    hostname: d.hostname.clone(),
                    credentials: encoding.encode(&d.credentials),
                })
                .collect(),
            providers: selection.iter().cloned().collect(),
            options,
        }
    }

    /// Hostnames in request order.
    pub fn layout(&self) -> Vec<String> {
        self.devices.iter().map(|d| d.hostname.clone()).collect()
    }

    /// Form fields for the status endpoint, with repeated array keys.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = Vec::with_capacity(self.devices.len() * 2 + self.providers.len() + 1);
        for device in &self.devices {
            fields.push(("appliances[]", device.hostname.clone()));
            fields.push(("credentials[]", device.credentials.clone()));
        }
        for provider in &self.providers {
            fields.push(("providers[]", provider.to_string()));
        }
        fields.push(("check_hostname", self.options.check_hostname.to_string()));
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::PlainEncoding;
    use crate::data::{Credentials, Device};

    fn request() -> FetchRequest {
        let devices = DeviceSet::new(vec![
            Device::new("dp1", Credentials::new("u1:p1")),
            Device::new("dp2", Credentials::new("u2:p2")),
        ])
        .unwrap();
        let selection = ProviderSelection::new([ProviderId::from("MemoryStatus.Usage")]);
        FetchRequest::build(&devices, &selection, &PlainEncoding, FetchOptions::default())
    }

    #[test]
    fn test_build_keeps_device_order() {
        let request = request();
        assert_eq!(request.layout(), vec!["dp1", "dp2"]);
        assert_eq!(request.devices[1].credentials, "u2:p2");
        assert_eq!(request.providers, vec![ProviderId::from("MemoryStatus.Usage")]);
    }

    #[test]
    fn test_form_fields_repeat_array_keys() {
        let fields = request().form_fields();
        let appliances: Vec<&str> =
            fields.iter().filter(|(k, _)| *k == "appliances[]").map(|(_, v)| v.as_str()).collect();
        assert_eq!(appliances, vec!["dp1", "dp2"]);
        assert!(fields.contains(&("providers[]", "MemoryStatus.Usage".to_string())));
        assert_eq!(fields.last().unwrap(), &("check_hostname", "true".to_string()));
    }
}
