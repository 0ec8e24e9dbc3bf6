//! The monitored device roster and the charted provider selection.

use std::collections::BTreeSet;

use super::model::{Device, ProviderId};
use crate::error::TelemetryError;

/// Status providers every appliance exposes.
pub const KNOWN_PROVIDERS: &[&str] = &[
    "CPUUsage.tenSeconds",
    "TCPSummary.established",
    "MemoryStatus.Usage",
    "FilesystemStatus.FreeTemporary",
    "FilesystemStatus.FreeEncrypted",
    "FilesystemStatus.FreeInternal",
    "SystemUsage.Load",
    "SystemUsage.WorkList",
];

/// Ordered set of monitored devices, unique by hostname.
///
/// Order matters: it fixes the per-device value layout of every sample and
/// every chart built from this roster.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceSet {
    devices: Vec<Device>,
}

impl DeviceSet {
    pub fn new(devices: Vec<Device>) -> Result<Self, TelemetryError> {
        check_unique(&devices)?;
        Ok(Self { devices })
    }

    /// Replace the whole roster. Returns `true` if membership or order changed.
    pub fn replace(&mut self, devices: Vec<Device>) -> Result<bool, TelemetryError> {
        check_unique(&devices)?;
        let changed = self.hostnames() != devices.iter().map(|d| d.hostname.as_str()).collect::<Vec<_>>();
        self.devices = devices;
        Ok(changed)
    }

    /// Append a device. Returns `false` if the hostname is already present.
    pub fn add(&mut self, device: Device) -> bool {
        if self.contains(&device.hostname) {
            return false;
        }
        self.devices.push(device);
        true
    }

    /// Remove a device by hostname. Returns `true` if it was present.
    pub fn remove(&mut self, hostname: &str) -> bool {
        let before = self.devices.len();
        self.devices.retain(|d| d.hostname != hostname);
        self.devices.len() != before
    }

    pub fn contains(&self, hostname: &str) -> bool {
        self.devices.iter().any(|d| d.hostname == hostname)
    }

    pub fn hostnames(&self) -> Vec<&str> {
        self.devices.iter().map(|d| d.hostname.as_str()).collect()
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

fn check_unique(devices: &[Device]) -> Result<(), TelemetryError> {
    let mut seen = BTreeSet::new();
    for device in devices {
        if !seen.insert(device.hostname.as_str()) {
            return Err(TelemetryError::Config(format!(
                "duplicate appliance hostname: {}",
                device.hostname
            )));
        }
    }
    Ok(())
}

/// The providers the user wants charted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderSelection {
    selected: BTreeSet<ProviderId>,
}

impl ProviderSelection {
    pub fn new<I: IntoIterator<Item = ProviderId>>(providers: I) -> Self {
        Self {
            selected: providers.into_iter().collect(),
        }
    }

    /// Flip one provider's membership. Returns `true` if it is now selected.
    pub fn toggle(&mut self, provider: &ProviderId) -> bool {
        if self.selected.remove(provider) {
            false
        } else {
            self.selected.insert(provider.clone());
            true
        }
    }

    pub fn select(&mut self, provider: ProviderId) -> bool {
        self.selected.insert(provider)
    }

    pub fn deselect(&mut self, provider: &ProviderId) -> bool {
        self.selected.remove(provider)
    }

    pub fn contains(&self, provider: &ProviderId) -> bool {
        self.selected.contains(provider)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProviderId> {
        self.selected.iter()
    }

    pub fn as_set(&self) -> &BTreeSet<ProviderId> {
        &self.selected
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}

/// Every provider the console offers for selection.
#[derive(Debug, Clone)]
pub struct ProviderCatalog {
    providers: Vec<ProviderId>,
}

impl Default for ProviderCatalog {
    fn default() -> Self {
        Self {
            providers: KNOWN_PROVIDERS.iter().map(|p| ProviderId::from(*p)).collect(),
        }
    }
}

impl ProviderCatalog {
    /// The known providers plus any extra ids, without duplicates.
    pub fn with_extra<'a, I: IntoIterator<Item = &'a ProviderId>>(extra: I) -> Self {
        let mut catalog = Self::default();
        for provider in extra {
            if !catalog.providers.contains(provider) {
                catalog.providers.push(provider.clone());
            }
        }
        catalog
    }

    pub fn get(&self, index: usize) -> Option<&ProviderId> {
        self.providers.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProviderId> {
        self.providers.iter()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
