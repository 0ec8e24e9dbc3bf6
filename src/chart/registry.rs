//! Reconciles chart widgets with the provider selection and device roster.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info};

use super::backend::{ChartBackend, ChartHandle};
use crate::data::{DeviceSet, ProviderId, Sample, Series, SeriesBuffer};

/// What a [`ChartRegistry::sync`] pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub created: Vec<ProviderId>,
    pub destroyed: Vec<ProviderId>,
    pub rebuilt: Vec<ProviderId>,
}

impl SyncReport {
    /// True when the pass neither created nor destroyed any widget.
    pub fn is_noop(&self) -> bool {
        self.created.is_empty() && self.destroyed.is_empty() && self.rebuilt.is_empty()
    }
}

/// Outcome of committing one tick's batch of samples.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitReport {
    pub appended: Vec<ProviderId>,
    /// Providers deselected after the request was built.
    pub inactive: Vec<ProviderId>,
    /// Providers whose chart was rebuilt for a different device layout.
    pub stale: Vec<ProviderId>,
    /// Providers whose sample is not newer than the series tail.
    pub out_of_order: Vec<ProviderId>,
}

#[derive(Debug, Clone)]
struct ChartBinding {
    handle: ChartHandle,
    layout: Vec<String>,
}

/// Owns one widget and one series per active provider.
#[derive(Debug)]
pub struct ChartRegistry<B: ChartBackend> {
    backend: B,
    series: SeriesBuffer,
    charts: BTreeMap<ProviderId, ChartBinding>,
}

impl<B: ChartBackend> ChartRegistry<B> {
    pub fn new(backend: B, max_points: usize) -> Self {
        Self {
            backend,
            series: SeriesBuffer::new(max_points),
            charts: BTreeMap::new(),
        }
    }

    /// Align widgets with `selected` and the current `devices` order.
    ///
    /// Deselected providers are destroyed, newly selected ones created, and
    /// still-selected providers whose layout no longer matches `devices` are
    /// destroyed and recreated with an empty series. Calling this twice with
    /// the same arguments does no destructive work the second time.
    pub fn sync(&mut self, selected: &BTreeSet<ProviderId>, devices: &DeviceSet) -> SyncReport {
        let layout: Vec<String> = devices.hostnames().into_iter().map(String::from).collect();
        let mut report = SyncReport::default();

        let gone: Vec<ProviderId> =
            self.charts.keys().filter(|p| !selected.contains(*p)).cloned().collect();
        for provider in gone {
            if let Some(binding) = self.charts.remove(&provider) {
                self.backend.destroy(binding.handle);
            }
            self.series.discard(&provider);
            report.destroyed.push(provider);
        }

        for provider in selected {
            let existing = self.charts.get(provider).map(|b| (b.handle, b.layout == layout));
            match existing {
                Some((_, true)) => {}
                Some((handle, false)) => {
                    self.backend.destroy(handle);
                    self.bind(provider, &layout);
                    report.rebuilt.push(provider.clone());
                }
                None => {
                    self.bind(provider, &layout);
                    report.created.push(provider.clone());
                }
            }
        }

        if report.is_noop() {
            debug!("chart sync: no changes");
        } else {
            info!(
                created = report.created.len(),
                destroyed = report.destroyed.len(),
                rebuilt = report.rebuilt.len(),
                "chart sync"
            );
        }
        report
    }

    fn bind(&mut self, provider: &ProviderId, layout: &[String]) {
        let handle = self.backend.create(provider, layout);
        self.series.register(provider.clone());
        self.charts.insert(
            provider.clone(),
            ChartBinding {
                handle,
                layout: layout.to_vec(),
            },
        );
    }

    /// Append one sample per provider, all built against `layout`.
    ///
    /// Each provider is checked for liveness, layout and timestamp order
    /// before its sample is written; widgets mirror the series append and
    /// eviction. The checks are per provider, so a batch can be partly
    /// applied when only some of its charts were rebuilt.
    pub fn commit(&mut self, batch: Vec<(ProviderId, Sample)>, layout: &[String]) -> CommitReport {
        let mut report = CommitReport::default();

        for (provider, sample) in batch {
            let Some(binding) = self.charts.get(&provider) else {
                report.inactive.push(provider);
                continue;
            };
            if binding.layout != layout {
                report.stale.push(provider);
                continue;
            }
            let tail = self.series.get(&provider).and_then(Series::latest).map(|s| s.timestamp);
            if tail.is_some_and(|last| sample.timestamp <= last) {
                report.out_of_order.push(provider);
                continue;
            }
            let handle = binding.handle;
            let timestamp = sample.timestamp;
            let values = sample.values.clone();

            let evicted = match self.series.append(&provider, sample) {
                Ok(evicted) => evicted,
                Err(_) => {
                    report.inactive.push(provider);
                    continue;
                }
            };

            self.backend.append_label(handle, timestamp);
            for (index, value) in values.into_iter().enumerate() {
                self.backend.append_sample(handle, index, value);
            }
            for _ in 0..evicted {
                self.backend.evict_oldest(handle);
            }
            self.backend.refresh(handle);
            report.appended.push(provider);
        }

        report
    }

    /// Providers that currently have a widget.
    pub fn providers(&self) -> BTreeSet<ProviderId> {
        self.charts.keys().cloned().collect()
    }

    pub fn handle(&self, provider: &ProviderId) -> Option<ChartHandle> {
        self.charts.get(provider).map(|b| b.handle)
    }

    /// The device order a provider's widget was built with.
    pub fn layout(&self, provider: &ProviderId) -> Option<&[String]> {
        self.charts.get(provider).map(|b| b.layout.as_slice())
    }

    pub fn series(&self, provider: &ProviderId) -> Option<&Series> {
        self.series.get(provider)
    }

    pub fn max_points(&self) -> usize {
        self.series.max_points()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn len(&self) -> usize {
        self.charts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charts.is_empty()
    }
}
