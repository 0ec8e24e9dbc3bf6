//! Bounded per-provider sample history.

use std::collections::{HashMap, VecDeque};

use super::model::{ProviderId, Sample};
use crate::error::TelemetryError;

/// Number of points kept per chart when configuration does not say otherwise.
pub const DEFAULT_MAX_POINTS: usize = 60;

/// Time-ordered samples for one provider, oldest first.
#[derive(Debug, Clone, Default)]
pub struct Series {
    samples: VecDeque<Sample>,
}

impl Series {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    pub fn latest(&self) -> Option<&Sample> {
        self.samples.back()
    }

    /// Timestamps in retained order.
    pub fn timestamps(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.timestamp).collect()
    }
}

/// Sliding-window store of samples, one [`Series`] per registered provider.
///
/// Eviction is strict FIFO: after an append the series is trimmed from the
/// head until it holds at most `max_points` samples.
#[derive(Debug, Clone)]
pub struct SeriesBuffer {
    max_points: usize,
    series: HashMap<ProviderId, Series>,
}

impl Default for SeriesBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_POINTS)
    }
}

impl SeriesBuffer {
    /// Create a buffer holding at most `max_points` samples per provider.
    ///
    /// A zero cap is raised to one.
    pub fn new(max_points: usize) -> Self {
        Self {
            max_points: max_points.max(1),
            series: HashMap::new(),
        }
    }

    pub fn max_points(&self) -> usize {
        self.max_points
    }

    /// Create an empty series for a provider, replacing any existing one.
    pub fn register(&mut self, provider: ProviderId) {
        self.series.insert(provider, Series::default());
    }

    /// Drop a provider's series entirely.
    pub fn discard(&mut self, provider: &ProviderId) -> Option<Series> {
        self.series.remove(provider)
    }

    pub fn is_registered(&self, provider: &ProviderId) -> bool {
        self.series.contains_key(provider)
    }

    /// Push a sample to the tail, then evict from the head while over the cap.
    ///
    /// Returns how many samples were evicted.
    pub fn append(&mut self, provider: &ProviderId, sample: Sample) -> Result<usize, TelemetryError> {
        let series = self
            .series
            .get_mut(provider)
            .ok_or_else(|| TelemetryError::UnknownProvider(provider.clone()))?;

        series.samples.push_back(sample);
        let mut evicted = 0;
        while series.samples.len() > self.max_points {
            series.samples.pop_front();
            evicted += 1;
        }
        Ok(evicted)
    }

    /// Reset a provider's series to empty.
    pub fn clear(&mut self, provider: &ProviderId) -> Result<(), TelemetryError> {
        let series = self
            .series
            .get_mut(provider)
            .ok_or_else(|| TelemetryError::UnknownProvider(provider.clone()))?;
        series.samples.clear();
        Ok(())
    }

    pub fn get(&self, provider: &ProviderId) -> Option<&Series> {
        self.series.get(provider)
    }

    pub fn providers(&self) -> impl Iterator<Item = &ProviderId> {
        self.series.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cpu() -> ProviderId {
        ProviderId::from("cpu")
    }

    fn sample(ts: f64) -> Sample {
        Sample::new(ts, vec![ts * 10.0])
    }

    #[test]
    fn test_append_keeps_most_recent_within_cap() {
        let mut buffer = SeriesBuffer::new(3);
        buffer.register(cpu());

        for ts in 1..=4 {
            buffer.append(&cpu(), sample(ts as f64)).unwrap();
        }

        let series = buffer.get(&cpu()).unwrap();
        assert_eq!(series.timestamps(), vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_length_never_exceeds_cap_for_any_prefix() {
        let cap = 5;
        let mut buffer = SeriesBuffer::new(cap);
        buffer.register(cpu());

        for count in 1..=17usize {
            buffer.append(&cpu(), sample(count as f64)).unwrap();
            let series = buffer.get(&cpu()).unwrap();
            assert!(series.len() <= cap);

            let kept = count.min(cap);
            let expected: Vec<f64> = ((count - kept + 1)..=count).map(|t| t as f64).collect();
            assert_eq!(series.timestamps(), expected);
        }
    }

    #[test]
    fn test_append_reports_evictions() {
        let mut buffer = SeriesBuffer::new(2);
        buffer.register(cpu());

        assert_eq!(buffer.append(&cpu(), sample(1.0)).unwrap(), 0);
        assert_eq!(buffer.append(&cpu(), sample(2.0)).unwrap(), 0);
        assert_eq!(buffer.append(&cpu(), sample(3.0)).unwrap(), 1);
    }

    #[test]
    fn test_append_to_unregistered_provider_fails() {
        let mut buffer = SeriesBuffer::new(3);
        let err = buffer.append(&cpu(), sample(1.0)).unwrap_err();
        assert!(matches!(err, TelemetryError::UnknownProvider(p) if p == cpu()));
        assert!(buffer.get(&cpu()).is_none());
    }

    #[test]
    fn test_clear_empties_series_but_keeps_registration() {
        let mut buffer = SeriesBuffer::new(3);
        buffer.register(cpu());
        buffer.append(&cpu(), sample(1.0)).unwrap();

        buffer.clear(&cpu()).unwrap();
        assert!(buffer.get(&cpu()).unwrap().is_empty());
        assert!(buffer.is_registered(&cpu()));
    }

    #[test]
    fn test_zero_cap_is_raised_to_one() {
        let mut buffer = SeriesBuffer::new(0);
        buffer.register(cpu());
        buffer.append(&cpu(), sample(1.0)).unwrap();
        buffer.append(&cpu(), sample(2.0)).unwrap();
        assert_eq!(buffer.get(&cpu()).unwrap().timestamps(), vec![2.0]);
    }
}
