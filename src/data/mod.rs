//! Data models and bounded history for appliance telemetry.
//!
//! ## Submodules
//!
//! - [`model`]: Value types ([`Device`], [`ProviderId`], [`Sample`])
//! - [`roster`]: The monitored [`DeviceSet`] and the charted [`ProviderSelection`]
//! - [`series`]: Sliding-window sample storage ([`SeriesBuffer`])
//!
//! ## Data Flow
//!
//! ```text
//! FetchResponse (status JSON)
//!        │
//!        ▼
//! Sample per selected provider (values in device order)
//!        │
//!        ▼
//! SeriesBuffer::append() ──▶ FIFO eviction at max_points
//! ```

pub mod model;
pub mod roster;
pub mod series;

pub use model::{Credentials, Device, ProviderId, Sample};
pub use roster::{DeviceSet, ProviderCatalog, ProviderSelection, KNOWN_PROVIDERS};
pub use series::{Series, SeriesBuffer, DEFAULT_MAX_POINTS};
