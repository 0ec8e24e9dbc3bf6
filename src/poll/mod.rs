//! Periodic metric collection.
//!
//! This module provides the fetch contract ([`MetricsFetcher`]) and the
//! timer state machine ([`PollLoop`]) that decides when the next batch is
//! requested.
//!
//! ```text
//!          start                 fetch ok, monitoring
//!  Idle ─────────▶ Scheduled ◀──────────────────────┐
//!   ▲                 │ timer fires                  │
//!   │                 ▼                              │
//!   └──────────── Fetching ──────────────────────────┘
//!   fetch failed, or ok while stopped
//! ```

mod poll_loop;
mod request;
mod response;

pub use poll_loop::{PollLoop, PollPhase, TickTicket};
pub use request::{EncodedDevice, FetchOptions, FetchRequest};
pub use response::FetchResponse;

use std::fmt::Debug;

use async_trait::async_trait;

use crate::error::TelemetryError;

/// Fetches one batch of status samples.
///
/// Implementations must not retry: a failed fetch ends the poll chain.
#[async_trait]
pub trait MetricsFetcher: Send + Sync + Debug {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, TelemetryError>;

    /// Returns a human-readable description of where samples come from.
    ///
    /// Used for display in the TUI status bar.
    fn description(&self) -> &str;
}
