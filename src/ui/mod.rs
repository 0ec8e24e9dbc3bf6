//! Terminal UI rendering using ratatui.
//!
//! ## Submodules
//!
//! - [`charts`]: One line chart per active provider, one line per appliance
//! - [`panels`]: Provider and appliance checklists
//! - [`common`]: Shared components (header, status bar, help overlay)
//! - [`theme`]: Light/dark theme support and the appliance color palette
//!
//! ## Rendering Architecture
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │ Header (common::render_header)       │
//! ├────────────┬─────────────────────────┤
//! │ Providers  │                         │
//! │ (panels)   │ Charts                  │
//! ├────────────┤ (charts::render)        │
//! │ Appliances │                         │
//! │ (panels)   │                         │
//! ├────────────┴─────────────────────────┤
//! │ Status Bar (common::render_status)   │
//! └──────────────────────────────────────┘
//!         ↑
//!    Overlay rendered on top:
//!    - common::render_help
//! ```

pub mod charts;
pub mod common;
pub mod panels;
pub mod theme;

pub use theme::{Palette, Theme};
