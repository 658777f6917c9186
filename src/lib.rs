//! Analytics aggregation and caching for the TeamHub portal.
//!
//! The crate reads task, transaction, event and member records from a
//! [`RecordStore`](analytics::RecordStore), aggregates them over a named
//! [`Timeframe`](analytics::Timeframe) and returns dashboard statistics,
//! productivity scores, insights and recommendations. Results are memoized
//! for a configurable time-to-live.
//!
//! ## Usage
//!
//! ```bash
//! # Month snapshot from a JSON export
//! teamhub-analytics --records portal-export.json snapshot
//!
//! # Markdown performance report for the last quarter
//! teamhub-analytics --records portal-export.json report --timeframe quarter
//!
//! # Analytics for one member
//! teamhub-analytics --records portal-export.json member u42
//!
//! # Live summary on the configured refresh interval
//! teamhub-analytics --records portal-export.json watch
//! ```

pub mod analytics;
pub mod clock;
pub mod config;
pub mod error;

// Re-export commonly used types
pub use analytics::AnalyticsEngine;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::AnalyticsConfig;
pub use error::{AnalyticsError, Result, UserFriendlyError};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
