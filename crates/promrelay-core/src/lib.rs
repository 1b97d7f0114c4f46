//! promrelay-core — scrape source configuration for Promrelay.
//!
//! Resolves flag-supplied source descriptors into typed scrape targets.
//! Pure validation and normalization with no network dependency; the
//! scraping side lives in `promrelay-scrape`.

pub mod error;
pub mod source;
mod uri;

pub use error::{ConfigError, ConfigResult};
pub use source::{DEFAULT_METRICS_PATH, SourceConfig};
