//! promrelay-scrape — metric retrieval for Promrelay.
//!
//! Fetches a target's text exposition endpoint over HTTP and decodes
//! the body into typed metric families.
//!
//! # Architecture
//!
//! ```text
//! scrape(host, port, path, matchers)
//!   ├── build http://host:port/path?match[]=...
//!   ├── one HTTP/1.1 GET per call, connection scoped to the call
//!   └── text::parse_families() → HashMap<name, MetricFamily>
//! ```

pub mod error;
pub mod model;
pub mod scraper;
pub mod text;

pub use error::{ScrapeError, ScrapeResult};
pub use model::{LabelPair, MetricFamily, MetricType, Sample};
pub use scraper::scrape;
pub use text::{parse_families, TextParseError};
