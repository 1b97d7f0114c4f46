//! Error types for source configuration resolution.

use thiserror::Error;

/// Result alias for resolver operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors produced while resolving a source descriptor.
///
/// Every variant names the component key it belongs to, so a failure in a
/// batch of flag-supplied sources can be traced to the offending flag.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Port was missing, non-numeric, zero, or out of range.
    #[error("source {component}: invalid port {value:?}")]
    InvalidPort { component: String, value: String },

    #[error("source {component}: cannot split host and port from {authority:?}: {reason}")]
    HostPort {
        component: String,
        authority: String,
        reason: String,
    },

    #[error("source {component}: unsupported scheme in {uri:?} (only http targets are scraped)")]
    Scheme { component: String, uri: String },

    #[error("source {component}: malformed query string: {reason}")]
    Query { component: String, reason: String },

    #[error("source component name must not be empty")]
    EmptyComponent,

    #[error("source {component}: host must not be empty")]
    EmptyHost { component: String },
}
