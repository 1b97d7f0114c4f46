//! Scrape source configuration.
//!
//! A source is one logical scrape target: a component name resolved to
//! host, port, path, and optional series filters. The two constructors
//! accept either pre-split fields or a raw URI and agree on every
//! normalization rule.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::uri;

/// Path scraped when a source URI does not carry one.
pub const DEFAULT_METRICS_PATH: &str = "/metrics";

/// A resolved scrape target.
///
/// Constructed once per raw source descriptor at startup and never
/// mutated afterwards. `matchers` and `whitelisted` keep the distinction
/// between "parameter absent" (`None`) and "parameter present but empty"
/// (`Some(vec![])`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Logical component name, used for downstream labeling.
    pub component: String,
    /// Hostname or IP literal.
    pub host: String,
    /// Target port.
    pub port: u16,
    /// Absolute path of the exposition endpoint.
    pub path: String,
    /// Series selectors forwarded verbatim to the target as repeated
    /// `match[]` query parameters, in the order given.
    pub matchers: Option<Vec<String>>,
    /// Metric-name allow-list, carried for the downstream translator.
    /// Never applied locally.
    pub whitelisted: Option<Vec<String>>,
}

impl SourceConfig {
    /// Build a source from pre-split fields.
    ///
    /// `port` must parse into 1–65535. An empty `path` falls back to
    /// [`DEFAULT_METRICS_PATH`]; a non-empty one is used verbatim, so the
    /// caller is trusted to supply a well-formed absolute path. A
    /// non-empty `whitelisted` string is split on `,`; an empty one means
    /// no whitelist was supplied at all.
    pub fn from_parts(
        component: &str,
        host: &str,
        port: &str,
        path: &str,
        matchers: Option<Vec<String>>,
        whitelisted: &str,
    ) -> ConfigResult<Self> {
        if component.is_empty() {
            return Err(ConfigError::EmptyComponent);
        }
        if host.is_empty() {
            return Err(ConfigError::EmptyHost {
                component: component.to_string(),
            });
        }

        let port = match port.parse::<u16>() {
            Ok(0) | Err(_) => {
                return Err(ConfigError::InvalidPort {
                    component: component.to_string(),
                    value: port.to_string(),
                });
            }
            Ok(p) => p,
        };

        let path = if path.is_empty() {
            DEFAULT_METRICS_PATH.to_string()
        } else {
            path.to_string()
        };

        let whitelisted = if whitelisted.is_empty() {
            None
        } else {
            Some(whitelisted.split(',').map(str::to_string).collect())
        };

        Ok(Self {
            component: component.to_string(),
            host: host.to_string(),
            port,
            path,
            matchers,
            whitelisted,
        })
    }

    /// Build a source from a labeled URI, e.g.
    /// `http://host:port/path?whitelisted=a,b&match[]={job="x"}`.
    ///
    /// The URI's host component must carry an explicit port. All
    /// `match[]` query values are collected in their original order; a
    /// URI without any `match[]` parameter yields `matchers: None`, not
    /// an empty vector. Path defaulting and whitelist splitting follow
    /// [`SourceConfig::from_parts`].
    pub fn from_uri(key: &str, uri: &str) -> ConfigResult<Self> {
        let parts = uri::split_http_uri(uri).ok_or_else(|| ConfigError::Scheme {
            component: key.to_string(),
            uri: uri.to_string(),
        })?;

        let (host, port) =
            uri::split_host_port(parts.authority).map_err(|reason| ConfigError::HostPort {
                component: key.to_string(),
                authority: parts.authority.to_string(),
                reason: reason.to_string(),
            })?;

        let pairs = match parts.query {
            Some(q) => uri::parse_query(q).map_err(|reason| ConfigError::Query {
                component: key.to_string(),
                reason,
            })?,
            None => Vec::new(),
        };

        let whitelisted = pairs
            .iter()
            .find(|(k, _)| k == "whitelisted")
            .map(|(_, v)| v.as_str())
            .unwrap_or("");

        let matchers: Vec<String> = pairs
            .iter()
            .filter(|(k, _)| k == "match[]")
            .map(|(_, v)| v.clone())
            .collect();
        let matchers = if matchers.is_empty() {
            None
        } else {
            Some(matchers)
        };

        Self::from_parts(key, host, port, parts.path, matchers, whitelisted)
    }
}
