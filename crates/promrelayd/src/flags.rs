//! Value types for the agent's command-line flags.

use std::str::FromStr;

use thiserror::Error;

/// A raw `--source` flag: `component:uri`.
///
/// The component name is everything before the first `:`; the rest is
/// the URI handed to the resolver untouched, so the `http://` scheme
/// and any port colons stay inside the URI half.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFlag {
    pub key: String,
    pub uri: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FlagError {
    #[error("expected component:uri, got {0:?}")]
    MissingSeparator(String),
    #[error("component name is empty in {0:?}")]
    EmptyKey(String),
    #[error("uri is empty in {0:?}")]
    EmptyUri(String),
}

impl FromStr for SourceFlag {
    type Err = FlagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, uri) = s
            .split_once(':')
            .ok_or_else(|| FlagError::MissingSeparator(s.to_string()))?;
        if key.is_empty() {
            return Err(FlagError::EmptyKey(s.to_string()));
        }
        if uri.is_empty() {
            return Err(FlagError::EmptyUri(s.to_string()));
        }
        Ok(Self {
            key: key.to_string(),
            uri: uri.to_string(),
        })
    }
}
