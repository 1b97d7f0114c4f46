//! Typed model for decoded metric families.

use serde::{Deserialize, Serialize};

/// The declared type of a metric family, from its `# TYPE` line.
///
/// Families without a `# TYPE` line are [`MetricType::Untyped`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricType {
    Counter,
    Gauge,
    Histogram,
    Summary,
    Untyped,
}

impl MetricType {
    /// Parse the type word of a `# TYPE` line.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "counter" => Some(Self::Counter),
            "gauge" => Some(Self::Gauge),
            "histogram" => Some(Self::Histogram),
            "summary" => Some(Self::Summary),
            "untyped" => Some(Self::Untyped),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Counter => "counter",
            Self::Gauge => "gauge",
            Self::Histogram => "histogram",
            Self::Summary => "summary",
            Self::Untyped => "untyped",
        }
    }
}

impl std::fmt::Display for MetricType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `name="value"` pair attached to a sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelPair {
    pub name: String,
    pub value: String,
}

/// A single series value from a scrape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Full series name. Differs from the owning family's name for
    /// histogram and summary series (`_bucket`, `_sum`, `_count`).
    pub name: String,
    /// Labels in the order they appeared on the line.
    pub labels: Vec<LabelPair>,
    pub value: f64,
    /// Timestamp in milliseconds, when the line carried one.
    pub timestamp: Option<i64>,
}

impl Sample {
    /// Look up a label value by name.
    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|l| l.name == name)
            .map(|l| l.value.as_str())
    }
}

/// A named group of samples sharing help text and a declared type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricFamily {
    pub name: String,
    /// Text of the `# HELP` line, if one was present. An empty help
    /// string is kept distinct from an absent one.
    pub help: Option<String>,
    pub kind: MetricType,
    /// Samples in the order they appeared in the scrape body.
    pub samples: Vec<Sample>,
}
