//! Prometheus text exposition format decoding.
//!
//! Parses the classic plaintext grammar: `# HELP` and `# TYPE` comment
//! lines followed by sample lines. Histogram `_bucket`/`_sum`/`_count`
//! series and summary quantile/`_sum`/`_count` series are folded into
//! the family that declared them; any other series stands alone under
//! its own name.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::model::{LabelPair, MetricFamily, MetricType, Sample};

/// A violation of the text exposition grammar.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("text format parsing error in line {line}: {message}")]
pub struct TextParseError {
    /// 1-based line number of the offending line.
    pub line: usize,
    pub message: String,
}

/// Decode an exposition body into a map of family name to decoded family.
///
/// Families that declared `HELP`/`TYPE` but carried no samples are
/// dropped from the result. Sample order within each family follows the
/// body. The first grammar violation aborts the decode.
pub fn parse_families(input: &str) -> Result<HashMap<String, MetricFamily>, TextParseError> {
    let mut parser = Parser::default();
    for (idx, line) in input.lines().enumerate() {
        parser.line(idx + 1, line)?;
    }
    Ok(parser.finish())
}

#[derive(Default)]
struct Parser {
    families: HashMap<String, MetricFamily>,
    /// Family names that already consumed a HELP line.
    helped: HashSet<String>,
    /// Family names that already consumed a TYPE line.
    typed: HashSet<String>,
}

impl Parser {
    fn line(&mut self, line_no: usize, line: &str) -> Result<(), TextParseError> {
        if line.is_empty() {
            return Ok(());
        }
        if let Some(rest) = line.strip_prefix('#') {
            return self.comment_line(line_no, rest);
        }
        self.sample_line(line_no, line)
    }

    /// `# HELP name text`, `# TYPE name type`, or a plain comment.
    fn comment_line(&mut self, line_no: usize, rest: &str) -> Result<(), TextParseError> {
        let Some(rest) = rest.strip_prefix([' ', '\t']) else {
            return Ok(());
        };
        let (keyword, remainder) = match rest.split_once([' ', '\t']) {
            Some((k, r)) => (k, r),
            None => (rest, ""),
        };
        match keyword {
            "HELP" => self.help_line(line_no, remainder),
            "TYPE" => self.type_line(line_no, remainder),
            _ => Ok(()),
        }
    }

    fn help_line(&mut self, line_no: usize, rest: &str) -> Result<(), TextParseError> {
        let rest = rest.trim_start_matches([' ', '\t']);
        let (name, help_text) = match rest.split_once([' ', '\t']) {
            Some((n, h)) => (n, h),
            None => (rest, ""),
        };
        if !valid_metric_name(name) {
            return Err(TextParseError {
                line: line_no,
                message: format!("invalid metric name {name:?}"),
            });
        }
        if !self.helped.insert(name.to_string()) {
            return Err(TextParseError {
                line: line_no,
                message: format!("second HELP line for metric name {name:?}"),
            });
        }
        let help = unescape_help(line_no, help_text.trim_start_matches([' ', '\t']))?;
        self.family_entry(name).help = Some(help);
        Ok(())
    }

    fn type_line(&mut self, line_no: usize, rest: &str) -> Result<(), TextParseError> {
        let rest = rest.trim_start_matches([' ', '\t']);
        let (name, kind_text) = match rest.split_once([' ', '\t']) {
            Some((n, k)) => (n, k),
            None => (rest, ""),
        };
        if !valid_metric_name(name) {
            return Err(TextParseError {
                line: line_no,
                message: format!("invalid metric name {name:?}"),
            });
        }
        let declared_after_samples = self
            .families
            .get(name)
            .is_some_and(|f| !f.samples.is_empty());
        if self.typed.contains(name) || declared_after_samples {
            return Err(TextParseError {
                line: line_no,
                message: format!(
                    "second TYPE line for metric name {name:?}, or TYPE reported after samples"
                ),
            });
        }
        let kind_text = kind_text.trim();
        let Some(kind) = MetricType::parse(kind_text) else {
            return Err(TextParseError {
                line: line_no,
                message: format!("unknown metric type {kind_text:?}"),
            });
        };
        self.typed.insert(name.to_string());
        self.family_entry(name).kind = kind;
        Ok(())
    }

    fn sample_line(&mut self, line_no: usize, line: &str) -> Result<(), TextParseError> {
        let mut scan = Scanner::new(line_no, line);
        let name = scan.metric_name()?;
        let labels = if scan.peek() == Some('{') {
            scan.labels()?
        } else {
            Vec::new()
        };
        let value = scan.value()?;
        let timestamp = scan.timestamp()?;

        let family_name = self.resolve_family(&name);
        let sample = Sample {
            name,
            labels,
            value,
            timestamp,
        };

        let family = self.family_entry(&family_name);
        match family.kind {
            MetricType::Histogram if sample.name.ends_with("_bucket") => {
                if let Some(le) = sample.label("le") {
                    le.parse::<f64>().map_err(|_| TextParseError {
                        line: line_no,
                        message: format!("expected float as value for \"le\" label, got {le:?}"),
                    })?;
                }
            }
            MetricType::Summary if sample.name == family.name => {
                if let Some(quantile) = sample.label("quantile") {
                    quantile.parse::<f64>().map_err(|_| TextParseError {
                        line: line_no,
                        message: format!(
                            "expected float as value for \"quantile\" label, got {quantile:?}"
                        ),
                    })?;
                }
            }
            _ => {}
        }
        family.samples.push(sample);
        Ok(())
    }

    /// Map a series name onto its owning family.
    ///
    /// An exact family match always wins. Otherwise `_bucket`, `_sum`
    /// and `_count` suffixes fold into a declared histogram family, and
    /// `_sum`/`_count` plus the bare name fold into a declared summary.
    fn resolve_family(&self, sample_name: &str) -> String {
        if self.families.contains_key(sample_name) {
            return sample_name.to_string();
        }
        for suffix in ["_bucket", "_sum", "_count"] {
            let Some(base) = sample_name.strip_suffix(suffix) else {
                continue;
            };
            let Some(family) = self.families.get(base) else {
                continue;
            };
            let folds = match family.kind {
                MetricType::Histogram => true,
                MetricType::Summary => suffix != "_bucket",
                _ => false,
            };
            if folds {
                return base.to_string();
            }
        }
        sample_name.to_string()
    }

    fn family_entry(&mut self, name: &str) -> &mut MetricFamily {
        self.families
            .entry(name.to_string())
            .or_insert_with(|| MetricFamily {
                name: name.to_string(),
                help: None,
                kind: MetricType::Untyped,
                samples: Vec::new(),
            })
    }

    fn finish(mut self) -> HashMap<String, MetricFamily> {
        // Comment-only families never produced a sample; drop them.
        self.families.retain(|_, family| !family.samples.is_empty());
        self.families
    }
}

/// Character-level scanner for one sample line.
struct Scanner {
    line: usize,
    chars: Vec<char>,
    pos: usize,
}

impl Scanner {
    fn new(line: usize, text: &str) -> Self {
        Self {
            line,
            chars: text.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn skip_blanks(&mut self) {
        while matches!(self.peek(), Some(' ' | '\t')) {
            self.pos += 1;
        }
    }

    fn err(&self, message: impl Into<String>) -> TextParseError {
        TextParseError {
            line: self.line,
            message: message.into(),
        }
    }

    fn metric_name(&mut self) -> Result<String, TextParseError> {
        let start = self.pos;
        match self.peek() {
            Some(c) if is_name_start(c) => self.pos += 1,
            _ => return Err(self.err("invalid metric name")),
        }
        while matches!(self.peek(), Some(c) if is_name_char(c)) {
            self.pos += 1;
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn label_name(&mut self) -> Result<String, TextParseError> {
        let start = self.pos;
        match self.peek() {
            Some(c) if is_label_start(c) => self.pos += 1,
            _ => return Err(self.err("invalid label name")),
        }
        while matches!(self.peek(), Some(c) if is_label_char(c)) {
            self.pos += 1;
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn labels(&mut self) -> Result<Vec<LabelPair>, TextParseError> {
        self.bump(); // consume '{'
        let mut labels = Vec::new();
        self.skip_blanks();
        if self.peek() == Some('}') {
            self.bump();
            return Ok(labels);
        }
        loop {
            self.skip_blanks();
            let name = self.label_name()?;
            self.skip_blanks();
            if self.bump() != Some('=') {
                return Err(self.err(format!("expected '=' after label name {name:?}")));
            }
            self.skip_blanks();
            let value = self.quoted_value()?;
            labels.push(LabelPair { name, value });
            self.skip_blanks();
            match self.bump() {
                Some(',') => {
                    self.skip_blanks();
                    // Trailing comma before the closing brace is allowed.
                    if self.peek() == Some('}') {
                        self.bump();
                        break;
                    }
                }
                Some('}') => break,
                _ => return Err(self.err("expected ',' or '}' after label value")),
            }
        }
        Ok(labels)
    }

    fn quoted_value(&mut self) -> Result<String, TextParseError> {
        if self.bump() != Some('"') {
            return Err(self.err("expected '\"' at start of label value"));
        }
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.err("unexpected end of line in label value")),
                Some('"') => break,
                Some('\\') => match self.bump() {
                    Some('\\') => out.push('\\'),
                    Some('"') => out.push('"'),
                    Some('n') => out.push('\n'),
                    other => {
                        let escaped = other.map(String::from).unwrap_or_default();
                        return Err(self.err(format!("invalid escape sequence '\\{escaped}'")));
                    }
                },
                Some(c) => out.push(c),
            }
        }
        Ok(out)
    }

    fn value(&mut self) -> Result<f64, TextParseError> {
        self.skip_blanks();
        let token = self.token_until_blank();
        if token.is_empty() {
            return Err(self.err("expected float as value"));
        }
        token
            .parse::<f64>()
            .map_err(|_| self.err(format!("expected float as value, got {token:?}")))
    }

    fn timestamp(&mut self) -> Result<Option<i64>, TextParseError> {
        self.skip_blanks();
        if self.peek().is_none() {
            return Ok(None);
        }
        let token = self.token_until_blank();
        let ts = token
            .parse::<i64>()
            .map_err(|_| self.err(format!("expected integer as timestamp, got {token:?}")))?;
        self.skip_blanks();
        if self.peek().is_some() {
            return Err(self.err("spurious string after timestamp"));
        }
        Ok(Some(ts))
    }

    fn token_until_blank(&mut self) -> String {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c != ' ' && c != '\t') {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == ':'
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == ':'
}

fn is_label_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_label_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn valid_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if is_name_start(c) => {}
        _ => return false,
    }
    chars.all(is_name_char)
}

/// Help text with `\\` and `\n` resolved. Any other escape is an error.
fn unescape_help(line_no: usize, text: &str) -> Result<String, TextParseError> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            other => {
                let escaped = other.map(String::from).unwrap_or_default();
                return Err(TextParseError {
                    line: line_no,
                    message: format!("invalid escape sequence '\\{escaped}'"),
                });
            }
        }
    }
    Ok(out)
}
