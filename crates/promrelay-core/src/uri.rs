//! Minimal http URI dissection for scrape sources.
//!
//! Source URIs are simple enough that we split them by hand: an `http://`
//! authority with an optional bracketed IPv6 literal, an optional path,
//! and a form-urlencoded query string. Host/port splitting and query
//! decoding keep the error cases hard errors rather than best-effort
//! guesses, since a silently misread source scrapes the wrong target.

/// The pieces of a source URI after the scheme.
pub(crate) struct UriParts<'a> {
    /// `host[:port]`, possibly bracketed.
    pub authority: &'a str,
    /// Path including its leading `/`, or `""` when absent.
    pub path: &'a str,
    /// Raw query string without the `?`, when present.
    pub query: Option<&'a str>,
}

/// Split an `http://` URI into authority, path, and query.
///
/// Returns `None` when the scheme is anything other than `http`. A
/// fragment, if present, is discarded.
pub(crate) fn split_http_uri(uri: &str) -> Option<UriParts<'_>> {
    let rest = uri.strip_prefix("http://")?;
    let rest = match rest.split_once('#') {
        Some((before, _fragment)) => before,
        None => rest,
    };
    let (before_query, query) = match rest.split_once('?') {
        Some((b, q)) => (b, Some(q)),
        None => (rest, None),
    };
    let (authority, path) = match before_query.find('/') {
        Some(i) => (&before_query[..i], &before_query[i..]),
        None => (before_query, ""),
    };
    Some(UriParts {
        authority,
        path,
        query,
    })
}

/// Split `host:port`, handling bracketed IPv6 literals.
///
/// Mirrors the splitting rules source URIs have always been written
/// against: the port is everything after the last colon, brackets must
/// balance, and a bare IPv6 literal without brackets is rejected as
/// having too many colons.
pub(crate) fn split_host_port(authority: &str) -> Result<(&str, &str), &'static str> {
    const MISSING_PORT: &str = "missing port in address";
    const TOO_MANY_COLONS: &str = "too many colons in address";

    let Some(i) = authority.rfind(':') else {
        return Err(MISSING_PORT);
    };

    let host;
    let mut j = 0;
    let mut k = 0;
    if authority.starts_with('[') {
        let Some(end) = authority.find(']') else {
            return Err("missing ']' in address");
        };
        if end + 1 == authority.len() {
            return Err(MISSING_PORT);
        }
        if end + 1 != i {
            // The closing bracket is not directly followed by the final
            // colon, so either a second port or stray text follows it.
            if authority.as_bytes()[end + 1] == b':' {
                return Err(TOO_MANY_COLONS);
            }
            return Err(MISSING_PORT);
        }
        host = &authority[1..end];
        j = 1;
        k = end + 1;
    } else {
        host = &authority[..i];
        if host.contains(':') {
            return Err(TOO_MANY_COLONS);
        }
    }
    if authority[j..].contains('[') {
        return Err("unexpected '[' in address");
    }
    if authority[k..].contains(']') {
        return Err("unexpected ']' in address");
    }
    Ok((host, &authority[i + 1..]))
}

/// Decode a form-urlencoded query string into ordered key/value pairs.
///
/// Order is preserved because repeated `match[]` parameters are
/// order-significant. An invalid percent escape or a bare semicolon
/// separator is a hard error.
pub(crate) fn parse_query(query: &str) -> Result<Vec<(String, String)>, String> {
    let mut pairs = Vec::new();
    for segment in query.split('&') {
        if segment.is_empty() {
            continue;
        }
        if segment.contains(';') {
            return Err("invalid semicolon separator in query".to_string());
        }
        let (key, value) = match segment.split_once('=') {
            Some((k, v)) => (k, v),
            None => (segment, ""),
        };
        pairs.push((unescape_component(key)?, unescape_component(value)?));
    }
    Ok(pairs)
}

/// Percent-decode one query component, with `+` as space.
fn unescape_component(s: &str) -> Result<String, String> {
    let bytes = s.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let hi = bytes.get(i + 1).copied().and_then(hex_value);
                let lo = bytes.get(i + 2).copied().and_then(hex_value);
                match (hi, lo) {
                    (Some(h), Some(l)) => {
                        out.push(h << 4 | l);
                        i += 3;
                    }
                    _ => {
                        let end = (i + 3).min(bytes.len());
                        return Err(format!(
                            "invalid URL escape {:?}",
                            String::from_utf8_lossy(&bytes[i..end])
                        ));
                    }
                }
            }
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    Ok(String::from_utf8_lossy(&out).into_owned())
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_uri_full() {
        let parts = split_http_uri("http://hostname:1234/federate?whitelisted=a,b").unwrap();
        assert_eq!(parts.authority, "hostname:1234");
        assert_eq!(parts.path, "/federate");
        assert_eq!(parts.query, Some("whitelisted=a,b"));
    }

    #[test]
    fn split_uri_no_path() {
        let parts = split_http_uri("http://hostname:1234?whitelisted=a").unwrap();
        assert_eq!(parts.authority, "hostname:1234");
        assert_eq!(parts.path, "");
        assert_eq!(parts.query, Some("whitelisted=a"));
    }

    #[test]
    fn split_uri_bare_authority() {
        let parts = split_http_uri("http://hostname:1234").unwrap();
        assert_eq!(parts.authority, "hostname:1234");
        assert_eq!(parts.path, "");
        assert_eq!(parts.query, None);
    }

    #[test]
    fn split_uri_discards_fragment() {
        let parts = split_http_uri("http://h:1/metrics?x=1#frag").unwrap();
        assert_eq!(parts.path, "/metrics");
        assert_eq!(parts.query, Some("x=1"));
    }

    #[test]
    fn split_uri_rejects_other_schemes() {
        assert!(split_http_uri("https://hostname:1234").is_none());
        assert!(split_http_uri("ftp://hostname:1234").is_none());
        assert!(split_http_uri("hostname:1234").is_none());
    }

    #[test]
    fn host_port_plain() {
        assert_eq!(split_host_port("hostname:1234"), Ok(("hostname", "1234")));
    }

    #[test]
    fn host_port_bracketed_ipv6() {
        assert_eq!(split_host_port("[::1]:9090"), Ok(("::1", "9090")));
    }

    #[test]
    fn host_port_missing_port() {
        assert_eq!(split_host_port("hostname"), Err("missing port in address"));
        assert_eq!(split_host_port("[::1]"), Err("missing port in address"));
    }

    #[test]
    fn host_port_unbalanced_bracket() {
        assert_eq!(
            split_host_port("hostname[:1234"),
            Err("unexpected '[' in address")
        );
        assert_eq!(split_host_port("[::1:9090"), Err("missing ']' in address"));
    }

    #[test]
    fn host_port_bare_ipv6_rejected() {
        assert_eq!(
            split_host_port("::1:9090"),
            Err("too many colons in address")
        );
    }

    #[test]
    fn query_preserves_order() {
        let pairs = parse_query("b=2&a=1&b=3").unwrap();
        assert_eq!(
            pairs,
            vec![
                ("b".to_string(), "2".to_string()),
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "3".to_string()),
            ]
        );
    }

    #[test]
    fn query_decodes_escapes() {
        let pairs = parse_query("k=a%2Cb+c").unwrap();
        assert_eq!(pairs, vec![("k".to_string(), "a,b c".to_string())]);
    }

    #[test]
    fn query_keeps_selector_punctuation() {
        let pairs = parse_query("match[]={job=\"prometheus\"}").unwrap();
        assert_eq!(
            pairs,
            vec![("match[]".to_string(), "{job=\"prometheus\"}".to_string())]
        );
    }

    #[test]
    fn query_value_without_equals() {
        let pairs = parse_query("flag").unwrap();
        assert_eq!(pairs, vec![("flag".to_string(), String::new())]);
    }

    #[test]
    fn query_rejects_bad_escape() {
        let err = parse_query("k=%zz").unwrap_err();
        assert!(err.contains("invalid URL escape"), "got: {err}");
    }

    #[test]
    fn query_rejects_semicolon_separator() {
        assert!(parse_query("a=1;b=2").is_err());
    }
}
