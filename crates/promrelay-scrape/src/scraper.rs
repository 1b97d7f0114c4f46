//! Single-shot metric retrieval over HTTP.
//!
//! One scrape is one connection: connect, send a GET, read the whole
//! body, decode it. No retries and no deadline live at this layer;
//! callers impose timeouts externally and every exit path releases the
//! connection.

use std::collections::HashMap;

use http_body_util::{BodyExt, Empty};
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;
use tracing::debug;

use crate::error::{ScrapeError, ScrapeResult};
use crate::model::MetricFamily;
use crate::text;

/// Fetch and decode the exposition endpoint at
/// `http://{host}:{port}/{path}`.
///
/// The `/` separator is always inserted and `path` is appended verbatim,
/// so callers pass the path without a leading slash. `matchers` become
/// repeated `match[]` query parameters, unescaped and in order; `None`
/// and an empty slice both mean no query string.
///
/// A non-200 answer is an error carrying the status line and the raw
/// body. A 200 body that violates the exposition grammar is a decode
/// error.
pub async fn scrape(
    host: &str,
    port: u16,
    path: &str,
    matchers: Option<&[String]>,
) -> ScrapeResult<HashMap<String, MetricFamily>> {
    let url = scrape_url(host, port, path, matchers);
    let authority = format!("{host}:{port}");

    let stream = TcpStream::connect((host, port))
        .await
        .map_err(|e| ScrapeError::Connect {
            url: url.clone(),
            source: e,
        })?;
    let io = TokioIo::new(stream);
    let (mut sender, conn) =
        hyper::client::conn::http1::handshake(io)
            .await
            .map_err(|e| ScrapeError::Http {
                url: url.clone(),
                source: e,
            })?;

    // Drive the connection; the task finishes once sender and body drop.
    tokio::spawn(async move {
        let _ = conn.await;
    });

    let request = http::Request::builder()
        .method("GET")
        .uri(&url)
        .header("host", authority.as_str())
        .header("user-agent", "promrelay-scrape/0.1")
        .body(Empty::<bytes::Bytes>::new())
        .map_err(|e| ScrapeError::Request {
            url: url.clone(),
            source: e,
        })?;

    let response = sender
        .send_request(request)
        .await
        .map_err(|e| ScrapeError::Http {
            url: url.clone(),
            source: e,
        })?;
    let status = response.status();

    // Read the whole body before checking the status so a failure
    // response still yields its bytes as diagnostics.
    let body = response
        .into_body()
        .collect()
        .await
        .map_err(|e| ScrapeError::Http {
            url: url.clone(),
            source: e,
        })?
        .to_bytes();

    if status != http::StatusCode::OK {
        return Err(ScrapeError::Status {
            status,
            body: String::from_utf8_lossy(&body).into_owned(),
        });
    }

    let families = text::parse_families(&String::from_utf8_lossy(&body))?;
    debug!(%url, families = families.len(), "scrape decoded");
    Ok(families)
}

/// Build the request URL. The `/` separator is unconditional and `path`
/// is appended exactly as given, so a leading slash in `path` doubles up
/// rather than collapsing.
fn scrape_url(host: &str, port: u16, path: &str, matchers: Option<&[String]>) -> String {
    format!("http://{host}:{port}/{path}{}", match_query(matchers))
}

/// Build the `?match[]=...` query string with the expressions unescaped
/// and in order. Absent and empty matcher sets both yield no query.
fn match_query(matchers: Option<&[String]>) -> String {
    match matchers {
        None | Some([]) => String::new(),
        Some(exprs) => {
            let mut query = String::new();
            for expr in exprs {
                query.push_str(if query.is_empty() {
                    "?match[]="
                } else {
                    "&match[]="
                });
                query.push_str(expr);
            }
            query
        }
    }
}
