//! Outbound HTTP for the host environment.

use crate::error::{Error, Result};
use crate::host::RequestArgs;
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::debug;
use url::Url;

/// A successful HTTP response.
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Response headers (lower-cased names).
    pub headers: HashMap<String, String>,
    /// Response body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Create a `200 OK` response with the given body.
    #[must_use]
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    /// Whether the status is 2xx.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body decoded as UTF-8 (lossy).
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Transport used by the host to perform GET requests.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Perform a GET request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on network failure or timeout.
    async fn get(&self, url: &Url, args: &RequestArgs) -> Result<HttpResponse>;
}

/// `reqwest`-backed transport.
///
/// TLS verification is a client-level setting in reqwest, so one verifying
/// and one non-verifying client are kept and picked per request.
pub struct ReqwestTransport {
    verifying: reqwest::Client,
    insecure: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a new transport.
    ///
    /// # Errors
    ///
    /// Returns an error if a client cannot be built.
    pub fn new() -> Result<Self> {
        let user_agent = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

        let verifying = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| Error::Http(format!("failed to build client: {e}")))?;
        let insecure = reqwest::Client::builder()
            .user_agent(user_agent)
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|e| Error::Http(format!("failed to build client: {e}")))?;

        Ok(Self {
            verifying,
            insecure,
        })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &Url, args: &RequestArgs) -> Result<HttpResponse> {
        let client = if args.verify_tls {
            &self.verifying
        } else {
            &self.insecure
        };

        debug!("GET {} (timeout={:?})", redact(url), args.timeout);

        let response = client
            .get(url.clone())
            .timeout(args.timeout)
            .send()
            .await
            .map_err(|e| Error::Http(format!("request to {} failed: {e}", redact(url))))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Http(format!("failed to read body from {}: {e}", redact(url))))?
            .to_vec();

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// Set `key=value` in the query string, replacing any existing `key`.
pub fn add_query_arg(url: &mut Url, key: &str, value: &str) {
    let retained: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != key)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut pairs = url.query_pairs_mut();
    pairs.clear();
    for (k, v) in &retained {
        pairs.append_pair(k, v);
    }
    pairs.append_pair(key, value);
}

/// Render a URL for logs with its query string removed.
#[must_use]
pub fn redact(url: &Url) -> String {
    let mut shown = url.clone();
    shown.set_query(None);
    shown.to_string()
}
