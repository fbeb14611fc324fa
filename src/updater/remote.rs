//! Remote metadata resolution.
//!
//! Lookups go through three tiers: the checker's session copy, the host's
//! transient store, then the network. Failures never escape: they are logged
//! and resolve to `None`.

use super::cache::{self, CacheKey};
use super::manifest;
use super::UpdateChecker;
use crate::error::Result;
use crate::host::http::{redact, HttpResponse};
use crate::host::{Host, RequestArgs};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

/// Decoded repository API response.
///
/// A body that failed to decode is kept as `null` so that it can be cached
/// like any other response.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteSnapshot(Value);

impl RemoteSnapshot {
    /// Wrap a decoded value.
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// The raw JSON value.
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.0
    }

    /// Whether the snapshot carries no data at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match &self.0 {
            Value::Null => true,
            Value::Bool(b) => !b,
            Value::String(s) => s.is_empty(),
            Value::Array(a) => a.is_empty(),
            Value::Object(o) => o.is_empty(),
            Value::Number(_) => false,
        }
    }

    fn text_field(&self, name: &str) -> Option<&str> {
        self.0
            .get(name)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Raw `updated_at` timestamp.
    #[must_use]
    pub fn updated_at(&self) -> Option<&str> {
        self.text_field("updated_at")
    }

    /// `updated_at` as a UTC `YYYY-MM-DD` date.
    #[must_use]
    pub fn updated_date(&self) -> Option<String> {
        self.updated_at()
            .and_then(parse_timestamp)
            .map(|date| date.format("%Y-%m-%d").to_string())
    }

    /// Free-text `description`.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.text_field("description")
    }
}

fn parse_timestamp(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

impl UpdateChecker {
    /// GET `url` with the access token appended and the configured TLS setting.
    async fn remote_get(&self, host: &Host, url: Url) -> Result<HttpResponse> {
        let url = self.config.authenticate(url);
        let args = RequestArgs {
            verify_tls: self.config.verify_tls(),
            ..RequestArgs::default()
        };
        host.remote_get(&url, args).await
    }

    /// Fetch a raw project file; `None` on failure or empty body.
    async fn fetch_raw_file(&self, host: &Host, file: &str) -> Option<String> {
        let url = match self.config.raw_url().join(file) {
            Ok(url) => url,
            Err(e) => {
                warn!("Cannot build raw URL for {}: {}", file, e);
                return None;
            }
        };

        match self.remote_get(host, url.clone()).await {
            Ok(response) if response.body.is_empty() => {
                debug!("Empty body from {}", redact(&url));
                None
            }
            Ok(response) => Some(response.text()),
            Err(e) => {
                debug!("Fetching {} failed: {}", file, e);
                None
            }
        }
    }

    /// Resolve the latest published version.
    ///
    /// Tries the transient store, then the manifest `Version:` header, then
    /// the readme `~Current Version: x~` marker. Only a resolved value is
    /// cached, so an unknown version is retried on the next check.
    pub async fn resolve_latest_version(&self, host: &Host) -> Option<String> {
        let key = CacheKey::new_version(self.config.slug());

        if let Some(Value::String(cached)) = cache::read(host.transients(), &key, self.refresh) {
            if !cached.trim().is_empty() {
                debug!("Latest version of {} from transient: {}", self.config.slug(), cached);
                return Some(cached);
            }
        }

        let mut version = self
            .fetch_raw_file(host, self.config.manifest_filename())
            .await
            .and_then(|body| manifest::manifest_version(&body));

        if version.is_none() {
            debug!(
                "No version in {}, falling back to {}",
                self.config.manifest_filename(),
                self.config.readme_filename()
            );
            version = self
                .fetch_raw_file(host, self.config.readme_filename())
                .await
                .and_then(|body| manifest::readme_version(&body));
        }

        match &version {
            Some(v) => {
                debug!("Resolved latest version of {}: {}", self.config.slug(), v);
                cache::write(host.transients(), &key, Value::String(v.clone()));
            }
            None => warn!("Could not resolve latest version of {}", self.config.slug()),
        }

        version
    }

    /// Resolve the repository API snapshot.
    ///
    /// Any response that arrives is cached for the full TTL, even if its body
    /// is not valid JSON; only a failed request is left uncached. Once a
    /// non-empty snapshot has been seen, this checker keeps returning it
    /// without consulting the store.
    pub async fn resolve_remote_snapshot(&self, host: &Host) -> Option<RemoteSnapshot> {
        let memo = self.snapshot.lock().clone();
        if memo.is_some() {
            return memo;
        }

        let key = CacheKey::github_data(self.config.slug());
        let snapshot = if let Some(value) = cache::read(host.transients(), &key, self.refresh) {
            RemoteSnapshot::new(value)
        } else {
            let response = match self.remote_get(host, self.config.api_url().clone()).await {
                Ok(response) => response,
                Err(e) => {
                    warn!("Repository API unavailable for {}: {}", self.config.slug(), e);
                    return None;
                }
            };

            let value = serde_json::from_slice(&response.body).unwrap_or_else(|e| {
                warn!("Malformed repository API response for {}: {}", self.config.slug(), e);
                Value::Null
            });
            cache::write(host.transients(), &key, value.clone());
            RemoteSnapshot::new(value)
        };

        if !snapshot.is_empty() {
            *self.snapshot.lock() = Some(snapshot.clone());
        }

        Some(snapshot)
    }
}
