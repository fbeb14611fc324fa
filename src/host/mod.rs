//! The host environment an update checker plugs into.
//!
//! The host owns three extension points, an HTTP transport, a transient
//! store and a directory of installed themes:
//!
//! ```text
//!  check_theme_updates ──▶ [ThemeUpdateFilter]*  ──▶ transient with responses
//!  remote_get          ──▶ [RequestTimeoutFilter]* ─▶ [RequestArgsFilter]* ─▶ transport
//! ```
//!
//! Subscribers are run in registration order, each one receiving the output
//! of the previous one.

pub mod http;
pub mod store;
pub mod themes;

use crate::error::{Error, Result};
use crate::updater::ThemeUpdateTransient;
use async_trait::async_trait;
use http::{redact, HttpResponse, HttpTransport};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use store::TransientStore;
use themes::ThemeDirectory;
use tracing::debug;
use url::Url;

/// Timeout used when no filter overrides it.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Options for an outbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestArgs {
    /// Request timeout.
    pub timeout: Duration,
    /// Verify TLS certificates.
    pub verify_tls: bool,
}

impl Default for RequestArgs {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_REQUEST_TIMEOUT,
            verify_tls: true,
        }
    }
}

/// Host extension points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPoint {
    /// Runs before the theme update transient is stored.
    PreSetThemeUpdates,
    /// Overrides the outbound request timeout.
    HttpRequestTimeout,
    /// Overrides per-request arguments.
    HttpRequestArgs,
}

/// Subscriber to [`HookPoint::PreSetThemeUpdates`].
#[async_trait]
pub trait ThemeUpdateFilter: Send + Sync {
    /// Transform the update transient.
    async fn filter_theme_updates(
        &self,
        host: &Host,
        transient: ThemeUpdateTransient,
    ) -> ThemeUpdateTransient;
}

/// Subscriber to [`HookPoint::HttpRequestTimeout`].
pub trait RequestTimeoutFilter: Send + Sync {
    /// Return the timeout to use.
    fn filter_request_timeout(&self, timeout: Duration) -> Duration;
}

/// Subscriber to [`HookPoint::HttpRequestArgs`].
pub trait RequestArgsFilter: Send + Sync {
    /// Return the arguments to use for a request to `url`.
    fn filter_request_args(&self, args: RequestArgs, url: &Url) -> RequestArgs;
}

#[derive(Default)]
struct HookRegistry {
    theme_updates: Vec<Arc<dyn ThemeUpdateFilter>>,
    request_timeout: Vec<Arc<dyn RequestTimeoutFilter>>,
    request_args: Vec<Arc<dyn RequestArgsFilter>>,
}

/// Host environment.
pub struct Host {
    hooks: RwLock<HookRegistry>,
    transport: Arc<dyn HttpTransport>,
    transients: Arc<dyn TransientStore>,
    themes: Arc<dyn ThemeDirectory>,
}

impl Host {
    /// Create a host with no subscribers.
    #[must_use]
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        transients: Arc<dyn TransientStore>,
        themes: Arc<dyn ThemeDirectory>,
    ) -> Self {
        Self {
            hooks: RwLock::new(HookRegistry::default()),
            transport,
            transients,
            themes,
        }
    }

    /// Subscribe to [`HookPoint::PreSetThemeUpdates`].
    pub fn add_theme_update_filter(&self, filter: Arc<dyn ThemeUpdateFilter>) {
        self.hooks.write().theme_updates.push(filter);
    }

    /// Subscribe to [`HookPoint::HttpRequestTimeout`].
    pub fn add_request_timeout_filter(&self, filter: Arc<dyn RequestTimeoutFilter>) {
        self.hooks.write().request_timeout.push(filter);
    }

    /// Subscribe to [`HookPoint::HttpRequestArgs`].
    pub fn add_request_args_filter(&self, filter: Arc<dyn RequestArgsFilter>) {
        self.hooks.write().request_args.push(filter);
    }

    /// Number of subscribers on `point`.
    #[must_use]
    pub fn subscriptions(&self, point: HookPoint) -> usize {
        let hooks = self.hooks.read();
        match point {
            HookPoint::PreSetThemeUpdates => hooks.theme_updates.len(),
            HookPoint::HttpRequestTimeout => hooks.request_timeout.len(),
            HookPoint::HttpRequestArgs => hooks.request_args.len(),
        }
    }

    /// Total number of subscribers across all points.
    #[must_use]
    pub fn total_subscriptions(&self) -> usize {
        let hooks = self.hooks.read();
        hooks.theme_updates.len() + hooks.request_timeout.len() + hooks.request_args.len()
    }

    /// Resolve the effective arguments for a request to `url`.
    #[must_use]
    pub fn request_args(&self, args: RequestArgs, url: &Url) -> RequestArgs {
        let hooks = self.hooks.read();
        let timeout = hooks
            .request_timeout
            .iter()
            .fold(args.timeout, |timeout, f| f.filter_request_timeout(timeout));
        hooks
            .request_args
            .iter()
            .fold(RequestArgs { timeout, ..args }, |args, f| {
                f.filter_request_args(args, url)
            })
    }

    /// Perform a filtered GET request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on transport failure or a non-2xx status.
    pub async fn remote_get(&self, url: &Url, args: RequestArgs) -> Result<HttpResponse> {
        let args = self.request_args(args, url);
        let response = self.transport.get(url, &args).await?;

        if !response.is_success() {
            return Err(Error::Http(format!(
                "{} returned status {}",
                redact(url),
                response.status
            )));
        }

        Ok(response)
    }

    /// Run the update check pipeline over `transient`.
    pub async fn check_theme_updates(
        &self,
        mut transient: ThemeUpdateTransient,
    ) -> ThemeUpdateTransient {
        let filters = self.hooks.read().theme_updates.clone();
        debug!("Running {} theme update filter(s)", filters.len());

        for filter in filters {
            transient = filter.filter_theme_updates(self, transient).await;
        }
        transient
    }

    /// The transient store.
    #[must_use]
    pub fn transients(&self) -> &dyn TransientStore {
        self.transients.as_ref()
    }

    /// The installed theme directory.
    #[must_use]
    pub fn themes(&self) -> &dyn ThemeDirectory {
        self.themes.as_ref()
    }
}
