//! Theme update checker.
//!
//! This module handles:
//! - Subscribing to the host's update, timeout and request-argument hooks
//! - Resolving the latest published version from the remote manifest or readme
//! - Caching remote metadata in the host's transient store
//! - Contributing an [`UpdateDescriptor`] when the remote version is newer

pub mod cache;
mod descriptor;
pub mod manifest;
mod remote;
pub mod version;

#[cfg(test)]
pub(crate) mod testing;

pub use descriptor::{ThemeUpdateTransient, UpdateDescriptor};
pub use remote::RemoteSnapshot;

use crate::config::{UpdaterConfig, ValidConfig};
use crate::host::themes::InstalledTheme;
use crate::host::{Host, RequestArgs, RequestArgsFilter, RequestTimeoutFilter, ThemeUpdateFilter};
use async_trait::async_trait;
use cache::Refresh;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Timeout the checker installs for every outbound request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

/// Checks a GitHub-hosted theme for updates.
pub struct UpdateChecker {
    config: ValidConfig,
    refresh: Refresh,
    installed: InstalledTheme,
    /// Session tier for the resolved latest version.
    new_version: Mutex<Option<String>>,
    /// Session tier for the last non-empty API snapshot.
    snapshot: Mutex<Option<RemoteSnapshot>>,
}

impl UpdateChecker {
    /// Validate `config` and, if it is complete, activate a checker on `host`.
    ///
    /// An incomplete configuration is logged and yields `None`: nothing is
    /// registered and no request is ever made.
    pub fn register(config: UpdaterConfig, host: &Host) -> Option<Arc<Self>> {
        match config.validate() {
            Ok(valid) => Some(Self::activate(valid, host)),
            Err(e) => {
                warn!("Theme updater not activated: {}", e);
                None
            }
        }
    }

    /// Activate a checker for a validated configuration.
    ///
    /// Installed theme metadata is looked up once here; values present in the
    /// configuration take precedence. The checker then subscribes to all three
    /// host extension points.
    pub fn activate(config: ValidConfig, host: &Host) -> Arc<Self> {
        let declared = match host.themes().installed(config.slug()) {
            Ok(theme) => theme.unwrap_or_default(),
            Err(e) => {
                warn!("Failed to read installed theme {}: {}", config.slug(), e);
                InstalledTheme::default()
            }
        };

        let overrides = config.overrides();
        let installed = InstalledTheme {
            name: overrides.theme_name.clone().or(declared.name),
            version: overrides.installed_version.clone().or(declared.version),
            author: overrides.author.clone().or(declared.author),
            homepage: overrides.homepage.clone().or(declared.homepage),
        };

        let refresh = Refresh::from(config.force_update());
        if refresh == Refresh::Force {
            info!("Force update enabled: transient cache bypassed for {}", config.slug());
        }

        let checker = Arc::new(Self {
            config,
            refresh,
            installed,
            new_version: Mutex::new(None),
            snapshot: Mutex::new(None),
        });

        host.add_theme_update_filter(Arc::clone(&checker) as Arc<dyn ThemeUpdateFilter>);
        host.add_request_timeout_filter(Arc::clone(&checker) as Arc<dyn RequestTimeoutFilter>);
        host.add_request_args_filter(Arc::clone(&checker) as Arc<dyn RequestArgsFilter>);

        info!(
            "Theme updater active for {} (installed={})",
            checker.config.slug(),
            checker.installed.version.as_deref().unwrap_or("unknown")
        );

        checker
    }

    /// The validated configuration.
    #[must_use]
    pub fn config(&self) -> &ValidConfig {
        &self.config
    }

    /// Installed theme metadata.
    #[must_use]
    pub fn installed(&self) -> &InstalledTheme {
        &self.installed
    }

    /// Whether reads bypass the transient store.
    #[must_use]
    pub fn refresh(&self) -> Refresh {
        self.refresh
    }

    /// Latest published version, or `None` if it cannot be resolved.
    ///
    /// A resolved value is kept for the lifetime of the checker unless the
    /// cache is forced, in which case it is resolved again on every call.
    pub async fn latest_version(&self, host: &Host) -> Option<String> {
        if let Some(version) = &self.config.overrides().new_version {
            return Some(version.clone());
        }

        if self.refresh == Refresh::UseCache {
            let memo = self.new_version.lock().clone();
            if memo.is_some() {
                return memo;
            }
        }

        let version = self.resolve_latest_version(host).await;
        if version.is_some() {
            *self.new_version.lock() = version.clone();
        }
        version
    }

    /// Date (`YYYY-MM-DD`, UTC) the repository was last updated.
    pub async fn last_updated(&self, host: &Host) -> Option<String> {
        if let Some(date) = &self.config.overrides().last_updated {
            return Some(date.clone());
        }
        self.resolve_remote_snapshot(host)
            .await
            .and_then(|snapshot| snapshot.updated_date())
    }

    /// Repository description.
    pub async fn description(&self, host: &Host) -> Option<String> {
        if let Some(description) = &self.config.overrides().description {
            return Some(description.clone());
        }
        self.resolve_remote_snapshot(host)
            .await
            .and_then(|snapshot| snapshot.description().map(str::to_string))
    }

    /// Add an update descriptor to `transient` when a newer version exists.
    ///
    /// A transient without a populated `checked` registry is returned as is.
    pub async fn compute_update_response(
        &self,
        host: &Host,
        mut transient: ThemeUpdateTransient,
    ) -> ThemeUpdateTransient {
        if !transient.has_checked() {
            debug!("Update transient not populated yet, deferring");
            return transient;
        }

        let slug = self.config.slug();
        let Some(new_version) = self.latest_version(host).await else {
            debug!("Latest version of {} unknown, no update offered", slug);
            return transient;
        };

        let installed = self
            .installed
            .version
            .clone()
            .or_else(|| transient.checked.get(slug).cloned());
        let Some(installed) = installed else {
            debug!("Installed version of {} unknown, no update offered", slug);
            return transient;
        };

        if version::is_newer(&new_version, &installed) {
            info!("Update available for {}: {} -> {}", slug, installed, new_version);
            transient
                .response
                .insert(slug.to_string(), self.descriptor(new_version));
        } else {
            debug!("{} is up to date ({} >= {})", slug, installed, new_version);
        }

        transient
    }

    /// Build the descriptor offered for `new_version`.
    #[must_use]
    pub fn descriptor(&self, new_version: String) -> UpdateDescriptor {
        UpdateDescriptor {
            id: self.config.slug().to_string(),
            new_version,
            url: self.config.authenticate(self.config.repo_url().clone()).into(),
            package: self.config.package_url().to_string(),
            requires: self.config.min_host_version().to_string(),
            requires_php: self.config.min_runtime_version().to_string(),
        }
    }
}

#[async_trait]
impl ThemeUpdateFilter for UpdateChecker {
    async fn filter_theme_updates(
        &self,
        host: &Host,
        transient: ThemeUpdateTransient,
    ) -> ThemeUpdateTransient {
        self.compute_update_response(host, transient).await
    }
}

impl RequestTimeoutFilter for UpdateChecker {
    fn filter_request_timeout(&self, _timeout: Duration) -> Duration {
        REQUEST_TIMEOUT
    }
}

impl RequestArgsFilter for UpdateChecker {
    fn filter_request_args(&self, args: RequestArgs, url: &Url) -> RequestArgs {
        if url == self.config.package_url() {
            RequestArgs {
                verify_tls: self.config.verify_tls(),
                ..args
            }
        } else {
            args
        }
    }
}
