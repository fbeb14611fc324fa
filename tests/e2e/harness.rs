//! Test harness around a mock repository host.
//!
//! The `TestHarness` owns a `wiremock` server standing in for both the raw
//! file host and the repository API, plus temporary cache and theme
//! directories. Each call to [`TestHarness::host`] builds a fresh host over
//! the same directories, which is how separate processes would see them.

use std::sync::Arc;
use tempfile::TempDir;
use theme_updater::host::http::ReqwestTransport;
use theme_updater::host::store::FileTransientStore;
use theme_updater::host::themes::FsThemeDirectory;
use theme_updater::{Host, UpdaterConfig};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Slug of the theme under test.
pub const SLUG: &str = "wp-soli-clean-theme";

/// Path of the raw manifest on the mock server.
pub const MANIFEST_PATH: &str = "/raw/main/style.css";

/// Path of the raw readme on the mock server.
pub const README_PATH: &str = "/raw/main/README.md";

/// Path of the repository API on the mock server.
pub const API_PATH: &str = "/repos/soli/wp-soli-clean-theme";

/// Test harness managing the mock server and on-disk state.
pub struct TestHarness {
    server: MockServer,
    cache_dir: TempDir,
    theme_dir: TempDir,
}

impl TestHarness {
    /// Start the mock server and create empty directories.
    pub async fn setup() -> Self {
        Self {
            server: MockServer::start().await,
            cache_dir: TempDir::new().expect("cache dir"),
            theme_dir: TempDir::new().expect("theme dir"),
        }
    }

    /// A complete configuration pointing at the mock server.
    pub fn config(&self) -> UpdaterConfig {
        let base = self.server.uri();
        UpdaterConfig {
            slug: SLUG.to_string(),
            api_url: format!("{base}{API_PATH}"),
            raw_url: format!("{base}/raw/main"),
            repo_url: format!("{base}/soli/wp-soli-clean-theme"),
            package_url: format!("{base}/soli/wp-soli-clean-theme/releases/latest/download/theme.zip"),
            min_host_version: "6.0.0".to_string(),
            tested_host_version: "6.7.0".to_string(),
            min_runtime_version: Some("8.0".to_string()),
            readme_filename: "README.md".to_string(),
            ..UpdaterConfig::default()
        }
    }

    /// Install the theme at `version` in the themes directory.
    pub fn install_theme(&self, version: &str) {
        let dir = self.theme_dir.path().join(SLUG);
        std::fs::create_dir_all(&dir).expect("theme dir");
        std::fs::write(
            dir.join("style.css"),
            format!("/*\nTheme Name: Soli Clean Theme\nAuthor: Soli\nVersion: {version}\n*/\n"),
        )
        .expect("write stylesheet");
    }

    /// A fresh host over the harness directories.
    pub fn host(&self) -> Host {
        Host::new(
            Arc::new(ReqwestTransport::new().expect("transport")),
            Arc::new(FileTransientStore::open(self.cache_dir.path()).expect("store")),
            Arc::new(FsThemeDirectory::new(self.theme_dir.path().to_path_buf())),
        )
    }

    /// Serve `body` with `status` on `route`.
    pub async fn serve(&self, route: &str, status: u16, body: &str) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&self.server)
            .await;
    }

    /// Every request the server has received.
    pub async fn requests(&self) -> Vec<wiremock::Request> {
        self.server.received_requests().await.unwrap_or_default()
    }

    /// Number of requests received on `route`.
    pub async fn requests_to(&self, route: &str) -> usize {
        self.requests()
            .await
            .iter()
            .filter(|request| request.url.path() == route)
            .count()
    }
}
