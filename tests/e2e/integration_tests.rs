//! Update check cycles against the mock repository host.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::harness::{API_PATH, MANIFEST_PATH, README_PATH, SLUG};
use super::TestHarness;
use theme_updater::{HookPoint, ThemeUpdateTransient, UpdateChecker, UpdaterConfig};

const MANIFEST: &str = "/*\nTheme Name: Soli Clean Theme\nVersion: 1.2.0\n*/\n";

/// A newer remote manifest yields a descriptor, and the version is fetched once.
#[tokio::test]
async fn test_update_offered_end_to_end() {
    let harness = TestHarness::setup().await;
    harness.install_theme("1.1.9");
    harness.serve(MANIFEST_PATH, 200, MANIFEST).await;

    let host = harness.host();
    let checker = UpdateChecker::register(harness.config(), &host).expect("active");
    assert_eq!(checker.installed().version.as_deref(), Some("1.1.9"));

    let transient = host
        .check_theme_updates(ThemeUpdateTransient::checked(SLUG, "1.1.9"))
        .await;
    let update = transient.response.get(SLUG).expect("update offered");
    assert_eq!(update.new_version, "1.2.0");
    assert_eq!(update.requires, "6.0.0");
    assert_eq!(update.requires_php, "8.0");
    assert!(update.package.ends_with("/releases/latest/download/theme.zip"));

    // Second cycle within the TTL: no new fetch.
    host.check_theme_updates(ThemeUpdateTransient::checked(SLUG, "1.1.9"))
        .await;
    assert_eq!(harness.requests_to(MANIFEST_PATH).await, 1);
    assert_eq!(harness.requests_to(README_PATH).await, 0);
}

/// Equal installed and remote versions offer nothing.
#[tokio::test]
async fn test_up_to_date() {
    let harness = TestHarness::setup().await;
    harness.install_theme("1.2.0");
    harness.serve(MANIFEST_PATH, 200, MANIFEST).await;

    let host = harness.host();
    let _checker = UpdateChecker::register(harness.config(), &host).expect("active");

    let transient = host
        .check_theme_updates(ThemeUpdateTransient::checked(SLUG, "1.2.0"))
        .await;
    assert!(transient.response.is_empty());
}

/// A missing manifest falls back to the readme marker.
#[tokio::test]
async fn test_readme_fallback() {
    let harness = TestHarness::setup().await;
    harness.install_theme("2.0.0");
    harness.serve(MANIFEST_PATH, 404, "Not Found").await;
    harness
        .serve(README_PATH, 200, "# Soli\n\n~Current Version: 3.0.0~\n")
        .await;

    let host = harness.host();
    let checker = UpdateChecker::register(harness.config(), &host).expect("active");
    assert_eq!(checker.latest_version(&host).await.as_deref(), Some("3.0.0"));

    let transient = host
        .check_theme_updates(ThemeUpdateTransient::checked(SLUG, "2.0.0"))
        .await;
    assert_eq!(transient.response[SLUG].new_version, "3.0.0");
}

/// Both sources failing leaves the cycle untouched and caches nothing.
#[tokio::test]
async fn test_unresolvable_version_is_retried() {
    let harness = TestHarness::setup().await;
    harness.install_theme("1.0.0");
    harness.serve(MANIFEST_PATH, 500, "").await;
    harness.serve(README_PATH, 200, "no marker\n").await;

    let first = harness.host();
    let checker = UpdateChecker::register(harness.config(), &first).expect("active");
    assert_eq!(checker.latest_version(&first).await, None);

    let second = harness.host();
    let checker = UpdateChecker::register(harness.config(), &second).expect("active");
    let transient = second
        .check_theme_updates(ThemeUpdateTransient::checked(SLUG, "1.0.0"))
        .await;

    assert!(transient.response.is_empty());
    assert_eq!(checker.latest_version(&second).await, None);
    assert!(harness.requests_to(MANIFEST_PATH).await >= 2);
}

/// The file store shares the resolved version between checker instances.
#[tokio::test]
async fn test_transients_shared_across_hosts() {
    let harness = TestHarness::setup().await;
    harness.install_theme("1.0.0");
    harness.serve(MANIFEST_PATH, 200, MANIFEST).await;

    for _ in 0..3 {
        let host = harness.host();
        let checker = UpdateChecker::register(harness.config(), &host).expect("active");
        assert_eq!(checker.latest_version(&host).await.as_deref(), Some("1.2.0"));
    }

    assert_eq!(harness.requests_to(MANIFEST_PATH).await, 1);
}

/// Forcing refresh bypasses a live transient.
#[tokio::test]
async fn test_force_update_refetches() {
    let harness = TestHarness::setup().await;
    harness.install_theme("1.0.0");
    harness.serve(MANIFEST_PATH, 200, MANIFEST).await;

    let host = harness.host();
    let checker = UpdateChecker::register(harness.config(), &host).expect("active");
    checker.latest_version(&host).await;

    let forced = UpdaterConfig {
        force_update: true,
        ..harness.config()
    };
    let host = harness.host();
    let checker = UpdateChecker::register(forced, &host).expect("active");
    checker.latest_version(&host).await;
    checker.latest_version(&host).await;

    assert_eq!(harness.requests_to(MANIFEST_PATH).await, 3);
}

/// The access token rides on every request the checker makes.
#[tokio::test]
async fn test_access_token_on_every_request() {
    let harness = TestHarness::setup().await;
    harness.install_theme("1.0.0");
    harness.serve(MANIFEST_PATH, 404, "").await;
    harness
        .serve(README_PATH, 200, "~Current Version: 1.1.0~\n")
        .await;
    harness
        .serve(API_PATH, 200, r#"{"updated_at":"2025-03-01T10:00:00Z","description":"Dashboard"}"#)
        .await;

    let config = UpdaterConfig {
        access_token: "tok123".to_string(),
        package_url: "https://github.com/soli/wp-soli-clean-theme/releases/latest/download/theme.zip"
            .to_string(),
        ..harness.config()
    };
    let host = harness.host();
    let checker = UpdateChecker::register(config, &host).expect("active");

    let transient = host
        .check_theme_updates(ThemeUpdateTransient::checked(SLUG, "1.0.0"))
        .await;
    assert_eq!(checker.last_updated(&host).await.as_deref(), Some("2025-03-01"));
    assert_eq!(checker.description(&host).await.as_deref(), Some("Dashboard"));

    let update = transient.response.get(SLUG).expect("update offered");
    assert_eq!(
        update.package,
        "https://api.github.com/repos/soli/wp-soli-clean-theme/releases/latest/download/theme.zip?access_token=tok123"
    );

    let requests = harness.requests().await;
    assert_eq!(requests.len(), 3);
    for request in requests {
        assert!(
            request
                .url
                .query_pairs()
                .any(|(k, v)| k == "access_token" && v == "tok123"),
            "missing token on {}",
            request.url.path()
        );
    }
}

/// A malformed API body is cached for the full TTL.
#[tokio::test]
async fn test_malformed_api_response_is_cached() {
    let harness = TestHarness::setup().await;
    harness.install_theme("1.0.0");
    harness.serve(API_PATH, 200, "<html>secondary rate limit</html>").await;

    for _ in 0..2 {
        let host = harness.host();
        let checker = UpdateChecker::register(harness.config(), &host).expect("active");
        assert_eq!(checker.description(&host).await, None);
        assert_eq!(checker.last_updated(&host).await, None);
    }

    assert_eq!(harness.requests_to(API_PATH).await, 1);
}

/// An incomplete configuration never registers or fetches.
#[tokio::test]
async fn test_incomplete_config_is_inert() {
    let harness = TestHarness::setup().await;
    harness.install_theme("1.0.0");
    harness.serve(MANIFEST_PATH, 200, MANIFEST).await;

    let config = UpdaterConfig {
        package_url: String::new(),
        readme_filename: String::new(),
        ..harness.config()
    };
    let host = harness.host();
    assert!(UpdateChecker::register(config, &host).is_none());
    assert_eq!(host.subscriptions(HookPoint::PreSetThemeUpdates), 0);
    assert_eq!(host.subscriptions(HookPoint::HttpRequestTimeout), 0);
    assert_eq!(host.subscriptions(HookPoint::HttpRequestArgs), 0);

    let transient = host
        .check_theme_updates(ThemeUpdateTransient::checked(SLUG, "1.0.0"))
        .await;
    assert!(transient.response.is_empty());
    assert!(harness.requests().await.is_empty());
}
