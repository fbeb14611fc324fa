//! theme-updater CLI entry point.
//!
//! Runs one update-check cycle the way a host would: activates the checker,
//! builds the update transient from the installed version and prints the
//! result.

mod cli;

use clap::Parser;
use cli::Cli;
use color_eyre::eyre::eyre;
use std::sync::Arc;
use theme_updater::host::http::{redact, ReqwestTransport};
use theme_updater::host::store::FileTransientStore;
use theme_updater::host::themes::{FsThemeDirectory, StaticThemeDirectory, ThemeDirectory};
use theme_updater::{Host, ThemeUpdateTransient, UpdateChecker};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use url::Url;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    info!("theme-updater v{}", env!("CARGO_PKG_VERSION"));

    // Validate up front so misconfiguration is reported instead of ignored
    let config = cli.load_config()?.validate()?;
    let slug = config.slug().to_string();

    let themes: Arc<dyn ThemeDirectory> = match cli.theme_dir {
        Some(ref dir) => Arc::new(FsThemeDirectory::new(dir.clone())),
        None => Arc::new(StaticThemeDirectory::new()),
    };
    let store = FileTransientStore::open(&cli.cache_dir())?;
    let host = Host::new(Arc::new(ReqwestTransport::new()?), Arc::new(store), themes);

    let checker = UpdateChecker::activate(config, &host);
    let installed = checker.installed().version.clone().ok_or_else(|| {
        eyre!("installed version of {slug} unknown; pass --theme-dir or --installed-version")
    })?;

    let transient = host
        .check_theme_updates(ThemeUpdateTransient::checked(&slug, &installed))
        .await;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&transient)?);
        return Ok(());
    }

    match transient.response.get(&slug) {
        Some(update) => {
            println!("Update available for {slug}: {installed} -> {}", update.new_version);
            let package = Url::parse(&update.package)
                .map_or_else(|_| update.package.clone(), |url| redact(&url));
            println!("  package:  {package}");
            println!("  requires: {} (runtime {})", update.requires, update.requires_php);
        }
        None => println!("{slug} {installed} is up to date"),
    }

    if let Some(date) = checker.last_updated(&host).await {
        println!("  last updated: {date}");
    }
    if let Some(description) = checker.description(&host).await {
        println!("  {description}");
    }

    Ok(())
}
