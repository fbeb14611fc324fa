//! Command-line interface definition.

use clap::Parser;
use std::path::PathBuf;
use theme_updater::UpdaterConfig;

/// Check a GitHub-hosted theme for updates.
#[derive(Parser, Debug)]
#[command(name = "theme-updater")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the updater configuration file (TOML).
    #[arg(long, short, env = "THEME_UPDATER_CONFIG")]
    pub config: PathBuf,

    /// Directory holding installed themes (`<dir>/<slug>/style.css`).
    #[arg(long, env = "THEME_UPDATER_THEME_DIR")]
    pub theme_dir: Option<PathBuf>,

    /// Installed version, overriding the theme directory.
    #[arg(long)]
    pub installed_version: Option<String>,

    /// Directory for cached remote metadata.
    #[arg(long, env = "THEME_UPDATER_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Bypass cached remote metadata.
    #[arg(long, env = "THEME_UPDATER_FORCE_UPDATE")]
    pub force: bool,

    /// Print the resulting update transient as JSON.
    #[arg(long)]
    pub json: bool,

    /// Log level.
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    pub log_level: String,
}

impl Cli {
    /// Load the configuration file and apply CLI overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be loaded.
    pub fn load_config(&self) -> color_eyre::Result<UpdaterConfig> {
        let mut config = UpdaterConfig::from_file(&self.config)?;

        if self.force {
            config.force_update = true;
        }
        if let Some(ref version) = self.installed_version {
            config.installed_version = Some(version.clone());
        }

        Ok(config)
    }

    /// Cache directory, defaulting to the platform cache location.
    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(default_cache_dir)
    }
}

fn default_cache_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "theme-updater")
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".theme-updater"))
}
