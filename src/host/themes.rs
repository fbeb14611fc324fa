//! Installed theme metadata.

use crate::error::Result;
use crate::updater::manifest::ThemeHeaders;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::debug;

/// Declared metadata of an installed theme.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstalledTheme {
    /// Display name.
    pub name: Option<String>,
    /// Installed version.
    pub version: Option<String>,
    /// Author.
    pub author: Option<String>,
    /// Theme homepage.
    pub homepage: Option<String>,
}

impl From<ThemeHeaders> for InstalledTheme {
    fn from(headers: ThemeHeaders) -> Self {
        Self {
            name: headers.name,
            version: headers.version,
            author: headers.author,
            homepage: headers.homepage,
        }
    }
}

/// Lookup of installed themes by slug.
pub trait ThemeDirectory: Send + Sync {
    /// Metadata of the installed theme, if known.
    ///
    /// # Errors
    ///
    /// Returns an error if the theme exists but its metadata cannot be read.
    fn installed(&self, slug: &str) -> Result<Option<InstalledTheme>>;
}

/// Reads `<root>/<slug>/style.css` headers.
#[derive(Debug, Clone)]
pub struct FsThemeDirectory {
    root: PathBuf,
}

impl FsThemeDirectory {
    /// Create a directory rooted at `root` (the host's themes folder).
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

impl ThemeDirectory for FsThemeDirectory {
    fn installed(&self, slug: &str) -> Result<Option<InstalledTheme>> {
        let stylesheet = self.root.join(slug).join("style.css");
        match std::fs::read_to_string(&stylesheet) {
            Ok(body) => Ok(Some(ThemeHeaders::parse(&body).into())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No stylesheet at {}", stylesheet.display());
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Fixed set of installed themes.
#[derive(Debug, Clone, Default)]
pub struct StaticThemeDirectory {
    themes: HashMap<String, InstalledTheme>,
}

impl StaticThemeDirectory {
    /// Create an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a theme.
    #[must_use]
    pub fn with_theme(mut self, slug: impl Into<String>, theme: InstalledTheme) -> Self {
        self.themes.insert(slug.into(), theme);
        self
    }
}

impl ThemeDirectory for StaticThemeDirectory {
    fn installed(&self, slug: &str) -> Result<Option<InstalledTheme>> {
        Ok(self.themes.get(slug).cloned())
    }
}
