//! Configuration for the theme update checker.
//!
//! Configuration is built in two phases. [`UpdaterConfig`] is the raw,
//! user-supplied form (usually loaded from TOML). [`UpdaterConfig::validate`]
//! turns it into an immutable [`ValidConfig`] or reports every missing field.

use crate::error::{Error, Result};
use crate::host::http::add_query_arg;
use serde::{Deserialize, Serialize};
use url::Url;

/// Query parameter carrying the access token on outbound requests.
pub const ACCESS_TOKEN_PARAM: &str = "access_token";

/// Runtime version advertised when `min_runtime_version` is unset.
pub const DEFAULT_MIN_RUNTIME_VERSION: &str = "8.0";

/// Required fields, in the order they are reported when missing.
const REQUIRED_FIELDS: [&str; 8] = [
    "api_url",
    "raw_url",
    "repo_url",
    "package_url",
    "min_host_version",
    "tested_host_version",
    "readme_filename",
    "slug",
];

/// Raw updater configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdaterConfig {
    /// Unique identifier of the tracked theme.
    #[serde(default)]
    pub slug: String,

    /// Repository API endpoint (JSON metadata).
    #[serde(default)]
    pub api_url: String,

    /// Base URL for raw project files.
    #[serde(default)]
    pub raw_url: String,

    /// Human-facing repository URL.
    #[serde(default, alias = "github_url")]
    pub repo_url: String,

    /// Download URL of the release package.
    #[serde(default, alias = "zip_url")]
    pub package_url: String,

    /// Minimum host version the theme supports.
    #[serde(default, alias = "requires")]
    pub min_host_version: String,

    /// Host version the theme was tested against.
    #[serde(default, alias = "tested")]
    pub tested_host_version: String,

    /// Minimum runtime version the theme supports.
    #[serde(default, alias = "requires_php")]
    pub min_runtime_version: Option<String>,

    /// Readme file consulted when the manifest has no version.
    #[serde(default, alias = "readme")]
    pub readme_filename: String,

    /// Manifest file carrying the `Version:` header.
    #[serde(default = "default_manifest_filename")]
    pub manifest_filename: String,

    /// Verify TLS certificates for the package download.
    #[serde(default = "default_verify_tls", alias = "sslverify")]
    pub verify_tls: bool,

    /// Optional access token for private repositories.
    #[serde(default)]
    pub access_token: String,

    /// Bypass the transient cache on every check.
    #[serde(default)]
    pub force_update: bool,

    /// Explicit latest version, skipping remote resolution.
    #[serde(default)]
    pub new_version: Option<String>,

    /// Explicit last-updated date.
    #[serde(default)]
    pub last_updated: Option<String>,

    /// Explicit description.
    #[serde(default)]
    pub description: Option<String>,

    /// Explicit theme display name.
    #[serde(default)]
    pub theme_name: Option<String>,

    /// Explicit installed version.
    #[serde(default, alias = "version")]
    pub installed_version: Option<String>,

    /// Explicit installed author.
    #[serde(default)]
    pub author: Option<String>,

    /// Explicit installed homepage.
    #[serde(default)]
    pub homepage: Option<String>,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            slug: String::new(),
            api_url: String::new(),
            raw_url: String::new(),
            repo_url: String::new(),
            package_url: String::new(),
            min_host_version: String::new(),
            tested_host_version: String::new(),
            min_runtime_version: None,
            readme_filename: String::new(),
            manifest_filename: default_manifest_filename(),
            verify_tls: default_verify_tls(),
            access_token: String::new(),
            force_update: false,
            new_version: None,
            last_updated: None,
            description: None,
            theme_name: None,
            installed_version: None,
            author: None,
            homepage: None,
        }
    }
}

fn default_manifest_filename() -> String {
    "style.css".to_string()
}

const fn default_verify_tls() -> bool {
    true
}

/// Names of required configuration fields that were left empty.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "the theme updater was initialized without the minimum required configuration; \
     the following params are missing: {}",
    .0.join(", ")
)]
pub struct MissingFields(Vec<&'static str>);

impl MissingFields {
    /// Create a missing-field set.
    #[must_use]
    pub fn new(fields: Vec<&'static str>) -> Self {
        Self(fields)
    }

    /// The missing field names.
    #[must_use]
    pub fn fields(&self) -> &[&'static str] {
        &self.0
    }

    /// Whether the named field is missing.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.0.iter().any(|f| *f == field)
    }
}

impl UpdaterConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Names of every required field that is empty.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        REQUIRED_FIELDS
            .into_iter()
            .filter(|field| self.required_value(field).trim().is_empty())
            .collect()
    }

    fn required_value(&self, field: &str) -> &str {
        match field {
            "api_url" => &self.api_url,
            "raw_url" => &self.raw_url,
            "repo_url" => &self.repo_url,
            "package_url" => &self.package_url,
            "min_host_version" => &self.min_host_version,
            "tested_host_version" => &self.tested_host_version,
            "readme_filename" => &self.readme_filename,
            "slug" => &self.slug,
            _ => "",
        }
    }

    /// Validate and default the configuration.
    ///
    /// When an access token is set, the package URL is rewritten once here
    /// into its authenticated API form.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingConfig`] naming every empty required field, or
    /// [`Error::InvalidUrl`] if a URL cannot be parsed.
    pub fn validate(self) -> Result<ValidConfig> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(MissingFields::new(missing).into());
        }

        let api_url = parse_url("api_url", &self.api_url)?;
        let mut raw_url = parse_url("raw_url", &self.raw_url)?;
        let repo_url = parse_url("repo_url", &self.repo_url)?;
        let mut package_url = parse_url("package_url", &self.package_url)?;

        // Relative joins against the raw base need a directory-style path.
        if !raw_url.path().ends_with('/') {
            let path = format!("{}/", raw_url.path());
            raw_url.set_path(&path);
        }

        let access_token = Some(self.access_token.trim().to_string()).filter(|t| !t.is_empty());
        if let Some(token) = &access_token {
            package_url = authenticated_package_url(&package_url, token)?;
        }

        Ok(ValidConfig {
            slug: self.slug.trim().to_string(),
            api_url,
            raw_url,
            repo_url,
            package_url,
            min_host_version: self.min_host_version,
            tested_host_version: self.tested_host_version,
            min_runtime_version: self.min_runtime_version.filter(|v| !v.trim().is_empty()),
            readme_filename: self.readme_filename,
            manifest_filename: self.manifest_filename,
            verify_tls: self.verify_tls,
            access_token,
            force_update: self.force_update,
            overrides: Overrides {
                new_version: non_empty(self.new_version),
                last_updated: non_empty(self.last_updated),
                description: non_empty(self.description),
                theme_name: non_empty(self.theme_name),
                installed_version: non_empty(self.installed_version),
                author: non_empty(self.author),
                homepage: non_empty(self.homepage),
            },
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_url(field: &'static str, value: &str) -> Result<Url> {
    Url::parse(value.trim()).map_err(|source| Error::InvalidUrl { field, source })
}

/// Rewrite `scheme://host/path` into `scheme://api.host/repos/path?access_token=..`.
fn authenticated_package_url(url: &Url, token: &str) -> Result<Url> {
    let host = url
        .host_str()
        .ok_or_else(|| Error::Config(format!("package_url has no host: {url}")))?;

    let rewritten = format!("{}://api.{}/repos{}", url.scheme(), host, url.path());
    let mut rewritten =
        Url::parse(&rewritten).map_err(|source| Error::InvalidUrl { field: "package_url", source })?;
    add_query_arg(&mut rewritten, ACCESS_TOKEN_PARAM, token);
    Ok(rewritten)
}

/// Values supplied in configuration that replace lazily derived ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    /// Latest version.
    pub new_version: Option<String>,
    /// Last-updated date.
    pub last_updated: Option<String>,
    /// Description.
    pub description: Option<String>,
    /// Theme display name.
    pub theme_name: Option<String>,
    /// Installed version.
    pub installed_version: Option<String>,
    /// Installed author.
    pub author: Option<String>,
    /// Installed homepage.
    pub homepage: Option<String>,
}

/// Validated, defaulted and immutable updater configuration.
#[derive(Debug, Clone)]
pub struct ValidConfig {
    slug: String,
    api_url: Url,
    raw_url: Url,
    repo_url: Url,
    package_url: Url,
    min_host_version: String,
    tested_host_version: String,
    min_runtime_version: Option<String>,
    readme_filename: String,
    manifest_filename: String,
    verify_tls: bool,
    access_token: Option<String>,
    force_update: bool,
    overrides: Overrides,
}

impl ValidConfig {
    /// Theme slug.
    #[must_use]
    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// Repository API endpoint.
    #[must_use]
    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    /// Raw file base URL (always ends with `/`).
    #[must_use]
    pub fn raw_url(&self) -> &Url {
        &self.raw_url
    }

    /// Repository URL.
    #[must_use]
    pub fn repo_url(&self) -> &Url {
        &self.repo_url
    }

    /// Package URL, already rewritten when an access token is configured.
    #[must_use]
    pub fn package_url(&self) -> &Url {
        &self.package_url
    }

    /// Minimum supported host version.
    #[must_use]
    pub fn min_host_version(&self) -> &str {
        &self.min_host_version
    }

    /// Host version the theme was tested against.
    #[must_use]
    pub fn tested_host_version(&self) -> &str {
        &self.tested_host_version
    }

    /// Minimum runtime version, or [`DEFAULT_MIN_RUNTIME_VERSION`].
    #[must_use]
    pub fn min_runtime_version(&self) -> &str {
        self.min_runtime_version
            .as_deref()
            .unwrap_or(DEFAULT_MIN_RUNTIME_VERSION)
    }

    /// Readme file name.
    #[must_use]
    pub fn readme_filename(&self) -> &str {
        &self.readme_filename
    }

    /// Manifest file name.
    #[must_use]
    pub fn manifest_filename(&self) -> &str {
        &self.manifest_filename
    }

    /// Whether TLS is verified for the package download.
    #[must_use]
    pub fn verify_tls(&self) -> bool {
        self.verify_tls
    }

    /// Access token, if configured.
    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    /// Whether the transient cache is bypassed.
    #[must_use]
    pub fn force_update(&self) -> bool {
        self.force_update
    }

    /// Explicit overrides from configuration.
    #[must_use]
    pub fn overrides(&self) -> &Overrides {
        &self.overrides
    }

    /// Append the access token (if any) to `url`.
    #[must_use]
    pub fn authenticate(&self, mut url: Url) -> Url {
        if let Some(token) = &self.access_token {
            add_query_arg(&mut url, ACCESS_TOKEN_PARAM, token);
        }
        url
    }
}
