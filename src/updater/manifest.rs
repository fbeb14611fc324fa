//! Parsing of the theme manifest header and the readme version marker.

use regex::Regex;
use std::sync::OnceLock;

/// A stylesheet header field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderField {
    /// `Theme Name:`
    ThemeName,
    /// `Version:`
    Version,
    /// `Author:`
    Author,
    /// `Theme URI:`
    ThemeUri,
}

impl HeaderField {
    /// Field name as written in the header.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::ThemeName => "Theme Name",
            Self::Version => "Version",
            Self::Author => "Author",
            Self::ThemeUri => "Theme URI",
        }
    }

    fn pattern(self) -> Option<&'static Regex> {
        static PATTERNS: [OnceLock<Option<Regex>>; 4] =
            [OnceLock::new(), OnceLock::new(), OnceLock::new(), OnceLock::new()];
        PATTERNS[self as usize]
            .get_or_init(|| {
                Regex::new(&format!(r"(?mi)^.*?{}:[ \t]*(.*)$", regex::escape(self.name()))).ok()
            })
            .as_ref()
    }
}

/// Value of the first `field:` header line, trimmed.
///
/// Matching is case-insensitive and the field name may be preceded by
/// anything on the same line (comment markers, `*`, indentation). An empty
/// value counts as absent.
#[must_use]
pub fn header_field(body: &str, field: HeaderField) -> Option<String> {
    field
        .pattern()?
        .captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|value| !value.is_empty())
}

/// The `Version:` header of a `style.css`-like manifest.
#[must_use]
pub fn manifest_version(body: &str) -> Option<String> {
    header_field(body, HeaderField::Version)
}

/// The `~Current Version: x~` marker of a readme.
///
/// The marker may be indented and wrapped in backticks; the value runs up to
/// the closing `~`.
#[must_use]
pub fn readme_version(body: &str) -> Option<String> {
    static MARKER: OnceLock<Option<Regex>> = OnceLock::new();
    let re = MARKER
        .get_or_init(|| Regex::new(r"(?im)^\s*`*~Current Version:\s*([^~]*)~").ok())
        .as_ref()?;

    re.captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Header fields of an installed theme's `style.css`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThemeHeaders {
    /// `Theme Name:`
    pub name: Option<String>,
    /// `Version:`
    pub version: Option<String>,
    /// `Author:`
    pub author: Option<String>,
    /// `Theme URI:`
    pub homepage: Option<String>,
}

impl ThemeHeaders {
    /// Parse the known header fields from a stylesheet.
    #[must_use]
    pub fn parse(body: &str) -> Self {
        Self {
            name: header_field(body, HeaderField::ThemeName),
            version: manifest_version(body),
            author: header_field(body, HeaderField::Author),
            homepage: header_field(body, HeaderField::ThemeUri),
        }
    }
}
