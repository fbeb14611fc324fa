//! Update descriptor and the host's update transient.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An available update for one theme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateDescriptor {
    /// Theme slug.
    #[serde(rename = "theme")]
    pub id: String,
    /// Version being offered.
    pub new_version: String,
    /// Repository page.
    pub url: String,
    /// Package download URL.
    pub package: String,
    /// Minimum host version.
    pub requires: String,
    /// Minimum runtime version.
    pub requires_php: String,
}

/// The host's theme update registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeUpdateTransient {
    /// When the host last ran a check.
    #[serde(default)]
    pub last_checked: Option<DateTime<Utc>>,
    /// Installed versions by slug, as gathered by the host.
    #[serde(default)]
    pub checked: BTreeMap<String, String>,
    /// Available updates by slug.
    #[serde(default)]
    pub response: BTreeMap<String, UpdateDescriptor>,
}

impl ThemeUpdateTransient {
    /// A transient whose registry contains `slug` at `version`.
    #[must_use]
    pub fn checked(slug: impl Into<String>, version: impl Into<String>) -> Self {
        let mut transient = Self {
            last_checked: Some(Utc::now()),
            ..Self::default()
        };
        transient.checked.insert(slug.into(), version.into());
        transient
    }

    /// Whether the host has populated its registry.
    #[must_use]
    pub fn has_checked(&self) -> bool {
        !self.checked.is_empty()
    }
}
