//! Dot-separated version ordering.
//!
//! Release segments are compared numerically, with missing segments counting
//! as zero (`1.2` == `1.2.0`). A trailing `-tag` is a pre-release: it ranks
//! below the same release without a tag, and two tags compare by semver
//! pre-release precedence.

use semver::Prerelease;
use std::cmp::Ordering;
use std::fmt;

/// A parsed theme version.
#[derive(Debug, Clone)]
pub struct ThemeVersion {
    release: Vec<u64>,
    pre: Option<Prerelease>,
    raw: String,
}

impl ThemeVersion {
    /// Parse a version string. Never fails: non-numeric segments count as
    /// their leading digits (or zero).
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let trimmed = trimmed
            .strip_prefix('v')
            .or_else(|| trimmed.strip_prefix('V'))
            .unwrap_or(trimmed);

        // Build metadata never affects ordering.
        let without_build = trimmed.split('+').next().unwrap_or_default();
        let (release, pre) = match without_build.split_once('-') {
            Some((release, tag)) => (release, Prerelease::new(tag).ok().filter(|p| !p.is_empty())),
            None => (without_build, None),
        };

        let release = release.split('.').map(leading_number).collect();

        Self {
            release,
            pre,
            raw: raw.trim().to_string(),
        }
    }

    /// Release segments.
    #[must_use]
    pub fn release(&self) -> &[u64] {
        &self.release
    }

    /// Whether this is a pre-release.
    #[must_use]
    pub fn is_prerelease(&self) -> bool {
        self.pre.is_some()
    }
}

/// Leading digits of `segment`, zero if there are none. Values past
/// `u64::MAX` saturate.
fn leading_number(segment: &str) -> u64 {
    segment
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0u64, |n, digit| {
            n.saturating_mul(10).saturating_add(u64::from(digit - b'0'))
        })
}

impl Ord for ThemeVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.release.len().max(other.release.len());
        for i in 0..len {
            let a = self.release.get(i).copied().unwrap_or(0);
            let b = other.release.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => {}
                unequal => return unequal,
            }
        }

        match (&self.pre, &other.pre) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(a), Some(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for ThemeVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ThemeVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ThemeVersion {}

impl fmt::Display for ThemeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Compare two version strings.
#[must_use]
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    ThemeVersion::parse(a).cmp(&ThemeVersion::parse(b))
}

/// Whether `candidate` is strictly newer than `installed`.
#[must_use]
pub fn is_newer(candidate: &str, installed: &str) -> bool {
    compare_versions(candidate, installed) == Ordering::Greater
}
