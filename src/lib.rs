//! # theme-updater
//!
//! Self-update checker for themes published on GitHub.
//!
//! The checker plugs into a host's periodic "check for updates" cycle. It
//! resolves the latest published version of the tracked theme (from the
//! remote `style.css` header, falling back to a `~Current Version: x~` marker
//! in the readme), caches remote metadata for six hours, and contributes an
//! [`UpdateDescriptor`] when the remote version is newer than the installed one.
//!
//! ## Architecture
//!
//! ```text
//! UpdaterConfig ──validate──▶ ValidConfig ──activate──▶ UpdateChecker
//!                                                          │ subscribes to
//!                                                          ▼
//!                     Host { hooks, transport, transients, themes }
//!                                                          │
//!            check_theme_updates ◀── session tier ◀── transient store ◀── network
//! ```
//!
//! A configuration with missing fields never reaches `activate`, so the
//! checker registers nothing and performs no network I/O.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod host;
pub mod updater;

pub use config::{MissingFields, UpdaterConfig, ValidConfig};
pub use error::{Error, Result};
pub use host::{Host, HookPoint, RequestArgs};
pub use updater::{ThemeUpdateTransient, UpdateChecker, UpdateDescriptor};
