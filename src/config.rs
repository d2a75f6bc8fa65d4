//! Application configuration.
//!
//! Handles loading configuration from environment variables and .env files.

use dotenv::dotenv;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{decode, store};
use crate::error::{Error, Result};

/// Configuration for the application.
#[derive(Debug, Clone)]
pub struct Config {
    /// The application name
    app_name: String,
    /// The application version
    app_version: String,
    /// Maximum number of pages extracted from one paginated document
    pub max_pages: usize,
    /// How long opening a paginated document may take before it is abandoned
    pub open_timeout: Duration,
    /// Number of placeholder slides substituted for a document that cannot be opened
    pub placeholder_pages: usize,
    /// Location of the embedded slide library
    pub db_path: PathBuf,
    /// Directory containing the PDFium shared library, if not on the system path
    pub pdfium_library_path: Option<PathBuf>,
}

impl Config {
    /// Get the application name.
    #[must_use]
    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// Get the application version.
    #[must_use]
    pub fn app_version(&self) -> &str {
        &self.app_version
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: env!("CARGO_PKG_NAME").to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            max_pages: decode::MAX_PAGES,
            open_timeout: decode::OPEN_TIMEOUT,
            placeholder_pages: decode::PLACEHOLDER_PAGES,
            db_path: default_db_path(),
            pdfium_library_path: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn load() -> Result<Self> {
        // Try to load .env file if present
        dotenv().ok();

        let mut config = Self::default();

        if let Some(pages) = parse_var::<usize>("SLIDEMERGE_MAX_PAGES") {
            if pages == 0 {
                return Err(Error::config(
                    "SLIDEMERGE_MAX_PAGES must be at least 1",
                    "Unset it to use the default of 50 pages",
                ));
            }
            config.max_pages = pages;
        }

        if let Some(secs) = parse_var::<u64>("SLIDEMERGE_OPEN_TIMEOUT_SECS") {
            config.open_timeout = Duration::from_secs(secs);
        }

        if let Some(count) = parse_var::<usize>("SLIDEMERGE_PLACEHOLDER_PAGES") {
            config.placeholder_pages = count;
        }

        if let Ok(path) = env::var("SLIDEMERGE_DB_PATH") {
            config.db_path = expand_path(&path);
        }

        config.pdfium_library_path = env::var("PDFIUM_LIBRARY_PATH").ok().map(|p| expand_path(&p));

        Ok(config)
    }

    /// Replace the library location (CLI override).
    #[must_use]
    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = path.into();
        self
    }
}

/// Parse an environment variable, ignoring values that do not parse.
fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    let parsed = raw.trim().parse::<T>().ok();
    if parsed.is_none() {
        tracing::warn!("Ignoring invalid value {raw:?} for {name}");
    }
    parsed
}

fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).to_string())
}

/// `<data dir>/slidemerge/library.redb`, falling back to the working directory.
fn default_db_path() -> PathBuf {
    dirs::data_dir().map_or_else(
        || PathBuf::from(store::DB_FILE),
        |d| d.join(store::APP_DIR).join(store::DB_FILE),
    )
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

    use super::*;

    #[test]
    fn defaults_match_documented_policy() {
        let config = Config::default();
        assert_eq!(config.max_pages, 50);
        assert_eq!(config.open_timeout, Duration::from_secs(30));
        assert_eq!(config.placeholder_pages, 5);
        assert!(config.db_path.ends_with("library.redb"));
        assert_eq!(config.app_name(), "slidemerge");
    }

    #[test]
    fn db_path_override() {
        let config = Config::default().with_db_path("/tmp/other.redb");
        assert_eq!(config.db_path, PathBuf::from("/tmp/other.redb"));
    }

    #[test]
    fn tilde_is_expanded() {
        let path = expand_path("~/slides.redb");
        assert!(!path.to_string_lossy().starts_with('~') || dirs::home_dir().is_none());
    }
}
