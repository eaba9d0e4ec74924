//! Config loading: locate a TOML file (or fall back to the embedded
//! default), overlay CLI flags, and validate before any `InterfaceAccess`
//! is constructed (§4.12).

use anyhow::{Context, Result};
use demodocus_core::config::{CrawlConfig, CrawlConfigOverrides};
use std::path::Path;

/// The config this binary ships with, covering the fixture-backed web
/// specialization (§4.12).
const DEFAULT_CONFIG_TOML: &str = include_str!("../config/default.toml");

/// Load `path` if given, else the embedded default, then overlay CLI
/// flags and validate. A parse or validation failure is a hard, non-zero
/// exit before the crawl starts (§7 Configuration error).
pub fn load(path: Option<&Path>, overrides: CrawlConfigOverrides) -> Result<CrawlConfig> {
    let raw = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading config file '{}'", path.display()))?,
        None => DEFAULT_CONFIG_TOML.to_string(),
    };

    let mut config = CrawlConfig::from_toml_str(&raw).context("parsing crawl config")?;
    config.overlay(overrides);
    config.validate().context("validating crawl config")?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_default_parses_and_validates() {
        let config = load(None, CrawlConfigOverrides::default()).expect("embedded default is valid");
        assert_eq!(config.access_class, "fixture");
        assert!(!config.crawl_users.is_empty());
    }

    #[test]
    fn overlay_overrides_output_dir() {
        let overrides = CrawlConfigOverrides {
            output_dir: Some("custom-out".to_string()),
            ..Default::default()
        };
        let config = load(None, overrides).unwrap();
        assert_eq!(config.output_dir, "custom-out");
    }

    #[test]
    fn missing_file_is_a_clean_error() {
        let result = load(Some(Path::new("/nonexistent/path/demodocus.toml")), CrawlConfigOverrides::default());
        assert!(result.is_err());
    }
}
