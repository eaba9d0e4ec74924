//! `CrawlConfig` (ambient, §3 "CrawlConfig", §4.12).
//!
//! The type lives in the core so both the CLI and tests can share it; the
//! CLI is responsible for locating the TOML file and overlaying flags.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Which reports to emit after a crawl (§6 "Config").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    States,
    Gml,
    Metrics,
    Analysis,
    Config,
    All,
}

/// Pooled vs single-threaded scheduling (§5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Multi {
    #[default]
    Single,
    Pooled,
}

fn default_num_threads() -> usize {
    1
}
fn default_delay_ms() -> u64 {
    0
}
fn default_page_change_num_loads() -> u32 {
    10
}
fn default_page_change_threshold_secs() -> f64 {
    8.0
}
fn default_page_change_timeout_secs() -> f64 {
    20.0
}
fn default_num_revisits() -> u32 {
    3
}
fn default_output_dir() -> String {
    "output".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_window_size() -> (u32, u32) {
    (1280, 1024)
}

/// The full crawl configuration bundle (§3, §4.12). TOML-deserializable;
/// every field with a sensible default uses `serde(default = ...)` so a
/// config file only needs to override what it cares about.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Selects which concrete `InterfaceAccess` factory to construct
    /// (e.g. `"fixture"`, `"webdriver"`); interpreted by the CLI.
    pub access_class: String,
    /// Name of the build user (must also appear, implicitly, as the
    /// all-capable user constructed by the CLI's user-model factory).
    pub build_user: String,
    /// Names of the crawl (non-build) users to simulate re-crawls for.
    pub crawl_users: Vec<String>,
    /// Which comparator pipeline to use for state equality; `"default"`
    /// selects [`crate::comparator::default_pipeline`].
    #[serde(default = "default_compare_pipeline")]
    pub compare_pipeline: String,
    #[serde(default = "default_num_threads")]
    pub num_threads: usize,
    #[serde(default)]
    pub multi: Multi,
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    #[serde(default)]
    pub reduced_crawl: bool,
    #[serde(default = "default_page_change_num_loads")]
    pub page_change_num_loads: u32,
    #[serde(default = "default_page_change_threshold_secs")]
    pub page_change_threshold_secs: f64,
    #[serde(default = "default_page_change_timeout_secs")]
    pub page_change_timeout_secs: f64,
    #[serde(default = "default_num_revisits")]
    pub num_revisits: u32,
    #[serde(default)]
    pub reports: Vec<ReportKind>,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_to_stdout: bool,
    #[serde(default)]
    pub headless: bool,
    #[serde(default = "default_window_size")]
    pub window_size: (u32, u32),
}

fn default_compare_pipeline() -> String {
    "default".to_string()
}

impl CrawlConfig {
    /// Parse a TOML document into a `CrawlConfig` (§4.12).
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| Error::Config(format!("config parse error: {e}")))
    }

    /// Validate required invariants (§3, §4.12): non-empty `crawl_users`,
    /// `num_threads >= 1`, and `threshold <= timeout`. Must be called, and
    /// must succeed, before any `InterfaceAccess` is constructed.
    pub fn validate(&self) -> Result<()> {
        if self.crawl_users.is_empty() {
            return Err(Error::Config("crawl_users must not be empty".to_string()));
        }
        if self.num_threads < 1 {
            return Err(Error::Config("num_threads must be >= 1".to_string()));
        }
        if self.page_change_threshold_secs > self.page_change_timeout_secs {
            return Err(Error::Config(
                "page_change_threshold_secs must not exceed page_change_timeout_secs".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply CLI overrides that were explicitly given, preferring them over
    /// whatever a config file set (§4.12: "overlaid with CLI flags").
    pub fn overlay(&mut self, overrides: CrawlConfigOverrides) {
        if let Some(v) = overrides.output_dir {
            self.output_dir = v;
        }
        if let Some(v) = overrides.num_threads {
            self.num_threads = v;
        }
        if let Some(v) = overrides.log_level {
            self.log_level = v;
        }
        if let Some(v) = overrides.headless {
            self.headless = v;
        }
        if let Some(v) = overrides.reduced_crawl {
            self.reduced_crawl = v;
        }
    }
}

/// CLI-flag overrides (§4.12), applied over a loaded/default `CrawlConfig`.
#[derive(Debug, Clone, Default)]
pub struct CrawlConfigOverrides {
    pub output_dir: Option<String>,
    pub num_threads: Option<usize>,
    pub log_level: Option<String>,
    pub headless: Option<bool>,
    pub reduced_crawl: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_crawl_users_fails_validation() {
        let config = CrawlConfig {
            access_class: "fixture".to_string(),
            build_user: "build".to_string(),
            crawl_users: Vec::new(),
            compare_pipeline: "default".to_string(),
            num_threads: 1,
            multi: Multi::Single,
            delay_ms: 0,
            reduced_crawl: false,
            page_change_num_loads: 10,
            page_change_threshold_secs: 8.0,
            page_change_timeout_secs: 20.0,
            num_revisits: 3,
            reports: Vec::new(),
            output_dir: "output".to_string(),
            log_level: "info".to_string(),
            log_to_stdout: false,
            headless: true,
            window_size: (1280, 1024),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn threshold_exceeding_timeout_fails_validation() {
        let mut config = minimal_config();
        config.page_change_threshold_secs = 25.0;
        config.page_change_timeout_secs = 20.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn minimal_toml_parses_with_defaults() {
        let toml = r#"
            access_class = "fixture"
            build_user = "build"
            crawl_users = ["screenreader"]
        "#;
        let config = CrawlConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.num_threads, 1);
        assert_eq!(config.page_change_num_loads, 10);
        config.validate().unwrap();
    }

    fn minimal_config() -> CrawlConfig {
        CrawlConfig {
            access_class: "fixture".to_string(),
            build_user: "build".to_string(),
            crawl_users: vec!["screenreader".to_string()],
            compare_pipeline: "default".to_string(),
            num_threads: 1,
            multi: Multi::Single,
            delay_ms: 0,
            reduced_crawl: false,
            page_change_num_loads: 10,
            page_change_threshold_secs: 8.0,
            page_change_timeout_secs: 20.0,
            num_revisits: 3,
            reports: Vec::new(),
            output_dir: "output".to_string(),
            log_level: "info".to_string(),
            log_to_stdout: false,
            headless: true,
            window_size: (1280, 1024),
        }
    }
}
