//! Framework configuration.
//!
//! Settings come from an optional YAML file; every key is optional and falls
//! back to its default. A handful of `PAGEWRIGHT_*` environment variables
//! override the file so CI can tweak timeouts or browser mode without
//! editing it.

use crate::locator::LocatorSettings;
use crate::result::{PagewrightError, PagewrightResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Environment variable naming a configuration file
pub const CONFIG_ENV: &str = "PAGEWRIGHT_CONFIG";

/// Browser to launch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserKind {
    #[default]
    Chrome,
    Chromium,
}

impl FromStr for BrowserKind {
    type Err = PagewrightError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chrome" => Ok(Self::Chrome),
            "chromium" => Ok(Self::Chromium),
            other => Err(PagewrightError::config(format!("unknown browser '{other}'"))),
        }
    }
}

/// Root configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameworkConfig {
    /// Element locate timeout in seconds
    pub timeout_secs: u64,
    /// Driver command timeout in seconds
    pub command_timeout_secs: u64,
    /// Locator poll interval in milliseconds
    pub poll_interval_ms: u64,
    /// Consult UI error handlers after failed locates
    pub error_handling: bool,
    /// `Browser::wait_ajax` timeout in seconds
    pub ajax_timeout_secs: u64,
    /// `Browser::wait_ready_state` timeout in seconds
    pub ready_state_timeout_secs: u64,
    pub browser: BrowserKind,
    pub headless: bool,
    pub incognito: bool,
    /// Explicit browser executable
    pub chromium_path: Option<String>,
    /// Prefix for relative URLs passed to `Browser::open`
    pub base_url: Option<String>,
    /// Root of the directory test data store
    pub test_data_dir: PathBuf,
    /// Browser download folder
    pub downloads_dir: PathBuf,
}

impl Default for FrameworkConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            command_timeout_secs: 60,
            poll_interval_ms: 250,
            error_handling: true,
            ajax_timeout_secs: 90,
            ready_state_timeout_secs: 60,
            browser: BrowserKind::Chrome,
            headless: true,
            incognito: true,
            chromium_path: None,
            base_url: None,
            test_data_dir: PathBuf::from("."),
            downloads_dir: PathBuf::from("DownloadedFiles"),
        }
    }
}

fn parse_env<T: FromStr>(key: &str, value: &str) -> PagewrightResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| PagewrightError::config(format!("invalid value '{value}' for {key}")))
}

fn parse_bool(key: &str, value: &str) -> PagewrightResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(PagewrightError::config(format!("invalid value '{value}' for {key}"))),
    }
}

impl FrameworkConfig {
    /// Parse YAML
    pub fn from_yaml_str(yaml: &str) -> PagewrightResult<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    /// Load a YAML file
    pub fn load(path: impl AsRef<Path>) -> PagewrightResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&text)
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> PagewrightResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Write as YAML
    pub fn save(&self, path: impl AsRef<Path>) -> PagewrightResult<()> {
        std::fs::write(path.as_ref(), self.to_yaml()?)?;
        Ok(())
    }

    /// Apply `PAGEWRIGHT_*` overrides read through `lookup`
    pub fn apply_overrides<F>(mut self, lookup: F) -> PagewrightResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("PAGEWRIGHT_TIMEOUT_SECS") {
            self.timeout_secs = parse_env("PAGEWRIGHT_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = lookup("PAGEWRIGHT_POLL_INTERVAL_MS") {
            self.poll_interval_ms = parse_env("PAGEWRIGHT_POLL_INTERVAL_MS", &v)?;
        }
        if let Some(v) = lookup("PAGEWRIGHT_ERROR_HANDLING") {
            self.error_handling = parse_bool("PAGEWRIGHT_ERROR_HANDLING", &v)?;
        }
        if let Some(v) = lookup("PAGEWRIGHT_HEADLESS") {
            self.headless = parse_bool("PAGEWRIGHT_HEADLESS", &v)?;
        }
        if let Some(v) = lookup("PAGEWRIGHT_BROWSER") {
            self.browser = v.parse()?;
        }
        if let Some(v) = lookup("PAGEWRIGHT_BASE_URL") {
            self.base_url = Some(v);
        }
        if let Some(v) = lookup("PAGEWRIGHT_CHROMIUM_PATH") {
            self.chromium_path = Some(v);
        }
        Ok(self)
    }

    /// File named by `PAGEWRIGHT_CONFIG` (or defaults) plus environment
    /// overrides
    pub fn from_env() -> PagewrightResult<Self> {
        let base = match std::env::var(CONFIG_ENV) {
            Ok(path) if !path.is_empty() => Self::load(path)?,
            _ => Self::default(),
        };
        base.apply_overrides(|key| std::env::var(key).ok())
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    #[must_use]
    pub const fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    #[must_use]
    pub const fn ajax_timeout(&self) -> Duration {
        Duration::from_secs(self.ajax_timeout_secs)
    }

    #[must_use]
    pub const fn ready_state_timeout(&self) -> Duration {
        Duration::from_secs(self.ready_state_timeout_secs)
    }

    /// Settings for locators built by page factories
    #[must_use]
    pub const fn locator_settings(&self) -> LocatorSettings {
        LocatorSettings {
            timeout: self.timeout(),
            poll_interval: self.poll_interval(),
            error_handling: self.error_handling,
        }
    }

    /// Resolve a possibly relative URL against `base_url`
    #[must_use]
    pub fn resolve_url(&self, url: &str) -> String {
        let is_absolute =
            url.contains("://") || url.starts_with("about:") || url.starts_with("data:");
        match &self.base_url {
            Some(base) if !is_absolute => {
                let base = base.trim_end_matches('/');
                format!("{base}/{}", url.trim_start_matches('/'))
            }
            _ => url.to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    mod parsing_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let config = FrameworkConfig::default();
            assert_eq!(config.timeout(), Duration::from_secs(30));
            assert_eq!(config.poll_interval(), Duration::from_millis(250));
            assert_eq!(config.ajax_timeout(), Duration::from_secs(90));
            assert_eq!(config.downloads_dir, PathBuf::from("DownloadedFiles"));
        }

        #[test]
        fn test_partial_yaml_keeps_defaults() {
            let yaml = "timeout_secs: 5\nbrowser: chromium\n";
            let config = FrameworkConfig::from_yaml_str(yaml).unwrap();
            assert_eq!(config.timeout_secs, 5);
            assert_eq!(config.browser, BrowserKind::Chromium);
            assert_eq!(config.command_timeout_secs, 60);
            assert!(config.headless);
        }

        #[test]
        fn test_empty_yaml_is_default() {
            let config = FrameworkConfig::from_yaml_str("  \n").unwrap();
            assert_eq!(config, FrameworkConfig::default());
        }

        #[test]
        fn test_invalid_yaml() {
            let err = FrameworkConfig::from_yaml_str("timeout_secs: [").unwrap_err();
            assert!(matches!(err, PagewrightError::Yaml(_)));
        }

        #[test]
        fn test_save_and_load() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("pagewright.yaml");
            let config = FrameworkConfig {
                base_url: Some("https://shop.test".to_string()),
                ..FrameworkConfig::default()
            };
            config.save(&path).unwrap();
            assert_eq!(FrameworkConfig::load(&path).unwrap(), config);
        }
    }

    mod override_tests {
        use super::*;

        #[test]
        fn test_overrides_apply() {
            let config = FrameworkConfig::default()
                .apply_overrides(env(&[
                    ("PAGEWRIGHT_TIMEOUT_SECS", "7"),
                    ("PAGEWRIGHT_HEADLESS", "false"),
                    ("PAGEWRIGHT_ERROR_HANDLING", "0"),
                    ("PAGEWRIGHT_BROWSER", "Chromium"),
                    ("PAGEWRIGHT_BASE_URL", "http://localhost:8080"),
                ]))
                .unwrap();
            assert_eq!(config.timeout_secs, 7);
            assert!(!config.headless);
            assert!(!config.error_handling);
            assert_eq!(config.browser, BrowserKind::Chromium);
            assert_eq!(config.base_url.as_deref(), Some("http://localhost:8080"));
        }

        #[test]
        fn test_invalid_override_is_config_error() {
            let err = FrameworkConfig::default()
                .apply_overrides(env(&[("PAGEWRIGHT_POLL_INTERVAL_MS", "fast")]))
                .unwrap_err();
            assert!(matches!(err, PagewrightError::Config { .. }));
            assert!(err.to_string().contains("PAGEWRIGHT_POLL_INTERVAL_MS"));
        }

        #[test]
        fn test_locator_settings_follow_config() {
            let config = FrameworkConfig {
                timeout_secs: 3,
                poll_interval_ms: 50,
                error_handling: false,
                ..FrameworkConfig::default()
            };
            let settings = config.locator_settings();
            assert_eq!(settings.timeout, Duration::from_secs(3));
            assert_eq!(settings.poll_interval, Duration::from_millis(50));
            assert!(!settings.error_handling);
        }
    }

    mod url_tests {
        use super::*;

        #[test]
        fn test_resolve_relative_url() {
            let config = FrameworkConfig {
                base_url: Some("https://shop.test/".to_string()),
                ..FrameworkConfig::default()
            };
            assert_eq!(config.resolve_url("/cart"), "https://shop.test/cart");
            assert_eq!(
                config.resolve_url("https://other.test/"),
                "https://other.test/"
            );
        }

        #[test]
        fn test_no_base_url_passes_through() {
            assert_eq!(FrameworkConfig::default().resolve_url("cart"), "cart");
        }
    }
}
