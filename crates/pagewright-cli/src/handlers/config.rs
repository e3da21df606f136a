//! `config`: the effective framework configuration

use crate::{CliResult, ConfigArgs, ConfigFormatArg};
use pagewright::FrameworkConfig;
use tracing::info;

/// Load the configuration the way tests would, or write a default file
pub fn execute_config(args: &ConfigArgs) -> CliResult<String> {
    if let Some(path) = &args.init {
        FrameworkConfig::default().save(path)?;
        info!(path = %path.display(), "Default configuration written");
        return Ok(format!("Wrote default configuration to {}", path.display()));
    }

    let config = match &args.file {
        Some(path) => FrameworkConfig::load(path)?.apply_overrides(|key| std::env::var(key).ok())?,
        None => FrameworkConfig::from_env()?,
    };
    match args.format {
        ConfigFormatArg::Yaml => Ok(config.to_yaml()?),
        ConfigFormatArg::Json => Ok(serde_json::to_string_pretty(&config)?),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::fs;

    fn args(file: Option<std::path::PathBuf>, format: ConfigFormatArg) -> ConfigArgs {
        ConfigArgs {
            file,
            init: None,
            format,
        }
    }

    #[test]
    fn test_init_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pagewright.yaml");
        let init = ConfigArgs {
            file: None,
            init: Some(path.clone()),
            format: ConfigFormatArg::Yaml,
        };
        assert!(execute_config(&init).unwrap().contains("Wrote default"));

        let loaded = FrameworkConfig::load(&path).unwrap();
        assert_eq!(loaded, FrameworkConfig::default());
    }

    #[test]
    fn test_file_values_shown_as_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pagewright.yaml");
        fs::write(&path, "timeout_secs: 5\nheadless: false\n").unwrap();

        let out = execute_config(&args(Some(path), ConfigFormatArg::Json)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["timeout_secs"], 5);
    }

    #[test]
    fn test_bad_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.yaml");
        assert!(execute_config(&args(Some(missing), ConfigFormatArg::Yaml)).is_err());
    }
}
