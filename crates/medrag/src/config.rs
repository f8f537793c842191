//! Configuration assembly for the command line

use anyhow::Context;
use medrag_common::LoggingOptions;
use medrag_config::source::{ConfigurationLoader, EnvironmentSource, FileSource};
use medrag_config::{ApplicationConfig, TelemetryConfig, Validate};
use std::path::{Path, PathBuf};

/// Command-line settings that override file and environment values
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub log_dir: Option<PathBuf>,
    pub json_logs: bool,
    pub log_level: Option<String>,
    pub tokenizer: Option<String>,
    pub tokenizer_path: Option<PathBuf>,
}

/// Load configuration: defaults, then the config file, then `MEDRAG_*`
/// variables, then command-line flags
///
/// # Errors
/// Returns an error if the given file cannot be read or the result is invalid.
pub fn load(config_file: Option<&Path>, overrides: &CliOverrides) -> anyhow::Result<ApplicationConfig> {
    let mut loader = ConfigurationLoader::new().add_source(Box::new(EnvironmentSource));
    if let Some(path) = config_file {
        loader = loader.add_source(Box::new(FileSource::new(path).must_exist()));
    }
    let mut config = loader.load().with_context(|| match config_file {
        Some(path) => format!("Failed to load configuration from '{}'", path.display()),
        None => "Failed to load configuration".to_string(),
    })?;

    apply_overrides(&mut config, overrides);
    config
        .validate()
        .context("Invalid command-line configuration")?;
    Ok(config)
}

fn apply_overrides(config: &mut ApplicationConfig, overrides: &CliOverrides) {
    if let Some(log_dir) = &overrides.log_dir {
        config.telemetry.log_dir = Some(log_dir.display().to_string());
    }
    if overrides.json_logs {
        config.telemetry.json_logs = true;
    }
    if let Some(level) = &overrides.log_level {
        config.telemetry.tracing_level.clone_from(level);
    }
    if let Some(model) = &overrides.tokenizer {
        config.tokenizer.model = Some(model.clone());
    }
    if let Some(path) = &overrides.tokenizer_path {
        config.tokenizer.tokenizer_path = Some(path.display().to_string());
    }
}

/// Subscriber options for the telemetry section
pub fn logging_options(telemetry: &TelemetryConfig) -> LoggingOptions {
    LoggingOptions {
        level: telemetry.tracing_level.clone(),
        json: telemetry.json_logs,
        log_dir: telemetry.log_dir.as_ref().map(PathBuf::from),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_file_then_flags() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let path = dir.path().join("medrag.toml");
        let mut file = std::fs::File::create(&path).expect("Should create config file");
        file.write_all(b"[chunking]\noverlap_tokens = 10\n\n[telemetry]\ntracing_level = \"warn\"\n")
            .expect("Should write config file");

        let overrides = CliOverrides {
            log_level: Some("debug".to_string()),
            tokenizer: Some("gpt-4o".to_string()),
            ..CliOverrides::default()
        };
        let config = load(Some(&path), &overrides).expect("Config should load");

        assert_eq!(config.chunking.overlap_tokens, 10);
        assert_eq!(config.telemetry.tracing_level, "debug");
        assert_eq!(config.tokenizer.model.as_deref(), Some("gpt-4o"));
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let result = load(Some(Path::new("/nonexistent/medrag.toml")), &CliOverrides::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_log_level_flag_is_rejected() {
        let overrides = CliOverrides {
            log_level: Some("loud".to_string()),
            ..CliOverrides::default()
        };
        assert!(load(None, &overrides).is_err());
    }

    #[test]
    fn test_logging_options_follow_telemetry() {
        let telemetry = TelemetryConfig {
            tracing_level: "trace".to_string(),
            json_logs: true,
            log_dir: Some("/tmp/medrag-logs".to_string()),
        };
        let options = logging_options(&telemetry);
        assert_eq!(options.level, "trace");
        assert!(options.json);
        assert_eq!(options.log_dir, Some(PathBuf::from("/tmp/medrag-logs")));
    }
}
