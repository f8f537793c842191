//! Configuration source loading and composition

use crate::validation::Validate;
use crate::{ApplicationConfig, ConfigResult};
use std::path::{Path, PathBuf};

/// Trait for loading configuration from different sources
pub trait ConfigurationSource {
    /// Produce a configuration, starting from the one built so far
    ///
    /// # Errors
    /// Returns configuration loading errors
    fn load(&self, base: &ApplicationConfig) -> ConfigResult<ApplicationConfig>;

    /// Get the name of this configuration source
    fn name(&self) -> &str;

    /// Get the priority of this source (higher number = higher priority)
    fn priority(&self) -> u8;

    /// Whether a failure to load this source aborts the whole load
    fn required(&self) -> bool {
        false
    }
}

/// Load configuration from environment variables
pub struct EnvironmentSource;

impl ConfigurationSource for EnvironmentSource {
    fn load(&self, base: &ApplicationConfig) -> ConfigResult<ApplicationConfig> {
        Ok(base.clone().with_env_overrides())
    }

    fn name(&self) -> &'static str {
        "environment"
    }

    fn priority(&self) -> u8 {
        100 // Environment variables override everything
    }
}

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileFormat {
    Toml,
    Yaml,
}

/// Load configuration from a TOML or YAML file
///
/// Fields missing from the file keep their defaults.
pub struct FileSource {
    path: PathBuf,
    format: FileFormat,
    required: bool,
}

impl FileSource {
    /// Source for a file, with the format picked from its extension
    ///
    /// `.yaml`/`.yml` are read as YAML, everything else as TOML.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let format = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => FileFormat::Yaml,
            _ => FileFormat::Toml,
        };
        Self {
            path,
            format,
            required: false,
        }
    }

    /// Make a missing or malformed file a hard error
    #[must_use]
    pub fn must_exist(mut self) -> Self {
        self.required = true;
        self
    }
}

impl ConfigurationSource for FileSource {
    fn load(&self, _base: &ApplicationConfig) -> ConfigResult<ApplicationConfig> {
        let content = std::fs::read_to_string(&self.path)?;

        let config: ApplicationConfig = match self.format {
            FileFormat::Toml => toml::from_str(&content)?,
            FileFormat::Yaml => serde_yaml::from_str(&content)?,
        };
        Ok(config)
    }

    fn name(&self) -> &'static str {
        match self.format {
            FileFormat::Toml => "toml_file",
            FileFormat::Yaml => "yaml_file",
        }
    }

    fn priority(&self) -> u8 {
        50 // Below env vars, above defaults
    }

    fn required(&self) -> bool {
        self.required
    }
}

/// Type alias for configuration sources
type ConfigSources = Vec<Box<dyn ConfigurationSource>>;

/// Configuration loader that combines multiple sources
pub struct ConfigurationLoader {
    sources: ConfigSources,
}

impl ConfigurationLoader {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    #[must_use]
    pub fn add_source(mut self, source: Box<dyn ConfigurationSource>) -> Self {
        self.sources.push(source);
        self
    }

    /// Load configuration from all sources with priority ordering
    ///
    /// # Errors
    /// Returns validation errors, or the load error of a required source
    pub fn load(&self) -> ConfigResult<ApplicationConfig> {
        let mut config = ApplicationConfig::default();

        // Lowest priority first, so higher priorities overwrite
        let mut sorted_sources = self.sources.iter().collect::<Vec<_>>();
        sorted_sources.sort_by_key(|source| source.priority());

        for source in sorted_sources {
            match source.load(&config) {
                Ok(source_config) => {
                    tracing::debug!("Loaded configuration from source: {}", source.name());
                    config = source_config;
                }
                Err(e) if source.required() => return Err(e),
                Err(e) => {
                    tracing::warn!("Failed to load from source {}: {}", source.name(), e);
                }
            }
        }

        config.validate()?;
        Ok(config)
    }
}

impl Default for ConfigurationLoader {
    fn default() -> Self {
        Self::new()
    }
}
