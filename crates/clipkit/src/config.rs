//! Annotator configuration
//!
//! The config file is YAML with three sections:
//!
//! ```yaml
//! ai:
//!   model: gpt-4o-mini
//!   temperature: 0.3
//! directories:
//!   input: ./input
//!   output: ./output
//! metadata:
//!   system_prompt: |
//!     You are a careful archivist...
//! ```
//!
//! Loading and validation are separate steps. [`ConfigLoader::load`] only
//! reads (and on first run materializes) the file; [`RawConfig::validate`]
//! checks keys first and only then touches the filesystem.

use crate::error::ConfigError;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default config file name, resolved against the working directory
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// Template copied into place when the config file does not exist yet
pub const EXAMPLE_CONFIG_FILE: &str = "config.example.yaml";

/// Config as read from disk; every key optional until validated
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfig {
    #[serde(default)]
    pub ai: Option<RawAiSection>,
    #[serde(default)]
    pub directories: Option<RawDirectoriesSection>,
    #[serde(default)]
    pub metadata: Option<RawMetadataSection>,

    /// Directory relative paths are resolved against
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAiSection {
    pub model: Option<String>,
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDirectoriesSection {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMetadataSection {
    pub system_prompt: Option<String>,
}

/// Model parameters for the chat-completion call
#[derive(Debug, Clone, PartialEq)]
pub struct AiConfig {
    pub model: String,
    pub temperature: f32,
}

/// Validated, immutable annotator configuration
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatorConfig {
    pub ai: AiConfig,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub system_prompt: String,
}

/// Locates, materializes and parses the config file
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load the config at `path`, or [`DEFAULT_CONFIG_FILE`] when `None`
    ///
    /// When the file is absent but a sibling [`EXAMPLE_CONFIG_FILE`] exists,
    /// the example is copied into place first.
    pub fn load(path: Option<&Path>) -> Result<RawConfig, ConfigError> {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        if !path.exists() {
            let example = base_dir.join(EXAMPLE_CONFIG_FILE);
            if !example.exists() {
                return Err(ConfigError::Missing { path, example });
            }
            info!(
                config_path = %path.display(),
                example_path = %example.display(),
                "Config file not found, creating it from example"
            );
            fs::copy(&example, &path).map_err(|source| ConfigError::Io {
                path: path.clone(),
                source,
            })?;
        }

        let text = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        let mut raw = Self::parse(&text)?;
        raw.base_dir = base_dir;
        debug!(config_path = %path.display(), "Parsed config YAML");
        Ok(raw)
    }

    /// Parse YAML text without touching the filesystem
    pub fn parse(text: &str) -> Result<RawConfig, ConfigError> {
        // An empty document parses as null; treat it as a config with no sections.
        if text.trim().is_empty() {
            return Ok(RawConfig::default());
        }
        serde_yaml::from_str(text)
            .map_err(|e| ConfigError::Invalid(format!("failed to parse YAML: {e}")))
    }
}

impl RawConfig {
    /// Check required keys, then the directories they point to
    pub fn validate(&self) -> Result<AnnotatorConfig, ConfigError> {
        let ai = self.ai.as_ref().ok_or_else(|| missing_section("ai"))?;
        let model = ai.model.clone().ok_or_else(|| missing_key("ai", "model"))?;
        let temperature = ai
            .temperature
            .ok_or_else(|| missing_key("ai", "temperature"))?;

        let dirs = self
            .directories
            .as_ref()
            .ok_or_else(|| missing_section("directories"))?;
        let input = dirs
            .input
            .as_ref()
            .ok_or_else(|| missing_key("directories", "input"))?;
        let output = dirs
            .output
            .as_ref()
            .ok_or_else(|| missing_key("directories", "output"))?;

        let metadata = self
            .metadata
            .as_ref()
            .ok_or_else(|| missing_section("metadata"))?;
        let system_prompt = metadata
            .system_prompt
            .clone()
            .ok_or_else(|| missing_key("metadata", "system_prompt"))?;

        let input_dir = self.resolve(input);
        if !input_dir.exists() {
            return Err(ConfigError::Invalid(format!(
                "input directory {} does not exist",
                input_dir.display()
            )));
        }

        let output_dir = self.resolve(output);
        let output_parent = output_dir
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        if !output_parent.as_os_str().is_empty() && !output_parent.exists() {
            return Err(ConfigError::Invalid(format!(
                "parent of output directory {} does not exist",
                output_parent.display()
            )));
        }

        Ok(AnnotatorConfig {
            ai: AiConfig { model, temperature },
            input_dir,
            output_dir,
            system_prompt,
        })
    }

    fn resolve(&self, dir: &Path) -> PathBuf {
        if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            self.base_dir.join(dir)
        }
    }
}

fn missing_section(section: &str) -> ConfigError {
    ConfigError::Invalid(format!("missing section `{section}`"))
}

fn missing_key(section: &str, key: &str) -> ConfigError {
    ConfigError::Invalid(format!("section `{section}` is missing key `{key}`"))
}
