//! Configuration loading and validation for LedgerLoop.
//!
//! Loads configuration from `~/.ledgerloop/config.toml` with environment
//! variable overrides. Validates all settings at load time.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.ledgerloop/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Executor loop settings
    #[serde(default)]
    pub executor: ExecutorConfig,

    /// Conversation memory settings
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Maximum planner invocations per call
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Include the step ledger in successful outputs
    #[serde(default)]
    pub return_intermediate_steps: bool,

    /// Feed unparsable planner output back as an observation
    #[serde(default)]
    pub handle_parsing_errors: bool,

    /// Fixed observation to use instead of the parser's message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parsing_error_message: Option<String>,
}

fn default_max_iterations() -> u32 {
    15
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            return_intermediate_steps: false,
            handle_parsing_errors: false,
            parsing_error_message: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// "buffer" or "none"
    #[serde(default = "default_memory_backend")]
    pub backend: String,

    #[serde(default = "default_human_prefix")]
    pub human_prefix: String,

    #[serde(default = "default_ai_prefix")]
    pub ai_prefix: String,

    /// Input to remember; defaults to the single non-memory input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_key: Option<String>,

    #[serde(default = "default_output_key")]
    pub output_key: String,
}

fn default_memory_backend() -> String {
    "none".into()
}
fn default_human_prefix() -> String {
    "Human".into()
}
fn default_ai_prefix() -> String {
    "AI".into()
}
fn default_output_key() -> String {
    "output".into()
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            backend: default_memory_backend(),
            human_prefix: default_human_prefix(),
            ai_prefix: default_ai_prefix(),
            input_key: None,
            output_key: default_output_key(),
        }
    }
}

/// Parsed form of `memory.backend`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryBackend {
    Buffer,
    None,
}

impl std::str::FromStr for MemoryBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "buffer" => Ok(Self::Buffer),
            "none" => Ok(Self::None),
            other => Err(ConfigError::ValidationError(format!(
                "unknown memory backend '{other}' (expected 'buffer' or 'none')"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// "pretty" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".into()
}
fn default_log_format() -> String {
    "pretty".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.ledgerloop/config.toml).
    ///
    /// Environment overrides, applied after the file:
    /// - `LEDGERLOOP_MAX_ITERATIONS`
    /// - `LEDGERLOOP_LOG_FORMAT`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        Self::load_with_env(&config_path)
    }

    /// Load from a specific path, then apply environment overrides.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("LEDGERLOOP_MAX_ITERATIONS") {
            self.executor.max_iterations = raw.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "LEDGERLOOP_MAX_ITERATIONS must be a positive integer, got '{raw}'"
                ))
            })?;
        }
        if let Some(format) = lookup("LEDGERLOOP_LOG_FORMAT") {
            self.logging.format = format;
        }
        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".ledgerloop")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.executor.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "executor.max_iterations must be at least 1".into(),
            ));
        }

        self.memory_backend()?;

        if self.memory.output_key.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "memory.output_key must not be empty".into(),
            ));
        }

        match self.logging.format.to_ascii_lowercase().as_str() {
            "pretty" | "json" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "unknown log format '{other}' (expected 'pretty' or 'json')"
                )));
            }
        }

        Ok(())
    }

    /// The configured memory backend.
    pub fn memory_backend(&self) -> Result<MemoryBackend, ConfigError> {
        self.memory.backend.parse()
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigError> for ledgerloop_core::Error {
    fn from(e: ConfigError) -> Self {
        ledgerloop_core::Error::Config {
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.executor.max_iterations, 15);
        assert!(!config.executor.return_intermediate_steps);
        assert_eq!(config.memory_backend().unwrap(), MemoryBackend::None);
        assert!(!config.logging.is_json());
        config.validate().unwrap();
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.executor.max_iterations, config.executor.max_iterations);
        assert_eq!(parsed.memory.human_prefix, "Human");
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.executor.max_iterations, 15);
    }

    #[test]
    fn loads_sections_from_file() {
        let file = write_config(
            r#"
[executor]
max_iterations = 4
return_intermediate_steps = true
handle_parsing_errors = true
parsing_error_message = "Check your output and make sure it conforms!"

[memory]
backend = "buffer"
ai_prefix = "Assistant"

[logging]
format = "json"
"#,
        );
        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.executor.max_iterations, 4);
        assert!(config.executor.return_intermediate_steps);
        assert!(config.executor.handle_parsing_errors);
        assert_eq!(
            config.executor.parsing_error_message.as_deref(),
            Some("Check your output and make sure it conforms!")
        );
        assert_eq!(config.memory_backend().unwrap(), MemoryBackend::Buffer);
        assert_eq!(config.memory.ai_prefix, "Assistant");
        assert_eq!(config.memory.human_prefix, "Human");
        assert!(config.logging.is_json());
    }

    #[test]
    fn zero_iterations_rejected() {
        let file = write_config("[executor]\nmax_iterations = 0\n");
        let err = AppConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn unknown_backend_and_format_rejected() {
        let file = write_config("[memory]\nbackend = \"redis\"\n");
        assert!(matches!(
            AppConfig::load_from(file.path()),
            Err(ConfigError::ValidationError(_))
        ));

        let file = write_config("[logging]\nformat = \"xml\"\n");
        assert!(matches!(
            AppConfig::load_from(file.path()),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let file = write_config("[executor\nmax_iterations = 3");
        assert!(matches!(
            AppConfig::load_from(file.path()),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn env_overrides_apply() {
        let env: HashMap<&str, &str> = [
            ("LEDGERLOOP_MAX_ITERATIONS", "7"),
            ("LEDGERLOOP_LOG_FORMAT", "json"),
        ]
        .into_iter()
        .collect();
        let mut config = AppConfig::default();
        config
            .apply_env_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.executor.max_iterations, 7);
        assert!(config.logging.is_json());
    }

    #[test]
    fn bad_env_iterations_rejected() {
        let mut config = AppConfig::default();
        let err = config
            .apply_env_overrides(|key| (key == "LEDGERLOOP_MAX_ITERATIONS").then(|| "many".into()))
            .unwrap_err();
        assert!(err.to_string().contains("LEDGERLOOP_MAX_ITERATIONS"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("max_iterations = 15"));
        assert!(toml_str.contains("backend = \"none\""));
    }

    #[test]
    fn config_error_converts_to_core_error() {
        let err: ledgerloop_core::Error = ConfigError::ValidationError("bad".into()).into();
        assert!(matches!(err, ledgerloop_core::Error::Config { .. }));
    }
}
