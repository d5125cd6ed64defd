//! Configuration management for argcomp
//!
//! Completion behavior is configured by the target program (through
//! [`CompletionConfig`] values passed to the interceptor) and, optionally, by
//! the user through a TOML file:
//!
//! 1. `$ARGCOMP_CONFIG` if set
//! 2. `<config dir>/argcomp/config.toml`
//! 3. Default values
//!
//! A missing file is not an error. A malformed one is, so that the user sees
//! the problem when running `argcomp config --show` rather than silently losing
//! completions.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};

/// Environment variable pointing at an explicit configuration file
pub const CONFIG_ENV_VAR: &str = "ARGCOMP_CONFIG";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompletionConfig {
    /// Append a trailing space (and closing quote) to a sole finished candidate
    #[serde(default = "default_append_space")]
    pub append_space: bool,

    /// Offer flag names even when the active word does not start with a prefix char
    #[serde(default)]
    pub always_complete_options: OptionCompletion,

    /// How sub-command names and positional values are merged
    #[serde(default)]
    pub subcommand_policy: SubcommandPolicy,

    /// Candidate ordering
    #[serde(default)]
    pub order: CandidateOrder,

    /// Offer flags marked as hidden
    #[serde(default)]
    pub print_hidden: bool,

    /// Flag names that are never offered
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which flag names are added outside of a flag-name context
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OptionCompletion {
    /// Only complete flags when the word starts with a prefix character
    #[default]
    Never,
    /// Add long flags (`--name`)
    Long,
    /// Add short flags (`-n`)
    Short,
    /// Add every flag
    All,
}

/// Merge policy when both sub-command names and a positional's values apply
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubcommandPolicy {
    /// Sub-command names first, then positional values
    #[default]
    Union,
    /// Drop positional values whenever a sub-command name matches
    PreferSubcommands,
}

/// Candidate ordering
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CandidateOrder {
    /// Declaration / source order
    #[default]
    Declared,
    /// Exact match first, then shorter candidates, then alphabetical
    Ranked,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// Enable timestamps in logs
    #[serde(default = "default_log_timestamps")]
    pub timestamps: bool,
}

/// Log level options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

// Default value functions
fn default_append_space() -> bool {
    true
}

fn default_log_level() -> LogLevel {
    LogLevel::Warn
}

fn default_log_timestamps() -> bool {
    false
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            append_space: default_append_space(),
            always_complete_options: OptionCompletion::default(),
            subcommand_policy: SubcommandPolicy::default(),
            order: CandidateOrder::default(),
            print_hidden: false,
            exclude: Vec::new(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            timestamps: default_log_timestamps(),
        }
    }
}

impl CompletionConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from the environment-selected or default path
    ///
    /// # Returns
    /// * `Result<CompletionConfig>` - Loaded configuration, defaults if no file exists
    pub fn load() -> Result<Self> {
        let path = std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from);
        Self::load_from_file(path.as_deref())
    }

    /// Load configuration from a file
    ///
    /// # Arguments
    /// * `path` - Explicit path, or `None` for the default location
    ///
    /// # Returns
    /// * `Result<CompletionConfig>` - Loaded configuration or error
    pub fn load_from_file(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (Self::default_path(), false),
        };

        if !path.exists() {
            if explicit {
                return Err(ConfigError::FileNotFound(path.display().to_string()).into());
            }
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: CompletionConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML text
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Get the default configuration file path
    ///
    /// # Returns
    /// * `PathBuf` - Path to default configuration file
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("argcomp")
            .join("config.toml")
    }

    /// Validate the configuration
    ///
    /// # Returns
    /// * `Result<()>` - Ok if valid, error otherwise
    pub fn validate(&self) -> Result<()> {
        if let Some(bad) = self.exclude.iter().find(|name| name.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "exclude".to_string(),
                value: bad.clone(),
            }
            .into());
        }
        Ok(())
    }

    /// Check whether a flag name may be offered under this configuration
    pub fn allows_flag(&self, name: &str) -> bool {
        !self.exclude.iter().any(|excluded| excluded == name)
    }
}

impl OptionCompletion {
    /// Whether this setting admits the given flag name
    pub fn admits(&self, name: &str) -> bool {
        match self {
            OptionCompletion::Never => false,
            OptionCompletion::Long => name.starts_with("--"),
            OptionCompletion::Short => !name.starts_with("--"),
            OptionCompletion::All => true,
        }
    }
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}
