//! Configuration loading, validation, and management for ReactLoop.
//!
//! Loads configuration from `~/.reactloop/config.toml` with environment
//! variable overrides. Between runs the configuration can be changed with a
//! [`LoopConfigUpdate`], which merges into the current values.

use reactloop_core::tool::ToolDescriptor;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.reactloop/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopConfig {
    /// Maximum reasoning iterations per run
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Forward streamed model output to the lifecycle sink
    #[serde(default)]
    pub enable_streaming: bool,

    /// Log every recorded step at info level
    #[serde(default)]
    pub verbose: bool,

    /// Replaces the built-in system prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    /// History compaction settings
    #[serde(default)]
    pub compaction: CompactionConfig,

    /// Tools offered to the model on every call
    #[serde(default)]
    pub tools: Vec<ToolDescriptor>,
}

fn default_max_iterations() -> u32 {
    10
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompactionConfig {
    /// Token budget for the history handed to the model
    #[serde(default = "default_compaction_max_tokens")]
    pub max_tokens: usize,
}

fn default_compaction_max_tokens() -> usize {
    8192
}

impl Default for CompactionConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_compaction_max_tokens(),
        }
    }
}

/// A partial configuration. `None` fields leave the current value alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoopConfigUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_streaming: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verbose: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compaction_max_tokens: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDescriptor>>,
}

impl LoopConfig {
    /// Load configuration from the default path (~/.reactloop/config.toml).
    ///
    /// Environment overrides (highest priority):
    /// - `REACTLOOP_MAX_ITERATIONS`
    /// - `REACTLOOP_STREAMING`
    /// - `REACTLOOP_VERBOSE`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
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

    /// Apply overrides read through `lookup` (normally `std::env::var`).
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(raw) = lookup("REACTLOOP_MAX_ITERATIONS") {
            self.max_iterations = raw.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "REACTLOOP_MAX_ITERATIONS must be a positive integer, got '{raw}'"
                ))
            })?;
        }
        if let Some(raw) = lookup("REACTLOOP_STREAMING") {
            self.enable_streaming = parse_flag("REACTLOOP_STREAMING", &raw)?;
        }
        if let Some(raw) = lookup("REACTLOOP_VERBOSE") {
            self.verbose = parse_flag("REACTLOOP_VERBOSE", &raw)?;
        }
        Ok(())
    }

    /// Merge a partial update into this configuration and re-validate.
    ///
    /// On validation failure the configuration is left unchanged.
    pub fn merge(&mut self, update: LoopConfigUpdate) -> Result<(), ConfigError> {
        let mut next = self.clone();
        if let Some(max) = update.max_iterations {
            next.max_iterations = max;
        }
        if let Some(streaming) = update.enable_streaming {
            next.enable_streaming = streaming;
        }
        if let Some(verbose) = update.verbose {
            next.verbose = verbose;
        }
        if let Some(prompt) = update.system_prompt {
            next.system_prompt = Some(prompt);
        }
        if let Some(max_tokens) = update.compaction_max_tokens {
            next.compaction.max_tokens = max_tokens;
        }
        if let Some(tools) = update.tools {
            next.tools = tools;
        }
        next.validate()?;
        *self = next;
        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".reactloop")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "max_iterations must be at least 1".into(),
            ));
        }

        if self.compaction.max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "compaction.max_tokens must be greater than 0".into(),
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for tool in &self.tools {
            if tool.name.trim().is_empty() {
                return Err(ConfigError::ValidationError("tool names must not be empty".into()));
            }
            if !seen.insert(tool.name.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate tool name '{}'",
                    tool.name
                )));
            }
        }

        Ok(())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            enable_streaming: false,
            verbose: false,
            system_prompt: None,
            compaction: CompactionConfig::default(),
            tools: vec![],
        }
    }
}

fn parse_flag(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::ValidationError(format!(
            "{key} must be a boolean, got '{raw}'"
        ))),
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
