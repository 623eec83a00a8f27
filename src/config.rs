//! Configuration management for authpatch
//!
//! authpatch stores configuration in ~/.authpatch/config.toml. Every value is
//! optional; command-line flags override whatever is set here.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// authpatch configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Target resolution settings
    #[serde(default)]
    pub targets: TargetsConfig,

    /// Backup settings
    #[serde(default)]
    pub backup: BackupConfig,

    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetsConfig {
    /// Base directory the relative target paths are resolved against
    #[serde(default)]
    pub base_dir: Option<String>,

    /// Replace the built-in target list entirely
    #[serde(default)]
    pub files: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackupConfig {
    /// Custom backup directory instead of ~/.authpatch/backups/
    #[serde(default)]
    pub backup_dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Number of context lines to show around changes
    #[serde(default = "default_context_lines")]
    pub context_lines: Option<usize>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            context_lines: Some(2),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Write a debug log to ~/.authpatch/authpatch.log
    #[serde(default = "default_debug")]
    pub debug: Option<bool>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { debug: Some(false) }
    }
}

// Default functions for serde
fn default_context_lines() -> Option<usize> {
    Some(2)
}
fn default_debug() -> Option<bool> {
    Some(false)
}

/// Get the configuration file path
pub fn config_file_path() -> Result<PathBuf> {
    let home_dir =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;

    let config_dir = home_dir.join(".authpatch");
    fs::create_dir_all(&config_dir)
        .with_context(|| format!("Failed to create config directory: {}", config_dir.display()))?;

    Ok(config_dir.join("config.toml"))
}

impl Config {
    /// Load the configuration, falling back to defaults when no file exists.
    pub fn load() -> Result<Self> {
        let path = config_file_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid TOML in configuration")
    }

    pub fn context_lines(&self) -> usize {
        self.output.context_lines.unwrap_or(2)
    }

    pub fn debug_logging(&self) -> bool {
        self.logging.debug.unwrap_or(false)
    }
}
