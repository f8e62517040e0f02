//! Configuration management for kizu-checker
//!
//! Config stored at: ~/.config/kizu-checker/config.json

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use kizu_types::{ConfigError, OutputFormat, Result};
use kizu_vision::AnalyzerConfig;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// External AI command line driving the vision backend;
    /// the deterministic stub is used when unset
    #[serde(default)]
    pub backend_command: Option<String>,

    /// Pause between analysis calls in milliseconds
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Ceiling on a single backend invocation in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Store directory override
    #[serde(default)]
    pub store_dir: Option<PathBuf>,

    /// Default output format (json, table)
    #[serde(default = "default_output_format")]
    pub output_format: OutputFormat,
}

fn default_delay_ms() -> u64 {
    1500
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_output_format() -> OutputFormat {
    OutputFormat::Table
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_command: None,
            delay_ms: default_delay_ms(),
            timeout_secs: default_timeout_secs(),
            store_dir: None,
            output_format: default_output_format(),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or(ConfigError::NotFound)?
            .join("kizu-checker");
        Ok(config_dir)
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Get the store directory path
    pub fn store_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.store_dir {
            return Ok(dir.clone());
        }

        let store_dir = dirs::data_dir()
            .ok_or(ConfigError::NotFound)?
            .join("kizu-checker");
        Ok(store_dir)
    }

    /// Load config from file, or create default
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Analyzer configuration for the configured backend
    pub fn analyzer_config(&self) -> AnalyzerConfig {
        AnalyzerConfig::default()
            .with_backend_command(self.backend_command.clone())
            .with_timeout(Duration::from_secs(self.timeout_secs))
    }

    /// Pause between analysis calls
    pub fn analysis_delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl std::fmt::Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Kizu Checker Configuration")?;
        writeln!(f, "==========================")?;
        writeln!(f)?;
        writeln!(
            f,
            "Backend command: {}",
            self.backend_command.as_deref().unwrap_or("(stub)")
        )?;
        writeln!(f, "Analysis delay:  {} ms", self.delay_ms)?;
        writeln!(f, "Timeout:         {} s", self.timeout_secs)?;
        writeln!(
            f,
            "Store dir:       {}",
            self.store_dir()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|_| "(error)".to_string())
        )?;
        writeln!(f, "Output format:   {}", self.output_format)?;

        if let Ok(path) = Self::config_path() {
            writeln!(f)?;
            writeln!(f, "Config file:     {}", path.display())?;
        }

        Ok(())
    }
}
