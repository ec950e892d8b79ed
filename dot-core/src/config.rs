//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/dot/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/dot/` (~/.config/dot/)
//! - State/Logs: `$XDG_STATE_HOME/dot/` (~/.local/state/dot/)

use crate::error::{Error, Result};
use crate::session::{DotOptions, DEFAULT_MAX_WIDGETS};
use crate::size_guard::{DEFAULT_MAX_BYTES, DEFAULT_MAX_ROWS};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Host application description
    #[serde(default)]
    pub app: AppConfig,

    /// Model backend (optional; generation fails without one)
    #[serde(default)]
    pub llm: Option<LlmConfig>,

    /// Payload budgets
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Live mirror refresh
    #[serde(default)]
    pub refresh: RefreshConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// Free-text description placed in the system prompt
    #[serde(default = "default_app_description")]
    pub description: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            description: default_app_description(),
        }
    }
}

fn default_app_description() -> String {
    "a data-driven application".to_string()
}

/// LLM provider configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    /// Provider type
    pub provider: LlmProvider,
    /// Model to use
    pub model: String,
    /// API endpoint (optional, uses default for provider)
    pub endpoint: Option<String>,
    /// API key (can also use env var)
    pub api_key: Option<String>,
    /// HTTP request timeout in seconds
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

fn default_llm_timeout() -> u64 {
    60
}

/// Supported LLM providers
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    Ollama,
    Claude,
    OpenAI,
    Gemini,
}

impl LlmProvider {
    /// Returns the default endpoint for this provider
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            LlmProvider::Ollama => "http://localhost:11434",
            LlmProvider::Claude => "https://api.anthropic.com",
            LlmProvider::OpenAI => "https://api.openai.com",
            LlmProvider::Gemini => "https://generativelanguage.googleapis.com",
        }
    }

    /// Environment variable consulted when `api_key` is not configured
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self {
            LlmProvider::Ollama => None,
            LlmProvider::Claude => Some("ANTHROPIC_API_KEY"),
            LlmProvider::OpenAI => Some("OPENAI_API_KEY"),
            LlmProvider::Gemini => Some("GEMINI_API_KEY"),
        }
    }
}

/// Payload budgets for a generation
#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    /// Compact JSON byte budget before falling back to a profile
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Row budget per top-level sequence
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,

    /// Widgets kept from an accepted spec
    #[serde(default = "default_max_widgets")]
    pub max_widgets: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_max_bytes(),
            max_rows: default_max_rows(),
            max_widgets: default_max_widgets(),
        }
    }
}

fn default_max_bytes() -> usize {
    DEFAULT_MAX_BYTES
}

fn default_max_rows() -> usize {
    DEFAULT_MAX_ROWS
}

fn default_max_widgets() -> usize {
    DEFAULT_MAX_WIDGETS
}

#[derive(Debug, Deserialize, Clone)]
pub struct RefreshConfig {
    /// Debounce window for the live mirror, in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl RefreshConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

fn default_debounce_ms() -> u64 {
    400
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.generation.max_widgets == 0 {
            return Err(Error::Config(
                "generation.max_widgets must be at least 1".to_string(),
            ));
        }
        if self.generation.max_rows == 0 {
            return Err(Error::Config(
                "generation.max_rows must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Budgets for a [`crate::DotSession`]
    pub fn dot_options(&self) -> DotOptions {
        DotOptions {
            max_bytes: self.generation.max_bytes,
            max_rows: self.generation.max_rows,
            max_widgets: self.generation.max_widgets,
        }
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/dot/config.toml` (~/.config/dot/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("dot").join("config.toml")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/dot/` (~/.local/state/dot/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("dot")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/dot/dot.log` (~/.local/state/dot/dot.log)
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("dot.log")
    }
}
