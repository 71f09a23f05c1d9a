//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.pjax/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct PjaxConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub scroll: ScrollConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub disabled: Option<bool>,
    pub load_indicator_delay_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ScrollConfig {
    pub offset_selector: Option<String>,
    pub default_main_id: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct HttpConfig {
    pub timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_LOAD_INDICATOR_DELAY_MS: u64 = 250;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_USER_AGENT: &str = concat!("pjax/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Global kill switch: clicks are left to the browser.
    pub disabled: bool,
    /// Zero disables the loading indication entirely.
    pub load_indicator_delay: Duration,
    pub scroll_offset_selector: Option<String>,
    pub default_main_id: Option<String>,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for ResolvedConfig {
    /// Built-in defaults only. The environment is read by `resolve`.
    fn default() -> Self {
        resolve_with_env(&PjaxConfig::default(), &CliOverrides::default(), |_| None)
    }
}

/// Values given on the command line. `None` means "not specified".
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub disabled: Option<bool>,
    pub load_indicator_delay_ms: Option<u64>,
    pub scroll_offset_selector: Option<String>,
    pub default_main_id: Option<String>,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.pjax/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".pjax").join("config.toml"))
}

/// Load config from `~/.pjax/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `PjaxConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<PjaxConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(PjaxConfig::default());
        }
    };

    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(&path);
        return Ok(PjaxConfig::default());
    }

    load_config_from(&path)
}

/// Load config from an explicit path. The file must exist.
pub fn load_config_from(path: &PathBuf) -> Result<PjaxConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: PjaxConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &PathBuf) {
    let default_content = r#"# pjax Configuration
# All settings are optional. Defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [general]
# disabled = false                   # Or set PJAX_DISABLED=1
# load_indicator_delay_ms = 250      # 0 disables the loading indication

# [scroll]
# offset_selector = "header.fixed"   # Fixed header to compensate for when scrolling
# default_main_id = "main"           # Used by an empty data-scroll-to-id

# [http]
# timeout_secs = 30
# user_agent = "pjax/0.1.0"
"#;

    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("Failed to create config directory: {}", e);
            return;
        }
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &PjaxConfig, cli: &CliOverrides) -> ResolvedConfig {
    resolve_with_env(config, cli, |name| std::env::var(name).ok())
}

/// `resolve` with the environment supplied by `env`.
pub fn resolve_with_env(
    config: &PjaxConfig,
    cli: &CliOverrides,
    env: impl Fn(&str) -> Option<String>,
) -> ResolvedConfig {
    // Kill switch: CLI → env → config → default
    let disabled = cli
        .disabled
        .or_else(|| env("PJAX_DISABLED").and_then(|v| parse_flag("PJAX_DISABLED", &v)))
        .or(config.general.disabled)
        .unwrap_or(false);

    // Indicator delay: CLI → env → config → default
    let delay_ms = cli
        .load_indicator_delay_ms
        .or_else(|| env("PJAX_LOAD_INDICATOR_DELAY_MS").and_then(|v| v.trim().parse().ok()))
        .or(config.general.load_indicator_delay_ms)
        .unwrap_or(DEFAULT_LOAD_INDICATOR_DELAY_MS);

    // Scroll settings: CLI → env → config. Empty strings mean "unset".
    let scroll_offset_selector = non_empty(
        cli.scroll_offset_selector
            .clone()
            .or_else(|| env("PJAX_SCROLL_OFFSET_SELECTOR"))
            .or_else(|| config.scroll.offset_selector.clone()),
    );
    let default_main_id = non_empty(
        cli.default_main_id
            .clone()
            .or_else(|| env("PJAX_DEFAULT_MAIN_ID"))
            .or_else(|| config.scroll.default_main_id.clone()),
    );

    ResolvedConfig {
        disabled,
        load_indicator_delay: Duration::from_millis(delay_ms),
        scroll_offset_selector,
        default_main_id,
        request_timeout: Duration::from_secs(
            config.http.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
        ),
        user_agent: config
            .http
            .user_agent
            .clone()
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
    }
}

fn parse_flag(name: &str, value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        other => {
            warn!("Ignoring {}={:?}: not a boolean", name, other);
            None
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
