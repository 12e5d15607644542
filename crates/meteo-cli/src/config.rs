use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeteoConfig {
    pub weather: WeatherConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub validator: ValidatorConfig,
}

// ── Weather Config ──────────────────────────────────────────────

#[derive(Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_forecast_window")]
    pub forecast_window: usize,
}

impl std::fmt::Debug for WeatherConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherConfig")
            .field("api_key", &mask_secret(&self.api_key))
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("forecast_window", &self.forecast_window)
            .finish()
    }
}

fn default_weather_base_url() -> String {
    "https://api.openweathermap.org".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_forecast_window() -> usize {
    meteo_core::weather::DEFAULT_FORECAST_WINDOW
}

// ── Gateway Config ──────────────────────────────────────────────

#[derive(Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_gateway_bind")]
    pub bind: String,
    #[serde(default = "default_gateway_port")]
    pub port: u16,
    #[serde(default)]
    pub auth_token: String,
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("bind", &self.bind)
            .field("port", &self.port)
            .field("auth_token", &mask_secret(&self.auth_token))
            .finish()
    }
}

fn default_gateway_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_gateway_port() -> u16 {
    8000
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: default_gateway_bind(),
            port: default_gateway_port(),
            auth_token: String::new(),
        }
    }
}

// ── Validator Config ────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidatorMode {
    /// Ask the weather provider's geocoding endpoint
    #[default]
    Geocoding,
    /// Accept only the names in `cities`
    List,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidatorConfig {
    #[serde(default)]
    pub mode: ValidatorMode,
    #[serde(default)]
    pub cities: Vec<String>,
}

// ── Loading ─────────────────────────────────────────────────────

fn mask_secret(s: &str) -> String {
    if s.is_empty() {
        return "(empty)".to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    if chars.len() > 7 {
        let prefix: String = chars[..3].iter().collect();
        let suffix: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", prefix, suffix)
    } else {
        "***".to_string()
    }
}

pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".meteo")
}

impl MeteoConfig {
    pub fn load(custom_path: &Option<PathBuf>) -> Result<Self> {
        let path = custom_path
            .clone()
            .unwrap_or_else(|| config_dir().join("config.toml"));

        check_permissions(&path)?;

        let content = std::fs::read_to_string(&path).with_context(|| {
            format!(
                "Failed to read config at {}. Run `meteo init` first.",
                path.display()
            )
        })?;

        Self::parse(&content)
            .with_context(|| format!("Failed to parse config at {}", path.display()))
    }

    /// Parse config text, expanding allowlisted `${VAR}` references first
    pub fn parse(content: &str) -> Result<Self> {
        let expanded = expand_env_vars(content);
        let config: Self = toml::from_str(&expanded)?;

        if !config.weather.api_key.is_empty() && !content.contains("${WEATHER_API_KEY}") {
            warn!(
                "Weather API key is hardcoded in config file. For security, use environment variables: api_key = \"${{WEATHER_API_KEY}}\""
            );
        }

        Ok(config)
    }

    /// Copy with secrets masked, for display
    pub fn masked(&self) -> Self {
        let mut copy = self.clone();
        copy.weather.api_key = mask_secret(&copy.weather.api_key);
        copy.gateway.auth_token = mask_secret(&copy.gateway.auth_token);
        copy
    }
}

/// Refuse config files readable by group or other (Unix only)
#[cfg(unix)]
fn check_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    if let Ok(metadata) = std::fs::metadata(path) {
        let mode = metadata.permissions().mode();
        if mode & 0o077 != 0 {
            return Err(anyhow::anyhow!(
                "Config file {:?} has overly permissive permissions ({:o}). \
                 It may contain secrets. Fix with: chmod 600 {:?}",
                path,
                mode & 0o777,
                path
            ));
        }
    }
    Ok(())
}

#[cfg(not(unix))]
fn check_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

/// Environment variables that may be referenced as `${VAR}` in config
const ALLOWED_ENV_VARS: &[&str] = &["WEATHER_API_KEY", "METEO_GATEWAY_TOKEN"];

fn expand_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    let mut pos = 0;
    while pos < result.len() {
        let Some(start) = result[pos..].find("${") else {
            break;
        };
        let abs_start = pos + start;
        let Some(end) = result[abs_start..].find('}') else {
            break;
        };
        let var_name = result[abs_start + 2..abs_start + end].to_string();

        if !ALLOWED_ENV_VARS.contains(&var_name.as_str()) {
            warn!(
                "Skipping expansion of unrecognized env var '{}' in config (not in allowlist)",
                var_name
            );
            pos = abs_start + end + 1;
            continue;
        }

        let value = std::env::var(&var_name).unwrap_or_default();
        result = format!(
            "{}{}{}",
            &result[..abs_start],
            value,
            &result[abs_start + end + 1..]
        );
        pos = abs_start + value.len();
    }
    result
}
