use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::ConfigError;
use crate::gateway::slydepay::DEFAULT_BASE_URI as SLYDEPAY_BASE_URI;
use crate::gateway::GatewayConfig;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HubtelSettings {
    /// Empty disables the gateway.
    #[serde(default)]
    pub base_uri: String,
    #[serde(default)]
    pub api_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlydepaySettings {
    pub base_uri: String,
}

impl Default for SlydepaySettings {
    fn default() -> Self {
        Self {
            base_uri: SLYDEPAY_BASE_URI.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub hubtel: HubtelSettings,
    pub slydepay: SlydepaySettings,
    pub timeout_secs: Option<u64>,
    /// Route every call through the offline mock transport.
    pub demo: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            hubtel: HubtelSettings::default(),
            slydepay: SlydepaySettings::default(),
            timeout_secs: Some(30),
            demo: false,
        }
    }
}

impl AppConfig {
    /// Environment wins over the file. `var` is injected so tests need not
    /// touch the process environment.
    pub fn apply_overrides<F>(&mut self, var: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = var("HUBTEL_BASE_URI") {
            self.hubtel.base_uri = v;
        }
        if let Some(v) = var("HUBTEL_API_KEY") {
            self.hubtel.api_key = v;
        }
        if let Some(v) = var("SLYDEPAY_BASE_URI") {
            self.slydepay.base_uri = v;
        }
        if let Some(v) = var("PAYGATE_TIMEOUT_SECS") {
            let secs = v.trim().parse::<u64>().map_err(|_| ConfigError::InvalidEnv {
                key: "PAYGATE_TIMEOUT_SECS",
                value: v.clone(),
            })?;
            self.timeout_secs = (secs > 0).then_some(secs);
        }
        if let Some(v) = var("PAYGATE_DEMO") {
            self.demo = matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
        Ok(())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// `None` when Hubtel has no base URI configured.
    pub fn hubtel_config(&self) -> Result<Option<GatewayConfig>, ConfigError> {
        if self.hubtel.base_uri.trim().is_empty() {
            return Ok(None);
        }
        GatewayConfig::new(
            "Hubtel",
            self.hubtel.base_uri.trim(),
            Some(self.hubtel.api_key.clone()),
        )
        .map(Some)
    }

    pub fn slydepay_config(&self) -> Result<GatewayConfig, ConfigError> {
        GatewayConfig::new("Slydepay", self.slydepay.base_uri.trim(), None)
    }

    /// Fails fast on any base URI that would never resolve.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.hubtel_config()?;
        self.slydepay_config()?;
        Ok(())
    }
}

fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("paygate-cli")
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

pub fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(data) => Ok(serde_json::from_str(&data)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No config at {}, using defaults", path.display());
            Ok(AppConfig::default())
        }
        Err(e) => Err(e.into()),
    }
}

fn write_config(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let data = serde_json::to_string_pretty(config)?;
    std::fs::write(path, data)?;
    Ok(())
}

/// Reads `path`, then layers `var` on top. A missing file is created from
/// the file-only values, so environment overrides never reach disk.
pub fn load_config_at<F>(path: &Path, var: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = read_config(path)?;
    if !path.exists() {
        write_config(path, &config)?;
        info!("Wrote default config to {}", path.display());
    }

    config.apply_overrides(var)?;
    config.validate()?;
    Ok(config)
}

/// Reads the config file, then `.env` and the process environment.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    dotenv::dotenv().ok();

    let path = config_path();
    let config = load_config_at(&path, |key| std::env::var(key).ok())?;

    info!("Loaded config from {}", path.display());
    Ok(config)
}
