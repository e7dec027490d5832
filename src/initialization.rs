use std::fmt;
use std::fmt::Formatter;
use std::path::Path;
use log::info;
use serde::Deserialize;
use crate::logging::{setup_logger, LoggingError};
use crate::manager_sizing::SizingPolicy;
use crate::models::Coordinates;

const CONFIG_ENV: &str = "RWH_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct WebServer {
    pub bind_address: String,
    pub bind_port: u16,
}

impl Default for WebServer {
    fn default() -> Self {
        Self { bind_address: "127.0.0.1".to_string(), bind_port: 8080 }
    }
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct General {
    pub log_level: String,
}

impl Default for General {
    fn default() -> Self {
        Self { log_level: "info".to_string() }
    }
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Files {
    pub cache_dir: String,
}

impl Default for Files {
    fn default() -> Self {
        Self { cache_dir: "./cache/".to_string() }
    }
}

/// Coordinates used when a request carries none
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct GeoRef {
    pub lat: f64,
    pub long: f64,
}

impl Default for GeoRef {
    fn default() -> Self {
        Self { lat: 28.6139, long: 77.2090 }
    }
}

impl GeoRef {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates { lat: self.lat, lon: self.long }
    }
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct RainfallConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub fallback_mm: f64,
    pub cache_hours: i64,
}

impl Default for RainfallConfig {
    fn default() -> Self {
        Self {
            base_url: "https://archive-api.open-meteo.com/v1/archive".to_string(),
            timeout_secs: 30,
            fallback_mm: 800.0,
            cache_hours: 24,
        }
    }
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct BlueprintConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

impl Default for BlueprintConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.0-flash".to_string(),
            api_key: String::new(),
            timeout_secs: 60,
        }
    }
}

#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub web_server: WebServer,
    pub general: General,
    pub files: Files,
    pub geo_ref: GeoRef,
    pub rainfall: RainfallConfig,
    pub blueprint: BlueprintConfig,
    pub policy: SizingPolicy,
}

#[derive(Debug)]
pub struct ConfigError(pub String);
impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "ConfigError: {}", self.0)
    }
}
impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self { ConfigError(e.to_string()) }
}
impl From<LoggingError> for ConfigError {
    fn from(e: LoggingError) -> Self { ConfigError(e.to_string()) }
}
impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self { ConfigError(e.to_string()) }
}

/// Loads the configuration and starts logging
///
/// The config file is given by a '--config=<path>' argument, the RWH_CONFIG
/// environment variable or defaults to config.toml. A missing file means defaults.
pub fn config() -> Result<Config, ConfigError> {
    let path = config_path(std::env::args().collect::<Vec<String>>(), std::env::var(CONFIG_ENV).ok());
    let config = load_config(&path)?;

    setup_logger(&config.general.log_level)?;
    info!("configuration loaded from {}", path);

    Ok(config)
}

/// Picks the config file path from arguments and environment
///
/// # Arguments
///
/// * 'args' - command line arguments
/// * 'env' - value of the RWH_CONFIG variable if set
fn config_path(args: Vec<String>, env: Option<String>) -> String {
    args.into_iter()
        .find_map(|a| a.strip_prefix("--config=").map(|p| p.to_string()))
        .or(env)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
}

/// Reads and parses the config file, defaults apply to anything left out
///
/// # Arguments
///
/// * 'path' - path to the TOML config file
fn load_config(path: &str) -> Result<Config, ConfigError> {
    if !Path::new(path).exists() {
        return Ok(Config::default());
    }

    let raw = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&raw)?;

    Ok(config)
}
