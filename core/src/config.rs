use std::{env, fs, path::PathBuf, time::Duration};

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use crate::latency::LatencyProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StorageBackendKind {
    Memory,
    JsonFile,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_storage_backend")]
    pub storage_backend: StorageBackendKind,
    #[serde(default = "default_storage_path")]
    pub storage_path: String,
    #[serde(default)]
    pub latency: LatencyConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LatencyConfig {
    #[serde(default = "default_login_ms")]
    pub login_ms: u64,
    #[serde(default = "default_read_ms")]
    pub read_ms: u64,
    #[serde(default = "default_write_ms")]
    pub write_ms: u64,
    #[serde(default = "default_profile_read_ms")]
    pub profile_read_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_backend: default_storage_backend(),
            storage_path: default_storage_path(),
            latency: LatencyConfig::default(),
        }
    }
}

impl Default for LatencyConfig {
    fn default() -> Self {
        Self {
            login_ms: default_login_ms(),
            read_ms: default_read_ms(),
            write_ms: default_write_ms(),
            profile_read_ms: default_profile_read_ms(),
        }
    }
}

impl LatencyConfig {
    pub fn profile(&self) -> LatencyProfile {
        LatencyProfile {
            login: Duration::from_millis(self.login_ms),
            read: Duration::from_millis(self.read_ms),
            write: Duration::from_millis(self.write_ms),
            profile_read: Duration::from_millis(self.profile_read_ms),
        }
    }
}

impl AppConfig {
    const CONFIG_ENV: &'static str = "TEAMCONTROL_CONFIG_FILE";
    const STORAGE_BACKEND_ENV: &'static str = "TEAMCONTROL_STORAGE_BACKEND";
    const STORAGE_PATH_ENV: &'static str = "TEAMCONTROL_STORAGE_PATH";
    const DISABLE_LATENCY_ENV: &'static str = "TEAMCONTROL_DISABLE_LATENCY";

    /// Load configuration from defaults layered with an optional config file
    /// and environment variables.
    pub fn load() -> Result<Self> {
        Self::load_with(None)
    }

    pub fn load_with(config_path: Option<PathBuf>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(path) = Self::resolve_config_path(config_path)? {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("failed to read config file: {}", path.display()))?;
            let file_config: Self = toml::from_str(&contents)
                .with_context(|| format!("invalid config file: {}", path.display()))?;

            config = file_config;
        }

        if let Ok(backend) = env::var(Self::STORAGE_BACKEND_ENV) {
            config.storage_backend = parse_backend(&backend)
                .with_context(|| format!("invalid {name}", name = Self::STORAGE_BACKEND_ENV))?;
        }

        if let Ok(path) = env::var(Self::STORAGE_PATH_ENV) {
            config.storage_path = path;
        }

        if env_bool(Self::DISABLE_LATENCY_ENV) {
            config.latency = LatencyConfig {
                login_ms: 0,
                read_ms: 0,
                write_ms: 0,
                profile_read_ms: 0,
            };
        }

        Ok(config)
    }

    pub fn latency_profile(&self) -> LatencyProfile {
        self.latency.profile()
    }

    fn resolve_config_path(explicit: Option<PathBuf>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            return Self::validate_path(path);
        }

        if let Ok(path) = env::var(Self::CONFIG_ENV) {
            return Self::validate_path(PathBuf::from(path));
        }

        let mut candidates = vec![PathBuf::from("teamcontrol.toml")];
        if let Some(dir) = Self::default_config_dir() {
            candidates.push(dir.join("config.toml"));
        }

        for candidate in candidates {
            if candidate.exists() {
                return Ok(Some(candidate));
            }
        }

        Ok(None)
    }

    fn validate_path(path: PathBuf) -> Result<Option<PathBuf>> {
        if path.exists() {
            Ok(Some(path))
        } else {
            Err(anyhow!(
                "configuration file does not exist: {}",
                path.display()
            ))
        }
    }

    fn default_config_dir() -> Option<PathBuf> {
        home_dir().map(|home| home.join(".teamcontrol"))
    }
}

fn parse_backend(value: &str) -> Result<StorageBackendKind> {
    match value.to_ascii_lowercase().as_str() {
        "memory" => Ok(StorageBackendKind::Memory),
        "json-file" | "file" => Ok(StorageBackendKind::JsonFile),
        other => Err(anyhow!("unknown storage backend: {other}")),
    }
}

fn env_bool(var: &str) -> bool {
    env::var(var)
        .ok()
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false)
}

fn default_storage_backend() -> StorageBackendKind {
    StorageBackendKind::JsonFile
}

fn default_storage_path() -> String {
    "./data/teamcontrol.json".to_owned()
}

fn default_login_ms() -> u64 {
    800
}

fn default_read_ms() -> u64 {
    300
}

fn default_write_ms() -> u64 {
    400
}

fn default_profile_read_ms() -> u64 {
    500
}

fn home_dir() -> Option<PathBuf> {
    if let Some(path) = env::var_os("HOME") {
        return Some(PathBuf::from(path));
    }

    if let Some(path) = env::var_os("USERPROFILE") {
        return Some(PathBuf::from(path));
    }

    None
}
