use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use serde::{Deserialize, Serialize};

use crate::models::Coordinates;
use crate::utils;

pub const DEFAULT_GEOCODING_URL: &str = "https://api.mapbox.com";
pub const DEFAULT_RADIUS_KM: f64 = 10.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub mapbox_token: Option<String>,
    pub geocoding_url: String,
    pub storage_url: Option<String>,
    pub map_center: Coordinates,
    pub map_radius_km: f64,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mapbox_token: None,
            geocoding_url: DEFAULT_GEOCODING_URL.to_string(),
            storage_url: None,
            // Buenos Aires, Obelisco
            map_center: Coordinates {
                latitude: -34.6037,
                longitude: -58.3816,
            },
            map_radius_km: DEFAULT_RADIUS_KM,
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Environment wins over the file so CI and dev shells can inject tokens.
    pub fn apply_env(mut self) -> Self {
        if let Some(token) = env_non_empty("SEEKART_MAPBOX_TOKEN") {
            self.mapbox_token = Some(token);
        }
        if let Some(url) = env_non_empty("SEEKART_GEOCODING_URL") {
            self.geocoding_url = url;
        }
        if let Some(url) = env_non_empty("SEEKART_STORAGE_URL") {
            self.storage_url = Some(url);
        }
        if let Some(level) = env_non_empty("SEEKART_LOG") {
            self.log_level = level;
        }
        self
    }

    pub fn has_geocoding_token(&self) -> bool {
        self.mapbox_token
            .as_deref()
            .map(|t| !t.trim().is_empty())
            .unwrap_or(false)
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

pub struct ConfigStore {
    path: PathBuf,
    data: Mutex<AppConfig>,
}

impl ConfigStore {
    pub fn load() -> Self {
        Self::load_from(utils::config_path())
    }

    pub fn load_from(path: PathBuf) -> Self {
        let data = match read_config(&path) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(path = %path.display(), "unreadable config, using defaults: {err}");
                AppConfig::default()
            }
        };
        Self {
            path,
            data: Mutex::new(data.apply_env()),
        }
    }

    pub fn read(&self) -> AppConfig {
        self.data
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn update<F>(&self, transform: F) -> Result<AppConfig, String>
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut guard = self
            .data
            .lock()
            .map_err(|_| "config mutex poisoned".to_string())?;
        transform(&mut guard);
        write_config(&self.path, &guard)?;
        Ok(guard.clone())
    }
}

fn read_config(path: &Path) -> Result<AppConfig, String> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let contents = fs::read_to_string(path).map_err(|err| err.to_string())?;
    serde_json::from_str(&contents).map_err(|err| err.to_string())
}

fn write_config(path: &Path, config: &AppConfig) -> Result<(), String> {
    utils::ensure_parent(path);
    let contents = serde_json::to_string_pretty(config).map_err(|err| err.to_string())?;
    fs::write(path, contents).map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::load_from(dir.path().join("config.json"));
        let config = store.read();
        assert!(!config.geocoding_url.is_empty());
    }

    #[test]
    fn update_persists_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let store = ConfigStore::load_from(path.clone());
        store
            .update(|config| {
                config.map_radius_km = 25.0;
                config.storage_url = Some("https://files.seekart.app/storage/v1".into());
            })
            .unwrap();

        let reloaded: AppConfig =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(reloaded.map_radius_km, 25.0);
        assert_eq!(
            reloaded.storage_url.as_deref(),
            Some("https://files.seekart.app/storage/v1")
        );
    }

    #[test]
    fn partial_files_fill_in_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{"map_radius_km": 3.5}"#).unwrap();
        assert_eq!(config.map_radius_km, 3.5);
        assert_eq!(config.geocoding_url, DEFAULT_GEOCODING_URL);
        assert!(!config.has_geocoding_token());
    }

    #[test]
    fn retired_quiet_period_key_is_ignored() {
        let config: AppConfig =
            serde_json::from_str(r#"{"geocode_debounce_ms": 50, "log_level": "debug"}"#).unwrap();
        assert_eq!(config.log_level, "debug");
        let written = serde_json::to_value(&config).unwrap();
        assert!(written.get("geocode_debounce_ms").is_none());
    }
}
