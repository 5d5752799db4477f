//! Application-level configuration loading, including the room sync cadence.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "SYNCTUNE_CONFIG_PATH";

const DEFAULT_SYNC_INTERVAL_MS: u64 = 3_000;
const DEFAULT_JOIN_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_ROOM_CHANNEL_CAPACITY: usize = 64;
const DEFAULT_ROOM_ID_LENGTH: usize = 6;
const MIN_ROOM_ID_LENGTH: usize = 4;
const MAX_ROOM_ID_LENGTH: usize = 32;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Period of the background `server_sync` broadcast.
    pub sync_interval: Duration,
    /// How long a fresh socket may stay connected without joining a room.
    pub join_timeout: Duration,
    /// Capacity of each room's broadcast channel.
    pub room_channel_capacity: usize,
    /// Number of characters in generated room ids.
    pub room_id_length: usize,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        sync_interval_ms = app_config.sync_interval.as_millis() as u64,
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    sync_interval_ms: Option<u64>,
    join_timeout_ms: Option<u64>,
    room_channel_capacity: Option<usize>,
    room_id_length: Option<usize>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        Self {
            sync_interval: Duration::from_millis(
                value
                    .sync_interval_ms
                    .filter(|ms| *ms > 0)
                    .unwrap_or(DEFAULT_SYNC_INTERVAL_MS),
            ),
            join_timeout: Duration::from_millis(
                value.join_timeout_ms.unwrap_or(DEFAULT_JOIN_TIMEOUT_MS),
            ),
            room_channel_capacity: value
                .room_channel_capacity
                .unwrap_or(DEFAULT_ROOM_CHANNEL_CAPACITY)
                .max(1),
            room_id_length: value
                .room_id_length
                .unwrap_or(DEFAULT_ROOM_ID_LENGTH)
                .clamp(MIN_ROOM_ID_LENGTH, MAX_ROOM_ID_LENGTH),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
