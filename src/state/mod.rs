/// Wall-clock source and scheduling leads.
pub mod clock;
/// Per-room broadcast channel.
pub mod hub;
mod membership;
/// Concurrent map of live rooms.
pub mod registry;
/// Authoritative room state.
pub mod room;
/// Playback and queue transitions.
pub mod transport;

use std::sync::Arc;

use crate::{
    config::AppConfig,
    state::{
        clock::{Clock, SystemClock},
        registry::RoomRegistry,
    },
};

/// Handle to [`AppState`] shared by handlers and background tasks.
pub type SharedState = Arc<AppState>;

/// Central application state: configuration, the room registry and the clock.
pub struct AppState {
    config: AppConfig,
    rooms: RoomRegistry,
    clock: Arc<dyn Clock>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(config: AppConfig) -> SharedState {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Same as [`AppState::new`] with an explicit time source.
    pub fn with_clock(config: AppConfig, clock: Arc<dyn Clock>) -> SharedState {
        Arc::new(Self {
            rooms: RoomRegistry::new(config.room_id_length, config.room_channel_capacity),
            config,
            clock,
        })
    }

    /// Loaded configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Registry of live rooms.
    pub fn rooms(&self) -> &RoomRegistry {
        &self.rooms
    }

    /// Current wall-clock time in Unix seconds.
    pub fn now(&self) -> f64 {
        self.clock.now()
    }
}
