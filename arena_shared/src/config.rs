//! Configuration system.
//!
//! Loads configuration from JSON strings/files (file IO left to the app);
//! binaries override individual fields from CLI flags.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ecs::WorldConfig;

/// Root configuration shared by the client and server binaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen/connect address, e.g. `127.0.0.1:5000`.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Fixed simulation tick rate.
    #[serde(default = "default_tick_hz")]
    pub tick_hz: u32,
    /// World bounds for clamping; `None` disables clamping entirely.
    #[serde(default = "default_world")]
    pub world: Option<WorldConfig>,
}

fn default_listen_addr() -> String {
    "127.0.0.1:5000".to_string()
}

fn default_tick_hz() -> u32 {
    60
}

fn default_world() -> Option<WorldConfig> {
    Some(WorldConfig {
        width: 800.0,
        height: 600.0,
        tile_size: 32.0,
    })
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            tick_hz: default_tick_hz(),
            world: default_world(),
        }
    }
}

impl ServerConfig {
    /// Parses config from JSON.
    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    /// Fixed tick duration.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f32(self.dt())
    }

    /// Fixed simulation step in seconds.
    pub fn dt(&self) -> f32 {
        1.0 / self.tick_hz as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let cfg = ServerConfig::from_json_str("{}").unwrap();
        assert_eq!(cfg.listen_addr, "127.0.0.1:5000");
        assert_eq!(cfg.tick_hz, 60);
        assert!(cfg.world.is_some());
    }

    #[test]
    fn world_bounds_can_be_disabled() {
        let cfg = ServerConfig::from_json_str(r#"{"world": null}"#).unwrap();
        assert!(cfg.world.is_none());
    }
}
