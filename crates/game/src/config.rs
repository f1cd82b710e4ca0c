//! Application settings (storage, simulation, input). Loaded from saberforge.ron at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "saberforge.ron";

/// Persistent application settings. Loaded from `saberforge.ron` in the current directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Directory holding the saved saber.
    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,
    /// Fixed seed for part geometry and random sabers. Entropy when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Simulation steps per second.
    #[serde(default = "default_sim_rate")]
    pub sim_rate_hz: f64,
    /// Radians of look per pixel of mouse movement in combat.
    #[serde(default = "default_mouse_sensitivity")]
    pub mouse_sensitivity: f32,
    /// Radians of saber rotation per pixel dragged in the maker.
    #[serde(default = "default_drag_sensitivity")]
    pub drag_sensitivity: f32,
    /// Simulated seconds per headless run.
    #[serde(default = "default_run_seconds")]
    pub run_seconds: f32,
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from("saves")
}
fn default_sim_rate() -> f64 {
    60.0
}
fn default_mouse_sensitivity() -> f32 {
    0.002
}
fn default_drag_sensitivity() -> f32 {
    0.01
}
fn default_run_seconds() -> f32 {
    2.0
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            storage_dir: default_storage_dir(),
            seed: None,
            sim_rate_hz: default_sim_rate(),
            mouse_sensitivity: default_mouse_sensitivity(),
            drag_sensitivity: default_drag_sensitivity(),
            run_seconds: default_run_seconds(),
        }
    }
}

impl GameConfig {
    /// Load config from `saberforge.ron`. If the file is missing or invalid, returns default config.
    pub fn load() -> Self {
        Self::load_from(&config_path())
    }

    pub fn load_from(path: &Path) -> Self {
        if let Ok(data) = std::fs::read_to_string(path) {
            match ron::from_str::<Self>(&data) {
                Ok(c) => return c.sanitized(),
                Err(e) => log::warn!("Invalid config at {:?}: {}, using defaults", path, e),
            }
        }
        Self::default()
    }

    /// Save current config to `saberforge.ron`. Logs on error.
    pub fn save(&self) {
        self.save_to(&config_path());
    }

    pub fn save_to(&self, path: &Path) {
        match ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default()) {
            Ok(s) => {
                if let Err(e) = std::fs::write(path, s) {
                    log::warn!("Could not write config to {:?}: {}", path, e);
                }
            }
            Err(e) => log::warn!("Could not encode config: {}", e),
        }
    }

    /// Replace values the simulation cannot run with.
    fn sanitized(mut self) -> Self {
        if !(self.sim_rate_hz.is_finite() && self.sim_rate_hz > 0.0) {
            log::warn!("sim_rate_hz {} is not usable, using {}", self.sim_rate_hz, default_sim_rate());
            self.sim_rate_hz = default_sim_rate();
        }
        if !(self.run_seconds.is_finite() && self.run_seconds >= 0.0) {
            log::warn!("run_seconds {} is not usable, using {}", self.run_seconds, default_run_seconds());
            self.run_seconds = default_run_seconds();
        }
        self
    }
}

pub fn config_path() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")).join(CONFIG_FILE)
}
