use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameConfig {
    pub crafting: CraftingConfig,
    pub timing: TimingConfig,
    pub saves: SaveConfig,
    #[serde(default)]
    pub debug: DebugConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CraftingConfig {
    /// Category the demo binary opens. Stations themselves carry no category.
    pub default_category: u32,
    /// Log "Obtained 3x Potions" style messages on harvest.
    pub harvest_messages: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TimingConfig {
    /// How often the host polls stations for completion.
    pub tick_interval_ms: u64,
    /// Longest frame the playtime clock will accept in one step, in seconds.
    pub max_frame_time: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SaveConfig {
    pub slots: u32,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DebugConfig {
    /// Start crafts without checking or consuming materials.
    #[serde(default)]
    pub free_crafting: bool,
    #[serde(default)]
    pub log_ticks: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            crafting: CraftingConfig {
                default_category: 0,
                harvest_messages: true,
            },
            timing: TimingConfig {
                tick_interval_ms: 100,
                max_frame_time: 0.25,
            },
            saves: SaveConfig { slots: 3 },
            debug: DebugConfig::default(),
        }
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", "manufactory")
}

fn config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join("settings.toml"))
}

/// Where save slots live: `<data dir>/saves`.
pub fn save_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.data_dir().join("saves"))
}

impl GameConfig {
    pub fn load() -> Self {
        let Some(path) = config_path() else {
            return Self::default();
        };

        match std::fs::read_to_string(&path) {
            Ok(contents) => Self::from_toml(&contents),
            Err(_) => {
                let config = Self::default();
                config.save();
                config
            }
        }
    }

    /// Parse settings, falling back to defaults on malformed input.
    pub fn from_toml(contents: &str) -> Self {
        match toml::from_str(contents) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Failed to parse config: {e}. Using defaults.");
                Self::default()
            }
        }
    }

    pub fn save(&self) {
        let Some(path) = config_path() else {
            log::warn!("Could not determine config directory");
            return;
        };

        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                log::warn!("Failed to create config directory: {e}");
                return;
            }
        }

        match toml::to_string_pretty(self) {
            Ok(contents) => {
                if let Err(e) = std::fs::write(&path, contents) {
                    log::warn!("Failed to write config: {e}");
                }
            }
            Err(e) => {
                log::warn!("Failed to serialize config: {e}");
            }
        }
    }

    /// Path of save slot `slot`, if it is within the configured range.
    pub fn slot_path(&self, slot: u32) -> Option<PathBuf> {
        if slot >= self.saves.slots {
            return None;
        }
        save_dir().map(|dir| dir.join(format!("slot{slot}.sav")))
    }
}
