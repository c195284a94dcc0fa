//! Runtime configuration resource.
//!
//! Manages settings loaded from an INI configuration file. Provides defaults
//! for a safe startup and methods to load/save the file.
//!
//! # Configuration File Format
//!
//! ```ini
//! [director]
//! tick_rate = 60
//! ticks = 240
//!
//! [slowdown]
//! default_scale = 1.0
//! slow_scale = 0.25
//! freeze_duration = 0.5
//!
//! [volume]
//! master = 0.8
//! music = 0.6
//! sfx = 1.0
//!
//! [save]
//! path = ./save.json
//! ```

use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use log::info;
use std::path::PathBuf;

use crate::error::{KitError, KitResult};

/// Default safe values for startup
const DEFAULT_TICK_RATE: u32 = 60;
const DEFAULT_TICKS: u32 = 240;
const DEFAULT_TIME_SCALE: f32 = 1.0;
const DEFAULT_SLOW_SCALE: f32 = 0.25;
const DEFAULT_FREEZE_DURATION: f32 = 0.5;
const DEFAULT_MASTER_VOLUME: f32 = 0.8;
const DEFAULT_MUSIC_VOLUME: f32 = 0.6;
const DEFAULT_SFX_VOLUME: f32 = 1.0;
const DEFAULT_SAVE_PATH: &str = "./save.json";
const DEFAULT_CONFIG_PATH: &str = "./config.ini";

/// Runtime configuration resource.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct KitConfig {
    /// Host ticks per second; the fixed delta is `1 / tick_rate`.
    pub tick_rate: u32,
    /// Number of ticks the demo driver runs.
    pub ticks: u32,
    /// Time scale restored by a slowdown reset.
    pub default_time_scale: f32,
    /// Time scale used by a slowdown (not a freeze).
    pub slow_time_scale: f32,
    /// Real seconds a freeze or slowdown lasts.
    pub freeze_duration: f32,
    pub master_volume: f32,
    pub music_volume: f32,
    pub sfx_volume: f32,
    /// Path of the JSON save file.
    pub save_path: PathBuf,
    /// Path to the configuration file.
    pub config_path: PathBuf,
}

impl Default for KitConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl KitConfig {
    /// Create a new configuration with safe default values.
    pub fn new() -> Self {
        Self {
            tick_rate: DEFAULT_TICK_RATE,
            ticks: DEFAULT_TICKS,
            default_time_scale: DEFAULT_TIME_SCALE,
            slow_time_scale: DEFAULT_SLOW_SCALE,
            freeze_duration: DEFAULT_FREEZE_DURATION,
            master_volume: DEFAULT_MASTER_VOLUME,
            music_volume: DEFAULT_MUSIC_VOLUME,
            sfx_volume: DEFAULT_SFX_VOLUME,
            save_path: PathBuf::from(DEFAULT_SAVE_PATH),
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    /// Create a new configuration with a custom config file path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Fixed host delta in seconds.
    pub fn tick_delta(&self) -> f32 {
        1.0 / self.tick_rate.max(1) as f32
    }

    /// Load configuration from the INI file.
    ///
    /// Missing values retain their current (default) values.
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(&mut self) -> KitResult<()> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|e| KitError::Config(format!("Failed to load config file: {}", e)))?;
        self.apply(&config);

        info!(
            "Loaded config: tick_rate={}, ticks={}, time_scale={}, volume={}/{}/{}, save={:?}",
            self.tick_rate,
            self.ticks,
            self.default_time_scale,
            self.master_volume,
            self.music_volume,
            self.sfx_volume,
            self.save_path
        );

        Ok(())
    }

    /// Load configuration from INI text instead of a file.
    pub fn load_from_str(&mut self, text: &str) -> KitResult<()> {
        let mut config = Ini::new();
        config
            .read(text.to_string())
            .map_err(|e| KitError::Config(format!("Failed to parse config: {}", e)))?;
        self.apply(&config);
        Ok(())
    }

    fn apply(&mut self, config: &Ini) {
        // [director] section
        if let Some(rate) = config.getuint("director", "tick_rate").ok().flatten() {
            self.tick_rate = rate as u32;
        }
        if let Some(ticks) = config.getuint("director", "ticks").ok().flatten() {
            self.ticks = ticks as u32;
        }

        // [slowdown] section
        if let Some(scale) = config.getfloat("slowdown", "default_scale").ok().flatten() {
            self.default_time_scale = scale as f32;
        }
        if let Some(scale) = config.getfloat("slowdown", "slow_scale").ok().flatten() {
            self.slow_time_scale = scale as f32;
        }
        if let Some(duration) = config.getfloat("slowdown", "freeze_duration").ok().flatten() {
            self.freeze_duration = duration as f32;
        }

        // [volume] section
        if let Some(v) = config.getfloat("volume", "master").ok().flatten() {
            self.master_volume = v as f32;
        }
        if let Some(v) = config.getfloat("volume", "music").ok().flatten() {
            self.music_volume = v as f32;
        }
        if let Some(v) = config.getfloat("volume", "sfx").ok().flatten() {
            self.sfx_volume = v as f32;
        }

        // [save] section
        if let Some(path) = config.get("save", "path") {
            self.save_path = PathBuf::from(path);
        }
    }

    /// Save configuration to the INI file.
    ///
    /// Creates the file if it doesn't exist.
    pub fn save_to_file(&self) -> KitResult<()> {
        let mut config = Ini::new();

        // [director] section
        config.set("director", "tick_rate", Some(self.tick_rate.to_string()));
        config.set("director", "ticks", Some(self.ticks.to_string()));

        // [slowdown] section
        config.set(
            "slowdown",
            "default_scale",
            Some(self.default_time_scale.to_string()),
        );
        config.set("slowdown", "slow_scale", Some(self.slow_time_scale.to_string()));
        config.set(
            "slowdown",
            "freeze_duration",
            Some(self.freeze_duration.to_string()),
        );

        // [volume] section
        config.set("volume", "master", Some(self.master_volume.to_string()));
        config.set("volume", "music", Some(self.music_volume.to_string()));
        config.set("volume", "sfx", Some(self.sfx_volume.to_string()));

        // [save] section
        config.set("save", "path", Some(self.save_path.display().to_string()));

        config.write(&self.config_path)?;

        info!("Saved config to {:?}", self.config_path);

        Ok(())
    }
}
