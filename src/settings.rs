//! Game settings and tuning
//!
//! Loaded from JSON; every field has a default so partial files work.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;
use crate::sim::coordinator::{DEFAULT_MIN_VERTICAL_DISTANCE, DEFAULT_TRACKING_DURATION};
use crate::sim::lanes::ScreenCamera;
use crate::sim::stage::StageConfig;

/// Failure to read or parse a settings file
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Which ruleset the game runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum GameMode {
    /// Two-lane runner: timed stages, gates, boss
    #[default]
    Lane,
    /// Cannon fires units at enemy bases
    Legacy,
}

impl GameMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Lane => "Lane",
            GameMode::Legacy => "Legacy",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "lane" | "runner" => Some(GameMode::Lane),
            "legacy" | "cannon" => Some(GameMode::Legacy),
            _ => None,
        }
    }
}

/// Tunable settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub mode: GameMode,

    // === Lanes ===
    pub lane_count: usize,
    pub lane_width: f32,
    pub lane_spacing: f32,
    /// Maps screen taps to world X
    pub camera: ScreenCamera,

    // === Scrolling ===
    pub base_scroll_speed: f32,
    pub spawn_y: f32,
    pub despawn_y: f32,

    // === Spawn coordination ===
    pub min_vertical_distance: f32,
    pub tracking_duration: f32,

    // === Spawners ===
    pub enemy_initial_delay: f32,
    pub gate_initial_delay: f32,
    pub initial_pool_size: usize,
    /// Hard cap per enemy/gate pool (None = grow on demand)
    pub entity_pool_cap: Option<usize>,
    pub enemy_size: f32,
    pub gate_width: f32,
    pub gate_height: f32,

    // === Player ===
    pub initial_unit_count: u32,
    pub starting_lane: usize,
    pub player_y: f32,
    pub player_move_speed: f32,
    pub player_hitbox: f32,
    pub collision_damage: u32,

    // === Gun ===
    pub fire_interval: f32,
    pub refire_delay: f32,
    pub bullet_speed: f32,
    pub bullet_damage: u32,
    pub bullet_despawn_y: f32,
    pub spread_step: f32,
    pub max_spread_units: u32,
    pub bullet_pool_size: usize,
    pub bullet_pool_cap: Option<usize>,

    // === Stage flow ===
    pub stage_duration: f32,
    pub boss_enabled: bool,
    /// Boss appears this many seconds before the stage would end
    pub boss_lead_time: f32,
    pub auto_progress_stages: bool,
    /// Custom stage list; empty means the built-in stages
    pub stages: Vec<StageConfig>,

    // === Boss ===
    pub boss_base_hp: u32,
    pub boss_hp_per_stage: u32,
    pub boss_spawn_y: f32,
    pub boss_size: f32,
    pub boss_initial_attack_delay: f32,
    pub boss_phase1_interval: f32,
    pub boss_phase2_interval: f32,
    pub boss_projectile_speed: f32,
    pub boss_projectile_radius: f32,
    pub boss_projectile_pool_size: usize,

    // === Legacy mode ===
    pub starting_spawn_count: u32,
    pub unit_spawn_rate: f32,
    pub unit_speed: f32,
    pub unit_pool_cap: usize,
    pub legacy_enemy_interval: f32,
    pub legacy_enemy_initial_delay: f32,
    pub legacy_enemy_speed: f32,

    // === Audio ===
    pub master_volume: f32,
    pub sfx_volume: f32,
    pub music_volume: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mode: GameMode::Lane,

            lane_count: 2,
            lane_width: 2.0,
            lane_spacing: 0.5,
            camera: ScreenCamera::default(),

            base_scroll_speed: 2.0,
            spawn_y: SPAWN_Y,
            despawn_y: DESPAWN_Y,

            min_vertical_distance: DEFAULT_MIN_VERTICAL_DISTANCE,
            tracking_duration: DEFAULT_TRACKING_DURATION,

            enemy_initial_delay: 2.0,
            gate_initial_delay: 3.0,
            initial_pool_size: 10,
            entity_pool_cap: None,
            enemy_size: 0.8,
            gate_width: 1.5,
            gate_height: 0.5,

            initial_unit_count: 3,
            starting_lane: 0,
            player_y: PLAYER_Y,
            player_move_speed: 10.0,
            player_hitbox: 1.0,
            collision_damage: COLLISION_DAMAGE,

            fire_interval: 0.5,
            refire_delay: 0.2,
            bullet_speed: 10.0,
            bullet_damage: 1,
            bullet_despawn_y: 8.0,
            spread_step: 0.15,
            max_spread_units: 5,
            bullet_pool_size: 20,
            bullet_pool_cap: Some(512),

            stage_duration: 30.0,
            boss_enabled: true,
            boss_lead_time: 10.0,
            auto_progress_stages: true,
            stages: Vec::new(),

            boss_base_hp: 50,
            boss_hp_per_stage: 50,
            boss_spawn_y: 4.0,
            boss_size: 1.5,
            boss_initial_attack_delay: 1.0,
            boss_phase1_interval: 3.0,
            boss_phase2_interval: 2.0,
            boss_projectile_speed: 5.0,
            boss_projectile_radius: 0.12,
            boss_projectile_pool_size: 10,

            starting_spawn_count: 30,
            unit_spawn_rate: 10.0,
            unit_speed: 5.0,
            unit_pool_cap: 200,
            legacy_enemy_interval: 1.2,
            legacy_enemy_initial_delay: 1.5,
            legacy_enemy_speed: 4.0,

            master_volume: 0.8,
            sfx_volume: 1.0,
            music_volume: 0.7,
        }
    }
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str::<Settings>(json)?.sanitized())
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load settings from a file, falling back to defaults
    pub fn load(path: &Path) -> Self {
        match Self::load_from(path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!("Using default settings ({})", e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        std::fs::write(path, self.to_json()?)?;
        log::info!("Settings saved");
        Ok(())
    }

    /// Clamp out-of-range values to safe ones, warning about each
    pub fn sanitized(mut self) -> Self {
        fn at_least<T: PartialOrd + Copy + std::fmt::Debug>(name: &str, value: &mut T, min: T) {
            if *value < min {
                log::warn!("Setting {} = {:?} below minimum, using {:?}", name, *value, min);
                *value = min;
            }
        }

        at_least("lane_count", &mut self.lane_count, 1);
        at_least("lane_width", &mut self.lane_width, 0.1);
        at_least("lane_spacing", &mut self.lane_spacing, 0.0);
        at_least("base_scroll_speed", &mut self.base_scroll_speed, MIN_SCROLL_SPEED);
        at_least("min_vertical_distance", &mut self.min_vertical_distance, 0.0);
        at_least("tracking_duration", &mut self.tracking_duration, 0.0);
        at_least("player_move_speed", &mut self.player_move_speed, 0.1);
        at_least("fire_interval", &mut self.fire_interval, 0.01);
        at_least("stage_duration", &mut self.stage_duration, MIN_STAGE_DURATION);
        at_least("boss_lead_time", &mut self.boss_lead_time, 0.0);
        at_least("boss_base_hp", &mut self.boss_base_hp, 1);
        at_least("boss_phase1_interval", &mut self.boss_phase1_interval, 0.1);
        at_least("boss_phase2_interval", &mut self.boss_phase2_interval, 0.1);
        at_least("unit_spawn_rate", &mut self.unit_spawn_rate, 0.1);
        at_least("legacy_enemy_interval", &mut self.legacy_enemy_interval, 0.1);

        if self.starting_lane >= self.lane_count {
            log::warn!("Starting lane {} out of range, using lane 0", self.starting_lane);
            self.starting_lane = 0;
        }
        if self.despawn_y >= self.spawn_y {
            log::warn!(
                "despawn_y {} must be below spawn_y {}, using defaults",
                self.despawn_y,
                self.spawn_y
            );
            self.spawn_y = SPAWN_Y;
            self.despawn_y = DESPAWN_Y;
        }

        self.master_volume = self.master_volume.clamp(0.0, 1.0);
        self.sfx_volume = self.sfx_volume.clamp(0.0, 1.0);
        self.music_volume = self.music_volume.clamp(0.0, 1.0);
        self
    }
}
