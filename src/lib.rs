//! Lane Runner - simulation core of a two-lane runner arcade game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (spawning, gates, boss, game state)
//! - `platform`: Collaborator interfaces (audio, effects, UI, input)
//! - `audio`: Sound cue catalogue and volume-aware audio manager
//! - `settings`: Data-driven tuning loaded from JSON

pub mod audio;
pub mod platform;
pub mod settings;
pub mod sim;

pub use audio::{AudioManager, SoundCue};
pub use settings::{GameMode, Settings, SettingsError};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Y coordinate where scrolling entities appear (top of screen)
    pub const SPAWN_Y: f32 = 7.0;
    /// Y coordinate below which scrolling entities are recycled
    pub const DESPAWN_Y: f32 = -6.0;

    /// Player group resting height
    pub const PLAYER_Y: f32 = -4.0;
    /// Units lost when an enemy or boss projectile reaches the group
    pub const COLLISION_DAMAGE: u32 = 3;

    /// Minimum allowed spawn interval (seconds)
    pub const MIN_SPAWN_INTERVAL: f32 = 0.5;
    /// Minimum allowed stage duration (seconds)
    pub const MIN_STAGE_DURATION: f32 = 10.0;
    /// Minimum allowed scroll speed / multiplier
    pub const MIN_SCROLL_SPEED: f32 = 0.1;
}

/// Step `current` toward `target` by at most `max_delta`
#[inline]
pub fn move_towards(current: Vec2, target: Vec2, max_delta: f32) -> Vec2 {
    let delta = target - current;
    let dist = delta.length();
    if dist <= max_delta || dist == 0.0 {
        target
    } else {
        current + delta / dist * max_delta
    }
}

/// Linear interpolation between `a` and `b`
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
