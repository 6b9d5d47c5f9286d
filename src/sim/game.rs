//! Game state machine
//!
//! Playing is the only live state. Won and Lost are terminal until
//! `initialize_game`; every trigger checks the state first, so double
//! triggers are harmless.

use super::events::{EventQueue, GameEvent, LoseReason};
use crate::audio::SoundCue;
use crate::consts::MIN_STAGE_DURATION;
use crate::settings::{GameMode, Settings};

/// Delay before the first out-of-spawns check
const LOSE_CHECK_DELAY: f32 = 0.5;
/// Interval between later out-of-spawns checks
const LOSE_CHECK_INTERVAL: f32 = 0.2;
/// Slack when comparing the stage clock against a deadline
const TIME_EPSILON: f64 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GameState {
    #[default]
    Playing,
    Won,
    Lost,
}

impl GameState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, GameState::Playing)
    }
}

/// What happened during one `GameManager::update`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageProgress {
    /// Boss phase just began; the boss must be spawned now
    pub spawn_boss: bool,
    /// Stage timer ran out and the stage was won
    pub won: bool,
}

#[derive(Debug, Clone)]
pub struct GameManager {
    pub mode: GameMode,
    pub boss_enabled: bool,
    /// Boss appears this long before the stage timer would end it
    pub boss_lead_time: f32,
    state: GameState,
    stage_duration: f32,
    /// f64 so 60 Hz ticks land on whole-second deadlines
    stage_timer: f64,
    boss_spawned: bool,
    in_boss_phase: bool,

    // Legacy mode
    starting_spawn_count: u32,
    remaining_spawns: u32,
    total_bases: usize,
    destroyed_bases: usize,
    lose_check: Option<f32>,
}

impl GameManager {
    pub fn new(settings: &Settings) -> Self {
        let mut manager = Self {
            mode: settings.mode,
            boss_enabled: settings.boss_enabled,
            boss_lead_time: settings.boss_lead_time,
            state: GameState::Playing,
            stage_duration: MIN_STAGE_DURATION,
            stage_timer: 0.0,
            boss_spawned: false,
            in_boss_phase: false,
            starting_spawn_count: settings.starting_spawn_count,
            remaining_spawns: settings.starting_spawn_count,
            total_bases: 0,
            destroyed_bases: 0,
            lose_check: None,
        };
        manager.set_stage_duration(settings.stage_duration);
        manager
    }

    /// Reset to a fresh Playing state
    pub fn initialize_game(&mut self, events: &mut EventQueue) {
        self.state = GameState::Playing;
        self.remaining_spawns = self.starting_spawn_count;
        self.destroyed_bases = 0;
        self.stage_timer = 0.0;
        self.boss_spawned = false;
        self.in_boss_phase = false;
        self.lose_check = None;
        events.push(GameEvent::RemainingSpawnsChanged(self.remaining_spawns));
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == GameState::Playing
    }

    pub fn stage_timer(&self) -> f32 {
        self.stage_timer as f32
    }

    pub fn stage_duration(&self) -> f32 {
        self.stage_duration
    }

    pub fn in_boss_phase(&self) -> bool {
        self.in_boss_phase
    }

    pub fn boss_spawned(&self) -> bool {
        self.boss_spawned
    }

    pub fn remaining_spawns(&self) -> u32 {
        self.remaining_spawns
    }

    /// Seconds left on the stage clock (0 in boss phase once it runs out)
    pub fn time_remaining(&self) -> f32 {
        (f64::from(self.stage_duration) - self.stage_timer).max(0.0) as f32
    }

    pub fn set_stage_duration(&mut self, duration: f32) {
        if duration < MIN_STAGE_DURATION {
            log::warn!(
                "Stage duration {} below minimum, clamping to {}",
                duration,
                MIN_STAGE_DURATION
            );
        }
        self.stage_duration = duration.max(MIN_STAGE_DURATION);
    }

    /// Normal enemy/gate spawning runs only outside boss phase
    pub fn spawning_allowed(&self) -> bool {
        self.is_playing() && !self.in_boss_phase
    }

    /// Advance the stage clock (lane mode only)
    pub fn update(&mut self, dt: f32, events: &mut EventQueue) -> StageProgress {
        let mut progress = StageProgress::default();
        if self.mode != GameMode::Lane || !self.is_playing() {
            return progress;
        }

        self.stage_timer += f64::from(dt);

        if self.boss_enabled && !self.boss_spawned {
            let boss_time = f64::from(self.stage_duration - self.boss_lead_time);
            if self.reached(boss_time) {
                self.boss_spawned = true;
                self.in_boss_phase = true;
                log::info!("Boss phase started!");
                events.push(GameEvent::BossPhaseStarted);
                progress.spawn_boss = true;
            }
        }

        // With a boss out, only its defeat ends the stage
        if !self.in_boss_phase && self.reached(f64::from(self.stage_duration)) {
            progress.won = self.trigger_win(events);
        }
        progress
    }

    fn reached(&self, deadline: f64) -> bool {
        self.stage_timer + TIME_EPSILON >= deadline
    }

    pub fn trigger_win(&mut self, events: &mut EventQueue) -> bool {
        if !self.is_playing() {
            return false;
        }
        self.state = GameState::Won;
        log::info!("WIN! Stage complete");
        events.sound(SoundCue::Victory);
        events.push(GameEvent::GameWon);
        true
    }

    pub fn trigger_lose(&mut self, reason: LoseReason, events: &mut EventQueue) -> bool {
        if !self.is_playing() {
            return false;
        }
        self.state = GameState::Lost;
        log::info!("LOSE! Game over ({:?})", reason);
        events.sound(SoundCue::GameOver);
        events.push(GameEvent::GameLost(reason));
        true
    }

    // === Legacy mode ===

    pub fn set_base_count(&mut self, total: usize) {
        self.total_bases = total;
        self.destroyed_bases = 0;
    }

    pub fn bases_remaining(&self) -> usize {
        self.total_bases.saturating_sub(self.destroyed_bases)
    }

    /// Spend one unit spawn. False when out of spawns or not playing.
    pub fn try_consume_spawn(&mut self, events: &mut EventQueue) -> bool {
        if !self.is_playing() || self.remaining_spawns == 0 {
            return false;
        }
        self.remaining_spawns -= 1;
        events.push(GameEvent::RemainingSpawnsChanged(self.remaining_spawns));
        if self.remaining_spawns == 0 {
            self.lose_check = Some(LOSE_CHECK_DELAY);
        }
        true
    }

    /// Returns true if this destroyed the last base and won the game
    pub fn on_enemy_base_destroyed(&mut self, events: &mut EventQueue) -> bool {
        self.destroyed_bases += 1;
        log::info!("Enemy base destroyed ({}/{})", self.destroyed_bases, self.total_bases);
        if self.destroyed_bases >= self.total_bases {
            return self.trigger_win(events);
        }
        false
    }

    /// Out-of-spawns watchdog: once spawns are gone, lose when no unit is
    /// left in the field and bases still stand
    pub fn update_lose_check(&mut self, dt: f32, active_units: usize, events: &mut EventQueue) -> bool {
        let Some(remaining) = self.lose_check else {
            return false;
        };
        if !self.is_playing() {
            self.lose_check = None;
            return false;
        }
        let remaining = remaining - dt;
        if remaining > 0.0 {
            self.lose_check = Some(remaining);
            return false;
        }
        if active_units > 0 {
            self.lose_check = Some(LOSE_CHECK_INTERVAL);
            return false;
        }
        self.lose_check = None;
        if self.bases_remaining() > 0 {
            return self.trigger_lose(LoseReason::OutOfUnits, events);
        }
        false
    }
}
