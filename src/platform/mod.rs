//! Platform abstraction layer
//!
//! The simulation never calls out to collaborators directly. Each frame the
//! host drains the world's event queue and hands it to `dispatch`, which
//! fans events out to whatever audio, effects and UI implementations the
//! host provides. Input goes the other way through `LaneInput`.

use glam::Vec2;

use crate::audio::SoundCue;
use crate::sim::events::{EffectColor, GameEvent, LoseReason};
use crate::sim::lanes::{LaneSet, ScreenCamera};

/// Sound playback
pub trait AudioSink {
    fn play_sound(&mut self, cue: SoundCue);
}

/// Particle and popup effects
pub trait EffectsSink {
    fn play_explosion(&mut self, pos: Vec2, color: EffectColor);
    fn play_hit_spark(&mut self, pos: Vec2);
    fn play_flash(&mut self, pos: Vec2, color: EffectColor);
    fn show_number_popup(&mut self, pos: Vec2, text: &str, color: EffectColor);
}

/// HUD change notifications. Everything defaults to a no-op.
pub trait UiSink {
    fn unit_count_changed(&mut self, _count: u32) {}
    fn remaining_spawns_changed(&mut self, _remaining: u32) {}
    /// `stage` is 1-based
    fn stage_changed(&mut self, _stage: usize, _name: &str) {}
    fn boss_hp_changed(&mut self, _current: u32, _max: u32) {}
    fn boss_phase_started(&mut self) {}
    fn game_won(&mut self) {}
    fn game_lost(&mut self, _reason: LoseReason) {}
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl AudioSink for NullSink {
    fn play_sound(&mut self, _cue: SoundCue) {}
}

impl EffectsSink for NullSink {
    fn play_explosion(&mut self, _pos: Vec2, _color: EffectColor) {}
    fn play_hit_spark(&mut self, _pos: Vec2) {}
    fn play_flash(&mut self, _pos: Vec2, _color: EffectColor) {}
    fn show_number_popup(&mut self, _pos: Vec2, _text: &str, _color: EffectColor) {}
}

impl UiSink for NullSink {}

/// Route drained events to collaborators.
///
/// Gameplay notifications (movement, boss internals) have no collaborator
/// and are skipped here; hosts that care can inspect the events directly.
pub fn dispatch(
    events: &[GameEvent],
    audio: &mut dyn AudioSink,
    effects: &mut dyn EffectsSink,
    ui: &mut dyn UiSink,
) {
    for event in events {
        match event {
            GameEvent::Sound(cue) => audio.play_sound(*cue),
            GameEvent::Explosion { pos, color } => effects.play_explosion(*pos, *color),
            GameEvent::HitSpark { pos } => effects.play_hit_spark(*pos),
            GameEvent::Flash { pos, color } => effects.play_flash(*pos, *color),
            GameEvent::NumberPopup { pos, text, color } => {
                effects.show_number_popup(*pos, text, *color)
            }
            GameEvent::UnitCountChanged(count) => ui.unit_count_changed(*count),
            GameEvent::RemainingSpawnsChanged(remaining) => ui.remaining_spawns_changed(*remaining),
            GameEvent::StageChanged { stage, name } => ui.stage_changed(*stage, name),
            GameEvent::BossHpChanged { current, max } => ui.boss_hp_changed(*current, *max),
            GameEvent::BossPhaseStarted => ui.boss_phase_started(),
            GameEvent::GameWon => ui.game_won(),
            GameEvent::GameLost(reason) => ui.game_lost(*reason),
            GameEvent::GroupFeedback(_)
            | GameEvent::PlayerStartedMoving { .. }
            | GameEvent::PlayerArrived { .. }
            | GameEvent::BossSpawned { .. }
            | GameEvent::BossPhaseChanged(_)
            | GameEvent::BossDefeated
            | GameEvent::CampaignComplete => {}
        }
    }
}

/// Turns raw screen taps into lane-tapped events
#[derive(Debug, Clone)]
pub struct LaneInput {
    pub camera: ScreenCamera,
    pending: Option<usize>,
}

impl LaneInput {
    pub fn new(camera: ScreenCamera) -> Self {
        Self {
            camera,
            pending: None,
        }
    }

    /// Record a tap at horizontal screen pixel `screen_x`. The last tap in a
    /// frame wins.
    pub fn on_tap(&mut self, screen_x: f32, lanes: &LaneSet) -> usize {
        let lane = lanes.lane_from_screen_x(screen_x, &self.camera);
        log::debug!("Tap at x={} -> lane {}", screen_x, lane);
        self.pending = Some(lane);
        lane
    }

    /// One-shot: the tap is consumed by the next tick
    pub fn take(&mut self) -> Option<usize> {
        self.pending.take()
    }
}
