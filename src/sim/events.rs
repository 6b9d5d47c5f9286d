//! Notifications emitted by the simulation
//!
//! The core never calls collaborators directly. Every tick appends to an event
//! queue that the host drains and routes (see `platform::dispatch`).

use glam::Vec2;

use crate::audio::SoundCue;

/// Semantic colour category; collaborators pick the actual colour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectColor {
    /// Green: unit gain
    Positive,
    /// Red: unit loss
    Negative,
    /// Gold: multiplication
    Multiplicative,
    /// Orange-red fireball
    Explosion,
    White,
}

/// Short feedback animation on the player group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupFeedback {
    /// Scale pulse when units are gained
    Pulse,
    /// Red flash when units are lost
    Flash,
}

/// Why the run was lost
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoseReason {
    /// Player unit count reached zero
    UnitsDepleted,
    /// A descending enemy crossed the bottom boundary
    EnemyReachedBottom,
    /// Legacy mode: out of spawns with bases still standing
    OutOfUnits,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    // === Audio ===
    Sound(SoundCue),

    // === Effects ===
    Explosion { pos: Vec2, color: EffectColor },
    HitSpark { pos: Vec2 },
    Flash { pos: Vec2, color: EffectColor },
    NumberPopup { pos: Vec2, text: String, color: EffectColor },
    GroupFeedback(GroupFeedback),

    // === UI change events ===
    UnitCountChanged(u32),
    RemainingSpawnsChanged(u32),
    /// 1-based stage number and display name
    StageChanged { stage: usize, name: String },
    BossHpChanged { current: u32, max: u32 },
    BossPhaseStarted,
    GameWon,
    GameLost(LoseReason),

    // === Gameplay notifications ===
    PlayerStartedMoving { lane: usize },
    PlayerArrived { lane: usize },
    BossSpawned { stage: u32, max_hp: u32 },
    BossPhaseChanged(u8),
    BossDefeated,
    /// Won the final stage
    CampaignComplete,
}

/// Append-only queue drained once per frame by the host
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: Vec<GameEvent>,
}

impl EventQueue {
    pub fn push(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn sound(&mut self, cue: SoundCue) {
        self.events.push(GameEvent::Sound(cue));
    }

    pub fn drain(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn as_slice(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Count events matching `pred` (mostly for tests and diagnostics)
    pub fn count(&self, pred: impl Fn(&GameEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}
