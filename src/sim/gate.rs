//! Gate arithmetic
//!
//! Two flavours share the same operators:
//! - lane gates act once on the whole player group and are consumed
//! - field gates (legacy mode) stay put and spawn extra units for every unit
//!   passing through, once per unit

use std::collections::HashSet;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::Aabb;
use super::events::{EffectColor, EventQueue, GameEvent};
use super::player::PlayerUnitGroup;
use super::pool::Handle;
use crate::audio::SoundCue;

/// Seconds a field gate pulses after being passed
pub const GATE_PULSE_DURATION: f32 = 0.2;
/// Scale at the peak of a field gate pulse
pub const GATE_PULSE_SCALE: f32 = 1.2;
/// Popup height above the group
const POPUP_OFFSET: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum GateKind {
    #[default]
    Add,
    Subtract,
    Multiply,
}

impl GateKind {
    /// New unit count; may go negative, the caller clamps
    pub fn apply(self, current: i64, value: u32) -> i64 {
        let value = i64::from(value);
        match self {
            GateKind::Add => current.saturating_add(value),
            GateKind::Subtract => current.saturating_sub(value),
            GateKind::Multiply => current.saturating_mul(value),
        }
    }

    pub fn label(self, value: u32) -> String {
        match self {
            GateKind::Add => format!("+{}", value),
            GateKind::Subtract => format!("-{}", value),
            GateKind::Multiply => format!("x{}", value),
        }
    }

    pub fn color(self) -> EffectColor {
        match self {
            GateKind::Add => EffectColor::Positive,
            GateKind::Subtract => EffectColor::Negative,
            GateKind::Multiply => EffectColor::Multiplicative,
        }
    }

    pub fn sound(self) -> SoundCue {
        match self {
            GateKind::Add => SoundCue::GateAdd,
            GateKind::Subtract => SoundCue::GateSubtract,
            GateKind::Multiply => SoundCue::GateMultiply,
        }
    }

    /// Smallest value that still does something
    pub fn min_value(self) -> u32 {
        match self {
            GateKind::Add | GateKind::Subtract => 1,
            GateKind::Multiply => 2,
        }
    }
}

/// A scrolling gate in one lane
#[derive(Debug, Clone, Default)]
pub struct LaneGate {
    pub lane: usize,
    pub pos: Vec2,
    pub size: Vec2,
    pub kind: GateKind,
    pub value: u32,
    /// Set on first contact; the gate never fires again
    pub triggered: bool,
}

impl LaneGate {
    pub fn bounds(&self) -> Aabb {
        Aabb::new(self.pos, self.size)
    }

    pub fn label(&self) -> String {
        self.kind.label(self.value)
    }
}

/// What a lane gate did to the group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateResolution {
    pub before: u32,
    pub after: u32,
    pub delta: i64,
    /// Group was wiped out
    pub lost: bool,
}

/// Apply a lane gate to the player group
///
/// Returns None if the gate was already triggered. The caller releases the
/// gate back to its pool and routes `lost` to the game manager.
pub fn resolve_gate(
    gate: &mut LaneGate,
    group: &mut PlayerUnitGroup,
    events: &mut EventQueue,
) -> Option<GateResolution> {
    if gate.triggered {
        return None;
    }
    gate.triggered = true;

    let before = group.unit_count();
    let target = gate.kind.apply(i64::from(before), gate.value);
    log::debug!("Gate {}: {} -> {}", gate.label(), before, target);

    events.push(GameEvent::Flash {
        pos: gate.pos,
        color: gate.kind.color(),
    });
    events.push(GameEvent::NumberPopup {
        pos: group.pos + Vec2::Y * POPUP_OFFSET,
        text: gate.label(),
        color: gate.kind.color(),
    });
    events.sound(gate.kind.sound());

    let delta = target - i64::from(before);
    let outcome = group.add_units(delta, events);
    Some(GateResolution {
        before,
        after: outcome.count,
        delta,
        lost: outcome.lost,
    })
}

/// Extra units a field gate spawns for one passing unit
pub fn extra_units(kind: GateKind, value: u32) -> u32 {
    match kind {
        // The passing unit carries on, so xN adds N-1
        GateKind::Multiply => value.saturating_sub(1),
        GateKind::Add => value,
        GateKind::Subtract => 0,
    }
}

/// Stationary gate in the legacy field
#[derive(Debug, Clone, Default)]
pub struct FieldGate {
    pub pos: Vec2,
    pub size: Vec2,
    pub kind: GateKind,
    pub value: u32,
    /// Remaining pulse animation time
    pub pulse: f32,
}

impl FieldGate {
    pub fn new(pos: Vec2, size: Vec2, kind: GateKind, value: u32) -> Self {
        Self {
            pos,
            size,
            kind,
            value,
            pulse: 0.0,
        }
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::new(self.pos, self.size)
    }

    /// Current render scale of the pulse (1.0 at rest)
    pub fn pulse_scale(&self) -> f32 {
        if self.pulse <= 0.0 {
            return 1.0;
        }
        let half = GATE_PULSE_DURATION * 0.5;
        let elapsed = GATE_PULSE_DURATION - self.pulse;
        let t = if elapsed < half {
            elapsed / half
        } else {
            (GATE_PULSE_DURATION - elapsed) / half
        };
        crate::lerp(1.0, GATE_PULSE_SCALE, t.clamp(0.0, 1.0))
    }

    pub fn update(&mut self, dt: f32) {
        self.pulse = (self.pulse - dt).max(0.0);
    }
}

/// Let one unit pass a field gate
///
/// `passed` is the unit's gate history. Returns how many extra units to spawn,
/// or None if this unit already went through this gate. Restarts the pulse.
pub fn resolve_unit_gate(
    gate_handle: Handle,
    gate: &mut FieldGate,
    passed: &mut HashSet<Handle>,
) -> Option<u32> {
    if !passed.insert(gate_handle) {
        return None;
    }
    gate.pulse = GATE_PULSE_DURATION;
    Some(extra_units(gate.kind, gate.value))
}

/// Scatter offset for a unit spawned by a field gate
pub fn spawn_offset<R: Rng + ?Sized>(rng: &mut R) -> Vec2 {
    Vec2::new(rng.random_range(-0.3..0.3), 0.2)
}
