//! Player unit group, its gun and bullets

use glam::Vec2;

use super::collision::Aabb;
use super::events::{EventQueue, GameEvent, GroupFeedback};
use super::lanes::LaneSet;
use super::pool::Pool;
use crate::audio::SoundCue;
use crate::move_towards;

/// Snap distance when arriving at a lane
pub const ARRIVE_EPSILON: f32 = 0.01;
/// Duration of the gain pulse / loss flash
pub const FEEDBACK_DURATION: f32 = 0.2;
/// Formation visuals shown at most
pub const MAX_VISIBLE_UNITS: usize = 10;
const FORMATION_SPACING: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveState {
    Idle,
    Moving,
}

/// Result of changing the unit count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitsOutcome {
    pub count: u32,
    /// Group hit zero; the game must be lost
    pub lost: bool,
}

/// The player's army, represented as a single count in one lane
#[derive(Debug, Clone)]
pub struct PlayerUnitGroup {
    pub pos: Vec2,
    /// Collision box side length
    pub hitbox: f32,
    lane: usize,
    target: Vec2,
    state: MoveState,
    unit_count: u32,
    move_speed: f32,
    pulse_timer: f32,
    flash_timer: f32,
}

impl PlayerUnitGroup {
    pub fn new(lanes: &LaneSet, starting_lane: usize, y: f32, unit_count: u32, move_speed: f32) -> Self {
        let lane = if lanes.is_valid(starting_lane) { starting_lane } else { 0 };
        let pos = Vec2::new(lanes.lane_x(lane), y);
        Self {
            pos,
            hitbox: 1.0,
            lane,
            target: pos,
            state: MoveState::Idle,
            unit_count,
            move_speed,
            pulse_timer: 0.0,
            flash_timer: 0.0,
        }
    }

    /// Put the group back at its starting lane with a fresh count
    pub fn reset(&mut self, lanes: &LaneSet, starting_lane: usize, unit_count: u32) {
        let lane = if lanes.is_valid(starting_lane) { starting_lane } else { 0 };
        self.lane = lane;
        self.pos.x = lanes.lane_x(lane);
        self.target = self.pos;
        self.state = MoveState::Idle;
        self.unit_count = unit_count;
        self.pulse_timer = 0.0;
        self.flash_timer = 0.0;
    }

    pub fn lane(&self) -> usize {
        self.lane
    }

    pub fn unit_count(&self) -> u32 {
        self.unit_count
    }

    pub fn state(&self) -> MoveState {
        self.state
    }

    pub fn is_moving(&self) -> bool {
        self.state == MoveState::Moving
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::square(self.pos, self.hitbox)
    }

    /// Input handler: move unless already resting in that lane
    pub fn on_lane_tapped(&mut self, lane: usize, lanes: &LaneSet, events: &mut EventQueue) -> bool {
        if !lanes.is_valid(lane) {
            log::debug!("Ignoring tap on invalid lane {}", lane);
            return false;
        }
        if lane == self.lane && !self.is_moving() {
            return false;
        }
        self.move_to_lane(lane, lanes, events)
    }

    /// Retarget to `lane`. Returns true if the group just started moving.
    pub fn move_to_lane(&mut self, lane: usize, lanes: &LaneSet, events: &mut EventQueue) -> bool {
        self.lane = lane;
        self.target = Vec2::new(lanes.lane_x(lane), self.pos.y);
        if self.is_moving() {
            return false;
        }
        self.state = MoveState::Moving;
        events.push(GameEvent::PlayerStartedMoving { lane });
        log::debug!("Started moving to lane {}", lane);
        true
    }

    /// Step toward the target lane. Returns true on the tick of arrival.
    pub fn update(&mut self, dt: f32, events: &mut EventQueue) -> bool {
        self.pulse_timer = (self.pulse_timer - dt).max(0.0);
        self.flash_timer = (self.flash_timer - dt).max(0.0);

        if !self.is_moving() {
            return false;
        }
        self.pos = move_towards(self.pos, self.target, self.move_speed * dt);
        if self.pos.distance(self.target) < ARRIVE_EPSILON {
            self.pos = self.target;
            self.state = MoveState::Idle;
            events.push(GameEvent::PlayerArrived { lane: self.lane });
            log::debug!("Stopped moving. Now at lane {}", self.lane);
            return true;
        }
        false
    }

    /// Change the count by `delta`, flooring at zero
    pub fn add_units(&mut self, delta: i64, events: &mut EventQueue) -> UnitsOutcome {
        let count = (i64::from(self.unit_count) + delta).clamp(0, i64::from(u32::MAX)) as u32;
        self.unit_count = count;
        events.push(GameEvent::UnitCountChanged(count));
        log::debug!("Units changed: now {}", count);

        if delta > 0 {
            self.pulse_timer = FEEDBACK_DURATION;
            events.push(GameEvent::GroupFeedback(GroupFeedback::Pulse));
        } else if delta < 0 {
            self.flash_timer = FEEDBACK_DURATION;
            events.push(GameEvent::GroupFeedback(GroupFeedback::Flash));
        }
        UnitsOutcome {
            count,
            lost: count == 0,
        }
    }

    /// Render scale of the gain pulse (peaks at 1.3)
    pub fn pulse_scale(&self) -> f32 {
        if self.pulse_timer <= 0.0 {
            return 1.0;
        }
        let t = 1.0 - ((self.pulse_timer / FEEDBACK_DURATION) * 2.0 - 1.0).abs();
        crate::lerp(1.0, 1.3, t)
    }

    pub fn is_flashing(&self) -> bool {
        self.flash_timer > 0.0
    }

    /// Local offsets of the visible units, stacked in a triangle
    pub fn formation_offsets(&self) -> Vec<Vec2> {
        let shown = (self.unit_count as usize).min(MAX_VISIBLE_UNITS);
        let mut offsets = Vec::with_capacity(shown);
        let mut row = 0usize;
        let mut row_start = 0usize;
        for i in 0..shown {
            if i >= row_start + row + 1 {
                row_start += row + 1;
                row += 1;
            }
            let col = (i - row_start) as f32;
            let x = (col - row as f32 / 2.0) * FORMATION_SPACING;
            offsets.push(Vec2::new(x, row as f32 * FORMATION_SPACING));
        }
        offsets
    }
}

/// Volley timer and spread pattern
#[derive(Debug, Clone)]
pub struct Gun {
    pub fire_interval: f32,
    /// Timer after arriving in a lane
    pub refire_delay: f32,
    pub spread_step: f32,
    pub max_spread_units: u32,
    /// Bullets leave this far above the group
    pub muzzle_offset: f32,
    timer: f32,
}

impl Default for Gun {
    fn default() -> Self {
        Self::new(0.5, 0.2, 0.15, 5)
    }
}

impl Gun {
    pub fn new(fire_interval: f32, refire_delay: f32, spread_step: f32, max_spread_units: u32) -> Self {
        Self {
            fire_interval,
            refire_delay,
            spread_step,
            max_spread_units,
            muzzle_offset: 0.5,
            timer: 0.0,
        }
    }

    pub fn timer(&self) -> f32 {
        self.timer
    }

    pub fn reset(&mut self) {
        self.timer = 0.0;
    }

    pub fn on_started_moving(&mut self) {
        self.timer = 0.0;
    }

    pub fn on_arrived(&mut self) {
        self.timer = self.refire_delay;
    }

    /// Advance the timer; returns bullet spawn points when a volley fires
    pub fn update(&mut self, dt: f32, group: &PlayerUnitGroup) -> Option<Vec<Vec2>> {
        if group.is_moving() || group.unit_count() == 0 {
            return None;
        }
        self.timer -= dt;
        if self.timer > 0.0 {
            return None;
        }
        self.timer = self.fire_interval;
        Some(self.volley(group.pos + Vec2::Y * self.muzzle_offset, group.unit_count()))
    }

    /// One bullet per unit, spread evenly across a capped width
    pub fn volley(&self, origin: Vec2, count: u32) -> Vec<Vec2> {
        if count == 0 {
            return Vec::new();
        }
        let spread = (count - 1).min(self.max_spread_units) as f32 * self.spread_step;
        (0..count)
            .map(|i| {
                let x = if count > 1 {
                    crate::lerp(-spread, spread, i as f32 / (count - 1) as f32)
                } else {
                    0.0
                };
                origin + Vec2::new(x, 0.0)
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Bullet {
    pub pos: Vec2,
    pub damage: u32,
}

/// Upward-moving bullets fired by the group
#[derive(Debug, Clone)]
pub struct BulletSpawner {
    pub bullets: Pool<Bullet>,
    pub speed: f32,
    pub damage: u32,
    pub radius: f32,
    pub despawn_y: f32,
}

impl BulletSpawner {
    pub fn new(pool_size: usize, cap: Option<usize>, speed: f32, damage: u32, despawn_y: f32) -> Self {
        Self {
            bullets: Pool::new(pool_size, cap),
            speed,
            damage,
            radius: 0.1,
            despawn_y,
        }
    }

    /// Spawn a volley. Returns how many bullets actually spawned.
    pub fn fire(&mut self, positions: &[Vec2], events: &mut EventQueue) -> usize {
        events.sound(SoundCue::Shoot);
        let mut spawned = 0;
        for &pos in positions {
            let bullet = Bullet {
                pos,
                damage: self.damage,
            };
            if self.bullets.acquire(bullet).is_none() {
                log::debug!("Bullet pool full, dropping {} bullets", positions.len() - spawned);
                break;
            }
            spawned += 1;
        }
        spawned
    }

    pub fn update(&mut self, dt: f32) {
        let step = self.speed * dt;
        for (_, bullet) in self.bullets.iter_mut() {
            bullet.pos.y += step;
        }
        let despawn_y = self.despawn_y;
        self.bullets.release_where(|b| b.pos.y > despawn_y);
    }

    pub fn clear(&mut self) {
        self.bullets.release_all();
    }
}
