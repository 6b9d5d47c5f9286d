//! Timed spawners for lane enemies and lane gates
//!
//! Each spawner owns its pool and a countdown. When the countdown runs out the
//! spawner asks the coordinator for a free lane; a blocked attempt is dropped
//! and the countdown restarts either way.

use glam::Vec2;
use rand::Rng;

use super::coordinator::SpawnCoordinator;
use super::events::{EffectColor, EventQueue, GameEvent};
use super::gate::{GateKind, LaneGate};
use super::health::{Health, HealthChange};
use super::lanes::LaneSet;
use super::pool::{Handle, Pool};
use super::scroll::{ScrollModel, Scrollable};
use super::stage::{GateWeights, StageError, ValueRange};
use crate::audio::SoundCue;
use crate::consts::MIN_SPAWN_INTERVAL;

/// Countdown that fires once per interval
#[derive(Debug, Clone)]
pub struct SpawnTimer {
    interval: f32,
    remaining: f32,
    pub enabled: bool,
}

impl SpawnTimer {
    pub fn new(initial_delay: f32, interval: f32) -> Self {
        let mut timer = Self {
            interval: MIN_SPAWN_INTERVAL,
            remaining: initial_delay,
            enabled: true,
        };
        timer.set_interval(interval);
        timer
    }

    pub fn interval(&self) -> f32 {
        self.interval
    }

    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    pub fn set_interval(&mut self, interval: f32) {
        if interval < MIN_SPAWN_INTERVAL {
            log::warn!(
                "Spawn interval {} below minimum, clamping to {}",
                interval,
                MIN_SPAWN_INTERVAL
            );
        }
        self.interval = interval.max(MIN_SPAWN_INTERVAL);
    }

    /// Restart the countdown from `delay`
    pub fn restart(&mut self, delay: f32) {
        self.remaining = delay;
    }

    /// Count down. Frozen while disabled or not `allowed`.
    pub fn update(&mut self, dt: f32, allowed: bool) -> bool {
        if !self.enabled || !allowed {
            return false;
        }
        self.remaining -= dt;
        if self.remaining <= 0.0 {
            self.remaining = self.interval;
            return true;
        }
        false
    }
}

/// Shared spawn surroundings: lane layout, coordinator and spawn line
pub struct SpawnArea<'a> {
    pub lanes: &'a LaneSet,
    pub coordinator: &'a mut SpawnCoordinator,
    pub spawn_y: f32,
}

impl SpawnArea<'_> {
    fn position(&self, lane: usize) -> Vec2 {
        Vec2::new(self.lanes.lane_x(lane), self.spawn_y)
    }
}

/// Enemy scrolling down a lane
#[derive(Debug, Clone, Default)]
pub struct LaneEnemy {
    pub lane: usize,
    pub pos: Vec2,
    pub size: f32,
    pub health: Health,
}

impl Scrollable for LaneEnemy {
    fn position_mut(&mut self) -> &mut Vec2 {
        &mut self.pos
    }
}

impl LaneEnemy {
    pub fn bounds(&self) -> super::collision::Aabb {
        super::collision::Aabb::square(self.pos, self.size)
    }
}

#[derive(Debug, Clone)]
pub struct EnemySpawner {
    pub enemies: Pool<LaneEnemy>,
    pub timer: SpawnTimer,
    pub enemy_size: f32,
    hp: ValueRange,
}

impl EnemySpawner {
    pub fn new(pool_size: usize, cap: Option<usize>, initial_delay: f32, interval: f32) -> Self {
        Self {
            enemies: Pool::new(pool_size, cap),
            timer: SpawnTimer::new(initial_delay, interval),
            enemy_size: 0.8,
            hp: ValueRange::new(5, 10),
        }
    }

    pub fn set_spawn_interval(&mut self, interval: f32) {
        self.timer.set_interval(interval);
    }

    pub fn hp_range(&self) -> ValueRange {
        self.hp
    }

    pub fn set_hp_range(&mut self, min: u32, max: u32) {
        let range = ValueRange::new(min, max).clamped(1);
        if range != ValueRange::new(min, max) {
            log::warn!("Enemy HP range {}..={} adjusted to {}..={}", min, max, range.min, range.max);
        }
        self.hp = range;
    }

    /// Tick the countdown and spawn when it fires
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        dt: f32,
        allowed: bool,
        area: &mut SpawnArea<'_>,
        rng: &mut R,
    ) -> Option<Handle> {
        if self.timer.update(dt, allowed) {
            self.spawn(area, rng)
        } else {
            None
        }
    }

    /// Spawn one enemy in a free lane with random HP
    pub fn spawn<R: Rng + ?Sized>(&mut self, area: &mut SpawnArea<'_>, rng: &mut R) -> Option<Handle> {
        let Some(lane) = area.coordinator.available_lane(area.spawn_y, rng) else {
            log::debug!("Enemy spawn skipped: no available lane");
            return None;
        };
        let hp = self.hp.sample(rng);
        self.spawn_at_lane(lane, hp, area)
    }

    /// Spawn an enemy in a given lane, bypassing the occupancy check
    pub fn spawn_at_lane(&mut self, lane: usize, hp: u32, area: &mut SpawnArea<'_>) -> Option<Handle> {
        if !area.lanes.is_valid(lane) {
            log::warn!("Cannot spawn enemy in invalid lane {}", lane);
            return None;
        }
        let enemy = LaneEnemy {
            lane,
            pos: area.position(lane),
            size: self.enemy_size,
            health: Health::new(hp),
        };
        let Some(handle) = self.enemies.acquire(enemy) else {
            log::debug!("Enemy spawn skipped: pool full");
            return None;
        };
        area.coordinator.record_spawn(lane, area.spawn_y);
        log::debug!("Enemy spawned: lane={}, hp={}", lane, hp);
        Some(handle)
    }

    /// Scroll enemies; those leaving the screen are recycled
    pub fn scroll(&mut self, scroll: &ScrollModel, dt: f32) -> Vec<Handle> {
        scroll.scroll_pool(&mut self.enemies, dt)
    }

    /// Damage an enemy; on death it explodes and returns to the pool
    pub fn damage(&mut self, handle: Handle, amount: u32, events: &mut EventQueue) -> Option<HealthChange> {
        let enemy = self.enemies.get_mut(handle)?;
        let change = enemy.health.take_damage(amount)?;
        if change.died {
            log::debug!("Enemy destroyed! Lane: {}", enemy.lane);
            events.push(GameEvent::Explosion {
                pos: enemy.pos,
                color: EffectColor::Explosion,
            });
            events.sound(SoundCue::Explosion);
            self.enemies.release(handle);
        }
        Some(change)
    }

    pub fn clear(&mut self) {
        self.enemies.release_all();
    }
}

impl Scrollable for LaneGate {
    fn position_mut(&mut self) -> &mut Vec2 {
        &mut self.pos
    }
}

#[derive(Debug, Clone)]
pub struct GateSpawner {
    pub gates: Pool<LaneGate>,
    pub timer: SpawnTimer,
    pub gate_size: Vec2,
    weights: GateWeights,
    add_values: ValueRange,
    subtract_values: ValueRange,
    multiply_values: ValueRange,
}

impl GateSpawner {
    pub fn new(pool_size: usize, cap: Option<usize>, initial_delay: f32, interval: f32) -> Self {
        Self {
            gates: Pool::new(pool_size, cap),
            timer: SpawnTimer::new(initial_delay, interval),
            gate_size: Vec2::new(1.5, 0.5),
            weights: GateWeights::default(),
            add_values: ValueRange::new(3, 10),
            subtract_values: ValueRange::new(2, 5),
            multiply_values: ValueRange::new(2, 3),
        }
    }

    pub fn set_spawn_interval(&mut self, interval: f32) {
        self.timer.set_interval(interval);
    }

    pub fn weights(&self) -> GateWeights {
        self.weights
    }

    /// Replace the type odds. All-zero weights are rejected and the old
    /// weights stay in place.
    pub fn set_type_weights(&mut self, add: u32, subtract: u32, multiply: u32) -> Result<(), StageError> {
        let weights = GateWeights::new(add, subtract, multiply);
        if weights.total() == 0 {
            log::warn!("Rejecting all-zero gate weights, keeping {:?}", self.weights);
            return Err(StageError::ZeroGateWeights);
        }
        self.weights = weights;
        Ok(())
    }

    pub fn value_range(&self, kind: GateKind) -> ValueRange {
        match kind {
            GateKind::Add => self.add_values,
            GateKind::Subtract => self.subtract_values,
            GateKind::Multiply => self.multiply_values,
        }
    }

    pub fn set_value_ranges(&mut self, add: ValueRange, subtract: ValueRange, multiply: ValueRange) {
        fn clamp(kind: GateKind, range: ValueRange) -> ValueRange {
            let clamped = range.clamped(kind.min_value());
            if clamped != range {
                log::warn!(
                    "{:?} gate range {}..={} adjusted to {}..={}",
                    kind,
                    range.min,
                    range.max,
                    clamped.min,
                    clamped.max
                );
            }
            clamped
        }
        self.add_values = clamp(GateKind::Add, add);
        self.subtract_values = clamp(GateKind::Subtract, subtract);
        self.multiply_values = clamp(GateKind::Multiply, multiply);
    }

    pub fn update<R: Rng + ?Sized>(
        &mut self,
        dt: f32,
        allowed: bool,
        area: &mut SpawnArea<'_>,
        rng: &mut R,
    ) -> Option<Handle> {
        if self.timer.update(dt, allowed) {
            self.spawn(area, rng)
        } else {
            None
        }
    }

    /// Spawn one weighted-random gate in a free lane
    pub fn spawn<R: Rng + ?Sized>(&mut self, area: &mut SpawnArea<'_>, rng: &mut R) -> Option<Handle> {
        let Some(lane) = area.coordinator.available_lane(area.spawn_y, rng) else {
            log::debug!("Gate spawn skipped: no available lane");
            return None;
        };
        let kind = self.weights.pick(rng)?;
        let value = self.value_range(kind).sample(rng);
        self.spawn_at_lane(lane, kind, value, area)
    }

    pub fn spawn_at_lane(
        &mut self,
        lane: usize,
        kind: GateKind,
        value: u32,
        area: &mut SpawnArea<'_>,
    ) -> Option<Handle> {
        if !area.lanes.is_valid(lane) {
            log::warn!("Cannot spawn gate in invalid lane {}", lane);
            return None;
        }
        let gate = LaneGate {
            lane,
            pos: area.position(lane),
            size: self.gate_size,
            kind,
            value,
            triggered: false,
        };
        let Some(handle) = self.gates.acquire(gate) else {
            log::debug!("Gate spawn skipped: pool full");
            return None;
        };
        area.coordinator.record_spawn(lane, area.spawn_y);
        log::debug!("Gate spawned: lane={}, type={:?}, value={}", lane, kind, value);
        Some(handle)
    }

    pub fn scroll(&mut self, scroll: &ScrollModel, dt: f32) -> Vec<Handle> {
        scroll.scroll_pool(&mut self.gates, dt)
    }

    pub fn clear(&mut self) {
        self.gates.release_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::coordinator::{DEFAULT_MIN_VERTICAL_DISTANCE, DEFAULT_TRACKING_DURATION};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn coordinator() -> SpawnCoordinator {
        SpawnCoordinator::new(2, DEFAULT_MIN_VERTICAL_DISTANCE, DEFAULT_TRACKING_DURATION)
    }

    #[test]
    fn test_timer_initial_delay_then_interval() {
        let mut timer = SpawnTimer::new(2.0, 4.0);
        assert!(!timer.update(1.5, true));
        assert!(timer.update(0.5, true));
        assert_eq!(timer.remaining(), 4.0);
        assert!(!timer.update(3.5, true));
        assert!(timer.update(0.5, true));
    }

    #[test]
    fn test_timer_frozen_when_not_allowed() {
        let mut timer = SpawnTimer::new(1.0, 1.0);
        assert!(!timer.update(5.0, false));
        assert_eq!(timer.remaining(), 1.0);
        timer.enabled = false;
        assert!(!timer.update(5.0, true));
        assert_eq!(timer.remaining(), 1.0);
    }

    #[test]
    fn test_interval_clamped() {
        let timer = SpawnTimer::new(0.0, 0.1);
        assert_eq!(timer.interval(), MIN_SPAWN_INTERVAL);
    }

    #[test]
    fn test_enemy_spawns_respect_coordinator() {
        let lanes = LaneSet::new(2, 2.0, 0.5);
        let mut coordinator = coordinator();
        let mut rng = Pcg32::seed_from_u64(5);
        let mut enemies = EnemySpawner::new(4, None, 0.0, 3.0);
        enemies.set_hp_range(3, 5);
        let mut area = SpawnArea {
            lanes: &lanes,
            coordinator: &mut coordinator,
            spawn_y: 7.0,
        };

        let a = enemies.spawn(&mut area, &mut rng).unwrap();
        let b = enemies.spawn(&mut area, &mut rng).unwrap();
        assert!(enemies.spawn(&mut area, &mut rng).is_none(), "both lanes blocked");

        let lane_a = enemies.enemies.get(a).unwrap().lane;
        let lane_b = enemies.enemies.get(b).unwrap().lane;
        assert_ne!(lane_a, lane_b);
        for (_, enemy) in enemies.enemies.iter() {
            assert!((3..=5).contains(&enemy.health.max()));
        }
    }

    #[test]
    fn test_enemy_death_releases_and_explodes() {
        let lanes = LaneSet::new(2, 2.0, 0.5);
        let mut coordinator = coordinator();
        let mut events = EventQueue::default();
        let mut enemies = EnemySpawner::new(1, None, 0.0, 3.0);
        let mut area = SpawnArea {
            lanes: &lanes,
            coordinator: &mut coordinator,
            spawn_y: 7.0,
        };
        let h = enemies.spawn_at_lane(1, 2, &mut area).unwrap();

        assert!(!enemies.damage(h, 1, &mut events).unwrap().died);
        assert!(enemies.damage(h, 1, &mut events).unwrap().died);
        assert!(!enemies.enemies.is_active(h));
        assert!(enemies.damage(h, 1, &mut events).is_none());
        assert_eq!(events.count(|e| *e == GameEvent::Sound(SoundCue::Explosion)), 1);
    }

    #[test]
    fn test_hp_range_clamped() {
        let mut enemies = EnemySpawner::new(0, None, 0.0, 3.0);
        enemies.set_hp_range(0, 0);
        assert_eq!(enemies.hp_range(), ValueRange::new(1, 1));
        enemies.set_hp_range(9, 4);
        assert_eq!(enemies.hp_range(), ValueRange::new(9, 9));
    }

    #[test]
    fn test_zero_weights_rejected() {
        let mut gates = GateSpawner::new(0, None, 0.0, 5.0);
        assert!(gates.set_type_weights(70, 20, 10).is_ok());
        assert_eq!(gates.set_type_weights(0, 0, 0), Err(StageError::ZeroGateWeights));
        assert_eq!(gates.weights(), GateWeights::new(70, 20, 10));
    }

    #[test]
    fn test_gate_values_in_range() {
        let lanes = LaneSet::new(2, 2.0, 0.5);
        let mut coordinator = coordinator();
        let mut rng = Pcg32::seed_from_u64(11);
        let mut gates = GateSpawner::new(0, None, 0.0, 5.0);
        gates.set_value_ranges(ValueRange::new(3, 5), ValueRange::new(1, 2), ValueRange::new(0, 1));
        assert_eq!(gates.value_range(GateKind::Multiply), ValueRange::new(2, 2));

        for _ in 0..40 {
            coordinator.clear_all();
            let mut area = SpawnArea {
                lanes: &lanes,
                coordinator: &mut coordinator,
                spawn_y: 7.0,
            };
            let h = gates.spawn(&mut area, &mut rng).unwrap();
            let gate = gates.gates.get(h).unwrap();
            assert!(gates.value_range(gate.kind).contains(gate.value));
            assert!(!gate.triggered);
        }
    }

    #[test]
    fn test_blocked_spawn_still_resets_timer() {
        let lanes = LaneSet::new(1, 2.0, 0.5);
        let mut coordinator = SpawnCoordinator::new(1, 2.0, 3.0);
        coordinator.record_spawn(0, 7.0);
        let mut rng = Pcg32::seed_from_u64(2);
        let mut gates = GateSpawner::new(0, None, 0.5, 5.0);
        let mut area = SpawnArea {
            lanes: &lanes,
            coordinator: &mut coordinator,
            spawn_y: 7.0,
        };
        assert!(gates.update(1.0, true, &mut area, &mut rng).is_none());
        assert_eq!(gates.timer.remaining(), 5.0);
        assert_eq!(gates.gates.active_count(), 0);
    }

    #[test]
    fn test_spawners_see_each_others_records_in_one_tick() {
        let lanes = LaneSet::new(2, 2.0, 0.5);
        let mut coordinator = coordinator();
        let mut rng = Pcg32::seed_from_u64(8);
        let mut enemies = EnemySpawner::new(4, None, 0.5, 3.0);
        let mut gates = GateSpawner::new(4, None, 0.5, 3.0);
        let mut area = SpawnArea {
            lanes: &lanes,
            coordinator: &mut coordinator,
            spawn_y: 7.0,
        };

        // Both timers fire on the same step, enemy spawner first
        let enemy = enemies.update(1.0, true, &mut area, &mut rng).unwrap();
        let gate = gates.update(1.0, true, &mut area, &mut rng).unwrap();
        let enemy_lane = enemies.enemies.get(enemy).unwrap().lane;
        let gate_lane = gates.gates.get(gate).unwrap().lane;
        assert_ne!(enemy_lane, gate_lane);
        assert_eq!(area.coordinator.record_count(), 2);

        // Every lane is now taken for either spawner
        assert!(enemies.spawn(&mut area, &mut rng).is_none());
        assert!(gates.spawn(&mut area, &mut rng).is_none());
    }

    #[test]
    fn test_enemy_record_blocks_gate_in_single_lane() {
        let lanes = LaneSet::new(1, 2.0, 0.5);
        let mut coordinator = SpawnCoordinator::new(1, 2.0, 3.0);
        let mut rng = Pcg32::seed_from_u64(4);
        let mut enemies = EnemySpawner::new(2, None, 0.5, 3.0);
        let mut gates = GateSpawner::new(2, None, 0.5, 3.0);
        let mut area = SpawnArea {
            lanes: &lanes,
            coordinator: &mut coordinator,
            spawn_y: 7.0,
        };

        assert!(enemies.update(1.0, true, &mut area, &mut rng).is_some());
        assert!(gates.update(1.0, true, &mut area, &mut rng).is_none());
        assert_eq!(gates.gates.active_count(), 0);
    }

    #[test]
    fn test_gates_scroll_off() {
        let lanes = LaneSet::new(2, 2.0, 0.5);
        let mut coordinator = coordinator();
        let scroll = ScrollModel::new(2.0, 7.0, -6.0);
        let mut gates = GateSpawner::new(0, None, 0.0, 5.0);
        let mut area = SpawnArea {
            lanes: &lanes,
            coordinator: &mut coordinator,
            spawn_y: 7.0,
        };
        let h = gates.spawn_at_lane(0, GateKind::Add, 3, &mut area).unwrap();
        assert!(gates.scroll(&scroll, 6.0).is_empty());
        assert_eq!(gates.scroll(&scroll, 0.6), vec![h]);
    }
}
