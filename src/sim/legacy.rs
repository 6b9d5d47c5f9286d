//! Legacy field mode
//!
//! The older ruleset: a cannon at the bottom fires individual units at enemy
//! bases. Field gates multiply units passing through them, descending enemies
//! trade 1:1 with units, and the run ends when every base falls, an enemy
//! reaches the bottom, or the spawn budget runs dry.

use std::collections::HashSet;

use glam::Vec2;
use rand::Rng;

use super::collision::{Aabb, circle_aabb_overlap, crossed_downward};
use super::events::{EffectColor, EventQueue, GameEvent, LoseReason};
use super::game::GameManager;
use super::gate::{FieldGate, GateKind, resolve_unit_gate, spawn_offset};
use super::health::Health;
use super::pool::{Handle, Pool};
use crate::audio::SoundCue;
use crate::settings::Settings;

/// Units leave the field beyond these bounds
const UNIT_DESPAWN_X: f32 = 10.0;
const UNIT_DESPAWN_Y: f32 = 6.0;
/// Descending enemies crossing this line lose the game
const ENEMY_BOTTOM_Y: f32 = -6.0;
const UNIT_RADIUS: f32 = 0.15;
const ENEMY_SIZE: f32 = 0.5;
/// Horizontal jitter of cannon shots and enemy spawns
const CANNON_JITTER: f32 = 0.2;
const ENEMY_JITTER: f32 = 0.5;
const BASE_HIT_FLASH: f32 = 0.1;

#[derive(Debug, Clone)]
pub struct Unit {
    pub pos: Vec2,
    pub dir: Vec2,
    /// Field gates this unit already went through
    pub passed: HashSet<Handle>,
}

impl Default for Unit {
    fn default() -> Self {
        Self {
            pos: Vec2::ZERO,
            dir: Vec2::Y,
            passed: HashSet::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DescendingEnemy {
    pub pos: Vec2,
}

impl DescendingEnemy {
    pub fn bounds(&self) -> Aabb {
        Aabb::square(self.pos, ENEMY_SIZE)
    }
}

#[derive(Debug, Clone)]
pub struct EnemyBase {
    pub pos: Vec2,
    pub size: Vec2,
    pub health: Health,
    /// Remaining hit flash time
    pub flash: f32,
}

impl EnemyBase {
    pub fn new(pos: Vec2, size: Vec2, hp: u32) -> Self {
        Self {
            pos,
            size,
            health: Health::new(hp),
            flash: 0.0,
        }
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::new(self.pos, self.size)
    }

    pub fn is_destroyed(&self) -> bool {
        self.health.is_dead()
    }
}

/// Launcher at the bottom of the field
#[derive(Debug, Clone)]
pub struct Cannon {
    pub pos: Vec2,
    aim: Vec2,
    interval: f32,
    timer: f32,
}

impl Cannon {
    pub fn new(pos: Vec2, spawn_rate: f32) -> Self {
        let interval = 1.0 / spawn_rate.max(0.1);
        Self {
            pos,
            aim: Vec2::Y,
            interval,
            // Ready to fire on the first press
            timer: interval,
        }
    }

    pub fn aim(&self) -> Vec2 {
        self.aim
    }

    /// Point at `target` (world space). Straight up when degenerate.
    pub fn aim_at(&mut self, target: Vec2) {
        self.aim = (target - self.pos).try_normalize().unwrap_or(Vec2::Y);
    }

    /// Returns the number of shots due this tick
    pub fn update(&mut self, dt: f32, firing: bool) -> u32 {
        if !firing {
            self.timer = self.interval;
            return 0;
        }
        self.timer += dt;
        if self.timer >= self.interval {
            self.timer = 0.0;
            1
        } else {
            0
        }
    }
}

/// Everything on the legacy playfield
#[derive(Debug, Clone)]
pub struct LegacyField {
    pub cannon: Cannon,
    pub units: Pool<Unit>,
    pub enemies: Pool<DescendingEnemy>,
    pub gates: Pool<FieldGate>,
    pub bases: Vec<EnemyBase>,
    pub unit_speed: f32,
    pub enemy_speed: f32,
    pub enemy_spawn: Vec2,
    enemy_interval: f32,
    enemy_initial_delay: f32,
    enemy_timer: f32,
}

impl LegacyField {
    pub fn new(settings: &Settings) -> Self {
        let mut field = Self {
            cannon: Cannon::new(Vec2::new(0.0, -5.0), settings.unit_spawn_rate),
            units: Pool::new(0, Some(settings.unit_pool_cap)),
            enemies: Pool::new(settings.initial_pool_size, None),
            gates: Pool::new(0, None),
            bases: Vec::new(),
            unit_speed: settings.unit_speed,
            enemy_speed: settings.legacy_enemy_speed,
            enemy_spawn: Vec2::new(0.0, settings.spawn_y - 1.0),
            enemy_interval: settings.legacy_enemy_interval,
            enemy_initial_delay: settings.legacy_enemy_initial_delay,
            enemy_timer: 0.0,
        };
        field.reset();
        field
    }

    /// Default layout: two bases at the top, a multiplier and an adder midfield
    pub fn reset(&mut self) {
        self.units.release_all();
        self.enemies.release_all();
        self.gates.release_all();
        self.bases = vec![
            EnemyBase::new(Vec2::new(-1.5, 4.5), Vec2::new(1.5, 0.8), 20),
            EnemyBase::new(Vec2::new(1.5, 4.5), Vec2::new(1.5, 0.8), 20),
        ];
        let gate_size = Vec2::new(1.5, 0.5);
        self.gates
            .acquire(FieldGate::new(Vec2::new(-1.5, -1.0), gate_size, GateKind::Multiply, 2));
        self.gates
            .acquire(FieldGate::new(Vec2::new(1.5, 0.5), gate_size, GateKind::Add, 3));
        self.enemy_timer = self.enemy_interval - self.enemy_initial_delay;
        self.cannon.timer = self.cannon.interval;
    }

    pub fn bases_remaining(&self) -> usize {
        self.bases.iter().filter(|b| !b.is_destroyed()).count()
    }

    /// Launch one unit along `dir`, pre-marked with `from_gate` if given
    pub fn spawn_unit(&mut self, pos: Vec2, dir: Vec2, from_gate: Option<Handle>) -> Option<Handle> {
        let mut passed = HashSet::new();
        if let Some(gate) = from_gate {
            passed.insert(gate);
        }
        let unit = Unit {
            pos,
            dir: dir.try_normalize().unwrap_or(Vec2::Y),
            passed,
        };
        let handle = self.units.acquire(unit);
        if handle.is_none() {
            log::debug!("Unit spawn skipped: pool full");
        }
        handle
    }

    /// One fixed step of the legacy rules
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        dt: f32,
        aim: Option<Vec2>,
        firing: bool,
        game: &mut GameManager,
        rng: &mut R,
        events: &mut EventQueue,
    ) {
        if let Some(target) = aim {
            self.cannon.aim_at(target);
        }
        for _ in 0..self.cannon.update(dt, firing) {
            if !game.try_consume_spawn(events) {
                break;
            }
            let jitter = Vec2::new(rng.random_range(-CANNON_JITTER..CANNON_JITTER), 0.0);
            self.spawn_unit(self.cannon.pos + jitter, self.cannon.aim(), None);
        }

        self.enemy_timer += dt;
        if self.enemy_timer >= self.enemy_interval {
            self.enemy_timer = 0.0;
            let x = self.enemy_spawn.x + rng.random_range(-ENEMY_JITTER..ENEMY_JITTER);
            self.enemies.acquire(DescendingEnemy {
                pos: Vec2::new(x, self.enemy_spawn.y),
            });
        }

        self.move_entities(dt, game, events);
        self.resolve_gates(rng);
        self.resolve_enemy_contacts(events);
        self.resolve_base_hits(game, events);

        for base in &mut self.bases {
            base.flash = (base.flash - dt).max(0.0);
        }
        for (_, gate) in self.gates.iter_mut() {
            gate.update(dt);
        }

        game.update_lose_check(dt, self.units.active_count(), events);
    }

    fn move_entities(&mut self, dt: f32, game: &mut GameManager, events: &mut EventQueue) {
        let step = self.unit_speed * dt;
        for (_, unit) in self.units.iter_mut() {
            unit.pos += unit.dir * step;
        }
        self.units.release_where(|u| {
            u.pos.x.abs() > UNIT_DESPAWN_X || u.pos.y.abs() > UNIT_DESPAWN_Y
        });

        let step = self.enemy_speed * dt;
        let mut reached_bottom = false;
        for (_, enemy) in self.enemies.iter_mut() {
            let prev = enemy.pos.y;
            enemy.pos.y -= step;
            reached_bottom |= crossed_downward(prev, enemy.pos.y, ENEMY_BOTTOM_Y);
        }
        self.enemies.release_where(|e| e.pos.y < ENEMY_BOTTOM_Y);
        if reached_bottom {
            log::info!("Enemy reached the bottom!");
            game.trigger_lose(LoseReason::EnemyReachedBottom, events);
        }
    }

    fn resolve_gates<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let mut extras: Vec<(Vec2, Vec2, Handle)> = Vec::new();
        for gate_handle in self.gates.handles() {
            let Some(gate) = self.gates.get_mut(gate_handle) else {
                continue;
            };
            let bounds = gate.bounds();
            for (_, unit) in self.units.iter_mut() {
                if !circle_aabb_overlap(unit.pos, UNIT_RADIUS, &bounds) {
                    continue;
                }
                if let Some(count) = resolve_unit_gate(gate_handle, gate, &mut unit.passed) {
                    for _ in 0..count {
                        extras.push((unit.pos + spawn_offset(rng), unit.dir, gate_handle));
                    }
                }
            }
        }
        for (pos, dir, gate) in extras {
            if self.spawn_unit(pos, dir, Some(gate)).is_none() {
                break;
            }
        }
    }

    fn resolve_enemy_contacts(&mut self, events: &mut EventQueue) {
        for enemy_handle in self.enemies.handles() {
            let Some(bounds) = self.enemies.get(enemy_handle).map(|e| e.bounds()) else {
                continue;
            };
            let hit = self
                .units
                .iter()
                .find(|(_, u)| circle_aabb_overlap(u.pos, UNIT_RADIUS, &bounds))
                .map(|(h, _)| h);
            if let Some(unit_handle) = hit {
                self.units.release(unit_handle);
                self.enemies.release(enemy_handle);
                events.push(GameEvent::HitSpark { pos: bounds.center });
            }
        }
    }

    fn resolve_base_hits(&mut self, game: &mut GameManager, events: &mut EventQueue) {
        for base in &mut self.bases {
            if base.is_destroyed() {
                continue;
            }
            let bounds = base.bounds();
            let hits = self
                .units
                .release_where(|u| circle_aabb_overlap(u.pos, UNIT_RADIUS, &bounds));
            for _ in &hits {
                let Some(change) = base.health.take_damage(1) else {
                    break;
                };
                base.flash = BASE_HIT_FLASH;
                if change.died {
                    events.push(GameEvent::Explosion {
                        pos: base.pos,
                        color: EffectColor::Explosion,
                    });
                    events.sound(SoundCue::Explosion);
                    game.on_enemy_base_destroyed(events);
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::GameMode;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn setup() -> (LegacyField, GameManager, Pcg32, EventQueue) {
        let settings = Settings {
            mode: GameMode::Legacy,
            ..Settings::default()
        };
        let field = LegacyField::new(&settings);
        let mut game = GameManager::new(&settings);
        game.set_base_count(field.bases.len());
        (field, game, Pcg32::seed_from_u64(4), EventQueue::default())
    }

    #[test]
    fn test_cannon_rate() {
        let mut cannon = Cannon::new(Vec2::ZERO, 8.0);
        assert_eq!(cannon.update(0.0625, true), 1, "first press fires at once");
        let mut shots = 0;
        for _ in 0..10 {
            shots += cannon.update(0.0625, true);
        }
        assert_eq!(shots, 5);
        cannon.update(0.0625, false);
        assert_eq!(cannon.update(0.0625, true), 1);
    }

    #[test]
    fn test_firing_consumes_spawns() {
        let (mut field, mut game, mut rng, mut events) = setup();
        field.update(0.01, None, true, &mut game, &mut rng, &mut events);
        assert_eq!(game.remaining_spawns(), 29);
        assert_eq!(field.units.active_count(), 1);
    }

    #[test]
    fn test_unit_and_enemy_annihilate() {
        let (mut field, mut game, mut rng, mut events) = setup();
        field.gates.release_all();
        field.spawn_unit(Vec2::new(3.0, 0.0), Vec2::Y, None);
        field.enemies.acquire(DescendingEnemy {
            pos: Vec2::new(3.0, 0.1),
        });
        field.update(0.01, None, false, &mut game, &mut rng, &mut events);
        assert_eq!(field.units.active_count(), 0);
        assert_eq!(field.enemies.active_count(), 0);
        assert!(game.is_playing());
    }

    #[test]
    fn test_enemy_reaching_bottom_loses() {
        let (mut field, mut game, mut rng, mut events) = setup();
        field.enemies.acquire(DescendingEnemy {
            pos: Vec2::new(5.0, -5.95),
        });
        field.update(0.05, None, false, &mut game, &mut rng, &mut events);
        assert!(events.as_slice().contains(&GameEvent::GameLost(LoseReason::EnemyReachedBottom)));
    }

    #[test]
    fn test_multiply_gate_spawns_marked_units() {
        let (mut field, mut game, mut rng, mut events) = setup();
        // Unit sitting inside the x2 gate
        let gate_pos = Vec2::new(-1.5, -1.0);
        field.spawn_unit(gate_pos, Vec2::Y, None);
        field.update(0.001, None, false, &mut game, &mut rng, &mut events);
        assert_eq!(field.units.active_count(), 2);

        // Both are marked; another pass spawns nothing
        field.update(0.001, None, false, &mut game, &mut rng, &mut events);
        assert_eq!(field.units.active_count(), 2);
        for (_, unit) in field.units.iter() {
            assert_eq!(unit.passed.len(), 1);
        }
    }

    #[test]
    fn test_destroying_bases_wins() {
        let (mut field, mut game, mut rng, mut events) = setup();
        for base in &mut field.bases {
            base.health.reset_with_hp(1);
        }
        let targets: Vec<Vec2> = field.bases.iter().map(|b| b.pos).collect();
        for pos in targets {
            field.spawn_unit(pos, Vec2::Y, None);
        }
        field.update(0.001, None, false, &mut game, &mut rng, &mut events);
        assert_eq!(field.bases_remaining(), 0);
        assert!(events.as_slice().contains(&GameEvent::GameWon));
    }

    #[test]
    fn test_out_of_spawns_loses() {
        let settings = Settings {
            mode: GameMode::Legacy,
            starting_spawn_count: 1,
            ..Settings::default()
        };
        let mut field = LegacyField::new(&settings);
        field.gates.release_all();
        let mut game = GameManager::new(&settings);
        game.set_base_count(field.bases.len());
        let mut rng = Pcg32::seed_from_u64(1);
        let mut events = EventQueue::default();

        // Aim sideways so the unit leaves the field quickly
        field.update(0.01, Some(Vec2::new(10.0, -5.0)), true, &mut game, &mut rng, &mut events);
        assert_eq!(game.remaining_spawns(), 0);
        for _ in 0..12 {
            field.update(0.25, None, false, &mut game, &mut rng, &mut events);
        }
        assert!(events.as_slice().contains(&GameEvent::GameLost(LoseReason::OutOfUnits)));
    }
}
