//! Simulation context
//!
//! Owns one instance of every manager and hands out references explicitly.
//! Stage changes and full resets go through here so that every spawner,
//! pool and timer is updated in one place.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::boss::{BossConfig, BossSpawner};
use super::coordinator::SpawnCoordinator;
use super::events::{EventQueue, GameEvent, LoseReason};
use super::game::GameManager;
use super::lanes::LaneSet;
use super::legacy::LegacyField;
use super::player::{BulletSpawner, Gun, PlayerUnitGroup, UnitsOutcome};
use super::scroll::ScrollModel;
use super::spawner::{EnemySpawner, GateSpawner};
use super::stage::{StageConfig, StageManager};
use crate::settings::Settings;

#[derive(Debug, Clone)]
pub struct World {
    pub settings: Settings,
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub events: EventQueue,
    pub scroll: ScrollModel,
    pub lanes: LaneSet,
    pub coordinator: SpawnCoordinator,
    pub stages: StageManager,
    pub game: GameManager,
    pub group: PlayerUnitGroup,
    pub gun: Gun,
    pub bullets: BulletSpawner,
    pub enemies: EnemySpawner,
    pub gates: GateSpawner,
    pub boss: BossSpawner,
    pub legacy: LegacyField,
    /// Simulation tick counter
    pub time_ticks: u64,
}

impl World {
    /// Build a world from settings, apply the first stage and start playing
    pub fn new(settings: Settings, seed: u64) -> Self {
        let settings = settings.sanitized();
        let lanes = LaneSet::new(settings.lane_count, settings.lane_width, settings.lane_spacing);
        // Intervals are overwritten by the first stage below
        let defaults = StageConfig::default();

        let mut enemies = EnemySpawner::new(
            settings.initial_pool_size,
            settings.entity_pool_cap,
            settings.enemy_initial_delay,
            defaults.enemy_spawn_interval,
        );
        enemies.enemy_size = settings.enemy_size;

        let mut gates = GateSpawner::new(
            settings.initial_pool_size,
            settings.entity_pool_cap,
            settings.gate_initial_delay,
            defaults.gate_spawn_interval,
        );
        gates.gate_size = Vec2::new(settings.gate_width, settings.gate_height);

        let boss = BossSpawner::new(BossConfig {
            base_hp: settings.boss_base_hp,
            hp_per_stage: settings.boss_hp_per_stage,
            spawn_y: settings.boss_spawn_y,
            size: settings.boss_size,
            hit_width: lane_span(&lanes),
            initial_attack_delay: settings.boss_initial_attack_delay,
            phase1_interval: settings.boss_phase1_interval,
            phase2_interval: settings.boss_phase2_interval,
            projectile_speed: settings.boss_projectile_speed,
            projectile_radius: settings.boss_projectile_radius,
            projectile_pool_size: settings.boss_projectile_pool_size,
            despawn_y: settings.despawn_y,
        });

        let mut group = PlayerUnitGroup::new(
            &lanes,
            settings.starting_lane,
            settings.player_y,
            settings.initial_unit_count,
            settings.player_move_speed,
        );
        group.hitbox = settings.player_hitbox;

        let mut world = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            events: EventQueue::default(),
            scroll: ScrollModel::new(settings.base_scroll_speed, settings.spawn_y, settings.despawn_y),
            coordinator: SpawnCoordinator::new(
                lanes.count(),
                settings.min_vertical_distance,
                settings.tracking_duration,
            ),
            stages: StageManager::new(settings.stages.clone(), settings.auto_progress_stages),
            game: GameManager::new(&settings),
            gun: Gun::new(
                settings.fire_interval,
                settings.refire_delay,
                settings.spread_step,
                settings.max_spread_units,
            ),
            bullets: BulletSpawner::new(
                settings.bullet_pool_size,
                settings.bullet_pool_cap,
                settings.bullet_speed,
                settings.bullet_damage,
                settings.bullet_despawn_y,
            ),
            legacy: LegacyField::new(&settings),
            lanes,
            group,
            enemies,
            gates,
            boss,
            settings,
            time_ticks: 0,
        };

        world.apply_stage(0);
        world.initialize_game();
        world
    }

    /// Full reset back to Playing. Stage config stays as applied.
    pub fn initialize_game(&mut self) {
        self.game.initialize_game(&mut self.events);

        self.group.reset(
            &self.lanes,
            self.settings.starting_lane,
            self.settings.initial_unit_count,
        );
        self.events
            .push(GameEvent::UnitCountChanged(self.group.unit_count()));
        self.gun.reset();

        self.bullets.clear();
        self.enemies.clear();
        self.gates.clear();
        self.boss.deactivate();
        self.coordinator.clear_all();
        self.enemies.timer.restart(self.settings.enemy_initial_delay);
        self.gates.timer.restart(self.settings.gate_initial_delay);

        self.legacy.reset();
        self.game.set_base_count(self.legacy.bases.len());

        log::info!("Game initialized ({} mode)", self.game.mode.as_str());
    }

    /// Select a stage by 0-based index and push its config everywhere.
    /// Invalid indices warn and change nothing.
    pub fn apply_stage(&mut self, index: usize) -> bool {
        let Some(stage) = self.stages.select(index).cloned() else {
            return false;
        };
        self.apply_config(&stage);
        true
    }

    /// Advance to the next stage. False when already on the last one.
    pub fn next_stage(&mut self) -> bool {
        let Some(stage) = self.stages.next_stage().cloned() else {
            return false;
        };
        self.apply_config(&stage);
        true
    }

    pub fn reset_to_first_stage(&mut self) {
        let stage = self.stages.reset_to_first_stage().clone();
        self.apply_config(&stage);
    }

    fn apply_config(&mut self, stage: &StageConfig) {
        self.scroll.set_base_speed(stage.scroll_speed);
        self.game.set_stage_duration(stage.duration);

        self.enemies.set_spawn_interval(stage.enemy_spawn_interval);
        self.enemies.set_hp_range(stage.enemy_hp.min, stage.enemy_hp.max);

        self.gates.set_spawn_interval(stage.gate_spawn_interval);
        let weights = stage.gate_weights;
        if let Err(e) = self
            .gates
            .set_type_weights(weights.add, weights.subtract, weights.multiply)
        {
            log::warn!("Stage '{}' gate weights rejected: {}", stage.name, e);
        }
        self.gates
            .set_value_ranges(stage.add_values, stage.subtract_values, stage.multiply_values);

        self.coordinator.clear_all();

        let number = self.stages.current_index() + 1;
        log::info!("Stage {} applied: {}", number, stage.name);
        self.events.push(GameEvent::StageChanged {
            stage: number,
            name: stage.name.clone(),
        });
    }

    /// Change the group's unit count; hitting zero loses the game
    pub fn add_units(&mut self, delta: i64) -> UnitsOutcome {
        let outcome = self.group.add_units(delta, &mut self.events);
        if outcome.lost {
            self.game
                .trigger_lose(LoseReason::UnitsDepleted, &mut self.events);
        }
        outcome
    }

    /// Stage won: move on, or report the campaign as finished
    pub fn on_stage_won(&mut self) {
        if !self.stages.auto_progress {
            return;
        }
        if self.stages.has_next() {
            self.next_stage();
        } else {
            log::info!("All stages cleared!");
            self.events.push(GameEvent::CampaignComplete);
        }
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.events.drain()
    }
}

/// Width covering every lane edge to edge
fn lane_span(lanes: &LaneSet) -> f32 {
    match (lanes.positions().first(), lanes.positions().last()) {
        (Some(first), Some(last)) => last - first + lanes.width(),
        _ => lanes.width(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::game::GameState;

    #[test]
    fn test_apply_stage_pushes_exact_values() {
        let mut world = World::new(Settings::default(), 1);
        for index in 0..world.stages.total_stages() {
            assert!(world.apply_stage(index));
            let stage = world.stages.current().clone();
            assert_eq!(world.scroll.base_speed(), stage.scroll_speed);
            assert_eq!(world.game.stage_duration(), stage.duration);
            assert_eq!(world.enemies.timer.interval(), stage.enemy_spawn_interval);
            assert_eq!(world.gates.timer.interval(), stage.gate_spawn_interval);
            assert_eq!(world.enemies.hp_range(), stage.enemy_hp);
            assert_eq!(world.gates.weights(), stage.gate_weights);
            assert_eq!(world.coordinator.record_count(), 0);
        }
    }

    #[test]
    fn test_invalid_stage_index_keeps_current() {
        let mut world = World::new(Settings::default(), 1);
        world.apply_stage(1);
        world.drain_events();
        assert!(!world.apply_stage(99));
        assert_eq!(world.stages.current_index(), 1);
        assert!(world.events.is_empty());
    }

    #[test]
    fn test_stage_changed_is_one_based() {
        let mut world = World::new(Settings::default(), 1);
        world.drain_events();
        assert!(world.next_stage());
        let events = world.drain_events();
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::StageChanged { stage: 2, .. }
        )));
    }

    #[test]
    fn test_add_units_floors_and_loses() {
        let mut world = World::new(Settings::default(), 1);
        let outcome = world.add_units(-1000);
        assert_eq!(outcome.count, 0);
        assert!(outcome.lost);
        assert_eq!(world.game.state(), GameState::Lost);
    }

    #[test]
    fn test_initialize_game_clears_everything() {
        let mut world = World::new(Settings::default(), 1);
        world.boss.spawn_boss(1, &mut world.events);
        world.boss.projectiles.acquire(crate::sim::boss::BossProjectile {
            pos: Vec2::new(0.0, 3.0),
            speed: 4.0,
            radius: 0.2,
        });
        {
            let mut area = crate::sim::spawner::SpawnArea {
                lanes: &world.lanes,
                coordinator: &mut world.coordinator,
                spawn_y: 7.0,
            };
            world.enemies.spawn_at_lane(0, 5, &mut area);
            world.gates.spawn_at_lane(1, crate::sim::gate::GateKind::Add, 2, &mut area);
        }
        world.bullets.fire(&[Vec2::new(0.0, -3.0), Vec2::new(0.5, -3.0)], &mut world.events);
        assert_eq!(world.enemies.enemies.active_count(), 1);
        assert_eq!(world.gates.gates.active_count(), 1);
        assert_eq!(world.bullets.bullets.active_count(), 2);
        world.add_units(-1000);

        world.initialize_game();
        assert!(world.game.is_playing());
        assert!(!world.boss.is_active());
        assert_eq!(world.boss.projectiles.active_count(), 0);
        assert_eq!(world.enemies.enemies.active_count(), 0);
        assert_eq!(world.gates.gates.active_count(), 0);
        assert_eq!(world.bullets.bullets.active_count(), 0);
        assert_eq!(world.coordinator.record_count(), 0);
        assert_eq!(world.group.unit_count(), world.settings.initial_unit_count);
    }

    #[test]
    fn test_huge_gate_weights_from_json() {
        let json = r#"{ "stages": [{ "gate_weights": { "add": 4294967295, "subtract": 1, "multiply": 0 } }] }"#;
        let settings = Settings::from_json(json).unwrap();
        let mut world = World::new(settings, 1);
        assert_eq!(
            world.gates.weights(),
            crate::sim::stage::GateWeights::new(u32::MAX, 1, 0)
        );

        let mut area = crate::sim::spawner::SpawnArea {
            lanes: &world.lanes,
            coordinator: &mut world.coordinator,
            spawn_y: 7.0,
        };
        assert!(world.gates.spawn(&mut area, &mut world.rng).is_some());
    }

    #[test]
    fn test_boss_hit_box_spans_lanes() {
        let world = World::new(Settings::default(), 1);
        let bounds = world.boss.bounds();
        for &x in world.lanes.positions() {
            assert!(bounds.contains(Vec2::new(x, bounds.center.y)));
        }
    }
}
