//! Stage boss: HP scaling, phase machine and projectile attacks

use glam::Vec2;
use rand::Rng;

use super::collision::Aabb;
use super::events::{EffectColor, EventQueue, GameEvent};
use super::health::{Health, HealthChange};
use super::lanes::LaneSet;
use super::pool::Pool;
use crate::audio::SoundCue;
use crate::consts::DESPAWN_Y;

/// Boss HP reached at stage 3; later stages grow linearly from here
const LATE_STAGE_BASE_HP: u32 = 150;
/// Explosions spawned around the boss on defeat
const DEFEAT_EXPLOSIONS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BossPhase {
    Inactive,
    /// Single-lane shots
    Phase1,
    /// Volleys leaving one safe lane
    Phase2,
    Defeated,
}

impl BossPhase {
    pub fn is_fighting(&self) -> bool {
        matches!(self, BossPhase::Phase1 | BossPhase::Phase2)
    }
}

#[derive(Debug, Clone)]
pub struct BossConfig {
    pub base_hp: u32,
    pub hp_per_stage: u32,
    pub spawn_y: f32,
    pub size: f32,
    /// Hit box width; spans every lane so each lane's volley can reach it
    pub hit_width: f32,
    pub initial_attack_delay: f32,
    pub phase1_interval: f32,
    pub phase2_interval: f32,
    pub projectile_speed: f32,
    pub projectile_radius: f32,
    pub projectile_pool_size: usize,
    pub despawn_y: f32,
}

impl Default for BossConfig {
    fn default() -> Self {
        Self {
            base_hp: 50,
            hp_per_stage: 50,
            spawn_y: 4.0,
            size: 1.5,
            hit_width: 1.5,
            initial_attack_delay: 1.0,
            phase1_interval: 3.0,
            phase2_interval: 2.0,
            projectile_speed: 5.0,
            projectile_radius: 0.12,
            projectile_pool_size: 10,
            despawn_y: DESPAWN_Y,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BossProjectile {
    pub pos: Vec2,
    pub speed: f32,
    pub radius: f32,
}

/// Outcome of one hit on the boss
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BossHit {
    pub change: HealthChange,
    /// This hit moved the boss into phase 2
    pub entered_phase2: bool,
    /// This hit killed the boss; the stage is won
    pub defeated: bool,
}

#[derive(Debug, Clone)]
pub struct BossSpawner {
    pub config: BossConfig,
    pub pos: Vec2,
    pub projectiles: Pool<BossProjectile>,
    health: Health,
    phase: BossPhase,
    attack_timer: f32,
}

impl BossSpawner {
    pub fn new(config: BossConfig) -> Self {
        let projectiles = Pool::new(config.projectile_pool_size, None);
        Self {
            pos: Vec2::new(0.0, config.spawn_y),
            config,
            projectiles,
            health: Health::default(),
            phase: BossPhase::Inactive,
            attack_timer: 0.0,
        }
    }

    pub fn phase(&self) -> BossPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase.is_fighting()
    }

    pub fn health(&self) -> &Health {
        &self.health
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::new(self.pos, Vec2::new(self.config.hit_width.max(self.config.size), self.config.size))
    }

    /// Boss HP for a 1-based stage number
    pub fn hp_for_stage(&self, stage: u32) -> u32 {
        let stage = if stage == 0 {
            log::warn!("Boss stage number 0 is invalid, using 1");
            1
        } else {
            stage
        };
        if stage <= 3 {
            self.config.base_hp.saturating_mul(stage)
        } else {
            LATE_STAGE_BASE_HP.saturating_add((stage - 3).saturating_mul(self.config.hp_per_stage))
        }
    }

    /// Bring the boss in. No-op while a boss is already fighting.
    pub fn spawn_boss(&mut self, stage: u32, events: &mut EventQueue) -> bool {
        if self.is_active() {
            log::warn!("Boss already exists!");
            return false;
        }
        let hp = self.hp_for_stage(stage);
        self.health.reset_with_hp(hp);
        self.pos = Vec2::new(0.0, self.config.spawn_y);
        self.phase = BossPhase::Phase1;
        self.attack_timer = self.config.initial_attack_delay;

        log::info!("Boss spawned for stage {} with HP: {}", stage, hp);
        events.sound(SoundCue::BossAppear);
        events.push(GameEvent::BossSpawned { stage, max_hp: hp });
        events.push(GameEvent::BossHpChanged { current: hp, max: hp });
        true
    }

    /// Apply damage. None if the boss is not fighting or already dead.
    pub fn damage<R: Rng + ?Sized>(
        &mut self,
        amount: u32,
        rng: &mut R,
        events: &mut EventQueue,
    ) -> Option<BossHit> {
        if !self.is_active() {
            return None;
        }
        let change = self.health.take_damage(amount)?;
        events.push(GameEvent::BossHpChanged {
            current: change.current,
            max: change.max,
        });

        let mut entered_phase2 = false;
        if self.phase == BossPhase::Phase1 && change.current.saturating_mul(2) <= change.max {
            self.phase = BossPhase::Phase2;
            entered_phase2 = true;
            events.push(GameEvent::BossPhaseChanged(2));
            log::info!("Boss entered Phase 2!");
        }

        if change.died {
            self.phase = BossPhase::Defeated;
            log::info!("Boss defeated!");
            for _ in 0..DEFEAT_EXPLOSIONS {
                let offset = Vec2::new(rng.random_range(-0.5..0.5), rng.random_range(-0.5..0.5));
                events.push(GameEvent::Explosion {
                    pos: self.pos + offset,
                    color: EffectColor::Explosion,
                });
            }
            events.sound(SoundCue::Explosion);
            events.push(GameEvent::BossDefeated);
        }

        Some(BossHit {
            change,
            entered_phase2,
            defeated: change.died,
        })
    }

    fn attack_interval(&self) -> f32 {
        match self.phase {
            BossPhase::Phase2 => self.config.phase2_interval,
            _ => self.config.phase1_interval,
        }
    }

    /// Run the attack timer and move projectiles
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        dt: f32,
        lanes: &LaneSet,
        rng: &mut R,
        events: &mut EventQueue,
    ) {
        for (_, projectile) in self.projectiles.iter_mut() {
            projectile.pos.y -= projectile.speed * dt;
        }
        let despawn_y = self.config.despawn_y;
        self.projectiles.release_where(|p| p.pos.y < despawn_y);

        if self.is_active() {
            self.attack_timer -= dt;
            if self.attack_timer <= 0.0 {
                self.attack(lanes, rng, events);
                self.attack_timer = self.attack_interval();
            }
        }
    }

    fn attack<R: Rng + ?Sized>(&mut self, lanes: &LaneSet, rng: &mut R, events: &mut EventQueue) {
        events.sound(SoundCue::BossAttack);
        match self.phase {
            BossPhase::Phase1 => {
                let lane = rng.random_range(0..lanes.count());
                self.fire_at(lane, lanes);
                log::debug!("Boss fired single shot at lane {}", lane);
            }
            BossPhase::Phase2 => {
                let safe = rng.random_range(0..lanes.count());
                for lane in (0..lanes.count()).filter(|&l| l != safe) {
                    self.fire_at(lane, lanes);
                }
                log::debug!("Boss fired volley, safe lane: {}", safe);
            }
            BossPhase::Inactive | BossPhase::Defeated => {}
        }
    }

    fn fire_at(&mut self, lane: usize, lanes: &LaneSet) {
        let projectile = BossProjectile {
            pos: Vec2::new(lanes.lane_x(lane), self.pos.y - 0.5),
            speed: self.config.projectile_speed,
            radius: self.config.projectile_radius,
        };
        if self.projectiles.acquire(projectile).is_none() {
            log::debug!("Boss projectile skipped: pool full");
        }
    }

    /// Remove the boss and every projectile
    pub fn deactivate(&mut self) {
        self.phase = BossPhase::Inactive;
        self.attack_timer = 0.0;
        self.projectiles.release_all();
    }
}
