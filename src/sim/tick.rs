//! Fixed timestep simulation tick
//!
//! Core game loop that advances the world deterministically.

use glam::Vec2;

use super::collision::circle_aabb_overlap;
use super::events::GameEvent;
use super::gate::{GateKind, resolve_gate};
use super::world::World;
use crate::audio::SoundCue;
use crate::settings::GameMode;

/// How far above the group the autopilot looks for threats
const AUTOPILOT_HORIZON: f32 = 4.0;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Lane picked by a tap this tick
    pub lane_tapped: Option<usize>,
    /// Legacy mode: world point the cannon aims at
    pub cannon_aim: Option<Vec2>,
    /// Legacy mode: fire held
    pub cannon_firing: bool,
    /// Idle/demo mode - AI picks lanes
    pub idle_mode: bool,
}

/// Advance the world by one fixed timestep
pub fn tick(world: &mut World, input: &TickInput, dt: f32) {
    // Terminal states freeze the simulation
    if !world.game.is_playing() {
        return;
    }
    world.time_ticks += 1;

    match world.game.mode {
        GameMode::Lane => tick_lanes(world, input, dt),
        GameMode::Legacy => world.legacy.update(
            dt,
            input.cannon_aim,
            input.cannon_firing,
            &mut world.game,
            &mut world.rng,
            &mut world.events,
        ),
    }
}

fn tick_lanes(world: &mut World, input: &TickInput, dt: f32) {
    let tapped = if input.idle_mode {
        autopilot_lane(world)
    } else {
        input.lane_tapped
    };
    if let Some(lane) = tapped
        && world.group.on_lane_tapped(lane, &world.lanes, &mut world.events)
    {
        world.gun.on_started_moving();
    }

    world.coordinator.advance(dt);

    let progress = world.game.update(dt, &mut world.events);
    if progress.spawn_boss {
        let stage = world.stages.current_index() as u32 + 1;
        world.boss.spawn_boss(stage, &mut world.events);
    }
    if progress.won {
        world.on_stage_won();
        return;
    }

    // Spawners share the coordinator; each query/record pair completes
    // before the next spawner looks
    let allowed = world.game.spawning_allowed();
    {
        let mut area = super::spawner::SpawnArea {
            lanes: &world.lanes,
            coordinator: &mut world.coordinator,
            spawn_y: world.scroll.spawn_y,
        };
        world.enemies.update(dt, allowed, &mut area, &mut world.rng);
        world.gates.update(dt, allowed, &mut area, &mut world.rng);
    }

    world.enemies.scroll(&world.scroll, dt);
    world.gates.scroll(&world.scroll, dt);

    if world.group.update(dt, &mut world.events) {
        world.gun.on_arrived();
    }
    if let Some(volley) = world.gun.update(dt, &world.group) {
        world.bullets.fire(&volley, &mut world.events);
    }
    world.bullets.update(dt);
    world.boss.update(dt, &world.lanes, &mut world.rng, &mut world.events);

    let boss_defeated = resolve_bullet_hits(world);
    resolve_group_contacts(world);
    if !world.game.is_playing() {
        return;
    }
    resolve_gate_contacts(world);
    if !world.game.is_playing() {
        return;
    }

    if boss_defeated && world.game.trigger_win(&mut world.events) {
        world.on_stage_won();
    }
}

/// Bullets against enemies, then against the boss. Returns true when the
/// boss died this tick.
fn resolve_bullet_hits(world: &mut World) -> bool {
    let radius = world.bullets.radius;
    let mut boss_defeated = false;

    for handle in world.bullets.bullets.handles() {
        let Some(bullet) = world.bullets.bullets.get(handle).copied() else {
            continue;
        };

        let target = world
            .enemies
            .enemies
            .iter()
            .find(|(_, e)| circle_aabb_overlap(bullet.pos, radius, &e.bounds()))
            .map(|(h, _)| h);
        if let Some(enemy) = target {
            world.bullets.bullets.release(handle);
            world.events.push(GameEvent::HitSpark { pos: bullet.pos });
            world.events.sound(SoundCue::Hit);
            world.enemies.damage(enemy, bullet.damage, &mut world.events);
            continue;
        }

        if world.boss.is_active() && circle_aabb_overlap(bullet.pos, radius, &world.boss.bounds()) {
            world.bullets.bullets.release(handle);
            world.events.push(GameEvent::HitSpark { pos: bullet.pos });
            world.events.sound(SoundCue::Hit);
            if let Some(hit) = world.boss.damage(bullet.damage, &mut world.rng, &mut world.events) {
                boss_defeated |= hit.defeated;
            }
        }
    }
    boss_defeated
}

/// Enemies and boss projectiles reaching the group cost units. Stops at
/// the hit that loses the game.
fn resolve_group_contacts(world: &mut World) {
    let bounds = world.group.bounds();
    let damage = -i64::from(world.settings.collision_damage);

    let enemy_hits: Vec<_> = world
        .enemies
        .enemies
        .iter()
        .filter(|(_, e)| e.bounds().overlaps(&bounds))
        .map(|(h, e)| (h, e.pos))
        .collect();
    for (handle, pos) in enemy_hits {
        world.enemies.enemies.release(handle);
        log::debug!("Enemy hit the group");
        world.events.push(GameEvent::HitSpark { pos });
        world.events.sound(SoundCue::Hit);
        world.add_units(damage);
        if !world.game.is_playing() {
            return;
        }
    }

    let projectile_hits: Vec<_> = world
        .boss
        .projectiles
        .iter()
        .filter(|(_, p)| circle_aabb_overlap(p.pos, p.radius, &bounds))
        .map(|(h, p)| (h, p.pos))
        .collect();
    for (handle, pos) in projectile_hits {
        world.boss.projectiles.release(handle);
        log::debug!("Boss projectile hit the group");
        world.events.push(GameEvent::HitSpark { pos });
        world.events.sound(SoundCue::Hit);
        world.add_units(damage);
        if !world.game.is_playing() {
            return;
        }
    }
}

/// First contact consumes the gate
fn resolve_gate_contacts(world: &mut World) {
    let bounds = world.group.bounds();
    for handle in world.gates.gates.handles() {
        let Some(gate) = world.gates.gates.get_mut(handle) else {
            continue;
        };
        if !gate.bounds().overlaps(&bounds) {
            continue;
        }
        let resolution = resolve_gate(gate, &mut world.group, &mut world.events);
        world.gates.gates.release(handle);
        if resolution.is_some_and(|r| r.lost) {
            world
                .game
                .trigger_lose(super::events::LoseReason::UnitsDepleted, &mut world.events);
            return;
        }
    }
}

/// Pick the least dangerous lane within reach of the group
fn autopilot_lane(world: &World) -> Option<usize> {
    let group_y = world.group.pos.y;
    let in_view = |y: f32| y > group_y - 0.5 && y < group_y + AUTOPILOT_HORIZON;
    let mut danger = vec![0.0f32; world.lanes.count()];

    for (_, enemy) in world.enemies.enemies.iter() {
        if in_view(enemy.pos.y) {
            danger[enemy.lane] += 1.0 + enemy.health.current() as f32 * 0.1;
        }
    }
    for (_, projectile) in world.boss.projectiles.iter() {
        if in_view(projectile.pos.y) {
            danger[world.lanes.lane_from_world_x(projectile.pos.x)] += 5.0;
        }
    }
    for (_, gate) in world.gates.gates.iter() {
        if in_view(gate.pos.y) {
            danger[gate.lane] += match gate.kind {
                GateKind::Subtract => gate.value as f32,
                GateKind::Add => -(gate.value as f32),
                GateKind::Multiply => -(gate.value as f32) * 2.0,
            };
        }
    }

    let current = world.group.lane();
    let best = danger
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(lane, _)| lane)?;
    // Stay put on ties
    (danger[best] < danger[current]).then_some(best)
}
