//! Lane Runner headless entry point
//!
//! Runs every stage with the autopilot at a fixed frame rate and logs what
//! the collaborators would have been told.
//!
//! Usage: `lane-runner [seed] [settings.json]`

use std::path::Path;

use glam::Vec2;

use lane_runner::consts::*;
use lane_runner::platform::{EffectsSink, UiSink, dispatch};
use lane_runner::sim::events::{EffectColor, LoseReason};
use lane_runner::sim::{TickInput, World, tick};
use lane_runner::{AudioManager, Settings};

/// Simulated display refresh
const FRAME_DT: f32 = 1.0 / 30.0;
/// Give up on a stage after this long
const STAGE_TIMEOUT_SECS: f32 = 600.0;

/// Effects that only show up in the log
struct LogEffects;

impl EffectsSink for LogEffects {
    fn play_explosion(&mut self, pos: Vec2, color: EffectColor) {
        log::trace!("explosion at ({:.2}, {:.2}) {:?}", pos.x, pos.y, color);
    }

    fn play_hit_spark(&mut self, pos: Vec2) {
        log::trace!("hit spark at ({:.2}, {:.2})", pos.x, pos.y);
    }

    fn play_flash(&mut self, pos: Vec2, color: EffectColor) {
        log::trace!("flash at ({:.2}, {:.2}) {:?}", pos.x, pos.y, color);
    }

    fn show_number_popup(&mut self, _pos: Vec2, text: &str, _color: EffectColor) {
        log::debug!("popup {}", text);
    }
}

/// HUD stand-in
#[derive(Default)]
struct LogUi {
    units: u32,
    won: bool,
    lost: Option<LoseReason>,
}

impl UiSink for LogUi {
    fn unit_count_changed(&mut self, count: u32) {
        self.units = count;
    }

    fn stage_changed(&mut self, stage: usize, name: &str) {
        log::info!("== Stage {}: {} ==", stage, name);
    }

    fn boss_hp_changed(&mut self, current: u32, max: u32) {
        log::debug!("boss hp {}/{}", current, max);
    }

    fn boss_phase_started(&mut self) {
        log::info!("Boss incoming");
    }

    fn game_won(&mut self) {
        self.won = true;
    }

    fn game_lost(&mut self, reason: LoseReason) {
        self.lost = Some(reason);
    }
}

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let seed = args
        .next()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0x1a4e_5eed);
    let settings = match args.next() {
        Some(path) => Settings::load(Path::new(&path)),
        None => Settings::default(),
    };

    log::info!("Lane Runner (headless) starting with seed {}", seed);

    let mut audio = AudioManager::from_settings(&settings);
    let mut world = World::new(settings, seed);
    let mut effects = LogEffects;
    let mut ui = LogUi::default();

    let input = TickInput {
        idle_mode: true,
        ..Default::default()
    };

    let mut accumulator = 0.0;
    let mut stage_clock = 0.0;
    loop {
        accumulator += FRAME_DT;
        let mut substeps = 0;
        while accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            tick(&mut world, &input, SIM_DT);
            accumulator -= SIM_DT;
            substeps += 1;
        }
        stage_clock += FRAME_DT;

        let events = world.drain_events();
        let finished = events
            .iter()
            .any(|e| matches!(e, lane_runner::sim::GameEvent::CampaignComplete));
        dispatch(&events, &mut audio, &mut effects, &mut ui);
        audio.drain();

        if let Some(reason) = ui.lost {
            log::info!(
                "Run over on stage {} ({:?}) after {} ticks",
                world.stages.current_index() + 1,
                reason,
                world.time_ticks
            );
            break;
        }
        if finished {
            log::info!(
                "Campaign complete with {} units after {} ticks",
                ui.units,
                world.time_ticks
            );
            break;
        }
        if ui.won {
            // Next stage was applied on the win; start it fresh
            ui.won = false;
            stage_clock = 0.0;
            audio.resume_music();
            world.initialize_game();
        }
        if stage_clock > STAGE_TIMEOUT_SECS {
            log::warn!("Stage timed out, stopping");
            break;
        }
    }
}
