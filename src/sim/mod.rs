//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (pool slot order)
//! - No rendering or platform dependencies; collaborators read `GameEvent`s

pub mod boss;
pub mod collision;
pub mod coordinator;
pub mod events;
pub mod game;
pub mod gate;
pub mod health;
pub mod lanes;
pub mod legacy;
pub mod player;
pub mod pool;
pub mod scroll;
pub mod spawner;
pub mod stage;
pub mod tick;
pub mod world;

pub use boss::{BossConfig, BossPhase, BossSpawner};
pub use coordinator::SpawnCoordinator;
pub use events::{EffectColor, EventQueue, GameEvent, GroupFeedback, LoseReason};
pub use game::{GameManager, GameState};
pub use gate::{GateKind, LaneGate, resolve_gate};
pub use health::Health;
pub use lanes::{LaneSet, ScreenCamera};
pub use player::{Gun, MoveState, PlayerUnitGroup};
pub use pool::{Handle, Pool};
pub use scroll::ScrollModel;
pub use spawner::{EnemySpawner, GateSpawner, SpawnTimer};
pub use stage::{StageConfig, StageError, StageManager};
pub use tick::{TickInput, tick};
pub use world::World;
