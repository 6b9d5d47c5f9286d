//! Stage configuration and progression
//!
//! A stage is an immutable bundle of difficulty knobs. The manager only tracks
//! which one is current; `World::apply_stage` pushes the values into the
//! scroll model, game manager and spawners.

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::gate::GateKind;

/// Invalid stage configuration
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StageError {
    #[error("gate weights must contain at least one positive value")]
    ZeroGateWeights,
    #[error("stage name must not be empty")]
    EmptyStageName,
    #[error("stage duration must be positive (got {0})")]
    NonPositiveDuration(f32),
    #[error("{which} spawn interval must be positive (got {value})")]
    NonPositiveInterval { which: &'static str, value: f32 },
}

/// Inclusive integer range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: u32,
    pub max: u32,
}

impl ValueRange {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Raise `min` to `floor` and `max` to at least `min`
    pub fn clamped(self, floor: u32) -> Self {
        let min = self.min.max(floor);
        Self {
            min,
            max: self.max.max(min),
        }
    }

    pub fn contains(&self, value: u32) -> bool {
        (self.min..=self.max).contains(&value)
    }

    /// Uniform draw from `[min, max]`
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        if self.max <= self.min {
            self.min
        } else {
            rng.random_range(self.min..=self.max)
        }
    }
}

/// Relative odds of each gate type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateWeights {
    pub add: u32,
    pub subtract: u32,
    pub multiply: u32,
}

impl Default for GateWeights {
    fn default() -> Self {
        Self {
            add: 50,
            subtract: 30,
            multiply: 20,
        }
    }
}

impl GateWeights {
    pub const fn new(add: u32, subtract: u32, multiply: u32) -> Self {
        Self {
            add,
            subtract,
            multiply,
        }
    }

    /// Sum of all weights. Widened so arbitrary u32 weights cannot overflow.
    pub fn total(&self) -> u64 {
        u64::from(self.add) + u64::from(self.subtract) + u64::from(self.multiply)
    }

    /// Weighted categorical draw. None when every weight is zero.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<GateKind> {
        let total = self.total();
        if total == 0 {
            return None;
        }
        let roll = rng.random_range(0..total);
        let add = u64::from(self.add);
        Some(if roll < add {
            GateKind::Add
        } else if roll < add + u64::from(self.subtract) {
            GateKind::Subtract
        } else {
            GateKind::Multiply
        })
    }
}

/// Difficulty settings for one stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    pub name: String,
    /// Seconds until the stage is won (boss stages end on boss defeat instead)
    pub duration: f32,
    pub scroll_speed: f32,

    pub enemy_spawn_interval: f32,
    pub enemy_hp: ValueRange,

    pub gate_spawn_interval: f32,
    pub gate_weights: GateWeights,
    pub add_values: ValueRange,
    pub subtract_values: ValueRange,
    pub multiply_values: ValueRange,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            name: "Stage 1".to_string(),
            duration: 30.0,
            scroll_speed: 3.0,
            enemy_spawn_interval: 3.0,
            enemy_hp: ValueRange::new(5, 10),
            gate_spawn_interval: 5.0,
            gate_weights: GateWeights::default(),
            add_values: ValueRange::new(3, 10),
            subtract_values: ValueRange::new(2, 5),
            multiply_values: ValueRange::new(2, 3),
        }
    }
}

impl StageConfig {
    /// Gentle first stage: mostly additive gates, weak enemies
    pub fn tutorial() -> Self {
        Self {
            name: "Stage 1".to_string(),
            duration: 30.0,
            scroll_speed: 2.0,
            enemy_spawn_interval: 4.0,
            enemy_hp: ValueRange::new(3, 5),
            gate_spawn_interval: 6.0,
            gate_weights: GateWeights::new(70, 20, 10),
            add_values: ValueRange::new(3, 5),
            subtract_values: ValueRange::new(1, 2),
            multiply_values: ValueRange::new(2, 2),
        }
    }

    pub fn stage2() -> Self {
        Self {
            name: "Stage 2".to_string(),
            duration: 45.0,
            scroll_speed: 3.0,
            enemy_spawn_interval: 3.0,
            enemy_hp: ValueRange::new(5, 10),
            gate_spawn_interval: 5.0,
            gate_weights: GateWeights::new(50, 30, 20),
            add_values: ValueRange::new(3, 8),
            subtract_values: ValueRange::new(2, 4),
            multiply_values: ValueRange::new(2, 3),
        }
    }

    pub fn stage3() -> Self {
        Self {
            name: "Stage 3".to_string(),
            duration: 60.0,
            scroll_speed: 4.0,
            enemy_spawn_interval: 2.5,
            enemy_hp: ValueRange::new(8, 15),
            gate_spawn_interval: 4.0,
            gate_weights: GateWeights::new(40, 40, 20),
            add_values: ValueRange::new(5, 10),
            subtract_values: ValueRange::new(3, 6),
            multiply_values: ValueRange::new(2, 3),
        }
    }

    pub fn builtin() -> Vec<Self> {
        vec![Self::tutorial(), Self::stage2(), Self::stage3()]
    }

    /// Reject configurations that cannot be run at all
    ///
    /// Out-of-range but usable values (short intervals, inverted ranges) are
    /// not errors; the receivers clamp them when the stage is applied.
    pub fn validate(&self) -> Result<(), StageError> {
        if self.name.trim().is_empty() {
            return Err(StageError::EmptyStageName);
        }
        if self.duration.is_nan() || self.duration <= 0.0 {
            return Err(StageError::NonPositiveDuration(self.duration));
        }
        for (which, value) in [
            ("enemy", self.enemy_spawn_interval),
            ("gate", self.gate_spawn_interval),
        ] {
            if value.is_nan() || value <= 0.0 {
                return Err(StageError::NonPositiveInterval { which, value });
            }
        }
        if self.gate_weights.total() == 0 {
            return Err(StageError::ZeroGateWeights);
        }
        Ok(())
    }
}

/// Ordered stage list with a cursor
#[derive(Debug, Clone)]
pub struct StageManager {
    stages: Vec<StageConfig>,
    current: usize,
    /// Advance to the next stage automatically after a win
    pub auto_progress: bool,
}

impl Default for StageManager {
    fn default() -> Self {
        Self::new(Vec::new(), true)
    }
}

impl StageManager {
    /// Build from a custom list; invalid entries are dropped, and an empty
    /// result falls back to the built-in stages
    pub fn new(stages: Vec<StageConfig>, auto_progress: bool) -> Self {
        let mut valid = Vec::with_capacity(stages.len());
        for stage in stages {
            match stage.validate() {
                Ok(()) => valid.push(stage),
                Err(e) => log::warn!("Skipping stage '{}': {}", stage.name, e),
            }
        }
        if valid.is_empty() {
            valid = StageConfig::builtin();
        }
        Self {
            stages: valid,
            current: 0,
            auto_progress,
        }
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> &StageConfig {
        &self.stages[self.current]
    }

    pub fn get(&self, index: usize) -> Option<&StageConfig> {
        self.stages.get(index)
    }

    pub fn total_stages(&self) -> usize {
        self.stages.len()
    }

    pub fn has_next(&self) -> bool {
        self.current + 1 < self.stages.len()
    }

    /// Append a stage after validating it
    pub fn add_stage(&mut self, stage: StageConfig) -> Result<(), StageError> {
        stage.validate()?;
        log::info!("Added stage '{}'", stage.name);
        self.stages.push(stage);
        Ok(())
    }

    /// Move the cursor. Invalid indices warn and leave it unchanged.
    pub fn select(&mut self, index: usize) -> Option<&StageConfig> {
        if index >= self.stages.len() {
            log::warn!("Invalid stage index: {}", index);
            return None;
        }
        self.current = index;
        Some(&self.stages[index])
    }

    pub fn next_stage(&mut self) -> Option<&StageConfig> {
        if !self.has_next() {
            log::info!("All stages complete");
            return None;
        }
        self.select(self.current + 1)
    }

    pub fn reset_to_first_stage(&mut self) -> &StageConfig {
        self.current = 0;
        &self.stages[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_builtin_stages_are_valid() {
        let stages = StageConfig::builtin();
        assert_eq!(stages.len(), 3);
        for stage in &stages {
            assert!(stage.validate().is_ok(), "{} invalid", stage.name);
        }
        assert_eq!(stages[0].gate_weights, GateWeights::new(70, 20, 10));
        assert_eq!(stages[2].enemy_hp, ValueRange::new(8, 15));
    }

    #[test]
    fn test_validate_rejects_zero_weights() {
        let stage = StageConfig {
            gate_weights: GateWeights::new(0, 0, 0),
            ..StageConfig::tutorial()
        };
        assert_eq!(stage.validate(), Err(StageError::ZeroGateWeights));

        let stage = StageConfig {
            gate_spawn_interval: 0.0,
            ..StageConfig::tutorial()
        };
        assert!(matches!(
            stage.validate(),
            Err(StageError::NonPositiveInterval { which: "gate", .. })
        ));
    }

    #[test]
    fn test_weighted_pick_respects_zero_weights() {
        let mut rng = Pcg32::seed_from_u64(1);
        let only_mul = GateWeights::new(0, 0, 5);
        for _ in 0..50 {
            assert_eq!(only_mul.pick(&mut rng), Some(GateKind::Multiply));
        }
        assert_eq!(GateWeights::new(0, 0, 0).pick(&mut rng), None);
    }

    #[test]
    fn test_weights_near_u32_max() {
        let mut rng = Pcg32::seed_from_u64(6);
        let weights = GateWeights::new(u32::MAX, 1, u32::MAX);
        assert_eq!(weights.total(), 2 * u64::from(u32::MAX) + 1);
        for _ in 0..50 {
            assert!(weights.pick(&mut rng).is_some());
        }
        let stage = StageConfig {
            gate_weights: weights,
            ..StageConfig::tutorial()
        };
        assert_eq!(stage.validate(), Ok(()));
    }

    #[test]
    fn test_weighted_pick_distribution() {
        let mut rng = Pcg32::seed_from_u64(9);
        let weights = GateWeights::new(70, 20, 10);
        let mut adds = 0;
        for _ in 0..1000 {
            if weights.pick(&mut rng) == Some(GateKind::Add) {
                adds += 1;
            }
        }
        assert!((600..800).contains(&adds), "adds = {}", adds);
    }

    #[test]
    fn test_value_range() {
        let mut rng = Pcg32::seed_from_u64(3);
        let range = ValueRange::new(3, 5);
        for _ in 0..100 {
            assert!(range.contains(range.sample(&mut rng)));
        }
        assert_eq!(ValueRange::new(0, 0).clamped(1), ValueRange::new(1, 1));
        assert_eq!(ValueRange::new(6, 2).clamped(2), ValueRange::new(6, 6));
    }

    #[test]
    fn test_manager_navigation() {
        let mut manager = StageManager::default();
        assert_eq!(manager.total_stages(), 3);
        assert_eq!(manager.current().name, "Stage 1");

        assert!(manager.select(7).is_none());
        assert_eq!(manager.current_index(), 0);

        assert_eq!(manager.next_stage().map(|s| s.duration), Some(45.0));
        assert_eq!(manager.next_stage().map(|s| s.duration), Some(60.0));
        assert!(manager.next_stage().is_none());
        assert_eq!(manager.current_index(), 2);

        manager.reset_to_first_stage();
        assert_eq!(manager.current_index(), 0);
    }

    #[test]
    fn test_add_stage_validates() {
        let mut manager = StageManager::default();
        let bad = StageConfig {
            name: String::new(),
            ..StageConfig::default()
        };
        assert_eq!(manager.add_stage(bad), Err(StageError::EmptyStageName));
        assert!(manager.add_stage(StageConfig::default()).is_ok());
        assert_eq!(manager.total_stages(), 4);
    }

    #[test]
    fn test_custom_list_drops_invalid() {
        let custom = vec![
            StageConfig {
                gate_weights: GateWeights::new(0, 0, 0),
                ..StageConfig::default()
            },
            StageConfig::stage3(),
        ];
        let manager = StageManager::new(custom, false);
        assert_eq!(manager.total_stages(), 1);
        assert_eq!(manager.current().name, "Stage 3");
    }
}
