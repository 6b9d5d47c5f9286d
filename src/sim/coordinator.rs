//! Spawn deconfliction between independently timed spawners
//!
//! Keeps a sliding window of recent spawns per lane. A lane is blocked at a
//! given Y while any record younger than `tracking_duration` sits within
//! `min_vertical_distance` of it.

use rand::Rng;

/// Default minimum vertical gap between spawns in the same lane
pub const DEFAULT_MIN_VERTICAL_DISTANCE: f32 = 2.0;
/// Default lifetime of a spawn record (seconds)
pub const DEFAULT_TRACKING_DURATION: f32 = 3.0;

/// One recent spawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnRecord {
    pub lane: usize,
    pub y: f32,
    /// Coordinator clock at the time of the spawn
    pub timestamp: f64,
}

#[derive(Debug, Clone)]
pub struct SpawnCoordinator {
    min_vertical_distance: f32,
    tracking_duration: f32,
    /// Per-lane record lists, indexed by lane
    records: Vec<Vec<SpawnRecord>>,
    /// Kept in f64 so long runs of small steps do not drift
    now: f64,
}

impl SpawnCoordinator {
    pub fn new(lane_count: usize, min_vertical_distance: f32, tracking_duration: f32) -> Self {
        Self {
            min_vertical_distance,
            tracking_duration,
            records: vec![Vec::new(); lane_count],
            now: 0.0,
        }
    }

    /// Advance the clock and drop expired records
    pub fn advance(&mut self, dt: f32) {
        self.now += f64::from(dt);
        self.cleanup();
    }

    pub fn now(&self) -> f64 {
        self.now
    }

    fn is_expired(&self, record: &SpawnRecord) -> bool {
        self.now - record.timestamp >= f64::from(self.tracking_duration)
    }

    fn cleanup(&mut self) {
        let now = self.now;
        let window = f64::from(self.tracking_duration);
        for lane in &mut self.records {
            lane.retain(|r| now - r.timestamp < window);
        }
    }

    /// True iff no live record in `lane` is closer than the minimum distance
    pub fn can_spawn_at(&self, lane: usize, y: f32) -> bool {
        let Some(records) = self.records.get(lane) else {
            return true;
        };
        !records
            .iter()
            .any(|r| !self.is_expired(r) && (y - r.y).abs() < self.min_vertical_distance)
    }

    /// Pick a random lane that is free at `y`, or None if every lane is blocked
    pub fn available_lane<R: Rng + ?Sized>(&self, y: f32, rng: &mut R) -> Option<usize> {
        let open: Vec<usize> = (0..self.records.len())
            .filter(|&lane| self.can_spawn_at(lane, y))
            .collect();
        if open.is_empty() {
            return None;
        }
        Some(open[rng.random_range(0..open.len())])
    }

    /// Remember a spawn; visible to every later query immediately
    pub fn record_spawn(&mut self, lane: usize, y: f32) {
        if lane >= self.records.len() {
            // Lanes are fixed at construction; grow rather than lose the record
            self.records.resize_with(lane + 1, Vec::new);
        }
        let timestamp = self.now;
        self.records[lane].push(SpawnRecord { lane, y, timestamp });
    }

    /// Forget everything (stage transitions, full reset)
    pub fn clear_all(&mut self) {
        for lane in &mut self.records {
            lane.clear();
        }
    }

    pub fn records(&self, lane: usize) -> &[SpawnRecord] {
        self.records.get(lane).map_or(&[], |r| r.as_slice())
    }

    pub fn record_count(&self) -> usize {
        self.records.iter().map(Vec::len).sum()
    }

    pub fn lane_count(&self) -> usize {
        self.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn coordinator() -> SpawnCoordinator {
        SpawnCoordinator::new(2, DEFAULT_MIN_VERTICAL_DISTANCE, DEFAULT_TRACKING_DURATION)
    }

    #[test]
    fn test_blocks_nearby_spawn_same_lane_only() {
        let mut coord = coordinator();
        coord.record_spawn(0, 7.0);
        assert!(!coord.can_spawn_at(0, 7.0));
        assert!(!coord.can_spawn_at(0, 5.5));
        assert!(coord.can_spawn_at(0, 5.0));
        assert!(coord.can_spawn_at(1, 7.0));
    }

    #[test]
    fn test_available_lane_skips_blocked() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut coord = coordinator();
        coord.record_spawn(0, 7.0);
        for _ in 0..20 {
            assert_eq!(coord.available_lane(7.0, &mut rng), Some(1));
        }
        coord.record_spawn(1, 7.0);
        assert_eq!(coord.available_lane(7.0, &mut rng), None);
    }

    #[test]
    fn test_records_expire_after_window() {
        let mut coord = coordinator();
        coord.record_spawn(0, 7.0);
        coord.advance(2.5);
        assert!(!coord.can_spawn_at(0, 7.0));
        coord.advance(0.5);
        assert!(coord.can_spawn_at(0, 7.0));
        assert_eq!(coord.record_count(), 0);
    }

    #[test]
    fn test_clear_all() {
        let mut coord = coordinator();
        coord.record_spawn(0, 7.0);
        coord.record_spawn(1, 7.0);
        coord.clear_all();
        assert!(coord.can_spawn_at(0, 7.0));
        assert!(coord.can_spawn_at(1, 7.0));
    }

    #[test]
    fn test_available_lane_is_spread() {
        let mut rng = Pcg32::seed_from_u64(42);
        let coord = coordinator();
        let mut seen = [0u32; 2];
        for _ in 0..200 {
            seen[coord.available_lane(7.0, &mut rng).unwrap()] += 1;
        }
        assert!(seen[0] > 50 && seen[1] > 50);
    }

    proptest! {
        #[test]
        fn prop_blocked_iff_live_record_nearby(
            spawns in proptest::collection::vec((0usize..2, -6.0f32..7.0, 0.0f32..1.0), 0..20),
            probe_lane in 0usize..2,
            probe_y in -6.0f32..7.0,
        ) {
            let mut coord = coordinator();
            let mut live: Vec<(usize, f32, f64)> = Vec::new();
            for (lane, y, gap) in spawns {
                coord.advance(gap);
                coord.record_spawn(lane, y);
                live.push((lane, y, coord.now()));
            }
            let now = coord.now();
            let expected_blocked = live.iter().any(|&(lane, y, t)| {
                lane == probe_lane
                    && now - t < f64::from(DEFAULT_TRACKING_DURATION)
                    && (probe_y - y).abs() < DEFAULT_MIN_VERTICAL_DISTANCE
            });
            prop_assert_eq!(coord.can_spawn_at(probe_lane, probe_y), !expected_blocked);

            // Idle past a full window: everything frees up
            coord.advance(DEFAULT_TRACKING_DURATION + 0.01);
            prop_assert!(coord.can_spawn_at(probe_lane, probe_y));
        }
    }
}
