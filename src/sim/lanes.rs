//! Lane topology
//!
//! Lanes are vertical tracks laid out symmetrically about x = 0:
//! lane i sits at `start + i * (width + spacing)` with
//! `start = -(count - 1) * (width + spacing) / 2`.

use serde::{Deserialize, Serialize};

/// Fixed set of lanes with precomputed X coordinates
#[derive(Debug, Clone)]
pub struct LaneSet {
    width: f32,
    xs: Vec<f32>,
}

impl LaneSet {
    pub fn new(count: usize, width: f32, spacing: f32) -> Self {
        let count = if count == 0 {
            log::warn!("Lane count 0 is invalid, using 1 lane");
            1
        } else {
            count
        };
        let pitch = width + spacing;
        let start = -((count - 1) as f32) * pitch / 2.0;
        let xs = (0..count).map(|i| start + i as f32 * pitch).collect();
        Self { width, xs }
    }

    pub fn count(&self) -> usize {
        self.xs.len()
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn is_valid(&self, lane: usize) -> bool {
        lane < self.xs.len()
    }

    /// X coordinate of `lane`; invalid lanes fall back to lane 0
    pub fn lane_x(&self, lane: usize) -> f32 {
        match self.xs.get(lane) {
            Some(&x) => x,
            None => {
                log::warn!("Invalid lane index: {}. Returning lane 0.", lane);
                self.xs[0]
            }
        }
    }

    pub fn try_lane_x(&self, lane: usize) -> Option<f32> {
        self.xs.get(lane).copied()
    }

    pub fn positions(&self) -> &[f32] {
        &self.xs
    }

    /// Nearest lane to a world X coordinate (ties go to the lower index)
    pub fn lane_from_world_x(&self, world_x: f32) -> usize {
        let mut best = 0;
        let mut best_dist = (world_x - self.xs[0]).abs();
        for (i, &x) in self.xs.iter().enumerate().skip(1) {
            let dist = (world_x - x).abs();
            if dist < best_dist {
                best = i;
                best_dist = dist;
            }
        }
        best
    }

    /// Lane under a screen-space X coordinate
    pub fn lane_from_screen_x(&self, screen_x: f32, camera: &ScreenCamera) -> usize {
        self.lane_from_world_x(camera.screen_to_world_x(screen_x))
    }
}

/// Horizontal part of an orthographic camera, enough to map taps to lanes
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScreenCamera {
    /// World X at the centre of the screen
    pub center_x: f32,
    /// Half the visible world width
    pub half_width: f32,
    /// Screen width in pixels
    pub screen_width: f32,
}

impl Default for ScreenCamera {
    fn default() -> Self {
        Self {
            center_x: 0.0,
            half_width: 3.0,
            screen_width: 1080.0,
        }
    }
}

impl ScreenCamera {
    pub fn screen_to_world_x(&self, screen_x: f32) -> f32 {
        let t = if self.screen_width > 0.0 {
            screen_x / self.screen_width
        } else {
            0.5
        };
        self.center_x + (t * 2.0 - 1.0) * self.half_width
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_lane_positions() {
        let lanes = LaneSet::new(2, 2.0, 0.5);
        assert_eq!(lanes.count(), 2);
        assert!((lanes.lane_x(0) + 1.25).abs() < 1e-6);
        assert!((lanes.lane_x(1) - 1.25).abs() < 1e-6);
    }

    #[test]
    fn test_positions_symmetric_and_increasing() {
        for count in 1..6 {
            let lanes = LaneSet::new(count, 2.0, 0.5);
            let xs = lanes.positions();
            for i in 0..count {
                assert!((xs[i] + xs[count - 1 - i]).abs() < 1e-5);
                if i > 0 {
                    assert!(xs[i] > xs[i - 1]);
                }
            }
        }
    }

    #[test]
    fn test_invalid_lane_falls_back() {
        let lanes = LaneSet::new(2, 2.0, 0.5);
        assert_eq!(lanes.lane_x(7), lanes.lane_x(0));
        assert!(lanes.try_lane_x(7).is_none());
        assert!(!lanes.is_valid(2));
    }

    #[test]
    fn test_screen_to_lane() {
        let lanes = LaneSet::new(2, 2.0, 0.5);
        let camera = ScreenCamera::default();
        assert_eq!(lanes.lane_from_screen_x(100.0, &camera), 0);
        assert_eq!(lanes.lane_from_screen_x(1000.0, &camera), 1);
        assert_eq!(lanes.lane_from_world_x(-0.1), 0);
        assert_eq!(lanes.lane_from_world_x(0.1), 1);
    }
}
