//! Global scroll speed and vertical spawn/despawn boundaries

use glam::Vec2;

use super::pool::{Handle, Pool};
use crate::consts::MIN_SCROLL_SPEED;

/// Anything carried down the screen by the scroll
pub trait Scrollable {
    fn position_mut(&mut self) -> &mut Vec2;
}

/// Scroll model shared by every descending entity
#[derive(Debug, Clone)]
pub struct ScrollModel {
    base_speed: f32,
    multiplier: f32,
    scrolling: bool,
    /// Where new entities appear (top of screen)
    pub spawn_y: f32,
    /// Entities below this line are recycled
    pub despawn_y: f32,
}

impl ScrollModel {
    pub fn new(base_speed: f32, spawn_y: f32, despawn_y: f32) -> Self {
        let mut model = Self {
            base_speed: MIN_SCROLL_SPEED,
            multiplier: 1.0,
            scrolling: true,
            spawn_y,
            despawn_y,
        };
        model.set_base_speed(base_speed);
        model
    }

    /// Effective speed in units/sec (0 while paused)
    pub fn speed(&self) -> f32 {
        if self.scrolling {
            self.base_speed * self.multiplier
        } else {
            0.0
        }
    }

    pub fn base_speed(&self) -> f32 {
        self.base_speed
    }

    pub fn set_base_speed(&mut self, speed: f32) {
        if speed < MIN_SCROLL_SPEED {
            log::warn!("Scroll speed {} below minimum, clamping to {}", speed, MIN_SCROLL_SPEED);
        }
        self.base_speed = speed.max(MIN_SCROLL_SPEED);
        log::debug!("Scroll speed changed: {}", self.speed());
    }

    /// Stage-level speed scaling
    pub fn set_speed_multiplier(&mut self, multiplier: f32) {
        self.multiplier = multiplier.max(MIN_SCROLL_SPEED);
        log::debug!("Scroll speed changed: {}", self.speed());
    }

    pub fn set_scrolling(&mut self, enabled: bool) {
        self.scrolling = enabled;
    }

    pub fn is_scrolling(&self) -> bool {
        self.scrolling
    }

    /// New Y after scrolling down for `dt` seconds
    #[inline]
    pub fn advance(&self, y: f32, dt: f32) -> f32 {
        y - self.speed() * dt
    }

    pub fn is_off_screen_bottom(&self, y: f32) -> bool {
        y < self.despawn_y
    }

    pub fn is_off_screen_top(&self, y: f32) -> bool {
        y > self.spawn_y
    }

    /// Scroll every active entity and release the ones past the bottom line
    pub fn scroll_pool<T: Scrollable>(&self, pool: &mut Pool<T>, dt: f32) -> Vec<Handle> {
        let step = self.speed() * dt;
        let despawn_y = self.despawn_y;
        let mut gone = Vec::new();
        for (handle, entity) in pool.iter_mut() {
            let pos = entity.position_mut();
            pos.y -= step;
            if pos.y < despawn_y {
                gone.push(handle);
            }
        }
        for &handle in &gone {
            pool.release(handle);
        }
        gone
    }
}
