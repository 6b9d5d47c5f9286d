//! Hit points with edge-triggered death

/// Result of a damage or heal call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthChange {
    pub current: u32,
    pub max: u32,
    /// True only on the call that brought HP to zero
    pub died: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Health {
    current: u32,
    max: u32,
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100)
    }
}

impl Health {
    pub fn new(max: u32) -> Self {
        let max = max.max(1);
        Self { current: max, max }
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn is_dead(&self) -> bool {
        self.current == 0
    }

    /// Apply damage, clamping at zero. Returns None once already dead.
    pub fn take_damage(&mut self, amount: u32) -> Option<HealthChange> {
        if self.current == 0 {
            return None;
        }
        self.current = self.current.saturating_sub(amount);
        Some(HealthChange {
            current: self.current,
            max: self.max,
            died: self.current == 0,
        })
    }

    /// Restore HP up to max. The dead stay dead.
    pub fn heal(&mut self, amount: u32) -> Option<HealthChange> {
        if self.current == 0 {
            return None;
        }
        self.current = self.current.saturating_add(amount).min(self.max);
        Some(HealthChange {
            current: self.current,
            max: self.max,
            died: false,
        })
    }

    pub fn set_max(&mut self, max: u32) {
        self.max = max.max(1);
        self.current = self.max;
    }

    /// Refill to max (pooled reuse)
    pub fn reset(&mut self) {
        self.current = self.max;
    }

    /// Set max and refill (pooled reuse with new HP)
    pub fn reset_with_hp(&mut self, hp: u32) {
        self.set_max(hp);
    }
}
