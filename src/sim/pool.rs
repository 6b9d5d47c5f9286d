//! Reusable entity storage
//!
//! A growable arena of slots with a free list. Handles are (index, generation)
//! pairs; releasing a slot bumps its generation so stale handles stop resolving.

/// Handle to a pooled entity. Invalidated when the entity is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl Handle {
    /// Slot index (stable across reuse, not unique over time)
    pub fn index(&self) -> usize {
        self.index as usize
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

#[derive(Debug, Clone)]
struct Slot<T> {
    generation: u32,
    active: bool,
    value: T,
}

/// Pool of reusable entities
#[derive(Debug, Clone)]
pub struct Pool<T> {
    slots: Vec<Slot<T>>,
    /// Inactive slot indices, reused LIFO
    free: Vec<u32>,
    /// Hard cap on slot count (None = grow on demand)
    cap: Option<usize>,
}

impl<T: Default> Pool<T> {
    /// Create a pool with `initial` pre-built inactive slots
    pub fn new(initial: usize, cap: Option<usize>) -> Self {
        let initial = cap.map_or(initial, |c| initial.min(c));
        let slots = (0..initial)
            .map(|_| Slot {
                generation: 0,
                active: false,
                value: T::default(),
            })
            .collect();
        // Reverse so the lowest index is handed out first
        let free = (0..initial as u32).rev().collect();
        Self { slots, free, cap }
    }

    /// Activate an inactive slot holding `value`
    ///
    /// The previous contents of a reused slot are fully replaced. Returns `None`
    /// when the pool is at its hard cap and every slot is active.
    pub fn acquire(&mut self, value: T) -> Option<Handle> {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                if self.cap.is_some_and(|cap| self.slots.len() >= cap) {
                    return None;
                }
                self.slots.push(Slot {
                    generation: 0,
                    active: false,
                    value: T::default(),
                });
                (self.slots.len() - 1) as u32
            }
        };

        let slot = &mut self.slots[index as usize];
        slot.active = true;
        slot.value = value;
        Some(Handle {
            index,
            generation: slot.generation,
        })
    }
}

impl<T> Pool<T> {
    /// Deactivate the entity and return its slot to the free set
    ///
    /// Returns false for stale or already released handles.
    pub fn release(&mut self, handle: Handle) -> bool {
        match self.slots.get_mut(handle.index as usize) {
            Some(slot) if slot.active && slot.generation == handle.generation => {
                slot.active = false;
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(handle.index);
                true
            }
            _ => false,
        }
    }

    /// Release every active entity
    pub fn release_all(&mut self) -> usize {
        let handles: Vec<Handle> = self.handles();
        for &handle in &handles {
            self.release(handle);
        }
        handles.len()
    }

    /// Release every active entity matching `pred`, returning their handles
    pub fn release_where(&mut self, mut pred: impl FnMut(&T) -> bool) -> Vec<Handle> {
        let doomed: Vec<Handle> = self
            .iter()
            .filter(|(_, v)| pred(v))
            .map(|(h, _)| h)
            .collect();
        for &handle in &doomed {
            self.release(handle);
        }
        doomed
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.slots
            .get(handle.index as usize)
            .filter(|s| s.active && s.generation == handle.generation)
            .map(|s| &s.value)
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|s| s.active && s.generation == handle.generation)
            .map(|s| &mut s.value)
    }

    pub fn is_active(&self, handle: Handle) -> bool {
        self.get(handle).is_some()
    }

    /// Active entities in slot order
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &T)> {
        self.slots.iter().enumerate().filter(|(_, s)| s.active).map(|(i, s)| {
            (
                Handle {
                    index: i as u32,
                    generation: s.generation,
                },
                &s.value,
            )
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Handle, &mut T)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter(|(_, s)| s.active)
            .map(|(i, s)| {
                (
                    Handle {
                        index: i as u32,
                        generation: s.generation,
                    },
                    &mut s.value,
                )
            })
    }

    /// Snapshot of active handles (for mutation while iterating)
    pub fn handles(&self) -> Vec<Handle> {
        self.iter().map(|(h, _)| h).collect()
    }

    pub fn active_count(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Total slots created so far (active + free)
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn cap(&self) -> Option<usize> {
        self.cap
    }
}
