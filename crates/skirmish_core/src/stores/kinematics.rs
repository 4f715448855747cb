//! # Kinematics Store
//!
//! Position + planned-move columns behind their own [`SlotAllocator`],
//! for subsystems (projectiles, markers) whose lifecycle is independent
//! from the unit store.

use tracing::debug;

use crate::ecs::{ColumnStorage, MoveIntent, Position, Slot, SlotAllocator};

/// Free-list store of positions and planned moves.
pub struct KinematicsStore {
    slots: SlotAllocator,
    positions: ColumnStorage<Position>,
    intended: ColumnStorage<MoveIntent>,
}

impl KinematicsStore {
    /// Creates a store with `capacity` slots reserved.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let slots = SlotAllocator::new(capacity);
        let capacity = slots.capacity();
        Self {
            slots,
            positions: ColumnStorage::new(capacity),
            intended: ColumnStorage::new(capacity),
        }
    }

    /// Stores a position under `id`. A live `id` is re-initialized in place.
    pub fn allocate(&mut self, id: &str, position: Position) -> Slot {
        let allocation = self.slots.allocate(id);
        if let Some(capacity) = allocation.grown_to {
            self.positions.grow(capacity);
            self.intended.grow(capacity);
            debug!(capacity, "kinematics store grew");
        }
        let index = allocation.slot.index();
        self.positions.set(index, position);
        self.intended.set(index, MoveIntent::STAY);
        allocation.slot
    }

    /// Removes `id` and zeroes its slot. Unknown ids are a no-op.
    pub fn free(&mut self, id: &str) -> Option<Slot> {
        let slot = self.slots.free(id)?;
        self.positions.reset(slot.index());
        self.intended.reset(slot.index());
        Some(slot)
    }

    /// Slot of a live identifier.
    #[inline]
    #[must_use]
    pub fn lookup(&self, id: &str) -> Option<Slot> {
        self.slots.lookup(id)
    }

    /// Removes everything. Capacity is kept.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.positions.clear();
        self.intended.clear();
    }

    /// Number of live entries.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.active_count()
    }

    /// Whether no entry is live.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current column length.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Position of an active slot.
    #[inline]
    #[must_use]
    pub fn position(&self, slot: Slot) -> Option<Position> {
        self.slots
            .is_active(slot)
            .then(|| self.positions.as_slice()[slot.index()])
    }

    /// Planned move of an active slot.
    #[inline]
    #[must_use]
    pub fn intended(&self, slot: Slot) -> Option<MoveIntent> {
        self.slots
            .is_active(slot)
            .then(|| self.intended.as_slice()[slot.index()])
    }

    /// Plans a move for an active slot.
    pub fn set_intended(&mut self, slot: Slot, intent: MoveIntent) -> bool {
        self.slots.is_active(slot) && self.intended.set(slot.index(), intent)
    }

    /// Applies every planned move, clamps to `[0, width) x [0, height)`
    /// and clears the plans. Returns how many positions changed.
    pub fn commit_moves(&mut self, width: f32, height: f32) -> usize {
        let positions = self.positions.as_mut_slice();
        let intended = self.intended.as_mut_slice();
        let mut moved = 0;
        for slot in self.slots.iter_active() {
            let index = slot.index();
            let intent = std::mem::take(&mut intended[index]);
            if intent.is_stay() {
                continue;
            }
            let next = positions[index].offset(intent).clamped(width, height);
            if next != positions[index] {
                positions[index] = next;
                moved += 1;
            }
        }
        moved
    }
}
