//! # Slot Allocator
//!
//! Identifier ↔ slot bookkeeping shared by every store in the kernel.
//!
//! The allocator owns no column data. It hands out slot indices, records
//! which identifier owns each slot, and reports when capacity doubled so
//! the owning store can grow its columns in lockstep.
//!
//! ## Invariants
//!
//! - Every active slot has exactly one identifier mapped to it
//! - Every mapped identifier points at an active slot
//! - No index on the free list is active
//! - Activity and the identifier map change in the same call

use std::collections::HashMap;

use super::entity::Slot;
use super::storage::ColumnStorage;

/// Outcome of [`SlotAllocator::allocate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Allocation {
    /// The slot now owned by the identifier.
    pub slot: Slot,
    /// New capacity if the allocation doubled the arrays.
    pub grown_to: Option<usize>,
    /// `false` if the identifier was already live and kept its slot.
    pub fresh: bool,
}

/// Free-list slot allocator with an identifier map and doubling growth.
///
/// # Example
///
/// ```rust,ignore
/// let mut slots = SlotAllocator::new(4);
/// let a = slots.allocate("archer-1").slot;
/// slots.free("archer-1");
/// assert_eq!(slots.allocate("archer-2").slot, a); // LIFO reuse
/// ```
pub struct SlotAllocator {
    /// Identifier owning each slot (`None` while free).
    ids: Vec<Option<String>>,
    /// Per-slot active flag.
    active: ColumnStorage<bool>,
    /// Identifier → slot.
    slot_of: HashMap<String, Slot>,
    /// Freed slots, reused last-in first-out.
    free_list: Vec<u32>,
    /// Slots `0..high_water` have been handed out at least once.
    high_water: usize,
    /// Current length of every column.
    capacity: usize,
}

impl SlotAllocator {
    /// Creates an allocator with room for `capacity` slots before the first
    /// doubling. A zero capacity is bumped to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            ids: vec![None; capacity],
            active: ColumnStorage::new(capacity),
            slot_of: HashMap::with_capacity(capacity),
            free_list: Vec::with_capacity(capacity),
            high_water: 0,
            capacity,
        }
    }

    /// Current capacity shared by all columns of the owning store.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of slots ever handed out (an upper bound for iteration).
    #[inline]
    #[must_use]
    pub const fn high_water(&self) -> usize {
        self.high_water
    }

    /// Number of live identifiers.
    #[inline]
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.slot_of.len()
    }

    /// Free slots waiting for reuse, in stack order (last is reused first).
    #[inline]
    #[must_use]
    pub fn free_slots(&self) -> &[u32] {
        &self.free_list
    }

    /// Claims a slot for `id`.
    ///
    /// Reuses the most recently freed slot, then the next unused tail slot,
    /// and doubles capacity only when both are exhausted. If `id` is already
    /// live its current slot is returned with `fresh == false`.
    pub fn allocate(&mut self, id: &str) -> Allocation {
        if let Some(&slot) = self.slot_of.get(id) {
            return Allocation {
                slot,
                grown_to: None,
                fresh: false,
            };
        }

        let mut grown_to = None;
        let index = if let Some(index) = self.free_list.pop() {
            index as usize
        } else {
            if self.high_water == self.capacity {
                let new_capacity = self.capacity * 2;
                self.ids.resize(new_capacity, None);
                self.active.grow(new_capacity);
                self.capacity = new_capacity;
                grown_to = Some(new_capacity);
            }
            self.high_water += 1;
            self.high_water - 1
        };

        let slot = Slot::new(index as u32);
        self.ids[index] = Some(id.to_owned());
        self.active.set(index, true);
        self.slot_of.insert(id.to_owned(), slot);

        Allocation {
            slot,
            grown_to,
            fresh: true,
        }
    }

    /// Releases the slot owned by `id`. Unknown identifiers are a no-op.
    ///
    /// Returns the freed slot so the owner can zero its columns.
    pub fn free(&mut self, id: &str) -> Option<Slot> {
        let slot = self.slot_of.remove(id)?;
        let index = slot.index();
        self.ids[index] = None;
        self.active.set(index, false);
        self.free_list.push(slot.raw());
        Some(slot)
    }

    /// Slot owned by `id`, if live.
    #[inline]
    #[must_use]
    pub fn lookup(&self, id: &str) -> Option<Slot> {
        self.slot_of.get(id).copied()
    }

    /// Identifier owning `slot`, if active.
    #[inline]
    #[must_use]
    pub fn id_of(&self, slot: Slot) -> Option<&str> {
        self.ids.get(slot.index())?.as_deref()
    }

    /// Whether `slot` currently represents a live unit.
    #[inline]
    #[must_use]
    pub fn is_active(&self, slot: Slot) -> bool {
        self.active.get(slot.index()).unwrap_or(false)
    }

    /// Per-slot active flags.
    #[inline]
    #[must_use]
    pub fn active_flags(&self) -> &[bool] {
        self.active.as_slice()
    }

    /// Active slots in ascending index order.
    pub fn iter_active(&self) -> impl Iterator<Item = Slot> + '_ {
        self.active.as_slice()[..self.high_water]
            .iter()
            .enumerate()
            .filter(|(_, &active)| active)
            .map(|(index, _)| Slot::new(index as u32))
    }

    /// Frees every slot. Capacity is kept; allocation restarts at slot 0.
    pub fn clear(&mut self) {
        self.ids.fill(None);
        self.active.clear();
        self.slot_of.clear();
        self.free_list.clear();
        self.high_water = 0;
    }

    /// Checks the identity invariants. Meant for tests and debug assertions.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let map_ok = self.slot_of.iter().all(|(id, &slot)| {
            self.is_active(slot) && self.id_of(slot) == Some(id.as_str())
        });
        let slots_ok = self.iter_active().all(|slot| {
            self.id_of(slot)
                .is_some_and(|id| self.slot_of.get(id) == Some(&slot))
        });
        let active_count = self.iter_active().count();
        let mut seen = vec![false; self.capacity];
        let free_ok = self.free_list.iter().all(|&index| {
            let index = index as usize;
            let fresh = index < self.capacity && !seen[index] && !self.active.as_slice()[index];
            if fresh {
                seen[index] = true;
            }
            fresh
        });
        map_ok && slots_ok && free_ok && active_count == self.slot_of.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_free_lookup() {
        let mut slots = SlotAllocator::new(4);
        let a = slots.allocate("a");
        assert!(a.fresh);
        assert_eq!(a.slot, Slot::new(0));
        assert_eq!(slots.lookup("a"), Some(a.slot));
        assert_eq!(slots.id_of(a.slot), Some("a"));

        assert_eq!(slots.free("a"), Some(a.slot));
        assert_eq!(slots.lookup("a"), None);
        assert!(!slots.is_active(a.slot));
        assert_eq!(slots.free("a"), None);
        assert!(slots.is_consistent());
    }

    #[test]
    fn test_lifo_reuse() {
        let mut slots = SlotAllocator::new(8);
        for i in 0..5 {
            slots.allocate(&format!("u{i}"));
        }
        slots.free("u1");
        slots.free("u3");
        assert_eq!(slots.allocate("x").slot, Slot::new(3));
        assert_eq!(slots.allocate("y").slot, Slot::new(1));
        assert_eq!(slots.allocate("z").slot, Slot::new(5));
        assert!(slots.is_consistent());
    }

    #[test]
    fn test_doubling_growth() {
        let mut slots = SlotAllocator::new(2);
        assert_eq!(slots.allocate("a").grown_to, None);
        assert_eq!(slots.allocate("b").grown_to, None);
        let c = slots.allocate("c");
        assert_eq!(c.grown_to, Some(4));
        assert_eq!(c.slot, Slot::new(2));
        assert_eq!(slots.capacity(), 4);
        assert_eq!(slots.lookup("a"), Some(Slot::new(0)));
        assert!(slots.is_consistent());
    }

    #[test]
    fn test_duplicate_id_keeps_slot() {
        let mut slots = SlotAllocator::new(2);
        let first = slots.allocate("dup");
        let second = slots.allocate("dup");
        assert_eq!(first.slot, second.slot);
        assert!(!second.fresh);
        assert_eq!(slots.active_count(), 1);
    }

    #[test]
    fn test_clear_restarts_at_zero() {
        let mut slots = SlotAllocator::new(2);
        slots.allocate("a");
        slots.allocate("b");
        slots.allocate("c");
        slots.clear();
        assert_eq!(slots.active_count(), 0);
        assert_eq!(slots.capacity(), 4);
        assert_eq!(slots.allocate("d").slot, Slot::new(0));
        assert!(slots.is_consistent());
    }
}
