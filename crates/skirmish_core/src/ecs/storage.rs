//! # Column Storage
//!
//! One dense, slot-indexed array per field.
//!
//! The storage uses a dense array strategy:
//! - All slots up to the current capacity are allocated and defaulted
//! - Access is O(1) via slot index
//! - Iteration is cache-friendly (contiguous memory)
//! - Growth reallocates once and copies old contents by index

/// Dense storage for a single column.
///
/// # Type Parameters
///
/// * `C` - The value type stored per slot
///
/// # Example
///
/// ```rust,ignore
/// let mut hp: ColumnStorage<f32> = ColumnStorage::new(64);
/// hp.set(3, 100.0);
/// hp.grow(128); // slot 3 still holds 100.0
/// ```
pub struct ColumnStorage<C> {
    /// The dense array of values.
    data: Box<[C]>,
}

impl<C: Copy + Default> ColumnStorage<C> {
    /// Creates storage with every slot set to the default value.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![C::default(); capacity].into_boxed_slice(),
        }
    }

    /// Returns the number of slots.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Reallocates to `new_capacity`, preserving existing values by index.
    /// New slots take the default value. Shrinking is ignored.
    pub fn grow(&mut self, new_capacity: usize) {
        if new_capacity <= self.data.len() {
            return;
        }
        let mut data = vec![C::default(); new_capacity].into_boxed_slice();
        data[..self.data.len()].copy_from_slice(&self.data);
        self.data = data;
    }

    /// Gets a value by slot index, or `None` past the capacity.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<C> {
        self.data.get(index).copied()
    }

    /// Gets a mutable value by slot index.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut C> {
        self.data.get_mut(index)
    }

    /// Overwrites a slot. Returns `false` if the index is out of bounds.
    #[inline]
    pub fn set(&mut self, index: usize, value: C) -> bool {
        if let Some(slot) = self.data.get_mut(index) {
            *slot = value;
            true
        } else {
            false
        }
    }

    /// Resets a slot to the default value.
    #[inline]
    pub fn reset(&mut self, index: usize) {
        if let Some(slot) = self.data.get_mut(index) {
            *slot = C::default();
        }
    }

    /// Resets every slot to the default value without freeing memory.
    pub fn clear(&mut self) {
        self.data.fill(C::default());
    }

    /// All values, including free slots.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[C] {
        &self.data
    }

    /// All values, mutably.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [C] {
        &mut self.data
    }
}
