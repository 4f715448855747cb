//! # Unit Store
//!
//! The dense store holding every unit of the simulation.
//! One column per field, all indexed by [`Slot`].

use tracing::{debug, trace};

use super::allocator::SlotAllocator;
use super::component::{MoveIntent, Position, Team, UnitState, Velocity};
use super::entity::{ColdMeta, Slot, UnitSpawn};
use super::storage::ColumnStorage;

/// The dense unit store.
///
/// A slot is either fully initialized with its identifier registered, or
/// fully zeroed with no identifier. Capacity doubles when the free list
/// and the unused tail are both exhausted. Every column grows in the same
/// call.
///
/// # Example
///
/// ```rust,ignore
/// let mut store = UnitStore::new(64);
///
/// let slot = store.allocate("scout", UnitSpawn::new(3.0, 4.0, Team::Friendly));
/// assert_eq!(store.lookup("scout"), Some(slot));
/// store.free("scout");
/// ```
pub struct UnitStore {
    /// Identifier ↔ slot bookkeeping.
    slots: SlotAllocator,

    // =========================================================================
    // Hot columns
    // =========================================================================
    /// Position column.
    positions: ColumnStorage<Position>,
    /// Committed displacement of the last tick.
    velocities: ColumnStorage<Velocity>,
    /// Move planned for the current tick.
    intended: ColumnStorage<MoveIntent>,
    /// Current hit points.
    hp: ColumnStorage<f32>,
    /// Hit points at spawn.
    max_hp: ColumnStorage<f32>,
    /// Mass column.
    mass: ColumnStorage<f32>,
    /// Damage column.
    damage: ColumnStorage<f32>,
    /// Lifecycle state.
    states: ColumnStorage<UnitState>,
    /// Team column.
    teams: ColumnStorage<Team>,

    // =========================================================================
    // Cold side table (same index space)
    // =========================================================================
    cold: Vec<ColdMeta>,
}

impl UnitStore {
    /// Creates a store with `capacity` slots reserved.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let slots = SlotAllocator::new(capacity);
        let capacity = slots.capacity();
        Self {
            slots,
            positions: ColumnStorage::new(capacity),
            velocities: ColumnStorage::new(capacity),
            intended: ColumnStorage::new(capacity),
            hp: ColumnStorage::new(capacity),
            max_hp: ColumnStorage::new(capacity),
            mass: ColumnStorage::new(capacity),
            damage: ColumnStorage::new(capacity),
            states: ColumnStorage::new(capacity),
            teams: ColumnStorage::new(capacity),
            cold: vec![ColdMeta::default(); capacity],
        }
    }

    /// Stores a unit under `id` and returns its slot.
    ///
    /// If `id` is already live its slot is re-initialized in place.
    pub fn allocate(&mut self, id: &str, spawn: UnitSpawn) -> Slot {
        let allocation = self.slots.allocate(id);
        if let Some(capacity) = allocation.grown_to {
            self.grow(capacity);
            debug!(capacity, "unit store grew");
        }
        if !allocation.fresh {
            trace!(id, slot = %allocation.slot, "re-initializing live unit");
        }

        let index = allocation.slot.index();
        self.positions.set(index, spawn.position);
        self.velocities.set(index, Velocity::ZERO);
        self.intended.set(index, MoveIntent::STAY);
        self.hp.set(index, spawn.hp);
        self.max_hp.set(index, spawn.hp);
        self.mass.set(index, spawn.mass);
        self.damage.set(index, spawn.damage);
        self.states.set(index, UnitState::Idle);
        self.teams.set(index, spawn.team);
        self.cold[index] = spawn.meta;

        allocation.slot
    }

    /// Removes the unit `id` and zeroes its slot. Unknown ids are a no-op.
    pub fn free(&mut self, id: &str) -> Option<Slot> {
        let slot = self.slots.free(id)?;
        let index = slot.index();
        self.positions.reset(index);
        self.velocities.reset(index);
        self.intended.reset(index);
        self.hp.reset(index);
        self.max_hp.reset(index);
        self.mass.reset(index);
        self.damage.reset(index);
        self.states.reset(index);
        self.teams.reset(index);
        self.cold[index].reset();
        Some(slot)
    }

    /// Removes every unit. Capacity is kept.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.positions.clear();
        self.velocities.clear();
        self.intended.clear();
        self.hp.clear();
        self.max_hp.clear();
        self.mass.clear();
        self.damage.clear();
        self.states.clear();
        self.teams.clear();
        self.cold.iter_mut().for_each(ColdMeta::reset);
    }

    fn grow(&mut self, capacity: usize) {
        self.positions.grow(capacity);
        self.velocities.grow(capacity);
        self.intended.grow(capacity);
        self.hp.grow(capacity);
        self.max_hp.grow(capacity);
        self.mass.grow(capacity);
        self.damage.grow(capacity);
        self.states.grow(capacity);
        self.teams.grow(capacity);
        self.cold.resize_with(capacity, ColdMeta::default);
    }

    // =========================================================================
    // Identity
    // =========================================================================

    /// Slot of a live identifier.
    #[inline]
    #[must_use]
    pub fn lookup(&self, id: &str) -> Option<Slot> {
        self.slots.lookup(id)
    }

    /// Identifier of an active slot.
    #[inline]
    #[must_use]
    pub fn id_of(&self, slot: Slot) -> Option<&str> {
        self.slots.id_of(slot)
    }

    /// Whether `slot` holds a live unit.
    #[inline]
    #[must_use]
    pub fn is_active(&self, slot: Slot) -> bool {
        self.slots.is_active(slot)
    }

    /// Number of live units.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.active_count()
    }

    /// Whether the store holds no units.
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

    /// Upper bound (exclusive) of every slot handed out so far.
    #[inline]
    #[must_use]
    pub const fn high_water(&self) -> usize {
        self.slots.high_water()
    }

    /// Freed slots in stack order.
    #[inline]
    #[must_use]
    pub fn free_slots(&self) -> &[u32] {
        self.slots.free_slots()
    }

    /// Active slots, ascending.
    pub fn iter_active(&self) -> impl Iterator<Item = Slot> + '_ {
        self.slots.iter_active()
    }

    /// Active slots that are not dead, ascending.
    pub fn iter_live(&self) -> impl Iterator<Item = Slot> + '_ {
        self.slots
            .iter_active()
            .filter(|slot| !self.states.as_slice()[slot.index()].is_dead())
    }

    /// Checks that identity and zeroing invariants hold.
    ///
    /// Every active slot maps to exactly one identifier and back, and every
    /// free slot below the high-water mark holds default values.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        if !self.slots.is_consistent() {
            return false;
        }
        let flags = self.slots.active_flags();
        (0..self.slots.high_water())
            .filter(|&index| !flags[index])
            .all(|index| {
                self.positions.as_slice()[index] == Position::default()
                    && self.hp.as_slice()[index] == 0.0
                    && self.mass.as_slice()[index] == 0.0
                    && self.states.as_slice()[index] == UnitState::default()
                    && self.cold[index] == ColdMeta::default()
            })
    }

    // =========================================================================
    // Slot access (fast path)
    // =========================================================================

    #[inline]
    fn active_index(&self, slot: Slot) -> Option<usize> {
        self.slots.is_active(slot).then(|| slot.index())
    }

    /// Position of an active slot.
    #[inline]
    #[must_use]
    pub fn position(&self, slot: Slot) -> Option<Position> {
        self.positions.get(self.active_index(slot)?)
    }

    /// Velocity of an active slot.
    #[inline]
    #[must_use]
    pub fn velocity(&self, slot: Slot) -> Option<Velocity> {
        self.velocities.get(self.active_index(slot)?)
    }

    /// Planned move of an active slot.
    #[inline]
    #[must_use]
    pub fn intended(&self, slot: Slot) -> Option<MoveIntent> {
        self.intended.get(self.active_index(slot)?)
    }

    /// Current hit points of an active slot.
    #[inline]
    #[must_use]
    pub fn hp(&self, slot: Slot) -> Option<f32> {
        self.hp.get(self.active_index(slot)?)
    }

    /// Spawn hit points of an active slot.
    #[inline]
    #[must_use]
    pub fn max_hp(&self, slot: Slot) -> Option<f32> {
        self.max_hp.get(self.active_index(slot)?)
    }

    /// Mass of an active slot.
    #[inline]
    #[must_use]
    pub fn mass(&self, slot: Slot) -> Option<f32> {
        self.mass.get(self.active_index(slot)?)
    }

    /// Damage of an active slot.
    #[inline]
    #[must_use]
    pub fn damage(&self, slot: Slot) -> Option<f32> {
        self.damage.get(self.active_index(slot)?)
    }

    /// Team of an active slot.
    #[inline]
    #[must_use]
    pub fn team(&self, slot: Slot) -> Option<Team> {
        self.teams.get(self.active_index(slot)?)
    }

    /// State of an active slot.
    #[inline]
    #[must_use]
    pub fn state(&self, slot: Slot) -> Option<UnitState> {
        self.states.get(self.active_index(slot)?)
    }

    /// Cold metadata of an active slot.
    #[inline]
    #[must_use]
    pub fn cold(&self, slot: Slot) -> Option<&ColdMeta> {
        self.cold.get(self.active_index(slot)?)
    }

    /// Mutable cold metadata of an active slot.
    #[inline]
    pub fn cold_mut(&mut self, slot: Slot) -> Option<&mut ColdMeta> {
        let index = self.active_index(slot)?;
        self.cold.get_mut(index)
    }

    /// Overrides the planned move of an active slot before resolution.
    pub fn set_intended(&mut self, slot: Slot, intent: MoveIntent) -> bool {
        self.active_index(slot)
            .is_some_and(|index| self.intended.set(index, intent))
    }

    /// Sets hit points of an active slot.
    pub fn set_hp(&mut self, slot: Slot, hp: f32) -> bool {
        self.active_index(slot)
            .is_some_and(|index| self.hp.set(index, hp))
    }

    /// Marks an active slot dead. Dead units keep their slot until freed
    /// but are skipped by every pass.
    pub fn mark_dead(&mut self, slot: Slot) -> bool {
        let Some(index) = self.active_index(slot) else {
            return false;
        };
        self.states.set(index, UnitState::Dead);
        self.intended.set(index, MoveIntent::STAY);
        self.velocities.set(index, Velocity::ZERO);
        true
    }

    pub(crate) fn set_state(&mut self, slot: Slot, state: UnitState) {
        self.states.set(slot.index(), state);
    }

    pub(crate) fn commit_motion(&mut self, slot: Slot, position: Position, velocity: Velocity) {
        let index = slot.index();
        self.positions.set(index, position);
        self.velocities.set(index, velocity);
    }

    // =========================================================================
    // Identifier access
    // =========================================================================

    /// Position of a live identifier.
    #[must_use]
    pub fn position_of(&self, id: &str) -> Option<Position> {
        self.position(self.lookup(id)?)
    }

    /// Velocity of a live identifier.
    #[must_use]
    pub fn velocity_of(&self, id: &str) -> Option<Velocity> {
        self.velocity(self.lookup(id)?)
    }

    /// Hit points of a live identifier.
    #[must_use]
    pub fn hp_of(&self, id: &str) -> Option<f32> {
        self.hp(self.lookup(id)?)
    }

    /// Team of a live identifier.
    #[must_use]
    pub fn team_of(&self, id: &str) -> Option<Team> {
        self.team(self.lookup(id)?)
    }

    /// State of a live identifier.
    #[must_use]
    pub fn state_of(&self, id: &str) -> Option<UnitState> {
        self.state(self.lookup(id)?)
    }

    /// Cold metadata of a live identifier.
    #[must_use]
    pub fn cold_of(&self, id: &str) -> Option<&ColdMeta> {
        self.cold(self.lookup(id)?)
    }

    // =========================================================================
    // Whole columns (free slots hold defaults)
    // =========================================================================

    /// Position column.
    #[inline]
    #[must_use]
    pub fn positions(&self) -> &[Position] {
        self.positions.as_slice()
    }

    /// Velocity column.
    #[inline]
    #[must_use]
    pub fn velocities(&self) -> &[Velocity] {
        self.velocities.as_slice()
    }

    /// Planned-move column.
    #[inline]
    #[must_use]
    pub fn intents(&self) -> &[MoveIntent] {
        self.intended.as_slice()
    }

    /// Hit point column.
    #[inline]
    #[must_use]
    pub fn hp_column(&self) -> &[f32] {
        self.hp.as_slice()
    }

    /// Mass column.
    #[inline]
    #[must_use]
    pub fn masses(&self) -> &[f32] {
        self.mass.as_slice()
    }

    /// State column.
    #[inline]
    #[must_use]
    pub fn states(&self) -> &[UnitState] {
        self.states.as_slice()
    }

    /// Team column.
    #[inline]
    #[must_use]
    pub fn teams(&self) -> &[Team] {
        self.teams.as_slice()
    }

    /// Cold side table.
    #[inline]
    #[must_use]
    pub fn cold_table(&self) -> &[ColdMeta] {
        &self.cold
    }

    /// Position column as raw bytes, for hashing and snapshots.
    #[inline]
    #[must_use]
    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.positions.as_slice())
    }

    /// Whether the unit in `slot` takes part in this tick.
    #[inline]
    #[must_use]
    pub fn is_live(&self, slot: Slot) -> bool {
        self.slots.is_active(slot) && !self.states.as_slice()[slot.index()].is_dead()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::entity::Behavior;

    fn spawn(x: f32, y: f32) -> UnitSpawn {
        UnitSpawn::new(x, y, Team::Friendly)
    }

    #[test]
    fn test_allocate_and_query() {
        let mut store = UnitStore::new(4);
        let slot = store.allocate(
            "a",
            UnitSpawn::new(2.0, 3.0, Team::Hostile)
                .with_mass(2.0)
                .with_hp(50.0)
                .with_posture(Behavior::Guard),
        );
        assert_eq!(store.position(slot), Some(Position::new(2.0, 3.0)));
        assert_eq!(store.team_of("a"), Some(Team::Hostile));
        assert_eq!(store.mass(slot), Some(2.0));
        assert_eq!(store.max_hp(slot), Some(50.0));
        assert_eq!(store.state(slot), Some(UnitState::Idle));
        assert_eq!(store.cold(slot).and_then(|c| c.posture), Some(Behavior::Guard));
        assert!(store.is_consistent());
    }

    #[test]
    fn test_free_zeroes_slot() {
        let mut store = UnitStore::new(4);
        let slot = store.allocate("a", spawn(5.0, 5.0).with_tag("elite"));
        store.free("a");
        assert!(store.position(slot).is_none());
        assert_eq!(store.positions()[slot.index()], Position::default());
        assert_eq!(store.hp_column()[slot.index()], 0.0);
        assert!(store.cold_table()[slot.index()].tags.is_empty());
        assert!(store.free("a").is_none());
        assert!(store.is_consistent());
    }

    #[test]
    fn test_growth_preserves_contents() {
        let mut store = UnitStore::new(2);
        for i in 0..5 {
            store.allocate(&format!("u{i}"), spawn(i as f32, 1.0));
        }
        assert_eq!(store.capacity(), 8);
        for i in 0..5 {
            let p = store.position_of(&format!("u{i}")).unwrap();
            assert_eq!(p, Position::new(i as f32, 1.0));
        }
        assert!(store.is_consistent());
    }

    #[test]
    fn test_duplicate_allocate_reinitializes() {
        let mut store = UnitStore::new(4);
        let first = store.allocate("a", spawn(1.0, 1.0));
        store.mark_dead(first);
        let second = store.allocate("a", spawn(7.0, 7.0).with_hp(20.0));
        assert_eq!(first, second);
        assert_eq!(store.len(), 1);
        assert_eq!(store.state(second), Some(UnitState::Idle));
        assert_eq!(store.hp(second), Some(20.0));
        assert_eq!(store.position(second), Some(Position::new(7.0, 7.0)));
    }

    #[test]
    fn test_mark_dead_excludes_from_live() {
        let mut store = UnitStore::new(4);
        let a = store.allocate("a", spawn(0.0, 0.0));
        let b = store.allocate("b", spawn(1.0, 0.0));
        assert!(store.mark_dead(a));
        assert_eq!(store.iter_live().collect::<Vec<_>>(), vec![b]);
        assert_eq!(store.iter_active().count(), 2);
        assert!(!store.is_live(a));
    }

    #[test]
    fn test_position_bytes_len() {
        let store = UnitStore::new(3);
        assert_eq!(store.position_bytes().len(), 3 * 8);
    }
}
