//! # Collision Cache
//!
//! Per-tick list of melee-range neighbours for every live unit, derived
//! once from the [`SpatialGrid`] and shared by every consumer (melee
//! targeting, knockback, state maintenance).
//!
//! Stored compressed: `offsets[i]..offsets[i + 1]` indexes into one flat
//! `neighbors` buffer. Both buffers keep their allocation between ticks.

use crate::ecs::{Slot, UnitStore};

use super::grid::SpatialGrid;

/// Melee-range neighbour lists of the current tick.
pub struct CollisionCache {
    melee_radius: f32,
    knockback_radius: f32,
    offsets: Vec<u32>,
    neighbors: Vec<u32>,
    scratch: Vec<u32>,
}

impl CollisionCache {
    /// Creates an empty cache for the given radii.
    #[must_use]
    pub fn new(melee_radius: f32, knockback_radius: f32) -> Self {
        Self {
            melee_radius,
            knockback_radius,
            offsets: vec![0],
            neighbors: Vec::new(),
            scratch: Vec::new(),
        }
    }

    /// Melee radius used by [`CollisionCache::build`].
    #[inline]
    #[must_use]
    pub fn melee_radius(&self) -> f32 {
        self.melee_radius
    }

    /// Knockback radius used by [`CollisionCache::knockback_targets`].
    #[inline]
    #[must_use]
    pub fn knockback_radius(&self) -> f32 {
        self.knockback_radius
    }

    /// Total neighbour entries (each pair counted from both sides).
    #[inline]
    #[must_use]
    pub fn total_entries(&self) -> usize {
        self.neighbors.len()
    }

    /// Rebuilds every list from the current positions.
    ///
    /// `grid` must have been rebuilt from `store` this tick. Each list
    /// holds the other live units with `distance² <= melee²`, ascending.
    pub fn build(&mut self, store: &UnitStore, grid: &SpatialGrid) {
        self.offsets.clear();
        self.neighbors.clear();
        self.offsets.push(0);

        let radius_sq = self.melee_radius * self.melee_radius;
        let positions = store.positions();
        for index in 0..store.high_water() {
            let slot = Slot::new(index as u32);
            if store.is_live(slot) {
                let here = positions[index];
                grid.query_into(here.x, here.y, self.melee_radius, &mut self.scratch);
                self.scratch.sort_unstable();
                for &other in &self.scratch {
                    if other as usize != index
                        && here.distance_squared(positions[other as usize]) <= radius_sq
                    {
                        self.neighbors.push(other);
                    }
                }
            }
            self.offsets.push(self.neighbors.len() as u32);
        }
    }

    /// Cached neighbours of `slot` within melee radius, ascending.
    #[must_use]
    pub fn neighbors(&self, slot: Slot) -> &[u32] {
        let index = slot.index();
        if index + 1 >= self.offsets.len() {
            return &[];
        }
        &self.neighbors[self.offsets[index] as usize..self.offsets[index + 1] as usize]
    }

    /// Enemies of `slot` within melee radius.
    ///
    /// Cached neighbours are re-checked against the store: units freed or
    /// killed since the last build are skipped, and so is a new spawn that
    /// reused a freed slot unless it really stands within melee radius.
    pub fn melee_targets<'a>(
        &'a self,
        store: &'a UnitStore,
        slot: Slot,
    ) -> impl Iterator<Item = Slot> + 'a {
        let me = store.team(slot).zip(store.position(slot));
        let radius_sq = self.melee_radius * self.melee_radius;
        let teams = store.teams();
        let positions = store.positions();
        self.neighbors(slot)
            .iter()
            .filter(move |&&other| {
                let o = other as usize;
                store.is_live(Slot::new(other))
                    && me.is_some_and(|(team, here)| {
                        team.is_enemy_of(teams[o])
                            && here.distance_squared(positions[o]) <= radius_sq
                    })
            })
            .map(|&other| Slot::new(other))
    }

    /// Enemies of `slot` within knockback radius that are strictly lighter.
    pub fn knockback_targets<'a>(
        &'a self,
        store: &'a UnitStore,
        slot: Slot,
    ) -> impl Iterator<Item = Slot> + 'a {
        let radius_sq = self.knockback_radius * self.knockback_radius;
        let here = store.position(slot).unwrap_or_default();
        let mass = store.mass(slot).unwrap_or_default();
        let positions = store.positions();
        let masses = store.masses();
        self.melee_targets(store, slot).filter(move |other| {
            let o = other.index();
            masses[o] < mass && here.distance_squared(positions[o]) <= radius_sq
        })
    }

    /// Whether `slot` has at least one enemy within melee radius.
    #[must_use]
    pub fn has_melee_target(&self, store: &UnitStore, slot: Slot) -> bool {
        self.melee_targets(store, slot).next().is_some()
    }
}
