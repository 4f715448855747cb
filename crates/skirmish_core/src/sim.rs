//! # Tick Pipeline
//!
//! [`Simulation`] owns the unit store, the spatial structures, both
//! passes and the seeded random source, and runs them in a fixed order:
//!
//! ```text
//! rebuild grid → build collision cache → targeting pass → movement pass
//! ```
//!
//! A tick runs to completion before the next one starts. Given the same
//! seed, spawn list and tick sequence, two runs produce identical
//! trajectories (see [`Simulation::state_digest`]).

use std::time::Instant;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::config::SimConfig;
use crate::ecs::{Slot, UnitSpawn, UnitStore};
use crate::error::SimResult;
use crate::spatial::{CollisionCache, SpatialGrid};
use crate::stores::PhysicsStore;
use crate::systems::{MovementPass, TargetingPass};

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Statistics of one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickStats {
    /// Tick number (1-based).
    pub tick: u64,
    /// Live (active, non-dead) units at the start of the tick.
    pub live_units: usize,
    /// Units that planned a move.
    pub planned: usize,
    /// Units whose position changed.
    pub moved: usize,
    /// Contested candidate cells.
    pub conflicts: usize,
    /// Units placed on a neighbouring cell.
    pub displaced: usize,
    /// Units sent back to their pre-tick position.
    pub reverted: usize,
    /// Wall time of the tick in microseconds.
    pub tick_us: u64,
}

/// The simulation kernel.
///
/// # Example
///
/// ```rust,ignore
/// let mut sim = Simulation::new(SimConfig::default())?;
/// sim.spawn("a", UnitSpawn::new(1.0, 1.0, Team::Friendly).with_posture(Behavior::Hunt));
/// sim.spawn("b", UnitSpawn::new(5.0, 1.0, Team::Hostile));
/// let stats = sim.tick();
/// ```
pub struct Simulation {
    config: SimConfig,
    store: UnitStore,
    grid: SpatialGrid,
    cache: CollisionCache,
    targeting: TargetingPass,
    movement: MovementPass,
    physics: PhysicsStore,
    rng: ChaCha8Rng,
    tick: u64,
    /// Set by [`Simulation::plan`], consumed by [`Simulation::resolve`].
    pending: Option<(Instant, usize, usize)>,
}

impl Simulation {
    /// Creates an empty simulation.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SimError::InvalidConfig`] if `config` fails
    /// validation.
    pub fn new(config: SimConfig) -> SimResult<Self> {
        config.validate()?;
        info!(
            width = config.width,
            height = config.height,
            seed = config.seed,
            reduced_fidelity = config.reduced_fidelity,
            "simulation created"
        );
        Ok(Self {
            store: UnitStore::new(config.initial_capacity),
            grid: SpatialGrid::new(config.width, config.height, config.cell_size),
            cache: CollisionCache::new(config.melee_radius, config.knockback_radius),
            targeting: TargetingPass::new(),
            movement: MovementPass::new(config.width, config.height),
            physics: PhysicsStore::from_config(&config),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            tick: 0,
            pending: None,
            config,
        })
    }

    /// Active configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// The unit store.
    #[inline]
    #[must_use]
    pub fn store(&self) -> &UnitStore {
        &self.store
    }

    /// The unit store, mutably (damage rules, overrides of planned moves).
    #[inline]
    pub fn store_mut(&mut self) -> &mut UnitStore {
        &mut self.store
    }

    /// The spatial grid as of the last tick's start.
    #[inline]
    #[must_use]
    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    /// The collision cache as of the last tick's start.
    #[inline]
    #[must_use]
    pub fn cache(&self) -> &CollisionCache {
        &self.cache
    }

    /// Physics bodies for rules that want a physical response. Shares
    /// identifiers with the unit store but not its lifecycle.
    #[inline]
    #[must_use]
    pub fn physics(&self) -> &PhysicsStore {
        &self.physics
    }

    /// Physics bodies, mutably.
    #[inline]
    pub fn physics_mut(&mut self) -> &mut PhysicsStore {
        &mut self.physics
    }

    /// Ticks completed so far.
    #[inline]
    #[must_use]
    pub const fn current_tick(&self) -> u64 {
        self.tick
    }

    // =========================================================================
    // Spawn collaborator
    // =========================================================================

    /// Adds a unit. A live `id` is re-initialized in place.
    pub fn spawn(&mut self, id: &str, spawn: UnitSpawn) -> Slot {
        self.store.allocate(id, spawn)
    }

    /// Removes a unit. Unknown ids are a no-op.
    pub fn despawn(&mut self, id: &str) -> Option<Slot> {
        self.store.free(id)
    }

    /// Frees every unit marked dead, in ascending slot order.
    ///
    /// Returns how many were freed.
    pub fn despawn_dead(&mut self) -> usize {
        let dead: Vec<String> = self
            .store
            .iter_active()
            .filter(|&slot| !self.store.is_live(slot))
            .filter_map(|slot| self.store.id_of(slot).map(str::to_owned))
            .collect();
        for id in &dead {
            self.store.free(id);
        }
        if !dead.is_empty() {
            debug!(count = dead.len(), "despawned dead units");
        }
        dead.len()
    }

    // =========================================================================
    // Tick
    // =========================================================================

    /// First half of a tick: rebuilds the grid and cache and plans moves.
    ///
    /// Planned moves can be read or overridden through
    /// [`Simulation::store_mut`] before [`Simulation::resolve`].
    pub fn plan(&mut self) -> usize {
        let started = Instant::now();
        let live = self.store.iter_live().count();
        self.grid.rebuild(&self.store);
        self.cache.build(&self.store, &self.grid);
        let planned = self.targeting.run(
            &mut self.store,
            &self.grid,
            &self.cache,
            &self.config,
            &mut self.rng,
        );
        self.pending = Some((started, live, planned));
        planned
    }

    /// Second half of a tick: resolves and commits the planned moves.
    pub fn resolve(&mut self) -> TickStats {
        let (started, live_units, planned) = self.pending.take().unwrap_or_else(|| {
            (Instant::now(), self.store.iter_live().count(), 0)
        });
        let movement = self.movement.run(&mut self.store);
        self.tick += 1;

        let stats = TickStats {
            tick: self.tick,
            live_units,
            planned,
            moved: movement.moved,
            conflicts: movement.conflicts,
            displaced: movement.displaced,
            reverted: movement.reverted,
            tick_us: started.elapsed().as_micros() as u64,
        };
        debug!(
            tick = stats.tick,
            live = stats.live_units,
            moved = stats.moved,
            conflicts = stats.conflicts,
            displaced = stats.displaced,
            reverted = stats.reverted,
            tick_us = stats.tick_us,
            "tick complete"
        );
        stats
    }

    /// Runs one full tick.
    pub fn tick(&mut self) -> TickStats {
        self.plan();
        self.resolve()
    }

    // =========================================================================
    // Queries for combat rules
    // =========================================================================

    /// Enemies within melee radius of `slot` (as of the last tick's start).
    pub fn melee_targets(&self, slot: Slot) -> impl Iterator<Item = Slot> + '_ {
        self.cache.melee_targets(&self.store, slot)
    }

    /// Strictly lighter enemies within knockback radius of `slot`.
    pub fn knockback_targets(&self, slot: Slot) -> impl Iterator<Item = Slot> + '_ {
        self.cache.knockback_targets(&self.store, slot)
    }

    /// FNV-1a digest of slot, position and state of every active unit.
    ///
    /// Two runs with equal digests after every tick followed identical
    /// trajectories.
    #[must_use]
    pub fn state_digest(&self) -> u64 {
        let fold = |hash: u64, bytes: &[u8]| {
            bytes
                .iter()
                .fold(hash, |h, &b| (h ^ u64::from(b)).wrapping_mul(FNV_PRIME))
        };
        let positions = self.store.positions();
        let states = self.store.states();
        self.store.iter_active().fold(FNV_OFFSET, |hash, slot| {
            let index = slot.index();
            let hash = fold(hash, &slot.raw().to_le_bytes());
            let hash = fold(hash, bytemuck::bytes_of(&positions[index]));
            fold(hash, &[states[index] as u8])
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::{Behavior, MoveIntent, Position, Team, UnitState};
    use crate::stores::PhysicsBody;
    use crate::SimError;

    #[test]
    fn test_rejects_invalid_config() {
        let config = SimConfig {
            cell_size: -1.0,
            ..SimConfig::default()
        };
        assert!(matches!(Simulation::new(config), Err(SimError::InvalidConfig(_))));
    }

    #[test]
    fn test_physics_store_follows_config_friction() {
        let config = SimConfig {
            friction: 0.25,
            ..SimConfig::default()
        };
        let mut sim = Simulation::new(config).unwrap();
        assert!((sim.physics().friction() - 0.25).abs() < f32::EPSILON);

        let physics = sim.physics_mut();
        let slot = physics.allocate("crate", PhysicsBody::new(1.0).with_velocity(4.0, 0.0));
        physics.update_physics();
        assert_eq!(physics.velocity(slot).map(|v| v.x), Some(1.0));
    }

    #[test]
    fn test_tick_counts_and_stats() {
        let mut sim = Simulation::new(SimConfig::default()).unwrap();
        sim.spawn("a", UnitSpawn::new(1.0, 1.0, Team::Friendly).with_posture(Behavior::Hunt));
        sim.spawn("b", UnitSpawn::new(5.0, 1.0, Team::Hostile));
        let stats = sim.tick();
        assert_eq!(stats.tick, 1);
        assert_eq!(stats.live_units, 2);
        assert_eq!(stats.planned, 1);
        assert_eq!(stats.moved, 1);
        assert_eq!(sim.current_tick(), 1);
        assert_eq!(sim.store().position_of("a"), Some(Position::new(2.0, 1.0)));
    }

    #[test]
    fn test_plan_override_resolve() {
        let mut sim = Simulation::new(SimConfig::default()).unwrap();
        let a = sim.spawn("a", UnitSpawn::new(1.0, 1.0, Team::Friendly).with_posture(Behavior::Hunt));
        sim.spawn("b", UnitSpawn::new(5.0, 1.0, Team::Hostile));
        sim.plan();
        assert_eq!(sim.store().intended(a), Some(MoveIntent::new(1.0, 0.0)));
        sim.store_mut().set_intended(a, MoveIntent::new(0.0, 1.0));
        sim.resolve();
        assert_eq!(sim.store().position(a), Some(Position::new(1.0, 2.0)));
    }

    #[test]
    fn test_despawn_dead_frees_in_order() {
        let mut sim = Simulation::new(SimConfig::default()).unwrap();
        let a = sim.spawn("a", UnitSpawn::new(1.0, 1.0, Team::Friendly));
        sim.spawn("b", UnitSpawn::new(3.0, 1.0, Team::Friendly));
        let c = sim.spawn("c", UnitSpawn::new(5.0, 1.0, Team::Friendly));
        sim.store_mut().mark_dead(a);
        sim.store_mut().mark_dead(c);
        assert_eq!(sim.despawn_dead(), 2);
        assert_eq!(sim.store().len(), 1);
        // freed a then c: c's slot is reused first
        assert_eq!(sim.spawn("d", UnitSpawn::new(0.0, 0.0, Team::Neutral)), c);
        assert!(sim.store().is_consistent());
    }

    #[test]
    fn test_melee_queries_after_tick() {
        let mut sim = Simulation::new(SimConfig::default()).unwrap();
        let a = sim.spawn("a", UnitSpawn::new(5.0, 5.0, Team::Friendly).with_mass(2.0));
        let b = sim.spawn("b", UnitSpawn::new(6.0, 5.0, Team::Hostile));
        sim.tick();
        assert_eq!(sim.melee_targets(a).collect::<Vec<_>>(), vec![b]);
        assert_eq!(sim.knockback_targets(a).collect::<Vec<_>>(), vec![b]);
        assert_eq!(sim.knockback_targets(b).count(), 0);
        assert_eq!(sim.store().state(a), Some(UnitState::Attacking));
    }

    #[test]
    fn test_digest_tracks_positions() {
        let mut sim = Simulation::new(SimConfig::default()).unwrap();
        sim.spawn("a", UnitSpawn::new(1.0, 1.0, Team::Friendly).with_posture(Behavior::Hunt));
        sim.spawn("b", UnitSpawn::new(9.0, 1.0, Team::Hostile));
        let before = sim.state_digest();
        sim.tick();
        assert_ne!(before, sim.state_digest());
    }
}
