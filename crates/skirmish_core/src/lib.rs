//! # SKIRMISH Core
//!
//! Data-oriented simulation kernel for many units on a 2D grid:
//! - Dense unit store with an identifier map and a free list
//! - Uniform spatial grid and a per-tick collision cache
//! - Targeting/AI pass (hunt, wander, guard, swarm, wait)
//! - Movement & collision resolution with no two units on one cell
//! - Free-list physics and kinematics component stores
//!
//! ## Architecture Rules
//!
//! 1. **Single-threaded** - a tick runs to completion, slots in ascending order
//! 2. **Deterministic** - all randomness comes from one seeded generator
//! 3. **Rebuilt, not patched** - the grid and cache are recomputed every tick
//! 4. **No errors mid-tick** - unknown ids are `None`, blocked units revert
//!
//! ## Example
//!
//! ```rust,ignore
//! use skirmish_core::{Behavior, SimConfig, Simulation, Team, UnitSpawn};
//!
//! let mut sim = Simulation::new(SimConfig::default())?;
//! sim.spawn("a", UnitSpawn::new(1.0, 1.0, Team::Friendly).with_posture(Behavior::Hunt));
//! sim.spawn("b", UnitSpawn::new(5.0, 1.0, Team::Hostile));
//! for _ in 0..3 {
//!     sim.tick();
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod constants;
pub mod ecs;
pub mod error;
pub mod sim;
pub mod spatial;
pub mod stores;
pub mod systems;

pub use config::SimConfig;
pub use ecs::{
    Allocation, Behavior, ColdMeta, ColumnStorage, MoveIntent, Position, Slot, SlotAllocator,
    Team, UnitSpawn, UnitState, UnitStore, UnknownBehavior, Velocity,
};
pub use error::{SimError, SimResult};
pub use sim::{Simulation, TickStats};
pub use spatial::{CollisionCache, SpatialGrid};
pub use stores::{Acceleration, KinematicsStore, PhysicsBody, PhysicsStore};
pub use systems::{priority, MovementPass, MovementStats, TargetingPass, Targets};
