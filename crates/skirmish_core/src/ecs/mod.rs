//! # Unit Storage
//!
//! Dense, data-oriented storage for every unit of the simulation.
//!
//! ## Design Philosophy
//!
//! - Units are addressed by [`Slot`] on the hot path, by string id elsewhere
//! - One dense column per field, cache-friendly sequential iteration
//! - Freed slots are zeroed and recycled last-in first-out
//! - Cold metadata sits in a side table on the same index space

mod allocator;
mod component;
mod entity;
mod storage;
mod world;

pub use allocator::{Allocation, SlotAllocator};
pub use component::{MoveIntent, Position, Team, UnitState, Velocity};
pub use entity::{Behavior, ColdMeta, Slot, UnitSpawn, UnknownBehavior};
pub use storage::ColumnStorage;
pub use world::UnitStore;
