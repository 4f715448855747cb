//! # Spatial Queries
//!
//! Neighbour lookup structures rebuilt from scratch every tick:
//! - [`SpatialGrid`]: uniform bucket grid, radius queries return a superset
//! - [`CollisionCache`]: exact melee-range neighbour lists derived from it

mod collision;
mod grid;

pub use collision::CollisionCache;
pub use grid::SpatialGrid;
