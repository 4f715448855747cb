//! # Component Stores
//!
//! Single-concern stores with their own slot lifecycle, for subsystems
//! that must not share slots with the unit store.
//!
//! - [`PhysicsStore`]: velocity, acceleration, mass and bounciness
//! - [`KinematicsStore`]: position and planned move

mod kinematics;
mod physics;

pub use kinematics::KinematicsStore;
pub use physics::{Acceleration, PhysicsBody, PhysicsStore};
