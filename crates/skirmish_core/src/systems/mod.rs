//! # Per-Tick Systems
//!
//! The two passes that run after the spatial structures are rebuilt:
//! - [`TargetingPass`]: nearest enemy/ally, behaviour, planned move, state
//! - [`MovementPass`]: conflict-free resolution of the planned moves

mod movement;
mod targeting;

pub use movement::{priority, MovementPass, MovementStats};
pub use targeting::{TargetingPass, Targets};
