//! # SKIRMISH
//!
//! Headless front end for the simulation kernel.
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │  SimConfig   │    │   Scenario   │    │    runner    │
//! │  (TOML)      │───>│  (TOML/seed) │───>│  tick loop   │──> RunSummary
//! └──────────────┘    └──────────────┘    └──────────────┘
//! ```
//!
//! ## Modules
//!
//! - `scenario`: spawn lists, loaded from files or generated from a seed
//! - `runner`: fixed-length runs and their statistics

pub mod runner;
pub mod scenario;

pub use skirmish_core as core;

pub use runner::{run, RunSummary};
pub use scenario::{Scenario, UnitEntry};
