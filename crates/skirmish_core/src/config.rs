//! # Simulation Configuration
//!
//! Loaded once at startup from TOML. Every field falls back to the named
//! constant in [`crate::constants`], so an empty file is a valid config.
//!
//! ```toml
//! width = 48.0
//! height = 32.0
//! seed = 7
//! wander_rate = 0.1
//! reduced_fidelity = true
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CELL_SIZE, DEFAULT_FIELD_HEIGHT, DEFAULT_FIELD_WIDTH, DEFAULT_FRICTION,
    DEFAULT_INITIAL_CAPACITY, DEFAULT_SEED, DEFAULT_WANDER_RATE, GUARD_DISTANCE,
    KNOCKBACK_RADIUS, MELEE_RADIUS, REDUCED_SEARCH_RADIUS, SEARCH_RADIUS, SWARM_RADIUS,
};
use crate::error::{SimError, SimResult};

/// Tunables for one simulation run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    /// Field width in grid units. Positions stay in `[0, width)`.
    pub width: f32,
    /// Field height in grid units. Positions stay in `[0, height)`.
    pub height: f32,
    /// Seed of the shared random source.
    pub seed: u64,
    /// Slots reserved before the first doubling.
    pub initial_capacity: usize,
    /// Spatial grid cell edge length.
    pub cell_size: f32,
    /// Collision cache radius.
    pub melee_radius: f32,
    /// Knockback radius (subset of the melee radius).
    pub knockback_radius: f32,
    /// Nearest enemy/ally search radius.
    pub search_radius: f32,
    /// Search radius used when `reduced_fidelity` is set.
    pub reduced_search_radius: f32,
    /// Use the smaller search radius.
    pub reduced_fidelity: bool,
    /// Per-tick step probability for wandering units, in `[0, 1]`.
    pub wander_rate: f32,
    /// Guards close in on their ally beyond this distance.
    pub guard_distance: f32,
    /// Swarm cohesion radius.
    pub swarm_radius: f32,
    /// Per-tick velocity multiplier applied by the physics store.
    pub friction: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_FIELD_WIDTH,
            height: DEFAULT_FIELD_HEIGHT,
            seed: DEFAULT_SEED,
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            cell_size: DEFAULT_CELL_SIZE,
            melee_radius: MELEE_RADIUS,
            knockback_radius: KNOCKBACK_RADIUS,
            search_radius: SEARCH_RADIUS,
            reduced_search_radius: REDUCED_SEARCH_RADIUS,
            reduced_fidelity: false,
            wander_rate: DEFAULT_WANDER_RATE,
            guard_distance: GUARD_DISTANCE,
            swarm_radius: SWARM_RADIUS,
            friction: DEFAULT_FRICTION,
        }
    }
}

impl SimConfig {
    /// Parses and validates a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::ConfigParse`] for malformed TOML and
    /// [`SimError::InvalidConfig`] for out-of-range values.
    pub fn from_toml_str(text: &str) -> SimResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Io`] if the file cannot be read, otherwise the
    /// same errors as [`SimConfig::from_toml_str`].
    pub fn from_file(path: impl AsRef<Path>) -> SimResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SimError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Checks that every value is usable by the kernel.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> SimResult<()> {
        fn positive(name: &str, value: f32) -> SimResult<()> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(SimError::InvalidConfig(format!(
                    "{name} must be a positive finite number, got {value}"
                )))
            }
        }

        fn unit_interval(name: &str, value: f32) -> SimResult<()> {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(SimError::InvalidConfig(format!(
                    "{name} must lie in [0, 1], got {value}"
                )))
            }
        }

        positive("width", self.width)?;
        positive("height", self.height)?;
        if self.width < 1.0 || self.height < 1.0 {
            return Err(SimError::InvalidConfig(format!(
                "field must be at least one cell wide, got {}x{}",
                self.width, self.height
            )));
        }
        positive("cell_size", self.cell_size)?;
        positive("melee_radius", self.melee_radius)?;
        positive("knockback_radius", self.knockback_radius)?;
        positive("search_radius", self.search_radius)?;
        positive("reduced_search_radius", self.reduced_search_radius)?;
        positive("guard_distance", self.guard_distance)?;
        positive("swarm_radius", self.swarm_radius)?;
        unit_interval("wander_rate", self.wander_rate)?;
        unit_interval("friction", self.friction)?;

        if self.knockback_radius > self.melee_radius {
            return Err(SimError::InvalidConfig(format!(
                "knockback_radius ({}) must not exceed melee_radius ({})",
                self.knockback_radius, self.melee_radius
            )));
        }
        if self.initial_capacity == 0 {
            return Err(SimError::InvalidConfig(
                "initial_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// The search radius in effect for the current fidelity mode.
    #[inline]
    #[must_use]
    pub fn effective_search_radius(&self) -> f32 {
        if self.reduced_fidelity {
            self.reduced_search_radius
        } else {
            self.search_radius
        }
    }
}
