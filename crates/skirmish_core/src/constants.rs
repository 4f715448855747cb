//! # Kernel Constants
//!
//! Default tuning values for the simulation kernel.
//!
//! **CRITICAL:** Combat balance in the surrounding rules depends on the
//! radii below. They are the defaults of [`crate::SimConfig`]; change them
//! there per run, not here.

// =============================================================================
// FIELD
// =============================================================================

/// Default field width in grid units.
pub const DEFAULT_FIELD_WIDTH: f32 = 64.0;

/// Default field height in grid units.
pub const DEFAULT_FIELD_HEIGHT: f32 = 64.0;

/// Default seed for the shared random source.
pub const DEFAULT_SEED: u64 = 42;

/// Slots reserved by a fresh store before the first doubling.
pub const DEFAULT_INITIAL_CAPACITY: usize = 64;

// =============================================================================
// SPATIAL QUERIES
// =============================================================================

/// Edge length of one spatial grid cell (grid units).
pub const DEFAULT_CELL_SIZE: f32 = 5.0;

/// Melee reach. Neighbours within this distance land in the collision cache.
pub const MELEE_RADIUS: f32 = 1.5;

/// Knockback reach. Must not exceed [`MELEE_RADIUS`].
pub const KNOCKBACK_RADIUS: f32 = 1.1;

/// Nearest enemy/ally search radius at full fidelity.
pub const SEARCH_RADIUS: f32 = 15.0;

/// Nearest enemy/ally search radius in reduced-fidelity mode.
pub const REDUCED_SEARCH_RADIUS: f32 = 5.0;

// =============================================================================
// BEHAVIOR
// =============================================================================

/// Per-tick probability that a wandering unit takes a step.
pub const DEFAULT_WANDER_RATE: f32 = 0.25;

/// Guards only close in on their ally beyond this distance.
pub const GUARD_DISTANCE: f32 = 2.0;

/// Swarm cohesion radius (compared squared: 25).
pub const SWARM_RADIUS: f32 = 5.0;

/// Swarm units do not step on an axis whose offset to the centroid is
/// within this slack. Stops two neighbours from swapping cells forever.
pub const SWARM_COHESION_SLACK: f32 = 1.0;

/// Length of one movement step in grid units.
pub const GRID_STEP: f32 = 1.0;

// =============================================================================
// RESOLUTION & PHYSICS
// =============================================================================

/// Weight of mass in the collision priority score `mass * 10 + hp`.
pub const PRIORITY_MASS_WEIGHT: f32 = 10.0;

/// Displacement search order around a contested cell.
///
/// Cardinals first, then diagonals. The order is load-bearing for
/// determinism.
pub const DISPLACEMENT_OFFSETS: [(i32, i32); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (-1, 1),
    (1, -1),
    (-1, -1),
];

/// Default per-tick velocity multiplier of the physics store.
pub const DEFAULT_FRICTION: f32 = 0.9;

/// Default bounciness of a freshly allocated physics body.
pub const DEFAULT_BOUNCINESS: f32 = 1.0;
