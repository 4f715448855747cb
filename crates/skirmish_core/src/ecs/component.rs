//! # Hot Columns
//!
//! Plain data stored in the dense per-slot arrays. Nothing here owns heap
//! memory, so a freed slot is reset by writing `Default::default()`.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// Position on the field, in grid units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
#[repr(C)]
pub struct Position {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
}

impl Position {
    /// Creates a new position.
    #[inline]
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Squared distance to another position. Callers compare this against a
    /// squared radius, never a square root.
    #[inline]
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// The grid cell this position rounds to.
    #[inline]
    #[must_use]
    pub fn rounded(self) -> (i32, i32) {
        (self.x.round() as i32, self.y.round() as i32)
    }

    /// Returns this position shifted by a move.
    #[inline]
    #[must_use]
    pub fn offset(self, delta: MoveIntent) -> Self {
        Self::new(self.x + delta.dx, self.y + delta.dy)
    }

    /// Clamps into `[0, width - 1] x [0, height - 1]`, which keeps both the
    /// raw and the rounded coordinates inside `[0, width) x [0, height)`.
    #[inline]
    #[must_use]
    pub fn clamped(self, width: f32, height: f32) -> Self {
        Self::new(
            self.x.clamp(0.0, (width - 1.0).max(0.0)),
            self.y.clamp(0.0, (height - 1.0).max(0.0)),
        )
    }
}

/// Per-tick displacement committed by the movement pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
#[repr(C)]
pub struct Velocity {
    /// X component.
    pub x: f32,
    /// Y component.
    pub y: f32,
}

impl Velocity {
    /// Creates a new velocity.
    #[inline]
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Zero velocity.
    pub const ZERO: Self = Self::new(0.0, 0.0);
}

/// Movement a unit intends to make this tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
#[repr(C)]
pub struct MoveIntent {
    /// X delta.
    pub dx: f32,
    /// Y delta.
    pub dy: f32,
}

impl MoveIntent {
    /// Creates a new intent.
    #[inline]
    #[must_use]
    pub const fn new(dx: f32, dy: f32) -> Self {
        Self { dx, dy }
    }

    /// No movement.
    pub const STAY: Self = Self::new(0.0, 0.0);

    /// Whether this intent moves the unit at all.
    #[inline]
    #[must_use]
    pub fn is_stay(self) -> bool {
        self.dx == 0.0 && self.dy == 0.0
    }
}

/// Side a unit fights for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Team {
    /// Player side.
    Friendly = 0,
    /// Opposing side.
    Hostile = 1,
    /// Nobody's enemy.
    #[default]
    Neutral = 2,
}

impl Team {
    /// Friendly and hostile are mutual enemies. Neutral is nobody's enemy.
    #[inline]
    #[must_use]
    pub const fn is_enemy_of(self, other: Self) -> bool {
        matches!(
            (self, other),
            (Team::Friendly, Team::Hostile) | (Team::Hostile, Team::Friendly)
        )
    }

    /// Units on the same team are allies.
    #[inline]
    #[must_use]
    pub fn is_ally_of(self, other: Self) -> bool {
        self == other
    }
}

/// Coarse lifecycle/activity state of a unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum UnitState {
    /// Standing still.
    #[default]
    Idle = 0,
    /// Planned a move this tick.
    Walking = 1,
    /// Has an enemy within melee reach.
    Attacking = 2,
    /// Marked dead by an external rule; skipped by every pass.
    Dead = 3,
}

impl UnitState {
    /// Whether the unit has been marked dead.
    #[inline]
    #[must_use]
    pub const fn is_dead(self) -> bool {
        matches!(self, UnitState::Dead)
    }
}
