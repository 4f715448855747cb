//! # Unit Identity
//!
//! Units are addressed two ways:
//! - A stable string identifier assigned by the spawner
//! - A [`Slot`]: the index into the dense hot arrays (the fast path)
//!
//! Low-frequency attributes (tags, posture, flags) live in [`ColdMeta`],
//! a side table aligned on the same slot index space.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::component::{Position, Team};

/// Index of a unit's storage location in the hot arrays.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Slot(u32);

impl Slot {
    /// Creates a slot from a raw index.
    #[inline]
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Raw index as stored in free lists and neighbour buffers.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Index into the column slices.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Movement behaviour driving the AI pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Behavior {
    /// Step toward the nearest enemy.
    Hunt,
    /// Occasionally step in a random cardinal direction.
    Wander,
    /// Stay close to the nearest ally.
    Guard,
    /// Drift toward the centroid of nearby same-team units.
    Swarm,
    /// Do not move.
    Wait,
}

impl Behavior {
    /// Lowercase name as used in tags and scenario files.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Behavior::Hunt => "hunt",
            Behavior::Wander => "wander",
            Behavior::Guard => "guard",
            Behavior::Swarm => "swarm",
            Behavior::Wait => "wait",
        }
    }

    /// Every behaviour, in declaration order.
    pub const ALL: [Behavior; 5] = [
        Behavior::Hunt,
        Behavior::Wander,
        Behavior::Guard,
        Behavior::Swarm,
        Behavior::Wait,
    ];

    /// Behaviour named by `tag`, ignoring ASCII case and surrounding
    /// whitespace. Does not allocate, so it is safe on the per-tick path.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        Self::ALL
            .into_iter()
            .find(|behavior| behavior.name().eq_ignore_ascii_case(tag))
    }
}

/// Returned when a string names no [`Behavior`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownBehavior(pub String);

impl fmt::Display for UnknownBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown behavior `{}`", self.0)
    }
}

impl std::error::Error for UnknownBehavior {}

impl FromStr for Behavior {
    type Err = UnknownBehavior;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s).ok_or_else(|| UnknownBehavior(s.to_string()))
    }
}

/// Cold, low-frequency metadata of one unit.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColdMeta {
    /// Free-form tags. A tag naming a behaviour is an explicit behaviour tag.
    pub tags: Vec<String>,
    /// Generic posture, consulted when no behaviour tag is present.
    pub posture: Option<Behavior>,
    /// Phantoms are ignored by swarm cohesion.
    pub phantom: bool,
}

impl ColdMeta {
    /// Resolves the behaviour that drives this unit.
    ///
    /// An explicit behaviour tag wins over the posture. With neither, the
    /// unit hunts if it carries any tag at all and waits otherwise.
    #[must_use]
    pub fn behavior(&self) -> Behavior {
        if let Some(tagged) = self.tags.iter().find_map(|t| Behavior::from_tag(t)) {
            return tagged;
        }
        if let Some(posture) = self.posture {
            return posture;
        }
        if self.tags.is_empty() {
            Behavior::Wait
        } else {
            Behavior::Hunt
        }
    }

    /// Empties the metadata while keeping the tag buffer's allocation.
    pub fn reset(&mut self) {
        self.tags.clear();
        self.posture = None;
        self.phantom = false;
    }
}

/// Initial fields of a unit handed to [`super::UnitStore::allocate`].
#[derive(Clone, Debug, PartialEq)]
pub struct UnitSpawn {
    /// Starting position.
    pub position: Position,
    /// Side.
    pub team: Team,
    /// Starting and maximum hit points.
    pub hp: f32,
    /// Mass. Callers keep this above zero.
    pub mass: f32,
    /// Damage dealt per hit (read by combat rules).
    pub damage: f32,
    /// Cold metadata.
    pub meta: ColdMeta,
}

impl UnitSpawn {
    /// A unit with 100 hp, unit mass and 10 damage at `(x, y)`.
    #[must_use]
    pub fn new(x: f32, y: f32, team: Team) -> Self {
        Self {
            position: Position::new(x, y),
            team,
            hp: 100.0,
            mass: 1.0,
            damage: 10.0,
            meta: ColdMeta::default(),
        }
    }

    /// Sets hit points.
    #[must_use]
    pub fn with_hp(mut self, hp: f32) -> Self {
        self.hp = hp;
        self
    }

    /// Sets mass.
    #[must_use]
    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    /// Sets damage.
    #[must_use]
    pub fn with_damage(mut self, damage: f32) -> Self {
        self.damage = damage;
        self
    }

    /// Sets the posture.
    #[must_use]
    pub fn with_posture(mut self, posture: Behavior) -> Self {
        self.meta.posture = Some(posture);
        self
    }

    /// Adds a tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.meta.tags.push(tag.into());
        self
    }

    /// Marks the unit as a phantom.
    #[must_use]
    pub fn phantom(mut self) -> Self {
        self.meta.phantom = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_behavior_resolution_order() {
        let mut meta = ColdMeta::default();
        assert_eq!(meta.behavior(), Behavior::Wait);

        meta.tags.push("elite".to_string());
        assert_eq!(meta.behavior(), Behavior::Hunt);

        meta.posture = Some(Behavior::Guard);
        assert_eq!(meta.behavior(), Behavior::Guard);

        meta.tags.push("Swarm".to_string());
        assert_eq!(meta.behavior(), Behavior::Swarm);
    }

    #[test]
    fn test_behavior_parse() {
        assert_eq!("wander".parse::<Behavior>(), Ok(Behavior::Wander));
        assert!("charge".parse::<Behavior>().is_err());
        for b in Behavior::ALL {
            assert_eq!(b.name().parse::<Behavior>(), Ok(b));
        }
    }

    #[test]
    fn test_from_tag_ignores_case_and_padding() {
        assert_eq!(Behavior::from_tag(" GUARD "), Some(Behavior::Guard));
        assert_eq!(Behavior::from_tag("Wait"), Some(Behavior::Wait));
        assert_eq!(Behavior::from_tag("elite"), None);
        assert_eq!(Behavior::from_tag(""), None);
    }

    #[test]
    fn test_reset_clears_meta() {
        let mut meta = UnitSpawn::new(0.0, 0.0, Team::Hostile)
            .with_tag("a")
            .with_posture(Behavior::Hunt)
            .phantom()
            .meta;
        meta.reset();
        assert_eq!(meta, ColdMeta::default());
    }
}
