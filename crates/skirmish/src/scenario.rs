//! # Scenarios
//!
//! Spawn lists for the headless runner, either read from TOML or generated
//! from a seed.
//!
//! ```toml
//! [[units]]
//! id = "scout"
//! x = 1.0
//! y = 1.0
//! team = "friendly"
//! posture = "hunt"
//!
//! [[units]]
//! id = "brute"
//! x = 5.0
//! y = 1.0
//! team = "hostile"
//! mass = 3.0
//! tags = ["elite"]
//! ```

use std::collections::HashSet;
use std::path::Path;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use skirmish_core::{Behavior, SimConfig, SimError, SimResult, Simulation, Team, UnitSpawn};

/// Postures handed out round-robin by [`Scenario::random`].
const RANDOM_POSTURES: [Behavior; 4] = [
    Behavior::Hunt,
    Behavior::Wander,
    Behavior::Guard,
    Behavior::Swarm,
];

fn default_hp() -> f32 {
    100.0
}

fn default_mass() -> f32 {
    1.0
}

fn default_damage() -> f32 {
    10.0
}

/// One unit of a scenario file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UnitEntry {
    /// Stable identifier.
    pub id: String,
    /// Start x.
    pub x: f32,
    /// Start y.
    pub y: f32,
    /// Side (defaults to neutral).
    #[serde(default)]
    pub team: Team,
    /// Hit points.
    #[serde(default = "default_hp")]
    pub hp: f32,
    /// Mass, above zero.
    #[serde(default = "default_mass")]
    pub mass: f32,
    /// Damage per hit.
    #[serde(default = "default_damage")]
    pub damage: f32,
    /// Free-form tags; a behaviour name here overrides `posture`.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Behaviour name.
    #[serde(default)]
    pub posture: Option<String>,
    /// Ignored by swarm cohesion.
    #[serde(default)]
    pub phantom: bool,
}

impl UnitEntry {
    /// Converts the entry into kernel spawn fields.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidScenario`] for an unknown posture or a
    /// mass that is not a positive number.
    pub fn to_spawn(&self) -> SimResult<UnitSpawn> {
        if !(self.mass.is_finite() && self.mass > 0.0) {
            return Err(SimError::InvalidScenario(format!(
                "unit `{}`: mass must be positive, got {}",
                self.id, self.mass
            )));
        }
        let mut spawn = UnitSpawn::new(self.x, self.y, self.team)
            .with_hp(self.hp)
            .with_mass(self.mass)
            .with_damage(self.damage);
        if let Some(posture) = &self.posture {
            let behavior = posture
                .parse::<Behavior>()
                .map_err(|e| SimError::InvalidScenario(format!("unit `{}`: {e}", self.id)))?;
            spawn = spawn.with_posture(behavior);
        }
        spawn.meta.tags.clone_from(&self.tags);
        spawn.meta.phantom = self.phantom;
        Ok(spawn)
    }
}

/// A spawn list.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// Units in spawn order.
    #[serde(default)]
    pub units: Vec<UnitEntry>,
}

impl Scenario {
    /// Parses and validates a scenario from TOML text.
    ///
    /// # Errors
    ///
    /// [`SimError::ConfigParse`] for malformed TOML,
    /// [`SimError::InvalidScenario`] for duplicate ids or bad entries.
    pub fn from_toml_str(text: &str) -> SimResult<Self> {
        let scenario: Self = toml::from_str(text)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Reads, parses and validates a scenario file.
    ///
    /// # Errors
    ///
    /// [`SimError::Io`] if the file cannot be read, otherwise as
    /// [`Scenario::from_toml_str`].
    pub fn from_file(path: impl AsRef<Path>) -> SimResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SimError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let scenario = Self::from_toml_str(&text)?;
        info!(path = %path.display(), units = scenario.units.len(), "scenario loaded");
        Ok(scenario)
    }

    /// Checks ids are unique and every entry converts.
    ///
    /// # Errors
    ///
    /// [`SimError::InvalidScenario`] naming the first offending unit.
    pub fn validate(&self) -> SimResult<()> {
        let mut seen = HashSet::with_capacity(self.units.len());
        for unit in &self.units {
            if !seen.insert(unit.id.as_str()) {
                return Err(SimError::InvalidScenario(format!(
                    "duplicate unit id `{}`",
                    unit.id
                )));
            }
            unit.to_spawn()?;
        }
        Ok(())
    }

    /// A seeded skirmish of `count` units on distinct cells of the field:
    /// half friendly, half hostile, postures round-robin, mass 1 to 3.
    ///
    /// `count` is capped at the number of cells.
    #[must_use]
    pub fn random(config: &SimConfig, count: usize) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let (cols, rows) = (config.width.floor() as u32, config.height.floor() as u32);
        let mut cells: Vec<(u32, u32)> = (0..cols)
            .flat_map(|x| (0..rows).map(move |y| (x, y)))
            .collect();
        if count > cells.len() {
            warn!(requested = count, cells = cells.len(), "more units than cells, capping");
        }
        cells.shuffle(&mut rng);

        let units = cells
            .iter()
            .take(count)
            .enumerate()
            .map(|(i, &(x, y))| UnitEntry {
                id: format!("unit-{i:04}"),
                x: x as f32,
                y: y as f32,
                team: if i % 2 == 0 { Team::Friendly } else { Team::Hostile },
                hp: default_hp(),
                mass: f32::from(rng.gen_range(1..=3_u8)),
                damage: default_damage(),
                tags: Vec::new(),
                posture: Some(RANDOM_POSTURES[(i / 2) % RANDOM_POSTURES.len()].name().to_string()),
                phantom: false,
            })
            .collect();
        Self { units }
    }

    /// Spawns every unit into `sim`.
    ///
    /// # Errors
    ///
    /// [`SimError::InvalidScenario`] if an entry fails to convert. Units
    /// before the failing one stay spawned.
    pub fn spawn_into(&self, sim: &mut Simulation) -> SimResult<usize> {
        for unit in &self.units {
            sim.spawn(&unit.id, unit.to_spawn()?);
        }
        Ok(self.units.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skirmish_core::UnitState;

    const DUEL: &str = r#"
        [[units]]
        id = "a"
        x = 1.0
        y = 1.0
        team = "friendly"
        posture = "hunt"

        [[units]]
        id = "b"
        x = 5.0
        y = 1.0
        team = "hostile"
        mass = 3.0
        tags = ["elite"]
        phantom = true
    "#;

    #[test]
    fn test_parse_duel() {
        let scenario = Scenario::from_toml_str(DUEL).unwrap();
        assert_eq!(scenario.units.len(), 2);
        let b = scenario.units[1].to_spawn().unwrap();
        assert_eq!(b.team, Team::Hostile);
        assert!((b.mass - 3.0).abs() < f32::EPSILON);
        assert!(b.meta.phantom);
        // a plain tag with no posture falls back to hunt
        assert_eq!(b.meta.behavior(), Behavior::Hunt);
    }

    #[test]
    fn test_rejects_duplicates_and_bad_postures() {
        let dup = "[[units]]\nid = \"a\"\nx = 0.0\ny = 0.0\n[[units]]\nid = \"a\"\nx = 1.0\ny = 0.0\n";
        assert!(matches!(Scenario::from_toml_str(dup), Err(SimError::InvalidScenario(_))));

        let bad = "[[units]]\nid = \"a\"\nx = 0.0\ny = 0.0\nposture = \"charge\"\n";
        assert!(matches!(Scenario::from_toml_str(bad), Err(SimError::InvalidScenario(_))));

        let heavy = "[[units]]\nid = \"a\"\nx = 0.0\ny = 0.0\nmass = 0.0\n";
        assert!(matches!(Scenario::from_toml_str(heavy), Err(SimError::InvalidScenario(_))));

        let typo = "[[units]]\nid = \"a\"\nx = 0.0\ny = 0.0\nteam = \"blue\"\n";
        assert!(matches!(Scenario::from_toml_str(typo), Err(SimError::ConfigParse(_))));
    }

    #[test]
    fn test_random_is_seeded_and_balanced() {
        let config = SimConfig {
            width: 10.0,
            height: 10.0,
            ..SimConfig::default()
        };
        let a = Scenario::random(&config, 20);
        assert_eq!(a, Scenario::random(&config, 20));
        let friendly = a.units.iter().filter(|u| u.team == Team::Friendly).count();
        assert_eq!(friendly, 10);
        let cells: HashSet<_> = a.units.iter().map(|u| (u.x as i32, u.y as i32)).collect();
        assert_eq!(cells.len(), 20);
        assert_eq!(Scenario::random(&config, 500).units.len(), 100);
    }

    #[test]
    fn test_spawn_into_simulation() {
        let mut sim = Simulation::new(SimConfig::default()).unwrap();
        let scenario = Scenario::from_toml_str(DUEL).unwrap();
        assert_eq!(scenario.spawn_into(&mut sim).unwrap(), 2);
        assert_eq!(sim.store().len(), 2);
        assert_eq!(sim.store().state_of("a"), Some(UnitState::Idle));
    }
}
