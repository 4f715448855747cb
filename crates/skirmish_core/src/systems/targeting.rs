//! # Targeting Pass
//!
//! For every live unit, in ascending slot order:
//! 1. Find the nearest enemy and nearest ally within the search radius
//! 2. Turn that plus the unit's [`Behavior`] into a planned move
//! 3. Refresh the unit's [`UnitState`]
//!
//! Distances are compared squared. Candidates are visited in ascending
//! slot order with strict comparisons, so the lowest slot wins a tie.
//! Random draws come only from the generator handed in by the caller.

use rand::Rng;

use crate::config::SimConfig;
use crate::constants::{DISPLACEMENT_OFFSETS, GRID_STEP, SWARM_COHESION_SLACK};
use crate::ecs::{Behavior, MoveIntent, Position, Slot, UnitState, UnitStore};
use crate::spatial::{CollisionCache, SpatialGrid};

/// Nearest enemy and ally of one unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Targets {
    /// Nearest enemy within the search radius.
    pub enemy: Option<Slot>,
    /// Nearest ally (same team, not itself) within the search radius.
    pub ally: Option<Slot>,
}

/// One grid step toward the sign of `offset`, or nothing when aligned.
#[inline]
fn step_toward(offset: f32) -> f32 {
    if offset > 0.0 {
        GRID_STEP
    } else if offset < 0.0 {
        -GRID_STEP
    } else {
        0.0
    }
}

/// Plans moves for every live unit.
///
/// Owns its candidate buffer, so a pass allocates only while that buffer
/// is still growing.
#[derive(Default)]
pub struct TargetingPass {
    candidates: Vec<u32>,
}

impl TargetingPass {
    /// Creates a pass with an empty candidate buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Nearest enemy and ally of `slot` within `radius`.
    ///
    /// `grid` must hold the current positions.
    pub fn nearest(
        &mut self,
        store: &UnitStore,
        grid: &SpatialGrid,
        slot: Slot,
        radius: f32,
    ) -> Targets {
        let index = slot.index();
        let here = store.positions()[index];
        grid.query_into(here.x, here.y, radius, &mut self.candidates);
        self.candidates.sort_unstable();
        nearest_in(store, &self.candidates, slot, here, radius * radius)
    }

    /// Plans a move for every live unit and refreshes its state.
    ///
    /// Returns how many units planned to move.
    pub fn run<R: Rng>(
        &mut self,
        store: &mut UnitStore,
        grid: &SpatialGrid,
        cache: &CollisionCache,
        config: &SimConfig,
        rng: &mut R,
    ) -> usize {
        let search = config.effective_search_radius();
        let melee_sq = config.melee_radius * config.melee_radius;
        let mut planned = 0;

        for index in 0..store.high_water() {
            let slot = Slot::new(index as u32);
            if !store.is_live(slot) {
                continue;
            }
            let here = store.positions()[index];
            let behavior = store.cold_table()[index].behavior();

            let intent = match behavior {
                Behavior::Hunt => {
                    let enemy = self.nearest(store, grid, slot, search).enemy;
                    hunt(store, here, enemy, melee_sq)
                }
                Behavior::Wander => wander(rng, config.wander_rate),
                Behavior::Guard => {
                    let ally = self.nearest(store, grid, slot, search).ally;
                    guard(store, here, ally, config.guard_distance)
                }
                Behavior::Swarm => self.swarm(store, grid, slot, config, rng),
                Behavior::Wait => MoveIntent::STAY,
            };

            let state = if cache.has_melee_target(store, slot) {
                UnitState::Attacking
            } else if intent.is_stay() {
                UnitState::Idle
            } else {
                UnitState::Walking
            };
            if !intent.is_stay() {
                planned += 1;
            }
            store.set_intended(slot, intent);
            store.set_state(slot, state);
        }
        planned
    }

    fn swarm<R: Rng>(
        &mut self,
        store: &UnitStore,
        grid: &SpatialGrid,
        slot: Slot,
        config: &SimConfig,
        rng: &mut R,
    ) -> MoveIntent {
        let index = slot.index();
        let here = store.positions()[index];
        let team = store.teams()[index];
        let radius_sq = config.swarm_radius * config.swarm_radius;

        grid.query_into(here.x, here.y, config.swarm_radius, &mut self.candidates);
        self.candidates.sort_unstable();

        let positions = store.positions();
        let teams = store.teams();
        let cold = store.cold_table();
        let (mut sum_x, mut sum_y, mut count) = (0.0_f32, 0.0_f32, 0_u32);
        for &other in &self.candidates {
            let o = other as usize;
            if o == index || teams[o] != team || cold[o].phantom {
                continue;
            }
            let p = positions[o];
            if here.distance_squared(p) <= radius_sq {
                sum_x += p.x;
                sum_y += p.y;
                count += 1;
            }
        }

        if count == 0 {
            return wander(rng, config.wander_rate);
        }
        let n = count as f32;
        let (ox, oy) = (sum_x / n - here.x, sum_y / n - here.y);
        MoveIntent::new(
            if ox.abs() > SWARM_COHESION_SLACK { step_toward(ox) } else { 0.0 },
            if oy.abs() > SWARM_COHESION_SLACK { step_toward(oy) } else { 0.0 },
        )
    }
}

fn nearest_in(
    store: &UnitStore,
    candidates: &[u32],
    slot: Slot,
    here: Position,
    radius_sq: f32,
) -> Targets {
    let index = slot.index();
    let team = store.teams()[index];
    let positions = store.positions();
    let teams = store.teams();

    let mut targets = Targets::default();
    let (mut enemy_d, mut ally_d) = (f32::INFINITY, f32::INFINITY);
    for &other in candidates {
        let o = other as usize;
        if o == index {
            continue;
        }
        let d = here.distance_squared(positions[o]);
        if d > radius_sq {
            continue;
        }
        if team.is_enemy_of(teams[o]) {
            if d < enemy_d {
                enemy_d = d;
                targets.enemy = Some(Slot::new(other));
            }
        } else if team.is_ally_of(teams[o]) && d < ally_d {
            ally_d = d;
            targets.ally = Some(Slot::new(other));
        }
    }
    targets
}

/// Step along the axis with the larger offset to the enemy (Y on a tie).
///
/// Holds when no enemy is within the search radius. It also holds once the
/// nearest enemy is within melee reach, so a unit in combat keeps its cell
/// instead of pushing into its target.
fn hunt(store: &UnitStore, here: Position, enemy: Option<Slot>, melee_sq: f32) -> MoveIntent {
    let Some(enemy) = enemy else {
        return MoveIntent::STAY;
    };
    let target = store.positions()[enemy.index()];
    if here.distance_squared(target) <= melee_sq {
        return MoveIntent::STAY;
    }
    let (dx, dy) = (target.x - here.x, target.y - here.y);
    if dx.abs() > dy.abs() {
        MoveIntent::new(step_toward(dx), 0.0)
    } else {
        MoveIntent::new(0.0, step_toward(dy))
    }
}

/// With probability `rate`, one step in a uniformly chosen cardinal
/// direction. The coin is drawn every call, the direction only on a hit.
fn wander<R: Rng>(rng: &mut R, rate: f32) -> MoveIntent {
    if !rng.gen_bool(f64::from(rate)) {
        return MoveIntent::STAY;
    }
    // the first four displacement offsets are the cardinals
    let (dx, dy) = DISPLACEMENT_OFFSETS[rng.gen_range(0..4_usize)];
    MoveIntent::new(dx as f32 * GRID_STEP, dy as f32 * GRID_STEP)
}

/// Diagonal step toward the nearest ally once it is farther than `distance`.
fn guard(store: &UnitStore, here: Position, ally: Option<Slot>, distance: f32) -> MoveIntent {
    let Some(ally) = ally else {
        return MoveIntent::STAY;
    };
    let target = store.positions()[ally.index()];
    if here.distance_squared(target) <= distance * distance {
        return MoveIntent::STAY;
    }
    MoveIntent::new(step_toward(target.x - here.x), step_toward(target.y - here.y))
}
