//! # Movement & Collision Resolution
//!
//! Turns planned moves into final positions with no two live units on the
//! same rounded cell.
//!
//! ## Passes
//!
//! 1. **Claim** (ascending slots): each unit's candidate is its position
//!    plus its planned move, clamped to the field. The first unit to reach
//!    a cell claims it. A later unit with a strictly higher priority
//!    (`mass * 10 + hp`) takes the cell over; otherwise it is displaced.
//! 2. **Displace** (ascending slots): a displaced unit takes the first
//!    in-bounds, unclaimed cell of [`DISPLACEMENT_OFFSETS`] around its
//!    candidate. With none free it reverts to its pre-tick position.
//!    A revert pushes out any unit that moved into that cell this tick;
//!    the pushed unit searches again.
//! 3. **Commit**: positions are written back and the velocity column
//!    records this tick's displacement. Mass and hp are never touched.

use tracing::{debug, trace};

use crate::constants::{DISPLACEMENT_OFFSETS, PRIORITY_MASS_WEIGHT};
use crate::ecs::{Position, Slot, UnitStore, Velocity};

const UNCLAIMED: u32 = u32::MAX;

/// Counters of one resolution pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MovementStats {
    /// Units whose position changed.
    pub moved: usize,
    /// Contested candidate cells (one per losing unit).
    pub conflicts: usize,
    /// Units placed on a neighbouring cell.
    pub displaced: usize,
    /// Units sent back to their pre-tick position.
    pub reverted: usize,
}

/// Collision priority: the higher score keeps a contested cell.
#[inline]
#[must_use]
pub fn priority(mass: f32, hp: f32) -> f32 {
    mass * PRIORITY_MASS_WEIGHT + hp
}

/// Conflict-free movement resolver.
///
/// The claim grid has one entry per integer cell of the field and is
/// reset through the list of cells touched this tick.
pub struct MovementPass {
    width: f32,
    height: f32,
    cols: usize,
    rows: usize,
    claims: Vec<u32>,
    touched: Vec<usize>,
    previous: Vec<Position>,
    candidates: Vec<Position>,
    finals: Vec<Position>,
    worklist: Vec<u32>,
}

impl MovementPass {
    /// Creates a resolver for a `width x height` field.
    #[must_use]
    pub fn new(width: f32, height: f32) -> Self {
        let cols = (width.ceil() as usize).max(1);
        let rows = (height.ceil() as usize).max(1);
        Self {
            width,
            height,
            cols,
            rows,
            claims: vec![UNCLAIMED; cols * rows],
            touched: Vec::new(),
            previous: Vec::new(),
            candidates: Vec::new(),
            finals: Vec::new(),
            worklist: Vec::new(),
        }
    }

    #[inline]
    fn cell_key(&self, position: Position) -> Option<usize> {
        let (x, y) = position.rounded();
        let (x, y) = (usize::try_from(x).ok()?, usize::try_from(y).ok()?);
        (x < self.cols && y < self.rows).then_some(y * self.cols + x)
    }

    #[inline]
    fn in_field(&self, position: Position) -> bool {
        position.clamped(self.width, self.height) == position
    }

    fn claim(&mut self, key: usize, slot: u32) {
        if self.claims[key] == UNCLAIMED {
            self.touched.push(key);
        }
        self.claims[key] = slot;
    }

    /// Resolves every live unit's planned move and commits the result.
    pub fn run(&mut self, store: &mut UnitStore) -> MovementStats {
        let mut stats = MovementStats::default();
        let len = store.high_water();
        self.previous.clear();
        self.previous.extend_from_slice(&store.positions()[..len]);
        self.candidates.clear();
        self.candidates.resize(len, Position::default());
        self.finals.clear();
        self.finals.resize(len, Position::default());
        self.worklist.clear();

        // claim
        let intents = store.intents();
        let masses = store.masses();
        let hp = store.hp_column();
        for index in 0..len {
            let slot = Slot::new(index as u32);
            if !store.is_live(slot) {
                continue;
            }
            let candidate = self.previous[index]
                .offset(intents[index])
                .clamped(self.width, self.height);
            self.candidates[index] = candidate;
            self.finals[index] = candidate;
            let Some(key) = self.cell_key(candidate) else {
                continue;
            };

            let holder = self.claims[key];
            if holder == UNCLAIMED {
                self.claim(key, slot.raw());
                continue;
            }
            stats.conflicts += 1;
            let h = holder as usize;
            if priority(masses[index], hp[index]) > priority(masses[h], hp[h]) {
                self.claim(key, slot.raw());
                self.worklist.push(holder);
            } else {
                self.worklist.push(slot.raw());
            }
        }

        // displace
        self.worklist.sort_unstable();
        let mut next = 0;
        while next < self.worklist.len() {
            let index = self.worklist[next] as usize;
            next += 1;
            if self.place_nearby(index) {
                stats.displaced += 1;
            } else {
                stats.reverted += 1;
                self.revert(index);
            }
        }

        // commit
        for index in 0..len {
            let slot = Slot::new(index as u32);
            if !store.is_live(slot) {
                continue;
            }
            let (before, after) = (self.previous[index], self.finals[index]);
            if after != before {
                stats.moved += 1;
            }
            store.commit_motion(slot, after, Velocity::new(after.x - before.x, after.y - before.y));
        }

        for key in self.touched.drain(..) {
            self.claims[key] = UNCLAIMED;
        }
        stats
    }

    fn place_nearby(&mut self, index: usize) -> bool {
        let candidate = self.candidates[index];
        for (dx, dy) in DISPLACEMENT_OFFSETS {
            let spot = Position::new(candidate.x + dx as f32, candidate.y + dy as f32);
            if !self.in_field(spot) {
                continue;
            }
            let Some(key) = self.cell_key(spot) else {
                continue;
            };
            if self.claims[key] == UNCLAIMED {
                self.claim(key, index as u32);
                self.finals[index] = spot;
                return true;
            }
        }
        false
    }

    /// Sends a unit back to its (clamped) pre-tick position. A unit that
    /// moved into that cell this tick is pushed back onto the worklist.
    fn revert(&mut self, index: usize) {
        let home = self.previous[index].clamped(self.width, self.height);
        self.finals[index] = home;
        trace!(slot = index, "no free neighbour, reverting");
        let Some(key) = self.cell_key(home) else {
            return;
        };
        let holder = self.claims[key];
        if holder == UNCLAIMED {
            self.claim(key, index as u32);
            return;
        }
        let h = holder as usize;
        let holder_home = self.previous[h].clamped(self.width, self.height);
        if self.cell_key(holder_home) == Some(key) {
            // both started on this cell
            debug!(slot = index, other = h, "overlapping units cannot be separated");
            return;
        }
        self.claim(key, index as u32);
        self.worklist.push(holder);
    }
}
