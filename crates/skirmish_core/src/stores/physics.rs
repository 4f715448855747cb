//! # Physics Store
//!
//! Free-list component store for bodies that want a physical response
//! (forces, impulses, elastic collisions) rather than the grid
//! displacement of the movement pass. Shares the allocate/free/lookup
//! contract of [`crate::UnitStore`] through [`SlotAllocator`].
//!
//! ## Mass
//!
//! Force and impulse divide by mass. A zero mass yields infinite or NaN
//! velocities; keeping mass above zero is the caller's job.

use bytemuck::{Pod, Zeroable};
use tracing::debug;

use crate::config::SimConfig;
use crate::constants::DEFAULT_BOUNCINESS;
use crate::ecs::{ColumnStorage, Slot, SlotAllocator, Velocity};

/// Per-tick acceleration. Reset to zero by [`PhysicsStore::update_physics`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Acceleration {
    /// X component.
    pub x: f32,
    /// Y component.
    pub y: f32,
}

/// Initial state of a physics body.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhysicsBody {
    /// Starting velocity.
    pub velocity: Velocity,
    /// Mass. Must be above zero.
    pub mass: f32,
    /// Fraction of the exchanged velocity kept after a collision.
    pub bounciness: f32,
}

impl PhysicsBody {
    /// A body at rest with the given mass and full bounciness.
    #[must_use]
    pub const fn new(mass: f32) -> Self {
        Self {
            velocity: Velocity::ZERO,
            mass,
            bounciness: DEFAULT_BOUNCINESS,
        }
    }

    /// Sets the starting velocity.
    #[must_use]
    pub const fn with_velocity(mut self, x: f32, y: f32) -> Self {
        self.velocity = Velocity::new(x, y);
        self
    }

    /// Sets the bounciness.
    #[must_use]
    pub const fn with_bounciness(mut self, bounciness: f32) -> Self {
        self.bounciness = bounciness;
        self
    }
}

/// Free-list store of physics bodies.
///
/// # Example
///
/// ```rust,ignore
/// let mut physics = PhysicsStore::new(32, 0.9);
/// let slot = physics.allocate("crate-1", PhysicsBody::new(2.0));
/// physics.apply_force(slot, 4.0, 0.0);
/// physics.update_physics(); // velocity.x == 1.8
/// ```
pub struct PhysicsStore {
    slots: SlotAllocator,
    velocities: ColumnStorage<Velocity>,
    accelerations: ColumnStorage<Acceleration>,
    masses: ColumnStorage<f32>,
    bounciness: ColumnStorage<f32>,
    /// Velocity multiplier applied once per update.
    friction: f32,
}

impl PhysicsStore {
    /// Creates a store with `capacity` slots and a per-update friction
    /// multiplier.
    #[must_use]
    pub fn new(capacity: usize, friction: f32) -> Self {
        let slots = SlotAllocator::new(capacity);
        let capacity = slots.capacity();
        Self {
            slots,
            velocities: ColumnStorage::new(capacity),
            accelerations: ColumnStorage::new(capacity),
            masses: ColumnStorage::new(capacity),
            bounciness: ColumnStorage::new(capacity),
            friction,
        }
    }

    /// Creates a store sized by `initial_capacity` that applies the
    /// configured `friction` on every update.
    #[must_use]
    pub fn from_config(config: &SimConfig) -> Self {
        Self::new(config.initial_capacity, config.friction)
    }

    /// Stores a body under `id`. A live `id` is re-initialized in place.
    pub fn allocate(&mut self, id: &str, body: PhysicsBody) -> Slot {
        let allocation = self.slots.allocate(id);
        if let Some(capacity) = allocation.grown_to {
            self.velocities.grow(capacity);
            self.accelerations.grow(capacity);
            self.masses.grow(capacity);
            self.bounciness.grow(capacity);
            debug!(capacity, "physics store grew");
        }
        let index = allocation.slot.index();
        self.velocities.set(index, body.velocity);
        self.accelerations.set(index, Acceleration::default());
        self.masses.set(index, body.mass);
        self.bounciness.set(index, body.bounciness);
        allocation.slot
    }

    /// Removes the body `id` and zeroes its slot. Unknown ids are a no-op.
    pub fn free(&mut self, id: &str) -> Option<Slot> {
        let slot = self.slots.free(id)?;
        let index = slot.index();
        self.velocities.reset(index);
        self.accelerations.reset(index);
        self.masses.reset(index);
        self.bounciness.reset(index);
        Some(slot)
    }

    /// Slot of a live body.
    #[inline]
    #[must_use]
    pub fn lookup(&self, id: &str) -> Option<Slot> {
        self.slots.lookup(id)
    }

    /// Removes every body. Capacity is kept.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.velocities.clear();
        self.accelerations.clear();
        self.masses.clear();
        self.bounciness.clear();
    }

    /// Number of live bodies.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.active_count()
    }

    /// Whether no body is live.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current column length.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Per-update friction multiplier.
    #[inline]
    #[must_use]
    pub const fn friction(&self) -> f32 {
        self.friction
    }

    /// Replaces the friction multiplier.
    pub fn set_friction(&mut self, friction: f32) {
        self.friction = friction;
    }

    /// Identity invariants of the underlying allocator.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.slots.is_consistent()
    }

    // =========================================================================
    // Hot path (by slot)
    // =========================================================================

    /// Adds `force / mass` to the slot's acceleration.
    ///
    /// Returns `false` for an inactive slot.
    #[inline]
    pub fn apply_force(&mut self, slot: Slot, fx: f32, fy: f32) -> bool {
        if !self.slots.is_active(slot) {
            return false;
        }
        let index = slot.index();
        let mass = self.masses.as_slice()[index];
        let acceleration = &mut self.accelerations.as_mut_slice()[index];
        acceleration.x += fx / mass;
        acceleration.y += fy / mass;
        true
    }

    /// Adds `impulse / mass` directly to the slot's velocity.
    ///
    /// Returns `false` for an inactive slot.
    #[inline]
    pub fn apply_impulse(&mut self, slot: Slot, ix: f32, iy: f32) -> bool {
        if !self.slots.is_active(slot) {
            return false;
        }
        let index = slot.index();
        let mass = self.masses.as_slice()[index];
        let velocity = &mut self.velocities.as_mut_slice()[index];
        velocity.x += ix / mass;
        velocity.y += iy / mass;
        true
    }

    /// Integrates every active body: `v += a`, `v *= friction`, `a = 0`.
    pub fn update_physics(&mut self) {
        let friction = self.friction;
        let velocities = self.velocities.as_mut_slice();
        let accelerations = self.accelerations.as_mut_slice();
        for slot in self.slots.iter_active() {
            let index = slot.index();
            let acceleration = std::mem::take(&mut accelerations[index]);
            let velocity = &mut velocities[index];
            velocity.x = (velocity.x + acceleration.x) * friction;
            velocity.y = (velocity.y + acceleration.y) * friction;
        }
    }

    /// One-dimensional elastic exchange on each axis between `a` and `b`,
    /// each result scaled by that body's own bounciness.
    ///
    /// Returns `false` (and changes nothing) unless both slots are active
    /// and distinct.
    pub fn handle_collision(&mut self, a: Slot, b: Slot) -> bool {
        if a == b || !self.slots.is_active(a) || !self.slots.is_active(b) {
            return false;
        }
        let (ia, ib) = (a.index(), b.index());
        let masses = self.masses.as_slice();
        let (m1, m2) = (masses[ia], masses[ib]);
        let bounce = self.bounciness.as_slice();
        let (e1, e2) = (bounce[ia], bounce[ib]);

        let velocities = self.velocities.as_mut_slice();
        let (v1, v2) = (velocities[ia], velocities[ib]);
        let total = m1 + m2;
        let exchange = |u1: f32, u2: f32| {
            (
                ((m1 - m2) * u1 + 2.0 * m2 * u2) / total,
                ((m2 - m1) * u2 + 2.0 * m1 * u1) / total,
            )
        };
        let (x1, x2) = exchange(v1.x, v2.x);
        let (y1, y2) = exchange(v1.y, v2.y);

        velocities[ia] = Velocity::new(x1 * e1, y1 * e1);
        velocities[ib] = Velocity::new(x2 * e2, y2 * e2);
        true
    }

    /// Velocity of an active slot.
    #[inline]
    #[must_use]
    pub fn velocity(&self, slot: Slot) -> Option<Velocity> {
        self.slots
            .is_active(slot)
            .then(|| self.velocities.as_slice()[slot.index()])
    }

    /// Pending acceleration of an active slot.
    #[inline]
    #[must_use]
    pub fn acceleration(&self, slot: Slot) -> Option<Acceleration> {
        self.slots
            .is_active(slot)
            .then(|| self.accelerations.as_slice()[slot.index()])
    }

    /// Mass of an active slot.
    #[inline]
    #[must_use]
    pub fn mass(&self, slot: Slot) -> Option<f32> {
        self.slots
            .is_active(slot)
            .then(|| self.masses.as_slice()[slot.index()])
    }

    /// Bounciness of an active slot.
    #[inline]
    #[must_use]
    pub fn bounciness(&self, slot: Slot) -> Option<f32> {
        self.slots
            .is_active(slot)
            .then(|| self.bounciness.as_slice()[slot.index()])
    }

    /// Overwrites the velocity of an active slot.
    pub fn set_velocity(&mut self, slot: Slot, velocity: Velocity) -> bool {
        self.slots.is_active(slot) && self.velocities.set(slot.index(), velocity)
    }
}
