//! # Tick Allocation Test
//!
//! Once buffers are warm, a tick must not touch the heap. A counting
//! global allocator measures one tick after a few warm-up ticks.
//!
//! Kept as the only test in this binary so no other test thread
//! allocates while the counter is armed.
//!
//! Run with: cargo test -p skirmish_core --test tick_allocations

#![allow(unsafe_code)]

use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use skirmish_core::{SimConfig, Simulation, Team, UnitSpawn, UnitState};

/// Counts allocations while armed, delegating to the system allocator.
struct CountingAllocator {
    armed: AtomicBool,
    allocations: AtomicUsize,
}

impl CountingAllocator {
    const fn new() -> Self {
        Self {
            armed: AtomicBool::new(false),
            allocations: AtomicUsize::new(0),
        }
    }

    fn arm(&self) {
        self.allocations.store(0, Ordering::SeqCst);
        self.armed.store(true, Ordering::SeqCst);
    }

    fn disarm(&self) -> usize {
        self.armed.store(false, Ordering::SeqCst);
        self.allocations.load(Ordering::SeqCst)
    }
}

// SAFETY: every call is forwarded unchanged to `System`; the allocator only
// bumps an atomic counter on the side.
unsafe impl GlobalAlloc for CountingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        if self.armed.load(Ordering::Relaxed) {
            self.allocations.fetch_add(1, Ordering::Relaxed);
        }
        System.alloc(layout)
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout);
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        if self.armed.load(Ordering::Relaxed) {
            self.allocations.fetch_add(1, Ordering::Relaxed);
        }
        System.realloc(ptr, layout, new_size)
    }
}

#[global_allocator]
static ALLOCATOR: CountingAllocator = CountingAllocator::new();

#[test]
fn warm_tick_does_not_allocate_for_tagged_units() {
    let config = SimConfig {
        width: 20.0,
        height: 20.0,
        initial_capacity: 128,
        ..SimConfig::default()
    };
    let mut sim = Simulation::new(config).unwrap();

    // one squad on a 2-unit lattice: hunters without enemies, guards
    // already next to an ally, and waiters, all selected through tags
    let tags = ["elite", "WAIT", " Guard "];
    for i in 0..100 {
        let spawn = UnitSpawn::new((2 * (i % 10)) as f32, (2 * (i / 10)) as f32, Team::Friendly)
            .with_tag(tags[i % tags.len()])
            .with_tag("veteran");
        sim.spawn(&format!("u{i}"), spawn);
    }

    for _ in 0..5 {
        sim.tick();
    }

    ALLOCATOR.arm();
    let stats = sim.tick();
    let allocations = ALLOCATOR.disarm();

    assert_eq!(allocations, 0, "a warm tick allocated {allocations} times");
    assert_eq!(stats.live_units, 100);
    assert_eq!(stats.planned, 0);
    assert_eq!(sim.store().state_of("u0"), Some(UnitState::Idle));
}
