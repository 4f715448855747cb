//! # Kernel Property Tests
//!
//! Whole-pipeline checks of the guarantees the kernel gives its callers:
//!
//! 1. **Identity**: ids and active slots map one-to-one under churn
//! 2. **Resolution**: no two live units share a cell, positions stay in
//!    bounds, mass and hp are untouched by movement
//! 3. **Determinism**: equal seeds give equal trajectories
//! 4. **Scenarios**: hunt, swarm cohesion, displacement, free-list reuse
//!
//! Run with: cargo test -p skirmish_core --test kernel_properties

use std::collections::{HashMap, HashSet};

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use skirmish_core::{
    Behavior, MoveIntent, Position, SimConfig, Simulation, Slot, Team, UnitSpawn, UnitStore,
};

fn config(width: f32, height: f32, seed: u64) -> SimConfig {
    SimConfig {
        width,
        height,
        seed,
        initial_capacity: 8,
        ..SimConfig::default()
    }
}

/// `count` units on distinct integer cells, mixed teams, masses and behaviours.
fn skirmish(config: SimConfig, count: usize, layout_seed: u64) -> Simulation {
    let mut rng = ChaCha8Rng::seed_from_u64(layout_seed);
    let (w, h) = (config.width as i32, config.height as i32);
    let mut cells: Vec<(i32, i32)> = (0..w).flat_map(|x| (0..h).map(move |y| (x, y))).collect();
    cells.shuffle(&mut rng);

    let mut sim = Simulation::new(config).unwrap();
    for (i, &(x, y)) in cells.iter().take(count).enumerate() {
        let team = match i % 5 {
            0 | 2 => Team::Friendly,
            1 | 3 => Team::Hostile,
            _ => Team::Neutral,
        };
        let mut spawn = UnitSpawn::new(x as f32, y as f32, team)
            .with_mass(rng.gen_range(1..4) as f32)
            .with_hp(rng.gen_range(50..150) as f32)
            .with_posture(Behavior::ALL[i % Behavior::ALL.len()]);
        if i % 7 == 0 {
            spawn = spawn.phantom();
        }
        sim.spawn(&format!("unit-{i}"), spawn);
    }
    sim
}

fn live_cells(store: &UnitStore) -> Vec<(i32, i32)> {
    store
        .iter_live()
        .map(|slot| store.position(slot).unwrap().rounded())
        .collect()
}

fn assert_identity(store: &UnitStore) {
    assert!(store.is_consistent());
    let mut seen = HashSet::new();
    for slot in store.iter_active() {
        let id = store.id_of(slot).expect("active slot without id");
        assert_eq!(store.lookup(id), Some(slot));
        assert!(seen.insert(id.to_string()));
        assert!(!store.free_slots().contains(&slot.raw()));
    }
    assert_eq!(seen.len(), store.len());
}

// ============================================================================
// IDENTITY
// ============================================================================

#[test]
fn identity_holds_under_churn() {
    let mut sim = Simulation::new(config(32.0, 32.0, 3)).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let mut next_id = 0;
    let mut live: Vec<String> = Vec::new();

    for _ in 0..200 {
        for _ in 0..rng.gen_range(0..4) {
            let id = format!("u{next_id}");
            next_id += 1;
            let spawn = UnitSpawn::new(
                rng.gen_range(0..32) as f32,
                rng.gen_range(0..32) as f32,
                if rng.gen_bool(0.5) { Team::Friendly } else { Team::Hostile },
            )
            .with_tag("wander");
            sim.spawn(&id, spawn);
            live.push(id);
        }
        if !live.is_empty() && rng.gen_bool(0.6) {
            let victim = live.swap_remove(rng.gen_range(0..live.len()));
            assert!(sim.despawn(&victim).is_some());
            assert!(sim.store().lookup(&victim).is_none());
        }
        if !live.is_empty() && rng.gen_bool(0.2) {
            let slot = sim.store().lookup(&live[0]).unwrap();
            sim.store_mut().mark_dead(slot);
            sim.despawn_dead();
            live.remove(0);
        }
        // unknown ids are a no-op
        assert!(sim.despawn("never-spawned").is_none());

        sim.tick();
        assert_identity(sim.store());
        assert_eq!(sim.store().len(), live.len());
    }
    assert!(sim.store().capacity() >= 8);
}

// ============================================================================
// RESOLUTION
// ============================================================================

#[test]
fn no_two_live_units_share_a_cell() {
    let mut sim = skirmish(config(24.0, 24.0, 11), 250, 5);
    assert_eq!(live_cells(sim.store()).len(), 250);
    for _ in 0..60 {
        sim.tick();
        let cells = live_cells(sim.store());
        let distinct: HashSet<_> = cells.iter().collect();
        assert_eq!(distinct.len(), cells.len());
    }
}

#[test]
fn positions_stay_in_bounds() {
    let (w, h) = (20.0, 12.0);
    let mut sim = skirmish(config(w, h, 21), 60, 8);
    // spawned outside the field: pulled in on the first tick
    sim.spawn("far", UnitSpawn::new(-7.0, 40.0, Team::Hostile).with_tag("wander"));
    for _ in 0..50 {
        sim.tick();
        for slot in sim.store().iter_live() {
            let p = sim.store().position(slot).unwrap();
            assert!((0.0..w).contains(&p.x), "x out of bounds: {p:?}");
            assert!((0.0..h).contains(&p.y), "y out of bounds: {p:?}");
        }
    }
}

#[test]
fn movement_never_changes_mass_or_hp() {
    let mut sim = skirmish(config(16.0, 16.0, 4), 120, 2);
    let before: HashMap<Slot, (f32, f32)> = sim
        .store()
        .iter_active()
        .map(|s| (s, (sim.store().mass(s).unwrap(), sim.store().hp(s).unwrap())))
        .collect();
    for _ in 0..40 {
        sim.tick();
    }
    for (slot, (mass, hp)) in before {
        assert_eq!(sim.store().mass(slot), Some(mass));
        assert_eq!(sim.store().hp(slot), Some(hp));
    }
}

// ============================================================================
// DETERMINISM
// ============================================================================

#[test]
fn equal_seeds_give_identical_trajectories() {
    let mut a = skirmish(config(30.0, 30.0, 1234), 150, 77);
    let mut b = skirmish(config(30.0, 30.0, 1234), 150, 77);
    for _ in 0..40 {
        let (sa, sb) = (a.tick(), b.tick());
        assert_eq!(a.state_digest(), b.state_digest());
        assert_eq!(
            (sa.moved, sa.conflicts, sa.displaced, sa.reverted),
            (sb.moved, sb.conflicts, sb.displaced, sb.reverted)
        );
    }
    assert_eq!(a.store().position_bytes(), b.store().position_bytes());
    assert_eq!(a.store().states(), b.store().states());
}

#[test]
fn different_seeds_diverge() {
    let mut a = skirmish(config(30.0, 30.0, 1), 150, 77);
    let mut b = skirmish(config(30.0, 30.0, 2), 150, 77);
    for _ in 0..20 {
        a.tick();
        b.tick();
    }
    assert_ne!(a.state_digest(), b.state_digest());
}

// ============================================================================
// SCENARIOS
// ============================================================================

#[test]
fn hunter_closes_in_on_enemy() {
    let mut config = config(16.0, 16.0, 42);
    config.wander_rate = 0.0;
    let mut sim = Simulation::new(config).unwrap();
    sim.spawn("a", UnitSpawn::new(1.0, 1.0, Team::Friendly).with_posture(Behavior::Hunt));
    sim.spawn("b", UnitSpawn::new(5.0, 1.0, Team::Hostile));

    for _ in 0..3 {
        sim.tick();
    }
    let a = sim.store().position_of("a").unwrap();
    assert!(a.x > 1.0);
    assert_eq!(a, Position::new(4.0, 1.0));
    assert_eq!(sim.store().position_of("b"), Some(Position::new(5.0, 1.0)));
}

#[test]
fn swarm_pair_never_diverges() {
    let mut config = config(32.0, 32.0, 42);
    config.wander_rate = 0.0;
    let mut sim = Simulation::new(config).unwrap();
    sim.spawn("s1", UnitSpawn::new(10.0, 10.0, Team::Hostile).with_tag("swarm"));
    sim.spawn("s2", UnitSpawn::new(13.0, 10.0, Team::Hostile).with_tag("swarm"));

    let gap = |sim: &Simulation| {
        let (p, q) = (
            sim.store().position_of("s1").unwrap(),
            sim.store().position_of("s2").unwrap(),
        );
        p.distance_squared(q)
    };
    let start = gap(&sim);
    let mut last = start;
    for _ in 0..8 {
        sim.tick();
        let now = gap(&sim);
        assert!(now <= last);
        last = now;
    }
    assert!(last < start);
}

#[test]
fn three_way_conflict_resolves_to_distinct_cells() {
    let mut sim = Simulation::new(config(10.0, 10.0, 42)).unwrap();
    let a = sim.spawn("a", UnitSpawn::new(4.0, 5.0, Team::Friendly));
    let b = sim.spawn("b", UnitSpawn::new(6.0, 5.0, Team::Friendly));
    let c = sim.spawn("c", UnitSpawn::new(5.0, 4.0, Team::Friendly));

    sim.plan();
    let store = sim.store_mut();
    store.set_intended(a, MoveIntent::new(1.0, 0.0));
    store.set_intended(b, MoveIntent::new(-1.0, 0.0));
    store.set_intended(c, MoveIntent::new(0.0, 1.0));
    let stats = sim.resolve();

    assert_eq!(stats.conflicts, 2);
    assert_eq!(stats.displaced + stats.reverted, 2);
    let cells: HashSet<_> = live_cells(sim.store()).into_iter().collect();
    assert_eq!(cells.len(), 3);
    assert!(cells.contains(&(5, 5)));
}

#[test]
fn freed_slots_are_reused_in_stack_order() {
    let mut store = UnitStore::new(16);
    let slots: Vec<Slot> = (0..10)
        .map(|i| store.allocate(&format!("u{i}"), UnitSpawn::new(i as f32, 0.0, Team::Neutral)))
        .collect();
    for id in ["u2", "u5", "u7"] {
        store.free(id);
    }
    let reused: Vec<Slot> = ["n1", "n2", "n3"]
        .iter()
        .map(|id| store.allocate(id, UnitSpawn::new(0.0, 9.0, Team::Neutral)))
        .collect();

    assert_eq!(reused, vec![slots[7], slots[5], slots[2]]);
    assert_eq!(store.len(), 10);
    for id in ["u2", "u5", "u7"] {
        assert!(store.lookup(id).is_none());
    }
    for id in ["n1", "n2", "n3", "u0", "u9"] {
        assert!(store.lookup(id).is_some());
    }
    assert_identity(&store);
}
