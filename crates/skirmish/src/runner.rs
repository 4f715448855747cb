//! # Headless Runner
//!
//! Drives a [`Simulation`] for a fixed number of ticks and folds the
//! per-tick statistics into a [`RunSummary`].

use std::fmt;

use tracing::info;

use skirmish_core::{Simulation, TickStats};

/// Accumulated statistics of a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunSummary {
    /// Ticks executed.
    pub ticks: u64,
    /// Live units after the last tick.
    pub final_live: usize,
    /// Sum of unit moves.
    pub total_moved: usize,
    /// Sum of contested cells.
    pub total_conflicts: usize,
    /// Sum of displaced units.
    pub total_displaced: usize,
    /// Sum of reverted units.
    pub total_reverted: usize,
    /// Sum of tick wall times.
    pub total_tick_us: u64,
    /// Slowest tick.
    pub max_tick_us: u64,
    /// State digest after the last tick.
    pub digest: u64,
}

impl RunSummary {
    /// Creates an empty summary.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ticks: 0,
            final_live: 0,
            total_moved: 0,
            total_conflicts: 0,
            total_displaced: 0,
            total_reverted: 0,
            total_tick_us: 0,
            max_tick_us: 0,
            digest: 0,
        }
    }

    /// Records one tick.
    pub fn record(&mut self, stats: &TickStats) {
        self.ticks += 1;
        self.total_moved += stats.moved;
        self.total_conflicts += stats.conflicts;
        self.total_displaced += stats.displaced;
        self.total_reverted += stats.reverted;
        self.total_tick_us += stats.tick_us;
        self.max_tick_us = self.max_tick_us.max(stats.tick_us);
    }

    /// Mean tick time in milliseconds.
    #[must_use]
    pub fn mean_tick_ms(&self) -> f64 {
        if self.ticks == 0 {
            return 0.0;
        }
        (self.total_tick_us as f64 / self.ticks as f64) / 1000.0
    }
}

impl Default for RunSummary {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "┌─ RUN ──────────────────────────────────────────────────┐")?;
        writeln!(f, "│ Ticks:          {}", self.ticks)?;
        writeln!(f, "│ Live units:     {}", self.final_live)?;
        writeln!(f, "│ Mean tick:      {:.3} ms", self.mean_tick_ms())?;
        writeln!(f, "│ Max tick:       {:.3} ms", self.max_tick_us as f64 / 1000.0)?;
        writeln!(f, "├─ MOVEMENT ─────────────────────────────────────────────┤")?;
        writeln!(f, "│ Moves:          {}", self.total_moved)?;
        writeln!(f, "│ Conflicts:      {}", self.total_conflicts)?;
        writeln!(f, "│ Displaced:      {}", self.total_displaced)?;
        writeln!(f, "│ Reverted:       {}", self.total_reverted)?;
        writeln!(f, "├────────────────────────────────────────────────────────┤")?;
        writeln!(f, "│ Digest:         {:016x}", self.digest)?;
        write!(f, "└────────────────────────────────────────────────────────┘")
    }
}

/// Runs `ticks` ticks, freeing dead units after each one.
pub fn run(sim: &mut Simulation, ticks: u64) -> RunSummary {
    let mut summary = RunSummary::new();
    info!(ticks, units = sim.store().len(), "run started");

    // progress roughly ten times per run
    let report_every = (ticks / 10).max(1);
    for _ in 0..ticks {
        let stats = sim.tick();
        summary.record(&stats);
        sim.despawn_dead();
        if stats.tick % report_every == 0 {
            info!(
                tick = stats.tick,
                live = stats.live_units,
                conflicts = stats.conflicts,
                tick_us = stats.tick_us,
                "progress"
            );
        }
    }

    summary.final_live = sim.store().iter_live().count();
    summary.digest = sim.state_digest();
    info!(
        ticks = summary.ticks,
        live = summary.final_live,
        mean_ms = summary.mean_tick_ms(),
        "run finished"
    );
    summary
}
