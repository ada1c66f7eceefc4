//! Conversion statistics for `--stats` output.

use std::time::{Duration, Instant};

/// Collects phase timings and problem-size counters.
///
/// Created when `--stats` is passed, threaded as `Option<&mut Stats>`.
/// Nothing is measured when `None`.
pub struct Stats {
    total_start: Instant,
    phases: Vec<(&'static str, Duration)>,
    pub devices: usize,
    pub nodes: usize,
    pub branches: usize,
    pub states: usize,
    pub inputs: usize,
    pub outputs: usize,
    /// Symbolic eliminations completed (MNA solve, operating point, resolvent).
    pub eliminations: u32,
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}

impl Stats {
    pub fn new() -> Self {
        Self {
            total_start: Instant::now(),
            phases: Vec::new(),
            devices: 0,
            nodes: 0,
            branches: 0,
            states: 0,
            inputs: 0,
            outputs: 0,
            eliminations: 0,
        }
    }

    /// Record a completed phase with its duration.
    pub fn add_phase(&mut self, name: &'static str, duration: Duration) {
        self.phases.push((name, duration));
    }

    pub fn phases(&self) -> &[(&'static str, Duration)] {
        &self.phases
    }

    /// Print the stats table to stderr.
    pub fn display(&self) {
        let total = self.total_start.elapsed();
        eprintln!();
        eprintln!("=== Symna Conversion Stats ===");

        for (name, dur) in &self.phases {
            eprintln!("  {:<24} {:>8.3}s", name, dur.as_secs_f64());
        }

        eprintln!("  Devices:                {}", self.devices);
        eprintln!("  MNA size:               {} nodes + {} branches", self.nodes, self.branches);
        eprintln!(
            "  States/inputs/outputs:  {}/{}/{}",
            self.states, self.inputs, self.outputs
        );
        eprintln!("  Eliminations:           {}", self.eliminations);
        eprintln!("  ─────────────────────────────────");
        eprintln!("  Total:                  {:>8.3}s", total.as_secs_f64());
    }
}
