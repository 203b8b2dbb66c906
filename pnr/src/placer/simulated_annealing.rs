// PNR: 2-D Digital-Circuit Place-and-Route Engine
// Copyright (C) 2024  PNR contributors
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! Simulated-annealing placer: a Metropolis-criterion accept/reject loop
//! over a quadratically cooled temperature schedule.

use super::{Placer, Telemetry};
use crate::grid::GatesGrid;
use crate::Error;
use log::debug;
use rand::Rng;

/// Simulated annealing over swap-style grid mutations.
///
/// Uphill moves (`new_cost >= current_cost`) are accepted with probability
/// `exp(-delta / temp)`; downhill moves are always accepted. Temperature
/// cools quadratically towards `min_temp` over `max_steps` steps.
pub struct SimulatedAnnealing {
    init_temp: f64,
    min_temp: f64,
    max_steps: u64,
    temp: f64,
    telemetry: Telemetry,
}

impl SimulatedAnnealing {
    /// Create a new annealing placer starting at `init_temp`, cooling
    /// towards `min_temp` over at most `max_steps` steps.
    pub fn new(grid: &GatesGrid, init_temp: f64, min_temp: f64, max_steps: u64) -> Self {
        let cost = grid.cost();
        Self {
            init_temp,
            min_temp,
            max_steps,
            temp: init_temp,
            telemetry: Telemetry {
                current_cost: cost,
                best_cost: cost,
                steps: 0,
                swaps: 0,
            },
        }
    }

    /// Current temperature.
    pub fn temperature(&self) -> f64 {
        self.temp
    }

    /// Metropolis acceptance test. `delta < 0` always accepts. For
    /// `delta >= 0`, a non-positive temperature always rejects (`p = 0`);
    /// otherwise the acceptance probability is `exp(-delta / temp)`, with
    /// the exponent clamped away from values that would overflow `exp`.
    fn accept(delta: f64, temp: f64, rng: &mut impl Rng) -> bool {
        if delta < 0.0 {
            return true;
        }
        if temp <= 0.0 {
            return false;
        }
        let exponent = -delta / temp;
        let p = if exponent < -745.0 { 0.0 } else { exponent.exp() };
        rng.gen::<f64>() < p
    }

    fn cool(&mut self) {
        let steps = self.telemetry.steps as f64;
        let max_steps = self.max_steps as f64;
        let remaining = ((max_steps - steps) / max_steps).max(0.0);
        self.temp = self.min_temp + (self.init_temp - self.min_temp) * remaining * remaining;
    }
}

impl Placer for SimulatedAnnealing {
    fn step(&mut self, grid: &mut GatesGrid, rng: &mut impl Rng) -> Result<bool, Error> {
        if self.telemetry.steps >= self.max_steps || self.temp < self.min_temp {
            return Ok(true);
        }

        let (a, old_a, b, old_b) = grid.mutate(rng)?;
        let new_cost = grid.cost();
        let delta = new_cost - self.telemetry.current_cost;

        if Self::accept(delta, self.temp, rng) {
            self.telemetry.current_cost = new_cost;
            self.telemetry.swaps += 1;
            debug!(
                "accept swap of gate {} and gate {} at temp {:.4}: cost {}",
                a, b, self.temp, new_cost
            );
        } else {
            grid.undo_mutate(a, old_a, b, old_b);
        }
        // Best is observed, not committed: update even on reject.
        self.telemetry.best_cost = self.telemetry.best_cost.min(new_cost);

        self.telemetry.steps += 1;
        self.cool();

        Ok(self.telemetry.steps >= self.max_steps || self.temp < self.min_temp)
    }

    fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn always_accepts_strictly_improving_moves() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(0);
        assert!(SimulatedAnnealing::accept(-0.001, 5.0, &mut rng));
        assert!(SimulatedAnnealing::accept(-1000.0, 0.0, &mut rng));
    }

    #[test]
    fn never_accepts_uphill_move_at_zero_temperature() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(0);
        for _ in 0..100 {
            assert!(!SimulatedAnnealing::accept(0.5, 0.0, &mut rng));
        }
        assert!(!SimulatedAnnealing::accept(0.0, 0.0, &mut rng));
    }

    #[test]
    fn cooling_schedule_reaches_min_temp_floor_at_max_steps() {
        let mut sa = SimulatedAnnealing {
            init_temp: 10.0,
            min_temp: 1.0,
            max_steps: 10,
            temp: 10.0,
            telemetry: Telemetry::default(),
        };
        sa.telemetry.steps = 10;
        sa.cool();
        assert!((sa.temperature() - 1.0).abs() < 1e-9);
    }
}
