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

//! Random-descent placer: accept a proposed mutation only if it strictly
//! lowers cost; otherwise undo it. Terminates after a fixed step budget.

use super::{Placer, Telemetry};
use crate::grid::GatesGrid;
use crate::Error;
use log::debug;
use rand::Rng;

/// Greedy random-restart placer. Never accepts an uphill move, so it
/// converges to a local optimum quickly but cannot escape one.
pub struct RandomDescent {
    max_steps: u64,
    telemetry: Telemetry,
}

impl RandomDescent {
    /// Create a new random-descent placer that will run for `max_steps`
    /// steps. `telemetry.current_cost`/`best_cost` are initialized from
    /// `grid.cost()` at construction time.
    pub fn new(grid: &GatesGrid, max_steps: u64) -> Self {
        let cost = grid.cost();
        Self {
            max_steps,
            telemetry: Telemetry {
                current_cost: cost,
                best_cost: cost,
                steps: 0,
                swaps: 0,
            },
        }
    }
}

impl Placer for RandomDescent {
    fn step(&mut self, grid: &mut GatesGrid, rng: &mut impl Rng) -> Result<bool, Error> {
        if self.telemetry.steps >= self.max_steps {
            return Ok(true);
        }

        let (a, old_a, b, old_b) = grid.mutate(rng)?;
        let new_cost = grid.cost();

        if new_cost < self.telemetry.current_cost {
            self.telemetry.current_cost = new_cost;
            self.telemetry.swaps += 1;
            debug!("accept swap of gate {} and gate {}: cost {}", a, b, new_cost);
        } else {
            grid.undo_mutate(a, old_a, b, old_b);
        }
        self.telemetry.best_cost = self.telemetry.best_cost.min(self.telemetry.current_cost);

        self.telemetry.steps += 1;
        Ok(self.telemetry.steps >= self.max_steps)
    }

    fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }
}
