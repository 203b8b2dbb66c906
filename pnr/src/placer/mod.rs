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

//! # Placer
//!
//! Step-driven placement optimizers. [`Placer`] is the capability interface
//! both variants implement; there is no shared mutable state via
//! inheritance, only the plain embedded [`Telemetry`] struct each variant
//! carries. See `spec.md` §4.4.

mod random_descent;
mod simulated_annealing;

pub use random_descent::RandomDescent;
pub use simulated_annealing::SimulatedAnnealing;

use crate::grid::GatesGrid;
use crate::Error;
use rand::Rng;

/// Book-keeping shared by every placer variant.
#[derive(Debug, Clone, Default)]
pub struct Telemetry {
    /// Cost of the grid after the most recently accepted move.
    pub current_cost: f64,
    /// Lowest cost ever observed, accepted or not.
    pub best_cost: f64,
    /// Total number of steps taken so far.
    pub steps: u64,
    /// Number of accepted mutations so far.
    pub swaps: u64,
}

/// Capability interface for placement optimizers: propose a mutation
/// against the grid, accept or reject it by some policy, and report when
/// the optimizer has terminated.
pub trait Placer {
    /// Perform one step: propose a mutation, accept or reject it, update
    /// telemetry. Returns `true` once the placer has terminated (further
    /// calls are a no-op).
    fn step(&mut self, grid: &mut GatesGrid, rng: &mut impl Rng) -> Result<bool, Error>;

    /// Current telemetry snapshot.
    fn telemetry(&self) -> &Telemetry;

    /// One-line human-readable status, suitable for a HUD.
    fn hud_text(&self) -> String {
        let t = self.telemetry();
        format!(
            "cost={:.2} best={:.2} swaps={} steps={}",
            t.current_cost, t.best_cost, t.swaps, t.steps
        )
    }
}

#[cfg(test)]
mod tests;
