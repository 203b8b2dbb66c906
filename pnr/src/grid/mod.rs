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

//! # GatesGrid
//!
//! A dense occupancy grid plus per-gate positional bookkeeping, a
//! pin-perimeter allocator, and a random swap mutation with undo. See
//! `spec.md` §4.2.

mod cost;

pub use cost::CostCache;

use crate::geometry::Point2;
use crate::netlist::Netlist;
use crate::Error;
use log::{debug, error};
use rand::Rng;

/// How many random placements to try for a single logic gate before giving
/// up and reporting [`Error::GridExhausted`].
pub const PLACE_RETRY_COUNT: u32 = 1000;

/// True iff `p` lies on the perimeter of a `dim`-sized grid.
pub fn is_perimeter(p: Point2, dim: Point2) -> bool {
    p.x == 0 || p.y == 0 || p.x == dim.x - 1 || p.y == dim.y - 1
}

/// Visits every perimeter tile of a `dim`-sized grid exactly once, starting
/// at `(0, 0)` and proceeding clockwise: along the top row left-to-right,
/// down the right column, along the bottom row right-to-left, up the left
/// column.
pub fn perimeter_iter(dim: Point2) -> impl Iterator<Item = Point2> {
    let top = (0..dim.x).map(move |x| Point2::new(x, 0));
    let right = (1..dim.y - 1).map(move |y| Point2::new(dim.x - 1, y));
    let bottom = (0..dim.x).rev().map(move |x| Point2::new(x, dim.y - 1));
    let left = (1..dim.y - 1).rev().map(move |y| Point2::new(0, y));
    top.chain(right).chain(bottom).chain(left)
}

/// The placement surface: a dense occupancy grid, per-gate positions, and
/// the incremental HPWL [`CostCache`] that always stays in sync with it.
pub struct GatesGrid<'n> {
    netlist: &'n Netlist,
    dim: Point2,
    occupancy: Vec<Option<u32>>,
    gate_pos: Vec<Option<Point2>>,
    cost: CostCache,
}

impl<'n> GatesGrid<'n> {
    /// Build a grid of the given size and place every gate in `netlist`:
    /// ports onto the perimeter in iteration order, logic gates at random
    /// interior tiles. Fails with [`Error::GridExhausted`] if the perimeter
    /// runs out of room for ports, or a logic gate cannot be placed within
    /// [`PLACE_RETRY_COUNT`] attempts.
    pub fn new(dim: Point2, netlist: &'n Netlist, rng: &mut impl Rng) -> Result<Self, Error> {
        Self::new_inner(dim, netlist, rng).map_err(|e| {
            error!("grid construction failed: {}", e);
            e
        })
    }

    fn new_inner(dim: Point2, netlist: &'n Netlist, rng: &mut impl Rng) -> Result<Self, Error> {
        let n = netlist.num_gates();
        let mut grid = Self {
            netlist,
            dim,
            occupancy: vec![None; (dim.x * dim.y).max(0) as usize],
            gate_pos: vec![None; n],
            cost: CostCache::empty(),
        };

        let mut pins = perimeter_iter(dim);
        for gate_id in 0..n {
            if grid.netlist.gate(gate_id).is_port() {
                let pos = pins.next().ok_or_else(|| {
                    Error::GridExhausted(format!(
                        "no perimeter tile left for port gate {}",
                        gate_id
                    ))
                })?;
                grid.fill(gate_id as u32, pos);
            } else {
                grid.place(gate_id as u32, rng)?;
            }
        }

        grid.cost = CostCache::build(netlist, &grid.gate_pos);
        Ok(grid)
    }

    /// Grid dimensions in tiles.
    pub fn dim(&self) -> Point2 {
        self.dim
    }

    /// Number of gates tracked by this grid.
    pub fn num_gates(&self) -> usize {
        self.gate_pos.len()
    }

    /// The underlying netlist.
    pub fn netlist(&self) -> &Netlist {
        self.netlist
    }

    /// Current total HPWL cost (O(1), served from the cache).
    pub fn cost(&self) -> f64 {
        self.cost.total_cost()
    }

    /// Top-left tile of a gate's footprint, if placed.
    pub fn get_pos(&self, gate_id: u32) -> Option<Point2> {
        self.gate_pos[gate_id as usize]
    }

    /// Gate occupying a tile, if any. Out-of-bounds points return `None`
    /// rather than panicking.
    pub fn gate_at(&self, p: Point2) -> Option<u32> {
        if !p.in_bounds(self.dim) {
            return None;
        }
        self.occupancy[self.index(p)]
    }

    fn index(&self, p: Point2) -> usize {
        (p.y * self.dim.x + p.x) as usize
    }

    fn set_tiles(&mut self, gate_id: u32, pos: Point2, value: Option<u32>) {
        let footprint = self.netlist.gate(gate_id as usize).footprint();
        for dy in 0..footprint.y {
            for dx in 0..footprint.x {
                let p = pos + Point2::new(dx, dy);
                let idx = self.index(p);
                self.occupancy[idx] = value;
            }
        }
    }

    fn is_free(&self, gate_id: u32, pos: Point2) -> bool {
        let footprint = self.netlist.gate(gate_id as usize).footprint();
        for dy in 0..footprint.y {
            for dx in 0..footprint.x {
                let p = pos + Point2::new(dx, dy);
                if !p.in_bounds(self.dim) {
                    return false;
                }
                if is_perimeter(p, self.dim) {
                    return false;
                }
                if self.occupancy[self.index(p)].is_some() {
                    return false;
                }
            }
        }
        true
    }

    fn fill(&mut self, gate_id: u32, pos: Point2) {
        self.gate_pos[gate_id as usize] = Some(pos);
        self.set_tiles(gate_id, pos, Some(gate_id));
        debug!("place gate {} at {:?}", gate_id, pos);
    }

    fn free(&mut self, gate_id: u32) {
        if let Some(pos) = self.gate_pos[gate_id as usize] {
            self.set_tiles(gate_id, pos, None);
            self.gate_pos[gate_id as usize] = None;
            debug!("free gate {} from {:?}", gate_id, pos);
        }
    }

    /// Random placement of a single gate: try up to [`PLACE_RETRY_COUNT`]
    /// uniformly random tiles, placing on the first one whose whole
    /// footprint is in-bounds, off-perimeter, and empty.
    fn place(&mut self, gate_id: u32, rng: &mut impl Rng) -> Result<(), Error> {
        for _ in 0..PLACE_RETRY_COUNT {
            let pos = Point2::new(
                rng.gen_range(0, self.dim.x),
                rng.gen_range(0, self.dim.y),
            );
            if self.is_free(gate_id, pos) {
                self.fill(gate_id, pos);
                return Ok(());
            }
        }
        Err(Error::GridExhausted(format!(
            "unable to find placement for gate {} after {} attempts",
            gate_id, PLACE_RETRY_COUNT
        )))
    }

    fn move_gate(&mut self, gate_id: u32, rng: &mut impl Rng) -> Result<(), Error> {
        self.cost.begin_gate_move(gate_id, self.netlist);
        self.free(gate_id);
        self.place(gate_id, rng)?;
        self.cost.end_gate_move(gate_id, self.netlist, &self.gate_pos);
        Ok(())
    }

    /// Pick two distinct, currently-placed, non-port gates uniformly at
    /// random, free and re-place both, and return their prior positions so
    /// the move can be undone with [`Self::undo_mutate`].
    pub fn mutate(&mut self, rng: &mut impl Rng) -> Result<(u32, Point2, u32, Point2), Error> {
        self.mutate_inner(rng).map_err(|e| {
            error!("mutation failed: {}", e);
            e
        })
    }

    fn mutate_inner(&mut self, rng: &mut impl Rng) -> Result<(u32, Point2, u32, Point2), Error> {
        let candidates: Vec<u32> = (0..self.gate_pos.len() as u32)
            .filter(|&id| !self.netlist.gate(id as usize).is_port() && self.gate_pos[id as usize].is_some())
            .collect();
        if candidates.len() < 2 {
            return Err(Error::CorruptState(
                "fewer than two movable gates are placed; cannot mutate".to_string(),
            ));
        }

        let mut a_idx = rng.gen_range(0, candidates.len());
        let mut b_idx = rng.gen_range(0, candidates.len());
        let mut retries = 0;
        while a_idx == b_idx {
            b_idx = rng.gen_range(0, candidates.len());
            retries += 1;
            if retries > PLACE_RETRY_COUNT {
                return Err(Error::CorruptState(
                    "could not pick two distinct gates to mutate".to_string(),
                ));
            }
        }
        let a = candidates[a_idx];
        let b = candidates[b_idx];

        let old_a = self.gate_pos[a as usize].ok_or_else(|| {
            Error::CorruptState(format!("gate {} selected for mutation is unplaced", a))
        })?;
        let old_b = self.gate_pos[b as usize].ok_or_else(|| {
            Error::CorruptState(format!("gate {} selected for mutation is unplaced", b))
        })?;

        self.cost.begin_mutation(&[a, b], self.netlist);
        self.move_gate(a, rng)?;
        self.move_gate(b, rng)?;
        self.cost.commit_mutation();

        Ok((a, old_a, b, old_b))
    }

    /// Undo a mutation produced by [`Self::mutate`], restoring occupancy,
    /// `gate_pos`, and `total_cost` bit-exactly.
    pub fn undo_mutate(&mut self, a: u32, old_a: Point2, b: u32, old_b: Point2) {
        self.free(a);
        self.free(b);
        self.fill(a, old_a);
        self.fill(b, old_b);
        self.cost.rollback_mutation();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::ingest;
    use assert_approx_eq::assert_approx_eq;
    use rand::SeedableRng;

    const ADDER_JSON: &str = r#"{
        "modules": { "top": {
            "cells": {
                "n1": {"type": "NOT", "connections": {"A": [1], "Y": [2]}}
            },
            "ports": {
                "i": {"direction": "input", "bits": [1]},
                "o": {"direction": "output", "bits": [2]}
            }
        }}
    }"#;

    fn net() -> crate::netlist::Netlist {
        ingest(ADDER_JSON, "top").unwrap()
    }

    #[test]
    fn perimeter_iter_visits_every_tile_once_clockwise_from_origin() {
        let dim = Point2::new(4, 4);
        let visited: Vec<Point2> = perimeter_iter(dim).collect();
        assert_eq!(visited[0], Point2::new(0, 0));
        assert_eq!(visited.len(), 2 * 4 + 2 * 4 - 4);
        let unique: std::collections::HashSet<_> = visited.iter().copied().collect();
        assert_eq!(unique.len(), visited.len());
        for p in &visited {
            assert!(is_perimeter(*p, dim));
        }
    }

    #[test]
    fn s1_ports_on_perimeter_logic_gate_interior() {
        let netlist = net();
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        let grid = GatesGrid::new(Point2::new(4, 4), &netlist, &mut rng).unwrap();

        for (gate_id, gate) in netlist.gates().iter().enumerate() {
            let pos = grid.get_pos(gate_id as u32).unwrap();
            if gate.is_port() {
                assert!(is_perimeter(pos, grid.dim()));
            } else {
                assert!(!is_perimeter(pos, grid.dim()));
            }
        }
    }

    #[test]
    fn occupancy_consistency_after_mutate_and_undo() {
        let netlist = net();
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let mut grid = GatesGrid::new(Point2::new(6, 6), &netlist, &mut rng).unwrap();
        let before_cost = grid.cost();
        let before_positions: Vec<_> = grid.gate_pos.clone();

        let (a, pa, b, pb) = grid.mutate(&mut rng).unwrap();
        grid.undo_mutate(a, pa, b, pb);

        assert_eq!(grid.gate_pos, before_positions);
        assert_approx_eq!(grid.cost(), before_cost);
        assert_approx_eq!(grid.cost.recompute_total(), grid.cost());
    }

    #[test]
    fn many_mutate_undo_round_trips_preserve_cost_and_occupancy() {
        let netlist = net();
        let mut rng = rand::rngs::StdRng::seed_from_u64(42);
        let mut grid = GatesGrid::new(Point2::new(6, 6), &netlist, &mut rng).unwrap();
        let before_cost = grid.cost();
        let before_positions = grid.gate_pos.clone();
        let before_occupancy = grid.occupancy.clone();

        for _ in 0..1000 {
            let (a, pa, b, pb) = grid.mutate(&mut rng).unwrap();
            grid.undo_mutate(a, pa, b, pb);
        }

        assert_approx_eq!(grid.cost(), before_cost);
        assert_eq!(grid.gate_pos, before_positions);
        assert_eq!(grid.occupancy, before_occupancy);
    }

    #[test]
    fn grid_too_small_for_ports_is_exhausted() {
        let netlist = net();
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        // A 1x1 grid has one perimeter tile but two ports need placing.
        assert!(GatesGrid::new(Point2::new(1, 1), &netlist, &mut rng).is_err());
    }
}
