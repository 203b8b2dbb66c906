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

//! # Router
//!
//! Layered 3-D maze expansion with a priority wavefront, predecessor
//! backtracking, multi-terminal net handling by successive target
//! absorption, and a rip-up-and-reroute outer loop. See `spec.md` §4.5.

use crate::geometry::{Point2, Point3};
use crate::grid::GatesGrid;
use crate::netlist::Netlist;
use crate::Error;
use log::{error, info, warn};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap, HashSet, VecDeque};
use std::fmt::Write as _;

/// How the current wavefront cell was reached. `Unset` marks a predecessor
/// slot that has not yet been visited by any expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pred {
    /// This cell is itself a source (or absorbed trace) point.
    Root,
    /// Reached by stepping north (`y - 1`).
    North,
    /// Reached by stepping south (`y + 1`).
    South,
    /// Reached by stepping east (`x + 1`).
    East,
    /// Reached by stepping west (`x - 1`).
    West,
    /// Reached by a via stepping up (`z + 1`).
    Up,
    /// Reached by a via stepping down (`z - 1`).
    Down,
    /// Not yet visited.
    Unset,
}

impl Pred {
    /// The offset from a cell to its predecessor (the neighbor it was
    /// reached from), so `loc + pred.delta()` walks one step back towards
    /// the source during backtrace.
    fn delta(self) -> Point3 {
        match self {
            Pred::Root => Point3::new(0, 0, 0),
            Pred::North => Point3::new(0, -1, 0),
            Pred::South => Point3::new(0, 1, 0),
            Pred::East => Point3::new(1, 0, 0),
            Pred::West => Point3::new(-1, 0, 0),
            Pred::Up => Point3::new(0, 0, 1),
            Pred::Down => Point3::new(0, 0, -1),
            Pred::Unset => Point3::new(0, 0, 0),
        }
    }

    /// Cost of a step carrying this predecessor label: vias cost 3, planar
    /// steps cost 1.
    fn step_cost(self) -> u32 {
        match self {
            Pred::Up | Pred::Down => 3,
            _ => 1,
        }
    }

    const DIRECTIONS: [Pred; 6] = [
        Pred::North,
        Pred::South,
        Pred::East,
        Pred::West,
        Pred::Up,
        Pred::Down,
    ];
}

/// A single entry in the wavefront priority queue. Ordered by `cost`
/// ascending, ties broken by a monotonic sequence number so the ordering
/// never depends on `loc`/`pred` comparability.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
struct WavefrontCell {
    loc: Point3,
    cost: u32,
    seq: u64,
    pred: Pred,
}

impl Ord for WavefrontCell {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so `BinaryHeap` (a max-heap) pops the smallest cost
        // first, with the earliest-enqueued entry breaking ties.
        (other.cost, other.seq).cmp(&(self.cost, self.seq))
    }
}

impl PartialOrd for WavefrontCell {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Default number of rip-up-and-reroute rounds attempted before a session
/// is reported as a [`Error::RoutingDeadEnd`].
pub const DEFAULT_MAX_RIPUP_ROUNDS: u32 = 64;

/// A completed (or still-in-progress) multi-net routing session's output:
/// the 3-D grid of route ids and, per net, the ordered trace of cells that
/// make it up.
#[derive(Debug)]
pub struct RouteResult {
    dim: Point2,
    max_layers: i64,
    cells: Vec<Option<u32>>,
    traces: BTreeMap<u32, Vec<Point3>>,
}

impl RouteResult {
    fn index(&self, p: Point3) -> usize {
        ((p.z * self.dim.y + p.y) * self.dim.x + p.x) as usize
    }

    /// Route id occupying a 3-D cell, if any.
    pub fn cell_at(&self, p: Point3) -> Option<u32> {
        if !p.in_bounds(self.dim, self.max_layers) {
            return None;
        }
        self.cells[self.index(p)]
    }

    /// The backtraced cell list for a completed net, if it was routed.
    pub fn trace(&self, net_id: u32) -> Option<&[Point3]> {
        self.traces.get(&net_id).map(|v| v.as_slice())
    }

    /// Every completed net id.
    pub fn routed_nets(&self) -> impl Iterator<Item = u32> + '_ {
        self.traces.keys().copied()
    }

    /// Render one layer as whitespace-separated integers, one row per grid
    /// `y`, `-1` for empty, matching `spec.md` §6's `routes-layer<k>` file
    /// format.
    pub fn dump_layer(&self, layer: i64) -> String {
        let mut out = String::new();
        for y in 0..self.dim.y {
            for x in 0..self.dim.x {
                if x > 0 {
                    out.push(' ');
                }
                match self.cell_at(Point3::new(x, y, layer)) {
                    Some(id) => write!(out, "{}", id).unwrap(),
                    None => out.push_str("-1"),
                }
            }
            out.push('\n');
        }
        out
    }

    /// Write every layer to `<dir>/routes-layer<k>`, per `spec.md` §6.
    pub fn write_layers(&self, dir: &std::path::Path) -> std::io::Result<()> {
        for layer in 0..self.max_layers {
            let path = dir.join(format!("routes-layer{}", layer));
            std::fs::write(path, self.dump_layer(layer))?;
        }
        Ok(())
    }
}

/// Multi-net, multi-layer maze router.
pub struct Router {
    dim: Point2,
    max_layers: i64,
    max_ripup_rounds: u32,
}

impl Router {
    /// A router over a `dim`-sized grid with `max_layers` routing layers,
    /// using the default rip-up round budget.
    pub fn new(dim: Point2, max_layers: i64) -> Self {
        Self::with_max_ripup_rounds(dim, max_layers, DEFAULT_MAX_RIPUP_ROUNDS)
    }

    /// As [`Self::new`], with an explicit cap on rip-up-and-reroute rounds.
    pub fn with_max_ripup_rounds(dim: Point2, max_layers: i64, max_ripup_rounds: u32) -> Self {
        Self {
            dim,
            max_layers,
            max_ripup_rounds,
        }
    }

    fn index(&self, p: Point3) -> usize {
        ((p.z * self.dim.y + p.y) * self.dim.x + p.x) as usize
    }

    fn num_cells(&self) -> usize {
        (self.max_layers * self.dim.x * self.dim.y).max(0) as usize
    }

    /// Collect, for every net, the ordered 2-D terminal points of every gate
    /// on that net, lifted to layer 0. The first point is the route's
    /// source, the rest are targets. See `spec.md` §4.5.
    fn construct_routes(&self, netlist: &Netlist, grid: &GatesGrid) -> BTreeMap<u32, Vec<Point3>> {
        let mut routes = BTreeMap::new();
        for (&net_id, gate_ids) in netlist.net_to_gates() {
            let mut points = Vec::new();
            for &gate_id in gate_ids {
                let gate = netlist.gate(gate_id);
                let pos = match grid.get_pos(gate_id as u32) {
                    Some(p) => p,
                    None => continue,
                };
                if gate.inputs.contains(&net_id) {
                    points.push((pos + gate.gate_type.in_coords()).to_point3(0));
                }
                if gate.outputs.contains(&net_id) {
                    points.push((pos + gate.gate_type.out_coords()).to_point3(0));
                }
                if gate.clk_inputs.contains(&net_id) {
                    if let Some(clk) = gate.gate_type.clk_coords() {
                        points.push((pos + clk).to_point3(0));
                    }
                }
            }
            routes.insert(net_id, points);
        }
        routes
    }

    fn backtrace(
        &self,
        target_loc: Point3,
        target_pred: Pred,
        pred_grid: &[Pred],
        cells: &mut [Option<u32>],
        route_id: u32,
    ) -> Vec<Point3> {
        let mut pred = target_pred;
        let mut loc = target_loc;
        let mut trace = vec![loc];
        cells[self.index(loc)] = Some(route_id);

        while pred != Pred::Root {
            let new_loc = loc + pred.delta();
            pred = pred_grid[self.index(new_loc)];
            if pred != Pred::Root {
                trace.push(new_loc);
            }
            cells[self.index(new_loc)] = Some(route_id);
            loc = new_loc;
        }
        trace
    }

    /// Route a single net by Lee-style wavefront expansion with successive
    /// target absorption. Returns the full trace on success, or `None` if
    /// the wavefront empties before every target is reached.
    fn create_route(
        &self,
        cells: &mut [Option<u32>],
        route_id: u32,
        points: &[Point3],
    ) -> Option<Vec<Point3>> {
        let start = points[0];
        if !start.in_bounds(self.dim, self.max_layers) {
            return None;
        }
        let mut targets: Vec<Point3> = points[1..].to_vec();
        let mut trace = vec![start];
        let mut pred_grid = vec![Pred::Unset; self.num_cells()];
        pred_grid[self.index(start)] = Pred::Root;

        let mut seq = 0u64;
        let mut heap = BinaryHeap::new();
        let mut enqueued = HashSet::new();
        heap.push(WavefrontCell {
            loc: start,
            cost: 0,
            seq,
            pred: Pred::Root,
        });
        enqueued.insert(start);
        seq += 1;

        if targets.is_empty() {
            return Some(trace);
        }

        loop {
            let cell = match heap.pop() {
                Some(c) => c,
                None => return None,
            };
            enqueued.remove(&cell.loc);

            if let Some(pos) = targets.iter().position(|&t| t == cell.loc) {
                targets.remove(pos);
                let absorbed =
                    self.backtrace(cell.loc, cell.pred, &pred_grid, cells, route_id);
                trace.extend(absorbed);

                if targets.is_empty() {
                    return Some(trace);
                }

                pred_grid.iter_mut().for_each(|p| *p = Pred::Unset);
                for &t in &trace {
                    pred_grid[self.index(t)] = Pred::Root;
                }
                heap.clear();
                enqueued.clear();
                for &t in &trace {
                    heap.push(WavefrontCell {
                        loc: t,
                        cost: 0,
                        seq,
                        pred: Pred::Root,
                    });
                    enqueued.insert(t);
                    seq += 1;
                }
                continue;
            }

            for &dir in &Pred::DIRECTIONS {
                let nloc = cell.loc - dir.delta();
                if !nloc.in_bounds(self.dim, self.max_layers) {
                    continue;
                }
                if cells[self.index(nloc)].is_some() {
                    continue;
                }
                if pred_grid[self.index(nloc)] != Pred::Unset {
                    continue;
                }
                if enqueued.contains(&nloc) {
                    continue;
                }
                heap.push(WavefrontCell {
                    loc: nloc,
                    cost: cell.cost + dir.step_cost(),
                    seq,
                    pred: dir,
                });
                enqueued.insert(nloc);
                seq += 1;
            }
            pred_grid[self.index(cell.loc)] = cell.pred;
        }
    }

    /// Route every net in `netlist` against the frozen positions in `grid`,
    /// rip-up-and-rerouting (a full reset of the router grid) whenever a
    /// net dead-ends, up to the configured round budget.
    pub fn route(&self, netlist: &Netlist, grid: &GatesGrid) -> Result<RouteResult, Error> {
        let routes = self.construct_routes(netlist, grid);
        let mut queue: VecDeque<u32> = routes.keys().copied().collect();
        let mut created: BTreeMap<u32, Vec<Point3>> = BTreeMap::new();
        let mut cells = vec![None; self.num_cells()];
        let mut ripup_rounds = 0u32;

        info!("routing {} nets", routes.len());

        while let Some(net_id) = queue.pop_front() {
            let points = &routes[&net_id];
            match self.create_route(&mut cells, net_id, points) {
                Some(trace) => {
                    info!("created route {}", net_id);
                    created.insert(net_id, trace);
                }
                None => {
                    ripup_rounds += 1;
                    if ripup_rounds > self.max_ripup_rounds {
                        let err = Error::RoutingDeadEnd {
                            net_id,
                            attempts: ripup_rounds,
                        };
                        error!("{}", err);
                        return Err(err);
                    }
                    warn!(
                        "net {} dead-ended, ripping up all {} completed routes (round {})",
                        net_id,
                        created.len(),
                        ripup_rounds
                    );
                    queue.push_back(net_id);
                    for &id in created.keys() {
                        queue.push_back(id);
                    }
                    created.clear();
                    cells.iter_mut().for_each(|c| *c = None);
                }
            }
        }

        Ok(RouteResult {
            dim: self.dim,
            max_layers: self.max_layers,
            cells,
            traces: created,
        })
    }
}

#[cfg(test)]
impl Router {
    /// Route a single net against a caller-supplied set of pre-blocked
    /// cells, bypassing [`Self::construct_routes`]/[`Self::route`]'s
    /// netlist-driven terminal collection. Lets tests force a specific
    /// obstacle layout without hand-building a netlist to match it.
    fn route_single_for_test(
        &self,
        points: &[Point3],
        blocked: &[Point3],
    ) -> Option<Vec<Point3>> {
        let mut cells = vec![None; self.num_cells()];
        for &b in blocked {
            cells[self.index(b)] = Some(u32::MAX);
        }
        self.create_route(&mut cells, 0, points)
    }
}
