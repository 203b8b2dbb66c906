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

//! # CostCache
//!
//! Per-net HPWL memo with incremental delta updates around a two-gate
//! mutation, and O(1) undo. See `spec.md` §4.3.
//!
//! The cache knows nothing about the grid's occupancy array; it is driven
//! entirely by the explicit `begin_mutation` / `begin_gate_move` /
//! `end_gate_move` / `commit_mutation` / `rollback_mutation` sequence that
//! [`super::GatesGrid::mutate`] calls around its own tile bookkeeping.

use crate::geometry::Point2;
use crate::netlist::Netlist;
use std::collections::BTreeMap;

/// Half-perimeter wire length of a net given its gates' positions. Unplaced
/// gates (`None`) are skipped; a net with fewer than one placed terminal
/// contributes zero.
fn hpwl(positions: impl Iterator<Item = Point2>) -> f64 {
    let mut min_x = i64::MAX;
    let mut max_x = i64::MIN;
    let mut min_y = i64::MAX;
    let mut max_y = i64::MIN;
    let mut any = false;
    for p in positions {
        any = true;
        min_x = min_x.min(p.x);
        max_x = max_x.max(p.x);
        min_y = min_y.min(p.y);
        max_y = max_y.max(p.y);
    }
    if !any {
        return 0.0;
    }
    ((max_x - min_x) + (max_y - min_y)) as f64 / 2.0
}

/// Incremental half-perimeter-wire-length cache, one entry per net.
#[derive(Debug, Clone, Default)]
pub struct CostCache {
    hpwl: BTreeMap<u32, f64>,
    total_cost: f64,
    undo_snapshot: BTreeMap<u32, f64>,
    undo_cost_old: f64,
    undo_cost_new: f64,
}

impl CostCache {
    /// A cache with no nets, cost zero. Only used transiently while
    /// [`super::GatesGrid::new`] is placing gates; [`Self::build`] replaces
    /// it once placement is complete.
    pub(crate) fn empty() -> Self {
        Self::default()
    }

    /// Compute and memoize the HPWL of every net from scratch.
    pub fn build(netlist: &Netlist, gate_pos: &[Option<Point2>]) -> Self {
        let mut cache = Self::default();
        for (&net_id, gate_ids) in netlist.net_to_gates() {
            let cost = hpwl(gate_ids.iter().filter_map(|&g| gate_pos[g]));
            cache.hpwl.insert(net_id, cost);
            cache.total_cost += cost;
        }
        cache
    }

    /// Current total cost, the sum of every net's memoized HPWL.
    pub fn total_cost(&self) -> f64 {
        self.total_cost
    }

    /// Recompute the total from scratch, for property checks (`spec.md` §8
    /// property 4: cost agreement).
    pub fn recompute_total(&self) -> f64 {
        self.hpwl.values().sum()
    }

    /// Begin a mutation touching `gate_ids`: snapshot every net either gate
    /// terminates, so [`Self::rollback_mutation`] can restore it exactly.
    pub fn begin_mutation(&mut self, gate_ids: &[u32], netlist: &Netlist) {
        self.undo_snapshot.clear();
        self.undo_cost_old = 0.0;
        self.undo_cost_new = 0.0;
        for &gate_id in gate_ids {
            for &net_id in netlist.gate_to_nets(gate_id as usize) {
                self.undo_snapshot.insert(net_id, self.hpwl[&net_id]);
            }
        }
    }

    /// Before a gate is freed and re-placed, fold its affected nets'
    /// pre-move cost into the old partial sum.
    pub fn begin_gate_move(&mut self, gate_id: u32, netlist: &Netlist) {
        for &net_id in netlist.gate_to_nets(gate_id as usize) {
            self.undo_cost_old += self.hpwl[&net_id];
        }
    }

    /// After a gate has been re-placed, recompute every net it affects from
    /// the new `gate_pos` and fold the refreshed cost into the new partial
    /// sum. Nets shared between both moved gates are intentionally summed
    /// twice here; the doubled delta cancels at `commit_mutation` (see
    /// `spec.md` §4.3 "Subtlety").
    pub fn end_gate_move(&mut self, gate_id: u32, netlist: &Netlist, gate_pos: &[Option<Point2>]) {
        for &net_id in netlist.gate_to_nets(gate_id as usize) {
            let gate_ids = &netlist.net_to_gates()[&net_id];
            let cost = hpwl(gate_ids.iter().filter_map(|&g| gate_pos[g]));
            self.hpwl.insert(net_id, cost);
            self.undo_cost_new += cost;
        }
    }

    /// Fold the accumulated partial sums into `total_cost`.
    pub fn commit_mutation(&mut self) {
        self.total_cost += self.undo_cost_new - self.undo_cost_old;
    }

    /// Undo the most recent mutation: reverse the partial-sum delta and
    /// restore every snapshotted net's pre-mutation HPWL.
    pub fn rollback_mutation(&mut self) {
        self.total_cost -= self.undo_cost_new - self.undo_cost_old;
        for (&net_id, &old) in &self.undo_snapshot {
            self.hpwl.insert(net_id, old);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point2;
    use crate::netlist::{Gate, GateType, Netlist};
    use std::collections::BTreeSet;

    fn two_point_net() -> (Netlist, Vec<Option<Point2>>) {
        let gates = vec![
            Gate {
                name: "a".into(),
                gate_type: GateType::Buff,
                inputs: BTreeSet::new(),
                outputs: [1u32].into_iter().collect(),
                clk_inputs: BTreeSet::new(),
            },
            Gate {
                name: "b".into(),
                gate_type: GateType::Buff,
                inputs: [1u32].into_iter().collect(),
                outputs: [2u32].into_iter().collect(),
                clk_inputs: BTreeSet::new(),
            },
        ];
        let mut net_to_gates = std::collections::BTreeMap::new();
        net_to_gates.insert(1u32, [0usize, 1].into_iter().collect());
        net_to_gates.insert(2u32, [1usize].into_iter().collect());
        let netlist = Netlist::new(gates, net_to_gates).unwrap();
        let positions = vec![Some(Point2::new(0, 0)), Some(Point2::new(3, 4))];
        (netlist, positions)
    }

    #[test]
    fn hpwl_matches_bounding_box_formula() {
        let points = [Point2::new(0, 0), Point2::new(3, 4)];
        assert_eq!(hpwl(points.iter().copied()), 3.5);
    }

    #[test]
    fn hpwl_of_unplaced_net_is_zero() {
        assert_eq!(hpwl(std::iter::empty()), 0.0);
    }

    #[test]
    fn build_sums_every_net() {
        let (netlist, positions) = two_point_net();
        let cache = CostCache::build(&netlist, &positions);
        // net 1 spans (0,0)-(3,4) -> 3.5; net 2 is a single point -> 0.
        assert_eq!(cache.total_cost(), 3.5);
        assert_eq!(cache.total_cost(), cache.recompute_total());
    }

    #[test]
    fn mutation_then_rollback_restores_total_exactly() {
        let (netlist, mut positions) = two_point_net();
        let mut cache = CostCache::build(&netlist, &positions);
        let before = cache.total_cost();

        cache.begin_mutation(&[1], &netlist);
        cache.begin_gate_move(1, &netlist);
        positions[1] = Some(Point2::new(10, 10));
        cache.end_gate_move(1, &netlist, &positions);
        cache.commit_mutation();
        assert_ne!(cache.total_cost(), before);

        positions[1] = Some(Point2::new(3, 4));
        cache.rollback_mutation();
        assert_eq!(cache.total_cost(), before);
        assert_eq!(cache.total_cost(), cache.recompute_total());
    }

    #[test]
    fn shared_net_double_count_cancels_on_commit() {
        // Both gates of net 1 move in the same mutation; net 1 is affected
        // by both and gets recomputed twice, but the doubled delta cancels.
        let (netlist, mut positions) = two_point_net();
        let mut cache = CostCache::build(&netlist, &positions);

        cache.begin_mutation(&[0, 1], &netlist);
        cache.begin_gate_move(0, &netlist);
        positions[0] = Some(Point2::new(1, 1));
        cache.end_gate_move(0, &netlist, &positions);
        cache.begin_gate_move(1, &netlist);
        positions[1] = Some(Point2::new(5, 5));
        cache.end_gate_move(1, &netlist, &positions);
        cache.commit_mutation();

        assert_eq!(cache.total_cost(), cache.recompute_total());
    }
}
