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

//! # View adapters
//!
//! Read-only helpers over a [`GatesGrid`] for presentation layers (a CLI
//! HUD, a future graphical front end) plus a bounded log ring buffer a host
//! binary can register once and poll for display. Neither adapter mutates
//! placement or routing state.

use crate::geometry::Point2;
use crate::grid::GatesGrid;
use log::Level;

/// Name and type of the gate occupying `p`, for a selection tooltip.
pub fn describe_gate_at(grid: &GatesGrid, p: Point2) -> Option<String> {
    let gate_id = grid.gate_at(p)?;
    let gate = grid.netlist().gate(gate_id as usize);
    Some(format!("{} ({:?})", gate.name, gate.gate_type))
}

/// Top-left tile of the gate occupying `p`, the anchor of its footprint.
pub fn position_of_gate_at(grid: &GatesGrid, p: Point2) -> Option<Point2> {
    let gate_id = grid.gate_at(p)?;
    grid.get_pos(gate_id)
}

/// Axis-aligned bounding box, in tiles, of the gate occupying `p`. Returns
/// `(top_left, bottom_right_exclusive)`.
pub fn selection_bounding_box(grid: &GatesGrid, p: Point2) -> Option<(Point2, Point2)> {
    let gate_id = grid.gate_at(p)?;
    let pos = grid.get_pos(gate_id)?;
    let footprint = grid.netlist().gate(gate_id as usize).footprint();
    Some((pos, pos + footprint))
}

/// One captured log line: level plus rendered message.
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Severity of the original `log` crate call.
    pub level: Level,
    /// The fully formatted message.
    pub message: String,
}

/// A fixed-capacity FIFO of the most recent log lines, for a HUD to poll
/// without re-plumbing its own `log::Log` implementation. Library code only
/// ever pushes into it; rendering is entirely the host binary's concern.
#[derive(Debug)]
pub struct LogRing {
    capacity: usize,
    entries: std::collections::VecDeque<LogEntry>,
}

impl LogRing {
    /// A ring buffer holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: std::collections::VecDeque::with_capacity(capacity),
        }
    }

    /// Append an entry, evicting the oldest one if at capacity.
    pub fn push(&mut self, level: Level, message: impl Into<String>) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(LogEntry {
            level,
            message: message.into(),
        });
    }

    /// The captured entries, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// Number of entries currently held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True iff no entries have been pushed yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::ingest;
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

    #[test]
    fn selection_bounding_box_matches_footprint() {
        let netlist = ingest(ADDER_JSON, "top").unwrap();
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        let grid = GatesGrid::new(Point2::new(6, 6), &netlist, &mut rng).unwrap();

        for gate_id in 0..netlist.num_gates() as u32 {
            let pos = grid.get_pos(gate_id).unwrap();
            let (tl, br) = selection_bounding_box(&grid, pos).unwrap();
            assert_eq!(tl, pos);
            assert_eq!(br, pos + netlist.gate(gate_id as usize).footprint());
        }
    }

    #[test]
    fn empty_tile_has_no_selection() {
        let netlist = ingest(ADDER_JSON, "top").unwrap();
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        let grid = GatesGrid::new(Point2::new(6, 6), &netlist, &mut rng).unwrap();
        // (0,0) is a port-free perimeter corner tile on a 6x6 grid only if
        // no port landed there; fall back to scanning for a guaranteed-empty
        // interior tile instead of assuming a fixed coordinate.
        let empty = (0..6)
            .flat_map(|y| (0..6).map(move |x| Point2::new(x, y)))
            .find(|&p| grid.gate_at(p).is_none())
            .expect("grid has at least one empty tile");
        assert!(selection_bounding_box(&grid, empty).is_none());
        assert!(describe_gate_at(&grid, empty).is_none());
    }

    #[test]
    fn ring_buffer_evicts_oldest_entry_past_capacity() {
        let mut ring = LogRing::new(2);
        ring.push(Level::Info, "a");
        ring.push(Level::Info, "b");
        ring.push(Level::Warn, "c");
        let messages: Vec<&str> = ring.entries().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["b", "c"]);
        assert_eq!(ring.len(), 2);
    }
}
