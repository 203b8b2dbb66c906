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

//! # Netlist model
//!
//! Gate records, the forward net→gates mapping, its reverse gate→nets
//! mapping, and the NOR-input equivalence folding that happens once, before
//! any placement. See [`crate::ingest`] for how this model is built from
//! synthesized JSON.

mod union_find;

use crate::geometry::Point2;
use crate::Error;
use std::collections::{BTreeMap, BTreeSet, HashMap};

pub(crate) use union_find::UnionFind;

/// The kind of cell a [`Gate`] represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateType {
    /// Buffer: single input, single output, 1x1 footprint.
    Buff,
    /// Inverter. Also the folded target of synthesized `NOR` cells.
    Not,
    /// D flip-flop: data input, clock input, data output.
    Dff,
    /// Top-level input port.
    In,
    /// Top-level output port.
    Out,
}

impl GateType {
    /// True for [`GateType::In`] and [`GateType::Out`].
    pub fn is_port(self) -> bool {
        matches!(self, GateType::In | GateType::Out)
    }

    /// Footprint in grid tiles: `NOT` occupies 1x2, everything else 1x1.
    pub fn footprint(self) -> Point2 {
        match self {
            GateType::Not => Point2::new(1, 2),
            _ => Point2::new(1, 1),
        }
    }

    /// Offset of the input terminal relative to the gate's top-left tile.
    pub fn in_coords(self) -> Point2 {
        Point2::new(0, 0)
    }

    /// Offset of the output terminal relative to the gate's top-left tile.
    pub fn out_coords(self) -> Point2 {
        match self {
            GateType::Not => Point2::new(0, 1),
            _ => Point2::new(0, 0),
        }
    }

    /// Offset of the clock terminal, defined only for [`GateType::Dff`].
    pub fn clk_coords(self) -> Option<Point2> {
        match self {
            GateType::Dff => Some(Point2::new(0, 0)),
            _ => None,
        }
    }
}

/// A single placed-or-placeable circuit element.
#[derive(Debug, Clone)]
pub struct Gate {
    /// Stable identifier, unique within a run.
    pub name: String,
    /// The kind of cell.
    pub gate_type: GateType,
    /// Net ids this gate reads as data input.
    pub inputs: BTreeSet<u32>,
    /// Net ids this gate drives as output.
    pub outputs: BTreeSet<u32>,
    /// Net ids this gate reads as clock input (non-empty only for `DFF`).
    pub clk_inputs: BTreeSet<u32>,
}

impl Gate {
    /// True iff this gate is a top-level `IN`/`OUT` port.
    pub fn is_port(&self) -> bool {
        self.gate_type.is_port()
    }

    /// Footprint in grid tiles.
    pub fn footprint(&self) -> Point2 {
        self.gate_type.footprint()
    }

    /// Every net id this gate terminates, across inputs/outputs/clocks.
    pub fn nets(&self) -> impl Iterator<Item = u32> + '_ {
        self.inputs
            .iter()
            .chain(self.outputs.iter())
            .chain(self.clk_inputs.iter())
            .copied()
    }
}

/// The synthesized, immutable circuit graph: gates plus the nets that
/// connect them. Index within `gates` doubles as the dense `gate_id`.
#[derive(Debug, Clone)]
pub struct Netlist {
    gates: Vec<Gate>,
    net_to_gates: BTreeMap<u32, BTreeSet<usize>>,
    gate_to_nets: Vec<BTreeSet<u32>>,
}

impl Netlist {
    /// Build a netlist from its gates and the forward net→gates mapping,
    /// deriving the reverse gate→nets mapping by inversion.
    pub fn new(
        gates: Vec<Gate>,
        net_to_gates: BTreeMap<u32, BTreeSet<usize>>,
    ) -> Result<Self, Error> {
        let mut gate_to_nets = vec![BTreeSet::new(); gates.len()];
        for (&net_id, gate_ids) in &net_to_gates {
            for &gate_id in gate_ids {
                let nets = gate_to_nets.get_mut(gate_id).ok_or_else(|| {
                    Error::MalformedNetlist(format!(
                        "net {} references out-of-range gate {}",
                        net_id, gate_id
                    ))
                })?;
                nets.insert(net_id);
            }
        }
        for (gate_id, gate) in gates.iter().enumerate() {
            match gate.gate_type {
                GateType::In => {
                    if gate.outputs.is_empty() {
                        return Err(Error::MalformedNetlist(format!(
                            "input port {} ({}) has no output net",
                            gate_id, gate.name
                        )));
                    }
                }
                GateType::Out => {
                    if gate.inputs.is_empty() {
                        return Err(Error::MalformedNetlist(format!(
                            "output port {} ({}) has no input net",
                            gate_id, gate.name
                        )));
                    }
                }
                GateType::Dff => {
                    if gate.clk_inputs.is_empty() {
                        return Err(Error::MalformedNetlist(format!(
                            "DFF {} ({}) has no clock net",
                            gate_id, gate.name
                        )));
                    }
                }
                GateType::Buff | GateType::Not => {
                    if gate.outputs.is_empty() {
                        return Err(Error::MalformedNetlist(format!(
                            "logic gate {} ({}) has no output net",
                            gate_id, gate.name
                        )));
                    }
                }
            }
        }
        Ok(Self {
            gates,
            net_to_gates,
            gate_to_nets,
        })
    }

    /// All gates, indexed by dense `gate_id`.
    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    /// Number of gates in the netlist (ports included).
    pub fn num_gates(&self) -> usize {
        self.gates.len()
    }

    /// Gate accessor by id.
    pub fn gate(&self, gate_id: usize) -> &Gate {
        &self.gates[gate_id]
    }

    /// Forward mapping: net id to the set of gate ids that terminate it.
    pub fn net_to_gates(&self) -> &BTreeMap<u32, BTreeSet<usize>> {
        &self.net_to_gates
    }

    /// Reverse mapping: gate id to the set of net ids it terminates.
    pub fn gate_to_nets(&self, gate_id: usize) -> &BTreeSet<u32> {
        &self.gate_to_nets[gate_id]
    }
}

/// Transitively close a set of `(a, b)` equivalence pairs (the two inputs of
/// every synthesized `NOR` cell) into disjoint classes, and return a
/// rewriter that maps every net id to the minimum id in its class.
///
/// Net ids that never appear in a pair map to themselves.
pub(crate) fn fold_equivalences(pairs: &[(u32, u32)]) -> impl Fn(u32) -> u32 {
    let mut uf = UnionFind::new();
    for &(a, b) in pairs {
        uf.union(a, b);
    }
    // Resolve every member eagerly, once, while `uf` is still mutable: `find`
    // needs `&mut self` for path compression, so the returned closure cannot
    // hold `uf` and call into it lazily. A plain lookup table is both cheaper
    // to call repeatedly and lets the rewriter be `Fn`, not `FnMut`.
    let mut resolved: HashMap<u32, u32> = HashMap::new();
    for &(a, b) in pairs {
        resolved.entry(a).or_insert_with(|| uf.find(a));
        resolved.entry(b).or_insert_with(|| uf.find(b));
    }
    move |net_id: u32| resolved.get(&net_id).copied().unwrap_or(net_id)
}
