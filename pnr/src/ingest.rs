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

//! # Netlist ingestion
//!
//! Converts an external synthesized JSON document (the output of a
//! black-box synthesis/tech-mapping tool, see `spec.md` §6) into a
//! [`Netlist`]. This is the only place the engine parses untrusted input;
//! every failure here is a [`Error::MalformedNetlist`] (or a JSON/IO
//! wrapper variant) and no partial netlist is ever returned.

use crate::netlist::{fold_equivalences, Gate, GateType, Netlist};
use crate::Error;
use log::{error, info};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Deserialize)]
struct RawDoc {
    modules: BTreeMap<String, RawModule>,
}

#[derive(Debug, Deserialize)]
struct RawModule {
    #[serde(default)]
    cells: BTreeMap<String, RawCell>,
    #[serde(default)]
    ports: BTreeMap<String, RawPort>,
}

#[derive(Debug, Deserialize)]
struct RawCell {
    #[serde(rename = "type")]
    cell_type: String,
    connections: BTreeMap<String, Vec<u32>>,
}

#[derive(Debug, Deserialize)]
struct RawPort {
    direction: String,
    bits: Vec<u32>,
}

fn pin<'a>(conn: &'a BTreeMap<String, Vec<u32>>, pin: &str, cell: &str) -> Result<&'a [u32], Error> {
    conn.get(pin)
        .map(|v| v.as_slice())
        .ok_or_else(|| Error::MalformedNetlist(format!("cell {} missing pin {}", cell, pin)))
}

struct RawGate {
    name: String,
    gate_type: GateType,
    inputs: Vec<u32>,
    outputs: Vec<u32>,
    clk_inputs: Vec<u32>,
}

fn cell_gate_type(name: &str, yosys_type: &str) -> Result<GateType, Error> {
    match yosys_type {
        "NOT" | "NOR" => Ok(GateType::Not),
        "BUFF" => Ok(GateType::Buff),
        "DFF" => Ok(GateType::Dff),
        other => Err(Error::MalformedNetlist(format!(
            "cell {} has unknown type {}",
            name, other
        ))),
    }
}

/// Parse a synthesized-netlist JSON document and build the [`Netlist`] for
/// the named module, folding `NOR` input equivalences as described in
/// `spec.md` §4.1.
pub fn ingest(json: &str, module: &str) -> Result<Netlist, Error> {
    ingest_inner(json, module).map_err(|e| {
        error!("ingest of module {} failed: {}", module, e);
        e
    })
}

fn ingest_inner(json: &str, module: &str) -> Result<Netlist, Error> {
    let doc: RawDoc = serde_json::from_str(json)?;
    let raw_module = doc
        .modules
        .get(module)
        .ok_or_else(|| Error::MalformedNetlist(format!("no such module: {}", module)))?;

    // Pass 1: collect NOR (A[0], B[0]) pairs from the *original* net ids,
    // before any cell extraction or folding.
    let mut nor_pairs = Vec::new();
    for (name, cell) in &raw_module.cells {
        if cell.cell_type == "NOR" {
            let a0 = *pin(&cell.connections, "A", name)?
                .first()
                .ok_or_else(|| Error::MalformedNetlist(format!("cell {} has empty A", name)))?;
            let b0 = *pin(&cell.connections, "B", name)?
                .first()
                .ok_or_else(|| Error::MalformedNetlist(format!("cell {} has empty B", name)))?;
            nor_pairs.push((a0, b0));
        }
    }
    let rewrite = fold_equivalences(&nor_pairs);

    // Pass 2: extract each cell's terminals and rewrite every net id to its
    // canonical representative.
    let mut raw_gates = Vec::new();
    for (name, cell) in &raw_module.cells {
        let gate_type = cell_gate_type(name, &cell.cell_type)?;
        let (inputs, outputs, clk_inputs) = if gate_type == GateType::Dff {
            (
                pin(&cell.connections, "D", name)?.to_vec(),
                pin(&cell.connections, "Q", name)?.to_vec(),
                pin(&cell.connections, "C", name)?.to_vec(),
            )
        } else {
            let mut inputs = pin(&cell.connections, "A", name)?.to_vec();
            let outputs = pin(&cell.connections, "Y", name)?.to_vec();
            if cell.cell_type == "NOR" {
                inputs.extend_from_slice(pin(&cell.connections, "B", name)?);
            }
            (inputs, outputs, Vec::new())
        };
        raw_gates.push(RawGate {
            name: name.clone(),
            gate_type,
            inputs: inputs.into_iter().map(&rewrite).collect(),
            outputs: outputs.into_iter().map(&rewrite).collect(),
            clk_inputs: clk_inputs.into_iter().map(&rewrite).collect(),
        });
    }

    for (name, port) in &raw_module.ports {
        match port.direction.as_str() {
            "input" => raw_gates.push(RawGate {
                name: name.clone(),
                gate_type: GateType::In,
                inputs: Vec::new(),
                outputs: port.bits.iter().copied().map(&rewrite).collect(),
                clk_inputs: Vec::new(),
            }),
            "output" => raw_gates.push(RawGate {
                name: name.clone(),
                gate_type: GateType::Out,
                inputs: port.bits.iter().copied().map(&rewrite).collect(),
                outputs: Vec::new(),
                clk_inputs: Vec::new(),
            }),
            other => {
                return Err(Error::MalformedNetlist(format!(
                    "port {} has unknown direction {}",
                    name, other
                )))
            }
        }
    }

    let mut gates = Vec::with_capacity(raw_gates.len());
    let mut net_to_gates: BTreeMap<u32, BTreeSet<usize>> = BTreeMap::new();
    for (gate_id, raw) in raw_gates.into_iter().enumerate() {
        let gate = Gate {
            name: raw.name,
            gate_type: raw.gate_type,
            inputs: raw.inputs.into_iter().collect(),
            outputs: raw.outputs.into_iter().collect(),
            clk_inputs: raw.clk_inputs.into_iter().collect(),
        };
        for net_id in gate.nets() {
            net_to_gates.entry(net_id).or_default().insert(gate_id);
        }
        gates.push(gate);
    }

    info!(
        "ingested module {}: {} gates, {} nets",
        module,
        gates.len(),
        net_to_gates.len()
    );
    Netlist::new(gates, net_to_gates)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_not_chain() {
        let json = r#"{
            "modules": {
                "top": {
                    "cells": {
                        "n1": {"type": "NOT", "connections": {"A": [1], "Y": [2]}}
                    },
                    "ports": {
                        "i": {"direction": "input", "bits": [1]},
                        "o": {"direction": "output", "bits": [2]}
                    }
                }
            }
        }"#;
        let net = ingest(json, "top").unwrap();
        assert_eq!(net.num_gates(), 3);
        let not_gate = net.gates().iter().find(|g| g.gate_type == GateType::Not).unwrap();
        assert_eq!(not_gate.inputs, [1u32].into_iter().collect());
        assert_eq!(not_gate.outputs, [2u32].into_iter().collect());
    }

    #[test]
    fn nor_folding_unifies_net_ids() {
        let json = r#"{
            "modules": {
                "top": {
                    "cells": {
                        "n1": {"type": "NOR", "connections": {"A": [5], "B": [7], "Y": [9]}},
                        "n2": {"type": "NOR", "connections": {"A": [7], "B": [11], "Y": [13]}}
                    },
                    "ports": {}
                }
            }
        }"#;
        let net = ingest(json, "top").unwrap();
        let n1 = net.gates().iter().find(|g| g.name == "n1").unwrap();
        let n2 = net.gates().iter().find(|g| g.name == "n2").unwrap();
        assert_eq!(n1.inputs, [5u32].into_iter().collect());
        assert_eq!(n2.inputs, [5u32].into_iter().collect());
    }

    #[test]
    fn unknown_cell_type_is_fatal() {
        let json = r#"{
            "modules": {
                "top": {
                    "cells": {
                        "x": {"type": "XOR", "connections": {"A": [1], "Y": [2]}}
                    },
                    "ports": {}
                }
            }
        }"#;
        assert!(ingest(json, "top").is_err());
    }

    #[test]
    fn missing_pin_is_fatal() {
        let json = r#"{
            "modules": {
                "top": {
                    "cells": {
                        "x": {"type": "BUFF", "connections": {"A": [1]}}
                    },
                    "ports": {}
                }
            }
        }"#;
        assert!(ingest(json, "top").is_err());
    }

    #[test]
    fn missing_module_is_fatal() {
        let json = r#"{"modules": {"other": {"cells": {}, "ports": {}}}}"#;
        assert!(ingest(json, "top").is_err());
    }
}
