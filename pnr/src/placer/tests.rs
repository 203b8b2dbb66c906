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

use super::*;
use crate::geometry::Point2;
use crate::grid::GatesGrid;
use crate::ingest::ingest;
use crate::netlist::Netlist;
use rand::SeedableRng;

const RING_JSON: &str = r#"{
    "modules": { "top": {
        "cells": {
            "n1": {"type": "NOT", "connections": {"A": [1], "Y": [2]}},
            "n2": {"type": "NOT", "connections": {"A": [2], "Y": [3]}},
            "n3": {"type": "NOT", "connections": {"A": [3], "Y": [4]}},
            "b1": {"type": "BUFF", "connections": {"A": [4], "Y": [5]}}
        },
        "ports": {
            "i": {"direction": "input", "bits": [1]},
            "o": {"direction": "output", "bits": [5]}
        }
    }}
}"#;

fn netlist() -> Netlist {
    ingest(RING_JSON, "top").unwrap()
}

#[test]
fn random_descent_terminates_and_never_increases_current_cost() {
    let netlist = netlist();
    let mut rng = rand::rngs::StdRng::seed_from_u64(3);
    let mut grid = GatesGrid::new(Point2::new(8, 8), &netlist, &mut rng).unwrap();
    let mut placer = RandomDescent::new(&grid, 500);

    let mut last_cost = placer.telemetry().current_cost;
    loop {
        let done = placer.step(&mut grid, &mut rng).unwrap();
        assert!(placer.telemetry().current_cost <= last_cost + 1e-9);
        last_cost = placer.telemetry().current_cost;
        if done {
            break;
        }
    }
    assert_eq!(placer.telemetry().steps, 500);
}

#[test]
fn annealing_best_cost_is_monotone_non_increasing() {
    let netlist = netlist();
    let mut rng = rand::rngs::StdRng::seed_from_u64(11);
    let mut grid = GatesGrid::new(Point2::new(8, 8), &netlist, &mut rng).unwrap();
    let initial_cost = grid.cost();
    let mut placer = SimulatedAnnealing::new(&grid, 10.0, 0.0, 5000);

    let mut last_best = placer.telemetry().best_cost;
    assert!(last_best <= initial_cost + 1e-9);
    loop {
        let done = placer.step(&mut grid, &mut rng).unwrap();
        assert!(placer.telemetry().best_cost <= last_best + 1e-9);
        last_best = placer.telemetry().best_cost;
        if done {
            break;
        }
    }
}

#[test]
fn annealing_terminates_on_step_budget_even_with_high_floor() {
    let netlist = netlist();
    let mut rng = rand::rngs::StdRng::seed_from_u64(5);
    let mut grid = GatesGrid::new(Point2::new(8, 8), &netlist, &mut rng).unwrap();
    // min_temp above init_temp means the cooling schedule never drops below
    // the floor; only the step budget can end the run.
    let mut placer = SimulatedAnnealing::new(&grid, 1.0, 1.0, 50);
    let mut steps = 0;
    loop {
        if placer.step(&mut grid, &mut rng).unwrap() {
            break;
        }
        steps += 1;
        assert!(steps <= 50);
    }
    assert_eq!(placer.telemetry().steps, 50);
}
