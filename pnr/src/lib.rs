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

#![deny(missing_docs)]

//! # pnr: a 2-D digital-circuit place-and-route engine
//!
//! Given a synthesized gate-level netlist, `pnr` assigns every gate a tile
//! on a square grid, iteratively improves that placement against an
//! incremental half-perimeter wirelength cost, and then wires every net
//! together across one or more routing layers with a Lee-style maze router.
//!
//! ## Structure
//!
//! - **[`geometry`]**: integer 2-D/3-D points shared by every other module.
//! - **[`netlist`]**: the gate/net graph, plus NOR-input equivalence
//!   folding.
//! - **[`ingest`]**: builds a [`netlist::Netlist`] from synthesized JSON.
//! - **[`grid`]**: [`grid::GatesGrid`], the placement surface: occupancy,
//!   per-gate positions, and the incremental [`grid::CostCache`].
//! - **[`placer`]**: [`placer::Placer`], the capability interface for
//!   placement optimizers, with [`placer::RandomDescent`] and
//!   [`placer::SimulatedAnnealing`] implementations.
//! - **[`router`]**: [`router::Router`], the multi-layer maze router.
//! - **[`view`]**: read-only adapters over a grid for presentation layers.
//!
//! ## Usage
//!
//! ```no_run
//! use pnr::ingest::ingest;
//! use pnr::geometry::Point2;
//! use pnr::grid::GatesGrid;
//! use pnr::placer::{Placer, RandomDescent};
//! use pnr::router::Router;
//! use rand::SeedableRng;
//!
//! # fn main() -> Result<(), pnr::Error> {
//! let json = std::fs::read_to_string("design.json")?;
//! let netlist = ingest(&json, "top")?;
//!
//! let mut rng = rand::rngs::StdRng::seed_from_u64(0);
//! let mut grid = GatesGrid::new(Point2::new(32, 32), &netlist, &mut rng)?;
//!
//! let mut placer = RandomDescent::new(&grid, 10_000);
//! while !placer.step(&mut grid, &mut rng)? {}
//!
//! let router = Router::new(grid.dim(), 2);
//! let routes = router.route(&netlist, &grid)?;
//! # let _ = routes;
//! # Ok(())
//! # }
//! ```

mod error;

pub mod geometry;
pub mod grid;
pub mod ingest;
pub mod netlist;
pub mod placer;
pub mod router;
pub mod view;

pub use error::Error;
