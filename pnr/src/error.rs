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

//! Module containing all error types

use thiserror::Error;

/// Main error type.
///
/// Every fatal condition in the engine funnels through one of these
/// variants. There is no silent partial success: a half-placed grid or a
/// half-routed layer stack is never handed back to the caller wrapped in
/// `Ok`.
#[derive(Debug, Error)]
pub enum Error {
    /// The netlist JSON was malformed: bad structure, unknown cell type, or
    /// a missing expected pin field.
    #[error("malformed netlist: {0}")]
    MalformedNetlist(String),
    /// Underlying JSON could not be parsed at all.
    #[error("malformed netlist json: {0}")]
    Json(#[from] serde_json::Error),
    /// I/O failure while reading the netlist file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// No perimeter tile remained for a port, or no free tile was found for
    /// a logic gate within the retry budget.
    #[error("grid exhausted: {0}")]
    GridExhausted(String),
    /// An invariant was violated mid-mutation (e.g. `mutate` was asked to
    /// move an unplaced gate). Indicates a bug, not bad input.
    #[error("corrupt grid state: {0}")]
    CorruptState(String),
    /// A net could not be routed even after exhausting the rip-up retry
    /// budget.
    #[error("routing dead end on net {net_id} after {attempts} rip-up rounds")]
    RoutingDeadEnd {
        /// The net that could not be completed.
        net_id: u32,
        /// Number of rip-up rounds attempted before giving up.
        attempts: u32,
    },
}
