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

//! # Geometry
//!
//! Integer 2-D and 3-D points used throughout the grid, cost cache, and
//! router. Coordinates are `i64` so that neighbor expansion can freely
//! produce negative intermediates, which callers must reject before
//! indexing into a grid (see [`Point2::in_bounds`] / [`Point3::in_bounds`]).

use std::ops::{Add, Sub};

/// A point (or extent) in the 2-D placement grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Point2 {
    /// Column.
    pub x: i64,
    /// Row.
    pub y: i64,
}

impl Point2 {
    /// Construct a new point.
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Component-wise multiplication.
    pub fn mul(self, other: Self) -> Self {
        Self::new(self.x * other.x, self.y * other.y)
    }

    /// Component-wise floor division.
    pub fn div(self, other: Self) -> Self {
        Self::new(self.x.div_euclid(other.x), self.y.div_euclid(other.y))
    }

    /// True iff both components lie within `[0, dim.x) x [0, dim.y)`.
    pub fn in_bounds(self, dim: Self) -> bool {
        self.x >= 0 && self.y >= 0 && self.x < dim.x && self.y < dim.y
    }

    /// Lift this point into 3-D at the given layer.
    pub fn to_point3(self, z: i64) -> Point3 {
        Point3::new(self.x, self.y, z)
    }
}

impl Add for Point2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// A point in the 3-D routing grid: an (x, y) tile on a given layer `z`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Point3 {
    /// Column.
    pub x: i64,
    /// Row.
    pub y: i64,
    /// Routing layer.
    pub z: i64,
}

impl Point3 {
    /// Construct a new point.
    pub const fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }

    /// True iff all components lie within `[0, dim.x) x [0, dim.y) x [0, layers)`.
    pub fn in_bounds(self, dim: Point2, layers: i64) -> bool {
        self.x >= 0
            && self.y >= 0
            && self.z >= 0
            && self.x < dim.x
            && self.y < dim.y
            && self.z < layers
    }

    /// Drop the layer component.
    pub fn to_point2(self) -> Point2 {
        Point2::new(self.x, self.y)
    }
}

impl Add for Point3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Point3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_sub_roundtrip() {
        let a = Point2::new(3, 4);
        let b = Point2::new(1, 2);
        assert_eq!((a + b) - b, a);
    }

    #[test]
    fn mul_and_div() {
        let a = Point2::new(6, 9);
        let b = Point2::new(2, 3);
        assert_eq!(a.mul(b), Point2::new(12, 27));
        assert_eq!(a.div(b), Point2::new(3, 3));
    }

    #[test]
    fn in_bounds() {
        let dim = Point2::new(4, 4);
        assert!(Point2::new(0, 0).in_bounds(dim));
        assert!(Point2::new(3, 3).in_bounds(dim));
        assert!(!Point2::new(4, 0).in_bounds(dim));
        assert!(!Point2::new(-1, 0).in_bounds(dim));
    }

    #[test]
    fn point3_bounds_and_projection() {
        let p = Point3::new(1, 2, 3);
        assert_eq!(p.to_point2(), Point2::new(1, 2));
        assert!(p.in_bounds(Point2::new(4, 4), 4));
        assert!(!p.in_bounds(Point2::new(4, 4), 3));
    }
}
