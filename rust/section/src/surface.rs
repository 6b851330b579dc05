// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bounded horizontal section surface

use crate::bbox::BoundingBox3;
use nalgebra::{Point2, Point3};

/// Default margin added around the model footprint (metres)
pub const DEFAULT_MARGIN: f64 = 1.0;

/// Rectangular face lying in the plane `z = height`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionSurface {
    /// Elevation of the cutting plane
    pub height: f64,
    /// Minimum XY corner
    pub min: Point2<f64>,
    /// Maximum XY corner
    pub max: Point2<f64>,
}

impl SectionSurface {
    /// Create a surface from explicit XY extents
    pub fn new(height: f64, min: Point2<f64>, max: Point2<f64>) -> Self {
        Self { height, min, max }
    }

    /// Surface covering the XY footprint of `bounds`, enlarged by `margin`
    pub fn from_bounds(height: f64, bounds: &BoundingBox3, margin: f64) -> Self {
        Self {
            height,
            min: Point2::new(bounds.min.x - margin, bounds.min.y - margin),
            max: Point2::new(bounds.max.x + margin, bounds.max.y + margin),
        }
    }

    /// The four corners in counter-clockwise order
    pub fn corners(&self) -> [Point3<f64>; 4] {
        [
            Point3::new(self.min.x, self.min.y, self.height),
            Point3::new(self.max.x, self.min.y, self.height),
            Point3::new(self.max.x, self.max.y, self.height),
            Point3::new(self.min.x, self.max.y, self.height),
        ]
    }

    /// Whether the XY projection of `point` lies on the surface
    #[inline]
    pub fn contains_xy(&self, x: f64, y: f64) -> bool {
        x >= self.min.x && x <= self.max.x && y >= self.min.y && y <= self.max.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bounds_adds_margin() {
        let bounds = BoundingBox3::new(Point3::new(0.0, 0.0, 0.0), Point3::new(10.0, 5.0, 3.0));
        let surface = SectionSurface::from_bounds(1.5, &bounds, DEFAULT_MARGIN);

        assert_eq!(surface.min, Point2::new(-1.0, -1.0));
        assert_eq!(surface.max, Point2::new(11.0, 6.0));
        assert!(surface.corners().iter().all(|c| c.z == 1.5));
    }

    #[test]
    fn test_contains_xy() {
        let surface = SectionSurface::new(0.0, Point2::new(0.0, 0.0), Point2::new(1.0, 1.0));
        assert!(surface.contains_xy(0.5, 1.0));
        assert!(!surface.contains_xy(1.5, 0.5));
    }
}
