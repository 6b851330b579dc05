// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Axis-aligned bounding boxes of tessellated shapes

use nalgebra::Point3;

/// Axis-aligned 3D bounding box in f64 precision
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox3 {
    /// Minimum corner
    pub min: Point3<f64>,
    /// Maximum corner
    pub max: Point3<f64>,
}

impl BoundingBox3 {
    /// Create a box in the invalid (empty) state
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::MAX, f64::MAX, f64::MAX),
            max: Point3::new(f64::MIN, f64::MIN, f64::MIN),
        }
    }

    /// Create a box from two corners
    pub fn new(min: Point3<f64>, max: Point3<f64>) -> Self {
        Self { min, max }
    }

    /// Check if at least one point has been added
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }

    /// Expand the box to include a point
    #[inline]
    pub fn expand(&mut self, point: &Point3<f64>) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.min.z = self.min.z.min(point.z);
        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
        self.max.z = self.max.z.max(point.z);
    }

    /// Expand the box to include flattened xyz positions
    pub fn expand_positions(&mut self, positions: &[f32]) {
        positions.chunks_exact(3).for_each(|chunk| {
            self.expand(&Point3::new(
                chunk[0] as f64,
                chunk[1] as f64,
                chunk[2] as f64,
            ));
        });
    }

    /// Merge another box into this one
    pub fn union(&mut self, other: &BoundingBox3) {
        if !other.is_valid() {
            return;
        }
        self.expand(&other.min);
        self.expand(&other.max);
    }

    /// Return a copy enlarged by `gap` on every side
    pub fn with_gap(&self, gap: f64) -> Self {
        if !self.is_valid() {
            return *self;
        }
        Self {
            min: Point3::new(self.min.x - gap, self.min.y - gap, self.min.z - gap),
            max: Point3::new(self.max.x + gap, self.max.y + gap, self.max.z + gap),
        }
    }

    /// Corners as `[xmin, ymin, zmin, xmax, ymax, zmax]`
    pub fn as_array(&self) -> [f64; 6] {
        [
            self.min.x, self.min.y, self.min.z, self.max.x, self.max.y, self.max.z,
        ]
    }

    /// Box extent along each axis
    pub fn size(&self) -> (f64, f64, f64) {
        if !self.is_valid() {
            return (0.0, 0.0, 0.0);
        }
        (
            self.max.x - self.min.x,
            self.max.y - self.min.y,
            self.max.z - self.min.z,
        )
    }

    /// Global box of several flattened position buffers
    pub fn from_meshes<'a, I>(meshes: I) -> Self
    where
        I: IntoIterator<Item = &'a [f32]>,
    {
        let mut bbox = Self::empty();
        for positions in meshes {
            bbox.expand_positions(positions);
        }
        bbox
    }
}

impl Default for BoundingBox3 {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_empty_box_is_invalid() {
        let bbox = BoundingBox3::empty();
        assert!(!bbox.is_valid());
        assert_eq!(bbox.size(), (0.0, 0.0, 0.0));
    }

    #[test]
    fn test_from_meshes() {
        let a: Vec<f32> = vec![0.0, 0.0, 0.0, 1.0, 2.0, 3.0];
        let b: Vec<f32> = vec![-1.0, 0.5, 4.0];
        let bbox = BoundingBox3::from_meshes([a.as_slice(), b.as_slice()]);

        assert!(bbox.is_valid());
        assert_eq!(bbox.as_array(), [-1.0, 0.0, 0.0, 1.0, 2.0, 4.0]);
    }

    #[test]
    fn test_with_gap() {
        let bbox = BoundingBox3::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
        let gapped = bbox.with_gap(1e-6);
        assert_relative_eq!(gapped.min.x, -1e-6);
        assert_relative_eq!(gapped.max.z, 1.0 + 1e-6);
    }

    #[test]
    fn test_union_ignores_invalid() {
        let mut bbox = BoundingBox3::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
        bbox.union(&BoundingBox3::empty());
        assert_eq!(bbox.as_array(), [0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
    }
}
