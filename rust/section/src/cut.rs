// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Plane vs. triangle mesh intersection
//!
//! Cuts an indexed triangle mesh with the horizontal plane `z = height` and
//! returns the raw, unordered intersection edges.
//!
//! A vertex counts as "above" when `z >= height`. With that convention every
//! triangle that straddles the plane produces exactly one edge and triangles
//! lying in the plane produce none, so vertices that sit exactly on the plane
//! never create duplicate or dangling edges.

use crate::error::{Error, Result};
use crate::surface::SectionSurface;
use nalgebra::Point3;
use std::cmp::Ordering;

/// Edges shorter than this are dropped
const MIN_EDGE_LENGTH: f64 = 1e-12;

/// Straight intersection edge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub start: Point3<f64>,
    pub end: Point3<f64>,
}

impl Edge {
    /// Create a new edge
    pub fn new(start: Point3<f64>, end: Point3<f64>) -> Self {
        Self { start, end }
    }

    /// Edge length
    #[inline]
    pub fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }
}

/// Lexicographic order on coordinates, used to make edge crossings symmetric
#[inline]
fn lexicographic(a: &Point3<f64>, b: &Point3<f64>) -> Ordering {
    a.x.total_cmp(&b.x)
        .then(a.y.total_cmp(&b.y))
        .then(a.z.total_cmp(&b.z))
}

/// Point where the mesh edge (a, b) crosses `z = height`.
///
/// The endpoints are put in a canonical order first so both triangles sharing
/// the edge compute a bit-identical point.
#[inline]
fn crossing(a: &Point3<f64>, b: &Point3<f64>, height: f64) -> Point3<f64> {
    let (p, q) = if lexicographic(a, b) == Ordering::Greater {
        (b, a)
    } else {
        (a, b)
    };
    let t = (height - p.z) / (q.z - p.z);
    Point3::new(p.x + t * (q.x - p.x), p.y + t * (q.y - p.y), height)
}

#[inline]
fn vertex(positions: &[f32], index: u32) -> Option<Point3<f64>> {
    let base = index as usize * 3;
    let chunk = positions.get(base..base + 3)?;
    Some(Point3::new(chunk[0] as f64, chunk[1] as f64, chunk[2] as f64))
}

/// Intersect a single triangle with the plane `z = height`
pub fn intersect_triangle(v: &[Point3<f64>; 3], height: f64) -> Option<Edge> {
    let above = [v[0].z >= height, v[1].z >= height, v[2].z >= height];
    let above_count = above.iter().filter(|a| **a).count();
    if above_count == 0 || above_count == 3 {
        return None;
    }

    let mut points: [Option<Point3<f64>>; 2] = [None, None];
    let mut found = 0;
    for (i, j) in [(0usize, 1usize), (1, 2), (2, 0)] {
        if above[i] != above[j] {
            points[found] = Some(crossing(&v[i], &v[j], height));
            found += 1;
        }
    }

    match (points[0], points[1]) {
        (Some(start), Some(end)) => {
            let edge = Edge::new(start, end);
            (edge.length() > MIN_EDGE_LENGTH).then_some(edge)
        }
        _ => None,
    }
}

/// Intersect an indexed triangle mesh with the plane `z = height`
pub fn intersect_mesh(positions: &[f32], indices: &[u32], height: f64) -> Result<Vec<Edge>> {
    if indices.len() % 3 != 0 {
        return Err(Error::InvalidMesh(format!(
            "index count {} is not a multiple of 3",
            indices.len()
        )));
    }

    let mut edges = Vec::new();
    for tri in indices.chunks_exact(3) {
        let (v0, v1, v2) = match (
            vertex(positions, tri[0]),
            vertex(positions, tri[1]),
            vertex(positions, tri[2]),
        ) {
            (Some(v0), Some(v1), Some(v2)) => (v0, v1, v2),
            _ => {
                return Err(Error::InvalidMesh(format!(
                    "triangle ({}, {}, {}) references a missing vertex",
                    tri[0], tri[1], tri[2]
                )))
            }
        };

        // Cheap rejection before the full classification
        let min_z = v0.z.min(v1.z).min(v2.z);
        let max_z = v0.z.max(v1.z).max(v2.z);
        if max_z < height || min_z >= height {
            continue;
        }

        if let Some(edge) = intersect_triangle(&[v0, v1, v2], height) {
            edges.push(edge);
        }
    }

    Ok(edges)
}

/// Intersect a mesh with a bounded section surface.
///
/// Edges whose XY extent does not overlap the surface rectangle are dropped.
pub fn intersect_surface(
    surface: &SectionSurface,
    positions: &[f32],
    indices: &[u32],
) -> Result<Vec<Edge>> {
    let mut edges = intersect_mesh(positions, indices, surface.height)?;
    edges.retain(|edge| {
        let min_x = edge.start.x.min(edge.end.x);
        let max_x = edge.start.x.max(edge.end.x);
        let min_y = edge.start.y.min(edge.end.y);
        let max_y = edge.start.y.max(edge.end.y);
        max_x >= surface.min.x
            && min_x <= surface.max.x
            && max_y >= surface.min.y
            && min_y <= surface.max.y
    });
    Ok(edges)
}
