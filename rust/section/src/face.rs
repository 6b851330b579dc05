// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Planar faces built from section wires
//!
//! The wires of one element are projected onto the section plane as rings.
//! A ring nested inside an odd number of other rings is a hole (a hollow
//! column gives one face with an opening). Rings that merely overlap belong
//! to separate bodies of the element and are unioned with the i_overlay
//! crate.
//!
//! Meshes with openings cut by clipping have no reveal faces, so their cut
//! edges form open chains. Each chain end is joined to the nearest free chain
//! end, its own start included, until the chain closes.

use crate::error::{Error, Result};
use crate::wires::Wire;
use i_overlay::core::fill_rule::FillRule;
use i_overlay::core::overlay_rule::OverlayRule;
use i_overlay::float::single::SingleFloatOverlay;
use nalgebra::{Point2, Point3};

/// Polygons smaller than this are considered degenerate (m²)
const MIN_AREA_THRESHOLD: f64 = 1e-10;

/// Cross product threshold below which a vertex is considered collinear
const COLLINEAR_EPSILON: f64 = 1e-12;

/// Planar face lying in the section plane
#[derive(Debug, Clone, PartialEq)]
pub struct SectionFace {
    /// Outer boundary (counter-clockwise)
    pub outer: Vec<Point2<f64>>,
    /// Holes (clockwise)
    pub holes: Vec<Vec<Point2<f64>>>,
    /// Elevation of the face
    pub height: f64,
}

impl SectionFace {
    /// Create a face without holes
    pub fn new(outer: Vec<Point2<f64>>, height: f64) -> Self {
        Self {
            outer: ensure_ccw(&outer),
            holes: Vec::new(),
            height,
        }
    }

    /// Net area (outer minus holes)
    pub fn area(&self) -> f64 {
        let holes: f64 = self.holes.iter().map(|h| signed_area(h).abs()).sum();
        signed_area(&self.outer).abs() - holes
    }

    /// XY bounds of the outer boundary
    pub fn bounds(&self) -> Option<(Point2<f64>, Point2<f64>)> {
        let first = self.outer.first()?;
        let (mut min, mut max) = (*first, *first);
        for p in self.outer.iter().skip(1) {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Some((min, max))
    }

    /// Outer boundary lifted back to 3D
    pub fn outer_wire(&self) -> Vec<Point3<f64>> {
        self.outer
            .iter()
            .map(|p| Point3::new(p.x, p.y, self.height))
            .collect()
    }

    /// Triangulate the face (holes included) with earcutr
    pub fn triangulate(&self) -> Result<Vec<[Point2<f64>; 3]>> {
        if self.outer.len() < 3 {
            return Err(Error::TriangulationError(
                "Face must have at least 3 vertices".to_string(),
            ));
        }

        let total = self.outer.len() + self.holes.iter().map(|h| h.len()).sum::<usize>();
        let mut all_points = Vec::with_capacity(total);
        let mut vertices = Vec::with_capacity(total * 2);
        let mut hole_indices = Vec::with_capacity(self.holes.len());

        for p in &self.outer {
            all_points.push(*p);
            vertices.push(p.x);
            vertices.push(p.y);
        }
        for hole in self.holes.iter().filter(|h| h.len() >= 3) {
            hole_indices.push(all_points.len());
            for p in hole {
                all_points.push(*p);
                vertices.push(p.x);
                vertices.push(p.y);
            }
        }

        let indices = earcutr::earcut(&vertices, &hole_indices, 2)
            .map_err(|e| Error::TriangulationError(format!("{:?}", e)))?;

        Ok(indices
            .chunks_exact(3)
            .map(|t| [all_points[t[0]], all_points[t[1]], all_points[t[2]]])
            .collect())
    }
}

/// Relative shortfall of the shared area still counted as containment
const CONTAINMENT_EPSILON: f64 = 1e-6;

/// One projected wire
struct Ring {
    path: Vec<[f64; 2]>,
    area: f64,
    min: [f64; 2],
    max: [f64; 2],
}

impl Ring {
    fn new(path: Vec<[f64; 2]>) -> Option<Self> {
        let area = path_area(&path).abs();
        if path.len() < 3 || area <= MIN_AREA_THRESHOLD {
            return None;
        }
        let mut min = path[0];
        let mut max = path[0];
        for p in &path[1..] {
            min = [min[0].min(p[0]), min[1].min(p[1])];
            max = [max[0].max(p[0]), max[1].max(p[1])];
        }
        Some(Self { path, area, min, max })
    }

    /// Whether `other` lies inside this ring
    fn contains(&self, other: &Ring) -> bool {
        if other.area >= self.area - MIN_AREA_THRESHOLD {
            return false;
        }
        let eps = 1e-9;
        if other.min[0] < self.min[0] - eps
            || other.min[1] < self.min[1] - eps
            || other.max[0] > self.max[0] + eps
            || other.max[1] > self.max[1] + eps
        {
            return false;
        }
        let subject = vec![other.path.clone()];
        let clip = vec![self.path.clone()];
        let common = subject.overlay(&clip, OverlayRule::Intersect, FillRule::NonZero);
        shapes_area(&common) >= other.area * (1.0 - CONTAINMENT_EPSILON) - MIN_AREA_THRESHOLD
    }

    /// Path wound counter-clockwise for solids and clockwise for holes
    fn oriented(mut self, hole: bool) -> Vec<[f64; 2]> {
        let ccw = path_area(&self.path) > 0.0;
        if ccw == hole {
            self.path.reverse();
        }
        self.path
    }
}

fn shapes_area(shapes: &[Vec<Vec<[f64; 2]>>]) -> f64 {
    shapes
        .iter()
        .flat_map(|shape| {
            shape
                .iter()
                .enumerate()
                .map(|(i, contour)| if i == 0 { path_area(contour).abs() } else { -path_area(contour).abs() })
        })
        .sum()
}

#[inline]
fn distance_sq(a: [f64; 2], b: [f64; 2]) -> f64 {
    (a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)
}

/// Join open chains end to end into closed paths.
///
/// The nearest free chain end wins; when the chain's own start is at least as
/// close, the chain is closed.
fn close_open_chains(wires: &[Wire]) -> Vec<Vec<[f64; 2]>> {
    let mut chains: Vec<Option<Vec<[f64; 2]>>> = wires
        .iter()
        .filter(|w| !w.closed && w.points.len() >= 2)
        .map(|w| Some(w.points.iter().map(|p| [p.x, p.y]).collect()))
        .collect();

    let mut paths = Vec::new();
    for i in 0..chains.len() {
        let Some(mut path) = chains[i].take() else {
            continue;
        };
        loop {
            let (start, end) = match (path.first(), path.last()) {
                (Some(&start), Some(&end)) => (start, end),
                _ => break,
            };

            let mut best: Option<(f64, usize, bool)> = None;
            for (j, chain) in chains.iter().enumerate() {
                let Some(chain) = chain else {
                    continue;
                };
                let (Some(&first), Some(&last)) = (chain.first(), chain.last()) else {
                    continue;
                };
                for (point, reversed) in [(first, false), (last, true)] {
                    let d = distance_sq(end, point);
                    if best.map_or(true, |(b, _, _)| d < b) {
                        best = Some((d, j, reversed));
                    }
                }
            }

            match best {
                Some((d, j, reversed)) if d < distance_sq(end, start) => {
                    if let Some(mut next) = chains[j].take() {
                        if reversed {
                            next.reverse();
                        }
                        path.extend(next);
                    }
                }
                _ => break,
            }
        }
        paths.push(path);
    }
    paths
}

/// Build faces from wires.
///
/// Open chains are closed first. Degenerate rings are skipped, rings nested
/// at odd depth become holes and overlapping rings are unioned.
pub fn faces_from_wires(wires: &[Wire], height: f64) -> Result<Vec<SectionFace>> {
    let closed = wires
        .iter()
        .filter(|w| w.closed)
        .map(|w| w.points.iter().map(|p| [p.x, p.y]).collect::<Vec<[f64; 2]>>());
    let rings: Vec<Ring> = closed
        .chain(close_open_chains(wires))
        .filter_map(Ring::new)
        .collect();

    if rings.is_empty() {
        return Ok(Vec::new());
    }

    let depths: Vec<usize> = rings
        .iter()
        .enumerate()
        .map(|(i, ring)| {
            rings
                .iter()
                .enumerate()
                .filter(|&(j, other)| i != j && other.contains(ring))
                .count()
        })
        .collect();

    let subject: Vec<Vec<[f64; 2]>> = rings
        .into_iter()
        .zip(depths)
        .map(|(ring, depth)| ring.oriented(depth % 2 == 1))
        .collect();

    let clip: Vec<Vec<[f64; 2]>> = Vec::new();
    let shapes = subject.overlay(&clip, OverlayRule::Union, FillRule::NonZero);

    let mut faces = Vec::with_capacity(shapes.len());
    for shape in shapes {
        let mut contours = shape.into_iter().map(|contour| {
            contour
                .into_iter()
                .map(|p| Point2::new(p[0], p[1]))
                .collect::<Vec<_>>()
        });

        let outer = match contours.next() {
            Some(outer) => simplify_contour(&outer),
            None => continue,
        };
        if outer.len() < 3 || signed_area(&outer).abs() <= MIN_AREA_THRESHOLD {
            continue;
        }

        let holes: Vec<Vec<Point2<f64>>> = contours
            .map(|h| simplify_contour(&h))
            .filter(|h| h.len() >= 3 && signed_area(h).abs() > MIN_AREA_THRESHOLD)
            .map(|h| ensure_cw(&h))
            .collect();

        faces.push(SectionFace {
            outer: ensure_ccw(&outer),
            holes,
            height,
        });
    }

    Ok(faces)
}

#[inline]
fn path_area(path: &[[f64; 2]]) -> f64 {
    let n = path.len();
    let mut area = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        area += path[i][0] * path[j][1] - path[j][0] * path[i][1];
    }
    area * 0.5
}

/// Signed area of a contour. Positive = counter-clockwise.
pub fn signed_area(contour: &[Point2<f64>]) -> f64 {
    if contour.len() < 3 {
        return 0.0;
    }
    let n = contour.len();
    let mut area = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        area += contour[i].x * contour[j].y - contour[j].x * contour[i].y;
    }
    area * 0.5
}

fn ensure_ccw(contour: &[Point2<f64>]) -> Vec<Point2<f64>> {
    if signed_area(contour) < 0.0 {
        contour.iter().rev().cloned().collect()
    } else {
        contour.to_vec()
    }
}

fn ensure_cw(contour: &[Point2<f64>]) -> Vec<Point2<f64>> {
    if signed_area(contour) > 0.0 {
        contour.iter().rev().cloned().collect()
    } else {
        contour.to_vec()
    }
}

/// Remove collinear vertices
fn simplify_contour(contour: &[Point2<f64>]) -> Vec<Point2<f64>> {
    if contour.len() <= 3 {
        return contour.to_vec();
    }

    let n = contour.len();
    let mut result = Vec::with_capacity(n);
    for i in 0..n {
        let prev = &contour[(i + n - 1) % n];
        let curr = &contour[i];
        let next = &contour[(i + 1) % n];
        let cross = (curr.x - prev.x) * (next.y - prev.y) - (curr.y - prev.y) * (next.x - prev.x);
        if cross.abs() > COLLINEAR_EPSILON {
            result.push(*curr);
        }
    }

    if result.len() < 3 {
        return contour.to_vec();
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn closed_wire(points: &[(f64, f64)]) -> Wire {
        Wire {
            points: points.iter().map(|&(x, y)| Point3::new(x, y, 2.0)).collect(),
            closed: true,
        }
    }

    #[test]
    fn test_single_square() {
        let wires = vec![closed_wire(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)])];
        let faces = faces_from_wires(&wires, 2.0).unwrap();

        assert_eq!(faces.len(), 1);
        assert!(signed_area(&faces[0].outer) > 0.0);
        assert_relative_eq!(faces[0].area(), 1.0, epsilon = 1e-6);
        assert_eq!(faces[0].height, 2.0);
    }

    #[test]
    fn test_nested_wire_becomes_hole() {
        let wires = vec![
            closed_wire(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]),
            closed_wire(&[(4.0, 4.0), (6.0, 4.0), (6.0, 6.0), (4.0, 6.0)]),
        ];
        let faces = faces_from_wires(&wires, 0.0).unwrap();

        assert_eq!(faces.len(), 1);
        assert_eq!(faces[0].holes.len(), 1);
        assert!(signed_area(&faces[0].holes[0]) < 0.0);
        assert_relative_eq!(faces[0].area(), 96.0, epsilon = 1e-6);
    }

    #[test]
    fn test_disjoint_wires_give_separate_faces() {
        let wires = vec![
            closed_wire(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]),
            closed_wire(&[(2.0, 0.0), (4.0, 0.0), (4.0, 1.0), (2.0, 1.0)]),
        ];
        let faces = faces_from_wires(&wires, 0.0).unwrap();
        assert_eq!(faces.len(), 2);
        let total: f64 = faces.iter().map(|f| f.area()).sum();
        assert_relative_eq!(total, 3.0, epsilon = 1e-6);
    }

    fn open_wire(points: &[(f64, f64)]) -> Wire {
        Wire {
            points: points.iter().map(|&(x, y)| Point3::new(x, y, 0.0)).collect(),
            closed: false,
        }
    }

    #[test]
    fn test_degenerate_wires_are_skipped() {
        let flat = closed_wire(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]);
        let dot = open_wire(&[(0.0, 0.0), (0.0, 0.0)]);
        assert!(faces_from_wires(&[flat, dot], 0.0).unwrap().is_empty());
    }

    #[test]
    fn test_open_chain_closes_on_itself() {
        // U-shaped cut of a wall end next to an opening without reveal faces
        let wires = vec![
            open_wire(&[(1.5, 0.0), (0.0, 0.0), (0.0, 0.2), (1.5, 0.2)]),
            open_wire(&[(2.5, 0.0), (4.0, 0.0), (4.0, 0.2), (2.5, 0.2)]),
        ];
        let faces = faces_from_wires(&wires, 0.0).unwrap();
        assert_eq!(faces.len(), 2);
        let total: f64 = faces.iter().map(|f| f.area()).sum();
        assert_relative_eq!(total, 0.6, epsilon = 1e-9);
    }

    #[test]
    fn test_open_chains_pair_across_wall_thickness() {
        // Wall piece between two openings: only the front and back lines remain
        let wires = vec![
            open_wire(&[(1.0, 0.0), (3.0, 0.0)]),
            open_wire(&[(1.0, 0.2), (3.0, 0.2)]),
        ];
        let faces = faces_from_wires(&wires, 0.0).unwrap();
        assert_eq!(faces.len(), 1);
        assert_relative_eq!(faces[0].area(), 0.4, epsilon = 1e-9);
    }

    #[test]
    fn test_overlapping_rings_are_unioned() {
        let wires = vec![
            closed_wire(&[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)]),
            closed_wire(&[(1.0, 1.0), (3.0, 1.0), (3.0, 3.0), (1.0, 3.0)]),
        ];
        let faces = faces_from_wires(&wires, 0.0).unwrap();
        assert_eq!(faces.len(), 1);
        assert!(faces[0].holes.is_empty());
        assert_relative_eq!(faces[0].area(), 7.0, epsilon = 1e-9);
    }

    #[test]
    fn test_island_inside_hole_is_solid() {
        let wires = vec![
            closed_wire(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]),
            closed_wire(&[(2.0, 2.0), (8.0, 2.0), (8.0, 8.0), (2.0, 8.0)]),
            closed_wire(&[(4.0, 4.0), (6.0, 4.0), (6.0, 6.0), (4.0, 6.0)]),
        ];
        let faces = faces_from_wires(&wires, 0.0).unwrap();
        assert_eq!(faces.len(), 2);
        let total: f64 = faces.iter().map(|f| f.area()).sum();
        assert_relative_eq!(total, 64.0 + 4.0, epsilon = 1e-9);
    }

    #[test]
    fn test_simplify_collinear() {
        let contour = vec![
            Point2::new(0.0, 0.0),
            Point2::new(0.5, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ];
        assert_eq!(simplify_contour(&contour).len(), 4);
    }

    #[test]
    fn test_triangulate_with_hole() {
        let face = SectionFace {
            outer: vec![
                Point2::new(0.0, 0.0),
                Point2::new(10.0, 0.0),
                Point2::new(10.0, 10.0),
                Point2::new(0.0, 10.0),
            ],
            holes: vec![vec![
                Point2::new(4.0, 4.0),
                Point2::new(4.0, 6.0),
                Point2::new(6.0, 6.0),
                Point2::new(6.0, 4.0),
            ]],
            height: 0.0,
        };

        let triangles = face.triangulate().unwrap();
        let area: f64 = triangles
            .iter()
            .map(|t| {
                ((t[1].x - t[0].x) * (t[2].y - t[0].y) - (t[2].x - t[0].x) * (t[1].y - t[0].y)).abs() * 0.5
            })
            .sum();
        assert_relative_eq!(area, 96.0, epsilon = 1e-6);
    }
}
