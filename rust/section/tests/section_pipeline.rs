// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// End-to-end sectioning of small closed meshes

use approx::assert_relative_eq;
use batchplan_section::{
    faces_to_wkt, section_faces, BoundingBox3, Point2, SectionOptions, SectionSurface,
};

/// Axis-aligned box with flat-shaded faces (4 unshared vertices per side)
fn box_mesh(min: [f32; 3], max: [f32; 3], positions: &mut Vec<f32>, indices: &mut Vec<u32>) {
    let [x0, y0, z0] = min;
    let [x1, y1, z1] = max;
    let quads = [
        [[x0, y0, z0], [x0, y1, z0], [x1, y1, z0], [x1, y0, z0]], // bottom
        [[x0, y0, z1], [x1, y0, z1], [x1, y1, z1], [x0, y1, z1]], // top
        [[x0, y0, z0], [x1, y0, z0], [x1, y0, z1], [x0, y0, z1]], // front
        [[x1, y1, z0], [x0, y1, z0], [x0, y1, z1], [x1, y1, z1]], // back
        [[x0, y1, z0], [x0, y0, z0], [x0, y0, z1], [x0, y1, z1]], // left
        [[x1, y0, z0], [x1, y1, z0], [x1, y1, z1], [x1, y0, z1]], // right
    ];
    for quad in quads {
        let base = (positions.len() / 3) as u32;
        for v in quad {
            positions.extend_from_slice(&v);
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
}

fn surface_for(positions: &[f32], height: f64) -> SectionSurface {
    let bounds = BoundingBox3::from_meshes([positions]);
    SectionSurface::from_bounds(height, &bounds, 1.0)
}

#[test]
fn test_box_section_is_rectangle() {
    let (mut positions, mut indices) = (Vec::new(), Vec::new());
    box_mesh([0.0, 0.0, 0.0], [4.0, 0.25, 2.8], &mut positions, &mut indices);

    let surface = surface_for(&positions, 1.5);
    let faces = section_faces(&positions, &indices, &surface, &SectionOptions::default()).unwrap();

    assert_eq!(faces.len(), 1);
    assert!(faces[0].holes.is_empty());
    assert_relative_eq!(faces[0].area(), 1.0, epsilon = 1e-4);
    assert_relative_eq!(faces[0].height, 1.5);
}

#[test]
fn test_shared_vertex_mode_on_flat_shaded_box() {
    let (mut positions, mut indices) = (Vec::new(), Vec::new());
    box_mesh([0.0, 0.0, 0.0], [1.0, 1.0, 1.0], &mut positions, &mut indices);

    let options = SectionOptions {
        tolerance: 1e-5,
        shared_vertices: true,
    };
    let surface = surface_for(&positions, 0.5);
    let faces = section_faces(&positions, &indices, &surface, &options).unwrap();

    assert_eq!(faces.len(), 1);
    assert_relative_eq!(faces[0].area(), 1.0, epsilon = 1e-4);
}

#[test]
fn test_plane_outside_mesh_gives_no_faces() {
    let (mut positions, mut indices) = (Vec::new(), Vec::new());
    box_mesh([0.0, 0.0, 0.0], [1.0, 1.0, 1.0], &mut positions, &mut indices);

    let surface = surface_for(&positions, 5.0);
    let faces = section_faces(&positions, &indices, &surface, &SectionOptions::default()).unwrap();
    assert!(faces.is_empty());
}

#[test]
fn test_plane_on_top_face_gives_no_faces() {
    let (mut positions, mut indices) = (Vec::new(), Vec::new());
    box_mesh([0.0, 0.0, 0.0], [1.0, 1.0, 1.0], &mut positions, &mut indices);

    // Top face sits exactly in the plane and counts as "above"
    let surface = surface_for(&positions, 1.0);
    let faces = section_faces(&positions, &indices, &surface, &SectionOptions::default()).unwrap();
    assert!(faces.is_empty());
}

#[test]
fn test_two_boxes_in_one_element() {
    let (mut positions, mut indices) = (Vec::new(), Vec::new());
    box_mesh([0.0, 0.0, 0.0], [1.0, 1.0, 3.0], &mut positions, &mut indices);
    box_mesh([2.0, 0.0, 0.0], [4.0, 1.0, 3.0], &mut positions, &mut indices);

    let surface = surface_for(&positions, 1.0);
    let faces = section_faces(&positions, &indices, &surface, &SectionOptions::default()).unwrap();

    assert_eq!(faces.len(), 2);
    let total: f64 = faces.iter().map(|f| f.area()).sum();
    assert_relative_eq!(total, 3.0, epsilon = 1e-4);

    let wkt = faces_to_wkt(&faces).unwrap();
    assert!(wkt.starts_with("MULTIPOLYGON ((("));
}

#[test]
fn test_hollow_tube_section_has_hole() {
    // Square tube built from four wall boxes around a 2x2 void
    let (mut positions, mut indices) = (Vec::new(), Vec::new());
    box_mesh([0.0, 0.0, 0.0], [4.0, 1.0, 2.0], &mut positions, &mut indices);
    box_mesh([0.0, 3.0, 0.0], [4.0, 4.0, 2.0], &mut positions, &mut indices);
    box_mesh([0.0, 1.0, 0.0], [1.0, 3.0, 2.0], &mut positions, &mut indices);
    box_mesh([3.0, 1.0, 0.0], [4.0, 3.0, 2.0], &mut positions, &mut indices);

    let surface = surface_for(&positions, 1.0);
    let faces = section_faces(&positions, &indices, &surface, &SectionOptions::default()).unwrap();

    // Touching boxes give four adjacent rectangles; the union is the ring
    let total: f64 = faces.iter().map(|f| f.area()).sum();
    assert_relative_eq!(total, 12.0, epsilon = 1e-4);

    let (min, max) = faces
        .iter()
        .filter_map(|f| f.bounds())
        .fold((Point2::new(f64::MAX, f64::MAX), Point2::new(f64::MIN, f64::MIN)), |(lo, hi), (a, b)| {
            (Point2::new(lo.x.min(a.x), lo.y.min(a.y)), Point2::new(hi.x.max(b.x), hi.y.max(b.y)))
        });
    assert_relative_eq!(min.x, 0.0, epsilon = 1e-4);
    assert_relative_eq!(max.y, 4.0, epsilon = 1e-4);
}

fn push_quad(quad: [[f32; 3]; 4], positions: &mut Vec<f32>, indices: &mut Vec<u32>) {
    let base = (positions.len() / 3) as u32;
    for v in quad {
        positions.extend_from_slice(&v);
    }
    indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
}

/// 4 x 0.2 x 3 m wall with a 1.0 x 2.1 m door at x = 1.5..2.5, opening cut
/// by clipping: front, back, ends, top and bottom, but no jamb or head faces
fn wall_with_door() -> (Vec<f32>, Vec<u32>) {
    let (mut positions, mut indices) = (Vec::new(), Vec::new());
    let (x0, x1, d0, d1) = (0.0, 4.0, 1.5, 2.5);
    let (t, h, door_h) = (0.2, 3.0, 2.1);

    for y in [0.0, t] {
        push_quad([[x0, y, 0.0], [d0, y, 0.0], [d0, y, h], [x0, y, h]], &mut positions, &mut indices);
        push_quad([[d1, y, 0.0], [x1, y, 0.0], [x1, y, h], [d1, y, h]], &mut positions, &mut indices);
        push_quad([[d0, y, door_h], [d1, y, door_h], [d1, y, h], [d0, y, h]], &mut positions, &mut indices);
    }
    for x in [x0, x1] {
        push_quad([[x, 0.0, 0.0], [x, t, 0.0], [x, t, h], [x, 0.0, h]], &mut positions, &mut indices);
    }
    push_quad([[x0, 0.0, h], [x1, 0.0, h], [x1, t, h], [x0, t, h]], &mut positions, &mut indices);
    push_quad([[x0, 0.0, 0.0], [d0, 0.0, 0.0], [d0, t, 0.0], [x0, t, 0.0]], &mut positions, &mut indices);
    push_quad([[d1, 0.0, 0.0], [x1, 0.0, 0.0], [x1, t, 0.0], [d1, t, 0.0]], &mut positions, &mut indices);
    (positions, indices)
}

#[test]
fn test_wall_with_clipped_door_keeps_its_section() {
    let (positions, indices) = wall_with_door();

    let surface = surface_for(&positions, 1.5);
    let faces = section_faces(&positions, &indices, &surface, &SectionOptions::default()).unwrap();

    assert_eq!(faces.len(), 2);
    let total: f64 = faces.iter().map(|f| f.area()).sum();
    assert_relative_eq!(total, 0.6, epsilon = 1e-4);

    // Above the door head the wall is whole again
    let surface = surface_for(&positions, 2.5);
    let faces = section_faces(&positions, &indices, &surface, &SectionOptions::default()).unwrap();
    assert_eq!(faces.len(), 1);
    assert_relative_eq!(faces[0].area(), 0.8, epsilon = 1e-4);
}

#[test]
fn test_overlapping_bodies_of_one_element_are_unioned() {
    let (mut positions, mut indices) = (Vec::new(), Vec::new());
    box_mesh([0.0, 0.0, 0.0], [2.0, 2.0, 3.0], &mut positions, &mut indices);
    box_mesh([1.0, 1.0, 0.0], [3.0, 3.0, 3.0], &mut positions, &mut indices);

    let surface = surface_for(&positions, 1.5);
    let faces = section_faces(&positions, &indices, &surface, &SectionOptions::default()).unwrap();

    assert_eq!(faces.len(), 1);
    assert!(faces[0].holes.is_empty());
    assert_relative_eq!(faces[0].area(), 7.0, epsilon = 1e-4);
}
