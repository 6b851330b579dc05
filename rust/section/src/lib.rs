// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # BatchPlan Section
//!
//! Horizontal section cutting of tessellated building elements.
//!
//! The pipeline for one element and one cutting plane is:
//!
//! 1. [`cut`]: intersect the triangle mesh with the plane, producing raw edges
//! 2. [`wires`]: weld endpoints and connect the edges into wires
//! 3. [`face`]: turn closed wires into planar faces (nested wires become holes)
//!
//! ```rust,ignore
//! use batchplan_section::{section_faces, BoundingBox3, SectionOptions, SectionSurface};
//!
//! let bounds = BoundingBox3::from_meshes([positions.as_slice()]);
//! let surface = SectionSurface::from_bounds(1.5, &bounds, 1.0);
//! let faces = section_faces(&positions, &indices, &surface, &SectionOptions::default())?;
//! ```

pub mod bbox;
pub mod cut;
pub mod error;
pub mod face;
pub mod surface;
pub mod wires;
pub mod wkt;

pub use bbox::BoundingBox3;
pub use cut::{intersect_mesh, intersect_surface, Edge};
pub use error::{Error, Result};
pub use face::{faces_from_wires, signed_area, SectionFace};
pub use surface::{SectionSurface, DEFAULT_MARGIN};
pub use wires::{connect_edges_to_wires, Wire};
pub use wkt::faces_to_wkt;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point2, Point3};

/// Default welding tolerance for section edges (metres)
pub const DEFAULT_TOLERANCE: f64 = 1e-5;

/// Options controlling wire reconstruction
#[derive(Debug, Clone, Copy)]
pub struct SectionOptions {
    /// Distance under which edge endpoints are merged
    pub tolerance: f64,
    /// Only connect bit-identical endpoints
    pub shared_vertices: bool,
}

impl Default for SectionOptions {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            shared_vertices: false,
        }
    }
}

/// Section one mesh with a surface and return the resulting faces.
///
/// A mesh that does not reach the plane yields an empty vector.
pub fn section_faces(
    positions: &[f32],
    indices: &[u32],
    surface: &SectionSurface,
    options: &SectionOptions,
) -> Result<Vec<SectionFace>> {
    let edges = intersect_surface(surface, positions, indices)?;
    if edges.is_empty() {
        return Ok(Vec::new());
    }

    let wires = connect_edges_to_wires(&edges, options.tolerance, options.shared_vertices)?;
    faces_from_wires(&wires, surface.height)
}
