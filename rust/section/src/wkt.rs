// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Well-known text output for section faces

use crate::face::SectionFace;
use nalgebra::Point2;
use std::fmt::Write;

fn write_ring(out: &mut String, ring: &[Point2<f64>]) {
    out.push('(');
    for (i, p) in ring.iter().chain(ring.first()).enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let _ = write!(out, "{} {}", p.x, p.y);
    }
    out.push(')');
}

/// Encode faces as a `MULTIPOLYGON` in WKT.
///
/// Rings are closed explicitly. Returns `None` when no face has a usable
/// outer boundary.
pub fn faces_to_wkt(faces: &[SectionFace]) -> Option<String> {
    let polygons: Vec<&SectionFace> = faces.iter().filter(|f| f.outer.len() >= 3).collect();
    if polygons.is_empty() {
        return None;
    }

    let mut out = String::from("MULTIPOLYGON (");
    for (i, face) in polygons.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push('(');
        write_ring(&mut out, &face.outer);
        for hole in face.holes.iter().filter(|h| h.len() >= 3) {
            out.push_str(", ");
            write_ring(&mut out, hole);
        }
        out.push(')');
    }
    out.push(')');
    Some(out)
}
