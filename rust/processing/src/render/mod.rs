// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Offscreen rendering of shapes, section faces and section surfaces.
//!
//! Everything is drawn with an orthographic camera fitted to the scene on a
//! white background. Opaque geometry goes through the depth buffer first,
//! translucent geometry is blended on top, outlines are drawn last.

pub mod camera;
pub mod raster;

pub use camera::{Camera, ScreenPoint, View};

use crate::error::{ProcessingError, Result};
use batchplan_section::{SectionFace, SectionSurface};
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_line_segment_mut;
use nalgebra::{Point3, Vector3};
use raster::{DepthMode, Raster};
use std::path::Path;

const BACKGROUND: [f32; 3] = [1.0, 1.0, 1.0];

/// Outline colour for section faces
const OUTLINE: Rgba<u8> = Rgba([0, 0, 0, 255]);

struct SceneMesh {
    vertices: Vec<Point3<f64>>,
    triangles: Vec<[u32; 3]>,
    rgba: [f32; 4],
    /// Lambert shading from the triangle normal
    shaded: bool,
}

/// Geometry to render, in world coordinates (metres, Z up).
#[derive(Default)]
pub struct Scene {
    meshes: Vec<SceneMesh>,
    outlines: Vec<Vec<Point3<f64>>>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty() && self.outlines.is_empty()
    }

    /// Add a tessellated solid from flat `positions` / `indices` buffers
    pub fn add_solid(&mut self, positions: &[f32], indices: &[u32], rgba: [f32; 4]) {
        let vertices = positions
            .chunks_exact(3)
            .map(|p| Point3::new(p[0] as f64, p[1] as f64, p[2] as f64))
            .collect::<Vec<_>>();
        let count = vertices.len() as u32;
        let triangles = indices
            .chunks_exact(3)
            .map(|t| [t[0], t[1], t[2]])
            .filter(|t| t.iter().all(|&i| i < count))
            .collect();
        self.meshes.push(SceneMesh {
            vertices,
            triangles,
            rgba,
            shaded: true,
        });
    }

    /// Add planar section faces at their height, with black outlines
    pub fn add_faces(&mut self, faces: &[SectionFace], rgba: [f32; 4]) -> Result<()> {
        for face in faces {
            let triangles = face.triangulate()?;
            let mut vertices = Vec::with_capacity(triangles.len() * 3);
            for tri in &triangles {
                vertices.extend(tri.iter().map(|p| Point3::new(p.x, p.y, face.height)));
            }
            let triangles = (0..triangles.len() as u32)
                .map(|i| [3 * i, 3 * i + 1, 3 * i + 2])
                .collect();
            self.meshes.push(SceneMesh {
                vertices,
                triangles,
                rgba,
                shaded: false,
            });

            for ring in std::iter::once(&face.outer).chain(&face.holes) {
                let mut outline: Vec<Point3<f64>> =
                    ring.iter().map(|p| Point3::new(p.x, p.y, face.height)).collect();
                if let Some(first) = outline.first().copied() {
                    outline.push(first);
                }
                self.outlines.push(outline);
            }
        }
        Ok(())
    }

    /// Add a section plane rectangle
    pub fn add_surface(&mut self, surface: &SectionSurface, rgba: [f32; 4]) {
        self.meshes.push(SceneMesh {
            vertices: surface.corners().to_vec(),
            triangles: vec![[0, 1, 2], [0, 2, 3]],
            rgba,
            shaded: false,
        });
    }

    fn points(&self) -> impl Iterator<Item = &Point3<f64>> {
        self.meshes
            .iter()
            .flat_map(|m| m.vertices.iter())
            .chain(self.outlines.iter().flatten())
    }

    /// Render the scene, fitted into a `width` x `height` frame
    pub fn render(&self, view: View, width: u32, height: u32) -> RgbaImage {
        let camera = Camera::fit(view, self.points(), width, height);
        let eye = camera.eye_direction();
        let mut raster = Raster::new(width, height, BACKGROUND);

        let (opaque, translucent): (Vec<&SceneMesh>, Vec<&SceneMesh>) =
            self.meshes.iter().partition(|m| m.rgba[3] >= 1.0);

        for (meshes, mode) in [(opaque, DepthMode::Opaque), (translucent, DepthMode::Translucent)] {
            for mesh in meshes {
                let projected: Vec<ScreenPoint> = mesh.vertices.iter().map(|p| camera.project(p)).collect();
                for t in &mesh.triangles {
                    let [a, b, c] = t.map(|i| i as usize);
                    let rgba = if mesh.shaded {
                        shade(mesh.rgba, &mesh.vertices[a], &mesh.vertices[b], &mesh.vertices[c], &eye)
                    } else {
                        mesh.rgba
                    };
                    raster.fill_triangle([projected[a], projected[b], projected[c]], rgba, mode);
                }
            }
        }

        let mut image = raster.into_image();
        for outline in &self.outlines {
            for pair in outline.windows(2) {
                let (a, b) = (camera.project(&pair[0]), camera.project(&pair[1]));
                draw_line_segment_mut(&mut image, (a.x, a.y), (b.x, b.y), OUTLINE);
            }
        }
        image
    }
}

/// Headlight shading: faces turned towards the viewer are brightest
fn shade(rgba: [f32; 4], a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>, eye: &Vector3<f64>) -> [f32; 4] {
    let normal = (b - a).cross(&(c - a));
    let len = normal.norm();
    let dot = if len > 1e-12 { (normal.dot(eye) / len).abs() } else { 1.0 };
    let brightness = (0.55 + 0.45 * dot) as f32;
    [rgba[0] * brightness, rgba[1] * brightness, rgba[2] * brightness, rgba[3]]
}

/// Save a rendered frame as PNG, creating parent directories
pub fn save_png(image: &RgbaImage, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ProcessingError::io(parent, e))?;
    }
    image.save(path)?;
    tracing::debug!(path = %path.display(), "Exported image");
    Ok(())
}
