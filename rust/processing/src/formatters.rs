// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Level exporters: floor plan image, 3D image and WKT table.

use crate::error::{ProcessingError, Result};
use crate::model::ElementShape;
use crate::pipeline::{Context, LevelSection};
use crate::render::{save_png, Scene, View};
use batchplan_section::faces_to_wkt;
use serde::Serialize;
use std::path::PathBuf;

/// Writes the output of one level.
pub trait Formatter: Send + Sync {
    /// Name used on the command line
    fn name(&self) -> &str;

    /// Export `section`; its items index into `shapes`
    fn process(&self, ctx: &Context, section: &LevelSection, shapes: &[ElementShape]) -> Result<()>;
}

/// Colour to draw a shape with, or `None` to leave it out.
///
/// Without a styling the model's own colour is used and unstyled shapes
/// are skipped. The returned alpha is `1 - |1 - a|`.
pub fn element_color(ctx: &Context, shape: &ElementShape) -> Option<[f32; 4]> {
    let rgba = match &ctx.styling {
        None => {
            let style = shape.style?;
            if style.iter().any(|c| *c < 0.0) {
                return None;
            }
            style
        }
        Some(styling) => {
            let styled = styling.color(&shape.element, shape.style);
            if ctx.skip_colorless && !styled.found {
                return None;
            }
            styled.rgba
        }
    };
    let transparency = (1.0 - rgba[3]).abs();
    Some([rgba[0], rgba[1], rgba[2], (1.0 - transparency).clamp(0.0, 1.0)])
}

/// Level names become file names; keep them inside the output directory
fn output_path(ctx: &Context, level: &str, suffix: &str) -> PathBuf {
    let stem: String = level
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | '\0') { '_' } else { c })
        .collect();
    ctx.output_dir.join(format!("{stem}{suffix}"))
}

/// Top view of the section faces, `{level}_floor_plan.png`
#[derive(Debug, Clone, Copy, Default)]
pub struct FloorPlanFormatter;

impl Formatter for FloorPlanFormatter {
    fn name(&self) -> &str {
        "FloorPlanFormatter"
    }

    fn process(&self, ctx: &Context, section: &LevelSection, shapes: &[ElementShape]) -> Result<()> {
        let mut scene = Scene::new();
        for (shape, faces) in section.iter(shapes) {
            if let Some(rgba) = element_color(ctx, shape) {
                scene.add_faces(faces, rgba)?;
            }
        }
        let image = scene.render(View::Top, ctx.width, ctx.height);
        save_png(&image, &output_path(ctx, &section.level.name, "_floor_plan.png"))
    }
}

/// Iso view of the shapes cut at this level, `{level}_3D.png`
#[derive(Debug, Clone, Copy, Default)]
pub struct Floor3DFormatter;

impl Formatter for Floor3DFormatter {
    fn name(&self) -> &str {
        "Floor3DFormatter"
    }

    fn process(&self, ctx: &Context, section: &LevelSection, shapes: &[ElementShape]) -> Result<()> {
        let mut scene = Scene::new();
        for (shape, _) in section.iter(shapes) {
            if let Some(rgba) = element_color(ctx, shape) {
                scene.add_solid(&shape.positions, &shape.indices, rgba);
            }
        }
        let image = scene.render(View::Iso, ctx.width, ctx.height);
        save_png(&image, &output_path(ctx, &section.level.name, "_3D.png"))
    }
}

#[derive(Serialize)]
struct WktRow<'a> {
    #[serde(rename = "type")]
    ifc_type: &'a str,
    name: &'a str,
    geometry: String,
}

/// One `MULTIPOLYGON` per element, `{level}.csv` with `type,name,geometry`
#[derive(Debug, Clone, Copy, Default)]
pub struct FloorWktFormatter;

impl Formatter for FloorWktFormatter {
    fn name(&self) -> &str {
        "FloorWKTFormatter"
    }

    fn process(&self, ctx: &Context, section: &LevelSection, shapes: &[ElementShape]) -> Result<()> {
        let path = output_path(ctx, &section.level.name, ".csv");
        std::fs::create_dir_all(&ctx.output_dir).map_err(|e| ProcessingError::io(&ctx.output_dir, e))?;

        let mut writer = csv::WriterBuilder::new().has_headers(false).from_path(&path)?;
        // Header even when no element qualifies
        writer.write_record(["type", "name", "geometry"])?;
        let mut rows = 0usize;
        for (shape, faces) in section.iter(shapes) {
            let Some(geometry) = faces_to_wkt(faces) else {
                continue;
            };
            writer.serialize(WktRow {
                ifc_type: &shape.element.ifc_type,
                name: shape.element.name.as_deref().unwrap_or(""),
                geometry,
            })?;
            rows += 1;
        }
        writer.flush().map_err(|e| ProcessingError::io(&path, e))?;

        tracing::debug!(path = %path.display(), rows, "Exported WKT table");
        Ok(())
    }
}
