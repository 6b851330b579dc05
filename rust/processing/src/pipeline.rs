// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Floor plan extraction: section every level, export the overview, run
//! the formatters.

use crate::error::Result;
use crate::filters::{DefaultFilter, ElementFilter};
use crate::formatters::{element_color, Formatter};
use crate::levels::{levels_from_storeys, Level};
use crate::model::{shapes_bounds, ElementShape, Model};
use crate::render::{save_png, Scene, View};
use crate::stylings::Styling;
use batchplan_section::{BoundingBox3, SectionFace, SectionOptions, SectionSurface, DEFAULT_MARGIN};
use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;

/// Colour of the section planes in the overview
const SURFACE_COLOR: [f32; 4] = [0.5, 0.5, 0.5, 0.3];

/// File name of the overview image
pub const OVERVIEW_FILE: &str = "3D.png";

/// Settings shared by one extraction run.
#[derive(Clone)]
pub struct Context {
    /// Directory receiving every export of the current model
    pub output_dir: PathBuf,
    pub filter: Arc<dyn ElementFilter>,
    /// `None` uses the colours stored in the model
    pub styling: Option<Arc<dyn Styling>>,
    /// Skip elements the styling has no colour for
    pub skip_colorless: bool,
    pub formatters: Vec<Arc<dyn Formatter>>,
    pub width: u32,
    pub height: u32,
    pub section: SectionOptions,
}

impl Context {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            filter: Arc::new(DefaultFilter),
            styling: None,
            skip_colorless: false,
            formatters: Vec::new(),
            width: 2048,
            height: 2048,
            section: SectionOptions::default(),
        }
    }
}

/// Faces of one shape at one level
#[derive(Debug, Clone)]
pub struct SectionItem {
    /// Index into the shapes the level was sectioned from
    pub shape: usize,
    pub faces: Vec<SectionFace>,
}

/// All shapes crossing one level.
#[derive(Debug, Clone)]
pub struct LevelSection {
    pub level: Level,
    /// Section plane fitted to the sectioned shapes
    pub surface: SectionSurface,
    pub items: Vec<SectionItem>,
}

impl LevelSection {
    /// Sectioned shapes paired with their faces
    pub fn iter<'a>(
        &'a self,
        shapes: &'a [ElementShape],
    ) -> impl Iterator<Item = (&'a ElementShape, &'a [SectionFace])> + 'a {
        self.items
            .iter()
            .filter_map(move |item| Some((shapes.get(item.shape)?, item.faces.as_slice())))
    }
}

/// Summary of one processed model
#[derive(Debug, Clone, Default)]
pub struct Outcome {
    pub shapes: usize,
    /// Names of the levels that produced output
    pub levels: Vec<String>,
}

/// Section `shapes` at one level.
///
/// Returns `None` when no shape crosses the plane.
pub fn section_level(
    shapes: &[ElementShape],
    level: &Level,
    global_bbox: &BoundingBox3,
    options: &SectionOptions,
) -> Option<LevelSection> {
    let surface = SectionSurface::from_bounds(level.height, global_bbox, DEFAULT_MARGIN);

    let items: Vec<SectionItem> = shapes
        .par_iter()
        .enumerate()
        .filter_map(|(index, shape)| match shape.section(&surface, options) {
            Ok(faces) if !faces.is_empty() => Some(SectionItem { shape: index, faces }),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(
                    id = shape.element.id,
                    level = %level.name,
                    error = %e,
                    "Failed to section shape"
                );
                None
            }
        })
        .collect();

    if items.is_empty() {
        tracing::debug!(level = %level.name, height = level.height, "No section at level");
        return None;
    }

    // Tighter plane around what was actually cut
    let bbox = shapes_bounds(items.iter().map(|item| &shapes[item.shape]));
    let surface = SectionSurface::from_bounds(level.height, &bbox, DEFAULT_MARGIN);

    tracing::debug!(level = %level.name, height = level.height, shapes = items.len(), "Sectioned level");
    Some(LevelSection {
        level: level.clone(),
        surface,
        items,
    })
}

/// Section `shapes` at every level, dropping levels with nothing to show
pub fn find_sections(
    shapes: &[ElementShape],
    levels: &[Level],
    global_bbox: &BoundingBox3,
    options: &SectionOptions,
) -> Vec<LevelSection> {
    levels
        .iter()
        .filter_map(|level| section_level(shapes, level, global_bbox, options))
        .collect()
}

fn export_overview<'a>(
    ctx: &Context,
    shapes: &[ElementShape],
    surfaces: impl Iterator<Item = &'a SectionSurface>,
) -> Result<()> {
    let mut scene = Scene::new();
    for shape in shapes {
        if let Some(rgba) = element_color(ctx, shape) {
            scene.add_solid(&shape.positions, &shape.indices, rgba);
        }
    }
    for surface in surfaces {
        scene.add_surface(surface, SURFACE_COLOR);
    }
    let image = scene.render(View::Iso, ctx.width, ctx.height);
    save_png(&image, &ctx.output_dir.join(OVERVIEW_FILE))
}

fn run_formatters(ctx: &Context, section: &LevelSection, shapes: &[ElementShape]) -> Result<()> {
    for formatter in &ctx.formatters {
        tracing::debug!(formatter = formatter.name(), level = %section.level.name, "Running formatter");
        formatter.process(ctx, section, shapes)?;
    }
    Ok(())
}

/// Section all filtered products at the given levels
pub fn process(model: &Model, ctx: &Context, levels: &[Level]) -> Result<Outcome> {
    tracing::info!("Loading elements and shapes");
    let shapes = model.product_shapes(ctx.filter.as_ref());
    tracing::info!(elements = shapes.len(), "Shapes loaded");
    if shapes.is_empty() {
        tracing::warn!("No shapes to section");
        return Ok(Outcome::default());
    }

    let global_bbox = shapes_bounds(&shapes);
    let sections = find_sections(&shapes, levels, &global_bbox, &ctx.section);
    tracing::info!(levels = levels.len(), sections = sections.len(), "Sections found");

    export_overview(ctx, &shapes, sections.iter().map(|s| &s.surface))?;
    for section in &sections {
        run_formatters(ctx, section, &shapes)?;
    }

    Ok(Outcome {
        shapes: shapes.len(),
        levels: sections.into_iter().map(|s| s.level.name).collect(),
    })
}

/// Section each storey's own elements halfway up to the next storey
pub fn process_using_storeys(model: &Model, ctx: &Context) -> Result<Outcome> {
    tracing::info!("Loading and filtering elements and shapes");
    let shapes = model.product_shapes(ctx.filter.as_ref());
    tracing::info!(elements = shapes.len(), "Shapes loaded");
    if shapes.is_empty() {
        tracing::warn!("No shapes to section");
        return Ok(Outcome::default());
    }
    let global_bbox = shapes_bounds(&shapes);

    let mut sections: Vec<(LevelSection, Vec<ElementShape>)> = Vec::new();
    for (level, storey_id) in levels_from_storeys(model.storeys()) {
        tracing::info!(storey = %level.name, height = level.height, "Sectioning storey");
        let ids = model.decomposition(storey_id);
        let storey_shapes = model.shapes(&ids, ctx.filter.as_ref());
        if let Some(section) = section_level(&storey_shapes, &level, &global_bbox, &ctx.section) {
            sections.push((section, storey_shapes));
        }
    }

    export_overview(ctx, &shapes, sections.iter().map(|(s, _)| &s.surface))?;
    for (section, storey_shapes) in &sections {
        run_formatters(ctx, section, storey_shapes)?;
    }

    Ok(Outcome {
        shapes: shapes.len(),
        levels: sections.into_iter().map(|(s, _)| s.level.name).collect(),
    })
}
