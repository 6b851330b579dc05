// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IFC model loading: product catalogue, spatial structure and tessellation.

use crate::error::{ProcessingError, Result};
use crate::filters::ElementFilter;
use crate::styles::StyleIndex;
use batchplan_section::{section_faces, BoundingBox3, SectionFace, SectionOptions, SectionSurface};
use ifc_lite_core::{build_entity_index, has_geometry_by_name, DecodedEntity, EntityDecoder, EntityIndex, EntityScanner};
use ifc_lite_geometry::{calculate_normals, GeometryRouter};
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use std::path::Path;
use std::sync::Arc;

/// Catalogue entry for one geometry-bearing product.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementInfo {
    pub id: u32,
    /// Schema type name, e.g. `IfcWall`
    pub ifc_type: String,
    pub name: Option<String>,
    pub has_representation: bool,
    start: usize,
    end: usize,
}

impl ElementInfo {
    /// Catalogue entry that is not backed by a file, for tests and custom filters
    pub fn new(id: u32, ifc_type: impl Into<String>, name: Option<String>, has_representation: bool) -> Self {
        Self {
            id,
            ifc_type: ifc_type.into(),
            name,
            has_representation,
            start: 0,
            end: 0,
        }
    }

    /// Case-insensitive type check
    pub fn is_a(&self, ifc_type: &str) -> bool {
        self.ifc_type.eq_ignore_ascii_case(ifc_type)
    }
}

/// `IfcBuildingStorey` with its elevation.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreyInfo {
    pub id: u32,
    pub name: String,
    /// Elevation as written in the file (project length unit)
    pub elevation: Option<f64>,
    /// Elevation in metres
    pub elevation_m: Option<f64>,
}

/// A tessellated product, in metres with Z up.
#[derive(Debug, Clone)]
pub struct ElementShape {
    pub element: ElementInfo,
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
    pub indices: Vec<u32>,
    /// Surface colour from the model, if any
    pub style: Option<[f32; 4]>,
}

impl ElementShape {
    pub fn bounds(&self) -> BoundingBox3 {
        let mut bbox = BoundingBox3::empty();
        bbox.expand_positions(&self.positions);
        bbox
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Faces where this shape crosses the section surface
    pub fn section(&self, surface: &SectionSurface, options: &SectionOptions) -> Result<Vec<SectionFace>> {
        Ok(section_faces(&self.positions, &self.indices, surface, options)?)
    }
}

/// Bounding box of a set of shapes
pub fn shapes_bounds<'a>(shapes: impl IntoIterator<Item = &'a ElementShape>) -> BoundingBox3 {
    BoundingBox3::from_meshes(shapes.into_iter().map(|s| s.positions.as_slice()))
}

/// A parsed IFC file.
pub struct Model {
    content: Arc<String>,
    entity_index: Arc<EntityIndex>,
    unit_scale: f64,
    elements: Vec<ElementInfo>,
    element_lookup: FxHashMap<u32, usize>,
    storeys: Vec<StoreyInfo>,
    contained: FxHashMap<u32, Vec<u32>>,
    aggregated: FxHashMap<u32, Vec<u32>>,
    void_index: Arc<FxHashMap<u32, Vec<u32>>>,
    styles: FxHashMap<u32, [f32; 4]>,
}

fn ref_list(entity: &DecodedEntity, index: usize) -> Vec<u32> {
    entity
        .get_list(index)
        .map(|list| list.iter().filter_map(|v| v.as_entity_ref()).collect())
        .unwrap_or_default()
}

impl Model {
    /// Read and parse an IFC file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| ProcessingError::io(path, e))?;
        // STEP files are often Latin-1; non UTF-8 bytes only occur inside strings
        let content = String::from_utf8_lossy(&bytes).into_owned();
        tracing::info!(path = %path.display(), size = content.len(), "Loading IFC model");
        Self::parse(content)
    }

    /// Parse IFC content held in memory
    pub fn parse(content: impl Into<String>) -> Result<Self> {
        let content = Arc::new(content.into());
        if !content.trim_start().starts_with("ISO-10303-21") {
            return Err(ProcessingError::Parse("missing ISO-10303-21 header".into()));
        }

        let entity_index = Arc::new(build_entity_index(&content));

        let mut elements = Vec::with_capacity(2000);
        let mut storeys = Vec::new();
        let mut contained: FxHashMap<u32, Vec<u32>> = FxHashMap::default();
        let mut aggregated: FxHashMap<u32, Vec<u32>> = FxHashMap::default();
        let mut void_index: FxHashMap<u32, Vec<u32>> = FxHashMap::default();
        let mut style_index = StyleIndex::default();
        let mut representations: Vec<(u32, u32)> = Vec::new();
        let mut styles = FxHashMap::default();
        let unit_scale;

        {
            let mut decoder = EntityDecoder::with_arc_index(&content, entity_index.clone());
            unit_scale = GeometryRouter::with_units(&content, &mut decoder).unit_scale();

            let mut scanner = EntityScanner::new(&content);
            while let Some((id, type_name, start, end)) = scanner.next_entity() {
                let decode = |decoder: &mut EntityDecoder| decoder.decode_at(start, end).ok();
                match type_name {
                    "IFCSTYLEDITEM" => {
                        if let Some(item) = decode(&mut decoder) {
                            style_index.add_styled_item(&item, &mut decoder);
                        }
                    }
                    "IFCRELVOIDSELEMENT" => {
                        if let Some(rel) = decode(&mut decoder) {
                            if let (Some(host), Some(opening)) = (rel.get_ref(4), rel.get_ref(5)) {
                                void_index.entry(host).or_default().push(opening);
                            }
                        }
                    }
                    "IFCRELCONTAINEDINSPATIALSTRUCTURE" => {
                        if let Some(rel) = decode(&mut decoder) {
                            if let Some(structure) = rel.get_ref(5) {
                                contained.entry(structure).or_default().extend(ref_list(&rel, 4));
                            }
                        }
                    }
                    "IFCRELAGGREGATES" | "IFCRELNESTS" => {
                        if let Some(rel) = decode(&mut decoder) {
                            if let Some(whole) = rel.get_ref(4) {
                                aggregated.entry(whole).or_default().extend(ref_list(&rel, 5));
                            }
                        }
                    }
                    "IFCBUILDINGSTOREY" => {
                        if let Some(storey) = decode(&mut decoder) {
                            let elevation = storey.get_float(9);
                            storeys.push(StoreyInfo {
                                id,
                                name: storey
                                    .get_string(2)
                                    .map(str::to_string)
                                    .unwrap_or_else(|| format!("Storey #{id}")),
                                elevation,
                                elevation_m: elevation.map(|e| e * unit_scale),
                            });
                        }
                    }
                    _ if has_geometry_by_name(type_name) => {
                        let Some(entity) = decode(&mut decoder) else {
                            tracing::warn!(id, type_name, "Failed to decode product");
                            continue;
                        };
                        let representation = entity.get_ref(6);
                        if let Some(repr_id) = representation {
                            representations.push((id, repr_id));
                        }
                        elements.push(ElementInfo {
                            id,
                            ifc_type: entity.ifc_type.name().to_string(),
                            name: entity.get_string(2).map(str::to_string),
                            has_representation: representation.is_some(),
                            start,
                            end,
                        });
                    }
                    _ => {}
                }
            }

            // Styled items may follow the products that use them
            for (element_id, repr_id) in representations {
                if let Some(color) = style_index.product_color(repr_id, &mut decoder) {
                    styles.insert(element_id, color);
                }
            }
        }

        let element_lookup = elements.iter().enumerate().map(|(i, e)| (e.id, i)).collect();

        tracing::info!(
            products = elements.len(),
            storeys = storeys.len(),
            styled_items = style_index.len(),
            styled_products = styles.len(),
            voids = void_index.len(),
            unit_scale,
            "Model scan complete"
        );

        Ok(Self {
            content,
            entity_index,
            unit_scale,
            elements,
            element_lookup,
            storeys,
            contained,
            aggregated,
            void_index: Arc::new(void_index),
            styles,
        })
    }

    /// Metres per project length unit
    pub fn unit_scale(&self) -> f64 {
        self.unit_scale
    }

    /// All geometry-bearing products in file order
    pub fn products(&self) -> &[ElementInfo] {
        &self.elements
    }

    pub fn element(&self, id: u32) -> Option<&ElementInfo> {
        self.element_lookup.get(&id).map(|&i| &self.elements[i])
    }

    /// Building storeys in file order
    pub fn storeys(&self) -> &[StoreyInfo] {
        &self.storeys
    }

    /// Surface colour of a product, if the model assigns one
    pub fn style(&self, id: u32) -> Option<[f32; 4]> {
        self.styles.get(&id).copied()
    }

    /// Ids contained in or aggregated under `id`, recursively.
    ///
    /// Covers storey -> spaces -> contained elements and element -> parts.
    pub fn decomposition(&self, id: u32) -> Vec<u32> {
        let mut result = Vec::new();
        let mut seen = FxHashSet::default();
        seen.insert(id);
        let mut stack = vec![id];

        while let Some(current) = stack.pop() {
            let children = self
                .contained
                .get(&current)
                .into_iter()
                .chain(self.aggregated.get(&current))
                .flatten();
            for &child in children {
                if seen.insert(child) {
                    result.push(child);
                    stack.push(child);
                }
            }
        }
        result
    }

    /// Tessellate every product the filter accepts
    pub fn product_shapes(&self, filter: &dyn ElementFilter) -> Vec<ElementShape> {
        self.create_shapes(self.elements.iter(), filter)
    }

    /// Tessellate the accepted products among `ids`, in file order
    pub fn shapes(&self, ids: &[u32], filter: &dyn ElementFilter) -> Vec<ElementShape> {
        let wanted: FxHashSet<u32> = ids.iter().copied().collect();
        self.create_shapes(self.elements.iter().filter(|e| wanted.contains(&e.id)), filter)
    }

    fn create_shapes<'a>(
        &'a self,
        candidates: impl Iterator<Item = &'a ElementInfo>,
        filter: &dyn ElementFilter,
    ) -> Vec<ElementShape> {
        let jobs: Vec<&ElementInfo> = candidates.filter(|e| filter.accept(e)).collect();
        let start = std::time::Instant::now();
        tracing::debug!(elements = jobs.len(), "Creating shapes");

        let shapes: Vec<ElementShape> = jobs
            .into_par_iter()
            .filter_map(|element| self.create_shape(element))
            .collect();

        tracing::debug!(
            shapes = shapes.len(),
            triangles = shapes.iter().map(ElementShape::triangle_count).sum::<usize>(),
            time_ms = start.elapsed().as_millis(),
            "Shapes created"
        );
        shapes
    }

    fn create_shape(&self, element: &ElementInfo) -> Option<ElementShape> {
        let mut decoder = EntityDecoder::with_arc_index(&self.content, self.entity_index.clone());
        let entity = match decoder.decode_at_with_id(element.id, element.start, element.end) {
            Ok(entity) => entity,
            Err(e) => {
                tracing::warn!(id = element.id, error = %e, "Failed to decode element");
                return None;
            }
        };

        let router = GeometryRouter::with_scale(self.unit_scale);
        let mut mesh = match router.process_element_with_voids(&entity, &mut decoder, &*self.void_index) {
            Ok(mesh) => mesh,
            Err(e) => {
                tracing::warn!(
                    id = element.id,
                    ifc_type = %element.ifc_type,
                    name = element.name.as_deref().unwrap_or(""),
                    error = %e,
                    "Failed to create shape"
                );
                return None;
            }
        };
        if mesh.is_empty() {
            return None;
        }
        if mesh.normals.is_empty() {
            calculate_normals(&mut mesh);
        }

        Some(ElementShape {
            element: element.clone(),
            positions: mesh.positions,
            normals: mesh.normals,
            indices: mesh.indices,
            style: self.style(element.id),
        })
    }
}
