// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Surface colours assigned to products through `IfcStyledItem`.

use ifc_lite_core::{DecodedEntity, EntityDecoder, IfcType};
use rustc_hash::FxHashMap;

/// Collected styled items, keyed by the styled representation item
#[derive(Default)]
pub(crate) struct StyleIndex {
    item_colors: FxHashMap<u32, [f32; 4]>,
}

fn refs(entity: &DecodedEntity, index: usize) -> Vec<u32> {
    entity
        .get_list(index)
        .map(|list| list.iter().filter_map(|v| v.as_entity_ref()).collect())
        .unwrap_or_default()
}

impl StyleIndex {
    /// Record one `IFCSTYLEDITEM`. The first colour seen for an item wins.
    pub fn add_styled_item(&mut self, styled_item: &DecodedEntity, decoder: &mut EntityDecoder) {
        let Some(item_id) = styled_item.get_ref(0) else {
            return;
        };
        if self.item_colors.contains_key(&item_id) {
            return;
        }
        if let Some(color) = styled_item_color(styled_item, decoder) {
            self.item_colors.insert(item_id, color);
        }
    }

    pub fn len(&self) -> usize {
        self.item_colors.len()
    }

    /// Colour of a product given its `IfcProductDefinitionShape`
    pub fn product_color(&self, shape_id: u32, decoder: &mut EntityDecoder) -> Option<[f32; 4]> {
        let shape = decoder.decode_by_id(shape_id).ok()?;
        refs(&shape, 2)
            .into_iter()
            .find_map(|repr_id| self.representation_color(repr_id, decoder, true))
    }

    /// Colour of an `IfcShapeRepresentation`, following mapped items one level deep
    fn representation_color(
        &self,
        repr_id: u32,
        decoder: &mut EntityDecoder,
        follow_mapped: bool,
    ) -> Option<[f32; 4]> {
        let repr = decoder.decode_by_id(repr_id).ok()?;
        for item_id in refs(&repr, 3) {
            if let Some(color) = self.item_colors.get(&item_id) {
                return Some(*color);
            }
            if !follow_mapped {
                continue;
            }
            let Ok(item) = decoder.decode_by_id(item_id) else {
                continue;
            };
            if item.ifc_type != IfcType::IfcMappedItem {
                continue;
            }
            // IfcMappedItem.MappingSource -> IfcRepresentationMap.MappedRepresentation
            let mapped = item
                .get_ref(0)
                .and_then(|source_id| decoder.decode_by_id(source_id).ok())
                .and_then(|source| source.get_ref(1));
            if let Some(color) = mapped.and_then(|id| self.representation_color(id, decoder, false)) {
                return Some(color);
            }
        }
        None
    }
}

fn styled_item_color(styled_item: &DecodedEntity, decoder: &mut EntityDecoder) -> Option<[f32; 4]> {
    for style_id in refs(styled_item, 1) {
        let Ok(style) = decoder.decode_by_id(style_id) else {
            continue;
        };
        // IFC2x3 wraps surface styles in IfcPresentationStyleAssignment
        for inner_id in refs(&style, 0) {
            if let Some(color) = surface_style_color(inner_id, decoder) {
                return Some(color);
            }
        }
        if let Some(color) = surface_style_color(style_id, decoder) {
            return Some(color);
        }
    }
    None
}

fn surface_style_color(style_id: u32, decoder: &mut EntityDecoder) -> Option<[f32; 4]> {
    let style = decoder.decode_by_id(style_id).ok()?;
    for rendering_id in refs(&style, 2) {
        let Ok(rendering) = decoder.decode_by_id(rendering_id) else {
            continue;
        };
        let Some(colour) = rendering
            .get_ref(0)
            .and_then(|id| decoder.decode_by_id(id).ok())
        else {
            continue;
        };
        let channel = |i: usize| colour.get_float(i).unwrap_or(0.8) as f32;
        // IfcSurfaceStyleShading.Transparency
        let transparency = rendering.get_float(1).unwrap_or(0.0) as f32;
        let alpha = (1.0 - transparency).clamp(0.0, 1.0);
        return Some([channel(1), channel(2), channel(3), alpha]);
    }
    None
}
