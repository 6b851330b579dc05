// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Colour functions for rendered shapes and section faces.

use crate::error::{ProcessingError, Result};
use crate::model::ElementInfo;
use crate::naming::{display_name, reference};
use rustc_hash::{FxHashMap, FxHasher};
use std::hash::{Hash, Hasher};
use std::path::Path;

/// Colour picked for an element, and whether the styling knew the element
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StyledColor {
    pub rgba: [f32; 4],
    pub found: bool,
}

impl StyledColor {
    pub fn found(rgba: [f32; 4]) -> Self {
        Self { rgba, found: true }
    }

    pub fn missing(rgba: [f32; 4]) -> Self {
        Self { rgba, found: false }
    }
}

/// Picks the colour of an element.
///
/// `style` is the surface colour the model assigns to the element, if any.
pub trait Styling: Send + Sync {
    fn color(&self, element: &ElementInfo, style: Option<[f32; 4]>) -> StyledColor;
}

/// Colours from the model itself; unstyled elements are reported as missing
#[derive(Debug, Clone, Copy, Default)]
pub struct ShapeStyle;

impl Styling for ShapeStyle {
    fn color(&self, _element: &ElementInfo, style: Option<[f32; 4]>) -> StyledColor {
        match style {
            Some(rgba) => StyledColor::found(rgba),
            None => StyledColor::missing([0.0, 0.0, 0.0, 1.0]),
        }
    }
}

/// Opaque black for everything
#[derive(Debug, Clone, Copy, Default)]
pub struct AllBlack;

impl Styling for AllBlack {
    fn color(&self, _element: &ElementInfo, _style: Option<[f32; 4]>) -> StyledColor {
        StyledColor::found([0.0, 0.0, 0.0, 1.0])
    }
}

/// CSS4 named colours, sorted by name
const CSS4_COLORS: &[(&str, u32)] = &[
    ("aliceblue", 0xF0F8FF),
    ("antiquewhite", 0xFAEBD7),
    ("aqua", 0x00FFFF),
    ("aquamarine", 0x7FFFD4),
    ("azure", 0xF0FFFF),
    ("beige", 0xF5F5DC),
    ("bisque", 0xFFE4C4),
    ("black", 0x000000),
    ("blanchedalmond", 0xFFEBCD),
    ("blue", 0x0000FF),
    ("blueviolet", 0x8A2BE2),
    ("brown", 0xA52A2A),
    ("burlywood", 0xDEB887),
    ("cadetblue", 0x5F9EA0),
    ("chartreuse", 0x7FFF00),
    ("chocolate", 0xD2691E),
    ("coral", 0xFF7F50),
    ("cornflowerblue", 0x6495ED),
    ("cornsilk", 0xFFF8DC),
    ("crimson", 0xDC143C),
    ("cyan", 0x00FFFF),
    ("darkblue", 0x00008B),
    ("darkcyan", 0x008B8B),
    ("darkgoldenrod", 0xB8860B),
    ("darkgray", 0xA9A9A9),
    ("darkgreen", 0x006400),
    ("darkgrey", 0xA9A9A9),
    ("darkkhaki", 0xBDB76B),
    ("darkmagenta", 0x8B008B),
    ("darkolivegreen", 0x556B2F),
    ("darkorange", 0xFF8C00),
    ("darkorchid", 0x9932CC),
    ("darkred", 0x8B0000),
    ("darksalmon", 0xE9967A),
    ("darkseagreen", 0x8FBC8F),
    ("darkslateblue", 0x483D8B),
    ("darkslategray", 0x2F4F4F),
    ("darkslategrey", 0x2F4F4F),
    ("darkturquoise", 0x00CED1),
    ("darkviolet", 0x9400D3),
    ("deeppink", 0xFF1493),
    ("deepskyblue", 0x00BFFF),
    ("dimgray", 0x696969),
    ("dimgrey", 0x696969),
    ("dodgerblue", 0x1E90FF),
    ("firebrick", 0xB22222),
    ("floralwhite", 0xFFFAF0),
    ("forestgreen", 0x228B22),
    ("fuchsia", 0xFF00FF),
    ("gainsboro", 0xDCDCDC),
    ("ghostwhite", 0xF8F8FF),
    ("gold", 0xFFD700),
    ("goldenrod", 0xDAA520),
    ("gray", 0x808080),
    ("green", 0x008000),
    ("greenyellow", 0xADFF2F),
    ("grey", 0x808080),
    ("honeydew", 0xF0FFF0),
    ("hotpink", 0xFF69B4),
    ("indianred", 0xCD5C5C),
    ("indigo", 0x4B0082),
    ("ivory", 0xFFFFF0),
    ("khaki", 0xF0E68C),
    ("lavender", 0xE6E6FA),
    ("lavenderblush", 0xFFF0F5),
    ("lawngreen", 0x7CFC00),
    ("lemonchiffon", 0xFFFACD),
    ("lightblue", 0xADD8E6),
    ("lightcoral", 0xF08080),
    ("lightcyan", 0xE0FFFF),
    ("lightgoldenrodyellow", 0xFAFAD2),
    ("lightgray", 0xD3D3D3),
    ("lightgreen", 0x90EE90),
    ("lightgrey", 0xD3D3D3),
    ("lightpink", 0xFFB6C1),
    ("lightsalmon", 0xFFA07A),
    ("lightseagreen", 0x20B2AA),
    ("lightskyblue", 0x87CEFA),
    ("lightslategray", 0x778899),
    ("lightslategrey", 0x778899),
    ("lightsteelblue", 0xB0C4DE),
    ("lightyellow", 0xFFFFE0),
    ("lime", 0x00FF00),
    ("limegreen", 0x32CD32),
    ("linen", 0xFAF0E6),
    ("magenta", 0xFF00FF),
    ("maroon", 0x800000),
    ("mediumaquamarine", 0x66CDAA),
    ("mediumblue", 0x0000CD),
    ("mediumorchid", 0xBA55D3),
    ("mediumpurple", 0x9370DB),
    ("mediumseagreen", 0x3CB371),
    ("mediumslateblue", 0x7B68EE),
    ("mediumspringgreen", 0x00FA9A),
    ("mediumturquoise", 0x48D1CC),
    ("mediumvioletred", 0xC71585),
    ("midnightblue", 0x191970),
    ("mintcream", 0xF5FFFA),
    ("mistyrose", 0xFFE4E1),
    ("moccasin", 0xFFE4B5),
    ("navajowhite", 0xFFDEAD),
    ("navy", 0x000080),
    ("oldlace", 0xFDF5E6),
    ("olive", 0x808000),
    ("olivedrab", 0x6B8E23),
    ("orange", 0xFFA500),
    ("orangered", 0xFF4500),
    ("orchid", 0xDA70D6),
    ("palegoldenrod", 0xEEE8AA),
    ("palegreen", 0x98FB98),
    ("paleturquoise", 0xAFEEEE),
    ("palevioletred", 0xDB7093),
    ("papayawhip", 0xFFEFD5),
    ("peachpuff", 0xFFDAB9),
    ("peru", 0xCD853F),
    ("pink", 0xFFC0CB),
    ("plum", 0xDDA0DD),
    ("powderblue", 0xB0E0E6),
    ("purple", 0x800080),
    ("rebeccapurple", 0x663399),
    ("red", 0xFF0000),
    ("rosybrown", 0xBC8F8F),
    ("royalblue", 0x4169E1),
    ("saddlebrown", 0x8B4513),
    ("salmon", 0xFA8072),
    ("sandybrown", 0xF4A460),
    ("seagreen", 0x2E8B57),
    ("seashell", 0xFFF5EE),
    ("sienna", 0xA0522D),
    ("silver", 0xC0C0C0),
    ("skyblue", 0x87CEEB),
    ("slateblue", 0x6A5ACD),
    ("slategray", 0x708090),
    ("slategrey", 0x708090),
    ("snow", 0xFFFAFA),
    ("springgreen", 0x00FF7F),
    ("steelblue", 0x4682B4),
    ("tan", 0xD2B48C),
    ("teal", 0x008080),
    ("thistle", 0xD8BFD8),
    ("tomato", 0xFF6347),
    ("turquoise", 0x40E0D0),
    ("violet", 0xEE82EE),
    ("wheat", 0xF5DEB3),
    ("white", 0xFFFFFF),
    ("whitesmoke", 0xF5F5F5),
    ("yellow", 0xFFFF00),
    ("yellowgreen", 0x9ACD32),
];

fn rgb_hex(hex: u32) -> [f32; 4] {
    let channel = |shift: u32| ((hex >> shift) & 0xFF) as f32 / 255.0;
    [channel(16), channel(8), channel(0), 1.0]
}

/// Look up a CSS4 colour by name
pub fn css_color(name: &str) -> Option<[f32; 4]> {
    CSS4_COLORS
        .binary_search_by(|(n, _)| n.cmp(&name))
        .ok()
        .map(|i| rgb_hex(CSS4_COLORS[i].1))
}

/// One named colour per IFC type, stable across runs
#[derive(Debug, Clone, Copy, Default)]
pub struct HashColor;

impl HashColor {
    pub fn color_name(ifc_type: &str) -> &'static str {
        let mut hasher = FxHasher::default();
        ifc_type.hash(&mut hasher);
        let index = (hasher.finish() % CSS4_COLORS.len() as u64) as usize;
        CSS4_COLORS[index].0
    }
}

impl Styling for HashColor {
    fn color(&self, element: &ElementInfo, _style: Option<[f32; 4]>) -> StyledColor {
        let name = Self::color_name(&element.ifc_type);
        StyledColor::found(css_color(name).unwrap_or([0.0, 0.0, 0.0, 1.0]))
    }
}

/// Number of discrete steps in the score gradient
pub const GRADIENT_STEPS: usize = 1024;

const GREEN: [f32; 3] = [0.0, 0.5, 0.0];
const YELLOW: [f32; 3] = [0.75, 0.75, 0.0];
const RED: [f32; 3] = [1.0, 0.0, 0.0];

/// Green to yellow to red, sampled at [`GRADIENT_STEPS`] steps
pub fn score_gradient(score: f64) -> [f32; 4] {
    let steps = GRADIENT_STEPS - 1;
    let step = if score.is_nan() {
        0
    } else {
        ((score.clamp(0.0, 1.0) * GRADIENT_STEPS as f64) as usize).min(steps)
    };
    let t = step as f32 / steps as f32;

    let (from, to, local) = if t <= 0.5 {
        (GREEN, YELLOW, t * 2.0)
    } else {
        (YELLOW, RED, (t - 0.5) * 2.0)
    };
    let mix = |i: usize| from[i] + (to[i] - from[i]) * local;
    [mix(0), mix(1), mix(2), 1.0]
}

pub const REF_COLUMN: &str = "Product Ref";
pub const NAME_COLUMN: &str = "Product Name";
pub const SCORE_COLUMN: &str = "Element Environmental Score";
pub const SELECTED_COLUMN: &str = "Selected";

/// Score used for elements missing from the mapping
const UNKNOWN_SCORE: f64 = 0.5;

/// Colours elements by the environmental score of their assigned material.
///
/// Scores come from a material mapping table and are normalised to `0..=1`
/// before going through [`score_gradient`]. Elements are matched by display
/// name first, then by the reference code in their name, e.g. `(B.12.3)`.
#[derive(Debug, Clone, Default)]
pub struct CarbonColor {
    scores: FxHashMap<String, f64>,
    references: FxHashMap<String, f64>,
}

impl CarbonColor {
    /// Build from already normalised scores keyed by product name
    pub fn from_scores(scores: FxHashMap<String, f64>) -> Self {
        Self {
            scores,
            references: FxHashMap::default(),
        }
    }

    /// Read a material mapping table.
    ///
    /// Empty `Product Ref` and `Product Name` cells repeat the value above
    /// them. Only rows with `Selected == 1` count; the first selected row for
    /// a name or a reference wins. A `Product Ref` holding a parenthesised
    /// code is keyed by that code.
    pub fn from_csv(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ProcessingError::InvalidMapping(format!(
                "material mapping {} not found",
                path.display()
            )));
        }
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;
        let headers = reader.headers()?.clone();
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| ProcessingError::InvalidMapping(format!("missing column '{name}'")))
        };
        let ref_col = column(REF_COLUMN)?;
        let name_col = column(NAME_COLUMN)?;
        let score_col = column(SCORE_COLUMN)?;
        let selected_col = column(SELECTED_COLUMN)?;

        let mut last_ref = String::new();
        let mut last_name = String::new();
        let mut raw: Vec<(String, String, f64)> = Vec::new();

        for record in reader.records() {
            let record = record?;
            let cell = |i: usize| record.get(i).unwrap_or("");

            // Forward fill
            if !cell(ref_col).is_empty() {
                last_ref = cell(ref_col).to_string();
            }
            if !cell(name_col).is_empty() {
                last_name = cell(name_col).to_string();
            }

            let selected = cell(selected_col).parse::<f64>().map(|v| v == 1.0).unwrap_or(false);
            if !selected {
                continue;
            }
            match cell(score_col).parse::<f64>() {
                Ok(score) if score.is_finite() => raw.push((last_name.clone(), last_ref.clone(), score)),
                _ => tracing::warn!(
                    reference = %last_ref,
                    name = %last_name,
                    "Selected material has no numeric score"
                ),
            }
        }

        let min = raw.iter().map(|(_, _, s)| *s).fold(f64::INFINITY, f64::min);
        let max = raw.iter().map(|(_, _, s)| *s).fold(f64::NEG_INFINITY, f64::max);
        let range = max - min;

        let mut scores = FxHashMap::default();
        let mut references = FxHashMap::default();
        for (name, product_ref, score) in raw {
            let normalised = if range > 0.0 { (score - min) / range } else { UNKNOWN_SCORE };
            scores.entry(name).or_insert(normalised);
            if !product_ref.is_empty() {
                let key = reference(&product_ref).unwrap_or(product_ref);
                references.entry(key).or_insert(normalised);
            }
        }

        tracing::info!(
            path = %path.display(),
            materials = scores.len(),
            references = references.len(),
            "Loaded material mapping"
        );
        Ok(Self { scores, references })
    }

    /// Normalised score for an element name, if mapped
    pub fn score(&self, name: &str) -> Option<f64> {
        self.scores
            .get(&display_name(name))
            .or_else(|| reference(name).and_then(|code| self.references.get(&code)))
            .copied()
    }
}

impl Styling for CarbonColor {
    fn color(&self, element: &ElementInfo, _style: Option<[f32; 4]>) -> StyledColor {
        let raw_name = element.name.as_deref().unwrap_or("");
        match self.score(raw_name) {
            Some(score) => StyledColor::found(score_gradient(score)),
            None => {
                tracing::warn!(
                    ifc_type = %element.ifc_type,
                    name = %display_name(raw_name),
                    "No associated score"
                );
                StyledColor::missing(score_gradient(UNKNOWN_SCORE))
            }
        }
    }
}
