// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # BatchPlan Processing
//!
//! Floor plan extraction from IFC building models.
//!
//! A model is loaded once, its products are tessellated in parallel, and
//! every level is cut with a horizontal plane. Each level then goes through
//! the configured [`Formatter`]s (floor plan image, 3D image, WKT table).
//!
//! ```rust,ignore
//! use batchplan_processing::{levels_from_marks, process, read_level_file, Context, Model};
//!
//! let model = Model::open("house.ifc")?;
//! let levels = levels_from_marks(&read_level_file("house.csv")?);
//! let outcome = process(&model, &Context::new("output/house"), &levels)?;
//! ```

pub mod batch;
pub mod error;
pub mod filters;
pub mod formatters;
pub mod levels;
pub mod model;
pub mod naming;
pub mod pipeline;
pub mod registry;
pub mod render;
mod styles;
pub mod stylings;

pub use batch::{calculate_global_bbox, GlobalBbox};
pub use error::{ProcessingError, Result};
pub use filters::{DefaultFilter, ElementFilter, FilterChain, TypeFilter};
pub use formatters::{element_color, Floor3DFormatter, FloorPlanFormatter, FloorWktFormatter, Formatter};
pub use levels::{
    levels_from_marks, levels_from_storeys, marks_from_tops, read_level_file, slab_marks, storey_marks,
    write_level_file, Level, LevelMark,
};
pub use model::{shapes_bounds, ElementInfo, ElementShape, Model, StoreyInfo};
pub use pipeline::{find_sections, process, process_using_storeys, section_level, Context, LevelSection, Outcome, SectionItem};
pub use registry::{FactoryOptions, Registry};
pub use render::{Scene, View};
pub use stylings::{AllBlack, CarbonColor, HashColor, ShapeStyle, StyledColor, Styling};
