// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Named formatters, stylings and filters selectable from the command line.
//!
//! Applications embedding the pipeline register their own entries next to
//! the built-in ones; lookups are case-insensitive.

use crate::error::{ProcessingError, Result};
use crate::filters::{DefaultFilter, ElementFilter};
use crate::formatters::{Floor3DFormatter, FloorPlanFormatter, FloorWktFormatter, Formatter};
use crate::stylings::{AllBlack, CarbonColor, HashColor, ShapeStyle, Styling};
use rustc_hash::FxHashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Inputs some factories need
#[derive(Debug, Clone, Default)]
pub struct FactoryOptions {
    /// Material mapping table for `carbon_color`
    pub carbon_mapping: Option<PathBuf>,
}

pub type FormatterFactory = Box<dyn Fn(&FactoryOptions) -> Result<Arc<dyn Formatter>> + Send + Sync>;
pub type StylingFactory = Box<dyn Fn(&FactoryOptions) -> Result<Arc<dyn Styling>> + Send + Sync>;
pub type FilterFactory = Box<dyn Fn(&FactoryOptions) -> Result<Arc<dyn ElementFilter>> + Send + Sync>;

/// Formatters run when none are requested
pub const DEFAULT_FORMATTERS: &[&str] = &["FloorPlanFormatter", "Floor3DFormatter"];
pub const DEFAULT_FILTER: &str = "default_filter";
pub const DEFAULT_STYLING: &str = "all_black";

/// Default name of the material mapping table
pub const DEFAULT_CARBON_MAPPING: &str = "totem_mapping_materials_assigned.csv";

pub struct Registry {
    formatters: FxHashMap<String, FormatterFactory>,
    stylings: FxHashMap<String, StylingFactory>,
    filters: FxHashMap<String, FilterFactory>,
}

fn key(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

impl Registry {
    /// Registry without any entries
    pub fn empty() -> Self {
        Self {
            formatters: FxHashMap::default(),
            stylings: FxHashMap::default(),
            filters: FxHashMap::default(),
        }
    }

    pub fn register_formatter<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&FactoryOptions) -> Result<Arc<dyn Formatter>> + Send + Sync + 'static,
    {
        self.formatters.insert(key(name), Box::new(factory));
    }

    pub fn register_styling<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&FactoryOptions) -> Result<Arc<dyn Styling>> + Send + Sync + 'static,
    {
        self.stylings.insert(key(name), Box::new(factory));
    }

    pub fn register_filter<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&FactoryOptions) -> Result<Arc<dyn ElementFilter>> + Send + Sync + 'static,
    {
        self.filters.insert(key(name), Box::new(factory));
    }

    pub fn formatter(&self, name: &str, options: &FactoryOptions) -> Result<Arc<dyn Formatter>> {
        let factory = self.formatters.get(&key(name)).ok_or_else(|| unknown("formatter", name))?;
        factory(options)
    }

    pub fn styling(&self, name: &str, options: &FactoryOptions) -> Result<Arc<dyn Styling>> {
        let factory = self.stylings.get(&key(name)).ok_or_else(|| unknown("color function", name))?;
        factory(options)
    }

    pub fn filter(&self, name: &str, options: &FactoryOptions) -> Result<Arc<dyn ElementFilter>> {
        let factory = self.filters.get(&key(name)).ok_or_else(|| unknown("filter function", name))?;
        factory(options)
    }

    /// Registered formatter names, sorted
    pub fn formatter_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.formatters.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

fn unknown(kind: &'static str, name: &str) -> ProcessingError {
    ProcessingError::UnknownName {
        kind,
        name: name.to_string(),
    }
}

impl Default for Registry {
    /// Registry with every built-in entry
    fn default() -> Self {
        let mut registry = Self::empty();

        registry.register_formatter("FloorPlanFormatter", |_| Ok(Arc::new(FloorPlanFormatter)));
        registry.register_formatter("Floor3DFormatter", |_| Ok(Arc::new(Floor3DFormatter)));
        registry.register_formatter("FloorWKTFormatter", |_| Ok(Arc::new(FloorWktFormatter)));

        registry.register_styling("all_black", |_| Ok(Arc::new(AllBlack)));
        registry.register_styling("hash_color", |_| Ok(Arc::new(HashColor)));
        registry.register_styling("shape_style", |_| Ok(Arc::new(ShapeStyle)));
        registry.register_styling("carbon_color", |options| {
            let path = options
                .carbon_mapping
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CARBON_MAPPING));
            Ok(Arc::new(CarbonColor::from_csv(path)?))
        });

        registry.register_filter("default_filter", |_| Ok(Arc::new(DefaultFilter)));

        registry
    }
}
