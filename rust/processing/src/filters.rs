// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Element filters deciding which products get tessellated and sectioned.

use crate::model::ElementInfo;
use std::sync::Arc;

/// Decides whether a product takes part in the floor plans.
pub trait ElementFilter: Send + Sync {
    fn accept(&self, element: &ElementInfo) -> bool;
}

impl<F: ElementFilter + ?Sized> ElementFilter for Arc<F> {
    fn accept(&self, element: &ElementInfo) -> bool {
        (**self).accept(element)
    }
}

/// Types that never show up in a floor plan
const EXCLUDED_TYPES: &[&str] = &["IfcSite", "IfcSpace", "IfcOpeningElement", "IfcOpeningStandardCase"];

/// Products with a representation, excluding sites, spaces and openings
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFilter;

impl ElementFilter for DefaultFilter {
    fn accept(&self, element: &ElementInfo) -> bool {
        element.has_representation && !EXCLUDED_TYPES.iter().any(|t| element.is_a(t))
    }
}

/// Keeps only the listed IFC types.
#[derive(Debug, Clone, Default)]
pub struct TypeFilter {
    types: Vec<String>,
}

impl TypeFilter {
    pub fn new<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            types: types.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a comma separated list such as `"IfcWall, IfcSlab"`
    pub fn parse(list: &str) -> Self {
        Self::new(list.split(',').map(str::trim).filter(|t| !t.is_empty()))
    }

    pub fn types(&self) -> &[String] {
        &self.types
    }
}

impl ElementFilter for TypeFilter {
    fn accept(&self, element: &ElementInfo) -> bool {
        self.types.iter().any(|t| element.is_a(t))
    }
}

/// Accepts an element only if every filter in the chain does
#[derive(Default)]
pub struct FilterChain {
    filters: Vec<Box<dyn ElementFilter>>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, filter: impl ElementFilter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    pub fn push(&mut self, filter: Box<dyn ElementFilter>) {
        self.filters.push(filter);
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl ElementFilter for FilterChain {
    fn accept(&self, element: &ElementInfo) -> bool {
        self.filters.iter().all(|f| f.accept(element))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(ifc_type: &str, has_representation: bool) -> ElementInfo {
        ElementInfo::new(1, ifc_type, None, has_representation)
    }

    #[test]
    fn test_default_filter() {
        assert!(DefaultFilter.accept(&element("IfcWall", true)));
        assert!(!DefaultFilter.accept(&element("IfcWall", false)));
        assert!(!DefaultFilter.accept(&element("IfcSpace", true)));
        assert!(!DefaultFilter.accept(&element("IfcOpeningElement", true)));
        assert!(!DefaultFilter.accept(&element("IfcSite", true)));
    }

    #[test]
    fn test_type_filter_parse() {
        let filter = TypeFilter::parse(" IfcWall, ifcslab ,,");
        assert_eq!(filter.types(), ["IfcWall", "ifcslab"]);
        assert!(filter.accept(&element("IfcSlab", true)));
        assert!(!filter.accept(&element("IfcDoor", true)));
    }

    #[test]
    fn test_chain_requires_all() {
        let chain = FilterChain::new().with(DefaultFilter).with(TypeFilter::parse("IfcSpace,IfcWall"));
        assert!(chain.accept(&element("IfcWall", true)));
        assert!(!chain.accept(&element("IfcSpace", true)));
        assert!(FilterChain::new().accept(&element("IfcSpace", false)));
    }

    #[test]
    fn test_shared_filter_in_chain() {
        let shared: Arc<dyn ElementFilter> = Arc::new(DefaultFilter);
        let mut chain = FilterChain::new();
        chain.push(Box::new(shared));
        chain.push(Box::new(TypeFilter::parse("IfcSlab")));
        assert_eq!(chain.len(), 2);
        assert!(chain.accept(&element("IfcSlab", true)));
        assert!(!chain.accept(&element("IfcSlab", false)));
    }
}
