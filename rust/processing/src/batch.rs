// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bounding boxes of a whole project folder.

use crate::error::{ProcessingError, Result};
use crate::filters::DefaultFilter;
use crate::model::{shapes_bounds, Model};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Layout of a project folder: `<root>/<project>/3D/IFC/<model>.ifc`
pub const PROJECT_IFC_PATTERN: &str = "*/3D/IFC/*.ifc";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobalBbox {
    pub ifc: String,
    pub xmin: f64,
    pub ymin: f64,
    pub zmin: f64,
    pub xmax: f64,
    pub ymax: f64,
    pub zmax: f64,
}

/// IFC files under `root` following the project layout, sorted
pub fn project_ifc_files(root: &Path) -> Result<Vec<PathBuf>> {
    let pattern = root.join(PROJECT_IFC_PATTERN);
    let mut paths: Vec<PathBuf> = glob::glob(&pattern.to_string_lossy())?
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!(error = %e, "Unreadable path");
                None
            }
        })
        .collect();
    paths.sort();
    Ok(paths)
}

/// Bounding box of every product in one model
pub fn model_bbox(path: &Path) -> Result<GlobalBbox> {
    let model = Model::open(path)?;
    let shapes = model.product_shapes(&DefaultFilter);
    let bbox = shapes_bounds(&shapes);
    if !bbox.is_valid() {
        return Err(ProcessingError::Geometry(format!("{} has no geometry", path.display())));
    }
    let [xmin, ymin, zmin, xmax, ymax, zmax] = bbox.with_gap(1e-6).as_array();
    Ok(GlobalBbox {
        ifc: path.display().to_string(),
        xmin,
        ymin,
        zmin,
        xmax,
        ymax,
        zmax,
    })
}

/// Write the bounding box of every project model under `root` to `output`.
///
/// Models that fail to load are logged and left out of the table.
pub fn calculate_global_bbox(root: &Path, output: &Path) -> Result<Vec<GlobalBbox>> {
    let paths = project_ifc_files(root)?;
    tracing::info!(root = %root.display(), models = paths.len(), "Calculating global bounding boxes");

    let mut rows = Vec::with_capacity(paths.len());
    for path in &paths {
        tracing::info!(path = %path.display(), "Processing");
        match model_bbox(path) {
            Ok(row) => rows.push(row),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "Skipping model"),
        }
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ProcessingError::io(parent, e))?;
    }
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_path(output)?;
    writer.write_record(["ifc", "xmin", "ymin", "zmin", "xmax", "ymax", "zmax"])?;
    for row in &rows {
        writer.serialize(row)?;
    }
    writer.flush().map_err(|e| ProcessingError::io(output, e))?;

    tracing::info!(path = %output.display(), rows = rows.len(), "Saved global bounding boxes");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_layout_discovery() {
        let dir = tempfile::tempdir().unwrap();
        for project in ["b", "a"] {
            let ifc_dir = dir.path().join(project).join("3D").join("IFC");
            std::fs::create_dir_all(&ifc_dir).unwrap();
            std::fs::write(ifc_dir.join("model.ifc"), "").unwrap();
        }
        std::fs::write(dir.path().join("stray.ifc"), "").unwrap();

        let files = project_ifc_files(dir.path()).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[0].starts_with(dir.path().join("a")));
    }

    #[test]
    fn test_unreadable_models_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let ifc_dir = dir.path().join("p").join("3D").join("IFC");
        std::fs::create_dir_all(&ifc_dir).unwrap();
        std::fs::write(ifc_dir.join("broken.ifc"), "not an ifc file").unwrap();

        let output = dir.path().join("out").join("global_bboxes.csv");
        let rows = calculate_global_bbox(dir.path(), &output).unwrap();
        assert!(rows.is_empty());
        let text = std::fs::read_to_string(&output).unwrap();
        assert_eq!(text.trim(), "ifc,xmin,ymin,zmin,xmax,ymax,zmax");
    }
}
