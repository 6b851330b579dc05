// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Section levels: from building storeys, from level files, from slabs.
//!
//! A level file is a header-less CSV with one `name,elevation_mm` row per
//! floor, sorted bottom to top. Each pair of consecutive rows becomes one
//! section level halfway between the two floors.

use crate::error::{ProcessingError, Result};
use crate::filters::{DefaultFilter, FilterChain, TypeFilter};
use crate::model::{Model, StoreyInfo};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A named horizontal section plane.
#[derive(Debug, Clone, PartialEq)]
pub struct Level {
    pub name: String,
    /// Height of the section plane in metres
    pub height: f64,
}

impl Level {
    pub fn new(name: impl Into<String>, height: f64) -> Self {
        Self {
            name: name.into(),
            height,
        }
    }
}

/// One row of a level file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelMark {
    pub name: String,
    pub elevation_mm: f64,
}

impl LevelMark {
    pub fn new(name: impl Into<String>, elevation_mm: f64) -> Self {
        Self {
            name: name.into(),
            elevation_mm,
        }
    }
}

/// Storeys with a known elevation, lowest first
pub fn sorted_storeys(storeys: &[StoreyInfo]) -> Vec<&StoreyInfo> {
    let mut sorted: Vec<&StoreyInfo> = storeys
        .iter()
        .filter(|s| {
            if s.elevation_m.is_none() {
                tracing::warn!(id = s.id, name = %s.name, "Storey has no elevation, skipping");
            }
            s.elevation_m.is_some()
        })
        .collect();
    sorted.sort_by(|a, b| a.elevation_m.partial_cmp(&b.elevation_m).unwrap_or(std::cmp::Ordering::Equal));
    sorted
}

/// One level per pair of consecutive storeys, named after the lower one.
///
/// The topmost storey has nothing above it and yields no level.
pub fn levels_from_storeys(storeys: &[StoreyInfo]) -> Vec<(Level, u32)> {
    let sorted = sorted_storeys(storeys);
    sorted
        .windows(2)
        .filter_map(|pair| {
            let (lower, upper) = (pair[0], pair[1]);
            let height = (lower.elevation_m? + upper.elevation_m?) / 2.0;
            Some((Level::new(lower.name.clone(), height), lower.id))
        })
        .collect()
}

/// One level per pair of consecutive marks, halfway between them in metres
pub fn levels_from_marks(marks: &[LevelMark]) -> Vec<Level> {
    marks
        .windows(2)
        .map(|pair| Level::new(pair[0].name.clone(), (pair[0].elevation_mm + pair[1].elevation_mm) / 2000.0))
        .collect()
}

pub fn read_level_file(path: impl AsRef<Path>) -> Result<Vec<LevelMark>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ProcessingError::LevelFileMissing(path.to_path_buf()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_path(path)?;
    let marks = reader
        .deserialize()
        .collect::<std::result::Result<Vec<LevelMark>, _>>()
        .map_err(|e| ProcessingError::InvalidLevelFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    tracing::debug!(path = %path.display(), marks = marks.len(), "Read level file");
    Ok(marks)
}

pub fn write_level_file(path: impl AsRef<Path>, marks: &[LevelMark]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ProcessingError::io(parent, e))?;
    }

    let mut writer = csv::WriterBuilder::new().has_headers(false).from_path(path)?;
    for mark in marks {
        writer.serialize(mark)?;
    }
    writer.flush().map_err(|e| ProcessingError::io(path, e))?;

    tracing::info!(path = %path.display(), marks = marks.len(), "Saved level file");
    Ok(())
}

/// Level marks at the storey elevations, in millimetres
pub fn storey_marks(model: &Model) -> Vec<LevelMark> {
    sorted_storeys(model.storeys())
        .into_iter()
        .filter_map(|s| Some(LevelMark::new(s.name.clone(), (s.elevation_m? * 1000.0).round())))
        .collect()
}

/// Level marks at the distinct top elevations of all slabs.
///
/// See [`marks_from_tops`] for the merging rule.
pub fn slab_marks(model: &Model, merge_tolerance_mm: f64) -> Vec<LevelMark> {
    let filter = FilterChain::new().with(DefaultFilter).with(TypeFilter::parse("IfcSlab"));
    let shapes = model.product_shapes(&filter);

    let tops = shapes.iter().map(|s| s.bounds()).filter(|b| b.is_valid()).map(|b| b.max.z);
    let marks = marks_from_tops(tops, merge_tolerance_mm);
    tracing::debug!(slabs = shapes.len(), marks = marks.len(), "Found slab levels");
    marks
}

/// Level marks from top elevations in metres.
///
/// Tops are truncated to whole millimetres and sorted. A top closer than
/// `merge_tolerance_mm` to the previous mark is merged into it. Marks are
/// named `floor_0`, `floor_1`, ... from the bottom.
pub fn marks_from_tops(tops_m: impl IntoIterator<Item = f64>, merge_tolerance_mm: f64) -> Vec<LevelMark> {
    let mut tops: Vec<f64> = tops_m.into_iter().map(|z| (z * 1000.0).trunc()).collect();
    tops.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let mut distinct: Vec<f64> = Vec::new();
    for top in tops {
        match distinct.last() {
            Some(last) if top - last <= merge_tolerance_mm => {}
            _ => distinct.push(top),
        }
    }

    distinct
        .into_iter()
        .enumerate()
        .map(|(i, z)| LevelMark::new(format!("floor_{i}"), z))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn storey(id: u32, name: &str, elevation_m: Option<f64>) -> StoreyInfo {
        StoreyInfo {
            id,
            name: name.into(),
            elevation: elevation_m.map(|e| e * 1000.0),
            elevation_m,
        }
    }

    #[test]
    fn test_levels_from_storeys_midpoints() {
        let storeys = [
            storey(3, "Level 2", Some(6.0)),
            storey(1, "Ground", Some(0.0)),
            storey(2, "Level 1", Some(3.0)),
        ];
        let levels = levels_from_storeys(&storeys);

        assert_eq!(levels.len(), 2);
        assert_eq!(levels[0].0.name, "Ground");
        assert_eq!(levels[0].1, 1);
        assert_relative_eq!(levels[0].0.height, 1.5);
        assert_eq!(levels[1].0.name, "Level 1");
        assert_relative_eq!(levels[1].0.height, 4.5);
    }

    #[test]
    fn test_single_storey_has_no_level() {
        assert!(levels_from_storeys(&[storey(1, "Ground", Some(0.0))]).is_empty());
        assert!(levels_from_storeys(&[storey(1, "A", None), storey(2, "B", Some(3.0))]).is_empty());
    }

    #[test]
    fn test_levels_from_marks() {
        let marks = [
            LevelMark::new("floor_0", 0.0),
            LevelMark::new("floor_1", 3000.0),
            LevelMark::new("floor_2", 6200.0),
        ];
        let levels = levels_from_marks(&marks);
        assert_eq!(levels.len(), 2);
        assert_relative_eq!(levels[0].height, 1.5);
        assert_relative_eq!(levels[1].height, 4.6);
        assert_eq!(levels[1].name, "floor_1");
    }

    #[test]
    fn test_level_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Tabular").join("model.csv");
        let marks = vec![LevelMark::new("floor_0", 0.0), LevelMark::new("floor 1", 3250.5)];

        write_level_file(&path, &marks).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("floor_0,0"));
        assert_eq!(read_level_file(&path).unwrap(), marks);
    }

    #[test]
    fn test_read_level_file_integers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("levels.csv");
        std::fs::write(&path, "Ground,0\nFirst, 3000\n").unwrap();

        let marks = read_level_file(&path).unwrap();
        assert_eq!(marks[1], LevelMark::new("First", 3000.0));
    }

    #[test]
    fn test_missing_level_file() {
        let err = read_level_file("/nonexistent/levels.csv").unwrap_err();
        assert!(matches!(err, ProcessingError::LevelFileMissing(_)));
    }

    #[test]
    fn test_malformed_level_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("levels.csv");
        std::fs::write(&path, "Ground,zero\n").unwrap();
        assert!(matches!(
            read_level_file(&path).unwrap_err(),
            ProcessingError::InvalidLevelFile { .. }
        ));
    }

    #[test]
    fn test_marks_from_tops_merge_and_naming() {
        let marks = marks_from_tops([6.0, 3.2, 0.0007, 2.95], 500.0);
        let names: Vec<&str> = marks.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["floor_0", "floor_1", "floor_2"]);
        let elevations: Vec<f64> = marks.iter().map(|m| m.elevation_mm).collect();
        assert_eq!(elevations, [0.0, 2950.0, 6000.0]);

        // Tighter tolerance keeps both upper tops
        assert_eq!(marks_from_tops([3.2, 2.95], 100.0).len(), 2);
        assert!(marks_from_tops(std::iter::empty(), 500.0).is_empty());
    }
}
