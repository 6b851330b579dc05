// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the processing pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for processing operations
pub type Result<T> = std::result::Result<T, ProcessingError>;

/// Processing error types.
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IFC parse error: {0}")]
    Parse(String),

    #[error("Geometry error: {0}")]
    Geometry(String),

    #[error("Section error: {0}")]
    Section(#[from] batchplan_section::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Level file doesn't exist: {0}")]
    LevelFileMissing(PathBuf),

    #[error("Invalid level file {path}: {reason}")]
    InvalidLevelFile { path: PathBuf, reason: String },

    #[error("Unknown {kind}: {name}")]
    UnknownName { kind: &'static str, name: String },

    #[error("Invalid material mapping: {0}")]
    InvalidMapping(String),
}

impl ProcessingError {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ProcessingError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<ifc_lite_core::Error> for ProcessingError {
    fn from(err: ifc_lite_core::Error) -> Self {
        ProcessingError::Parse(err.to_string())
    }
}

impl From<ifc_lite_geometry::Error> for ProcessingError {
    fn from(err: ifc_lite_geometry::Error) -> Self {
        ProcessingError::Geometry(err.to_string())
    }
}
