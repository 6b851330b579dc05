// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for section operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while sectioning geometry
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid mesh: {0}")]
    InvalidMesh(String),

    #[error("Invalid tolerance: {0}")]
    InvalidTolerance(f64),

    #[error("Triangulation failed: {0}")]
    TriangulationError(String),
}
