// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Defaults loaded from environment variables, overridden by command line flags.

use batchplan_section::DEFAULT_TOLERANCE;
use std::path::PathBuf;

/// Run configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root directory for extracted plans, one subdirectory per model.
    pub output_dir: PathBuf,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Endpoint merge distance when chaining section edges.
    pub tolerance: f64,
    /// Material mapping table for the carbon colouring.
    pub carbon_mapping: Option<PathBuf>,
    /// Number of worker threads for parallel processing.
    pub worker_threads: usize,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            output_dir: var("BATCHPLAN_OUTPUT")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("output")),
            width: var("BATCHPLAN_WIDTH")
                .and_then(|v| v.parse().ok())
                .filter(|&w| w > 0)
                .unwrap_or(2048),
            height: var("BATCHPLAN_HEIGHT")
                .and_then(|v| v.parse().ok())
                .filter(|&h| h > 0)
                .unwrap_or(2048),
            tolerance: var("BATCHPLAN_TOLERANCE")
                .and_then(|v| v.parse::<f64>().ok())
                .filter(|t| t.is_finite() && *t > 0.0)
                .unwrap_or(DEFAULT_TOLERANCE),
            carbon_mapping: var("BATCHPLAN_CARBON_MAPPING").map(PathBuf::from),
            worker_threads: var("WORKER_THREADS")
                .and_then(|v| v.parse().ok())
                .filter(|&n| n > 0)
                .unwrap_or_else(num_cpus::get),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(|_| None);
        assert_eq!(config.output_dir, PathBuf::from("output"));
        assert_eq!((config.width, config.height), (2048, 2048));
        assert_eq!(config.tolerance, DEFAULT_TOLERANCE);
        assert!(config.carbon_mapping.is_none());
        assert!(config.worker_threads > 0);
    }

    #[test]
    fn test_overrides_and_bad_values() {
        let config = Config::from_lookup(|key| match key {
            "BATCHPLAN_OUTPUT" => Some("plans".into()),
            "BATCHPLAN_WIDTH" => Some("640".into()),
            "BATCHPLAN_HEIGHT" => Some("wide".into()),
            "BATCHPLAN_TOLERANCE" => Some("-0.001".into()),
            "WORKER_THREADS" => Some("0".into()),
            _ => None,
        });
        assert_eq!(config.output_dir, PathBuf::from("plans"));
        assert_eq!(config.width, 640);
        assert_eq!(config.height, 2048);
        assert_eq!(config.tolerance, DEFAULT_TOLERANCE);
        assert!(config.worker_threads > 0);
    }

    #[test]
    fn test_tolerance_must_be_positive() {
        let tolerance = |raw: &'static str| {
            Config::from_lookup(move |key| (key == "BATCHPLAN_TOLERANCE").then(|| raw.to_string())).tolerance
        };
        assert_eq!(tolerance("0.002"), 0.002);
        assert_eq!(tolerance("0"), DEFAULT_TOLERANCE);
        assert_eq!(tolerance("inf"), DEFAULT_TOLERANCE);
    }
}
