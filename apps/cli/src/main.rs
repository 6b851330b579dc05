// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! BatchPlan - floor plans from IFC building models.
//!
//! # Commands
//!
//! - `extract <glob>` - Section every matching model and export its floor plans
//! - `levels <ifc>` - Write the level file `extract` reads next to a model
//! - `bbox <root>` - Tabulate the bounding box of every project model
//!
//! Defaults come from `BATCHPLAN_*` environment variables, see [`config::Config`].

use anyhow::{Context, Result};
use batchplan_processing::Registry;
use std::process::ExitCode;

mod args;
mod commands;
mod config;

use args::Command;
use config::Config;

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info,batchplan=debug".into()))
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "BatchPlan failed");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let command = match args::parse(std::env::args().skip(1)) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{}", args::USAGE);
            return Err(e);
        }
    };
    if command == Command::Help {
        println!("{}", args::USAGE);
        return Ok(());
    }

    let config = Config::from_env();
    tracing::debug!(
        output = %config.output_dir.display(),
        width = config.width,
        height = config.height,
        worker_threads = config.worker_threads,
        "Configuration loaded"
    );

    // Initialize rayon thread pool
    rayon::ThreadPoolBuilder::new()
        .num_threads(config.worker_threads)
        .build_global()
        .context("Failed to initialize thread pool")?;

    match command {
        Command::Extract(args) => commands::extract(&args, &config, &Registry::default()),
        Command::Levels(args) => commands::levels(&args).map(|_| ()),
        Command::Bbox(args) => commands::bbox(&args),
        Command::Help => Ok(()),
    }
}
