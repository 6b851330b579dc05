// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Command implementations.

use crate::args::{BboxArgs, ExtractArgs, LevelsArgs};
use crate::config::Config;
use anyhow::{Context as _, Result};
use batchplan_processing::registry::{DEFAULT_FILTER, DEFAULT_FORMATTERS, DEFAULT_STYLING};
use batchplan_processing::{
    calculate_global_bbox, levels_from_marks, process, process_using_storeys, read_level_file, slab_marks,
    storey_marks, write_level_file, Context, ElementFilter, FactoryOptions, FilterChain, Model, Registry,
    Styling, TypeFilter,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Styling name selecting the colours stored in the model
const MODEL_COLORS: &str = "model";

/// Level file expected next to an IFC file: `<dir>/<stem>.csv`
pub fn level_file_for(ifc: &Path) -> PathBuf {
    ifc.with_extension("csv")
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "model".to_string())
}

fn matching_files(pattern: &str) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in glob::glob(pattern).with_context(|| format!("Invalid file pattern `{pattern}`"))? {
        match entry {
            Ok(path) if path.is_file() => paths.push(path),
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "Unreadable path"),
        }
    }
    paths.sort();
    Ok(paths)
}

/// Build the extraction context shared by every matched model
fn base_context(args: &ExtractArgs, config: &Config, registry: &Registry) -> Result<Context> {
    let options = FactoryOptions {
        carbon_mapping: args.carbon_mapping.clone().or_else(|| config.carbon_mapping.clone()),
    };

    let filter_fn = args.filter_fn.as_deref().unwrap_or(DEFAULT_FILTER);
    let mut filter: Arc<dyn ElementFilter> = registry.filter(filter_fn, &options)?;
    if let Some(types) = &args.filter {
        if args.use_storey {
            tracing::warn!(filter = %types, "Type filter is applied to each storey's own elements");
        }
        let mut chain = FilterChain::new();
        chain.push(Box::new(filter));
        chain.push(Box::new(TypeFilter::parse(types)));
        filter = Arc::new(chain);
    }

    let color_fn = args.color_fn.as_deref().unwrap_or(DEFAULT_STYLING);
    let styling: Option<Arc<dyn Styling>> = if color_fn.eq_ignore_ascii_case(MODEL_COLORS) {
        None
    } else {
        Some(registry.styling(color_fn, &options)?)
    };

    let names: Vec<&str> = if args.formatters.is_empty() {
        DEFAULT_FORMATTERS.to_vec()
    } else {
        args.formatters.iter().map(String::as_str).collect()
    };
    let formatters = names
        .iter()
        .map(|name| registry.formatter(name, &options))
        .collect::<batchplan_processing::Result<Vec<_>>>()?;

    let mut ctx = Context::new(args.output.clone().unwrap_or_else(|| config.output_dir.clone()));
    ctx.filter = filter;
    ctx.styling = styling;
    ctx.skip_colorless = args.skip_colorless;
    ctx.formatters = formatters;
    ctx.width = args.width.unwrap_or(config.width);
    ctx.height = args.height.unwrap_or(config.height);
    ctx.section.tolerance = args.tolerance.unwrap_or(config.tolerance);
    ctx.section.shared_vertices = args.shared_vertices;
    Ok(ctx)
}

/// Extract floor plans from every IFC file matching the pattern
pub fn extract(args: &ExtractArgs, config: &Config, registry: &Registry) -> Result<()> {
    let paths = matching_files(&args.pattern)?;
    if paths.is_empty() {
        tracing::warn!(pattern = %args.pattern, "No IFC file found!");
        return Ok(());
    }

    let base = base_context(args, config, registry)?;
    let root = base.output_dir.clone();

    for path in &paths {
        let stem = file_stem(path);
        tracing::info!(path = %path.display(), "Processing");
        let mut ctx = base.clone();
        ctx.output_dir = root.join(&stem);
        std::fs::create_dir_all(&ctx.output_dir)
            .with_context(|| format!("Cannot create {}", ctx.output_dir.display()))?;

        let model = Model::open(path).with_context(|| format!("Cannot load {}", path.display()))?;
        let outcome = if args.use_storey {
            process_using_storeys(&model, &ctx)?
        } else {
            let level_file = level_file_for(path);
            let levels = levels_from_marks(&read_level_file(&level_file)?);
            process(&model, &ctx, &levels)?
        };

        tracing::info!(
            model = %stem,
            shapes = outcome.shapes,
            levels = outcome.levels.len(),
            output = %ctx.output_dir.display(),
            "Model done"
        );
    }
    Ok(())
}

/// Write the level file of one model
pub fn levels(args: &LevelsArgs) -> Result<PathBuf> {
    let model = Model::open(&args.ifc).with_context(|| format!("Cannot load {}", args.ifc.display()))?;
    let marks = if args.use_storeys {
        storey_marks(&model)
    } else {
        slab_marks(&model, args.merge_tolerance_mm)
    };
    if marks.is_empty() {
        tracing::warn!(path = %args.ifc.display(), "No levels found");
    }

    let output = args.output.clone().unwrap_or_else(|| level_file_for(&args.ifc));
    write_level_file(&output, &marks)?;
    tracing::info!(path = %output.display(), levels = marks.len(), "Saved level file");
    Ok(output)
}

/// Write the bounding boxes of every project model under a root
pub fn bbox(args: &BboxArgs) -> Result<()> {
    let rows = calculate_global_bbox(&args.root, &args.output)?;
    if rows.is_empty() {
        tracing::warn!(root = %args.root.display(), "No model bounding box computed");
    }
    Ok(())
}
