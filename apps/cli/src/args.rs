// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Command line parsing.

use anyhow::{anyhow, bail, Context, Result};
use std::path::PathBuf;
use std::str::FromStr;

pub const USAGE: &str = "\
Usage:
  batchplan extract <glob> [options]
      --output DIR          Root of the extracted plans (default: $BATCHPLAN_OUTPUT or ./output)
      --use-storey          Cut at the model storeys instead of <dir>/<stem>.csv
      --formatter NAME      Formatter to run, repeatable (default: FloorPlanFormatter, Floor3DFormatter)
      --filter-fn NAME      Element filter (default: default_filter)
      --filter TYPES        Comma separated IFC types to keep
      --color-fn NAME       Styling, or `model` for the colours stored in the file (default: all_black)
      --carbon-mapping CSV  Material mapping table for carbon_color
      --skip-colorless      Leave out elements the styling has no colour for
      --width N             Image width in pixels
      --height N            Image height in pixels
      --tolerance T         Endpoint merge distance for section edges
      --shared-vertices     Only join section edges at identical endpoints
  batchplan levels <ifc> [--use-storeys] [--merge-tolerance MM] [--output CSV]
  batchplan bbox <root> [--output CSV]";

/// Options of `batchplan extract`
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractArgs {
    pub pattern: String,
    pub output: Option<PathBuf>,
    pub use_storey: bool,
    pub formatters: Vec<String>,
    pub filter_fn: Option<String>,
    pub filter: Option<String>,
    pub color_fn: Option<String>,
    pub carbon_mapping: Option<PathBuf>,
    pub skip_colorless: bool,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub tolerance: Option<f64>,
    pub shared_vertices: bool,
}

impl ExtractArgs {
    fn new(pattern: String) -> Self {
        Self {
            pattern,
            output: None,
            use_storey: false,
            formatters: Vec::new(),
            filter_fn: None,
            filter: None,
            color_fn: None,
            carbon_mapping: None,
            skip_colorless: false,
            width: None,
            height: None,
            tolerance: None,
            shared_vertices: false,
        }
    }
}

/// Options of `batchplan levels`
#[derive(Debug, Clone, PartialEq)]
pub struct LevelsArgs {
    pub ifc: PathBuf,
    pub use_storeys: bool,
    pub merge_tolerance_mm: f64,
    pub output: Option<PathBuf>,
}

/// Options of `batchplan bbox`
#[derive(Debug, Clone, PartialEq)]
pub struct BboxArgs {
    pub root: PathBuf,
    pub output: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Extract(ExtractArgs),
    Levels(LevelsArgs),
    Bbox(BboxArgs),
    Help,
}

/// Slab tops closer than this are one level
const DEFAULT_MERGE_TOLERANCE_MM: f64 = 500.0;

const DEFAULT_BBOX_OUTPUT: &str = "global_bboxes.csv";

/// Parse the arguments following the program name.
pub fn parse<I>(args: I) -> Result<Command>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let Some(command) = args.next() else {
        return Ok(Command::Help);
    };
    match command.as_str() {
        "-h" | "--help" | "help" => Ok(Command::Help),
        "extract" => parse_extract(args),
        "levels" => parse_levels(args),
        "bbox" => parse_bbox(args),
        other => bail!("Unknown command `{other}`"),
    }
}

fn parse_extract(mut args: impl Iterator<Item = String>) -> Result<Command> {
    let mut pattern = None;
    let mut pending = ExtractArgs::new(String::new());

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            "--output" | "-o" => pending.output = Some(PathBuf::from(value(&mut args, &arg)?)),
            "--use-storey" => pending.use_storey = true,
            "--formatter" => pending.formatters.push(value(&mut args, &arg)?),
            "--filter-fn" => pending.filter_fn = Some(value(&mut args, &arg)?),
            "--filter" => pending.filter = Some(value(&mut args, &arg)?),
            "--color-fn" => pending.color_fn = Some(value(&mut args, &arg)?),
            "--carbon-mapping" => pending.carbon_mapping = Some(PathBuf::from(value(&mut args, &arg)?)),
            "--skip-colorless" => pending.skip_colorless = true,
            "--width" => pending.width = Some(positive(&mut args, &arg)?),
            "--height" => pending.height = Some(positive(&mut args, &arg)?),
            "--tolerance" => pending.tolerance = Some(distance(&mut args, &arg)?),
            "--shared-vertices" => pending.shared_vertices = true,
            flag if flag.starts_with('-') => bail!("Unknown option `{flag}` for extract"),
            glob if pattern.is_none() => pattern = Some(glob.to_string()),
            other => bail!("Unexpected argument `{other}`"),
        }
    }

    let pattern = pattern.ok_or_else(|| anyhow!("extract needs an IFC file pattern"))?;
    Ok(Command::Extract(ExtractArgs { pattern, ..pending }))
}

fn parse_levels(mut args: impl Iterator<Item = String>) -> Result<Command> {
    let mut ifc = None;
    let mut use_storeys = false;
    let mut merge_tolerance_mm = DEFAULT_MERGE_TOLERANCE_MM;
    let mut output = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            "--use-storeys" => use_storeys = true,
            "--merge-tolerance" => merge_tolerance_mm = number(&mut args, &arg)?,
            "--output" | "-o" => output = Some(PathBuf::from(value(&mut args, &arg)?)),
            flag if flag.starts_with('-') => bail!("Unknown option `{flag}` for levels"),
            path if ifc.is_none() => ifc = Some(PathBuf::from(path)),
            other => bail!("Unexpected argument `{other}`"),
        }
    }

    let ifc = ifc.ok_or_else(|| anyhow!("levels needs an IFC file"))?;
    Ok(Command::Levels(LevelsArgs {
        ifc,
        use_storeys,
        merge_tolerance_mm,
        output,
    }))
}

fn parse_bbox(mut args: impl Iterator<Item = String>) -> Result<Command> {
    let mut root = None;
    let mut output = PathBuf::from(DEFAULT_BBOX_OUTPUT);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            "--output" | "-o" => output = PathBuf::from(value(&mut args, &arg)?),
            flag if flag.starts_with('-') => bail!("Unknown option `{flag}` for bbox"),
            path if root.is_none() => root = Some(PathBuf::from(path)),
            other => bail!("Unexpected argument `{other}`"),
        }
    }

    let root = root.ok_or_else(|| anyhow!("bbox needs a project root directory"))?;
    Ok(Command::Bbox(BboxArgs { root, output }))
}

fn value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String> {
    args.next().ok_or_else(|| anyhow!("`{flag}` needs a value"))
}

fn number<T>(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = value(args, flag)?;
    raw.parse().with_context(|| format!("Invalid value `{raw}` for `{flag}`"))
}

fn positive(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<u32> {
    let n: u32 = number(args, flag)?;
    if n == 0 {
        bail!("`{flag}` must be greater than zero");
    }
    Ok(n)
}

fn distance(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<f64> {
    let d: f64 = number(args, flag)?;
    if !(d.is_finite() && d > 0.0) {
        bail!("`{flag}` must be a positive distance");
    }
    Ok(d)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_str(line: &str) -> Result<Command> {
        parse(line.split_whitespace().map(String::from))
    }

    #[test]
    fn test_extract_options() {
        let command = parse_str(
            "extract models/*.ifc --use-storey --formatter FloorWKTFormatter --formatter FloorPlanFormatter \
             --filter IfcWall,IfcSlab --color-fn carbon_color --skip-colorless --width 800 --height 600 -o plans",
        )
        .unwrap();
        let Command::Extract(args) = command else {
            panic!("expected extract, got {command:?}");
        };
        assert_eq!(args.pattern, "models/*.ifc");
        assert!(args.use_storey);
        assert!(args.skip_colorless);
        assert_eq!(args.formatters, ["FloorWKTFormatter", "FloorPlanFormatter"]);
        assert_eq!(args.filter.as_deref(), Some("IfcWall,IfcSlab"));
        assert_eq!(args.color_fn.as_deref(), Some("carbon_color"));
        assert_eq!((args.width, args.height), (Some(800), Some(600)));
        assert_eq!(args.output, Some(PathBuf::from("plans")));
        assert_eq!(args.filter_fn, None);
        assert_eq!(args.tolerance, None);

        let Command::Extract(args) = parse_str("extract a.ifc --tolerance 0.001").unwrap() else {
            panic!("expected extract");
        };
        assert_eq!(args.tolerance, Some(0.001));
    }

    #[test]
    fn test_pattern_may_follow_options() {
        let Command::Extract(args) = parse_str("extract --use-storey a.ifc").unwrap() else {
            panic!("expected extract");
        };
        assert_eq!(args.pattern, "a.ifc");
        assert!(args.use_storey);
    }

    #[test]
    fn test_levels_and_bbox() {
        assert_eq!(
            parse_str("levels house.ifc --use-storeys").unwrap(),
            Command::Levels(LevelsArgs {
                ifc: PathBuf::from("house.ifc"),
                use_storeys: true,
                merge_tolerance_mm: DEFAULT_MERGE_TOLERANCE_MM,
                output: None,
            })
        );
        assert_eq!(
            parse_str("bbox projects").unwrap(),
            Command::Bbox(BboxArgs {
                root: PathBuf::from("projects"),
                output: PathBuf::from(DEFAULT_BBOX_OUTPUT),
            })
        );
    }

    #[test]
    fn test_help() {
        assert_eq!(parse_str("").unwrap(), Command::Help);
        assert_eq!(parse_str("--help").unwrap(), Command::Help);
        assert_eq!(parse_str("extract -h").unwrap(), Command::Help);
    }

    #[test]
    fn test_errors() {
        assert!(parse_str("render x.ifc").is_err());
        assert!(parse_str("extract").is_err());
        assert!(parse_str("extract a.ifc b.ifc").is_err());
        assert!(parse_str("extract a.ifc --width").is_err());
        assert!(parse_str("extract a.ifc --width 0").is_err());
        assert!(parse_str("extract a.ifc --height tall").is_err());
        assert!(parse_str("extract a.ifc --verbose").is_err());
        assert!(parse_str("extract a.ifc --tolerance 0").is_err());
        assert!(parse_str("extract a.ifc --tolerance -1e-5").is_err());
        assert!(parse_str("extract a.ifc --tolerance NaN").is_err());
        assert!(parse_str("levels").is_err());
        assert!(parse_str("bbox root extra").is_err());
    }
}
