//! Split command: cut one satin column into two.
//!
//! The halves are written back as `<path>` elements that can be fed to the
//! `satin` command again.

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::Serialize;

use needlepath::{Polyline, SatinColumn, SplitAt};

use super::common::{OutputFormat, load_elements, parse_point_arg, satin_elements, svg_header, write_output};
use super::config::Config;

/// `--at` is a fraction when it parses as one number, a point otherwise.
pub fn parse_split_at(text: &str) -> Result<SplitAt> {
    if let Ok(fraction) = text.trim().parse::<f64>() {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(anyhow!("split fraction must be between 0 and 1, got {}", fraction));
        }
        return Ok(SplitAt::Fraction(fraction));
    }
    parse_point_arg(text).map(SplitAt::Point)
}

/// A column's rails and rungs in JSON output format.
#[derive(Serialize)]
struct JsonColumn {
    rails: Vec<Polyline>,
    rungs: Vec<Polyline>,
}

impl From<&SatinColumn> for JsonColumn {
    fn from(column: &SatinColumn) -> Self {
        JsonColumn { rails: column.flattened_rails(), rungs: column.flattened_rungs() }
    }
}

#[derive(Serialize)]
struct JsonSplit {
    id: String,
    before: JsonColumn,
    after: JsonColumn,
}

/// Path data for every subpath of a column.
fn path_data(column: &SatinColumn) -> String {
    column
        .paths()
        .iter()
        .filter_map(|subpath| {
            let (first, rest) = subpath.points.split_first()?;
            let mut d = format!("M {:.3},{:.3}", first.x, first.y);
            for p in rest {
                d.push_str(&format!(" L {:.3},{:.3}", p.x, p.y));
            }
            Some(d)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn halves_to_svg(id: &str, color: Option<&str>, halves: [&SatinColumn; 2], original_svg: &str) -> String {
    let mut svg = svg_header(original_svg);
    for (suffix, half) in ["a", "b"].iter().zip(halves) {
        svg.push_str(&format!(
            "  <path id=\"{}-{}\" d=\"{}\" stroke=\"{}\" fill=\"none\" data-satin_column=\"true\"/>\n",
            id,
            suffix,
            path_data(half),
            color.unwrap_or("black")
        ));
    }
    svg.push_str("</svg>\n");
    svg
}

pub fn cmd_split(
    path: &str,
    at: &str,
    id: Option<&str>,
    output: Option<&Path>,
    format: OutputFormat,
    config: &Config,
) -> Result<()> {
    let at = parse_split_at(at)?;
    let (content, elements) = load_elements(path)?;
    let satins = satin_elements(&elements, config);

    let element = match id {
        Some(id) => satins.iter().find(|s| s.id == id),
        None => satins.first(),
    }
    .ok_or_else(|| anyhow!("no satin column {}in {}", id.map(|i| format!("{:?} ", i)).unwrap_or_default(), path))?;

    let spacing = element.satin_params().zigzag_spacing;
    let (before, after) = element
        .column()
        .split(at, spacing)
        .with_context(|| format!("cannot split {}", element.id))?;

    let text = match format {
        OutputFormat::Json => {
            let split = JsonSplit { id: element.id.clone(), before: (&before).into(), after: (&after).into() };
            serde_json::to_string_pretty(&split)? + "\n"
        }
        OutputFormat::Svg => halves_to_svg(&element.id, element.color.as_deref(), [&before, &after], &content),
    };
    write_output(output, &text)
}
