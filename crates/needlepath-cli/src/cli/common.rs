//! Common utilities shared across CLI commands.

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use clap::ValueEnum;
use tracing::debug;

use needlepath::commands::parse_point;
use needlepath::{Point, SatinElement, SvgElement, parse_svg};

use super::config::Config;

/// Output format for generated data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Svg,
}

/// Read a file, or stdin when `path` is `-`.
pub fn read_input(path: &str) -> Result<String> {
    if path == "-" {
        let mut content = String::new();
        io::stdin()
            .read_to_string(&mut content)
            .context("failed to read SVG from stdin")?;
        Ok(content)
    } else {
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path))
    }
}

/// Read and parse an SVG. Returns the raw text too, for its viewBox.
pub fn load_elements(path: &str) -> Result<(String, Vec<SvgElement>)> {
    let content = read_input(path)?;
    let elements = parse_svg(&content).with_context(|| format!("failed to parse {}", path))?;
    debug!("{}: {} element(s)", path, elements.len());
    Ok((content, elements))
}

/// The satin columns among `elements`, with config defaults filled in.
pub fn satin_elements(elements: &[SvgElement], config: &Config) -> Vec<SatinElement> {
    elements
        .iter()
        .filter(|e| e.is_satin())
        .map(|e| {
            let mut satin = e.to_satin();
            satin.apply_defaults(config.defaults());
            satin
        })
        .collect()
}

/// Write to a file, or stdout when no path is given.
pub fn write_output(output: Option<&Path>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("Wrote {}", path.display());
        }
        None => print!("{}", content),
    }
    Ok(())
}

pub fn parse_point_arg(text: &str) -> Result<Point> {
    parse_point(text).ok_or_else(|| anyhow!("expected a point as x,y, got {:?}", text))
}

/// Extract viewBox from SVG content.
pub fn extract_viewbox(svg: &str) -> Option<String> {
    ["viewBox=\"", "viewbox=\""].iter().find_map(|attr| {
        let rest = &svg[svg.find(attr)? + attr.len()..];
        rest.find('"').map(|end| rest[..end].to_string())
    })
}

/// Open an SVG document with the input's viewBox.
pub fn svg_header(original_svg: &str) -> String {
    let viewbox = extract_viewbox(original_svg).unwrap_or_else(|| "0 0 1000 1000".to_string());
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"{}\">\n",
        viewbox
    )
}

/// `"x1,y1 x2,y2 ..."` for a `points=""` attribute.
pub fn points_attr(points: &[Point]) -> String {
    points
        .iter()
        .map(|p| format!("{:.2},{:.2}", p.x, p.y))
        .collect::<Vec<_>>()
        .join(" ")
}
