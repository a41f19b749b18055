//! Satin command: stitch every satin column in a document.

use std::path::Path;

use anyhow::{Result, bail};
use serde::Serialize;
use tracing::{info, warn};

use needlepath::{MemoryCache, Point, SatinElement, StitchGroup, ValidationError, embroider_all};

use super::common::{OutputFormat, load_elements, points_attr, satin_elements, svg_header, write_output};
use super::config::Config;

/// A validation error in JSON output format.
#[derive(Serialize)]
struct JsonError {
    name: &'static str,
    message: String,
    location: Point,
    steps_to_solve: &'static [&'static str],
}

impl From<&ValidationError> for JsonError {
    fn from(err: &ValidationError) -> Self {
        JsonError {
            name: err.name(),
            message: err.to_string(),
            location: err.location(),
            steps_to_solve: err.steps_to_solve(),
        }
    }
}

/// One satin's result in JSON output format.
#[derive(Serialize)]
struct JsonSatin<'a> {
    id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    groups: Option<&'a [StitchGroup]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonError>,
}

pub fn to_json(elements: &[SatinElement], results: &[Result<Vec<StitchGroup>, ValidationError>]) -> Result<String> {
    let satins: Vec<JsonSatin> = elements
        .iter()
        .zip(results)
        .map(|(element, result)| match result {
            Ok(groups) => JsonSatin { id: &element.id, groups: Some(groups.as_slice()), error: None },
            Err(err) => JsonSatin { id: &element.id, groups: None, error: Some(err.into()) },
        })
        .collect();
    Ok(serde_json::to_string_pretty(&satins)? + "\n")
}

/// One `<g>` per satin, one `<polyline>` per stitch group.
pub fn to_svg(
    elements: &[SatinElement],
    results: &[Result<Vec<StitchGroup>, ValidationError>],
    original_svg: &str,
) -> String {
    let mut svg = svg_header(original_svg);
    for (element, result) in elements.iter().zip(results) {
        let Ok(groups) = result else { continue };
        let color = element.color.as_deref().unwrap_or("black");
        svg.push_str(&format!(
            "<g id=\"{}-stitches\" stroke=\"{}\" stroke-width=\"0.3\" fill=\"none\">\n",
            element.id, color
        ));
        for group in groups {
            svg.push_str(&format!("  <polyline points=\"{}\"/>\n", points_attr(&group.points())));
        }
        svg.push_str("</g>\n");
    }
    svg.push_str("</svg>\n");
    svg
}

pub fn cmd_satin(path: &str, output: Option<&Path>, format: OutputFormat, config: &Config) -> Result<()> {
    let (content, elements) = load_elements(path)?;
    let satins = satin_elements(&elements, config);
    if satins.is_empty() {
        bail!("no satin columns in {}", path);
    }

    let results = embroider_all(&satins, &MemoryCache::new());

    let mut failed = 0;
    for (element, result) in satins.iter().zip(&results) {
        if let Err(err) = result {
            let at = err.location();
            warn!("{}: {} (at {:.2}, {:.2})", element.id, err, at.x, at.y);
            failed += 1;
        }
    }
    info!("{} satin(s), {} failed", satins.len(), failed);

    let text = match format {
        OutputFormat::Json => to_json(&satins, &results)?,
        OutputFormat::Svg => to_svg(&satins, &results, &content),
    };
    write_output(output, &text)
}
