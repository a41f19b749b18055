//! Route command: one continuous path through every region.

use std::path::Path;

use anyhow::{Result, bail};
use serde::Serialize;
use tracing::warn;

use needlepath::{
    CommandKind, CommandLookup, EdgeTraversal, Point, Region, RouteStep, SvgElement, build_route, route_steps,
};
use needlepath::route::EdgeKind;

use super::common::{OutputFormat, load_elements, svg_header, write_output};
use super::config::Config;

pub struct RouteOptions {
    pub preserve_order: bool,
    pub start: Option<Point>,
    pub end: Option<Point>,
}

/// Regions in document order, with a label for each.
///
/// A satin column is one region. Any other path gives one region per
/// subpath.
pub fn collect_regions(elements: &[SvgElement], config: &Config) -> (Vec<Region>, Vec<String>) {
    let mut regions = Vec::new();
    let mut labels = Vec::new();

    for element in elements {
        if element.is_satin() {
            let mut satin = element.to_satin();
            satin.apply_defaults(config.defaults());
            match Region::from_satin(&satin.column()) {
                Some(region) => {
                    regions.push(region);
                    labels.push(element.id.clone());
                }
                None => warn!("{}: satin has no rails, not routed", element.id),
            }
            continue;
        }

        let many = element.subpaths.len() > 1;
        for (i, subpath) in element.subpaths.iter().enumerate() {
            let region = Region::from_polyline(&subpath.points);
            if region.segments.is_empty() {
                continue;
            }
            regions.push(region);
            labels.push(if many { format!("{}:{}", element.id, i) } else { element.id.clone() });
        }
    }

    (regions, labels)
}

/// The first `kind` marker in the document.
fn marker(elements: &[SvgElement], kind: CommandKind) -> Option<Point> {
    elements.iter().find_map(|e| e.commands.get_command(kind)).map(|c| c.target)
}

/// Route summary in JSON output format.
#[derive(Serialize)]
struct JsonRoute<'a> {
    regions: &'a [String],
    steps: Vec<RouteStep>,
    jumps: usize,
    jump_length: f64,
    underpaths: usize,
}

fn to_json(labels: &[String], route: &[EdgeTraversal]) -> Result<String> {
    let steps = route_steps(route);
    let jumps: Vec<(Point, Point)> = steps
        .iter()
        .filter_map(|s| match s {
            RouteStep::Jump { from, to } => Some((*from, *to)),
            _ => None,
        })
        .collect();
    let underpaths = steps.iter().filter(|s| matches!(s, RouteStep::Underpath { .. })).count();
    let summary = JsonRoute {
        regions: labels,
        jumps: jumps.len(),
        jump_length: jumps.iter().map(|(a, b)| a.distance(*b)).sum(),
        underpaths,
        steps,
    };
    Ok(serde_json::to_string_pretty(&summary)? + "\n")
}

/// Sewn edges in black, jumps as red dashes.
fn to_svg(route: &[EdgeTraversal], original_svg: &str) -> String {
    let mut svg = svg_header(original_svg);
    let mut sewn = Vec::new();
    let mut jumps = String::new();
    let mut edges = String::new();

    for t in route {
        let line = format!(
            "  <line x1=\"{:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\"/>\n",
            t.from.x, t.from.y, t.to.x, t.to.y
        );
        match t.kind {
            EdgeKind::Jump if t.from.distance(t.to) > 0.0 => jumps.push_str(&line),
            EdgeKind::Jump => {}
            EdgeKind::Sewn { .. } => {
                if !sewn.contains(&t.edge) {
                    sewn.push(t.edge);
                    edges.push_str(&line);
                }
            }
        }
    }

    svg.push_str("<g id=\"sewn\" stroke=\"black\" stroke-width=\"0.5\" fill=\"none\">\n");
    svg.push_str(&edges);
    svg.push_str("</g>\n<g id=\"jumps\" stroke=\"red\" stroke-width=\"0.3\" stroke-dasharray=\"1,1\" fill=\"none\">\n");
    svg.push_str(&jumps);
    svg.push_str("</g>\n</svg>\n");
    svg
}

pub fn cmd_route(
    path: &str,
    options: &RouteOptions,
    output: Option<&Path>,
    format: OutputFormat,
    config: &Config,
) -> Result<()> {
    let (content, elements) = load_elements(path)?;
    let (regions, labels) = collect_regions(&elements, config);
    if regions.is_empty() {
        bail!("nothing to route in {}", path);
    }

    let start = options.start.or_else(|| marker(&elements, CommandKind::SatinStart));
    let end = options.end.or_else(|| marker(&elements, CommandKind::SatinEnd));
    let route = build_route(&regions, options.preserve_order, start, end);

    let text = match format {
        OutputFormat::Json => to_json(&labels, &route)?,
        OutputFormat::Svg => to_svg(&route, &content),
    };
    write_output(output, &text)
}
