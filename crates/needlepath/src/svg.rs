//! SVG host adapter - read embroidery elements out of an SVG document.
//!
//! Streams the document with quick-xml instead of building a tree: we only
//! care about `<path>` elements, the transforms and stroke colours they
//! inherit from their groups, and their `data-*` attributes.
//!
//! ## Curve Flattening
//!
//! Path data is parsed with svgtypes' simplifying parser (absolute
//! coordinates, arcs already turned into cubics), and every Bézier is
//! flattened with lyon_geom at [`CURVE_TOLERANCE`]. A subpath keeps both its
//! vertices (`nodes`) and its flattened `points`: legacy satin columns care
//! about the former.

use std::collections::HashMap;
use std::str::FromStr;

use lyon_geom::{CubicBezierSegment, QuadraticBezierSegment, point};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use svgtypes::{SimplePathSegment, SimplifyingPathParser};
use thiserror::Error;
use tracing::debug;

use crate::commands::{CommandMarker, parse_commands};
use crate::element::SatinElement;
use crate::geometry::{Affine, Point};
use crate::params::{ParamReader, ParamSource};
use crate::satin::Subpath;

/// Tolerance for curve flattening, in user units.
pub const CURVE_TOLERANCE: f64 = 0.1;

/// Error type for SVG reading.
///
/// ## Rust Lesson #20: Error Handling
///
/// `thiserror` writes the `Display` and `std::error::Error` impls for us
/// from the `#[error(...)]` attributes, so each variant documents its own
/// message right where it's declared.
#[derive(Debug, Error)]
pub enum SvgError {
    #[error("XML parse error at position {position}: {message}")]
    Xml { position: u64, message: String },

    #[error("bad path data in {id}: {message}")]
    PathData { id: String, message: String },

    #[error("bad transform {value:?}: {message}")]
    Transform { value: String, message: String },

    #[error("no paths found in SVG")]
    NoPaths,
}

/// One `<path>` element, flattened and in document coordinates.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SvgElement {
    pub id: String,
    pub subpaths: Vec<Subpath>,
    /// `data-*` attributes with the prefix stripped and `-` turned into `_`.
    pub params: HashMap<String, String>,
    /// Stroke colour, inherited from ancestors if not set on the path.
    pub stroke: Option<String>,
    pub commands: Vec<CommandMarker>,
}

impl ParamSource for SvgElement {
    fn raw_param(&self, name: &str) -> Option<String> {
        self.params.get(name).cloned()
    }
}

impl SvgElement {
    /// Is this a satin column rather than a running-stitch path?
    ///
    /// An explicit `data-satin_column` wins; otherwise anything with at least
    /// two subpaths is taken to be rails (and maybe rungs).
    pub fn is_satin(&self) -> bool {
        let reader = ParamReader::new(self);
        match reader.get_param("satin_column") {
            Some(_) => reader.get_boolean("satin_column", false),
            None => self.subpaths.len() >= 2,
        }
    }

    pub fn to_satin(&self) -> SatinElement {
        let mut element = SatinElement::new(self.id.clone(), self.subpaths.clone()).with_commands(self.commands.clone());
        element.params = self.params.clone();
        element.color = self.stroke.clone();
        element
    }
}

/// What a child inherits from its ancestors.
#[derive(Debug, Clone, Default)]
struct Inherited {
    transform: Affine,
    stroke: Option<String>,
    in_defs: bool,
}

/// Read every `<path>` in `content`.
///
/// Paths inside `<defs>` are skipped, as are paths with no drawable
/// subpath. Errors if nothing usable is found.
pub fn parse_svg(content: &str) -> Result<Vec<SvgElement>, SvgError> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut stack = vec![Inherited::default()];
    let mut elements = Vec::new();
    let mut count = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let state = enter(e, stack.last().cloned().unwrap_or_default())?;
                if e.name().as_ref() == b"path" && !state.in_defs {
                    count += 1;
                    elements.extend(read_path(e, &state, count)?);
                }
                stack.push(state);
            }
            Ok(Event::Empty(ref e)) => {
                if e.name().as_ref() == b"path" {
                    let state = enter(e, stack.last().cloned().unwrap_or_default())?;
                    if !state.in_defs {
                        count += 1;
                        elements.extend(read_path(e, &state, count)?);
                    }
                }
            }
            Ok(Event::End(_)) => {
                if stack.len() > 1 {
                    stack.pop();
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(SvgError::Xml { position: reader.error_position(), message: e.to_string() });
            }
            _ => {}
        }
    }

    debug!("read {} path element(s), {} usable", count, elements.len());
    if elements.is_empty() {
        Err(SvgError::NoPaths)
    } else {
        Ok(elements)
    }
}

/// Combine an element's own transform and stroke with what it inherits.
fn enter(e: &BytesStart, parent: Inherited) -> Result<Inherited, SvgError> {
    let mut state = parent;
    if e.name().as_ref() == b"defs" {
        state.in_defs = true;
    }

    if let Some(value) = attribute(e, "transform") {
        let own = svgtypes::Transform::from_str(&value)
            .map_err(|err| SvgError::Transform { value: value.clone(), message: err.to_string() })?;
        state.transform = state.transform.then_after(&Affine::from(own));
    }

    if let Some(stroke) = stroke_of(e) {
        state.stroke = Some(stroke);
    }

    Ok(state)
}

fn attribute(e: &BytesStart, name: &str) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == name.as_bytes())
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// `stroke` attribute, or `stroke:` in an inline style (the style wins).
fn stroke_of(e: &BytesStart) -> Option<String> {
    let from_style = attribute(e, "style").and_then(|style| {
        style.split(';').find_map(|part| {
            part.trim()
                .strip_prefix("stroke:")
                .map(|v| v.trim().to_string())
        })
    });
    from_style
        .or_else(|| attribute(e, "stroke"))
        .filter(|v| !v.is_empty() && v != "none")
}

fn read_path(e: &BytesStart, state: &Inherited, index: usize) -> Result<Option<SvgElement>, SvgError> {
    let id = attribute(e, "id").unwrap_or_else(|| format!("path{}", index));
    let Some(d) = attribute(e, "d") else {
        return Ok(None);
    };

    let subpaths: Vec<Subpath> = flatten_path_data(&d)
        .map_err(|message| SvgError::PathData { id: id.clone(), message })?
        .into_iter()
        .map(|s| {
            let map = |points: &[Point]| points.iter().map(|&p| state.transform.apply(p)).collect::<Vec<_>>();
            Subpath::new(map(&s.nodes), map(&s.points))
        })
        .filter(|s| s.points.len() >= 2)
        .collect();
    if subpaths.is_empty() {
        debug!("skipping {}: nothing drawable", id);
        return Ok(None);
    }

    let mut params = HashMap::new();
    let mut commands_text = None;
    for attr in e.attributes().flatten() {
        let Ok(key) = std::str::from_utf8(attr.key.as_ref()) else {
            continue;
        };
        let Some(name) = key.strip_prefix("data-") else {
            continue;
        };
        let Ok(value) = attr.unescape_value() else {
            continue;
        };
        if name == "commands" {
            commands_text = Some(value.into_owned());
        } else {
            params.insert(name.replace('-', "_"), value.into_owned());
        }
    }

    let fallback = subpaths[0].points[0];
    let commands = commands_text.map(|text| parse_commands(&text, fallback)).unwrap_or_default();

    Ok(Some(SvgElement { id, subpaths, params, stroke: state.stroke.clone(), commands }))
}

/// Parse and flatten `d=""` into subpaths, in the path's own coordinates.
///
/// ## Rust Lesson #23: Iterator of Results
///
/// The parser yields `Result<Segment, Error>` items. Matching on
/// `segment.map_err(...)?` stops at the first bad command and hands the
/// error straight back to our caller.
pub fn flatten_path_data(d: &str) -> Result<Vec<Subpath>, String> {
    let mut subpaths = Vec::new();
    let mut nodes: Vec<Point> = Vec::new();
    let mut points: Vec<Point> = Vec::new();

    // Nodes are kept as drawn: a zero-length segment is how a legacy column
    // lines up its rails' node counts. Only the flattened points are deduped.
    let mut finish = |nodes: &mut Vec<Point>, points: &mut Vec<Point>| {
        points.dedup_by(|a, b| a.distance(*b) < 1e-6);
        if points.len() >= 2 {
            subpaths.push(Subpath::new(std::mem::take(nodes), std::mem::take(points)));
        } else {
            nodes.clear();
            points.clear();
        }
    };

    for segment in SimplifyingPathParser::from(d) {
        let segment = segment.map_err(|e| e.to_string())?;
        let last = points.last().copied();
        match segment {
            SimplePathSegment::MoveTo { x, y } => {
                finish(&mut nodes, &mut points);
                nodes.push(Point::new(x, y));
                points.push(Point::new(x, y));
            }
            SimplePathSegment::LineTo { x, y } => {
                nodes.push(Point::new(x, y));
                points.push(Point::new(x, y));
            }
            SimplePathSegment::Quadratic { x1, y1, x, y } => {
                if let Some(from) = last {
                    let curve = QuadraticBezierSegment {
                        from: point(from.x, from.y),
                        ctrl: point(x1, y1),
                        to: point(x, y),
                    };
                    curve.for_each_flattened(CURVE_TOLERANCE, &mut |segment| {
                        points.push(Point::new(segment.to.x, segment.to.y));
                    });
                } else {
                    points.push(Point::new(x, y));
                }
                nodes.push(Point::new(x, y));
            }
            SimplePathSegment::CurveTo { x1, y1, x2, y2, x, y } => {
                if let Some(from) = last {
                    let curve = CubicBezierSegment {
                        from: point(from.x, from.y),
                        ctrl1: point(x1, y1),
                        ctrl2: point(x2, y2),
                        to: point(x, y),
                    };
                    curve.for_each_flattened(CURVE_TOLERANCE, &mut |segment| {
                        points.push(Point::new(segment.to.x, segment.to.y));
                    });
                } else {
                    points.push(Point::new(x, y));
                }
                nodes.push(Point::new(x, y));
            }
            SimplePathSegment::ClosePath => {
                if let Some(&start) = nodes.first() {
                    // Already back at the start: nothing left to close.
                    if nodes.last().is_none_or(|last| last.distance(start) >= 1e-6) {
                        nodes.push(start);
                    }
                    points.push(start);
                }
            }
        }
    }
    finish(&mut nodes, &mut points);

    Ok(subpaths)
}

// ============================================================================
// TESTS
// ============================================================================
