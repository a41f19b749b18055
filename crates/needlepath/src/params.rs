//! Embroidery parameters: a static declarative table plus typed lookup.
//!
//! The host stores parameters as strings on each element. This module
//! declares every parameter once ([`SATIN_PARAMS`], [`ELEMENT_PARAMS`]) and
//! resolves raw strings into plain structs ([`SatinParams`],
//! [`ElementParams`]). The geometry code only ever sees the resolved values.
//!
//! Names ending in `_mm` are lengths in millimetres and are converted to
//! pixels with [`PIXELS_PER_MM`] on read.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::stitch::TieMode;

/// SVG user units per millimetre (96 dpi).
pub const PIXELS_PER_MM: f64 = 96.0 / 25.4;

/// Value type of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Enables a whole group (e.g. "Contour underlay").
    Toggle,
    Boolean,
    Float,
    Int,
    /// One value, or two whitespace-separated values for left/right.
    SplitFloat,
    /// Integer index into `options`.
    Dropdown(&'static [&'static str]),
}

/// Declaration of one parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: ParamKind,
    pub default: Option<&'static str>,
    pub unit: Option<&'static str>,
    pub group: Option<&'static str>,
    pub tooltip: Option<&'static str>,
    pub sort_index: i32,
}

impl ParamSpec {
    pub const fn new(name: &'static str, label: &'static str, kind: ParamKind) -> Self {
        Self {
            name,
            label,
            kind,
            default: None,
            unit: None,
            group: None,
            tooltip: None,
            sort_index: 0,
        }
    }

    pub const fn default(mut self, default: &'static str) -> Self {
        self.default = Some(default);
        self
    }

    pub const fn unit(mut self, unit: &'static str) -> Self {
        self.unit = Some(unit);
        self
    }

    pub const fn group(mut self, group: &'static str) -> Self {
        self.group = Some(group);
        self
    }

    pub const fn tooltip(mut self, tooltip: &'static str) -> Self {
        self.tooltip = Some(tooltip);
        self
    }

    pub const fn sort(mut self, sort_index: i32) -> Self {
        self.sort_index = sort_index;
        self
    }
}

const CONTOUR: &str = "Contour Underlay";
const CENTER_WALK: &str = "Center-Walk Underlay";
const ZIGZAG: &str = "Zig-zag Underlay";

/// Parameters understood by satin columns.
pub const SATIN_PARAMS: &[ParamSpec] = &[
    ParamSpec::new("satin_column", "Custom satin column", ParamKind::Toggle),
    ParamSpec::new("e_stitch", "\"E\" stitch", ParamKind::Boolean).default("false"),
    ParamSpec::new("max_stitch_length_mm", "Maximum stitch length", ParamKind::Float)
        .unit("mm")
        .tooltip("Maximum stitch length for split stitches."),
    ParamSpec::new("short_stitch_inset", "Short stitch inset", ParamKind::Float)
        .unit("%")
        .default("15")
        .tooltip("Stitches in areas with high density will be shortened by this amount."),
    ParamSpec::new("short_stitch_distance_mm", "Short stitch distance", ParamKind::Float)
        .unit("mm")
        .default("0.25")
        .tooltip("Do short stitches if the distance between stitches is smaller than this."),
    ParamSpec::new("zigzag_spacing_mm", "Zig-zag spacing (peak-to-peak)", ParamKind::Float)
        .unit("mm/cycle")
        .default("0.4"),
    ParamSpec::new("pull_compensation_percent", "Pull compensation percentage", ParamKind::SplitFloat)
        .unit("% (each side)")
        .default("0")
        .tooltip("Additional pull compensation which varies as a percentage of stitch width."),
    ParamSpec::new("pull_compensation_mm", "Pull compensation", ParamKind::SplitFloat)
        .unit("mm (each side)")
        .default("0")
        .tooltip("Expands each pair of needle penetrations outward from the center of the column."),
    ParamSpec::new("swap_satin_rails", "Swap rails", ParamKind::Boolean)
        .default("false")
        .tooltip("Swaps the first and second rails of the satin column."),
    ParamSpec::new("contour_underlay", "Contour underlay", ParamKind::Toggle).group(CONTOUR),
    ParamSpec::new("contour_underlay_stitch_length_mm", "Stitch length", ParamKind::Float)
        .group(CONTOUR)
        .unit("mm")
        .default("1.5"),
    ParamSpec::new("contour_underlay_inset_mm", "Inset distance (fixed)", ParamKind::SplitFloat)
        .group(CONTOUR)
        .unit("mm (each side)")
        .default("0.4")
        .sort(2),
    ParamSpec::new("contour_underlay_inset_percent", "Inset distance (proportional)", ParamKind::SplitFloat)
        .group(CONTOUR)
        .unit("% (each side)")
        .default("0")
        .sort(3),
    ParamSpec::new("center_walk_underlay", "Center-walk underlay", ParamKind::Toggle).group(CENTER_WALK),
    ParamSpec::new("center_walk_underlay_stitch_length_mm", "Stitch length", ParamKind::Float)
        .group(CENTER_WALK)
        .unit("mm")
        .default("1.5"),
    ParamSpec::new("center_walk_underlay_repeats", "Repeats", ParamKind::Int)
        .group(CENTER_WALK)
        .default("2")
        .sort(2)
        .tooltip("An odd number of repeats reverses the direction the column is stitched."),
    ParamSpec::new("center_walk_underlay_position", "Position", ParamKind::Float)
        .group(CENTER_WALK)
        .unit("%")
        .default("50")
        .sort(3)
        .tooltip("0% is along the first rail, 50% is centered, 100% is along the second rail."),
    ParamSpec::new("zigzag_underlay", "Zig-zag underlay", ParamKind::Toggle).group(ZIGZAG),
    ParamSpec::new("zigzag_underlay_spacing_mm", "Zig-Zag spacing (peak-to-peak)", ParamKind::Float)
        .group(ZIGZAG)
        .unit("mm")
        .default("3"),
    ParamSpec::new("zigzag_underlay_inset_mm", "Inset amount (fixed)", ParamKind::SplitFloat)
        .group(ZIGZAG)
        .unit("mm (each side)")
        .tooltip("default: half of contour underlay inset"),
    ParamSpec::new("zigzag_underlay_inset_percent", "Inset amount (proportional)", ParamKind::SplitFloat)
        .group(ZIGZAG)
        .unit("% (each side)")
        .tooltip("default: half of contour underlay inset"),
    ParamSpec::new("zigzag_underlay_max_stitch_length_mm", "Maximum stitch length", ParamKind::Float)
        .group(ZIGZAG)
        .unit("mm"),
];

/// Parameters shared by every embroidery element.
pub const ELEMENT_PARAMS: &[ParamSpec] = &[
    ParamSpec::new("ties", "Allow lock stitches", ParamKind::Dropdown(&["Both", "Before", "After", "Neither"]))
        .default("0")
        .sort(50),
    ParamSpec::new("force_lock_stitches", "Force lock stitches", ParamKind::Boolean)
        .default("false")
        .sort(51),
    ParamSpec::new("trim_after", "Trim after", ParamKind::Boolean).default("false"),
    ParamSpec::new("stop_after", "Stop after", ParamKind::Boolean).default("false"),
];

/// Look up a parameter declaration by name.
pub fn find_param(name: &str) -> Option<&'static ParamSpec> {
    SATIN_PARAMS.iter().chain(ELEMENT_PARAMS).find(|p| p.name == name)
}

// ============================================================================
// LOOKUP
// ============================================================================

/// Where raw parameter strings come from (the host document).
pub trait ParamSource {
    fn raw_param(&self, name: &str) -> Option<String>;
}

impl ParamSource for HashMap<String, String> {
    fn raw_param(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Layer one source over another: `primary` wins, `fallback` fills gaps.
pub struct Layered<'a> {
    pub primary: &'a dyn ParamSource,
    pub fallback: &'a dyn ParamSource,
}

impl ParamSource for Layered<'_> {
    fn raw_param(&self, name: &str) -> Option<String> {
        self.primary
            .raw_param(name)
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.fallback.raw_param(name))
    }
}

/// Typed reads over a [`ParamSource`].
pub struct ParamReader<'a> {
    source: &'a dyn ParamSource,
}

impl<'a> ParamReader<'a> {
    pub fn new(source: &'a dyn ParamSource) -> Self {
        Self { source }
    }

    /// The trimmed raw value, or `None` if absent or blank.
    pub fn get_param(&self, name: &str) -> Option<String> {
        self.source
            .raw_param(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    pub fn get_boolean(&self, name: &str, default: bool) -> bool {
        match self.get_param(name) {
            Some(value) => matches!(value.to_lowercase().as_str(), "yes" | "y" | "true" | "t" | "1"),
            None => default,
        }
    }

    /// A float, scaled to pixels when the name ends in `_mm`.
    pub fn get_float(&self, name: &str) -> Option<f64> {
        let value: f64 = self.get_param(name)?.parse().ok()?;
        Some(scale_for_unit(name, value))
    }

    pub fn get_float_or(&self, name: &str, default: f64) -> f64 {
        self.get_float(name).unwrap_or_else(|| scale_for_unit(name, default))
    }

    pub fn get_int(&self, name: &str, default: i64) -> i64 {
        match self.get_param(name).and_then(|v| v.parse::<i64>().ok()) {
            Some(value) if name.ends_with("_mm") => (value as f64 * PIXELS_PER_MM) as i64,
            Some(value) => value,
            None => default,
        }
    }

    /// One or two whitespace-separated floats; a single value applies to both sides.
    pub fn get_split_float(&self, name: &str, default: (f64, f64)) -> (f64, f64) {
        let Some(raw) = self.get_param(name) else {
            return default;
        };
        let values: Vec<f64> = raw
            .split_whitespace()
            .map(str::parse)
            .collect::<Result<_, _>>()
            .unwrap_or_default();

        match values.as_slice() {
            [both] => (*both, *both),
            [a, b, ..] => (*a, *b),
            [] => default,
        }
    }

    /// Like [`get_split_float`](Self::get_split_float) for millimetre values,
    /// returned in pixels. `default` is in millimetres.
    pub fn get_split_mm_as_px(&self, name: &str, default: (f64, f64)) -> (f64, f64) {
        let (a, b) = self.get_split_float(name, default);
        (a * PIXELS_PER_MM, b * PIXELS_PER_MM)
    }

    /// Every declared parameter with its effective raw value, in table order.
    ///
    /// Used to fingerprint an element for caching.
    pub fn values(&self, table: &[ParamSpec]) -> Vec<(String, String)> {
        table
            .iter()
            .map(|spec| {
                let value = self
                    .get_param(spec.name)
                    .or_else(|| spec.default.map(str::to_string))
                    .unwrap_or_default();
                (spec.name.to_string(), value)
            })
            .collect()
    }
}

fn scale_for_unit(name: &str, value: f64) -> f64 {
    if name.ends_with("_mm") {
        value * PIXELS_PER_MM
    } else {
        value
    }
}

// ============================================================================
// RESOLVED PARAMETERS
// ============================================================================

/// Resolved satin column parameters. All lengths are in pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SatinParams {
    pub e_stitch: bool,
    pub max_stitch_length: Option<f64>,
    /// Fraction (0..1) a short stitch is pulled toward the other rail.
    pub short_stitch_inset: f64,
    pub short_stitch_distance: f64,
    /// Peak-to-peak distance between zig-zags.
    pub zigzag_spacing: f64,
    /// Proportional pull compensation, percent of width per side.
    pub pull_compensation_percent: (f64, f64),
    pub pull_compensation_px: (f64, f64),
    pub swap_rails: bool,

    pub contour_underlay: bool,
    pub contour_underlay_stitch_length: f64,
    pub contour_underlay_inset_px: (f64, f64),
    pub contour_underlay_inset_percent: (f64, f64),

    pub center_walk_underlay: bool,
    pub center_walk_underlay_stitch_length: f64,
    pub center_walk_underlay_repeats: u32,
    /// 0 = first rail, 50 = centered, 100 = second rail.
    pub center_walk_underlay_position: f64,

    pub zigzag_underlay: bool,
    pub zigzag_underlay_spacing: f64,
    pub zigzag_underlay_inset_px: (f64, f64),
    pub zigzag_underlay_inset_percent: (f64, f64),
    pub zigzag_underlay_max_stitch_length: Option<f64>,
}

impl Default for SatinParams {
    fn default() -> Self {
        Self::resolve(&HashMap::new())
    }
}

impl SatinParams {
    /// Resolve every satin parameter, applying defaults and clamps.
    pub fn resolve(source: &dyn ParamSource) -> Self {
        let r = ParamReader::new(source);

        let contour_underlay_inset_px = r.get_split_mm_as_px("contour_underlay_inset_mm", (0.4, 0.4));
        let contour_underlay_inset_percent = r.get_split_float("contour_underlay_inset_percent", (0.0, 0.0));

        // Zig-zag points land halfway between the contour underlay and the edge.
        let zigzag_inset_default_mm = (
            contour_underlay_inset_px.0 * 0.5 / PIXELS_PER_MM,
            contour_underlay_inset_px.1 * 0.5 / PIXELS_PER_MM,
        );
        let zigzag_percent_default = (
            contour_underlay_inset_percent.0 * 0.5,
            contour_underlay_inset_percent.1 * 0.5,
        );

        Self {
            e_stitch: r.get_boolean("e_stitch", false),
            max_stitch_length: r.get_float("max_stitch_length_mm").filter(|v| *v > 0.0),
            short_stitch_inset: r.get_float_or("short_stitch_inset", 15.0) / 100.0,
            short_stitch_distance: r.get_float_or("short_stitch_distance_mm", 0.25),
            zigzag_spacing: r.get_float_or("zigzag_spacing_mm", 0.4).max(0.01),
            pull_compensation_percent: r.get_split_float("pull_compensation_percent", (0.0, 0.0)),
            pull_compensation_px: r.get_split_mm_as_px("pull_compensation_mm", (0.0, 0.0)),
            swap_rails: r.get_boolean("swap_satin_rails", false),

            contour_underlay: r.get_boolean("contour_underlay", false),
            contour_underlay_stitch_length: r
                .get_float_or("contour_underlay_stitch_length_mm", 1.5)
                .max(0.01),
            contour_underlay_inset_px,
            contour_underlay_inset_percent,

            center_walk_underlay: r.get_boolean("center_walk_underlay", false),
            center_walk_underlay_stitch_length: r
                .get_float_or("center_walk_underlay_stitch_length_mm", 1.5)
                .max(0.01),
            center_walk_underlay_repeats: u32::try_from(r.get_int("center_walk_underlay_repeats", 2).max(1))
                .unwrap_or(u32::MAX),
            center_walk_underlay_position: r
                .get_float_or("center_walk_underlay_position", 50.0)
                .clamp(0.0, 100.0),

            zigzag_underlay: r.get_boolean("zigzag_underlay", false),
            zigzag_underlay_spacing: r.get_float_or("zigzag_underlay_spacing_mm", 3.0).max(0.01),
            zigzag_underlay_inset_px: r.get_split_mm_as_px("zigzag_underlay_inset_mm", zigzag_inset_default_mm),
            zigzag_underlay_inset_percent: r
                .get_split_float("zigzag_underlay_inset_percent", zigzag_percent_default),
            zigzag_underlay_max_stitch_length: r
                .get_float("zigzag_underlay_max_stitch_length_mm")
                .filter(|v| *v > 0.0),
        }
    }

    /// An odd number of center-walk repeats flips the column's direction.
    pub fn center_walk_is_odd(&self) -> bool {
        self.center_walk_underlay_repeats % 2 == 1
    }
}

/// Resolved parameters every element carries.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ElementParams {
    pub ties: TieMode,
    pub force_lock_stitches: bool,
    pub trim_after: bool,
    pub stop_after: bool,
}

impl ElementParams {
    pub fn resolve(source: &dyn ParamSource) -> Self {
        let r = ParamReader::new(source);
        Self {
            ties: TieMode::from_index(r.get_int("ties", 0)),
            force_lock_stitches: r.get_boolean("force_lock_stitches", false),
            trim_after: r.get_boolean("trim_after", false),
            stop_after: r.get_boolean("stop_after", false),
        }
    }
}
