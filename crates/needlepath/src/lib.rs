//! # needlepath
//!
//! Satin column synthesis and jump-minimizing auto-routing for machine
//! embroidery.
//!
//! Two halves that meet in the middle:
//! - [`satin`] turns rails and rungs into zig-zag stitch groups.
//! - [`route`] orders many sewn regions into one continuous path.
//!
//! [`element`] glues a satin column to its host-side parameters, command
//! markers and cache; [`svg`] is a small host that reads all of that from an
//! SVG file.
//!
//! ## Rust Lesson #7: Modules
//!
//! - `mod foo;` = load from `foo.rs` or `foo/mod.rs`
//! - `pub mod foo;` = also export it publicly
//! - `pub use foo::Bar;` = re-export Bar at this level

pub mod cache;
pub mod commands;
pub mod element;
pub mod geometry;
pub mod params;
pub mod route;
pub mod satin;
pub mod stitch;
pub mod svg;

// Re-export common types at crate root for convenience.
pub use cache::{CacheKey, MemoryCache, NoCache, StitchCache};
pub use commands::{CommandKind, CommandLookup, CommandMarker};
pub use element::{SatinElement, embroider_all};
pub use geometry::{Affine, Point, Polyline};
pub use params::{ElementParams, PIXELS_PER_MM, ParamSource, SatinParams};
pub use route::{EdgeTraversal, Region, RouteStep, build_route, route_steps};
pub use satin::{
    SatinColumn, SplitAt, Subpath, ValidationError, ValidationWarning, classify_rails_rungs, synthesize,
};
pub use stitch::{Stitch, StitchGroup, TieMode};
pub use svg::{SvgElement, SvgError, parse_svg};
