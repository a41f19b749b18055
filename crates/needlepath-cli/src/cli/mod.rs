//! CLI command implementations.
//!
//! - `params` - list the parameter table
//! - `satin` - generate stitches for satin columns
//! - `split` - split a satin column in two
//! - `route` - order regions into one route

pub mod common;
pub mod config;
pub mod params;
pub mod route;
pub mod satin;
pub mod split;

pub use common::{OutputFormat, parse_point_arg};
pub use config::Config;
pub use params::cmd_params;
pub use route::{RouteOptions, cmd_route};
pub use satin::cmd_satin;
pub use split::cmd_split;
