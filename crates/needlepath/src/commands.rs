//! Command markers attached to elements (trim, stop, route start/end).
//!
//! Discovering markers is the host's job; this module only defines what a
//! marker looks like and how the rest of the crate asks for them.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// The commands the core understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    Trim,
    Stop,
    SatinStart,
    SatinEnd,
}

impl CommandKind {
    pub fn name(&self) -> &'static str {
        match self {
            CommandKind::Trim => "trim",
            CommandKind::Stop => "stop",
            CommandKind::SatinStart => "satin_start",
            CommandKind::SatinEnd => "satin_end",
        }
    }

    pub fn from_name(name: &str) -> Option<CommandKind> {
        match name.trim().to_lowercase().as_str() {
            "trim" => Some(CommandKind::Trim),
            "stop" => Some(CommandKind::Stop),
            "satin_start" | "start" => Some(CommandKind::SatinStart),
            "satin_end" | "end" => Some(CommandKind::SatinEnd),
            _ => None,
        }
    }
}

/// A command attached to an element, pointing at a location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CommandMarker {
    pub kind: CommandKind,
    pub target: Point,
}

/// Host lookup of the markers attached to an element.
pub trait CommandLookup {
    fn commands(&self) -> &[CommandMarker];

    fn get_command(&self, kind: CommandKind) -> Option<&CommandMarker> {
        self.commands().iter().find(|c| c.kind == kind)
    }

    fn has_command(&self, kind: CommandKind) -> bool {
        self.get_command(kind).is_some()
    }
}

impl CommandLookup for Vec<CommandMarker> {
    fn commands(&self) -> &[CommandMarker] {
        self
    }
}

/// Parse a marker list like `"trim stop satin_start@10,20"`.
///
/// Markers without an explicit `@x,y` target at `fallback` (usually the
/// element's first point). Unknown names are skipped.
pub fn parse_commands(text: &str, fallback: Point) -> Vec<CommandMarker> {
    text.split(|c: char| c.is_whitespace() || c == ';')
        .filter(|token| !token.is_empty())
        .filter_map(|token| {
            let (name, target) = match token.split_once('@') {
                Some((name, coords)) => (name, parse_point(coords)?),
                None => (token, fallback),
            };
            CommandKind::from_name(name).map(|kind| CommandMarker { kind, target })
        })
        .collect()
}

/// Parse `"x,y"` into a point.
pub fn parse_point(text: &str) -> Option<Point> {
    let (x, y) = text.split_once(',')?;
    Some(Point::new(x.trim().parse().ok()?, y.trim().parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_marker_list() {
        let markers = parse_commands("trim; satin_start@10,20 bogus stop", Point::new(1.0, 1.0));
        assert_eq!(markers.len(), 3);
        assert_eq!(markers[0].kind, CommandKind::Trim);
        assert_eq!(markers[0].target, Point::new(1.0, 1.0));
        assert_eq!(markers[1].target, Point::new(10.0, 20.0));
        assert!(markers.has_command(CommandKind::Stop));
        assert!(!markers.has_command(CommandKind::SatinEnd));
    }

    #[test]
    fn bad_coordinates_are_dropped() {
        assert!(parse_commands("satin_end@x,1", Point::default()).is_empty());
        assert_eq!(parse_point(" 3.5 , -2 "), Some(Point::new(3.5, -2.0)));
    }
}
