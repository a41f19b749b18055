//! Stitch groups - the output of every pattern generator.
//!
//! A [`StitchGroup`] is an ordered run of needle penetrations for one
//! region, in one colour, plus the flags the emitter needs to decide on
//! lock stitches, trims and stops.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// A single needle penetration with its semantic labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stitch {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl Stitch {
    pub fn new(point: Point) -> Self {
        Self { x: point.x, y: point.y, tags: Vec::new() }
    }

    #[inline]
    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn add_tags(&mut self, tags: &[&str]) {
        for tag in tags {
            if !self.has_tag(tag) {
                self.tags.push((*tag).to_string());
            }
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// When to sew lock (tie) stitches around a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieMode {
    #[default]
    Both,
    Before,
    After,
    Neither,
}

impl TieMode {
    /// Map the numeric `ties` parameter (0 = both .. 3 = neither).
    pub fn from_index(index: i64) -> TieMode {
        match index {
            1 => TieMode::Before,
            2 => TieMode::After,
            3 => TieMode::Neither,
            _ => TieMode::Both,
        }
    }

    pub fn tie_before(&self) -> bool {
        matches!(self, TieMode::Both | TieMode::Before)
    }

    pub fn tie_after(&self) -> bool {
        matches!(self, TieMode::Both | TieMode::After)
    }
}

/// An ordered sequence of stitches for one region.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StitchGroup {
    pub color: Option<String>,
    pub stitches: Vec<Stitch>,
    pub tags: Vec<String>,
    pub tie_mode: TieMode,
    pub force_lock_stitches: bool,
    pub trim_after: bool,
    pub stop_after: bool,
}

impl StitchGroup {
    pub fn new(color: Option<String>) -> Self {
        Self { color, ..Default::default() }
    }

    /// Build a group from plain points, tagging the group (not each stitch).
    pub fn from_points(color: Option<String>, points: &[Point], tags: &[&str]) -> Self {
        let mut group = Self::new(color);
        group.stitches = points.iter().copied().map(Stitch::new).collect();
        group.add_tags(tags);
        group
    }

    pub fn add_stitch(&mut self, point: Point) -> &mut Stitch {
        self.stitches.push(Stitch::new(point));
        let last = self.stitches.len() - 1;
        &mut self.stitches[last]
    }

    pub fn add_tags(&mut self, tags: &[&str]) {
        for tag in tags {
            if !self.has_tag(tag) {
                self.tags.push((*tag).to_string());
            }
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Append another group's stitches and tags (colour and flags of `self` win).
    pub fn extend(&mut self, other: StitchGroup) {
        self.stitches.extend(other.stitches);
        for tag in &other.tags {
            if !self.has_tag(tag) {
                self.tags.push(tag.clone());
            }
        }
    }

    pub fn reverse(&mut self) {
        self.stitches.reverse();
    }

    pub fn points(&self) -> Vec<Point> {
        self.stitches.iter().map(Stitch::point).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.stitches.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stitches.len()
    }

    pub fn first_point(&self) -> Option<Point> {
        self.stitches.first().map(Stitch::point)
    }

    pub fn last_point(&self) -> Option<Point> {
        self.stitches.last().map(Stitch::point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tie_mode_from_index() {
        assert_eq!(TieMode::from_index(0), TieMode::Both);
        assert_eq!(TieMode::from_index(3), TieMode::Neither);
        assert!(TieMode::Before.tie_before());
        assert!(!TieMode::Before.tie_after());
        assert_eq!(TieMode::from_index(42), TieMode::Both);
    }

    #[test]
    fn extend_merges_tags_once() {
        let mut a = StitchGroup::from_points(None, &[Point::new(0.0, 0.0)], &["satin_column"]);
        let b = StitchGroup::from_points(
            Some("red".into()),
            &[Point::new(1.0, 0.0)],
            &["satin_column", "e_stitch"],
        );
        a.extend(b);

        assert_eq!(a.len(), 2);
        assert_eq!(a.tags, vec!["satin_column".to_string(), "e_stitch".to_string()]);
        assert_eq!(a.color, None);
    }

    #[test]
    fn stitch_tags() {
        let mut group = StitchGroup::new(None);
        group.add_stitch(Point::new(1.0, 2.0)).add_tags(&["satin_split_stitch"]);
        assert!(group.stitches[0].has_tag("satin_split_stitch"));
        assert_eq!(group.last_point(), Some(Point::new(1.0, 2.0)));
    }
}
