//! Structural checks on satin columns.
//!
//! Errors make a column unstitchable; warnings are reported but the column
//! is still sewn. Every problem carries a location so the host can point at
//! it.

use thiserror::Error;

use super::SatinColumn;
use crate::geometry::{Point, interpolate_normalized, polyline_intersections};

const RUNG_MESSAGE: &str = "Each rung should intersect both rails once.";

/// Why a satin column cannot be stitched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Satin column: object has too few subpaths. A satin column should have at least two subpaths (the rails).")]
    TooFewPaths { location: Point },

    #[error("Satin column: there are no rungs and rails have an unequal number of points.")]
    UnequalPoints { location: Point },

    #[error("Satin column: a rung intersects a rail more than once. {}", RUNG_MESSAGE)]
    TooManyIntersections { location: Point },

    #[error("A satin column consists of two rails and one or more rungs. This satin column may have a different setup.")]
    NotStitchable { location: Point },
}

impl ValidationError {
    /// Short human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            ValidationError::TooFewPaths { .. } => "Too few subpaths",
            ValidationError::UnequalPoints { .. } => "Unequal number of points",
            ValidationError::TooManyIntersections { .. } => "Rung intersects too many times",
            ValidationError::NotStitchable { .. } => "Not stitchable satin column",
        }
    }

    pub fn location(&self) -> Point {
        match self {
            ValidationError::TooFewPaths { location }
            | ValidationError::UnequalPoints { location }
            | ValidationError::TooManyIntersections { location }
            | ValidationError::NotStitchable { location } => *location,
        }
    }

    /// Suggested fixes, one per line.
    pub fn steps_to_solve(&self) -> &'static [&'static str] {
        match self {
            ValidationError::TooFewPaths { .. } => &[
                "* Add another subpath (select two rails and combine them into one path)",
                "* Convert to running stitch or simple satin",
            ],
            ValidationError::UnequalPoints { .. } => &[
                "The easiest way to solve this issue is to add one or more rungs.",
                "Rungs control the stitch direction in satin columns.",
                "* Draw a line across both rails as part of the same path.",
            ],
            ValidationError::TooManyIntersections { .. } => &[
                "* Shorten or move the rung so it crosses each rail exactly once.",
            ],
            ValidationError::NotStitchable { .. } => &[
                "Make sure your satin column is not a combination of multiple satin columns.",
                "Check that both rails have a non-zero length.",
            ],
        }
    }
}

/// A problem worth reporting that does not stop stitching.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationWarning {
    #[error("Satin column: a rung doesn't intersect both rails. {}", RUNG_MESSAGE)]
    DanglingRung { location: Point },
}

impl ValidationWarning {
    pub fn name(&self) -> &'static str {
        match self {
            ValidationWarning::DanglingRung { .. } => "Rung doesn't intersect rails",
        }
    }

    pub fn location(&self) -> Point {
        match self {
            ValidationWarning::DanglingRung { location } => *location,
        }
    }
}

impl SatinColumn {
    /// Every structural error, in the order they are found.
    ///
    /// Does not include [`ValidationError::NotStitchable`]; that depends on
    /// parameters and is raised by [`synthesize`](super::synthesize).
    pub fn validation_errors(&self) -> Vec<ValidationError> {
        let rails = self.rail_paths();
        if rails.len() < 2 {
            return vec![ValidationError::TooFewPaths { location: self.centroid() }];
        }

        if self.is_legacy() {
            if rails[0].nodes.len() != rails[1].nodes.len() {
                let location = interpolate_normalized(&rails[0].points, 0.5);
                return vec![ValidationError::UnequalPoints { location }];
            }
            return Vec::new();
        }

        let mut errors = Vec::new();
        for rung in self.flattened_rungs() {
            for rail in &rails {
                if polyline_intersections(&rung, &rail.points).len() > 1 {
                    let location = interpolate_normalized(&rung, 0.5);
                    errors.push(ValidationError::TooManyIntersections { location });
                }
            }
        }
        errors
    }

    /// One warning per rung/rail pair that never meet.
    pub fn validation_warnings(&self) -> Vec<ValidationWarning> {
        let rails = self.flattened_rails();
        let mut warnings = Vec::new();
        for rung in self.flattened_rungs() {
            for rail in &rails {
                if polyline_intersections(&rung, rail).is_empty() {
                    let location = interpolate_normalized(&rung, 0.5);
                    warnings.push(ValidationWarning::DanglingRung { location });
                }
            }
        }
        warnings
    }

    /// The first structural error, or the warnings if there is none.
    pub fn validate(&self) -> Result<Vec<ValidationWarning>, ValidationError> {
        match self.validation_errors().into_iter().next() {
            Some(error) => Err(error),
            None => Ok(self.validation_warnings()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Polyline;
    use crate::satin::test_support::ladder;

    fn line(x1: f64, y1: f64, x2: f64, y2: f64) -> Polyline {
        vec![Point::new(x1, y1), Point::new(x2, y2)]
    }

    #[test]
    fn good_ladder_is_clean() {
        assert_eq!(ladder(10.0, 4.0).validate(), Ok(vec![]));
    }

    #[test]
    fn single_path_is_too_few() {
        let column = SatinColumn::from_polylines(vec![line(0.0, 0.0, 10.0, 0.0)]);
        let err = column.validate().unwrap_err();
        assert_eq!(err.location(), Point::new(5.0, 0.0));
        assert!(!err.steps_to_solve().is_empty());
    }

    #[test]
    fn legacy_rails_need_equal_nodes() {
        let column = SatinColumn::from_polylines(vec![
            vec![Point::new(0.0, 0.0), Point::new(5.0, 0.0), Point::new(10.0, 0.0)],
            line(0.0, 4.0, 10.0, 4.0),
        ]);
        let err = column.validate().unwrap_err();
        assert!(matches!(err, ValidationError::UnequalPoints { .. }));
        assert_eq!(err.location(), Point::new(5.0, 0.0));
    }

    #[test]
    fn zig_zag_rung_crosses_too_often() {
        let column = SatinColumn::from_polylines(vec![
            line(0.0, 0.0, 20.0, 0.0),
            line(0.0, 4.0, 20.0, 4.0),
            line(2.0, -1.0, 2.0, 5.0),
            // Crosses rail 0 three times on its way over.
            vec![Point::new(10.0, -1.0), Point::new(12.0, 1.0), Point::new(14.0, -1.0), Point::new(14.0, 5.0)],
            line(18.0, -1.0, 18.0, 5.0),
        ]);
        let err = column.validate().unwrap_err();
        assert!(matches!(err, ValidationError::TooManyIntersections { .. }));
        assert_eq!(err.name(), "Rung intersects too many times");
    }

    #[test]
    fn rung_along_a_rail_crosses_too_often() {
        let column = SatinColumn::from_polylines(vec![
            line(0.0, 0.0, 20.0, 0.0),
            line(0.0, 4.0, 20.0, 4.0),
            line(2.0, -1.0, 2.0, 5.0),
            // Runs along rail 0 before turning across.
            vec![Point::new(8.0, 0.0), Point::new(12.0, 0.0), Point::new(12.0, 5.0)],
            line(18.0, -1.0, 18.0, 5.0),
        ]);
        assert_eq!(column.rail_indices(), &[0, 1]);
        let err = column.validate().unwrap_err();
        assert!(matches!(err, ValidationError::TooManyIntersections { .. }));
    }

    #[test]
    fn short_rung_is_a_warning() {
        let column = SatinColumn::from_polylines(vec![
            line(0.0, 0.0, 20.0, 0.0),
            line(0.0, 4.0, 20.0, 4.0),
            line(2.0, -1.0, 2.0, 5.0),
            line(6.0, -1.0, 6.0, 5.0),
            line(10.0, -1.0, 10.0, 2.0),
            line(18.0, -1.0, 18.0, 5.0),
        ]);
        let warnings = column.validate().unwrap();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].location(), Point::new(10.0, 0.5));
    }
}
