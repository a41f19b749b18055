//! Satin elements: a column plus the host-side data that travels with it.
//!
//! An element owns its raw parameters, colour and command markers. Turning
//! it into stitches goes through the cache, then validation, then
//! [`synthesize`], and finally stamps the element-wide flags (ties, trim,
//! stop) onto the resulting groups.

use std::collections::HashMap;

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::cache::{CacheKey, CacheKeyBuilder, StitchCache};
use crate::commands::{CommandKind, CommandLookup, CommandMarker};
use crate::geometry::{Affine, Point};
use crate::params::{ELEMENT_PARAMS, ElementParams, Layered, ParamReader, ParamSource, SATIN_PARAMS, SatinParams};
use crate::satin::{SatinColumn, Subpath, ValidationError, synthesize};
use crate::stitch::StitchGroup;

/// One satin column as found in the document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SatinElement {
    pub id: String,
    pub paths: Vec<Subpath>,
    /// Raw parameter strings, keyed by parameter name.
    pub params: HashMap<String, String>,
    /// Stroke colour, used as the thread colour.
    pub color: Option<String>,
    pub commands: Vec<CommandMarker>,
}

impl CommandLookup for SatinElement {
    fn commands(&self) -> &[CommandMarker] {
        &self.commands
    }
}

impl SatinElement {
    pub fn new(id: impl Into<String>, paths: Vec<Subpath>) -> Self {
        Self { id: id.into(), paths, ..Default::default() }
    }

    pub fn with_param(mut self, name: &str, value: impl Into<String>) -> Self {
        self.params.insert(name.to_string(), value.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn with_commands(mut self, commands: Vec<CommandMarker>) -> Self {
        self.commands = commands;
        self
    }

    /// Fill in any parameter this element doesn't set itself.
    pub fn apply_defaults(&mut self, defaults: &HashMap<String, String>) {
        let merged = {
            let layered = Layered { primary: &self.params, fallback: defaults };
            SATIN_PARAMS
                .iter()
                .chain(ELEMENT_PARAMS)
                .filter_map(|spec| layered.raw_param(spec.name).map(|v| (spec.name.to_string(), v)))
                .collect::<HashMap<_, _>>()
        };
        self.params.extend(merged);
    }

    pub fn satin_params(&self) -> SatinParams {
        SatinParams::resolve(&self.params)
    }

    pub fn element_params(&self) -> ElementParams {
        ElementParams::resolve(&self.params)
    }

    /// The satin column, with rails swapped if the element asks for it.
    pub fn column(&self) -> SatinColumn {
        SatinColumn::new(self.paths.clone()).with_swap_rails(self.satin_params().swap_rails)
    }

    /// A copy with all geometry mapped through `transform`.
    pub fn apply_transform(&self, transform: &Affine) -> SatinElement {
        let column = SatinColumn::new(self.paths.clone()).apply_transform(transform);
        let commands = self
            .commands
            .iter()
            .map(|c| CommandMarker { kind: c.kind, target: transform.apply(c.target) })
            .collect();
        SatinElement {
            paths: column.paths().to_vec(),
            commands,
            ..self.clone()
        }
    }

    /// Satin stitches never depend on where the previous element ended.
    pub fn uses_previous_stitch(&self) -> bool {
        false
    }

    /// Fingerprint of everything that can change this element's stitches.
    pub fn cache_key(&self, previous_stitch: Option<Point>) -> CacheKey {
        let reader = ParamReader::new(&self.params);
        let mut params = reader.values(SATIN_PARAMS);
        params.extend(reader.values(ELEMENT_PARAMS));

        let mut key = CacheKeyBuilder::new();
        key.update_str("SatinColumn").update_pairs(&params);
        for path in &self.paths {
            key.update_points(&path.nodes).update_points(&path.points);
        }
        key.update_str(self.color.as_deref().unwrap_or(""));
        key.update_opt_point(previous_stitch);
        for command in &self.commands {
            key.update_str(command.kind.name()).update_point(command.target);
        }
        key.finish()
    }

    /// Generate this element's stitch groups, reusing cached ones when possible.
    ///
    /// `previous` is the group sewn just before this one, if any.
    pub fn embroider(
        &self,
        cache: &dyn StitchCache,
        previous: Option<&StitchGroup>,
    ) -> Result<Vec<StitchGroup>, ValidationError> {
        debug!("starting {}", self.id);

        let previous_stitch = previous
            .and_then(StitchGroup::last_point)
            .filter(|_| self.uses_previous_stitch());
        let key = self.cache_key(previous_stitch);

        if let Some(groups) = cache.get(key).filter(|g| !g.is_empty()) {
            debug!("used cache for {}", self.id);
            return Ok(groups);
        }
        debug!("did not use cache for {}, key={}", self.id, key);

        let column = self.column();
        let mut groups = synthesize(&column, &self.satin_params())?;
        for warning in column.validation_warnings() {
            let at = warning.location();
            warn!("{}: {} (at {:.2}, {:.2})", self.id, warning, at.x, at.y);
        }

        let element = self.element_params();
        for group in &mut groups {
            group.color = self.color.clone();
            group.tie_mode = element.ties;
            group.force_lock_stitches = element.force_lock_stitches;
        }
        if let Some(last) = groups.last_mut() {
            last.trim_after = self.has_command(CommandKind::Trim) || element.trim_after;
            last.stop_after = self.has_command(CommandKind::Stop) || element.stop_after;
        }

        cache.put_if_absent(key, &groups);
        if previous_stitch.is_some() {
            // Also usable next time the previous stitch doesn't matter.
            cache.put_if_absent(self.cache_key(None), &groups);
        }

        debug!("ending {}", self.id);
        Ok(groups)
    }
}

/// Embroider every element in parallel.
///
/// Satins ignore the previous stitch, so elements are independent and can
/// be generated on the rayon pool. Results keep the input order.
pub fn embroider_all(
    elements: &[SatinElement],
    cache: &dyn StitchCache,
) -> Vec<Result<Vec<StitchGroup>, ValidationError>> {
    elements.par_iter().map(|element| element.embroider(cache, None)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::geometry::Polyline;
    use crate::stitch::TieMode;

    fn ladder_paths(length: f64, width: f64) -> Vec<Subpath> {
        let lines: Vec<Polyline> = vec![
            vec![Point::new(0.0, 0.0), Point::new(length, 0.0)],
            vec![Point::new(0.0, width), Point::new(length, width)],
            vec![Point::new(0.0, -1.0), Point::new(0.0, width + 1.0)],
            vec![Point::new(length, -1.0), Point::new(length, width + 1.0)],
        ];
        lines.into_iter().map(Subpath::from_points).collect()
    }

    #[test]
    fn flags_land_on_the_groups() {
        let element = SatinElement::new("satin1", ladder_paths(20.0, 6.0))
            .with_param("ties", "3")
            .with_param("force_lock_stitches", "true")
            .with_color("#ff0000")
            .with_commands(vec![CommandMarker { kind: CommandKind::Trim, target: Point::default() }]);

        let groups = element.embroider(&MemoryCache::new(), None).unwrap();
        let last = groups.last().unwrap();
        assert_eq!(last.color.as_deref(), Some("#ff0000"));
        assert_eq!(last.tie_mode, TieMode::Neither);
        assert!(last.force_lock_stitches);
        assert!(last.trim_after);
        assert!(!last.stop_after);
    }

    #[test]
    fn second_run_hits_the_cache() {
        let cache = MemoryCache::new();
        let element = SatinElement::new("satin1", ladder_paths(20.0, 6.0));

        let first = element.embroider(&cache, None).unwrap();
        assert_eq!(cache.len(), 1);
        let second = element.embroider(&cache, None).unwrap();
        assert_eq!(first, second);
        assert_eq!(cache.len(), 1);

        // The previous stitch doesn't matter to a satin.
        let previous = StitchGroup::from_points(None, &[Point::new(99.0, 99.0)], &[]);
        element.embroider(&cache, Some(&previous)).unwrap();
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn param_changes_change_the_key() {
        let element = SatinElement::new("satin1", ladder_paths(20.0, 6.0));
        let denser = element.clone().with_param("zigzag_spacing_mm", "0.2");
        assert_ne!(element.cache_key(None), denser.cache_key(None));

        // Explicit default value is the same as leaving it unset.
        let explicit = element.clone().with_param("zigzag_spacing_mm", "0.4");
        assert_eq!(element.cache_key(None), explicit.cache_key(None));
    }

    #[test]
    fn invalid_element_reports_error() {
        let element = SatinElement::new("broken", vec![Subpath::from_points(vec![Point::new(0.0, 0.0), Point::new(5.0, 0.0)])]);
        let err = element.embroider(&MemoryCache::new(), None).unwrap_err();
        assert!(matches!(err, ValidationError::TooFewPaths { .. }));
    }

    #[test]
    fn defaults_fill_gaps_only() {
        let mut element = SatinElement::new("satin1", ladder_paths(20.0, 6.0)).with_param("e_stitch", "true");
        let defaults: HashMap<String, String> = [("e_stitch", "false"), ("zigzag_spacing_mm", "1")]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        element.apply_defaults(&defaults);

        let params = element.satin_params();
        assert!(params.e_stitch);
        assert!((params.zigzag_spacing - crate::params::PIXELS_PER_MM).abs() < 1e-9);
    }

    #[test]
    fn parallel_results_keep_order() {
        let elements: Vec<SatinElement> = (1..=4)
            .map(|i| SatinElement::new(format!("s{}", i), ladder_paths(10.0 * i as f64, 5.0)))
            .collect();
        let results = embroider_all(&elements, &MemoryCache::new());
        assert_eq!(results.len(), 4);

        let ends: Vec<f64> = results
            .iter()
            .map(|r| r.as_ref().unwrap()[0].points().iter().map(|p| p.x).fold(0.0, f64::max))
            .collect();
        assert_eq!(ends, vec![10.0, 20.0, 30.0, 40.0]);
    }

    #[test]
    fn transform_moves_commands_too() {
        let element = SatinElement::new("satin1", ladder_paths(10.0, 5.0))
            .with_commands(vec![CommandMarker { kind: CommandKind::Stop, target: Point::new(1.0, 1.0) }]);
        let moved = element.apply_transform(&Affine::translate(10.0, 0.0));
        assert_eq!(moved.commands[0].target, Point::new(11.0, 1.0));
        assert_eq!(moved.paths[0].points[0], Point::new(10.0, 0.0));
    }
}
