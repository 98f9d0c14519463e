//! Mandatory-trigger resolution.
//!
//! Per event:
//! 1. pick the run's ordered list of `(pattern, [pt_min, pt_max), weight)`
//! 2. keep the *last* entry whose range contains the photon `pt`
//! 3. simulation accepts by construction; data must have fired the path

use crate::config::TriggerFile;
use crate::error::ConfigError;
use crate::trigger::pattern::{PathMatch, PathPattern};

/// One mandatory path with its photon-`pt` validity range.
#[derive(Debug, Clone)]
pub struct TriggerPathRange {
    pub pattern: PathPattern,
    pub pt_min: f64,
    /// `None` means unbounded.
    pub pt_max: Option<f64>,
    pub weight: f64,
}

impl TriggerPathRange {
    /// Half-open containment `[pt_min, pt_max)`.
    pub fn contains(&self, pt: f64) -> bool {
        pt >= self.pt_min && self.pt_max.is_none_or(|max| pt < max)
    }
}

#[derive(Debug, Clone)]
struct RunRange {
    first: u32,
    last: u32,
    paths: Vec<TriggerPathRange>,
}

/// Run-dependent mandatory path lists, loaded once.
#[derive(Debug, Clone)]
pub struct TriggerMap {
    runs: Vec<RunRange>,
}

impl TriggerMap {
    pub fn from_file(file: &TriggerFile) -> Result<Self, ConfigError> {
        let mut runs = Vec::with_capacity(file.runs.len());
        for entry in &file.runs {
            if entry.last < entry.first {
                return Err(ConfigError::Invalid(format!(
                    "run range {}..{} is reversed",
                    entry.first, entry.last
                )));
            }
            let mut paths = Vec::with_capacity(entry.paths.len());
            for p in &entry.paths {
                if let Some(max) = p.pt_max
                    && max <= p.pt_min
                {
                    return Err(ConfigError::Invalid(format!(
                        "trigger '{}' has an empty pt range [{}, {max})",
                        p.name, p.pt_min
                    )));
                }
                paths.push(TriggerPathRange {
                    pattern: PathPattern::compile(file.matcher, &p.name)?,
                    pt_min: p.pt_min,
                    pt_max: p.pt_max,
                    weight: p.weight,
                });
            }
            runs.push(RunRange {
                first: entry.first,
                last: entry.last,
                paths,
            });
        }

        if runs.iter().all(|r| r.paths.is_empty()) {
            return Err(ConfigError::NoTriggers);
        }
        Ok(Self { runs })
    }

    /// Paths for `run` (first covering run range), empty when uncovered.
    pub fn paths_for_run(&self, run: u32) -> &[TriggerPathRange] {
        self.runs
            .iter()
            .find(|r| run >= r.first && run <= r.last)
            .map(|r| r.paths.as_slice())
            .unwrap_or(&[])
    }
}

/// Outcome of resolving one event.
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerOutcome {
    /// `name` is the mandatory path's pattern text.
    Ok { name: String, weight: f64 },
    NotFound,
    /// Strict policy only: a configured path fired, but not the one whose range
    /// contains the photon.
    FoundButOutOfRange,
}

/// How a missing mandatory path on data is classified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResolutionPolicy {
    /// Any failure after a range was found is `NotFound`.
    #[default]
    Baseline,
    /// Distinguish "fired some other configured path" as `FoundButOutOfRange`.
    Strict,
}

#[derive(Debug, Clone)]
pub struct TriggerResolver {
    map: TriggerMap,
    policy: ResolutionPolicy,
}

impl TriggerResolver {
    pub fn new(map: TriggerMap, policy: ResolutionPolicy) -> Self {
        Self { map, policy }
    }

    pub fn map(&self) -> &TriggerMap {
        &self.map
    }

    /// The selected mandatory path for `(run, pt)`: last declared range wins.
    pub fn mandatory(&self, run: u32, pt: f64) -> Option<&TriggerPathRange> {
        self.map
            .paths_for_run(run)
            .iter()
            .rev()
            .find(|p| p.contains(pt))
    }

    pub fn resolve<'a, I>(&self, run: u32, pt: f64, fired: I, is_simulated: bool) -> TriggerOutcome
    where
        I: DoubleEndedIterator<Item = (&'a str, bool)> + Clone,
    {
        let Some(mandatory) = self.mandatory(run, pt) else {
            return TriggerOutcome::NotFound;
        };

        let accepted = TriggerOutcome::Ok {
            name: mandatory.pattern.pattern().to_string(),
            weight: mandatory.weight,
        };
        if is_simulated {
            return accepted;
        }

        // Most recently evaluated paths are stored last.
        let fired_mandatory = fired
            .clone()
            .rev()
            .filter(|(_, passed)| *passed)
            .any(|(name, _)| mandatory.pattern.matches(name));
        if fired_mandatory {
            return accepted;
        }

        match self.policy {
            ResolutionPolicy::Baseline => TriggerOutcome::NotFound,
            ResolutionPolicy::Strict => {
                let paths = self.map.paths_for_run(run);
                let fired_other = fired
                    .rev()
                    .filter(|(_, passed)| *passed)
                    .any(|(name, _)| paths.iter().any(|p| p.pattern.matches(name)));
                if fired_other {
                    TriggerOutcome::FoundButOutOfRange
                } else {
                    TriggerOutcome::NotFound
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MatcherKind, PathEntry, RunRangeEntry};

    fn path(name: &str, pt_min: f64, pt_max: Option<f64>) -> PathEntry {
        PathEntry {
            name: name.to_string(),
            pt_min,
            pt_max,
            weight: 1.0,
        }
    }

    fn resolver(policy: ResolutionPolicy) -> TriggerResolver {
        let file = TriggerFile {
            matcher: MatcherKind::Regex,
            runs: vec![RunRangeEntry {
                first: 1,
                last: 100,
                paths: vec![
                    path("A_v.*", 0.0, Some(100.0)),
                    path("B_v.*", 50.0, Some(150.0)),
                ],
            }],
        };
        TriggerResolver::new(TriggerMap::from_file(&file).unwrap(), policy)
    }

    fn fired(list: &[(&'static str, bool)]) -> impl DoubleEndedIterator<Item = (&'static str, bool)> + Clone {
        list.to_vec().into_iter()
    }

    #[test]
    fn later_declared_range_wins_on_overlap() {
        let r = resolver(ResolutionPolicy::Baseline);
        let out = r.resolve(5, 75.0, fired(&[]), true);
        assert_eq!(
            out,
            TriggerOutcome::Ok {
                name: "B_v.*".to_string(),
                weight: 1.0
            }
        );
        let out = r.resolve(5, 25.0, fired(&[]), true);
        assert!(matches!(out, TriggerOutcome::Ok { ref name, .. } if name == "A_v.*"));
    }

    #[test]
    fn uncovered_quantity_is_not_found() {
        let r = resolver(ResolutionPolicy::Baseline);
        assert_eq!(r.resolve(5, 200.0, fired(&[]), true), TriggerOutcome::NotFound);
    }

    #[test]
    fn uncovered_run_is_not_found() {
        let r = resolver(ResolutionPolicy::Baseline);
        assert_eq!(r.resolve(500, 75.0, fired(&[]), true), TriggerOutcome::NotFound);
    }

    #[test]
    fn data_requires_fired_matching_path() {
        let r = resolver(ResolutionPolicy::Baseline);
        let ok = r.resolve(5, 75.0, fired(&[("A_v1", true), ("B_v3", true)]), false);
        assert!(matches!(ok, TriggerOutcome::Ok { .. }));

        let not_fired = r.resolve(5, 75.0, fired(&[("B_v3", false)]), false);
        assert_eq!(not_fired, TriggerOutcome::NotFound);

        // A fired, but B is mandatory at 75: baseline folds this into NotFound.
        let other = r.resolve(5, 75.0, fired(&[("A_v1", true)]), false);
        assert_eq!(other, TriggerOutcome::NotFound);
    }

    #[test]
    fn strict_policy_separates_other_fired_paths() {
        let r = resolver(ResolutionPolicy::Strict);
        let other = r.resolve(5, 75.0, fired(&[("A_v1", true)]), false);
        assert_eq!(other, TriggerOutcome::FoundButOutOfRange);
        let none = r.resolve(5, 75.0, fired(&[("C_v1", true)]), false);
        assert_eq!(none, TriggerOutcome::NotFound);
    }

    #[test]
    fn ranges_are_half_open() {
        let r = resolver(ResolutionPolicy::Baseline);
        assert!(matches!(
            r.resolve(5, 150.0, fired(&[]), true),
            TriggerOutcome::NotFound
        ));
        assert!(matches!(
            r.resolve(5, 100.0, fired(&[]), true),
            TriggerOutcome::Ok { ref name, .. } if name == "B_v.*"
        ));
    }

    #[test]
    fn empty_mapping_is_rejected() {
        let file = TriggerFile {
            matcher: MatcherKind::Regex,
            runs: vec![RunRangeEntry {
                first: 1,
                last: 2,
                paths: vec![],
            }],
        };
        assert!(matches!(
            TriggerMap::from_file(&file),
            Err(ConfigError::NoTriggers)
        ));
    }
}
