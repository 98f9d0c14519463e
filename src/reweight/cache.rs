//! Per-trigger pileup reweighting with a lazily filled cache.

use std::collections::HashMap;

use crate::error::ConfigError;
use crate::reweight::profile::{PileupProfile, ProfileSource};

/// Ratio of normalized data and simulated pileup densities.
#[derive(Debug, Clone)]
pub struct PileupReweighter {
    weights: Vec<f64>,
}

impl PileupReweighter {
    pub fn new(data: &PileupProfile, mc: &PileupProfile) -> Self {
        let data = data.normalized();
        let mc = mc.normalized();
        let n = data.len().max(mc.len());
        let weights = (0..n)
            .map(|i| {
                let d = data.get(i).copied().unwrap_or(0.0);
                let m = mc.get(i).copied().unwrap_or(0.0);
                if m > 0.0 { d / m } else { 0.0 }
            })
            .collect();
        Self { weights }
    }

    /// Weight for a true-interaction count; zero outside the profiles.
    pub fn weight(&self, n_true: f64) -> f64 {
        if !(n_true.is_finite() && n_true >= 0.0) {
            return 0.0;
        }
        self.weights
            .get(n_true.floor() as usize)
            .copied()
            .unwrap_or(0.0)
    }
}

/// Stable cache key for a trigger pattern or fired path name.
///
/// Strips, in order: a trailing wildcard token (`.*` or `*`), a version suffix
/// (`_v<digits>` or a bare `_v`), and trailing underscores.
pub fn normalize_trigger_name(name: &str) -> String {
    let mut s = name.trim();
    s = s
        .strip_suffix(".*")
        .or_else(|| s.strip_suffix('*'))
        .unwrap_or(s);

    let without_digits = s.trim_end_matches(|c: char| c.is_ascii_digit());
    if let Some(stem) = without_digits.strip_suffix("_v") {
        s = stem;
    }
    s.trim_end_matches('_').to_string()
}

/// Lazily built reweighters keyed by normalized trigger name.
pub struct ReweightCache {
    enabled: bool,
    source: Box<dyn ProfileSource>,
    mc: Option<PileupProfile>,
    functions: HashMap<String, PileupReweighter>,
}

impl ReweightCache {
    pub fn new(enabled: bool, source: Box<dyn ProfileSource>) -> Self {
        Self {
            enabled,
            source,
            mc: None,
            functions: HashMap::new(),
        }
    }

    /// A cache that always answers 1.
    pub fn disabled() -> Self {
        Self::new(false, Box::new(NoProfiles))
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Number of reweighters built so far.
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Pileup weight for an event that passed `trigger`.
    pub fn weight(&mut self, trigger: &str, n_true: f64) -> Result<f64, ConfigError> {
        if !self.enabled {
            return Ok(1.0);
        }

        let key = normalize_trigger_name(trigger);
        if let Some(f) = self.functions.get(&key) {
            return Ok(f.weight(n_true));
        }

        let mc = match self.mc.take() {
            Some(mc) => mc,
            None => self.source.mc_profile()?,
        };
        let data = self.source.data_profile(&key);
        let f = data.map(|data| PileupReweighter::new(&data, &mc));
        self.mc = Some(mc);
        let f = f?;
        tracing::info!(trigger = %key, "built pileup reweighting profile");
        let w = f.weight(n_true);
        self.functions.insert(key, f);
        Ok(w)
    }
}

struct NoProfiles;

impl ProfileSource for NoProfiles {
    fn data_profile(&self, trigger: &str) -> Result<PileupProfile, ConfigError> {
        Err(ConfigError::Invalid(format!(
            "pileup reweighting is disabled (requested profile for {trigger})"
        )))
    }

    fn mc_profile(&self) -> Result<PileupProfile, ConfigError> {
        Err(ConfigError::Invalid("pileup reweighting is disabled".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Counts how many data profiles were requested.
    struct CountingSource {
        data_calls: Rc<Cell<usize>>,
    }

    impl ProfileSource for CountingSource {
        fn data_profile(&self, _trigger: &str) -> Result<PileupProfile, ConfigError> {
            self.data_calls.set(self.data_calls.get() + 1);
            PileupProfile::new(vec![1.0, 3.0])
        }

        fn mc_profile(&self) -> Result<PileupProfile, ConfigError> {
            PileupProfile::new(vec![1.0, 1.0])
        }
    }

    fn counting_cache(enabled: bool) -> (ReweightCache, Rc<Cell<usize>>) {
        let calls = Rc::new(Cell::new(0));
        let source = CountingSource {
            data_calls: Rc::clone(&calls),
        };
        (ReweightCache::new(enabled, Box::new(source)), calls)
    }

    #[test]
    fn normalization_strips_versions_and_wildcards() {
        assert_eq!(normalize_trigger_name("HLT_Photon50_v3"), "HLT_Photon50");
        assert_eq!(normalize_trigger_name("HLT_Photon50_v7"), "HLT_Photon50");
        assert_eq!(normalize_trigger_name("HLT_Photon50_v.*"), "HLT_Photon50");
        assert_eq!(normalize_trigger_name("HLT_Photon50_.*"), "HLT_Photon50");
        assert_eq!(normalize_trigger_name("HLT_Photon50_v*"), "HLT_Photon50");
        assert_eq!(normalize_trigger_name("HLT_Photon50"), "HLT_Photon50");
    }

    #[test]
    fn versions_share_one_cache_entry() {
        let (mut cache, calls) = counting_cache(true);
        let a = cache.weight("HLT_Photon50_v3", 1.0).unwrap();
        let b = cache.weight("HLT_Photon50_v7", 1.0).unwrap();
        assert_eq!(a, b);
        assert_eq!(calls.get(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn disabled_cache_returns_one_without_building() {
        let (mut cache, calls) = counting_cache(false);
        for n in [0.0, 5.0, 1e6] {
            assert_eq!(cache.weight("HLT_Photon50_v3", n).unwrap(), 1.0);
        }
        assert_eq!(calls.get(), 0);
        assert!(cache.is_empty());
    }

    #[test]
    fn reweighter_is_density_ratio() {
        let data = PileupProfile::new(vec![1.0, 3.0]).unwrap();
        let mc = PileupProfile::new(vec![1.0, 1.0]).unwrap();
        let f = PileupReweighter::new(&data, &mc);
        assert!((f.weight(0.5) - 0.5).abs() < 1e-12);
        assert!((f.weight(1.2) - 1.5).abs() < 1e-12);
        assert_eq!(f.weight(2.0), 0.0);
        assert_eq!(f.weight(-1.0), 0.0);
    }

    #[test]
    fn missing_profile_is_an_error() {
        let mut cache = ReweightCache::new(true, Box::new(NoProfiles));
        assert!(cache.weight("HLT_Photon50_v3", 1.0).is_err());
    }
}
