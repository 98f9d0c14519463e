//! Configuration files and environment defaults.
//!
//! Three JSON resources feed a run:
//!
//! - the trigger mapping (run range -> mandatory paths), required
//! - the binning overrides, optional
//! - the external jet-energy correction table, optional
//!
//! Anything that fails to load here is a `ConfigError` and aborts the run before
//! the first event is read.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Environment variable naming the pileup profile directory.
pub const PU_DIR_ENV: &str = "GAMMAJET_PU_DIR";

const DEFAULT_PU_DIR: &str = "pileup";

/// Read and deserialize a JSON file.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let file = File::open(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolve the pileup directory: CLI value, else `GAMMAJET_PU_DIR` (`.env`
/// honoured), else `./pileup`.
pub fn resolve_pu_dir(cli_value: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = cli_value {
        return dir;
    }
    dotenvy::dotenv().ok();
    std::env::var_os(PU_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_PU_DIR))
}

/// How trigger-path patterns are compared with fired path names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatcherKind {
    Exact,
    Wildcard,
    #[default]
    Regex,
}

/// `triggers.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerFile {
    #[serde(default)]
    pub matcher: MatcherKind,
    pub runs: Vec<RunRangeEntry>,
}

/// Inclusive run interval and its ordered mandatory paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRangeEntry {
    pub first: u32,
    pub last: u32,
    pub paths: Vec<PathEntry>,
}

/// One mandatory path: pattern, `[pt_min, pt_max)` validity and nominal weight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathEntry {
    pub name: String,
    pub pt_min: f64,
    #[serde(default)]
    pub pt_max: Option<f64>,
    #[serde(default = "unit_weight")]
    pub weight: f64,
}

fn unit_weight() -> f64 {
    1.0
}

/// Optional binning overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BinningFile {
    #[serde(default)]
    pub pt: Option<Vec<f64>>,
    #[serde(default)]
    pub eta: Option<Vec<f64>>,
    /// One edge list per photon `pt` bin.
    #[serde(default)]
    pub extrapolation: Option<Vec<Vec<f64>>>,
    #[serde(default)]
    pub alpha_width: Option<f64>,
}

/// External jet-energy correction table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JecFile {
    /// Edges over `|eta|`.
    pub eta_edges: Vec<f64>,
    /// Relative/absolute scale, one per eta bin.
    pub scale: Vec<f64>,
    /// Pileup offset per unit of `rho * area`.
    #[serde(default)]
    pub offset_per_rho_area: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_file_defaults() {
        let json = r#"{
            "runs": [
                { "first": 1, "last": 10,
                  "paths": [ { "name": "HLT_Photon30_v.*", "pt_min": 40 } ] }
            ]
        }"#;
        let file: TriggerFile = serde_json::from_str(json).unwrap();
        assert_eq!(file.matcher, MatcherKind::Regex);
        let path = &file.runs[0].paths[0];
        assert_eq!(path.pt_max, None);
        assert_eq!(path.weight, 1.0);
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = load_json::<TriggerFile>(Path::new("/nonexistent/triggers.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn cli_pu_dir_wins() {
        let dir = resolve_pu_dir(Some(PathBuf::from("/tmp/pu")));
        assert_eq!(dir, PathBuf::from("/tmp/pu"));
    }
}
