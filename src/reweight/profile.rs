//! Pileup-truth profiles and where they come from.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

/// Bins at or above this index are rejected when reading a profile.
pub const MAX_PROFILE_BINS: usize = 10_000;

/// A binned pileup-truth distribution (bin `i` covers `[i, i + 1)`).
#[derive(Debug, Clone, PartialEq)]
pub struct PileupProfile {
    contents: Vec<f64>,
}

impl PileupProfile {
    pub fn new(contents: Vec<f64>) -> Result<Self, ConfigError> {
        if contents.is_empty() {
            return Err(ConfigError::Invalid("empty pileup profile".to_string()));
        }
        if contents.iter().any(|c| !c.is_finite() || *c < 0.0) {
            return Err(ConfigError::Invalid(
                "pileup profile contents must be finite and non-negative".to_string(),
            ));
        }
        if contents.iter().sum::<f64>() <= 0.0 {
            return Err(ConfigError::Invalid("pileup profile has zero area".to_string()));
        }
        Ok(Self { contents })
    }

    pub fn len(&self) -> usize {
        self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    /// Contents scaled to unit area.
    pub fn normalized(&self) -> Vec<f64> {
        let total: f64 = self.contents.iter().sum();
        self.contents.iter().map(|c| c / total).collect()
    }
}

/// Supplies the reference distributions a reweighter is built from.
pub trait ProfileSource {
    /// Data pileup profile recorded with `trigger` (normalized name).
    fn data_profile(&self, trigger: &str) -> Result<PileupProfile, ConfigError>;

    /// Simulated pileup profile of the dataset being processed.
    fn mc_profile(&self) -> Result<PileupProfile, ConfigError>;
}

/// Reads `pu_truth_data_<trigger>.csv` / `pu_truth_mc_<dataset>.csv` from a directory.
#[derive(Debug, Clone)]
pub struct CsvProfileSource {
    dir: PathBuf,
    dataset: String,
}

impl CsvProfileSource {
    pub fn new(dir: impl Into<PathBuf>, dataset: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            dataset: dataset.into(),
        }
    }

    pub fn data_path(&self, trigger: &str) -> PathBuf {
        self.dir.join(format!("pu_truth_data_{trigger}.csv"))
    }

    pub fn mc_path(&self) -> PathBuf {
        self.dir.join(format!("pu_truth_mc_{}.csv", self.dataset))
    }
}

impl ProfileSource for CsvProfileSource {
    fn data_profile(&self, trigger: &str) -> Result<PileupProfile, ConfigError> {
        read_profile_csv(&self.data_path(trigger))
    }

    fn mc_profile(&self) -> Result<PileupProfile, ConfigError> {
        read_profile_csv(&self.mc_path())
    }
}

#[derive(Debug, Deserialize)]
struct ProfileRow {
    bin: usize,
    content: f64,
}

/// Parse a `bin,content` CSV; missing bins are zero.
pub fn read_profile_csv(path: &Path) -> Result<PileupProfile, ConfigError> {
    let file = File::open(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(file);

    let mut bins = BTreeMap::new();
    for row in reader.deserialize::<ProfileRow>() {
        let row = row.map_err(|source| ConfigError::Profile {
            path: path.to_path_buf(),
            source,
        })?;
        if row.bin >= MAX_PROFILE_BINS {
            return Err(ConfigError::Invalid(format!(
                "{}: pileup bin {} is beyond the supported {MAX_PROFILE_BINS} bins",
                path.display(),
                row.bin
            )));
        }
        *bins.entry(row.bin).or_insert(0.0) += row.content;
    }

    let n = bins.keys().next_back().map(|&b| b + 1).unwrap_or(0);
    let mut contents = vec![0.0; n];
    for (bin, content) in bins {
        contents[bin] = content;
    }
    PileupProfile::new(contents).map_err(|e| ConfigError::Invalid(format!("{}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn csv_profile_fills_missing_bins_with_zero() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "bin,content").unwrap();
        writeln!(file, "# comment").unwrap();
        writeln!(file, "0, 1.0").unwrap();
        writeln!(file, "3, 3.0").unwrap();
        let profile = read_profile_csv(file.path()).unwrap();
        assert_eq!(profile.len(), 4);
        assert_eq!(profile.normalized(), vec![0.25, 0.0, 0.0, 0.75]);
    }

    #[test]
    fn out_of_range_bin_is_rejected_before_allocation() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "bin,content").unwrap();
        writeln!(file, "0,1.0").unwrap();
        writeln!(file, "4000000000,1.0").unwrap();
        let err = read_profile_csv(file.path()).unwrap_err();
        assert!(err.to_string().contains("4000000000"));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "bin,content").unwrap();
        writeln!(file, "{},1.0", MAX_PROFILE_BINS - 1).unwrap();
        assert_eq!(read_profile_csv(file.path()).unwrap().len(), MAX_PROFILE_BINS);
    }

    #[test]
    fn zero_area_profiles_are_rejected() {
        assert!(PileupProfile::new(vec![0.0, 0.0]).is_err());
        assert!(PileupProfile::new(vec![]).is_err());
        assert!(PileupProfile::new(vec![1.0, -1.0]).is_err());
    }

    #[test]
    fn file_names_follow_trigger_and_dataset() {
        let source = CsvProfileSource::new("/pu", "G_Pt_50to80");
        assert_eq!(
            source.data_path("HLT_Photon50"),
            PathBuf::from("/pu/pu_truth_data_HLT_Photon50.csv")
        );
        assert_eq!(source.mc_path(), PathBuf::from("/pu/pu_truth_mc_G_Pt_50to80.csv"));
    }
}
