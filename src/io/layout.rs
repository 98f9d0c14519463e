//! On-disk layout of one input directory.
//!
//! ```text
//! <input>/
//!   analysis.jsonl  photon.jsonl  photon_gen.jsonl  meta.json
//!   <postfix>/
//!     first_jet.jsonl  first_jet_raw.jsonl  first_jet_gen.jsonl
//!     second_jet.jsonl second_jet_raw.jsonl second_jet_gen.jsonl
//!     met.jsonl        met_raw.jsonl        met_gen.jsonl
//!     misc.jsonl
//! ```

use std::path::{Path, PathBuf};

pub const ANALYSIS: &str = "analysis";
pub const PHOTON: &str = "photon";
pub const PHOTON_GEN: &str = "photon_gen";
pub const FIRST_JET: &str = "first_jet";
pub const FIRST_JET_RAW: &str = "first_jet_raw";
pub const FIRST_JET_GEN: &str = "first_jet_gen";
pub const SECOND_JET: &str = "second_jet";
pub const SECOND_JET_RAW: &str = "second_jet_raw";
pub const SECOND_JET_GEN: &str = "second_jet_gen";
pub const MET: &str = "met";
pub const MET_RAW: &str = "met_raw";
pub const MET_GEN: &str = "met_gen";
pub const MISC: &str = "misc";

const EVENT_LEVEL: [&str; 3] = [ANALYSIS, PHOTON, PHOTON_GEN];

/// Streams every input must provide.
pub const REQUIRED_STREAMS: [&str; 9] = [
    ANALYSIS,
    PHOTON,
    FIRST_JET,
    FIRST_JET_RAW,
    SECOND_JET,
    SECOND_JET_RAW,
    MET,
    MET_RAW,
    MISC,
];

/// Simulated-truth streams, absent on real data.
pub const TRUTH_STREAMS: [&str; 4] = [PHOTON_GEN, FIRST_JET_GEN, SECOND_JET_GEN, MET_GEN];

pub const META_FILE: &str = "meta.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputLayout {
    root: PathBuf,
    postfix: String,
}

impl InputLayout {
    pub fn new(root: impl Into<PathBuf>, postfix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            postfix: postfix.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the per-jet-configuration streams.
    pub fn jet_dir(&self) -> PathBuf {
        self.root.join(&self.postfix)
    }

    pub fn stream(&self, name: &str) -> PathBuf {
        let file = format!("{name}.jsonl");
        if EVENT_LEVEL.contains(&name) {
            self.root.join(file)
        } else {
            self.jet_dir().join(file)
        }
    }

    pub fn meta(&self) -> PathBuf {
        self.root.join(META_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jet_streams_live_under_the_postfix() {
        let layout = InputLayout::new("/data/run1", "PFlowAK5chs");
        assert_eq!(layout.stream(ANALYSIS), PathBuf::from("/data/run1/analysis.jsonl"));
        assert_eq!(layout.stream(PHOTON_GEN), PathBuf::from("/data/run1/photon_gen.jsonl"));
        assert_eq!(
            layout.stream(FIRST_JET_RAW),
            PathBuf::from("/data/run1/PFlowAK5chs/first_jet_raw.jsonl")
        );
        assert_eq!(layout.meta(), PathBuf::from("/data/run1/meta.json"));
    }
}
