//! Input discovery and validation.
//!
//! Every input directory is checked before the event loop:
//!
//! - the directory and every required stream exist
//! - the `analysis` stream is not empty
//! - all present streams hold the same number of records
//!
//! Inputs failing a check are excluded (and reported); the run only aborts when
//! nothing remains. Checks are independent per input, so they run in parallel.

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::Deserialize;

use crate::error::AppError;
use crate::io::layout::{ANALYSIS, InputLayout, REQUIRED_STREAMS, TRUTH_STREAMS};
use crate::io::stream::count_records;

/// An input that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedInput {
    pub layout: InputLayout,
    pub entries: usize,
    /// Which truth streams exist, in `TRUTH_STREAMS` order.
    pub truth: [bool; 4],
    pub luminosity: Option<f64>,
}

impl ValidatedInput {
    pub fn has_truth(&self, stream: &str) -> bool {
        TRUTH_STREAMS
            .iter()
            .position(|s| *s == stream)
            .is_some_and(|i| self.truth[i])
    }
}

/// Why an input was excluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputError {
    pub root: PathBuf,
    pub message: String,
}

#[derive(Debug, Deserialize)]
struct InputMeta {
    #[serde(default)]
    total_luminosity: Option<f64>,
}

/// Read an input list file: one path per line, blanks and `#` comments ignored.
pub fn read_input_list(path: &Path) -> Result<Vec<PathBuf>, AppError> {
    let text = fs::read_to_string(path)
        .map_err(|e| AppError::config(format!("Failed to read input list '{}': {e}", path.display())))?;
    let inputs: Vec<PathBuf> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(PathBuf::from)
        .collect();
    if inputs.is_empty() {
        return Err(AppError::config(format!(
            "Input list '{}' names no inputs",
            path.display()
        )));
    }
    Ok(inputs)
}

/// Validate every input; order of the accepted inputs is preserved.
pub fn validate_inputs(roots: &[PathBuf], postfix: &str) -> (Vec<ValidatedInput>, Vec<InputError>) {
    let results: Vec<Result<ValidatedInput, InputError>> = roots
        .par_iter()
        .map(|root| validate_input(InputLayout::new(root.clone(), postfix)))
        .collect();

    let mut ok = Vec::new();
    let mut errors = Vec::new();
    for r in results {
        match r {
            Ok(v) => ok.push(v),
            Err(e) => errors.push(e),
        }
    }
    (ok, errors)
}

fn validate_input(layout: InputLayout) -> Result<ValidatedInput, InputError> {
    let fail = |message: String| InputError {
        root: layout.root().to_path_buf(),
        message,
    };

    if !layout.root().is_dir() {
        return Err(fail("not a readable directory".to_string()));
    }

    let mut entries = None;
    let mut check = |name: &str| -> Result<(), InputError> {
        let path = layout.stream(name);
        let n = count_records(&path).map_err(|e| fail(format!("stream '{name}': {e}")))?;
        match entries {
            None => {
                if n == 0 {
                    return Err(fail(format!("stream '{name}' is empty")));
                }
                entries = Some(n);
            }
            Some(expected) if expected != n => {
                return Err(fail(format!(
                    "stream '{name}' has {n} records, '{ANALYSIS}' has {expected}"
                )));
            }
            Some(_) => {}
        }
        Ok(())
    };

    // `analysis` comes first in the list, so it sets the expected length.
    for name in REQUIRED_STREAMS {
        check(name)?;
    }
    let mut truth = [false; 4];
    for (i, name) in TRUTH_STREAMS.iter().enumerate() {
        if layout.stream(name).is_file() {
            check(name)?;
            truth[i] = true;
        }
    }
    let entries = entries.unwrap_or(0);

    let luminosity = read_meta(&layout).map_err(fail)?;

    Ok(ValidatedInput {
        layout,
        entries,
        truth,
        luminosity,
    })
}

fn read_meta(layout: &InputLayout) -> Result<Option<f64>, String> {
    let path = layout.meta();
    if !path.is_file() {
        return Ok(None);
    }
    let text = fs::read_to_string(&path).map_err(|e| format!("meta.json: {e}"))?;
    let meta: InputMeta = serde_json::from_str(&text).map_err(|e| format!("meta.json: {e}"))?;
    Ok(meta.total_luminosity)
}
