use std::path::PathBuf;

use thiserror::Error;

/// Exit code for command-line usage errors.
pub const EXIT_USAGE: u8 = 1;
/// Exit code for configuration and input errors.
pub const EXIT_CONFIG: u8 = 2;
/// Exit code for failures while writing results.
pub const EXIT_OUTPUT: u8 = 4;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(EXIT_CONFIG, message)
    }

    pub fn output(message: impl Into<String>) -> Self {
        Self::new(EXIT_OUTPUT, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Problems with one of the JSON/CSV configuration resources.
///
/// All of these are fatal for a run: they are detected before the event loop
/// (or, for pileup profiles, the first time a trigger needs one).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to parse pileup profile '{path}': {source}")]
    Profile {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("invalid trigger pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("no mandatory trigger definitions loaded")]
    NoTriggers,

    #[error("invalid {axis} binning: {reason}")]
    Binning { axis: &'static str, reason: String },

    #[error("{0}")]
    Invalid(String),
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::config(err.to_string())
    }
}
