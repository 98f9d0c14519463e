//! Splitting the event index space across batch jobs.

use serde::Serialize;

use crate::error::ConfigError;

/// Half-open event index range `[from, to)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EventRange {
    pub from: usize,
    pub to: usize,
}

impl EventRange {
    pub fn all(total: usize) -> Self {
        Self { from: 0, to: total }
    }

    /// Slice `job` of `jobs`; the last job also takes the remainder.
    pub fn for_job(total: usize, job: usize, jobs: usize) -> Result<Self, ConfigError> {
        if jobs == 0 || job >= jobs {
            return Err(ConfigError::Invalid(format!(
                "job index {job} is out of range for {jobs} jobs"
            )));
        }
        let per = total / jobs;
        let from = job * per;
        let to = if job == jobs - 1 { total } else { (job + 1) * per };
        Ok(Self { from, to })
    }

    pub fn len(&self) -> usize {
        self.to.saturating_sub(self.from)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
