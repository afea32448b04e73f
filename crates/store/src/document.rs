use std::path::PathBuf;

use pawnforge_core::{FaultKind, JobId};
use serde::{Deserialize, Serialize};

/// Per-job file record: everything the cleanup agent needs to reclaim a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobFiles {
    pub id: JobId,
    /// Auxiliary include files materialized for the job.
    #[serde(default)]
    pub includes: Vec<PathBuf>,
    /// The persisted artifact, once placed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin: Option<PathBuf>,
    /// The job-scoped working directory, removed wholesale on cleanup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_dir: Option<PathBuf>,
}

impl JobFiles {
    #[must_use]
    pub fn new(id: JobId) -> Self {
        Self {
            id,
            includes: Vec::new(),
            plugin: None,
            job_dir: None,
        }
    }
}

/// Process-wide counters, persisted as one singleton record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateStatistics {
    /// Completed jobs, success or failure alike.
    pub total_compile_times: u64,
    /// Sum of elapsed compile seconds, kept as a 2-decimal string.
    pub total_compile_time: String,
}

impl Default for AggregateStatistics {
    fn default() -> Self {
        Self {
            total_compile_times: 0,
            total_compile_time: "0.00".to_string(),
        }
    }
}

/// Recoverable fault captured into the store's error log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaultRecord {
    pub kind: FaultKind,
    pub context: String,
    pub cause: String,
}

/// The whole on-disk document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub compiles: Vec<JobFiles>,
    #[serde(flatten)]
    pub statistics: AggregateStatistics,
    #[serde(default)]
    pub log_error: Vec<FaultRecord>,
}
