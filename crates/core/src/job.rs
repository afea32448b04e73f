use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::constants::{ARTIFACT_EXTENSION, JOBS_DIR_NAME, PLUGINS_DIR_NAME};
use crate::errors::Error;

/// Number of random bytes in a job id; hex-encoding doubles the length.
const JOB_ID_BYTES: usize = 20;

/// Unique identifier for one compile attempt.
///
/// 160 bits of randomness, hex-encoded to 40 lowercase characters. The id
/// doubles as the persisted artifact's base name and as the cleanup key, so
/// collisions across concurrently live jobs must be overwhelmingly unlikely.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Generate a fresh random job id.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; JOB_ID_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for JobId {
    type Err = Error;

    /// Job ids arrive from untrusted callers (cleanup requests), so reject
    /// anything that is not exactly 40 lowercase hex characters.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let valid = s.len() == JOB_ID_BYTES * 2
            && s.bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if valid {
            Ok(Self(s.to_string()))
        } else {
            Err(Error::configuration(format!("invalid job id: '{s}'")))
        }
    }
}

/// One compile attempt: the submitted source, its includes, the selected
/// runtime version, and every path the pipeline touches on its behalf.
///
/// The working directory is scoped per job (`<base>/<version>/jobs/<id>`), so
/// two simultaneous jobs sharing a source file name and runtime version never
/// collide on the compiler's default output path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileJob {
    pub id: JobId,
    /// File name of the submitted source, e.g. `admin.sma`.
    pub plugin_name: String,
    /// Selects the tool-chain variant under the base directory.
    pub runtime_version: String,
    /// Per-job working directory the compiler runs in.
    pub job_dir: PathBuf,
    /// Where the submitted source is materialized.
    pub source_path: PathBuf,
    /// The compiler's default output location inside `job_dir`.
    pub staged_artifact_path: PathBuf,
    /// Persisted destination under `<base>/plugins/<id>.amxx`.
    pub artifact_path: PathBuf,
    /// Auxiliary files materialized alongside the source, owned by the job.
    pub include_paths: Vec<PathBuf>,
}

impl CompileJob {
    /// Create a job with a fresh id, deriving every path from the base
    /// directory, runtime version, and source file name.
    #[must_use]
    pub fn new(base_dir: &Path, plugin_name: &str, runtime_version: &str) -> Self {
        Self::with_id(JobId::generate(), base_dir, plugin_name, runtime_version)
    }

    #[must_use]
    pub fn with_id(
        id: JobId,
        base_dir: &Path,
        plugin_name: &str,
        runtime_version: &str,
    ) -> Self {
        let job_dir = base_dir
            .join(runtime_version)
            .join(JOBS_DIR_NAME)
            .join(id.as_str());
        let stem = Path::new(plugin_name)
            .file_stem()
            .map_or_else(|| plugin_name.to_string(), |s| s.to_string_lossy().into_owned());
        let staged_artifact_path = job_dir.join(format!("{stem}.{ARTIFACT_EXTENSION}"));
        let artifact_path = base_dir
            .join(PLUGINS_DIR_NAME)
            .join(format!("{id}.{ARTIFACT_EXTENSION}"));
        let source_path = job_dir.join(plugin_name);

        Self {
            id,
            plugin_name: plugin_name.to_string(),
            runtime_version: runtime_version.to_string(),
            job_dir,
            source_path,
            staged_artifact_path,
            artifact_path,
            include_paths: Vec::new(),
        }
    }
}

/// Terminal classification of a compile attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompileStatus {
    Succeeded,
    Failed,
    TimedOut,
}

/// Result of a completed compile attempt, returned directly to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileOutcome {
    pub status: CompileStatus,
    /// Exit code of the compiler process; `None` when killed by a signal or
    /// by the timeout. Never consulted for classification.
    pub exit_code: Option<i32>,
    /// Full accumulated compiler log.
    pub output: String,
    /// Wall time of the compiler run, rounded to millisecond precision.
    pub elapsed_seconds: f64,
    /// Populated only when `status` is `Succeeded`.
    pub artifact_path: Option<PathBuf>,
}

impl CompileOutcome {
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.status == CompileStatus::Succeeded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_id_is_40_lowercase_hex_chars() {
        let id = JobId::generate();
        assert_eq!(id.as_str().len(), 40);
        assert!(id
            .as_str()
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)));
    }

    #[test]
    fn consecutive_ids_differ() {
        assert_ne!(JobId::generate(), JobId::generate());
    }

    #[test]
    fn job_id_parse_rejects_bad_input() {
        assert!("".parse::<JobId>().is_err());
        assert!("xyz".parse::<JobId>().is_err());
        // Uppercase hex is not the canonical form
        assert!("A".repeat(40).parse::<JobId>().is_err());
        let good = "0123456789abcdef0123456789abcdef01234567";
        assert_eq!(good.parse::<JobId>().unwrap().as_str(), good);
    }

    #[test]
    fn job_paths_are_scoped_by_version_and_id() {
        let job = CompileJob::new(Path::new("/srv/amxx"), "admin.sma", "1.8.2");
        let id = job.id.as_str();
        assert_eq!(
            job.job_dir,
            Path::new("/srv/amxx").join("1.8.2").join("jobs").join(id)
        );
        assert_eq!(job.source_path, job.job_dir.join("admin.sma"));
        assert_eq!(job.staged_artifact_path, job.job_dir.join("admin.amxx"));
        assert_eq!(
            job.artifact_path,
            Path::new("/srv/amxx").join("plugins").join(format!("{id}.amxx"))
        );
    }

    #[test]
    fn two_jobs_with_same_source_never_share_paths() {
        let base = Path::new("/srv/amxx");
        let a = CompileJob::new(base, "admin.sma", "1.8.2");
        let b = CompileJob::new(base, "admin.sma", "1.8.2");
        assert_ne!(a.job_dir, b.job_dir);
        assert_ne!(a.staged_artifact_path, b.staged_artifact_path);
        assert_ne!(a.artifact_path, b.artifact_path);
    }
}
