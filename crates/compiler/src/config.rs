use std::path::{Path, PathBuf};
use std::time::Duration;

use pawnforge_core::{
    Error, Result, BASE_DIR_ENV_VAR, COMPILER_ENV_VAR, DEFAULT_COMPILER_COMMAND,
    DEFAULT_STORE_FILE, JOBS_DIR_NAME, PLUGINS_DIR_NAME,
};
use serde::{Deserialize, Serialize};

/// Service configuration, loadable from a JSON file with environment
/// overrides for the base directory and compiler command.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root under which tool-chain versions, job directories, and the
    /// persistent plugins directory live.
    pub base_dir: PathBuf,
    /// Compiler executable; resolved via PATH unless an absolute path.
    pub compiler_command: String,
    /// Store document location; defaults to `<base_dir>/db.json`.
    pub store_path: Option<PathBuf>,
    /// Per-job compile timeout in seconds. `None` waits indefinitely, which
    /// matches the original service's behavior.
    pub compile_timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("amxx"),
            compiler_command: DEFAULT_COMPILER_COMMAND.to_string(),
            store_path: None,
            compile_timeout_secs: None,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .map_err(|e| Error::file_system(path.to_path_buf(), "read config file", e))?;
        let config = serde_json::from_slice(&bytes).map_err(|e| Error::Json {
            message: format!("config file at '{}' is invalid", path.display()),
            source: e,
        })?;
        Ok(config)
    }

    /// Load from `path` when given, otherwise start from defaults; then apply
    /// environment overrides.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::load(p)?,
            None => Self::default(),
        };
        if let Ok(base) = std::env::var(BASE_DIR_ENV_VAR) {
            config.base_dir = PathBuf::from(base);
        }
        if let Ok(command) = std::env::var(COMPILER_ENV_VAR) {
            config.compiler_command = command;
        }
        Ok(config)
    }

    /// Where placed artifacts persist.
    #[must_use]
    pub fn plugins_dir(&self) -> PathBuf {
        self.base_dir.join(PLUGINS_DIR_NAME)
    }

    /// Tool-chain directory for one runtime version.
    #[must_use]
    pub fn version_dir(&self, runtime_version: &str) -> PathBuf {
        self.base_dir.join(runtime_version)
    }

    /// Parent of all job-scoped working directories for a runtime version.
    #[must_use]
    pub fn jobs_dir(&self, runtime_version: &str) -> PathBuf {
        self.version_dir(runtime_version).join(JOBS_DIR_NAME)
    }

    /// Resolved store document path.
    #[must_use]
    pub fn store_path(&self) -> PathBuf {
        self.store_path
            .clone()
            .unwrap_or_else(|| self.base_dir.join(DEFAULT_STORE_FILE))
    }

    /// Per-job compile timeout, if configured.
    #[must_use]
    pub fn compile_timeout(&self) -> Option<Duration> {
        self.compile_timeout_secs.map(Duration::from_secs)
    }
}
