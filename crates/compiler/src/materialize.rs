//! Writes submitted source text into the job's working directory.

use std::path::Path;

use pawnforge_core::{Error, Result};
use tokio::fs;

/// Write `content` verbatim to `path`, creating parent directories and
/// overwriting any existing file. Callers decide whether a failure is
/// propagated or reported as a fault event.
pub async fn materialize(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| Error::file_system(parent.to_path_buf(), "create job directory", e))?;
    }
    fs::write(path, content)
        .await
        .map_err(|e| Error::file_system(path.to_path_buf(), "write submitted file", e))
}
