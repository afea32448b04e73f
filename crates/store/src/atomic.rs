//! Atomic file writes so a crash never leaves a torn store document.

use std::path::Path;

use pawnforge_core::{Error, Result};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Replace the file at `path` with `content` in one step: the bytes land in
/// a sibling temp file first, then a rename swaps it into place.
pub async fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let parent = path.parent().ok_or_else(|| {
        Error::configuration("Invalid file path: no parent directory".to_string())
    })?;

    fs::create_dir_all(parent)
        .await
        .map_err(|e| Error::file_system(parent.to_path_buf(), "create parent directory", e))?;

    // The temp file must live on the same filesystem as the target for the
    // rename to stay atomic.
    let temp_name = format!(".{}.tmp", Uuid::new_v4());
    let temp_path = parent.join(&temp_name);

    let result = async {
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&temp_path)
            .await
            .map_err(|e| Error::file_system(&temp_path, "create temporary file", e))?;

        file.write_all(content)
            .await
            .map_err(|e| Error::file_system(&temp_path, "write to temporary file", e))?;

        file.sync_all()
            .await
            .map_err(|e| Error::file_system(&temp_path, "sync temporary file", e))?;

        Ok(())
    }
    .await;

    // A half-written temp file is garbage; drop it before reporting.
    if let Err(e) = result {
        let _ = fs::remove_file(&temp_path).await;
        return Err(e);
    }

    fs::rename(&temp_path, path).await.map_err(|e| {
        let temp = temp_path.clone();
        tokio::spawn(async move {
            let _ = fs::remove_file(&temp).await;
        });
        Error::file_system(path.to_path_buf(), "atomic rename", e)
    })?;

    Ok(())
}
