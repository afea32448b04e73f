//! Classifies compiler output and places the produced artifact.

use std::path::Path;

use pawnforge_core::{Error, Result, COMPILE_FAILED_MARKER};
use tokio::fs;
use tracing::debug;

/// A compile failed if and only if the captured output contains the literal
/// failure marker. Anything else, including an empty log, is a success; the
/// tool-chain's textual convention is the only available signal.
#[must_use]
pub fn is_failure(output: &str) -> bool {
    output.contains(COMPILE_FAILED_MARKER)
}

/// Move the staged artifact from the compiler's working directory to its
/// persistent destination. Not retried; the caller decides how to surface a
/// failure.
pub async fn place_artifact(staged: &Path, dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| Error::file_system(parent.to_path_buf(), "create plugins directory", e))?;
    }
    fs::rename(staged, dest)
        .await
        .map_err(|e| Error::file_system(staged.to_path_buf(), "move compiled artifact", e))?;
    debug!(from = %staged.display(), to = %dest.display(), "artifact placed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn marker_anywhere_in_output_means_failure() {
        assert!(is_failure("(compile failed)"));
        assert!(is_failure("3 errors\n\n(compile failed)\n"));
        assert!(is_failure("prefix (compile failed) suffix"));
    }

    #[test]
    fn everything_else_is_success() {
        assert!(!is_failure(""));
        assert!(!is_failure("Done."));
        assert!(!is_failure("compile failed")); // no parentheses, no marker
        assert!(!is_failure("Header size: 1234 bytes"));
    }

    #[tokio::test]
    async fn place_artifact_moves_file_and_creates_destination_dir() {
        let dir = TempDir::new().unwrap();
        let staged = dir.path().join("work").join("test.amxx");
        std::fs::create_dir_all(staged.parent().unwrap()).unwrap();
        std::fs::write(&staged, b"binary").unwrap();

        let dest = dir.path().join("plugins").join("abc.amxx");
        place_artifact(&staged, &dest).await.unwrap();

        assert!(!staged.exists());
        assert_eq!(std::fs::read(&dest).unwrap(), b"binary");
    }

    #[tokio::test]
    async fn place_artifact_surfaces_missing_source() {
        let dir = TempDir::new().unwrap();
        let staged = dir.path().join("missing.amxx");
        let dest = dir.path().join("plugins").join("abc.amxx");

        let result = place_artifact(&staged, &dest).await;
        assert!(matches!(result, Err(Error::FileSystem { .. })));
    }
}
