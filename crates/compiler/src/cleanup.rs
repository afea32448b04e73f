//! Reclaims every file associated with a completed or abandoned job.
//!
//! Cleanup is idempotent and never fails its caller: each deletion is an
//! independent outcome, and any failure is reported as a `delete_file` fault
//! event rather than returned. The job's database record is left to the
//! store's own lifecycle.

use std::path::Path;

use pawnforge_core::{EventBus, FaultKind, JobId};
use pawnforge_store::Store;
use tokio::fs;
use tracing::debug;

/// Delete all filesystem artifacts recorded for `job_id`. A missing record,
/// or files already gone, is a silent no-op.
pub async fn cleanup(store: &Store, bus: &EventBus, job_id: &JobId) {
    let Some(files) = store.find_job(job_id).await else {
        debug!(job_id = %job_id, "no file record for job, nothing to clean");
        return;
    };

    for include in &files.includes {
        remove_if_present(bus, store, include, "include").await;
    }

    if let Some(plugin) = &files.plugin {
        remove_if_present(bus, store, plugin, "plugin").await;
    }

    // The scoped working directory holds the source and any staged output;
    // removing it is best-effort and tolerates a directory already gone.
    if let Some(job_dir) = &files.job_dir {
        if let Err(e) = fs::remove_dir_all(job_dir).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                report(bus, store, format!("removing job directory '{}'", job_dir.display()), &e)
                    .await;
            }
        }
    }

    debug!(job_id = %job_id, "cleanup finished");
}

async fn remove_if_present(bus: &EventBus, store: &Store, path: &Path, what: &str) {
    match fs::try_exists(path).await {
        Ok(true) => {
            if let Err(e) = fs::remove_file(path).await {
                report(bus, store, format!("deleting {what} file '{}'", path.display()), &e).await;
            }
        }
        Ok(false) => {}
        Err(e) => {
            report(bus, store, format!("checking {what} file '{}'", path.display()), &e).await;
        }
    }
}

async fn report(bus: &EventBus, store: &Store, context: String, cause: &std::io::Error) {
    bus.fault(FaultKind::DeleteFile, context.clone(), cause);
    if let Err(e) = store
        .log_fault(FaultKind::DeleteFile, context, cause.to_string())
        .await
    {
        tracing::error!(error = %e, "failed to persist fault record");
    }
}
