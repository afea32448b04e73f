//! The compile pipeline: materialize, drive, classify, place, account.

use std::path::Path;
use std::sync::Arc;

use pawnforge_core::{
    CompileEvent, CompileJob, CompileOutcome, CompileStatus, Error, EventBus, FaultKind, JobId,
    Result,
};
use pawnforge_store::{JobFiles, Store};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::{cleanup, config::Config, driver, hash, materialize, outcome, stats};

/// Orchestrates compile jobs end to end.
///
/// Each compile invocation returns a structured [`CompileOutcome`]; the
/// [`EventBus`] carries only cross-cutting notifications (fault reports,
/// lifecycle events, and out-of-band cleanup requests), so nothing in the
/// result path depends on a subscriber being attached.
pub struct Compiler {
    config: Config,
    store: Arc<Store>,
    bus: EventBus,
}

impl Compiler {
    /// Open the store at the configured path and build a pipeline around it.
    pub async fn new(config: Config) -> Result<Self> {
        let store = Arc::new(Store::open(config.store_path()).await?);
        Ok(Self::with_store(config, store))
    }

    #[must_use]
    pub fn with_store(config: Config, store: Arc<Store>) -> Self {
        Self {
            config,
            store,
            bus: EventBus::default(),
        }
    }

    #[must_use]
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    #[must_use]
    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Create a job with a fresh unique id for a submitted source file.
    #[must_use]
    pub fn create_job(&self, plugin_name: &str, runtime_version: &str) -> CompileJob {
        CompileJob::new(&self.config.base_dir, plugin_name, runtime_version)
    }

    /// Materialize the submitted plugin source under the job directory.
    ///
    /// Fire-and-forget: a write failure is reported as a `plugin_file_save`
    /// fault and logged, never returned.
    pub async fn process_plugin(&self, job: &CompileJob, source: &str) {
        self.ensure_job_record(job).await;
        if let Err(e) = materialize::materialize(&job.source_path, source).await {
            self.report_fault(
                FaultKind::PluginFileSave,
                format!("saving plugin source '{}'", job.source_path.display()),
                &e,
            )
            .await;
        }
    }

    /// Materialize one auxiliary include under the job directory and record
    /// it against the job, under the same fire-and-forget contract.
    pub async fn process_include(&self, job: &mut CompileJob, name: &str, content: &str) {
        self.ensure_job_record(job).await;
        let path = job.job_dir.join(name);
        if let Err(e) = materialize::materialize(&path, content).await {
            self.report_fault(
                FaultKind::IncludeFileSave,
                format!("saving custom include '{}'", path.display()),
                &e,
            )
            .await;
            return;
        }
        job.include_paths.push(path.clone());
        if let Err(e) = self.store.push_include(&job.id, path).await {
            error!(job_id = %job.id, error = %e, "failed to record include in store");
        }
    }

    /// Run the compile pipeline for a materialized job.
    ///
    /// The statistics update runs exactly once for every completed job, on
    /// success, failure, and timeout alike, and always before the terminal
    /// event is published. A spawn failure propagates without touching the
    /// counters: the job never completed.
    pub async fn compile(&self, job: &CompileJob) -> Result<CompileOutcome> {
        let report = driver::run_compiler(job, &self.config, &self.bus).await?;

        let status = if report.timed_out {
            CompileStatus::TimedOut
        } else if outcome::is_failure(&report.output) {
            CompileStatus::Failed
        } else {
            CompileStatus::Succeeded
        };

        let mut artifact_path = None;
        let mut placement_fault = None;
        if status == CompileStatus::Succeeded {
            match outcome::place_artifact(&job.staged_artifact_path, &job.artifact_path).await {
                Ok(()) => {
                    artifact_path = Some(job.artifact_path.clone());
                    if let Err(e) = self
                        .store
                        .set_plugin_path(&job.id, job.artifact_path.clone())
                        .await
                    {
                        error!(job_id = %job.id, error = %e, "failed to record artifact in store");
                    }
                }
                Err(e) => {
                    self.report_fault(
                        FaultKind::ArtifactMove,
                        format!(
                            "moving artifact '{}' to '{}'",
                            job.staged_artifact_path.display(),
                            job.artifact_path.display()
                        ),
                        &e,
                    )
                    .await;
                    placement_fault = Some(e);
                }
            }
        }

        // Counters move regardless of outcome, and are never rolled back.
        if let Err(e) = stats::record_completion(&self.store, report.elapsed_seconds).await {
            error!(job_id = %job.id, error = %e, "failed to update aggregate statistics");
        }

        if let Some(e) = placement_fault {
            // The compile itself succeeded but the artifact is not where the
            // caller was promised; surface the move fault instead of a
            // success event.
            return Err(e);
        }

        match status {
            CompileStatus::Succeeded => {
                info!(job_id = %job.id, elapsed = report.elapsed_seconds, "compile succeeded");
                self.bus.publish(CompileEvent::Succeeded {
                    job_id: job.id.clone(),
                    plugin_name: job.plugin_name.clone(),
                    artifact_path: job.artifact_path.clone(),
                    output: report.output.clone(),
                    elapsed_seconds: report.elapsed_seconds,
                });
            }
            CompileStatus::Failed => {
                info!(job_id = %job.id, elapsed = report.elapsed_seconds, "compile failed");
                self.bus.publish(CompileEvent::Failed {
                    job_id: job.id.clone(),
                    output: report.output.clone(),
                    elapsed_seconds: report.elapsed_seconds,
                });
            }
            CompileStatus::TimedOut => {
                info!(job_id = %job.id, elapsed = report.elapsed_seconds, "compile timed out");
                self.bus.publish(CompileEvent::TimedOut {
                    job_id: job.id.clone(),
                    elapsed_seconds: report.elapsed_seconds,
                });
            }
        }

        Ok(CompileOutcome {
            status,
            exit_code: report.exit_code,
            output: report.output,
            elapsed_seconds: report.elapsed_seconds,
            artifact_path,
        })
    }

    /// Reclaim all files associated with a job. Idempotent, never fails the
    /// caller.
    pub async fn cleanup(&self, job_id: &JobId) {
        cleanup::cleanup(&self.store, &self.bus, job_id).await;
    }

    /// Service out-of-band `CleanupRequested` events from the bus until the
    /// pipeline is dropped.
    pub fn spawn_cleanup_listener(self: &Arc<Self>) -> JoinHandle<()> {
        let pipeline = Arc::clone(self);
        let mut rx = self.bus.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(CompileEvent::CleanupRequested { job_id }) => {
                        pipeline.cleanup(&job_id).await;
                    }
                    Ok(_) => {}
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        error!(skipped, "cleanup listener lagged behind the event bus");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    /// Hex digest of a file's contents, streamed.
    pub async fn file_hash(&self, path: &Path, algorithm: hash::HashAlgorithm) -> Result<String> {
        hash::file_hash(path, algorithm).await
    }

    async fn ensure_job_record(&self, job: &CompileJob) {
        if self.store.find_job(&job.id).await.is_none() {
            let mut files = JobFiles::new(job.id.clone());
            files.job_dir = Some(job.job_dir.clone());
            if let Err(e) = self.store.upsert_job(files).await {
                error!(job_id = %job.id, error = %e, "failed to create job record");
            }
        }
    }

    async fn report_fault(&self, kind: FaultKind, context: String, cause: &Error) {
        error!(kind = %kind, context = %context, cause = %cause, "recoverable fault");
        self.bus.fault(kind, context.clone(), cause);
        if let Err(e) = self.store.log_fault(kind, context, cause.to_string()).await {
            error!(error = %e, "failed to persist fault record");
        }
    }
}
