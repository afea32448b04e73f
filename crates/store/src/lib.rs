//! On-disk JSON document store for job file records and aggregate statistics.
//!
//! The document mirrors the wire shape collaborators expect: a `compiles`
//! array keyed by job id, the two singleton counters, and an error log. All
//! mutation is folded through one `tokio::sync::Mutex` and persisted
//! write-through with an atomic temp-file + rename, so concurrent
//! read-modify-write updates can never lose each other.

mod atomic;
mod document;

use std::path::{Path, PathBuf};

use pawnforge_core::{Error, FaultKind, JobId, Result};
use tokio::sync::Mutex;
use tracing::debug;

pub use document::{AggregateStatistics, Document, FaultRecord, JobFiles};

/// Single-writer JSON document store.
#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    inner: Mutex<Document>,
}

impl Store {
    /// Load the document at `path`, initializing it on first use.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let document = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| Error::Json {
                message: format!("store document at '{}' is corrupt", path.display()),
                source: e,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "initializing new store document");
                Document::default()
            }
            Err(e) => return Err(Error::file_system(path.clone(), "read store document", e)),
        };

        let store = Self {
            path,
            inner: Mutex::new(document),
        };
        // Write-through so the file exists even before the first mutation.
        {
            let doc = store.inner.lock().await;
            store.persist(&doc).await?;
        }
        Ok(store)
    }

    fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, document: &Document) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(document)?;
        atomic::write_atomic(self.path(), &bytes).await
    }

    /// Look up a job's file record.
    pub async fn find_job(&self, id: &JobId) -> Option<JobFiles> {
        let doc = self.inner.lock().await;
        doc.compiles.iter().find(|j| &j.id == id).cloned()
    }

    /// Insert or replace a job's file record.
    pub async fn upsert_job(&self, files: JobFiles) -> Result<()> {
        let mut doc = self.inner.lock().await;
        match doc.compiles.iter_mut().find(|j| j.id == files.id) {
            Some(existing) => *existing = files,
            None => doc.compiles.push(files),
        }
        self.persist(&doc).await
    }

    /// Record an include file against a job, creating the record if needed.
    pub async fn push_include(&self, id: &JobId, include: PathBuf) -> Result<()> {
        let mut doc = self.inner.lock().await;
        match doc.compiles.iter_mut().find(|j| &j.id == id) {
            Some(job) => job.includes.push(include),
            None => {
                let mut job = JobFiles::new(id.clone());
                job.includes.push(include);
                doc.compiles.push(job);
            }
        }
        self.persist(&doc).await
    }

    /// Record the placed artifact path against a job.
    pub async fn set_plugin_path(&self, id: &JobId, plugin: PathBuf) -> Result<()> {
        let mut doc = self.inner.lock().await;
        match doc.compiles.iter_mut().find(|j| &j.id == id) {
            Some(job) => job.plugin = Some(plugin),
            None => {
                let mut job = JobFiles::new(id.clone());
                job.plugin = Some(plugin);
                doc.compiles.push(job);
            }
        }
        self.persist(&doc).await
    }

    /// Drop a job's record entirely.
    pub async fn remove_job(&self, id: &JobId) -> Result<()> {
        let mut doc = self.inner.lock().await;
        doc.compiles.retain(|j| &j.id != id);
        self.persist(&doc).await
    }

    /// Fold one completed job into the aggregate counters: bump the compile
    /// count and add `elapsed_seconds` to the total, keeping the stored total
    /// as a fixed 2-decimal string. Runs for successes and failures alike.
    pub async fn record_completion(&self, elapsed_seconds: f64) -> Result<AggregateStatistics> {
        let mut doc = self.inner.lock().await;
        doc.statistics.total_compile_times += 1;
        let total: f64 = doc
            .statistics
            .total_compile_time
            .parse()
            .unwrap_or_default();
        doc.statistics.total_compile_time = format!("{:.2}", total + elapsed_seconds);
        self.persist(&doc).await?;
        Ok(doc.statistics.clone())
    }

    /// Current aggregate counters.
    pub async fn statistics(&self) -> AggregateStatistics {
        self.inner.lock().await.statistics.clone()
    }

    /// Append a recoverable fault to the persistent error log.
    pub async fn log_fault(
        &self,
        kind: FaultKind,
        context: impl Into<String>,
        cause: impl Into<String>,
    ) -> Result<()> {
        let mut doc = self.inner.lock().await;
        doc.log_error.push(FaultRecord {
            kind,
            context: context.into(),
            cause: cause.into(),
        });
        self.persist(&doc).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn open_store(dir: &TempDir) -> Store {
        Store::open(dir.path().join("db.json")).await.unwrap()
    }

    #[tokio::test]
    async fn open_initializes_document_on_disk() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;
        assert!(store.path().exists());

        let stats = store.statistics().await;
        assert_eq!(stats.total_compile_times, 0);
        assert_eq!(stats.total_compile_time, "0.00");
    }

    #[tokio::test]
    async fn job_records_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;
        let id = JobId::generate();

        let mut files = JobFiles::new(id.clone());
        files.includes.push(PathBuf::from("/tmp/a.inc"));
        store.upsert_job(files.clone()).await.unwrap();

        assert_eq!(store.find_job(&id).await, Some(files));

        store.remove_job(&id).await.unwrap();
        assert_eq!(store.find_job(&id).await, None);
    }

    #[tokio::test]
    async fn push_include_and_set_plugin_create_record() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;
        let id = JobId::generate();

        store
            .push_include(&id, PathBuf::from("/tmp/a.inc"))
            .await
            .unwrap();
        store
            .push_include(&id, PathBuf::from("/tmp/b.inc"))
            .await
            .unwrap();
        store
            .set_plugin_path(&id, PathBuf::from("/tmp/p.amxx"))
            .await
            .unwrap();

        let job = store.find_job(&id).await.unwrap();
        assert_eq!(job.includes.len(), 2);
        assert_eq!(job.plugin, Some(PathBuf::from("/tmp/p.amxx")));
    }

    #[tokio::test]
    async fn record_completion_accumulates_with_two_decimals() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        let stats = store.record_completion(1.234).await.unwrap();
        assert_eq!(stats.total_compile_times, 1);
        assert_eq!(stats.total_compile_time, "1.23");

        let stats = store.record_completion(0.5).await.unwrap();
        assert_eq!(stats.total_compile_times, 2);
        assert_eq!(stats.total_compile_time, "1.73");
    }

    #[tokio::test]
    async fn document_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db.json");

        let store = Store::open(&path).await.unwrap();
        let id = JobId::generate();
        store.upsert_job(JobFiles::new(id.clone())).await.unwrap();
        store.record_completion(2.0).await.unwrap();
        drop(store);

        let store = Store::open(&path).await.unwrap();
        assert!(store.find_job(&id).await.is_some());
        let stats = store.statistics().await;
        assert_eq!(stats.total_compile_times, 1);
        assert_eq!(stats.total_compile_time, "2.00");
    }

    #[tokio::test]
    async fn concurrent_completions_are_not_lost() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(open_store(&dir).await);

        let mut handles = Vec::new();
        for _ in 0..10 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.record_completion(0.10).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let stats = store.statistics().await;
        assert_eq!(stats.total_compile_times, 10);
        assert_eq!(stats.total_compile_time, "1.00");
    }

    #[tokio::test]
    async fn fault_log_appends() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        store
            .log_fault(FaultKind::DeleteFile, "deleting include", "not found")
            .await
            .unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("delete_file"));
        assert!(raw.contains("deleting include"));
    }
}
