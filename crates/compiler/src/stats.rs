//! Aggregate statistics updates.
//!
//! Exactly once per completed job, success, failure, or timeout alike, and
//! always before the terminal event is published. There is no rollback: a
//! later placement fault does not revert the counters.

use pawnforge_core::Result;
use pawnforge_store::{AggregateStatistics, Store};

/// Fold one completed job into the persistent counters.
pub async fn record_completion(store: &Store, elapsed_seconds: f64) -> Result<AggregateStatistics> {
    store.record_completion(elapsed_seconds).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn counters_move_by_exactly_one_job() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path().join("db.json")).await.unwrap();

        let before = store.statistics().await;
        let after = record_completion(&store, 1.5).await.unwrap();

        assert_eq!(after.total_compile_times, before.total_compile_times + 1);
        assert_eq!(after.total_compile_time, "1.50");
    }
}
