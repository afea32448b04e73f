//! Broadcast notifications for cross-cutting concerns.
//!
//! Compile results travel back to the caller as a return value; the bus only
//! carries what collaborators observe out-of-band: lifecycle progress,
//! recoverable fault reports, and cleanup triggers. Publishing with no live
//! subscriber is fine and intentionally silent.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

use crate::job::JobId;

/// Default buffer for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// Kind tag attached to recoverable fault reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    PluginFileSave,
    IncludeFileSave,
    DeleteFile,
    ArtifactMove,
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FaultKind::PluginFileSave => "plugin_file_save",
            FaultKind::IncludeFileSave => "include_file_save",
            FaultKind::DeleteFile => "delete_file",
            FaultKind::ArtifactMove => "artifact_move",
        };
        f.write_str(name)
    }
}

/// Everything the pipeline announces to the outside world.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CompileEvent {
    /// The compiler child process has fully exited, before classification.
    ProcessExited {
        job_id: JobId,
        exit_code: Option<i32>,
        staged_path: PathBuf,
        artifact_path: PathBuf,
    },
    /// Compile succeeded and the artifact was placed.
    Succeeded {
        job_id: JobId,
        plugin_name: String,
        artifact_path: PathBuf,
        output: String,
        elapsed_seconds: f64,
    },
    /// Compiler output carried the failure marker; nothing was placed.
    Failed {
        job_id: JobId,
        output: String,
        elapsed_seconds: f64,
    },
    /// The child exceeded the configured timeout and was killed.
    TimedOut { job_id: JobId, elapsed_seconds: f64 },
    /// A recoverable I/O failure that was reported rather than propagated.
    Fault {
        kind: FaultKind,
        context: String,
        cause: String,
    },
    /// Out-of-band request to reclaim a job's files.
    CleanupRequested { job_id: JobId },
}

/// Broadcast bus for [`CompileEvent`]s.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CompileEvent>,
}

impl EventBus {
    /// Create a bus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    pub fn publish(&self, event: CompileEvent) {
        // A send error only means nobody is listening right now.
        if self.sender.send(event).is_err() {
            debug!("event published with no subscribers");
        }
    }

    /// Report a recoverable fault.
    pub fn fault(&self, kind: FaultKind, context: impl Into<String>, cause: &dyn fmt::Display) {
        self.publish(CompileEvent::Fault {
            kind,
            context: context.into(),
            cause: cause.to_string(),
        });
    }

    /// Subscribe to all future events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CompileEvent> {
        self.sender.subscribe()
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
