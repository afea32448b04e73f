//! Drives one external compiler process to completion.
//!
//! The compiler is launched with the source file name as its sole argument
//! and the job-scoped directory as its working directory. Standard output is
//! accumulated chunk by chunk; standard error is only logged because the
//! tool-chain does not reliably emit anything there. The exit code is carried
//! for reporting but never participates in outcome classification.

use std::process::Stdio;
use std::time::Instant;

use pawnforge_core::{CompileEvent, CompileJob, Error, EventBus, Result};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::config::Config;

/// What the driver observed from one compiler run.
#[derive(Debug, Clone)]
pub struct DriverReport {
    /// Exit code; `None` when the child died to a signal or the timeout.
    pub exit_code: Option<i32>,
    /// Full accumulated standard output.
    pub output: String,
    /// Wall time from spawn to exit, millisecond precision.
    pub elapsed_seconds: f64,
    /// The configured timeout expired and the child was killed.
    pub timed_out: bool,
}

/// Round to millisecond precision, mirroring the 3-decimal elapsed time the
/// service has always reported.
fn round_millis(seconds: f64) -> f64 {
    (seconds * 1000.0).round() / 1000.0
}

/// Run the compiler for `job` and report what happened. A spawn failure is
/// the only error path; everything the process itself does is data.
pub async fn run_compiler(job: &CompileJob, config: &Config, bus: &EventBus) -> Result<DriverReport> {
    tokio::fs::create_dir_all(&job.job_dir)
        .await
        .map_err(|e| Error::file_system(job.job_dir.clone(), "create job directory", e))?;

    let start = Instant::now();

    let mut child = Command::new(&config.compiler_command)
        .arg(&job.plugin_name)
        .current_dir(&job.job_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| {
            Error::compiler_spawn(config.compiler_command.clone(), job.runtime_version.clone(), e)
        })?;

    debug!(job_id = %job.id, pid = ?child.id(), "compiler spawned");

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| Error::configuration("compiler stdout was not captured".to_string()))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| Error::configuration("compiler stderr was not captured".to_string()))?;

    // The tool-chain is not known to use stderr; drain and log it so a
    // surprise never deadlocks the pipe.
    let job_id = job.id.clone();
    let stderr_task = tokio::spawn(async move {
        let mut lines = BufReader::new(stderr).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            warn!(job_id = %job_id, line = %line, "compiler stderr");
        }
    });

    // Raw bytes until EOF; a multi-byte code point can straddle a chunk
    // boundary, so decoding happens once at the end.
    let mut raw_output = Vec::new();
    let mut elapsed_seconds = 0.0_f64;

    let mut exit_code = None;
    let mut timed_out = false;
    {
        let run = async {
            let mut reader = BufReader::new(stdout);
            let mut buf = [0u8; 4096];
            loop {
                let n = reader
                    .read(&mut buf)
                    .await
                    .map_err(|e| Error::file_system(job.job_dir.clone(), "read compiler output", e))?;
                if n == 0 {
                    break;
                }
                raw_output.extend_from_slice(&buf[..n]);
                elapsed_seconds = round_millis(start.elapsed().as_secs_f64());
            }
            let status = child
                .wait()
                .await
                .map_err(|e| Error::file_system(job.job_dir.clone(), "wait for compiler", e))?;
            Ok::<_, Error>(status.code())
        };

        match config.compile_timeout() {
            Some(limit) => match timeout(limit, run).await {
                Ok(code) => exit_code = code?,
                Err(_) => timed_out = true,
            },
            None => exit_code = run.await?,
        }
    }

    if timed_out {
        warn!(job_id = %job.id, "compile timed out, killing compiler");
        if let Err(e) = child.kill().await {
            warn!(job_id = %job.id, error = %e, "failed to kill timed-out compiler");
        }
    }

    let _ = stderr_task.await;
    let output = String::from_utf8_lossy(&raw_output).into_owned();
    elapsed_seconds = round_millis(start.elapsed().as_secs_f64());

    // The child has fully exited by now, one way or the other.
    bus.publish(CompileEvent::ProcessExited {
        job_id: job.id.clone(),
        exit_code,
        staged_path: job.staged_artifact_path.clone(),
        artifact_path: job.artifact_path.clone(),
    });

    debug!(
        job_id = %job.id,
        exit_code = ?exit_code,
        elapsed_seconds,
        timed_out,
        "compiler finished"
    );

    Ok(DriverReport {
        exit_code,
        output,
        elapsed_seconds,
        timed_out,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_keeps_three_decimals() {
        assert_eq!(round_millis(1.23456), 1.235);
        assert_eq!(round_millis(0.0004), 0.0);
        assert_eq!(round_millis(2.0), 2.0);
    }
}
