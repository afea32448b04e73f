use std::path::PathBuf;

use clap::Subcommand;
use eyre::{eyre, WrapErr};
use pawnforge_compiler::{Compiler, Config, HashAlgorithm};
use pawnforge_core::{CompileStatus, JobId};
use tracing::info;

#[derive(Subcommand)]
pub enum Commands {
    /// Compile a plugin source file against a runtime version
    Compile {
        /// Path to the plugin source (.sma)
        #[arg(long)]
        source: PathBuf,

        /// Runtime version selecting the tool-chain variant
        #[arg(long)]
        runtime: String,

        /// Auxiliary include files materialized alongside the source
        #[arg(long = "include")]
        includes: Vec<PathBuf>,

        /// Keep the job's files instead of reclaiming them afterwards
        #[arg(long)]
        keep: bool,
    },

    /// Reclaim all files associated with a job id
    Cleanup {
        /// 40-character hex job id
        job_id: String,
    },

    /// Print a file's hex digest
    Hash {
        path: PathBuf,

        #[arg(long, default_value = "md5")]
        algorithm: String,
    },

    /// Print aggregate compile statistics
    Stats,
}

impl Commands {
    pub async fn execute(self, config: Config) -> eyre::Result<()> {
        match self {
            Commands::Compile {
                source,
                runtime,
                includes,
                keep,
            } => compile(config, source, runtime, includes, keep).await,
            Commands::Cleanup { job_id } => cleanup(config, &job_id).await,
            Commands::Hash { path, algorithm } => hash(path, &algorithm).await,
            Commands::Stats => stats(config).await,
        }
    }
}

async fn compile(
    config: Config,
    source: PathBuf,
    runtime: String,
    includes: Vec<PathBuf>,
    keep: bool,
) -> eyre::Result<()> {
    let plugin_name = source
        .file_name()
        .ok_or_else(|| eyre!("source path has no file name: '{}'", source.display()))?
        .to_string_lossy()
        .into_owned();
    let source_text = std::fs::read_to_string(&source)
        .wrap_err_with(|| format!("reading plugin source '{}'", source.display()))?;

    let compiler = Compiler::new(config).await?;
    let mut job = compiler.create_job(&plugin_name, &runtime);
    info!(job_id = %job.id, plugin = %plugin_name, runtime = %runtime, "job created");

    compiler.process_plugin(&job, &source_text).await;
    for include in &includes {
        let name = include
            .file_name()
            .ok_or_else(|| eyre!("include path has no file name: '{}'", include.display()))?
            .to_string_lossy()
            .into_owned();
        let content = std::fs::read_to_string(include)
            .wrap_err_with(|| format!("reading include '{}'", include.display()))?;
        compiler.process_include(&mut job, &name, &content).await;
    }

    let outcome = compiler.compile(&job).await?;

    println!("{}", outcome.output.trim_end());
    println!();
    println!("elapsed: {:.3}s", outcome.elapsed_seconds);

    let failed = match outcome.status {
        CompileStatus::Succeeded => {
            let artifact = outcome
                .artifact_path
                .as_deref()
                .ok_or_else(|| eyre!("successful compile reported no artifact"))?;
            println!("artifact: {}", artifact.display());
            for algorithm in [HashAlgorithm::Md5, HashAlgorithm::Sha1, HashAlgorithm::Sha256] {
                let digest = compiler.file_hash(artifact, algorithm).await?;
                println!("{algorithm}: {digest}");
            }
            false
        }
        CompileStatus::Failed => {
            println!("compile failed");
            true
        }
        CompileStatus::TimedOut => {
            println!("compile timed out");
            true
        }
    };

    if !keep {
        // Anonymous flow: reclaim the job's files and drop its record.
        compiler.cleanup(&job.id).await;
        compiler.store().remove_job(&job.id).await?;
    }

    if failed {
        std::process::exit(1);
    }
    Ok(())
}

async fn cleanup(config: Config, job_id: &str) -> eyre::Result<()> {
    let job_id: JobId = job_id.parse()?;
    let compiler = Compiler::new(config).await?;
    compiler.cleanup(&job_id).await;
    println!("cleanup requested for {job_id}");
    Ok(())
}

async fn hash(path: PathBuf, algorithm: &str) -> eyre::Result<()> {
    let algorithm: HashAlgorithm = algorithm.parse()?;
    let digest = pawnforge_compiler::hash::file_hash(&path, algorithm).await?;
    println!("{digest}");
    Ok(())
}

async fn stats(config: Config) -> eyre::Result<()> {
    let compiler = Compiler::new(config).await?;
    let stats = compiler.store().statistics().await;
    println!("total compiles: {}", stats.total_compile_times);
    println!("total compile time: {}s", stats.total_compile_time);
    Ok(())
}
