//! Compile-job orchestration: drives the external `amxxpc` tool-chain against
//! a submitted plugin, classifies the textual outcome, places the produced
//! artifact, folds the job into the aggregate statistics, and reclaims job
//! files on request.

pub mod cleanup;
pub mod config;
pub mod driver;
pub mod hash;
pub mod materialize;
pub mod outcome;
pub mod pipeline;
pub mod stats;

pub use config::Config;
pub use driver::DriverReport;
pub use hash::HashAlgorithm;
pub use pipeline::Compiler;
