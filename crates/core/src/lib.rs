//! Core domain types, errors, and events for pawnforge.
//!
//! Everything the other crates agree on lives here: the [`Error`] enum and
//! [`Result`] alias, the compile-job model ([`CompileJob`], [`CompileOutcome`]),
//! the broadcast [`EventBus`] used for cross-cutting notifications, and the
//! shared constants.

pub mod constants;
pub mod errors;
pub mod events;
pub mod job;

pub use self::{
    constants::*,
    errors::{Error, Result},
    events::{CompileEvent, EventBus, FaultKind},
    job::{CompileJob, CompileOutcome, CompileStatus, JobId},
};
