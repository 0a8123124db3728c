//! Vaultward Engine - the per-cycle orchestration loop.
//!
//! One cooperative loop drives everything: snapshot the module context,
//! detect deposits, augment signals, ask the decision oracle, gate every
//! tool call, execute what survives, feed outcomes back for a summary,
//! then reconcile and reschedule from the tail of the cycle. A cycle that
//! fails is logged and retried on the next tick; only the configured
//! cycle limit stops the loop.

pub mod config;
pub mod engine;

pub use config::EngineConfig;
pub use engine::{CycleReport, Engine};

use thiserror::Error;
use vaultward_chain::{ChainError, SubmitError};
use vaultward_oracle::OracleError;
use vaultward_types::StateError;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Chain(#[from] ChainError),
    #[error(transparent)]
    Submit(#[from] SubmitError),
    #[error(transparent)]
    Oracle(#[from] OracleError),
    #[error(transparent)]
    State(#[from] StateError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
