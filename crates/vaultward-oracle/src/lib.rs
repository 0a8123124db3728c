//! Vaultward Oracle - client for the external decision service.
//!
//! The service speaks a responses-style HTTP protocol: one request per
//! cycle carrying the deployment's rules, the cycle's signals and context,
//! and a strict tool schema; the reply is either a structured decision or
//! a batch of tool calls. A second, optional turn feeds tool outputs back
//! for a human-readable summary.

pub mod client;
pub mod protocol;
pub mod schema;

pub use client::HttpDecisionOracle;
pub use protocol::{OracleReply, StructuredDecision};

use async_trait::async_trait;
use thiserror::Error;
use vaultward_types::{AugmentedSignals, ToolOutcome, VaultContext};

#[derive(Error, Debug)]
pub enum OracleError {
    /// The service answered outside 2xx; the raw body is kept verbatim.
    #[error("decision service HTTP {status}: {body}")]
    Protocol { status: u16, body: String },
    #[error("decision service transport: {0}")]
    Transport(String),
    /// The body came back 2xx but did not parse into the protocol shape.
    #[error("malformed decision payload: {0}")]
    Malformed(String),
}

pub type Result<T> = std::result::Result<T, OracleError>;

/// Everything one decision turn needs.
#[derive(Debug, Clone)]
pub struct DecisionRequest {
    /// The deployment's policy text, injected verbatim as instructions.
    pub rules: String,
    pub signals: AugmentedSignals,
    pub context: VaultContext,
}

/// Seam for the decision service, mockable in tests.
#[async_trait]
pub trait DecisionOracle: Send + Sync {
    /// One decision turn. Hard errors abort the cycle; retry happens only
    /// on the next scheduled tick.
    async fn decide(&self, request: &DecisionRequest) -> Result<OracleReply>;

    /// Follow-up turn feeding tool outputs back for a summary. Callers
    /// treat failure here as log-only, never fatal.
    async fn explain(&self, previous_response_id: &str, outcomes: &[ToolOutcome])
        -> Result<String>;
}
