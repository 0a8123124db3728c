//! Per-deployment agent state machine.

use crate::U256;
use alloy_primitives::{Address, B256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("cycle limit {0} reached")]
    CycleLimitReached(u32),
}

/// Receipt handle for a bonded proposal awaiting its dispute window.
///
/// Owned exclusively by the policy gate once created; mutated only by
/// confirmation or expiry reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalSubmission {
    pub proposal_id: B256,
    /// Hash of the submission transaction, for receipt lookups.
    pub tx: B256,
    #[serde(with = "crate::u256dec")]
    pub bond_amount: U256,
    pub collateral_asset: Address,
    pub oracle_address: Address,
    pub submitted_at: DateTime<Utc>,
}

/// Mutable per-deployment record.
///
/// Invariants: at most one unconfirmed proposal at any time, and step flags
/// reset together on confirmation or detected failure/expiry. Action
/// ordering is enforced by the policy gate before anything is sent;
/// recording an outcome afterwards always succeeds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentState {
    pub deposit_confirmed: bool,
    pub proposal_built: bool,
    pub proposal_posted: bool,
    pub cycle: u32,
    pub max_cycles: u32,
    pub pending_proposal: Option<ProposalSubmission>,
    /// Timestamp of the anchoring deposit, used by relative triggers.
    pub deposit_confirmed_at: Option<DateTime<Utc>>,
    /// Triggers that have already fired; an emit-once trigger never refires.
    pub fired_triggers: BTreeSet<String>,
}

impl AgentState {
    pub fn new(max_cycles: u32) -> Self {
        Self {
            max_cycles,
            ..Self::default()
        }
    }

    pub fn proposal_pending(&self) -> bool {
        self.pending_proposal.is_some()
    }

    pub fn begin_cycle(&mut self) -> Result<u32, StateError> {
        if self.max_cycles > 0 && self.cycle >= self.max_cycles {
            return Err(StateError::CycleLimitReached(self.max_cycles));
        }
        self.cycle += 1;
        Ok(self.cycle)
    }

    pub fn confirm_deposit(&mut self, at: DateTime<Utc>) {
        if !self.deposit_confirmed {
            self.deposit_confirmed = true;
            self.deposit_confirmed_at = Some(at);
        }
    }

    /// Record a proposal that is already live on-chain.
    ///
    /// Infallible by design: the submission transaction has gone out, so
    /// the step flags and the pending record are forced to match chain
    /// reality. Ordering is enforced before submission, by the gate.
    pub fn record_posted_proposal(&mut self, submission: ProposalSubmission) {
        self.proposal_built = true;
        self.proposal_posted = true;
        self.pending_proposal = Some(submission);
    }

    /// Full reset on confirmation or on detected failure/expiry.
    ///
    /// Partial resets are forbidden: all step flags and the pending
    /// submission clear together.
    pub fn reset_steps(&mut self) {
        self.deposit_confirmed = false;
        self.proposal_built = false;
        self.proposal_posted = false;
        self.deposit_confirmed_at = None;
        self.pending_proposal = None;
    }

    pub fn record_fired(&mut self, trigger_id: &str) {
        self.fired_triggers.insert(trigger_id.to_string());
    }

    pub fn has_fired(&self, trigger_id: &str) -> bool {
        self.fired_triggers.contains(trigger_id)
    }
}
