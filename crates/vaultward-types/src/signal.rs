//! Detected ledger signals fed to the decision oracle.
//!
//! Signals are immutable once produced; their ordering is the detection
//! order within a cycle.

use alloy_primitives::{Address, B256, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A detected real-world change the agent may act on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Signal {
    /// Tracked-asset transfer into the vault.
    AssetDeposit {
        asset: Address,
        #[serde(with = "crate::u256dec")]
        amount: U256,
        block: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        tx: Option<B256>,
    },
    /// Positive native-balance delta on the vault.
    NativeDeposit {
        #[serde(with = "crate::u256dec")]
        amount: U256,
        block: u64,
    },
    /// A declared time trigger became due.
    Timer {
        trigger_id: String,
        due_at: DateTime<Utc>,
    },
    /// A watched price crossed a declared threshold.
    PriceTrigger {
        market: String,
        /// Observed price, stringified to avoid precision loss.
        price: String,
    },
    /// A trade by a watched source account was observed.
    SourceTradeObserved {
        trader: Address,
        market: String,
        side: String,
        size: String,
    },
}

impl Signal {
    /// Block the signal originated from, where one exists.
    pub fn block(&self) -> Option<u64> {
        match self {
            Self::AssetDeposit { block, .. } | Self::NativeDeposit { block, .. } => Some(*block),
            _ => None,
        }
    }

    pub fn is_deposit(&self) -> bool {
        matches!(self, Self::AssetDeposit { .. } | Self::NativeDeposit { .. })
    }
}

/// Derived, deployment-specific facts the policy gate attaches to a cycle's
/// raw signals before they are serialized for the decision oracle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DerivedFacts {
    /// Milliseconds since the anchoring deposit, if one has been confirmed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_since_deposit_ms: Option<u64>,
    /// Whether the vault's collateral balance covers the current bond.
    pub bond_covered: bool,
    /// Whether a bonded proposal is currently pending on-chain.
    pub proposal_pending: bool,
    /// Cycle counter for this deployment.
    pub cycle: u32,
}

/// A cycle's signals together with the facts derived from agent state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AugmentedSignals {
    pub signals: Vec<Signal>,
    pub facts: DerivedFacts,
}
