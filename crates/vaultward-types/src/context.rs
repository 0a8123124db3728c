//! Governance-module parameter snapshots.

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

/// Read-once-per-cycle snapshot of the governance module's parameters.
///
/// Treated as an eventually-consistent cache: refreshed lazily and re-read
/// on demand, never trusted across process restarts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultContext {
    /// Asset the proposal bond is denominated in.
    pub collateral_asset: Address,
    /// Bond the module currently requires per proposal.
    #[serde(with = "crate::u256dec")]
    pub bond_amount: U256,
    /// Optimistic oracle the module escalates disputes to.
    pub oracle_address: Address,
    /// The deployment's natural-language rules text, verbatim.
    pub rules: String,
    /// Dispute window in seconds before an unopposed proposal executes.
    pub liveness_secs: u64,
    /// Price identifier the module registers assertions under.
    pub identifier: B256,
}
