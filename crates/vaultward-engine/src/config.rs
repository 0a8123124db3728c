//! Engine configuration, resolved once at startup by the binary.

use alloy_primitives::Address;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Vault watched for deposits.
    pub vault: Address,
    /// Governance module proposals are posted to.
    pub module: Address,
    /// Account the RPC endpoint signs for.
    pub signer: Address,
    /// ERC-20 assets whose transfers into the vault count as deposits.
    pub tracked_assets: Vec<Address>,
    /// Whether native-balance increases count as deposits.
    pub watch_native: bool,
    /// Swap router intents are compiled against.
    pub router: Address,
    /// Conditional-tokens contract intents are compiled against.
    pub conditional_tokens: Address,
    /// Zero means unbounded.
    pub max_cycles: u32,
    /// Delay between the tail of one cycle and the head of the next.
    pub cycle_delay: Duration,
    /// Age after which a posted-but-unconfirmed proposal is abandoned.
    pub reconciliation_timeout_secs: u64,
}
