//! High-level action intents proposed by the decision oracle.
//!
//! Intents are the only vocabulary the oracle may use to request on-chain
//! effects. They are validated eagerly: malformed or missing fields fail
//! before any ledger interaction.

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntentError {
    #[error("intent {index} ({kind}): {message}")]
    Invalid {
        index: usize,
        kind: &'static str,
        message: String,
    },
}

/// A high-level action the oracle may request.
///
/// Tagged-union wire shape with closed fields: unknown tags or extra
/// properties are rejected during deserialization, never coerced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum ActionIntent {
    /// Standard token transfer.
    AssetTransfer {
        token: Address,
        recipient: Address,
        #[serde(with = "crate::u256dec")]
        amount: U256,
    },
    /// Native-value transfer with an empty payload.
    NativeTransfer {
        recipient: Address,
        #[serde(with = "crate::u256dec")]
        amount: U256,
    },
    /// Arbitrary call encoded from a declared function signature.
    ContractCall {
        target: Address,
        /// Solidity-style signature, e.g. `transfer(address,uint256)`.
        signature: String,
        #[serde(default)]
        args: Vec<serde_json::Value>,
        #[serde(default, with = "crate::u256dec")]
        value: U256,
    },
    /// Exact-input swap through the configured router.
    RoutedSwap {
        token_in: Address,
        token_out: Address,
        /// Pool fee in hundredths of a basis point.
        fee: u32,
        #[serde(with = "crate::u256dec")]
        amount_in: U256,
        /// Slippage floor on the output amount.
        #[serde(with = "crate::u256dec")]
        min_amount_out: U256,
        recipient: Address,
    },
    /// Split collateral into conditional outcome tokens.
    CollateralSplit {
        collateral: Address,
        condition_id: B256,
        #[serde(with = "crate::u256dec::vec")]
        partition: Vec<U256>,
        #[serde(with = "crate::u256dec")]
        amount: U256,
    },
}

impl ActionIntent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AssetTransfer { .. } => "asset_transfer",
            Self::NativeTransfer { .. } => "native_transfer",
            Self::ContractCall { .. } => "contract_call",
            Self::RoutedSwap { .. } => "routed_swap",
            Self::CollateralSplit { .. } => "collateral_split",
        }
    }

    /// Eager structural validation, run before compilation.
    pub fn validate(&self, index: usize) -> Result<(), IntentError> {
        let fail = |message: String| IntentError::Invalid {
            index,
            kind: self.kind(),
            message,
        };
        match self {
            Self::AssetTransfer { amount, .. } | Self::NativeTransfer { amount, .. } => {
                if amount.is_zero() {
                    return Err(fail("amount must be non-zero".into()));
                }
            }
            Self::ContractCall { signature, .. } => {
                if !signature.contains('(') || !signature.ends_with(')') {
                    return Err(fail(format!("malformed function signature {signature:?}")));
                }
            }
            Self::RoutedSwap {
                amount_in,
                token_in,
                token_out,
                ..
            } => {
                if amount_in.is_zero() {
                    return Err(fail("amount_in must be non-zero".into()));
                }
                if token_in == token_out {
                    return Err(fail("token_in and token_out must differ".into()));
                }
            }
            Self::CollateralSplit {
                partition, amount, ..
            } => {
                if partition.is_empty() {
                    return Err(fail("partition must not be empty".into()));
                }
                if amount.is_zero() {
                    return Err(fail("amount must be non-zero".into()));
                }
            }
        }
        Ok(())
    }

    /// Destination that receives value under this intent, if any.
    pub fn value_recipient(&self) -> Option<Address> {
        match self {
            Self::AssetTransfer { recipient, .. }
            | Self::NativeTransfer { recipient, .. }
            | Self::RoutedSwap { recipient, .. } => Some(*recipient),
            Self::ContractCall { .. } | Self::CollateralSplit { .. } => None,
        }
    }
}
