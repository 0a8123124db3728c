//! Low-level calls produced by the intent compiler.

use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

/// Execution mode for a proposed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallKind {
    Call,
    DelegateCall,
}

impl CallKind {
    /// Operation discriminant used by the governance module's ABI.
    pub fn operation(self) -> u8 {
        match self {
            Self::Call => 0,
            Self::DelegateCall => 1,
        }
    }
}

/// A single target/value/data triple ready for on-chain submission.
///
/// Produced only by the intent compiler; never hand-authored elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LowLevelCall {
    pub target: Address,
    #[serde(with = "crate::u256dec")]
    pub value: U256,
    pub data: Bytes,
    pub call_kind: CallKind,
}

impl LowLevelCall {
    pub fn new(target: Address, value: U256, data: impl Into<Bytes>) -> Self {
        Self {
            target,
            value,
            data: data.into(),
            call_kind: CallKind::Call,
        }
    }
}
