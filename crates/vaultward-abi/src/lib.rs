//! Vaultward ABI - contract call encoding and decoding.
//!
//! Implements the subset of the Solidity ABI the agent actually submits and
//! reads: 4-byte selectors derived from canonical signatures, head/tail
//! encoding for static and dynamic values (including tuple arrays for
//! governance-module proposals), and word decoding for contract reads.

pub mod decode;
pub mod encode;
pub mod signature;

pub use decode::*;
pub use encode::*;
pub use signature::*;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AbiError {
    #[error("unsupported abi type: {0}")]
    UnsupportedType(String),
    #[error("malformed function signature: {0}")]
    MalformedSignature(String),
    #[error("argument {index} does not match declared type {expected}: {message}")]
    ArgumentMismatch {
        index: usize,
        expected: String,
        message: String,
    },
    #[error("return data too short: need {need} bytes, have {have}")]
    ShortReturnData { need: usize, have: usize },
    #[error("malformed return data: {0}")]
    MalformedReturnData(String),
}

pub type Result<T> = std::result::Result<T, AbiError>;
