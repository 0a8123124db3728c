//! Vaultward Chain - ledger access and on-chain effects.
//!
//! Everything that touches the ledger lives here: the JSON-RPC [`Ledger`]
//! seam and its HTTP implementation, typed ERC-20 and governance-module
//! reads, the deposit [`detector`], and the bonded proposal submitter in
//! [`governor`].

pub mod detector;
pub mod erc20;
pub mod governor;
pub mod rpc;

pub use detector::{Detection, Detector};
pub use governor::{AttemptFailure, GovernorClient, SubmitError, Submitter, SubmitterConfig};
pub use rpc::{Ledger, RpcLedger, TransferLog};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChainError {
    /// The transport failed before a JSON-RPC envelope came back.
    #[error("rpc transport: {0}")]
    Transport(String),
    /// The endpoint answered outside 2xx.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
    /// The endpoint returned a JSON-RPC error object.
    #[error("{method} rejected: {message}")]
    Rpc { method: String, message: String },
    /// A result field was missing or not the shape the method promises.
    #[error("malformed {field} in {method} response: {message}")]
    Malformed {
        method: &'static str,
        field: &'static str,
        message: String,
    },
    #[error(transparent)]
    Abi(#[from] vaultward_abi::AbiError),
}

pub type Result<T> = std::result::Result<T, ChainError>;
