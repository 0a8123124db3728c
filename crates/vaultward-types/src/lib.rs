//! Vaultward Types - Canonical domain types for vault custody automation
//!
//! This crate contains the foundational types shared across the vaultward
//! workspace, with zero dependencies on other vaultward crates:
//!
//! - Detected ledger signals and the derived facts attached to them
//! - High-level action intents and the low-level calls they compile into
//! - Governance-module context snapshots and bonded proposal records
//! - The per-deployment agent state machine
//!
//! # Architectural Invariants
//!
//! 1. At most one unconfirmed `ProposalSubmission` exists at any time
//! 2. Step flags only advance forward within a cycle and reset together
//! 3. `LowLevelCall` values are produced only by the intent compiler
//! 4. The block cursor is monotone and advances only after a whole
//!    detection range succeeds

pub mod call;
pub mod context;
pub mod cursor;
pub mod intent;
pub mod signal;
pub mod state;
pub mod tool;
pub mod u256dec;

pub use call::*;
pub use context::*;
pub use cursor::*;
pub use intent::*;
pub use signal::*;
pub use state::*;
pub use tool::*;

pub use alloy_primitives::{Address, B256, U256};
