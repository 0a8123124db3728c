//! Vaultward Policy - the machine-checked gate in front of every action.
//!
//! The decision oracle advises; this crate decides. [`gate::PolicyGate`]
//! augments each cycle's signals with derived facts, validates every tool
//! call against hard idempotency, trigger-race, time and recipient rules,
//! and commits state transitions only after an action's outcome is
//! confirmed. Refusals are ordinary values, never errors: a rejected call
//! is reported back to the oracle and the cycle keeps running.

pub mod gate;
pub mod timelock;
pub mod trigger;

pub use gate::{PolicyGate, Rejection, Verdict};
pub use timelock::extract_triggers;
pub use trigger::{TriggerCondition, TriggerSpec};
