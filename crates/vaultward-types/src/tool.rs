//! Tool calls exchanged with the decision oracle.
//!
//! The oracle client hands back raw [`ToolCallRequest`]s; the policy gate
//! parses them into the closed [`VaultAction`] vocabulary before any use.
//! Unknown tool names or malformed arguments never coerce into an action.

use crate::intent::ActionIntent;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A tool invocation as returned on the wire, arguments still untyped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub name: String,
    pub arguments: Value,
    pub call_id: String,
}

/// Execution result for one tool call, fed back for the explanation turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolOutcome {
    pub call_id: String,
    pub output: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderSide {
    Buy,
    Sell,
}

/// Which venue orders a cancellation covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case", deny_unknown_fields)]
pub enum CancelScope {
    ByIds { ids: Vec<String> },
    ByMarket { market: String },
    All,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfirmDepositArgs {
    /// Asset being acknowledged; absent for a native deposit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset: Option<crate::Address>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProposeTransactionsArgs {
    pub intents: Vec<ActionIntent>,
    /// Oracle-supplied rationale, carried into the proposal explanation.
    pub explanation: String,
    /// Declared trigger this proposal acts on, if the rules define any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlaceOrderArgs {
    pub market: String,
    pub side: OrderSide,
    /// Decimal string, venue precision.
    pub price: String,
    pub size: String,
}

/// The closed set of actions a tool call may resolve to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VaultAction {
    ConfirmDeposit(ConfirmDepositArgs),
    ProposeTransactions(ProposeTransactionsArgs),
    PlaceOrder(PlaceOrderArgs),
    CancelOrders(CancelScope),
}

impl VaultAction {
    /// Tool name this action answers to.
    pub fn tool_name(&self) -> &'static str {
        match self {
            Self::ConfirmDeposit(_) => "confirm_deposit",
            Self::ProposeTransactions(_) => "propose_transactions",
            Self::PlaceOrder(_) => "place_order",
            Self::CancelOrders(_) => "cancel_orders",
        }
    }

    pub fn is_proposal(&self) -> bool {
        matches!(self, Self::ProposeTransactions(_))
    }

    pub fn is_deposit_confirmation(&self) -> bool {
        matches!(self, Self::ConfirmDeposit(_))
    }
}
