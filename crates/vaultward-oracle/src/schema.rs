//! Strict tool schemas advertised to the decision service.
//!
//! Every schema closes its object (`additionalProperties: false`) and
//! enumerates its tags, so the service cannot invent fields the gate and
//! compiler would have to guess at. Big integers are declared as decimal
//! strings throughout.

use serde_json::{json, Value};

const DECIMAL_PATTERN: &str = "^[0-9]+$";
const ADDRESS_PATTERN: &str = "^0x[0-9a-fA-F]{40}$";
const B256_PATTERN: &str = "^0x[0-9a-fA-F]{64}$";

fn decimal() -> Value {
    json!({"type": "string", "pattern": DECIMAL_PATTERN})
}

fn address() -> Value {
    json!({"type": "string", "pattern": ADDRESS_PATTERN})
}

fn intent_variant(kind: &str, fields: Value, required: Vec<&str>) -> Value {
    let mut properties = serde_json::Map::new();
    properties.insert("kind".to_string(), json!({"const": kind}));
    if let Value::Object(fields) = fields {
        properties.extend(fields);
    }
    let mut all_required = vec!["kind"];
    all_required.extend(required);
    json!({
        "type": "object",
        "properties": properties,
        "required": all_required,
        "additionalProperties": false
    })
}

/// Schema for one `ActionIntent` in any of its five shapes.
pub fn intent_schema() -> Value {
    json!({
        "anyOf": [
            intent_variant(
                "asset_transfer",
                json!({"token": address(), "recipient": address(), "amount": decimal()}),
                vec!["token", "recipient", "amount"],
            ),
            intent_variant(
                "native_transfer",
                json!({"recipient": address(), "amount": decimal()}),
                vec!["recipient", "amount"],
            ),
            intent_variant(
                "contract_call",
                json!({
                    "target": address(),
                    "signature": {"type": "string"},
                    "args": {"type": "array"},
                    "value": decimal(),
                }),
                vec!["target", "signature"],
            ),
            intent_variant(
                "routed_swap",
                json!({
                    "token_in": address(),
                    "token_out": address(),
                    "fee": {"type": "integer", "minimum": 0},
                    "amount_in": decimal(),
                    "min_amount_out": decimal(),
                    "recipient": address(),
                }),
                vec!["token_in", "token_out", "fee", "amount_in", "min_amount_out", "recipient"],
            ),
            intent_variant(
                "collateral_split",
                json!({
                    "collateral": address(),
                    "condition_id": {"type": "string", "pattern": B256_PATTERN},
                    "partition": {"type": "array", "items": decimal(), "minItems": 1},
                    "amount": decimal(),
                }),
                vec!["collateral", "condition_id", "partition", "amount"],
            ),
        ]
    })
}

fn tool(name: &str, description: &str, parameters: Value) -> Value {
    json!({
        "type": "function",
        "name": name,
        "description": description,
        "strict": true,
        "parameters": parameters,
    })
}

/// The full tool set offered each decision turn.
pub fn vault_tools() -> Vec<Value> {
    vec![
        tool(
            "confirm_deposit",
            "Acknowledge a detected deposit so later triggers can anchor to it.",
            json!({
                "type": "object",
                "properties": {
                    "asset": {"anyOf": [address(), {"type": "null"}]},
                },
                "required": ["asset"],
                "additionalProperties": false,
            }),
        ),
        tool(
            "propose_transactions",
            "Submit a bonded on-chain proposal compiled from the given intents.",
            json!({
                "type": "object",
                "properties": {
                    "intents": {"type": "array", "items": intent_schema(), "minItems": 1},
                    "explanation": {"type": "string"},
                    "trigger_id": {"anyOf": [{"type": "string"}, {"type": "null"}]},
                },
                "required": ["intents", "explanation", "trigger_id"],
                "additionalProperties": false,
            }),
        ),
        tool(
            "place_order",
            "Place a signed order on the trading venue.",
            json!({
                "type": "object",
                "properties": {
                    "market": {"type": "string"},
                    "side": {"type": "string", "enum": ["buy", "sell"]},
                    "price": {"type": "string"},
                    "size": {"type": "string"},
                },
                "required": ["market", "side", "price", "size"],
                "additionalProperties": false,
            }),
        ),
        tool(
            "cancel_orders",
            "Cancel venue orders by id list, by market, or all at once.",
            json!({
                "anyOf": [
                    {
                        "type": "object",
                        "properties": {
                            "scope": {"const": "by_ids"},
                            "ids": {"type": "array", "items": {"type": "string"}, "minItems": 1},
                        },
                        "required": ["scope", "ids"],
                        "additionalProperties": false,
                    },
                    {
                        "type": "object",
                        "properties": {
                            "scope": {"const": "by_market"},
                            "market": {"type": "string"},
                        },
                        "required": ["scope", "market"],
                        "additionalProperties": false,
                    },
                    {
                        "type": "object",
                        "properties": {"scope": {"const": "all"}},
                        "required": ["scope"],
                        "additionalProperties": false,
                    },
                ]
            }),
        ),
    ]
}
