//! Declared-signature parsing and JSON argument binding.
//!
//! The `contract_call` intent carries a Solidity-style signature plus
//! JSON-typed arguments. Both are bound here: the signature is parsed into
//! parameter types, each argument is converted to a [`Token`], and any
//! mismatch fails compilation before a ledger write can happen.

use crate::encode::Token;
use crate::{AbiError, Result};
use alloy_primitives::{Address, B256, U256};
use serde_json::Value;
use std::str::FromStr;

/// Parameter types this binder accepts from declared signatures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
    Address,
    Uint,
    Bool,
    FixedBytes32,
    Bytes,
    String,
    UintArray,
}

impl ParamType {
    fn parse(raw: &str) -> Result<Self> {
        let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
        match compact.as_str() {
            "address" => Ok(Self::Address),
            "bool" => Ok(Self::Bool),
            "bytes32" => Ok(Self::FixedBytes32),
            "bytes" => Ok(Self::Bytes),
            "string" => Ok(Self::String),
            "uint256[]" | "uint[]" => Ok(Self::UintArray),
            other if is_uint(other) => Ok(Self::Uint),
            other => Err(AbiError::UnsupportedType(other.to_string())),
        }
    }

    fn canonical(&self) -> &'static str {
        match self {
            Self::Address => "address",
            Self::Uint => "uint256",
            Self::Bool => "bool",
            Self::FixedBytes32 => "bytes32",
            Self::Bytes => "bytes",
            Self::String => "string",
            Self::UintArray => "uint256[]",
        }
    }
}

fn is_uint(raw: &str) -> bool {
    match raw.strip_prefix("uint") {
        Some("") => true,
        Some(bits) => bits
            .parse::<u32>()
            .map(|b| b > 0 && b <= 256 && b % 8 == 0)
            .unwrap_or(false),
        None => false,
    }
}

/// A parsed `name(type,...)` signature with its canonical form.
#[derive(Debug, Clone)]
pub struct ParsedSignature {
    pub canonical: String,
    pub params: Vec<ParamType>,
}

/// Parse and canonicalize a declared signature like `transfer(address,uint)`.
pub fn parse_signature(raw: &str) -> Result<ParsedSignature> {
    let trimmed = raw.trim();
    let open = trimmed
        .find('(')
        .ok_or_else(|| AbiError::MalformedSignature(raw.to_string()))?;
    if !trimmed.ends_with(')') || open == 0 {
        return Err(AbiError::MalformedSignature(raw.to_string()));
    }
    let name = &trimmed[..open];
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(AbiError::MalformedSignature(raw.to_string()));
    }
    let inner = &trimmed[open + 1..trimmed.len() - 1];
    let params = if inner.trim().is_empty() {
        Vec::new()
    } else {
        inner
            .split(',')
            .map(ParamType::parse)
            .collect::<Result<Vec<_>>>()?
    };
    let canonical = format!(
        "{name}({})",
        params
            .iter()
            .map(ParamType::canonical)
            .collect::<Vec<_>>()
            .join(",")
    );
    Ok(ParsedSignature { canonical, params })
}

/// Bind ordered JSON arguments to the parsed parameter types.
pub fn bind_arguments(params: &[ParamType], args: &[Value]) -> Result<Vec<Token>> {
    if params.len() != args.len() {
        return Err(AbiError::ArgumentMismatch {
            index: args.len().min(params.len()),
            expected: format!("{} arguments", params.len()),
            message: format!("got {}", args.len()),
        });
    }
    params
        .iter()
        .zip(args)
        .enumerate()
        .map(|(index, (param, value))| token_from_json(param, value, index))
        .collect()
}

fn token_from_json(param: &ParamType, value: &Value, index: usize) -> Result<Token> {
    let mismatch = |message: String| AbiError::ArgumentMismatch {
        index,
        expected: param.canonical().to_string(),
        message,
    };
    match param {
        ParamType::Address => {
            let raw = value
                .as_str()
                .ok_or_else(|| mismatch("expected a 0x-prefixed address string".to_string()))?;
            Address::from_str(raw.trim())
                .map(Token::Address)
                .map_err(|error| mismatch(error.to_string()))
        }
        ParamType::Uint => parse_uint(value).map(Token::Uint).map_err(mismatch),
        ParamType::Bool => value
            .as_bool()
            .map(Token::Bool)
            .ok_or_else(|| mismatch("expected a boolean".to_string())),
        ParamType::FixedBytes32 => {
            let raw = value
                .as_str()
                .ok_or_else(|| mismatch("expected a 0x-prefixed 32-byte hex string".to_string()))?;
            B256::from_str(raw.trim())
                .map(Token::FixedBytes)
                .map_err(|error| mismatch(error.to_string()))
        }
        ParamType::Bytes => {
            let raw = value
                .as_str()
                .ok_or_else(|| mismatch("expected a 0x-prefixed hex string".to_string()))?;
            crate::decode::parse_hex_blob(raw)
                .map(Token::Bytes)
                .map_err(|error| mismatch(error.to_string()))
        }
        ParamType::String => value
            .as_str()
            .map(|text| Token::String(text.to_string()))
            .ok_or_else(|| mismatch("expected a string".to_string())),
        ParamType::UintArray => {
            let items = value
                .as_array()
                .ok_or_else(|| mismatch("expected an array of decimal strings".to_string()))?;
            let tokens = items
                .iter()
                .map(|item| parse_uint(item).map(Token::Uint))
                .collect::<std::result::Result<Vec<_>, String>>()
                .map_err(mismatch)?;
            Ok(Token::Array(tokens))
        }
    }
}

/// Amounts arrive as decimal strings; bare JSON integers are also accepted.
fn parse_uint(value: &Value) -> std::result::Result<U256, String> {
    match value {
        Value::String(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() || !trimmed.as_bytes().iter().all(|b| b.is_ascii_digit()) {
                return Err(format!("expected a decimal integer string, got {raw:?}"));
            }
            U256::from_str(trimmed).map_err(|error| error.to_string())
        }
        Value::Number(number) => number
            .as_u64()
            .map(U256::from)
            .ok_or_else(|| "expected a non-negative integer".to_string()),
        other => Err(format!("expected a decimal integer, got {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn canonicalizes_uint_to_uint256() {
        let parsed = parse_signature("transfer(address, uint)").unwrap();
        assert_eq!(parsed.canonical, "transfer(address,uint256)");
        assert_eq!(parsed.params, vec![ParamType::Address, ParamType::Uint]);
    }

    #[test]
    fn rejects_unknown_types_and_malformed_signatures() {
        assert!(matches!(
            parse_signature("foo(float64)"),
            Err(AbiError::UnsupportedType(_))
        ));
        assert!(matches!(
            parse_signature("no parens"),
            Err(AbiError::MalformedSignature(_))
        ));
        assert!(matches!(
            parse_signature("(address)"),
            Err(AbiError::MalformedSignature(_))
        ));
    }

    #[test]
    fn binds_json_arguments_by_declared_type() {
        let parsed = parse_signature("splitPosition(address,bytes32,uint256[],uint256)").unwrap();
        let tokens = bind_arguments(
            &parsed.params,
            &[
                json!("0x1111111111111111111111111111111111111111"),
                json!("0x2222222222222222222222222222222222222222222222222222222222222222"),
                json!(["1", "2"]),
                json!("250000"),
            ],
        )
        .unwrap();
        assert_eq!(tokens.len(), 4);
        assert!(matches!(tokens[2], Token::Array(ref items) if items.len() == 2));
    }

    #[test]
    fn argument_count_mismatch_is_explicit() {
        let parsed = parse_signature("transfer(address,uint256)").unwrap();
        let err = bind_arguments(&parsed.params, &[json!("0x00")]).unwrap_err();
        assert!(matches!(err, AbiError::ArgumentMismatch { .. }));
    }
}
