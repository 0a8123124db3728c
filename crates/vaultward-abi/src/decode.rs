//! Word decoding for contract read results.

use crate::{AbiError, Result};
use alloy_primitives::{Address, B256, U256};

const WORD: usize = 32;

fn require(data: &[u8], need: usize) -> Result<()> {
    if data.len() < need {
        return Err(AbiError::ShortReturnData {
            need,
            have: data.len(),
        });
    }
    Ok(())
}

/// Decode a single `uint256` return value.
pub fn decode_u256(data: &[u8]) -> Result<U256> {
    require(data, WORD)?;
    Ok(U256::from_be_slice(&data[..WORD]))
}

/// Decode a single `uint64`-ranged return value, rejecting overflow.
pub fn decode_u64(data: &[u8]) -> Result<u64> {
    let value = decode_u256(data)?;
    u64::try_from(value).map_err(|_| AbiError::MalformedReturnData("uint64 overflow".to_string()))
}

/// Decode a single `address` return value.
pub fn decode_address(data: &[u8]) -> Result<Address> {
    require(data, WORD)?;
    Ok(Address::from_slice(&data[12..WORD]))
}

/// Decode a single `bytes32` return value.
pub fn decode_b256(data: &[u8]) -> Result<B256> {
    require(data, WORD)?;
    Ok(B256::from_slice(&data[..WORD]))
}

/// Decode a single `bool` return value.
pub fn decode_bool(data: &[u8]) -> Result<bool> {
    Ok(!decode_u256(data)?.is_zero())
}

/// Decode a single dynamic `string` return value (offset, length, payload).
pub fn decode_string(data: &[u8]) -> Result<String> {
    require(data, WORD)?;
    let offset = usize::try_from(U256::from_be_slice(&data[..WORD]))
        .map_err(|_| AbiError::MalformedReturnData("string offset overflow".to_string()))?;
    require(data, offset + WORD)?;
    let length = usize::try_from(U256::from_be_slice(&data[offset..offset + WORD]))
        .map_err(|_| AbiError::MalformedReturnData("string length overflow".to_string()))?;
    require(data, offset + WORD + length)?;
    String::from_utf8(data[offset + WORD..offset + WORD + length].to_vec())
        .map_err(|error| AbiError::MalformedReturnData(format!("string not utf-8: {error}")))
}

/// Parse a 0x-prefixed hex blob as returned by `eth_call`.
pub fn parse_hex_blob(raw: &str) -> Result<Vec<u8>> {
    let trimmed = raw.trim();
    let stripped = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .ok_or_else(|| AbiError::MalformedReturnData("missing 0x prefix".to_string()))?;
    hex::decode(stripped).map_err(|error| AbiError::MalformedReturnData(error.to_string()))
}
