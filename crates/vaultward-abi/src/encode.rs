//! Head/tail ABI encoding.
//!
//! Values are modeled as [`Token`]s. A call payload is the 4-byte selector
//! followed by the arguments encoded as a top-level tuple: static tokens
//! inline in the head, dynamic tokens as a head offset pointing into the
//! tail.

use crate::Result;
use alloy_primitives::{keccak256, Address, B256, U256};

const WORD: usize = 32;

/// A single ABI value ready for encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Address(Address),
    Uint(U256),
    Bool(bool),
    FixedBytes(B256),
    Bytes(Vec<u8>),
    String(String),
    /// Dynamic array of homogeneous tokens.
    Array(Vec<Token>),
    Tuple(Vec<Token>),
}

impl Token {
    fn is_dynamic(&self) -> bool {
        match self {
            Token::Bytes(_) | Token::String(_) | Token::Array(_) => true,
            Token::Tuple(inner) => inner.iter().any(Token::is_dynamic),
            _ => false,
        }
    }

    /// Head width of this token inside an enclosing tuple.
    fn head_len(&self) -> usize {
        if self.is_dynamic() {
            WORD
        } else {
            match self {
                Token::Tuple(inner) => inner.iter().map(Token::head_len).sum(),
                _ => WORD,
            }
        }
    }
}

/// 4-byte selector for a canonical signature like `transfer(address,uint256)`.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Encode `selector(signature) || encode_tokens(args)`.
pub fn encode_call(signature: &str, args: &[Token]) -> Result<Vec<u8>> {
    let mut out = selector(signature).to_vec();
    out.extend_from_slice(&encode_tokens(args)?);
    Ok(out)
}

/// Encode a token slice as a top-level tuple.
pub fn encode_tokens(tokens: &[Token]) -> Result<Vec<u8>> {
    let head_len: usize = tokens.iter().map(Token::head_len).sum();
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();
    for token in tokens {
        if token.is_dynamic() {
            head.extend_from_slice(&word_from_usize(head_len + tail.len()));
            tail.extend_from_slice(&encode_single(token)?);
        } else {
            head.extend_from_slice(&encode_single(token)?);
        }
    }
    head.extend_from_slice(&tail);
    Ok(head)
}

fn encode_single(token: &Token) -> Result<Vec<u8>> {
    match token {
        Token::Address(address) => {
            let mut word = [0u8; WORD];
            word[12..].copy_from_slice(address.as_slice());
            Ok(word.to_vec())
        }
        Token::Uint(value) => Ok(value.to_be_bytes::<WORD>().to_vec()),
        Token::Bool(flag) => {
            let mut word = [0u8; WORD];
            word[WORD - 1] = u8::from(*flag);
            Ok(word.to_vec())
        }
        Token::FixedBytes(bytes) => Ok(bytes.to_vec()),
        Token::Bytes(bytes) => Ok(encode_length_prefixed(bytes)),
        Token::String(text) => Ok(encode_length_prefixed(text.as_bytes())),
        Token::Array(items) => {
            let mut out = word_from_usize(items.len()).to_vec();
            out.extend_from_slice(&encode_tokens(items)?);
            Ok(out)
        }
        Token::Tuple(inner) => encode_tokens(inner),
    }
}

fn encode_length_prefixed(bytes: &[u8]) -> Vec<u8> {
    let mut out = word_from_usize(bytes.len()).to_vec();
    out.extend_from_slice(bytes);
    let padding = (WORD - bytes.len() % WORD) % WORD;
    out.extend(std::iter::repeat(0u8).take(padding));
    out
}

fn word_from_usize(value: usize) -> [u8; WORD] {
    U256::from(value).to_be_bytes::<WORD>()
}

/// Two static words after the selector; nothing here can fail.
fn address_uint_call(signature: &str, address: Address, amount: U256) -> Vec<u8> {
    let mut out = selector(signature).to_vec();
    let mut word = [0u8; WORD];
    word[12..].copy_from_slice(address.as_slice());
    out.extend_from_slice(&word);
    out.extend_from_slice(&amount.to_be_bytes::<WORD>());
    out
}

/// Convenience: `approve(address,uint256)` calldata.
pub fn erc20_approve(spender: Address, amount: U256) -> Vec<u8> {
    address_uint_call("approve(address,uint256)", spender, amount)
}

/// Convenience: `transfer(address,uint256)` calldata.
pub fn erc20_transfer(recipient: Address, amount: U256) -> Vec<u8> {
    address_uint_call("transfer(address,uint256)", recipient, amount)
}
