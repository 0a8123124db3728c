//! JSON-RPC ledger access.
//!
//! [`Ledger`] is the seam the rest of the workspace talks through; the
//! production implementation is [`RpcLedger`] over a single HTTP endpoint.
//! Signing is delegated to that endpoint: writes go out as
//! `eth_sendTransaction` from the configured signer account.

use crate::{ChainError, Result};
use alloy_primitives::{keccak256, Address, B256, U256};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

const TRANSFER_EVENT_SIGNATURE: &str = "Transfer(address,address,uint256)";

/// One tracked-asset transfer log scoped to the vault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferLog {
    pub amount: U256,
    pub block: u64,
    pub tx: Option<B256>,
}

/// Ledger operations the agent needs, mockable in tests.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Current chain head.
    async fn block_number(&self) -> Result<u64>;

    /// Transfer logs of `asset` with `recipient` as destination over the
    /// inclusive block range.
    async fn transfer_logs(
        &self,
        asset: Address,
        recipient: Address,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<TransferLog>>;

    /// Native balance of `address` at the latest block.
    async fn native_balance(&self, address: Address) -> Result<U256>;

    /// Read-only contract call; also used to simulate writes before sending.
    async fn call(&self, from: Option<Address>, to: Address, data: &[u8]) -> Result<Vec<u8>>;

    /// Submit a write through the endpoint's signer for `from`.
    async fn send_transaction(
        &self,
        from: Address,
        to: Address,
        value: U256,
        data: &[u8],
    ) -> Result<B256>;

    /// Receipt status for a sent transaction, `None` while unmined.
    async fn transaction_succeeded(&self, tx: B256) -> Result<Option<bool>>;
}

#[async_trait]
impl<T: Ledger + ?Sized> Ledger for &T {
    async fn block_number(&self) -> Result<u64> {
        (**self).block_number().await
    }

    async fn transfer_logs(
        &self,
        asset: Address,
        recipient: Address,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<TransferLog>> {
        (**self)
            .transfer_logs(asset, recipient, from_block, to_block)
            .await
    }

    async fn native_balance(&self, address: Address) -> Result<U256> {
        (**self).native_balance(address).await
    }

    async fn call(&self, from: Option<Address>, to: Address, data: &[u8]) -> Result<Vec<u8>> {
        (**self).call(from, to, data).await
    }

    async fn send_transaction(
        &self,
        from: Address,
        to: Address,
        value: U256,
        data: &[u8],
    ) -> Result<B256> {
        (**self).send_transaction(from, to, value, data).await
    }

    async fn transaction_succeeded(&self, tx: B256) -> Result<Option<bool>> {
        (**self).transaction_succeeded(tx).await
    }
}

#[async_trait]
impl<T: Ledger + ?Sized> Ledger for std::sync::Arc<T> {
    async fn block_number(&self) -> Result<u64> {
        (**self).block_number().await
    }

    async fn transfer_logs(
        &self,
        asset: Address,
        recipient: Address,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<TransferLog>> {
        (**self)
            .transfer_logs(asset, recipient, from_block, to_block)
            .await
    }

    async fn native_balance(&self, address: Address) -> Result<U256> {
        (**self).native_balance(address).await
    }

    async fn call(&self, from: Option<Address>, to: Address, data: &[u8]) -> Result<Vec<u8>> {
        (**self).call(from, to, data).await
    }

    async fn send_transaction(
        &self,
        from: Address,
        to: Address,
        value: U256,
        data: &[u8],
    ) -> Result<B256> {
        (**self).send_transaction(from, to, value, data).await
    }

    async fn transaction_succeeded(&self, tx: B256) -> Result<Option<bool>> {
        (**self).transaction_succeeded(tx).await
    }
}

/// HTTP JSON-RPC implementation of [`Ledger`].
#[derive(Debug, Clone)]
pub struct RpcLedger {
    client: reqwest::Client,
    url: String,
}

impl RpcLedger {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    async fn rpc_call(&self, method: &'static str, params: Value) -> Result<Value> {
        let body = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1,
        });
        debug!(method, "ledger rpc call");
        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|error| ChainError::Transport(error.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|error| ChainError::Transport(error.to_string()))?;
        if !status.is_success() {
            return Err(ChainError::Http {
                status: status.as_u16(),
                body: text,
            });
        }
        let envelope: Value = serde_json::from_str(&text).map_err(|error| ChainError::Malformed {
            method,
            field: "body",
            message: error.to_string(),
        })?;
        if let Some(error) = envelope.get("error") {
            return Err(ChainError::Rpc {
                method: method.to_string(),
                message: error.to_string(),
            });
        }
        envelope
            .get("result")
            .cloned()
            .ok_or_else(|| ChainError::Malformed {
                method,
                field: "result",
                message: "missing".to_string(),
            })
    }

    async fn rpc_str(&self, method: &'static str, params: Value) -> Result<String> {
        let result = self.rpc_call(method, params).await?;
        result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ChainError::Malformed {
                method,
                field: "result",
                message: format!("expected a string, got {result}"),
            })
    }
}

#[async_trait]
impl Ledger for RpcLedger {
    async fn block_number(&self) -> Result<u64> {
        let raw = self.rpc_str("eth_blockNumber", json!([])).await?;
        parse_hex_u64(&raw, "eth_blockNumber", "result")
    }

    async fn transfer_logs(
        &self,
        asset: Address,
        recipient: Address,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<TransferLog>> {
        let filter = json!({
            "fromBlock": quantity(from_block),
            "toBlock": quantity(to_block),
            "address": format!("{asset:#x}"),
            // topic1 (sender) is unconstrained
            "topics": [transfer_topic0(), Value::Null, address_topic(recipient)],
        });
        let result = self.rpc_call("eth_getLogs", json!([filter])).await?;
        let logs: Vec<RpcLog> =
            serde_json::from_value(result).map_err(|error| ChainError::Malformed {
                method: "eth_getLogs",
                field: "result",
                message: error.to_string(),
            })?;
        logs.into_iter().map(TransferLog::try_from).collect()
    }

    async fn native_balance(&self, address: Address) -> Result<U256> {
        let raw = self
            .rpc_str("eth_getBalance", json!([format!("{address:#x}"), "latest"]))
            .await?;
        parse_hex_u256(&raw, "eth_getBalance", "result")
    }

    async fn call(&self, from: Option<Address>, to: Address, data: &[u8]) -> Result<Vec<u8>> {
        let mut call = serde_json::Map::new();
        if let Some(from) = from {
            call.insert("from".to_string(), json!(format!("{from:#x}")));
        }
        call.insert("to".to_string(), json!(format!("{to:#x}")));
        call.insert("data".to_string(), json!(hex_blob(data)));
        let raw = self
            .rpc_str("eth_call", json!([Value::Object(call), "latest"]))
            .await?;
        parse_hex_bytes(&raw, "eth_call", "result")
    }

    async fn send_transaction(
        &self,
        from: Address,
        to: Address,
        value: U256,
        data: &[u8],
    ) -> Result<B256> {
        let tx = json!({
            "from": format!("{from:#x}"),
            "to": format!("{to:#x}"),
            "value": format!("0x{value:x}"),
            "data": hex_blob(data),
        });
        let raw = self.rpc_str("eth_sendTransaction", json!([tx])).await?;
        parse_hex_b256(&raw, "eth_sendTransaction", "result")
    }

    async fn transaction_succeeded(&self, tx: B256) -> Result<Option<bool>> {
        let result = self
            .rpc_call("eth_getTransactionReceipt", json!([format!("{tx:#x}")]))
            .await?;
        if result.is_null() {
            return Ok(None);
        }
        let status = result
            .get("status")
            .and_then(Value::as_str)
            .ok_or_else(|| ChainError::Malformed {
                method: "eth_getTransactionReceipt",
                field: "status",
                message: "missing".to_string(),
            })?;
        Ok(Some(
            parse_hex_u64(status, "eth_getTransactionReceipt", "status")? == 1,
        ))
    }
}

#[derive(Deserialize)]
struct RpcLog {
    #[serde(rename = "blockNumber")]
    block_number: String,
    #[serde(rename = "transactionHash")]
    transaction_hash: Option<String>,
    data: String,
}

impl TryFrom<RpcLog> for TransferLog {
    type Error = ChainError;

    fn try_from(log: RpcLog) -> Result<Self> {
        let block = parse_hex_u64(&log.block_number, "eth_getLogs", "blockNumber")?;
        let tx = log
            .transaction_hash
            .as_deref()
            .map(|raw| parse_hex_b256(raw, "eth_getLogs", "transactionHash"))
            .transpose()?;
        let data = parse_hex_bytes(&log.data, "eth_getLogs", "data")?;
        let amount = vaultward_abi::decode_u256(&data)?;
        Ok(Self { amount, block, tx })
    }
}

/// `Transfer(address,address,uint256)` topic hash.
pub fn transfer_topic0() -> String {
    format!("0x{}", hex::encode(keccak256(TRANSFER_EVENT_SIGNATURE.as_bytes())))
}

/// Pad an address into an indexed-topic word.
pub fn address_topic(address: Address) -> String {
    format!("0x{:0>64}", hex::encode(address.as_slice()))
}

fn quantity(value: u64) -> String {
    format!("0x{value:x}")
}

fn hex_blob(data: &[u8]) -> String {
    format!("0x{}", hex::encode(data))
}

fn strip_hex<'a>(raw: &'a str, method: &'static str, field: &'static str) -> Result<&'a str> {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .ok_or_else(|| ChainError::Malformed {
            method,
            field,
            message: "missing 0x prefix".to_string(),
        })
}

fn parse_hex_u64(raw: &str, method: &'static str, field: &'static str) -> Result<u64> {
    let digits = strip_hex(raw, method, field)?;
    u64::from_str_radix(digits, 16).map_err(|error| ChainError::Malformed {
        method,
        field,
        message: error.to_string(),
    })
}

fn parse_hex_u256(raw: &str, method: &'static str, field: &'static str) -> Result<U256> {
    let digits = strip_hex(raw, method, field)?;
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }
    if digits.len() > 64 {
        return Err(ChainError::Malformed {
            method,
            field,
            message: "quantity exceeds 32 bytes".to_string(),
        });
    }
    let padded = if digits.len() % 2 == 0 {
        digits.to_string()
    } else {
        format!("0{digits}")
    };
    let bytes = hex::decode(padded).map_err(|error| ChainError::Malformed {
        method,
        field,
        message: error.to_string(),
    })?;
    Ok(U256::from_be_slice(&bytes))
}

fn parse_hex_bytes(raw: &str, method: &'static str, field: &'static str) -> Result<Vec<u8>> {
    let digits = strip_hex(raw, method, field)?;
    hex::decode(digits).map_err(|error| ChainError::Malformed {
        method,
        field,
        message: error.to_string(),
    })
}

fn parse_hex_b256(raw: &str, method: &'static str, field: &'static str) -> Result<B256> {
    let bytes = parse_hex_bytes(raw, method, field)?;
    if bytes.len() != 32 {
        return Err(ChainError::Malformed {
            method,
            field,
            message: format!("expected 32 bytes, got {}", bytes.len()),
        });
    }
    Ok(B256::from_slice(&bytes))
}
