//! Governance-module reads and bonded proposal submission.
//!
//! The module's proposal entrypoint changed shape across deployments, so
//! submission carries an ordered list of call encodings tried newest first.
//! Each attempt is simulated before anything is sent; only a version whose
//! simulation succeeds is used for the real write, and an exhausted
//! fallback reports every attempted version's failure.

use crate::rpc::Ledger;
use crate::{erc20, ChainError, Result};
use alloy_primitives::{keccak256, Address, B256, U256};
use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};
use vaultward_abi::{
    decode_address, decode_b256, decode_string, decode_u256, decode_u64, encode_call,
    encode_tokens, Token,
};
use vaultward_types::{LowLevelCall, ProposalSubmission, VaultContext};

/// One failed interface-version attempt, kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptFailure {
    pub version: &'static str,
    pub message: String,
}

impl std::fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.version, self.message)
    }
}

fn render_attempts(attempts: &[AttemptFailure]) -> String {
    let rendered: Vec<String> = attempts.iter().map(AttemptFailure::to_string).collect();
    format!(
        "no proposal interface version accepted simulation ({})",
        rendered.join("; ")
    )
}

#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("collateral balance {available} does not cover required bond {required}")]
    InsufficientBond { required: U256, available: U256 },
    #[error("allowance {allowance} still below required bond {required} after approval")]
    AllowanceShortfall { required: U256, allowance: U256 },
    #[error("signer holds no native balance to pay execution cost")]
    NoNativeBalance,
    #[error("{}", render_attempts(.attempts))]
    VersionFallbackExhausted { attempts: Vec<AttemptFailure> },
    #[error(transparent)]
    Chain(#[from] ChainError),
}

/// Typed reads against the governance module and its oracle.
pub struct GovernorClient<L> {
    ledger: L,
    module: Address,
}

impl<L: Ledger> GovernorClient<L> {
    pub fn new(ledger: L, module: Address) -> Self {
        Self { ledger, module }
    }

    async fn read(&self, signature: &str) -> Result<Vec<u8>> {
        let data = encode_call(signature, &[])?;
        self.ledger.call(None, self.module, &data).await
    }

    /// Snapshot the module's current parameters.
    pub async fn context(&self) -> Result<VaultContext> {
        let collateral_asset = decode_address(&self.read("collateral()").await?)?;
        let bond_amount = decode_u256(&self.read("bondAmount()").await?)?;
        let oracle_address = decode_address(&self.read("optimisticOracleV3()").await?)?;
        let rules = decode_string(&self.read("rules()").await?)?;
        let liveness_secs = decode_u64(&self.read("liveness()").await?)?;
        let identifier = decode_b256(&self.read("identifier()").await?)?;
        Ok(VaultContext {
            collateral_asset,
            bond_amount,
            oracle_address,
            rules,
            liveness_secs,
            identifier,
        })
    }

    /// Venue-imposed minimum bond for a collateral asset, read off the oracle.
    pub async fn minimum_bond(&self, oracle: Address, collateral: Address) -> Result<U256> {
        let data = encode_call("getMinimumBond(address)", &[Token::Address(collateral)])?;
        let out = self.ledger.call(None, oracle, &data).await?;
        Ok(decode_u256(&out)?)
    }
}

/// An encoding strategy for one known proposal interface version.
struct ProposalVersion {
    name: &'static str,
    encode: fn(&Token, &str) -> vaultward_abi::Result<Vec<u8>>,
}

/// Newest first.
const VERSIONS: [ProposalVersion; 2] = [
    ProposalVersion {
        name: "proposeTransactions/explained",
        encode: |transactions, explanation| {
            encode_call(
                "proposeTransactions((address,uint8,uint256,bytes)[],bytes)",
                &[
                    transactions.clone(),
                    Token::Bytes(explanation.as_bytes().to_vec()),
                ],
            )
        },
    },
    ProposalVersion {
        name: "proposeTransactions/bare",
        encode: |transactions, _| {
            encode_call(
                "proposeTransactions((address,uint8,uint256,bytes)[])",
                &[transactions.clone()],
            )
        },
    },
];

#[derive(Debug, Clone, Copy)]
pub struct SubmitterConfig {
    /// Governance module proposals are posted to.
    pub module: Address,
    /// Account the RPC endpoint signs for.
    pub signer: Address,
}

/// Performs bonding preflight and posts proposals.
pub struct Submitter<L> {
    ledger: L,
    config: SubmitterConfig,
}

impl<L: Ledger> Submitter<L> {
    pub fn new(ledger: L, config: SubmitterConfig) -> Self {
        Self { ledger, config }
    }

    /// Preflight the bond, then submit `calls` as one bonded proposal.
    pub async fn submit(
        &self,
        calls: &[LowLevelCall],
        ctx: &VaultContext,
        explanation: &str,
    ) -> std::result::Result<ProposalSubmission, SubmitError> {
        let governor = GovernorClient::new(&self.ledger, self.config.module);
        let minimum = governor
            .minimum_bond(ctx.oracle_address, ctx.collateral_asset)
            .await?;
        let required = ctx.bond_amount.max(minimum);

        if !required.is_zero() {
            let available =
                erc20::balance_of(&self.ledger, ctx.collateral_asset, self.config.signer).await?;
            if available < required {
                return Err(SubmitError::InsufficientBond {
                    required,
                    available,
                });
            }
            self.ensure_allowance(ctx.collateral_asset, required).await?;
        }

        let native = self.ledger.native_balance(self.config.signer).await?;
        if native.is_zero() {
            return Err(SubmitError::NoNativeBalance);
        }

        let transactions = transactions_token(calls);
        let proposal_id = proposal_id(&transactions)?;

        let mut attempts = Vec::new();
        for version in &VERSIONS {
            let data = match (version.encode)(&transactions, explanation) {
                Ok(data) => data,
                Err(error) => {
                    attempts.push(AttemptFailure {
                        version: version.name,
                        message: error.to_string(),
                    });
                    continue;
                }
            };
            match self
                .ledger
                .call(Some(self.config.signer), self.config.module, &data)
                .await
            {
                Ok(_) => {
                    let tx = self
                        .ledger
                        .send_transaction(self.config.signer, self.config.module, U256::ZERO, &data)
                        .await?;
                    info!(
                        version = version.name,
                        %proposal_id,
                        %tx,
                        "proposal submitted"
                    );
                    return Ok(ProposalSubmission {
                        proposal_id,
                        tx,
                        bond_amount: required,
                        collateral_asset: ctx.collateral_asset,
                        oracle_address: ctx.oracle_address,
                        submitted_at: Utc::now(),
                    });
                }
                Err(error) => {
                    warn!(version = version.name, %error, "proposal simulation failed");
                    attempts.push(AttemptFailure {
                        version: version.name,
                        message: error.to_string(),
                    });
                }
            }
        }
        Err(SubmitError::VersionFallbackExhausted { attempts })
    }

    async fn ensure_allowance(
        &self,
        collateral: Address,
        required: U256,
    ) -> std::result::Result<(), SubmitError> {
        let current = erc20::allowance(
            &self.ledger,
            collateral,
            self.config.signer,
            self.config.module,
        )
        .await?;
        if current >= required {
            return Ok(());
        }
        erc20::approve(
            &self.ledger,
            self.config.signer,
            collateral,
            self.config.module,
            required,
        )
        .await?;
        let allowance = erc20::allowance(
            &self.ledger,
            collateral,
            self.config.signer,
            self.config.module,
        )
        .await?;
        if allowance < required {
            return Err(SubmitError::AllowanceShortfall {
                required,
                allowance,
            });
        }
        Ok(())
    }
}

fn transactions_token(calls: &[LowLevelCall]) -> Token {
    Token::Array(
        calls
            .iter()
            .map(|call| {
                Token::Tuple(vec![
                    Token::Address(call.target),
                    Token::Uint(U256::from(call.call_kind.operation())),
                    Token::Uint(call.value),
                    Token::Bytes(call.data.to_vec()),
                ])
            })
            .collect(),
    )
}

/// Deterministic proposal handle: the hash of the encoded call batch.
fn proposal_id(transactions: &Token) -> std::result::Result<B256, SubmitError> {
    let encoded = encode_tokens(std::slice::from_ref(transactions)).map_err(ChainError::from)?;
    Ok(keccak256(&encoded))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::TransferLog;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use vaultward_abi::selector;

    fn word(value: U256) -> Vec<u8> {
        value.to_be_bytes::<32>().to_vec()
    }

    fn address_word(address: Address) -> Vec<u8> {
        let mut out = vec![0u8; 12];
        out.extend_from_slice(address.as_slice());
        out
    }

    struct ScriptedLedger {
        balance: U256,
        allowance: Mutex<U256>,
        minimum_bond: U256,
        native: U256,
        approve_effective: bool,
        explained_simulation_ok: bool,
        bare_simulation_ok: bool,
        sent: Mutex<Vec<Vec<u8>>>,
    }

    impl Default for ScriptedLedger {
        fn default() -> Self {
            Self {
                balance: U256::from(1_000_000u64),
                allowance: Mutex::new(U256::ZERO),
                minimum_bond: U256::ZERO,
                native: U256::from(1u64),
                approve_effective: true,
                explained_simulation_ok: true,
                bare_simulation_ok: true,
                sent: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Ledger for ScriptedLedger {
        async fn block_number(&self) -> Result<u64> {
            Ok(0)
        }

        async fn transfer_logs(
            &self,
            _: Address,
            _: Address,
            _: u64,
            _: u64,
        ) -> Result<Vec<TransferLog>> {
            Ok(Vec::new())
        }

        async fn native_balance(&self, _: Address) -> Result<U256> {
            Ok(self.native)
        }

        async fn call(&self, _: Option<Address>, _: Address, data: &[u8]) -> Result<Vec<u8>> {
            let sel: [u8; 4] = data[..4].try_into().unwrap();
            if sel == selector("balanceOf(address)") {
                return Ok(word(self.balance));
            }
            if sel == selector("allowance(address,address)") {
                return Ok(word(*self.allowance.lock().unwrap()));
            }
            if sel == selector("getMinimumBond(address)") {
                return Ok(word(self.minimum_bond));
            }
            if sel == selector("proposeTransactions((address,uint8,uint256,bytes)[],bytes)") {
                return if self.explained_simulation_ok {
                    Ok(Vec::new())
                } else {
                    Err(ChainError::Rpc {
                        method: "eth_call".to_string(),
                        message: "execution reverted: explained shape".to_string(),
                    })
                };
            }
            if sel == selector("proposeTransactions((address,uint8,uint256,bytes)[])") {
                return if self.bare_simulation_ok {
                    Ok(Vec::new())
                } else {
                    Err(ChainError::Rpc {
                        method: "eth_call".to_string(),
                        message: "execution reverted: bare shape".to_string(),
                    })
                };
            }
            if sel == selector("collateral()") || sel == selector("optimisticOracleV3()") {
                return Ok(address_word(Address::repeat_byte(0x05)));
            }
            if sel == selector("bondAmount()") || sel == selector("liveness()") {
                return Ok(word(U256::from(7200u64)));
            }
            if sel == selector("identifier()") {
                return Ok(B256::repeat_byte(0x1d).to_vec());
            }
            if sel == selector("rules()") {
                return Ok(encode_tokens(&[Token::String("hold".to_string())]).unwrap());
            }
            panic!("unscripted selector {}", hex::encode(sel));
        }

        async fn send_transaction(
            &self,
            _: Address,
            _: Address,
            _: U256,
            data: &[u8],
        ) -> Result<B256> {
            if data[..4] == selector("approve(address,uint256)")[..] && self.approve_effective {
                *self.allowance.lock().unwrap() = U256::from_be_slice(&data[36..68]);
            }
            self.sent.lock().unwrap().push(data.to_vec());
            Ok(B256::repeat_byte(0x77))
        }

        async fn transaction_succeeded(&self, _: B256) -> Result<Option<bool>> {
            Ok(Some(true))
        }
    }

    fn ctx() -> VaultContext {
        VaultContext {
            collateral_asset: Address::repeat_byte(0x0c),
            bond_amount: U256::from(500u64),
            oracle_address: Address::repeat_byte(0x0e),
            rules: "hold".to_string(),
            liveness_secs: 7200,
            identifier: B256::repeat_byte(0x1d),
        }
    }

    fn config() -> SubmitterConfig {
        SubmitterConfig {
            module: Address::repeat_byte(0x0d),
            signer: Address::repeat_byte(0x0f),
        }
    }

    fn one_call() -> Vec<LowLevelCall> {
        vec![LowLevelCall::new(
            Address::repeat_byte(0x31),
            U256::ZERO,
            vec![0xde, 0xad],
        )]
    }

    #[tokio::test]
    async fn bond_shortfall_fails_before_any_write() {
        let ledger = ScriptedLedger {
            balance: U256::from(100u64),
            ..ScriptedLedger::default()
        };
        let submitter = Submitter::new(&ledger, config());
        let err = submitter.submit(&one_call(), &ctx(), "x").await.unwrap_err();
        assert!(matches!(
            err,
            SubmitError::InsufficientBond { required, available }
                if required == U256::from(500u64) && available == U256::from(100u64)
        ));
        assert!(ledger.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn required_bond_is_the_max_of_module_and_oracle_minimum() {
        let ledger = ScriptedLedger {
            minimum_bond: U256::from(900u64),
            balance: U256::from(899u64),
            ..ScriptedLedger::default()
        };
        let submitter = Submitter::new(&ledger, config());
        let err = submitter.submit(&one_call(), &ctx(), "x").await.unwrap_err();
        assert!(matches!(
            err,
            SubmitError::InsufficientBond { required, .. } if required == U256::from(900u64)
        ));
    }

    #[tokio::test]
    async fn ineffective_approval_is_fatal_not_silent() {
        let ledger = ScriptedLedger {
            approve_effective: false,
            ..ScriptedLedger::default()
        };
        let submitter = Submitter::new(&ledger, config());
        let err = submitter.submit(&one_call(), &ctx(), "x").await.unwrap_err();
        assert!(matches!(err, SubmitError::AllowanceShortfall { .. }));
    }

    #[tokio::test]
    async fn zero_native_balance_blocks_submission() {
        let ledger = ScriptedLedger {
            native: U256::ZERO,
            ..ScriptedLedger::default()
        };
        let submitter = Submitter::new(&ledger, config());
        let err = submitter.submit(&one_call(), &ctx(), "x").await.unwrap_err();
        assert!(matches!(err, SubmitError::NoNativeBalance));
    }

    #[tokio::test]
    async fn falls_back_to_the_older_interface_when_the_newest_reverts() {
        let ledger = ScriptedLedger {
            explained_simulation_ok: false,
            ..ScriptedLedger::default()
        };
        let submitter = Submitter::new(&ledger, config());
        let submission = submitter.submit(&one_call(), &ctx(), "x").await.unwrap();
        assert_eq!(submission.bond_amount, U256::from(500u64));
        // the receipt handle carries the submission transaction hash
        assert_eq!(submission.tx, B256::repeat_byte(0x77));

        let sent = ledger.sent.lock().unwrap();
        // approve first, then the bare-shape proposal
        assert_eq!(sent.len(), 2);
        assert_eq!(
            sent[1][..4],
            selector("proposeTransactions((address,uint8,uint256,bytes)[])")[..]
        );
    }

    #[tokio::test]
    async fn exhausted_fallback_retains_every_attempt_failure() {
        let ledger = ScriptedLedger {
            explained_simulation_ok: false,
            bare_simulation_ok: false,
            ..ScriptedLedger::default()
        };
        let submitter = Submitter::new(&ledger, config());
        let err = submitter.submit(&one_call(), &ctx(), "x").await.unwrap_err();
        match err {
            SubmitError::VersionFallbackExhausted { attempts } => {
                assert_eq!(attempts.len(), 2);
                assert_eq!(attempts[0].version, "proposeTransactions/explained");
                assert!(attempts[0].message.contains("explained shape"));
                assert_eq!(attempts[1].version, "proposeTransactions/bare");
                assert!(attempts[1].message.contains("bare shape"));
            }
            other => panic!("expected exhausted fallback, got {other}"),
        }
        // nothing but the approve went out
        assert_eq!(ledger.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn context_reads_decode_into_a_snapshot() {
        let ledger = ScriptedLedger::default();
        let governor = GovernorClient::new(&ledger, config().module);
        let context = governor.context().await.unwrap();
        assert_eq!(context.collateral_asset, Address::repeat_byte(0x05));
        assert_eq!(context.bond_amount, U256::from(7200u64));
        assert_eq!(context.rules, "hold");
        assert_eq!(context.liveness_secs, 7200);
        assert_eq!(context.identifier, B256::repeat_byte(0x1d));
    }
}
