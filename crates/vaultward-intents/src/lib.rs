//! Vaultward Intents - the intent-to-transaction compiler.
//!
//! `compile` translates the oracle's high-level [`ActionIntent`] vocabulary
//! into an ordered list of [`LowLevelCall`]s. It is pure and deterministic,
//! performs no I/O, and is all-or-nothing: a batch that fails midway emits
//! no calls at all.

use alloy_primitives::{Address, B256, U256};
use thiserror::Error;
use vaultward_abi::{bind_arguments, encode_call, erc20_approve, erc20_transfer, parse_signature, Token};
use vaultward_types::{ActionIntent, IntentError, LowLevelCall};

/// Uniswap-style router entrypoint, SwapRouter02 shape (no deadline field).
const EXACT_INPUT_SINGLE: &str =
    "exactInputSingle((address,address,uint24,address,uint256,uint256,uint160))";

/// Conditional-tokens split entrypoint.
const SPLIT_POSITION: &str = "splitPosition(address,bytes32,bytes32,uint256[],uint256)";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error(transparent)]
    Intent(#[from] IntentError),
    #[error("intent {index} ({kind}): {source}")]
    Encoding {
        index: usize,
        kind: &'static str,
        source: vaultward_abi::AbiError,
    },
}

pub type Result<T> = std::result::Result<T, CompileError>;

/// Deployment-level addresses the compiler expands intents against.
#[derive(Debug, Clone, Copy)]
pub struct CompileEnv {
    /// Swap router granted allowances for routed swaps.
    pub router: Address,
    /// Conditional-tokens contract targeted by collateral splits.
    pub conditional_tokens: Address,
}

/// Compile a batch of intents into the calls a proposal will carry.
pub fn compile(intents: &[ActionIntent], env: &CompileEnv) -> Result<Vec<LowLevelCall>> {
    let mut calls = Vec::new();
    for (index, intent) in intents.iter().enumerate() {
        intent.validate(index)?;
        expand(intent, index, env, &mut calls)?;
    }
    Ok(calls)
}

fn expand(
    intent: &ActionIntent,
    index: usize,
    env: &CompileEnv,
    calls: &mut Vec<LowLevelCall>,
) -> Result<()> {
    match intent {
        ActionIntent::AssetTransfer {
            token,
            recipient,
            amount,
        } => {
            calls.push(LowLevelCall::new(
                *token,
                U256::ZERO,
                erc20_transfer(*recipient, *amount),
            ));
        }
        ActionIntent::NativeTransfer { recipient, amount } => {
            calls.push(LowLevelCall::new(*recipient, *amount, Vec::new()));
        }
        ActionIntent::ContractCall {
            target,
            signature,
            args,
            value,
        } => {
            let encode = || -> vaultward_abi::Result<Vec<u8>> {
                let parsed = parse_signature(signature)?;
                let tokens = bind_arguments(&parsed.params, args)?;
                encode_call(&parsed.canonical, &tokens)
            };
            let data = encode().map_err(|source| CompileError::Encoding {
                index,
                kind: intent.kind(),
                source,
            })?;
            calls.push(LowLevelCall::new(*target, *value, data));
        }
        ActionIntent::RoutedSwap {
            token_in,
            token_out,
            fee,
            amount_in,
            min_amount_out,
            recipient,
        } => {
            // The approve must precede the swap in the returned sequence;
            // the router pulls the input amount during exactInputSingle.
            calls.push(LowLevelCall::new(
                *token_in,
                U256::ZERO,
                erc20_approve(env.router, *amount_in),
            ));
            let params = Token::Tuple(vec![
                Token::Address(*token_in),
                Token::Address(*token_out),
                Token::Uint(U256::from(*fee)),
                Token::Address(*recipient),
                Token::Uint(*amount_in),
                Token::Uint(*min_amount_out),
                Token::Uint(U256::ZERO), // no sqrt price limit
            ]);
            let data = encode_call(EXACT_INPUT_SINGLE, &[params]).map_err(|source| {
                CompileError::Encoding {
                    index,
                    kind: intent.kind(),
                    source,
                }
            })?;
            calls.push(LowLevelCall::new(env.router, U256::ZERO, data));
        }
        ActionIntent::CollateralSplit {
            collateral,
            condition_id,
            partition,
            amount,
        } => {
            // Reset-before-set: tokens that forbid approving over an existing
            // nonzero allowance would otherwise revert the whole proposal.
            calls.push(LowLevelCall::new(
                *collateral,
                U256::ZERO,
                erc20_approve(env.conditional_tokens, U256::ZERO),
            ));
            calls.push(LowLevelCall::new(
                *collateral,
                U256::ZERO,
                erc20_approve(env.conditional_tokens, *amount),
            ));
            let args = vec![
                Token::Address(*collateral),
                Token::FixedBytes(B256::ZERO), // root collection
                Token::FixedBytes(*condition_id),
                Token::Array(partition.iter().copied().map(Token::Uint).collect()),
                Token::Uint(*amount),
            ];
            let data =
                encode_call(SPLIT_POSITION, &args).map_err(|source| CompileError::Encoding {
                    index,
                    kind: intent.kind(),
                    source,
                })?;
            calls.push(LowLevelCall::new(env.conditional_tokens, U256::ZERO, data));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vaultward_abi::selector;

    fn env() -> CompileEnv {
        CompileEnv {
            router: Address::repeat_byte(0xaa),
            conditional_tokens: Address::repeat_byte(0xc7),
        }
    }

    fn token(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    #[test]
    fn routed_swap_emits_approve_then_swap() {
        let intent = ActionIntent::RoutedSwap {
            token_in: token(0x01),
            token_out: token(0x02),
            fee: 3000,
            amount_in: U256::from(1_000_000u64),
            min_amount_out: U256::from(990_000u64),
            recipient: token(0x03),
        };
        let calls = compile(&[intent], &env()).unwrap();
        assert_eq!(calls.len(), 2);
        // index 0: allowance grant on the input token
        assert_eq!(calls[0].target, token(0x01));
        assert_eq!(calls[0].data[..4], selector("approve(address,uint256)")[..]);
        // index 1: the swap on the router
        assert_eq!(calls[1].target, env().router);
        assert_eq!(calls[1].data[..4], selector(EXACT_INPUT_SINGLE)[..]);
    }

    #[test]
    fn collateral_split_resets_allowance_before_setting_it() {
        let amount = U256::from(250_000u64);
        let intent = ActionIntent::CollateralSplit {
            collateral: token(0x0a),
            condition_id: B256::repeat_byte(0x5c),
            partition: vec![U256::from(1u64), U256::from(2u64)],
            amount,
        };
        let calls = compile(&[intent], &env()).unwrap();
        assert_eq!(calls.len(), 3);

        let approve_sel = selector("approve(address,uint256)");
        assert_eq!(&calls[0].data[..4], &approve_sel);
        assert_eq!(U256::from_be_slice(&calls[0].data[36..68]), U256::ZERO);
        assert_eq!(&calls[1].data[..4], &approve_sel);
        assert_eq!(U256::from_be_slice(&calls[1].data[36..68]), amount);

        assert_eq!(calls[2].target, env().conditional_tokens);
        assert_eq!(calls[2].data[..4], selector(SPLIT_POSITION)[..]);
        // amount is the final static argument of splitPosition
        let amount_word = &calls[2].data[4 + 4 * 32..4 + 5 * 32];
        assert_eq!(U256::from_be_slice(amount_word), amount);
    }

    #[test]
    fn asset_transfer_is_a_single_token_call() {
        let intent = ActionIntent::AssetTransfer {
            token: token(0x01),
            recipient: token(0x02),
            amount: U256::from(5u64),
        };
        let calls = compile(&[intent], &env()).unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].target, token(0x01));
        assert!(calls[0].value.is_zero());
    }

    #[test]
    fn native_transfer_has_empty_payload() {
        let intent = ActionIntent::NativeTransfer {
            recipient: token(0x02),
            amount: U256::from(7u64),
        };
        let calls = compile(&[intent], &env()).unwrap();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].data.is_empty());
        assert_eq!(calls[0].value, U256::from(7u64));
    }

    #[test]
    fn malformed_contract_call_signature_fails_with_index() {
        let intents = vec![
            ActionIntent::NativeTransfer {
                recipient: token(0x02),
                amount: U256::from(1u64),
            },
            ActionIntent::ContractCall {
                target: token(0x03),
                signature: "notasignature".to_string(),
                args: vec![],
                value: U256::ZERO,
            },
        ];
        let err = compile(&intents, &env()).unwrap_err();
        assert!(err.to_string().contains("intent 1"));
    }

    #[test]
    fn failing_batch_emits_no_calls() {
        let intents = vec![ActionIntent::NativeTransfer {
            recipient: token(0x02),
            amount: U256::ZERO, // fails eager validation
        }];
        assert!(compile(&intents, &env()).is_err());
    }
}
