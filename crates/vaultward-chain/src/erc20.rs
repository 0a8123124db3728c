//! Typed ERC-20 reads and writes over a [`Ledger`].

use crate::rpc::Ledger;
use crate::Result;
use alloy_primitives::{Address, B256, U256};
use vaultward_abi::{decode_u256, encode_call, erc20_approve, Token};

pub async fn balance_of<L: Ledger + ?Sized>(
    ledger: &L,
    token: Address,
    owner: Address,
) -> Result<U256> {
    let data = encode_call("balanceOf(address)", &[Token::Address(owner)])?;
    let out = ledger.call(None, token, &data).await?;
    Ok(decode_u256(&out)?)
}

pub async fn allowance<L: Ledger + ?Sized>(
    ledger: &L,
    token: Address,
    owner: Address,
    spender: Address,
) -> Result<U256> {
    let data = encode_call(
        "allowance(address,address)",
        &[Token::Address(owner), Token::Address(spender)],
    )?;
    let out = ledger.call(None, token, &data).await?;
    Ok(decode_u256(&out)?)
}

/// Grant `spender` an allowance of `amount` from the `signer` account.
pub async fn approve<L: Ledger + ?Sized>(
    ledger: &L,
    signer: Address,
    token: Address,
    spender: Address,
    amount: U256,
) -> Result<B256> {
    let data = erc20_approve(spender, amount);
    ledger
        .send_transaction(signer, token, U256::ZERO, &data)
        .await
}
