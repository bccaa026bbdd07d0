//! Instruction processor
//!
//! Decodes an instruction, checks its signers, recomputes every derived
//! identifier it names and dispatches to the [`Exchange`].

use solana_program::instruction::AccountMeta;
use solana_program::pubkey::Pubkey;

use crate::authority::SignerSet;
use crate::error::PoolError;
use crate::exchange::{Exchange, LiquidityAccounts, SwapAccounts};
use crate::instruction::PoolInstruction;
use crate::ledger::Ledger;
use crate::pda::{verify_share_account, AddressRole, PoolAddresses};

/// Process one instruction against `exchange`
pub fn process_instruction<L: Ledger>(
    exchange: &Exchange<L>,
    program_id: &Pubkey,
    accounts: &[AccountMeta],
    data: &[u8],
) -> Result<(), PoolError> {
    let result = dispatch(exchange, program_id, accounts, data);
    if let Err(e) = &result {
        log::warn!("instruction rejected: {}", e);
    }
    result
}

fn dispatch<L: Ledger>(
    exchange: &Exchange<L>,
    program_id: &Pubkey,
    accounts: &[AccountMeta],
    data: &[u8],
) -> Result<(), PoolError> {
    if program_id != exchange.program_id() {
        return Err(PoolError::InvalidInput("instruction targets another program"));
    }
    let instruction = PoolInstruction::unpack(data)?;

    let signers = signer_set(accounts);
    // Every instruction is signed by its first account
    let signer = account(accounts, 0)?;
    if !signer.is_signer {
        return Err(PoolError::MissingSignature);
    }

    match instruction {
        PoolInstruction::Initialize => {
            let [_, pool_state, authority, share_mint, base_asset] = keys::<5>(accounts)?;
            let addrs = PoolAddresses::derive(program_id, &base_asset);
            addrs.verify(AddressRole::PoolState, &pool_state)?;
            addrs.verify(AddressRole::Authority, &authority)?;
            addrs.verify(AddressRole::ShareMint, &share_mint)?;

            exchange.initialize(&base_asset, &signer.pubkey, &signers)?;
        }
        PoolInstruction::InitializePool => {
            let [_, pool_state, authority, reserve0, reserve1, base_asset] = keys::<6>(accounts)?;
            let addrs = PoolAddresses::derive(program_id, &base_asset);
            addrs.verify(AddressRole::PoolState, &pool_state)?;
            addrs.verify(AddressRole::Authority, &authority)?;
            addrs.verify(AddressRole::Reserve0, &reserve0)?;
            addrs.verify(AddressRole::Reserve1, &reserve1)?;

            exchange.initialize_pool(&pool_state, &signer.pubkey, &signers)?;
        }
        PoolInstruction::AddLiquidity { base_amount, native_amount } => {
            let (pool_state, user) = liquidity_accounts(exchange, accounts)?;
            exchange.add_liquidity(&pool_state, &user, base_amount, native_amount, &signers)?;
        }
        PoolInstruction::RemoveLiquidity { shares } => {
            let (pool_state, user) = liquidity_accounts(exchange, accounts)?;
            exchange.remove_liquidity(&pool_state, &user, shares, &signers)?;
        }
        PoolInstruction::Swap { input, amount_in, min_amount_out } => {
            let [owner, pool_state, authority, reserve0, reserve1, source, destination] =
                keys::<7>(accounts)?;
            let addrs = pool_addresses(exchange, &pool_state)?;
            addrs.verify(AddressRole::Authority, &authority)?;
            addrs.verify(AddressRole::Reserve0, &reserve0)?;
            addrs.verify(AddressRole::Reserve1, &reserve1)?;

            let user = SwapAccounts { owner, source, destination };
            exchange.swap(&pool_state, &user, input, amount_in, min_amount_out, &signers)?;
        }
    }
    Ok(())
}

fn signer_set(accounts: &[AccountMeta]) -> SignerSet {
    let keys: Vec<Pubkey> = accounts.iter().filter(|m| m.is_signer).map(|m| m.pubkey).collect();
    SignerSet::new(&keys)
}

fn account(accounts: &[AccountMeta], index: usize) -> Result<&AccountMeta, PoolError> {
    accounts.get(index).ok_or(PoolError::InvalidInstruction)
}

/// First `N` account keys; extra accounts are ignored
fn keys<const N: usize>(accounts: &[AccountMeta]) -> Result<[Pubkey; N], PoolError> {
    if accounts.len() < N {
        return Err(PoolError::InvalidInstruction);
    }
    let mut keys = [Pubkey::default(); N];
    for (key, meta) in keys.iter_mut().zip(accounts) {
        *key = meta.pubkey;
    }
    Ok(keys)
}

/// Addresses of an existing pool, re-derived from its recorded base asset
fn pool_addresses<L: Ledger>(
    exchange: &Exchange<L>,
    pool_state: &Pubkey,
) -> Result<PoolAddresses, PoolError> {
    let state = exchange.pool_state(pool_state).ok_or(PoolError::NotFound)?;
    let addrs = exchange.addresses(&state.base_asset);
    addrs.verify(AddressRole::PoolState, pool_state)?;
    Ok(addrs)
}

fn liquidity_accounts<L: Ledger>(
    exchange: &Exchange<L>,
    accounts: &[AccountMeta],
) -> Result<(Pubkey, LiquidityAccounts), PoolError> {
    let [owner, pool_state, authority, reserve0, reserve1, share_mint, base_account, native_account, share_account] =
        keys::<9>(accounts)?;
    let addrs = pool_addresses(exchange, &pool_state)?;
    addrs.verify(AddressRole::Authority, &authority)?;
    addrs.verify(AddressRole::Reserve0, &reserve0)?;
    addrs.verify(AddressRole::Reserve1, &reserve1)?;
    addrs.verify(AddressRole::ShareMint, &share_mint)?;
    verify_share_account(exchange.program_id(), &pool_state, &owner, &share_account)?;

    Ok((
        pool_state,
        LiquidityAccounts {
            owner,
            base_account,
            native_account,
        },
    ))
}
