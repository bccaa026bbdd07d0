//! Program derived addresses for a pool
//!
//! Every identifier a pool owns is derived from the base asset and a fixed
//! role tag. Callers and the core compute them independently; the core
//! never trusts a supplied identifier it can recompute.

use core::fmt;

use solana_program::pubkey::Pubkey;

use crate::error::PoolError;

/// Pool state seed: ["pool_state", base_asset]
pub const POOL_STATE_SEED: &[u8] = b"pool_state";

/// Authority seed: ["authority", pool_state]
pub const AUTHORITY_SEED: &[u8] = b"authority";

/// Base reserve seed: ["vault0", pool_state]
pub const RESERVE0_SEED: &[u8] = b"vault0";

/// Native reserve seed: ["vault1", pool_state]
pub const RESERVE1_SEED: &[u8] = b"vault1";

/// Share mint seed: ["pool_mint", pool_state]
pub const SHARE_MINT_SEED: &[u8] = b"pool_mint";

/// Per-owner share account seed: ["shares", pool_state, owner]
pub const SHARE_ACCOUNT_SEED: &[u8] = b"shares";

/// Role of a derived identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressRole {
    PoolState,
    Authority,
    Reserve0,
    Reserve1,
    ShareMint,
    /// A liquidity provider's share account, derived per owner
    ShareAccount,
}

impl fmt::Display for AddressRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AddressRole::PoolState => "pool state",
            AddressRole::Authority => "pool authority",
            AddressRole::Reserve0 => "reserve0",
            AddressRole::Reserve1 => "reserve1",
            AddressRole::ShareMint => "share mint",
            AddressRole::ShareAccount => "share account",
        };
        f.write_str(name)
    }
}

/// Derive pool state PDA
pub fn derive_pool_state_pda(program_id: &Pubkey, base_asset: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[POOL_STATE_SEED, base_asset.as_ref()], program_id)
}

/// Derive pool authority PDA
pub fn derive_authority_pda(program_id: &Pubkey, pool_state: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[AUTHORITY_SEED, pool_state.as_ref()], program_id)
}

/// Derive base reserve PDA
pub fn derive_reserve0_pda(program_id: &Pubkey, pool_state: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[RESERVE0_SEED, pool_state.as_ref()], program_id)
}

/// Derive native reserve PDA
pub fn derive_reserve1_pda(program_id: &Pubkey, pool_state: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[RESERVE1_SEED, pool_state.as_ref()], program_id)
}

/// Derive share mint PDA
pub fn derive_share_mint_pda(program_id: &Pubkey, pool_state: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[SHARE_MINT_SEED, pool_state.as_ref()], program_id)
}

/// Derive the share account PDA of `owner` in a pool
pub fn derive_share_account_pda(program_id: &Pubkey, pool_state: &Pubkey, owner: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[SHARE_ACCOUNT_SEED, pool_state.as_ref(), owner.as_ref()], program_id)
}

/// Reject a share account that is not the one derived for `owner`
pub fn verify_share_account(
    program_id: &Pubkey,
    pool_state: &Pubkey,
    owner: &Pubkey,
    supplied: &Pubkey,
) -> Result<(), PoolError> {
    let (derived, _) = derive_share_account_pda(program_id, pool_state, owner);
    if derived != *supplied {
        log::warn!("share account mismatch for {}: supplied {}, derived {}", owner, supplied, derived);
        return Err(PoolError::AddressMismatch(AddressRole::ShareAccount));
    }
    Ok(())
}

/// The full set of identifiers derived for one base asset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolAddresses {
    pub base_asset: Pubkey,
    pub pool_state: Pubkey,
    pub authority: Pubkey,
    pub reserve0: Pubkey,
    pub reserve1: Pubkey,
    pub share_mint: Pubkey,
    pub authority_bump: u8,
}

impl PoolAddresses {
    /// Derive all pool identifiers for `base_asset`
    pub fn derive(program_id: &Pubkey, base_asset: &Pubkey) -> Self {
        let (pool_state, _) = derive_pool_state_pda(program_id, base_asset);
        let (authority, authority_bump) = derive_authority_pda(program_id, &pool_state);
        let (reserve0, _) = derive_reserve0_pda(program_id, &pool_state);
        let (reserve1, _) = derive_reserve1_pda(program_id, &pool_state);
        let (share_mint, _) = derive_share_mint_pda(program_id, &pool_state);

        Self {
            base_asset: *base_asset,
            pool_state,
            authority,
            reserve0,
            reserve1,
            share_mint,
            authority_bump,
        }
    }

    /// Derived identifier for a pool-wide `role`; share accounts are per owner,
    /// see [`derive_share_account_pda`]
    pub fn get(&self, role: AddressRole) -> Option<Pubkey> {
        match role {
            AddressRole::PoolState => Some(self.pool_state),
            AddressRole::Authority => Some(self.authority),
            AddressRole::Reserve0 => Some(self.reserve0),
            AddressRole::Reserve1 => Some(self.reserve1),
            AddressRole::ShareMint => Some(self.share_mint),
            AddressRole::ShareAccount => None,
        }
    }

    /// Reject a caller-supplied identifier that differs from the derived one
    pub fn verify(&self, role: AddressRole, supplied: &Pubkey) -> Result<(), PoolError> {
        if self.get(role) != Some(*supplied) {
            log::warn!("{} mismatch: supplied {}, derived {:?}", role, supplied, self.get(role));
            return Err(PoolError::AddressMismatch(role));
        }
        Ok(())
    }
}
