//! Serialized execution platform for pool operations
//!
//! Each pool record sits behind its own mutex. An operation locks exactly one
//! record for its whole duration, settles its movements on the ledger, then
//! commits the new reserve record. Pools never share a lock with each other.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use solana_program::pubkey::Pubkey;

use crate::authority::{PoolAuthority, SignerSet};
use crate::error::PoolError;
use crate::ledger::{Ledger, MemoryLedger};
use crate::pda::{derive_share_account_pda, PoolAddresses};
use crate::state::{PoolConfig, PoolState};

/// Pool state plus the capability that controls its reserves
#[derive(Debug)]
pub(crate) struct PoolRecord {
    pub(crate) state: PoolState,
    pub(crate) authority: PoolAuthority,
}

/// Accounts a liquidity provider deposits from and withdraws into.
///
/// Shares are held at the owner's derived share account, see
/// [`Exchange::share_account`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiquidityAccounts {
    /// Signer owning the accounts below
    pub owner: Pubkey,
    /// Base asset account
    pub base_account: Pubkey,
    /// Native coin account
    pub native_account: Pubkey,
}

/// Accounts a trader swaps between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapAccounts {
    /// Signer owning `source`
    pub owner: Pubkey,
    /// Account of the input asset
    pub source: Pubkey,
    /// Account receiving the output asset
    pub destination: Pubkey,
}

/// Pool registry over an asset ledger
pub struct Exchange<L: Ledger = MemoryLedger> {
    program_id: Pubkey,
    ledger: L,
    pools: RwLock<HashMap<Pubkey, Arc<Mutex<PoolRecord>>>>,
    default_config: PoolConfig,
}

impl Exchange<MemoryLedger> {
    /// Exchange over a fresh in-memory ledger
    pub fn in_memory(program_id: Pubkey) -> Self {
        Self::new(program_id, MemoryLedger::new())
    }
}

impl<L: Ledger> Exchange<L> {
    pub fn new(program_id: Pubkey, ledger: L) -> Self {
        Self {
            program_id,
            ledger,
            pools: RwLock::new(HashMap::new()),
            default_config: PoolConfig::default(),
        }
    }

    /// Pricing policy applied by `initialize`
    pub fn with_default_config(mut self, config: PoolConfig) -> Result<Self, PoolError> {
        config.validate()?;
        self.default_config = config;
        Ok(self)
    }

    pub fn program_id(&self) -> &Pubkey {
        &self.program_id
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn default_config(&self) -> PoolConfig {
        self.default_config
    }

    /// Derived identifiers for `base_asset` under this exchange's program id
    pub fn addresses(&self, base_asset: &Pubkey) -> PoolAddresses {
        PoolAddresses::derive(&self.program_id, base_asset)
    }

    /// Derived share account of `owner` in the pool at `pool_state`, opened on
    /// the owner's first deposit
    pub fn share_account(&self, pool_state: &Pubkey, owner: &Pubkey) -> Pubkey {
        derive_share_account_pda(&self.program_id, pool_state, owner).0
    }

    /// Snapshot of a pool by its state identifier
    pub fn pool_state(&self, pool_state: &Pubkey) -> Option<PoolState> {
        let record = self.pools.read().get(pool_state).cloned()?;
        let state = record.lock().state;
        Some(state)
    }

    /// Snapshot of the pool created for `base_asset`
    pub fn pool_for_base(&self, base_asset: &Pubkey) -> Option<PoolState> {
        self.pool_state(&self.addresses(base_asset).pool_state)
    }

    /// Number of initialized pools
    pub fn pool_count(&self) -> usize {
        self.pools.read().len()
    }

    pub(crate) fn record(&self, pool_state: &Pubkey) -> Result<Arc<Mutex<PoolRecord>>, PoolError> {
        self.pools.read().get(pool_state).cloned().ok_or(PoolError::NotFound)
    }

    pub(crate) fn pools(&self) -> &RwLock<HashMap<Pubkey, Arc<Mutex<PoolRecord>>>> {
        &self.pools
    }
}

/// Reject an operation the named user did not sign
pub(crate) fn require_signer(signers: &SignerSet, key: &Pubkey) -> Result<(), PoolError> {
    if !signers.is_user_signer(key) {
        log::warn!("missing signature from {}", key);
        return Err(PoolError::MissingSignature);
    }
    Ok(())
}

/// Reject user-supplied accounts that alias one of the pool's own accounts
pub(crate) fn reject_pool_aliases(state: &PoolState, accounts: &[Pubkey]) -> Result<(), PoolError> {
    let owned = [state.reserve0_id, state.reserve1_id, state.share_mint_id, state.authority_id];
    if accounts.iter().any(|a| owned.contains(a)) {
        return Err(PoolError::InvalidInput("user account aliases a pool account"));
    }
    Ok(())
}
