//! Pool lifecycle: state record creation and reserve allocation

use std::collections::hash_map;
use std::sync::Arc;

use parking_lot::Mutex;
use solana_program::pubkey::Pubkey;

use crate::authority::{PoolAuthority, SignerSet};
use crate::error::PoolError;
use crate::exchange::{require_signer, Exchange, PoolRecord};
use crate::ledger::{Custody, Ledger, Mint, TokenAccount, NATIVE_MINT};
use crate::pda::PoolAddresses;
use crate::state::{PoolConfig, PoolState};
use crate::DECIMALS;

impl<L: Ledger> Exchange<L> {
    /// Create the pool state record and share mint for `base_asset` with the
    /// exchange's default pricing policy
    pub fn initialize(
        &self,
        base_asset: &Pubkey,
        payer: &Pubkey,
        signers: &SignerSet,
    ) -> Result<PoolAddresses, PoolError> {
        self.initialize_with_config(base_asset, payer, self.default_config(), signers)
    }

    /// Create the pool state record and share mint for `base_asset`.
    ///
    /// Reserves are not allocated yet; see [`Exchange::initialize_pool`].
    pub fn initialize_with_config(
        &self,
        base_asset: &Pubkey,
        payer: &Pubkey,
        config: PoolConfig,
        signers: &SignerSet,
    ) -> Result<PoolAddresses, PoolError> {
        require_signer(signers, payer)?;
        if *base_asset == NATIVE_MINT {
            return Err(PoolError::InvalidInput("base asset cannot be the native coin"));
        }
        config.validate()?;

        let addresses = self.addresses(base_asset);

        let mut pools = self.pools().write();
        let slot = match pools.entry(addresses.pool_state) {
            hash_map::Entry::Occupied(_) => return Err(PoolError::AlreadyExists),
            hash_map::Entry::Vacant(slot) => slot,
        };

        // Share supply is controlled by the pool authority alone
        self.ledger().create_mint(
            addresses.share_mint,
            Mint::new(addresses.authority, Custody::Pool, DECIMALS),
        )?;

        let record = PoolRecord {
            state: PoolState::new(&addresses, config),
            authority: PoolAuthority::new(addresses.authority, addresses.authority_bump),
        };
        slot.insert(Arc::new(Mutex::new(record)));

        log::info!(
            "initialized pool {} for base asset {} (payer {}, {:?}, fee {} bps)",
            addresses.pool_state,
            base_asset,
            payer,
            config.curve,
            config.fee_bps
        );
        Ok(addresses)
    }

    /// Allocate both reserve accounts of an initialized pool, empty and under
    /// pool custody
    pub fn initialize_pool(
        &self,
        pool_state: &Pubkey,
        payer: &Pubkey,
        signers: &SignerSet,
    ) -> Result<PoolState, PoolError> {
        require_signer(signers, payer)?;

        let record = self.record(pool_state)?;
        let mut record = record.lock();
        let state = &mut record.state;

        if state.reserves_allocated {
            return Err(PoolError::AlreadyExists);
        }
        // The base mint may be created between the two lifecycle steps
        if self.ledger().mint(&state.base_asset).is_none() {
            log::warn!("base asset mint {} does not exist", state.base_asset);
            return Err(PoolError::NotFound);
        }

        self.ledger().open_accounts(&[
            (
                state.reserve0_id,
                TokenAccount::new(state.base_asset, state.authority_id, Custody::Pool),
            ),
            (
                state.reserve1_id,
                TokenAccount::new(NATIVE_MINT, state.authority_id, Custody::Pool),
            ),
        ])?;

        state.reserves_allocated = true;
        let ledger = state.ledger;
        state.commit(ledger);

        log::info!(
            "allocated reserves {} / {} for pool {}",
            state.reserve0_id,
            state.reserve1_id,
            pool_state
        );
        Ok(*state)
    }
}
