//! Swap engine: one operation, parameterized by the input side

use solana_program::pubkey::Pubkey;

use crate::authority::SignerSet;
use crate::curve::SwapQuote;
use crate::error::PoolError;
use crate::exchange::{reject_pool_aliases, require_signer, Exchange, SwapAccounts};
use crate::ledger::{Ledger, Movement};
use crate::state::{AssetSide, PoolStage, PoolState, ReserveLedger};

/// Price a swap of `amount_in` of `input` against the pool's current reserves
pub fn quote(state: &PoolState, input: AssetSide, amount_in: u64) -> Result<SwapQuote, PoolError> {
    state.require_reserves()?;
    if state.stage() != PoolStage::Funded {
        return Err(PoolError::InsufficientReserve);
    }
    state.config.curve.quote(
        state.config.fee_bps,
        input,
        amount_in,
        state.ledger.reserve(input),
        state.ledger.reserve(input.opposite()),
    )
}

/// Reserve record after applying `quote`
pub fn apply(ledger: &ReserveLedger, quote: &SwapQuote) -> ReserveLedger {
    let mut after = *ledger;
    *after.reserve_mut(quote.input) = quote.new_reserve_in;
    *after.reserve_mut(quote.input.opposite()) = quote.new_reserve_out;
    after
}

impl<L: Ledger> Exchange<L> {
    /// Read-only preview of a swap
    pub fn quote_swap(
        &self,
        pool_state: &Pubkey,
        input: AssetSide,
        amount_in: u64,
    ) -> Result<SwapQuote, PoolError> {
        let state = self.pool_state(pool_state).ok_or(PoolError::NotFound)?;
        quote(&state, input, amount_in)
    }

    /// Swap `amount_in` of `input` from `accounts.source` into the pool and pay
    /// the other asset to `accounts.destination`.
    ///
    /// `min_amount_out` of 0 disables the slippage check.
    pub fn swap(
        &self,
        pool_state: &Pubkey,
        accounts: &SwapAccounts,
        input: AssetSide,
        amount_in: u64,
        min_amount_out: u64,
        signers: &SignerSet,
    ) -> Result<SwapQuote, PoolError> {
        require_signer(signers, &accounts.owner)?;
        if amount_in == 0 {
            return Err(PoolError::InvalidInput("swap amount must be positive"));
        }

        let record = self.record(pool_state)?;
        let mut record = record.lock();
        reject_pool_aliases(&record.state, &[accounts.source, accounts.destination])?;

        let state = record.state;
        let quote = quote(&state, input, amount_in)?;
        if quote.amount_out < min_amount_out {
            log::debug!(
                "pool {}: swap output {} below minimum {}",
                pool_state,
                quote.amount_out,
                min_amount_out
            );
            return Err(PoolError::SlippageExceeded);
        }

        let movements = [
            Movement::Transfer {
                from: accounts.source,
                to: state.reserve_id(input),
                amount: amount_in,
            },
            Movement::Transfer {
                from: state.reserve_id(input.opposite()),
                to: accounts.destination,
                amount: quote.amount_out,
            },
        ];
        let signers = signers.clone().with_authority(&record.authority);
        self.ledger().settle(&movements, &signers)?;

        let after = apply(&state.ledger, &quote);
        record.state.commit(after);
        log::debug!(
            "pool {}: swap {} {:?} -> {} (fee {}, reserves {} / {})",
            pool_state,
            amount_in,
            input,
            quote.amount_out,
            quote.fee,
            after.reserve0,
            after.reserve1
        );
        Ok(quote)
    }

    pub fn swap_base_for_native(
        &self,
        pool_state: &Pubkey,
        accounts: &SwapAccounts,
        base_in: u64,
        min_amount_out: u64,
        signers: &SignerSet,
    ) -> Result<SwapQuote, PoolError> {
        self.swap(pool_state, accounts, AssetSide::Base, base_in, min_amount_out, signers)
    }

    pub fn swap_native_for_base(
        &self,
        pool_state: &Pubkey,
        accounts: &SwapAccounts,
        native_in: u64,
        min_amount_out: u64,
        signers: &SignerSet,
    ) -> Result<SwapQuote, PoolError> {
        self.swap(pool_state, accounts, AssetSide::Native, native_in, min_amount_out, signers)
    }
}
