//! Liquidity accounting: deposits mint shares, burned shares withdraw both legs
//!
//! The first deposit mints `base_amount` shares and fixes the pool price.
//! Later deposits must match the reserve ratio to within one native unit of
//! the exact proportional amount, and mint `total_shares * base / reserve0`.
//! Withdrawals pay `reserve * shares / total_shares` on each leg, rounded
//! down; the remainder stays with the remaining shareholders.

use solana_program::pubkey::Pubkey;

use crate::authority::SignerSet;
use crate::error::PoolError;
use crate::exchange::{reject_pool_aliases, require_signer, Exchange, LiquidityAccounts};
use crate::ledger::{Ledger, Movement};
use crate::state::ReserveLedger;

/// Outcome of a deposit against a reserve snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deposit {
    pub base_amount: u64,
    pub native_amount: u64,
    pub shares: u64,
    pub after: ReserveLedger,
}

/// Outcome of a withdrawal against a reserve snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Withdrawal {
    pub shares: u64,
    pub base_out: u64,
    pub native_out: u64,
    pub after: ReserveLedger,
}

/// Price a deposit of both assets
pub fn deposit(
    ledger: &ReserveLedger,
    base_amount: u64,
    native_amount: u64,
) -> Result<Deposit, PoolError> {
    if base_amount == 0 || native_amount == 0 {
        return Err(PoolError::InvalidInput("deposit amounts must be positive"));
    }

    let shares = if ledger.is_empty() {
        base_amount
    } else {
        if ledger.reserve0 == 0 || ledger.reserve1 == 0 {
            return Err(PoolError::InsufficientReserve);
        }
        let r0 = u128::from(ledger.reserve0);
        let r1 = u128::from(ledger.reserve1);

        // native / base must equal reserve1 / reserve0 up to rounding
        let lhs = u128::from(native_amount) * r0;
        let rhs = u128::from(base_amount) * r1;
        if lhs.abs_diff(rhs) >= r0 {
            return Err(PoolError::RatioMismatch);
        }

        let minted = u128::from(ledger.total_shares) * u128::from(base_amount) / r0;
        u64::try_from(minted).map_err(|_| PoolError::Overflow)?
    };
    if shares == 0 {
        return Err(PoolError::InvalidInput("deposit too small to mint shares"));
    }

    let after = ReserveLedger {
        reserve0: ledger.reserve0.checked_add(base_amount).ok_or(PoolError::Overflow)?,
        reserve1: ledger.reserve1.checked_add(native_amount).ok_or(PoolError::Overflow)?,
        total_shares: ledger.total_shares.checked_add(shares).ok_or(PoolError::Overflow)?,
    };

    Ok(Deposit {
        base_amount,
        native_amount,
        shares,
        after,
    })
}

/// Price a withdrawal of `shares`
pub fn withdraw(ledger: &ReserveLedger, shares: u64) -> Result<Withdrawal, PoolError> {
    if shares == 0 {
        return Err(PoolError::InvalidInput("share amount must be positive"));
    }
    if shares > ledger.total_shares {
        return Err(PoolError::InsufficientShares);
    }

    // Floor division; redeeming every share pays out the reserves exactly
    let total = u128::from(ledger.total_shares);
    let base_out = (u128::from(ledger.reserve0) * u128::from(shares) / total) as u64;
    let native_out = (u128::from(ledger.reserve1) * u128::from(shares) / total) as u64;
    if base_out == 0 && native_out == 0 {
        return Err(PoolError::InvalidInput("withdrawal too small to pay out"));
    }

    let after = ReserveLedger {
        reserve0: ledger.reserve0 - base_out,
        reserve1: ledger.reserve1 - native_out,
        total_shares: ledger.total_shares - shares,
    };

    Ok(Withdrawal {
        shares,
        base_out,
        native_out,
        after,
    })
}

impl<L: Ledger> Exchange<L> {
    /// Deposit both assets into a pool and mint shares to the owner's derived
    /// share account.
    ///
    /// Returns the number of shares minted.
    pub fn add_liquidity(
        &self,
        pool_state: &Pubkey,
        accounts: &LiquidityAccounts,
        base_amount: u64,
        native_amount: u64,
        signers: &SignerSet,
    ) -> Result<u64, PoolError> {
        require_signer(signers, &accounts.owner)?;
        if base_amount == 0 || native_amount == 0 {
            return Err(PoolError::InvalidInput("deposit amounts must be positive"));
        }

        let record = self.record(pool_state)?;
        let mut record = record.lock();
        record.state.require_reserves()?;
        reject_pool_aliases(&record.state, &[accounts.base_account, accounts.native_account])?;
        let share_account = self.share_account(pool_state, &accounts.owner);

        let state = record.state;
        let quote = deposit(&state.ledger, base_amount, native_amount)?;

        let movements = [
            Movement::Transfer {
                from: accounts.base_account,
                to: state.reserve0_id,
                amount: base_amount,
            },
            Movement::Transfer {
                from: accounts.native_account,
                to: state.reserve1_id,
                amount: native_amount,
            },
            Movement::OpenAccount {
                address: share_account,
                mint: state.share_mint_id,
                owner: accounts.owner,
            },
            Movement::MintTo {
                mint: state.share_mint_id,
                to: share_account,
                amount: quote.shares,
            },
        ];
        let signers = signers.clone().with_authority(&record.authority);
        self.ledger().settle(&movements, &signers)?;

        record.state.commit(quote.after);
        log::debug!(
            "pool {}: deposit {} base / {} native -> {} shares (reserves {} / {}, supply {})",
            pool_state,
            base_amount,
            native_amount,
            quote.shares,
            quote.after.reserve0,
            quote.after.reserve1,
            quote.after.total_shares
        );
        Ok(quote.shares)
    }

    /// Burn `shares` from the owner's share account and pay out both reserves
    /// proportionally.
    pub fn remove_liquidity(
        &self,
        pool_state: &Pubkey,
        accounts: &LiquidityAccounts,
        shares: u64,
        signers: &SignerSet,
    ) -> Result<Withdrawal, PoolError> {
        require_signer(signers, &accounts.owner)?;
        if shares == 0 {
            return Err(PoolError::InvalidInput("share amount must be positive"));
        }

        let record = self.record(pool_state)?;
        let mut record = record.lock();
        record.state.require_reserves()?;
        reject_pool_aliases(&record.state, &[accounts.base_account, accounts.native_account])?;
        let share_account = self.share_account(pool_state, &accounts.owner);

        let state = record.state;
        let held = self
            .ledger()
            .token_account(&share_account)
            .filter(|a| a.mint == state.share_mint_id && a.owner == accounts.owner)
            .map(|a| a.amount)
            .unwrap_or(0);
        if held < shares {
            return Err(PoolError::InsufficientShares);
        }

        let quote = withdraw(&state.ledger, shares)?;

        let mut movements = vec![Movement::Burn {
            mint: state.share_mint_id,
            from: share_account,
            amount: shares,
        }];
        if quote.base_out > 0 {
            movements.push(Movement::Transfer {
                from: state.reserve0_id,
                to: accounts.base_account,
                amount: quote.base_out,
            });
        }
        if quote.native_out > 0 {
            movements.push(Movement::Transfer {
                from: state.reserve1_id,
                to: accounts.native_account,
                amount: quote.native_out,
            });
        }
        let signers = signers.clone().with_authority(&record.authority);
        self.ledger().settle(&movements, &signers)?;

        record.state.commit(quote.after);
        log::debug!(
            "pool {}: burn {} shares -> {} base / {} native (reserves {} / {}, supply {})",
            pool_state,
            shares,
            quote.base_out,
            quote.native_out,
            quote.after.reserve0,
            quote.after.reserve1,
            quote.after.total_shares
        );
        Ok(quote)
    }
}
