//! Pool state - reserve ledger record and lifecycle stage

use solana_program::pubkey::Pubkey;

use crate::curve::PricingCurve;
use crate::error::PoolError;
use crate::pda::PoolAddresses;

/// Price scaling factor (1e9), native units per base unit
pub const PRICE_SCALE: u128 = 1_000_000_000;

/// Basis points scale (10,000 bps = 100%)
pub const BPS_SCALE: u64 = 10_000;

/// One side of the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetSide {
    /// The token mint the pool was created for (reserve0)
    Base,
    /// The native coin (reserve1)
    Native,
}

impl AssetSide {
    pub fn opposite(self) -> Self {
        match self {
            AssetSide::Base => AssetSide::Native,
            AssetSide::Native => AssetSide::Base,
        }
    }
}

/// Pricing policy fixed at pool creation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    pub curve: PricingCurve,
    /// Input fee in basis points, retained by the pool
    pub fee_bps: u16,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            curve: PricingCurve::ConstantProduct,
            fee_bps: 0,
        }
    }
}

impl PoolConfig {
    pub fn validate(&self) -> Result<(), PoolError> {
        if u64::from(self.fee_bps) >= BPS_SCALE {
            return Err(PoolError::InvalidInput("fee must be below 10000 bps"));
        }
        if let PricingCurve::FixedRate { base_per_native } = self.curve {
            if base_per_native == 0 {
                return Err(PoolError::InvalidInput("fixed rate must be positive"));
            }
        }
        Ok(())
    }
}

/// Reserve balances and outstanding shares backing a pool.
///
/// Invariant: `reserve0 == 0 <=> reserve1 == 0 <=> total_shares == 0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReserveLedger {
    /// Base asset reserve
    pub reserve0: u64,
    /// Native coin reserve
    pub reserve1: u64,
    pub total_shares: u64,
}

impl ReserveLedger {
    pub fn is_empty(&self) -> bool {
        self.total_shares == 0
    }

    /// Reserve holding `side`
    pub fn reserve(&self, side: AssetSide) -> u64 {
        match side {
            AssetSide::Base => self.reserve0,
            AssetSide::Native => self.reserve1,
        }
    }

    pub(crate) fn reserve_mut(&mut self, side: AssetSide) -> &mut u64 {
        match side {
            AssetSide::Base => &mut self.reserve0,
            AssetSide::Native => &mut self.reserve1,
        }
    }

    /// Whether the emptiness invariant holds
    pub fn is_consistent(&self) -> bool {
        let empty0 = self.reserve0 == 0;
        let empty1 = self.reserve1 == 0;
        let empty_shares = self.total_shares == 0;
        empty0 == empty1 && empty1 == empty_shares
    }
}

/// Lifecycle stage of a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PoolStage {
    /// State record and share mint exist, reserves not allocated
    StateCreated,
    /// Reserves allocated, no liquidity
    Empty,
    /// Both reserves funded
    Funded,
}

/// Pool state record - one per base asset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolState {
    pub base_asset: Pubkey,
    pub reserve0_id: Pubkey,
    pub reserve1_id: Pubkey,
    pub share_mint_id: Pubkey,
    pub authority_id: Pubkey,
    pub reserves_allocated: bool,
    pub config: PoolConfig,
    pub ledger: ReserveLedger,
    /// Incremented on every committed mutation
    pub seqno: u64,
}

impl PoolState {
    pub(crate) fn new(addresses: &PoolAddresses, config: PoolConfig) -> Self {
        Self {
            base_asset: addresses.base_asset,
            reserve0_id: addresses.reserve0,
            reserve1_id: addresses.reserve1,
            share_mint_id: addresses.share_mint,
            authority_id: addresses.authority,
            reserves_allocated: false,
            config,
            ledger: ReserveLedger::default(),
            seqno: 0,
        }
    }

    pub fn stage(&self) -> PoolStage {
        if !self.reserves_allocated {
            PoolStage::StateCreated
        } else if self.ledger.is_empty() {
            PoolStage::Empty
        } else {
            PoolStage::Funded
        }
    }

    /// Custody account of `side`
    pub fn reserve_id(&self, side: AssetSide) -> Pubkey {
        match side {
            AssetSide::Base => self.reserve0_id,
            AssetSide::Native => self.reserve1_id,
        }
    }

    /// Spot price: native per base, scaled by PRICE_SCALE (0 if empty)
    pub fn spot_price(&self) -> u128 {
        if self.ledger.reserve0 == 0 {
            return 0;
        }
        u128::from(self.ledger.reserve1) * PRICE_SCALE / u128::from(self.ledger.reserve0)
    }

    pub(crate) fn require_reserves(&self) -> Result<(), PoolError> {
        if !self.reserves_allocated {
            return Err(PoolError::NotFound);
        }
        Ok(())
    }

    pub(crate) fn commit(&mut self, ledger: ReserveLedger) {
        self.ledger = ledger;
        self.seqno = self.seqno.wrapping_add(1);
    }
}
