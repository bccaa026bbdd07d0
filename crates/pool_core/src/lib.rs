//! Duopool core - two-asset liquidity pool (base token <-> native coin)
//!
//! The pool is a state-transition function over an abstract asset ledger:
//! - Address derivation for the five per-pool identifiers
//! - Pool lifecycle (state record, share mint, reserve custody accounts)
//! - Liquidity accounting (proportional share mint/burn)
//! - Swap engine (constant product or fixed rate, input fee)
//! - Serialized per-pool execution through [`Exchange`]

pub mod authority;
pub mod curve;
pub mod error;
pub mod exchange;
pub mod instruction;
pub mod ledger;
pub mod lifecycle;
pub mod liquidity;
pub mod pda;
pub mod processor;
pub mod state;
pub mod swap;


pub use authority::*;
pub use curve::{PricingCurve, SwapQuote};
pub use error::*;
pub use exchange::*;
pub use liquidity::{Deposit, Withdrawal};
pub use ledger::*;
pub use pda::*;
pub use state::*;

/// Decimals of the share mint and of the native coin
pub const DECIMALS: u8 = 9;
