//! Swap request validation
//!
//! Everything the user typed is checked here, before any network access.

use duopool_core::AssetSide;
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;
use thiserror::Error;

/// Rejected command-line input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("unsupported asset '{0}': expected `base` or `native`")]
    InvalidAsset(String),

    #[error("invalid amount '{value}': {reason}")]
    InvalidAmount { value: String, reason: &'static str },

    #[error("invalid destination account '{0}': not a base58 public key")]
    InvalidDestination(String),

    #[error("selling the base asset needs a source account: pass --source or set base_account")]
    MissingSource,

    #[error("invalid source account '{0}': not a base58 public key")]
    InvalidSource(String),
}

impl RequestError {
    /// Process exit status for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            RequestError::InvalidAsset(_) => 3,
            RequestError::InvalidAmount { .. } => 4,
            RequestError::InvalidDestination(_) => 5,
            RequestError::MissingSource => 6,
            RequestError::InvalidSource(_) => 7,
        }
    }
}

/// Swap arguments that passed validation; the payer is not known yet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapArgs {
    pub input: AssetSide,
    /// Input amount in base units
    pub amount_in: u64,
    /// Minimum acceptable output in base units (0 = no limit)
    pub min_amount_out: u64,
    /// Base asset account to sell from; resolved only when selling base
    pub base_source: Option<Pubkey>,
    pub destination: Pubkey,
}

/// Swap request with every account resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapRequest {
    /// Asset the payer sells
    pub input: AssetSide,
    /// Input amount in base units
    pub amount_in: u64,
    /// Minimum acceptable output in base units (0 = no limit)
    pub min_amount_out: u64,
    /// Account paying the input asset
    pub source: Pubkey,
    /// Account receiving the output asset
    pub destination: Pubkey,
}

/// Raw command-line input
#[derive(Debug, Clone, Default)]
pub struct RawRequest<'a> {
    pub asset: &'a str,
    pub amount: &'a str,
    pub destination: &'a str,
    pub source: Option<&'a str>,
    pub min_out: Option<&'a str>,
}

impl SwapArgs {
    /// Validate `raw` without touching the wallet.
    ///
    /// The base side sells from `raw.source` or, failing that, `base_account`.
    pub fn parse(
        raw: &RawRequest<'_>,
        decimals: u8,
        base_account: Option<Pubkey>,
    ) -> Result<Self, RequestError> {
        let input = parse_asset(raw.asset)?;
        let amount_in = parse_amount(raw.amount, decimals)?;
        if amount_in == 0 {
            return Err(RequestError::InvalidAmount {
                value: raw.amount.to_string(),
                reason: "amount must be positive",
            });
        }
        let destination = Pubkey::from_str(raw.destination)
            .map_err(|_| RequestError::InvalidDestination(raw.destination.to_string()))?;

        let min_amount_out = match raw.min_out {
            Some(value) => parse_amount(value, decimals)?,
            None => 0,
        };

        let base_source = match input {
            AssetSide::Native => None,
            AssetSide::Base => Some(match raw.source {
                Some(value) => Pubkey::from_str(value)
                    .map_err(|_| RequestError::InvalidSource(value.to_string()))?,
                None => base_account.ok_or(RequestError::MissingSource)?,
            }),
        };

        Ok(Self {
            input,
            amount_in,
            min_amount_out,
            base_source,
            destination,
        })
    }

    /// Resolve the source account; selling native pays from the wallet itself
    pub fn for_payer(self, payer: &Pubkey) -> SwapRequest {
        SwapRequest {
            input: self.input,
            amount_in: self.amount_in,
            min_amount_out: self.min_amount_out,
            source: self.base_source.unwrap_or(*payer),
            destination: self.destination,
        }
    }
}

pub fn parse_asset(value: &str) -> Result<AssetSide, RequestError> {
    match value {
        "base" => Ok(AssetSide::Base),
        "native" => Ok(AssetSide::Native),
        other => Err(RequestError::InvalidAsset(other.to_string())),
    }
}

/// Convert a non-negative decimal string into integer units with `decimals`
/// fractional digits, exactly
pub fn parse_amount(value: &str, decimals: u8) -> Result<u64, RequestError> {
    let invalid = |reason: &'static str| RequestError::InvalidAmount {
        value: value.to_string(),
        reason,
    };

    let (whole, frac) = match value.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (value, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(invalid("not a number"));
    }
    if !whole.bytes().chain(frac.bytes()).all(|b| b.is_ascii_digit()) {
        return Err(invalid("not a non-negative decimal number"));
    }
    if frac.len() > usize::from(decimals) {
        return Err(invalid("too many fractional digits"));
    }

    let scale = 10u64
        .checked_pow(u32::from(decimals))
        .ok_or_else(|| invalid("too many decimals"))?;
    let too_large = || invalid("amount too large");

    let whole_units = if whole.is_empty() {
        0
    } else {
        whole.parse::<u64>().map_err(|_| too_large())?
    };
    let frac_units = if frac.is_empty() {
        0
    } else {
        // Right-pad to `decimals` digits: "5" with 9 decimals is 500_000_000
        let padding = 10u64.pow(u32::from(decimals) - frac.len() as u32);
        frac.parse::<u64>().map_err(|_| too_large())? * padding
    };

    whole_units
        .checked_mul(scale)
        .and_then(|units| units.checked_add(frac_units))
        .ok_or_else(too_large)
}
