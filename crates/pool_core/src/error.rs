//! Pool error kinds

use solana_program::program_error::ProgramError;
use thiserror::Error;

use crate::pda::AddressRole;

/// Every way a pool operation can be rejected.
///
/// All kinds are terminal for the submitted operation. Validation kinds
/// (`InvalidInput`, `AddressMismatch`, `MissingSignature`, `InvalidInstruction`)
/// are raised before any state is touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("pool or account already exists")]
    AlreadyExists,

    #[error("pool or account not found")]
    NotFound,

    #[error("insufficient funds")]
    InsufficientFunds,

    #[error("insufficient shares")]
    InsufficientShares,

    #[error("insufficient reserve")]
    InsufficientReserve,

    #[error("deposit does not match the pool reserve ratio")]
    RatioMismatch,

    #[error("arithmetic overflow")]
    Overflow,

    #[error("{0} address does not match the derived address")]
    AddressMismatch(AddressRole),

    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    #[error("missing required signature")]
    MissingSignature,

    #[error("output below the requested minimum")]
    SlippageExceeded,

    #[error("invalid instruction data")]
    InvalidInstruction,
}

impl PoolError {
    /// Stable numeric code, used as the custom program error value
    pub fn code(&self) -> u32 {
        match self {
            PoolError::AlreadyExists => 0,
            PoolError::NotFound => 1,
            PoolError::InsufficientFunds => 2,
            PoolError::InsufficientShares => 3,
            PoolError::InsufficientReserve => 4,
            PoolError::RatioMismatch => 5,
            PoolError::Overflow => 6,
            PoolError::AddressMismatch(_) => 7,
            PoolError::InvalidInput(_) => 8,
            PoolError::MissingSignature => 9,
            PoolError::SlippageExceeded => 10,
            PoolError::InvalidInstruction => 11,
        }
    }
}

impl From<PoolError> for ProgramError {
    fn from(e: PoolError) -> Self {
        ProgramError::Custom(e.code())
    }
}
