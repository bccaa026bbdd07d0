//! Instruction wire format and builders
//!
//! Layout: one discriminator byte followed by little-endian `u64` fields.
//!
//! | tag | instruction       | fields                         |
//! |-----|-------------------|--------------------------------|
//! | 0   | Initialize        |                                |
//! | 1   | InitializePool    |                                |
//! | 2   | AddLiquidity      | base_amount, native_amount     |
//! | 3   | RemoveLiquidity   | shares                         |
//! | 4   | Swap (base in)    | amount_in, min_amount_out      |
//! | 5   | Swap (native in)  | amount_in, min_amount_out      |

use solana_program::instruction::{AccountMeta, Instruction};
use solana_program::pubkey::Pubkey;

use crate::error::PoolError;
use crate::exchange::{LiquidityAccounts, SwapAccounts};
use crate::pda::{derive_share_account_pda, PoolAddresses};
use crate::state::AssetSide;

/// Decoded pool instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolInstruction {
    Initialize,
    InitializePool,
    AddLiquidity { base_amount: u64, native_amount: u64 },
    RemoveLiquidity { shares: u64 },
    Swap { input: AssetSide, amount_in: u64, min_amount_out: u64 },
}

/// Sequential bounds-checked reader over instruction data
pub struct InstructionReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> InstructionReader<'a> {
    #[inline]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.offset)
    }

    /// Read a u8 and advance offset
    #[inline]
    pub fn read_u8(&mut self) -> Result<u8, PoolError> {
        let val = *self.data.get(self.offset).ok_or(PoolError::InvalidInstruction)?;
        self.offset += 1;
        Ok(val)
    }

    /// Read a little-endian u64 and advance offset
    #[inline]
    pub fn read_u64(&mut self) -> Result<u64, PoolError> {
        let bytes: [u8; 8] = self
            .data
            .get(self.offset..self.offset + 8)
            .and_then(|s| s.try_into().ok())
            .ok_or(PoolError::InvalidInstruction)?;
        self.offset += 8;
        Ok(u64::from_le_bytes(bytes))
    }

    /// Fail if any bytes are left unread
    #[inline]
    pub fn finish(&self) -> Result<(), PoolError> {
        if self.remaining() != 0 {
            return Err(PoolError::InvalidInstruction);
        }
        Ok(())
    }
}

impl PoolInstruction {
    /// Wire discriminator
    pub fn tag(&self) -> u8 {
        match self {
            PoolInstruction::Initialize => 0,
            PoolInstruction::InitializePool => 1,
            PoolInstruction::AddLiquidity { .. } => 2,
            PoolInstruction::RemoveLiquidity { .. } => 3,
            PoolInstruction::Swap { input: AssetSide::Base, .. } => 4,
            PoolInstruction::Swap { input: AssetSide::Native, .. } => 5,
        }
    }

    pub fn pack(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(17);
        data.push(self.tag());
        match *self {
            PoolInstruction::Initialize | PoolInstruction::InitializePool => {}
            PoolInstruction::AddLiquidity { base_amount, native_amount } => {
                data.extend_from_slice(&base_amount.to_le_bytes());
                data.extend_from_slice(&native_amount.to_le_bytes());
            }
            PoolInstruction::RemoveLiquidity { shares } => {
                data.extend_from_slice(&shares.to_le_bytes());
            }
            PoolInstruction::Swap { amount_in, min_amount_out, .. } => {
                data.extend_from_slice(&amount_in.to_le_bytes());
                data.extend_from_slice(&min_amount_out.to_le_bytes());
            }
        }
        data
    }

    pub fn unpack(data: &[u8]) -> Result<Self, PoolError> {
        let mut reader = InstructionReader::new(data);
        let instruction = match reader.read_u8()? {
            0 => PoolInstruction::Initialize,
            1 => PoolInstruction::InitializePool,
            2 => PoolInstruction::AddLiquidity {
                base_amount: reader.read_u64()?,
                native_amount: reader.read_u64()?,
            },
            3 => PoolInstruction::RemoveLiquidity { shares: reader.read_u64()? },
            tag @ (4 | 5) => PoolInstruction::Swap {
                input: if tag == 4 { AssetSide::Base } else { AssetSide::Native },
                amount_in: reader.read_u64()?,
                min_amount_out: reader.read_u64()?,
            },
            _ => return Err(PoolError::InvalidInstruction),
        };
        reader.finish()?;
        Ok(instruction)
    }
}

/// Accounts: payer (signer), pool state, authority, share mint, base asset
pub fn initialize(program_id: &Pubkey, payer: &Pubkey, base_asset: &Pubkey) -> Instruction {
    let addrs = PoolAddresses::derive(program_id, base_asset);
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*payer, true),
            AccountMeta::new(addrs.pool_state, false),
            AccountMeta::new_readonly(addrs.authority, false),
            AccountMeta::new(addrs.share_mint, false),
            AccountMeta::new_readonly(*base_asset, false),
        ],
        data: PoolInstruction::Initialize.pack(),
    }
}

/// Accounts: payer (signer), pool state, authority, reserve0, reserve1, base asset
pub fn initialize_pool(program_id: &Pubkey, payer: &Pubkey, base_asset: &Pubkey) -> Instruction {
    let addrs = PoolAddresses::derive(program_id, base_asset);
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*payer, true),
            AccountMeta::new(addrs.pool_state, false),
            AccountMeta::new_readonly(addrs.authority, false),
            AccountMeta::new(addrs.reserve0, false),
            AccountMeta::new(addrs.reserve1, false),
            AccountMeta::new_readonly(*base_asset, false),
        ],
        data: PoolInstruction::InitializePool.pack(),
    }
}

fn liquidity_accounts(program_id: &Pubkey, addrs: &PoolAddresses, user: &LiquidityAccounts) -> Vec<AccountMeta> {
    let (share_account, _) = derive_share_account_pda(program_id, &addrs.pool_state, &user.owner);
    vec![
        AccountMeta::new_readonly(user.owner, true),
        AccountMeta::new(addrs.pool_state, false),
        AccountMeta::new_readonly(addrs.authority, false),
        AccountMeta::new(addrs.reserve0, false),
        AccountMeta::new(addrs.reserve1, false),
        AccountMeta::new(addrs.share_mint, false),
        AccountMeta::new(user.base_account, false),
        AccountMeta::new(user.native_account, false),
        AccountMeta::new(share_account, false),
    ]
}

/// Accounts: owner (signer), pool state, authority, reserve0, reserve1,
/// share mint, base account, native account, owner's derived share account
pub fn add_liquidity(
    program_id: &Pubkey,
    base_asset: &Pubkey,
    user: &LiquidityAccounts,
    base_amount: u64,
    native_amount: u64,
) -> Instruction {
    let addrs = PoolAddresses::derive(program_id, base_asset);
    Instruction {
        program_id: *program_id,
        accounts: liquidity_accounts(program_id, &addrs, user),
        data: PoolInstruction::AddLiquidity { base_amount, native_amount }.pack(),
    }
}

/// Same accounts as [`add_liquidity`]
pub fn remove_liquidity(
    program_id: &Pubkey,
    base_asset: &Pubkey,
    user: &LiquidityAccounts,
    shares: u64,
) -> Instruction {
    let addrs = PoolAddresses::derive(program_id, base_asset);
    Instruction {
        program_id: *program_id,
        accounts: liquidity_accounts(program_id, &addrs, user),
        data: PoolInstruction::RemoveLiquidity { shares }.pack(),
    }
}

/// Accounts: owner (signer), pool state, authority, reserve0, reserve1,
/// source, destination
pub fn swap(
    program_id: &Pubkey,
    base_asset: &Pubkey,
    user: &SwapAccounts,
    input: AssetSide,
    amount_in: u64,
    min_amount_out: u64,
) -> Instruction {
    let addrs = PoolAddresses::derive(program_id, base_asset);
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(user.owner, true),
            AccountMeta::new(addrs.pool_state, false),
            AccountMeta::new_readonly(addrs.authority, false),
            AccountMeta::new(addrs.reserve0, false),
            AccountMeta::new(addrs.reserve1, false),
            AccountMeta::new(user.source, false),
            AccountMeta::new(user.destination, false),
        ],
        data: PoolInstruction::Swap { input, amount_in, min_amount_out }.pack(),
    }
}
