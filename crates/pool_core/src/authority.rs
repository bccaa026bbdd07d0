//! Pool authority capability and transaction signer sets

use solana_program::pubkey::Pubkey;

use crate::ledger::Custody;

/// Capability to move funds out of a pool's reserves and mint its shares.
///
/// Only the lifecycle manager can create one, and it never leaves the pool
/// record. There is no key material: holding the value is the permission.
#[derive(Debug)]
pub struct PoolAuthority {
    address: Pubkey,
    bump: u8,
}

impl PoolAuthority {
    pub(crate) fn new(address: Pubkey, bump: u8) -> Self {
        Self { address, bump }
    }

    /// Derived authority address (public identifier, not a credential)
    pub fn address(&self) -> Pubkey {
        self.address
    }

    /// Bump seed of the authority PDA
    pub fn bump(&self) -> u8 {
        self.bump
    }
}

/// Parties that signed an operation
#[derive(Debug, Clone, Default)]
pub struct SignerSet {
    users: Vec<Pubkey>,
    authority: Option<Pubkey>,
}

impl SignerSet {
    /// Signer set of externally signed keys
    pub fn new(users: &[Pubkey]) -> Self {
        Self {
            users: users.to_vec(),
            authority: None,
        }
    }

    /// Attach a pool authority capability
    pub(crate) fn with_authority(mut self, authority: &PoolAuthority) -> Self {
        self.authority = Some(authority.address);
        self
    }

    /// Whether `key` signed as a user
    pub fn is_user_signer(&self, key: &Pubkey) -> bool {
        self.users.contains(key)
    }

    /// Whether this set authorizes spending from an entry controlled by `owner`.
    ///
    /// Pool-custody entries require the authority capability; a user signature
    /// over the authority address does not count.
    pub fn authorizes(&self, owner: &Pubkey, custody: Custody) -> bool {
        match custody {
            Custody::User => self.is_user_signer(owner),
            Custody::Pool => self.authority.as_ref() == Some(owner),
        }
    }
}
