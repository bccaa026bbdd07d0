//! Abstract asset ledger
//!
//! The pool never owns balances directly. It describes the asset movements
//! an operation needs and hands them to a [`Ledger`], which applies them
//! all-or-nothing.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use solana_program::pubkey::Pubkey;

use crate::authority::SignerSet;
use crate::error::PoolError;
use crate::DECIMALS;

/// Ledger identifier of the native coin
pub const NATIVE_MINT: Pubkey = solana_program::pubkey!("So11111111111111111111111111111111111111112");

/// Who controls an account or mint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Custody {
    /// Controlled by a user signature from `owner`
    User,
    /// Controlled only through a pool authority capability
    Pool,
}

/// Balance of one asset held for one owner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenAccount {
    pub mint: Pubkey,
    pub owner: Pubkey,
    pub custody: Custody,
    pub amount: u64,
}

impl TokenAccount {
    /// Empty account
    pub fn new(mint: Pubkey, owner: Pubkey, custody: Custody) -> Self {
        Self {
            mint,
            owner,
            custody,
            amount: 0,
        }
    }
}

/// Fungible asset definition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mint {
    pub authority: Pubkey,
    pub custody: Custody,
    pub supply: u64,
    pub decimals: u8,
}

impl Mint {
    pub fn new(authority: Pubkey, custody: Custody, decimals: u8) -> Self {
        Self {
            authority,
            custody,
            supply: 0,
            decimals,
        }
    }
}

/// One step of a settlement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Movement {
    /// Create a user-custody account if missing
    OpenAccount {
        address: Pubkey,
        mint: Pubkey,
        owner: Pubkey,
    },
    Transfer {
        from: Pubkey,
        to: Pubkey,
        amount: u64,
    },
    MintTo {
        mint: Pubkey,
        to: Pubkey,
        amount: u64,
    },
    Burn {
        mint: Pubkey,
        from: Pubkey,
        amount: u64,
    },
}

impl Movement {
    fn touch(&self, set: &mut BTreeSet<Pubkey>) {
        match self {
            Movement::OpenAccount { address, mint, .. } => {
                set.insert(*address);
                set.insert(*mint);
            }
            Movement::Transfer { from, to, .. } => {
                set.insert(*from);
                set.insert(*to);
            }
            Movement::MintTo { mint, to, .. } => {
                set.insert(*mint);
                set.insert(*to);
            }
            Movement::Burn { mint, from, .. } => {
                set.insert(*mint);
                set.insert(*from);
            }
        }
    }
}

/// Asset ledger the pool settles against.
///
/// Implementations are internally synchronized; `settle` must either apply
/// every movement or none of them.
pub trait Ledger: Send + Sync {
    fn token_account(&self, address: &Pubkey) -> Option<TokenAccount>;

    fn mint(&self, address: &Pubkey) -> Option<Mint>;

    /// Create a mint at `address`; fails with `AlreadyExists` if anything lives there
    fn create_mint(&self, address: Pubkey, mint: Mint) -> Result<(), PoolError>;

    /// Create several accounts at once; all addresses must be free and all mints must exist
    fn open_accounts(&self, accounts: &[(Pubkey, TokenAccount)]) -> Result<(), PoolError>;

    /// Apply `movements` atomically under `signers`
    fn settle(&self, movements: &[Movement], signers: &SignerSet) -> Result<(), PoolError>;

    /// Balance of an account, zero if it does not exist
    fn balance(&self, address: &Pubkey) -> u64 {
        self.token_account(address).map(|a| a.amount).unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Entry {
    Account(TokenAccount),
    Mint(Mint),
}

type Slot = Arc<Mutex<Option<Entry>>>;
type Staged = BTreeMap<Pubkey, Option<Entry>>;

/// In-memory ledger with one lock per entry.
///
/// Settlements lock the entries they touch in address order, so settlements
/// over disjoint entries run in parallel and overlapping ones serialize.
#[derive(Debug)]
pub struct MemoryLedger {
    entries: RwLock<HashMap<Pubkey, Slot>>,
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLedger {
    /// Ledger holding only the native mint
    pub fn new() -> Self {
        let mut entries = HashMap::new();
        let native = Mint::new(Pubkey::default(), Custody::Pool, DECIMALS);
        entries.insert(NATIVE_MINT, Arc::new(Mutex::new(Some(Entry::Mint(native)))));
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// Credit native coin to `owner`, opening its native account if needed.
    ///
    /// Environment setup only; pool operations never create coin.
    pub fn airdrop(&self, owner: &Pubkey, amount: u64) -> Result<(), PoolError> {
        let addresses: BTreeSet<Pubkey> = [*owner, NATIVE_MINT].into_iter().collect();
        self.with_slots(&addresses, |slots| {
            let mut guards: Vec<_> = slots.iter().map(|(_, slot)| slot.lock()).collect();

            let mut staged = stage(slots, &guards);
            if let Some(slot) = staged.get_mut(owner) {
                if slot.is_none() {
                    *slot = Some(Entry::Account(TokenAccount::new(NATIVE_MINT, *owner, Custody::User)));
                }
            }
            let account = account_mut(&mut staged, owner)?;
            if account.mint != NATIVE_MINT {
                return Err(PoolError::InvalidInput("airdrop target is not a native account"));
            }
            account.amount = account.amount.checked_add(amount).ok_or(PoolError::Overflow)?;

            let native = mint_mut(&mut staged, &NATIVE_MINT)?;
            native.supply = native.supply.checked_add(amount).ok_or(PoolError::Overflow)?;

            commit(slots, &mut guards, staged);
            Ok(())
        })?;
        log::debug!("airdropped {} to {}", amount, owner);
        Ok(())
    }

    /// Run `f` over the slots of `addresses`, then drop any slot it left vacant
    fn with_slots<T>(
        &self,
        addresses: &BTreeSet<Pubkey>,
        f: impl FnOnce(&[(Pubkey, Slot)]) -> Result<T, PoolError>,
    ) -> Result<T, PoolError> {
        let slots = self.slots(addresses);
        let result = f(slots.as_slice());
        self.prune(&slots);
        result
    }

    /// Slot handles for `addresses`, in address order, creating vacant slots as needed
    fn slots(&self, addresses: &BTreeSet<Pubkey>) -> Vec<(Pubkey, Slot)> {
        let mut entries = self.entries.write();
        addresses
            .iter()
            .map(|address| (*address, entries.entry(*address).or_default().clone()))
            .collect()
    }

    /// Remove vacant slots nobody else holds a handle to.
    ///
    /// Handles are only cloned under the map lock, so a count of two (map plus
    /// `slots`) cannot grow while the write lock is held.
    fn prune(&self, slots: &[(Pubkey, Slot)]) {
        let mut entries = self.entries.write();
        for (address, slot) in slots {
            if Arc::strong_count(slot) == 2 && slot.lock().is_none() {
                entries.remove(address);
            }
        }
    }

    fn read(&self, address: &Pubkey) -> Option<Entry> {
        let slot = self.entries.read().get(address).cloned()?;
        let entry = *slot.lock();
        entry
    }
}

fn stage(slots: &[(Pubkey, Slot)], guards: &[parking_lot::MutexGuard<'_, Option<Entry>>]) -> Staged {
    slots
        .iter()
        .zip(guards.iter())
        .map(|((address, _), guard)| (*address, **guard))
        .collect()
}

fn commit(
    slots: &[(Pubkey, Slot)],
    guards: &mut [parking_lot::MutexGuard<'_, Option<Entry>>],
    mut staged: Staged,
) {
    for ((address, _), guard) in slots.iter().zip(guards.iter_mut()) {
        if let Some(entry) = staged.remove(address) {
            **guard = entry;
        }
    }
}

fn account_mut<'a>(staged: &'a mut Staged, address: &Pubkey) -> Result<&'a mut TokenAccount, PoolError> {
    match staged.get_mut(address) {
        Some(Some(Entry::Account(account))) => Ok(account),
        Some(Some(Entry::Mint(_))) => Err(PoolError::InvalidInput("address is a mint, not an account")),
        _ => Err(PoolError::NotFound),
    }
}

fn mint_mut<'a>(staged: &'a mut Staged, address: &Pubkey) -> Result<&'a mut Mint, PoolError> {
    match staged.get_mut(address) {
        Some(Some(Entry::Mint(mint))) => Ok(mint),
        Some(Some(Entry::Account(_))) => Err(PoolError::InvalidInput("address is an account, not a mint")),
        _ => Err(PoolError::NotFound),
    }
}

fn apply(staged: &mut Staged, movement: &Movement, signers: &SignerSet) -> Result<(), PoolError> {
    match *movement {
        Movement::OpenAccount { address, mint, owner } => {
            mint_mut(staged, &mint)?;
            match staged.get_mut(&address) {
                Some(slot) if slot.is_none() => {
                    *slot = Some(Entry::Account(TokenAccount::new(mint, owner, Custody::User)));
                }
                Some(Some(Entry::Account(existing)))
                    if existing.mint == mint && existing.owner == owner => {}
                _ => {
                    return Err(PoolError::InvalidInput(
                        "account exists with a different mint or owner",
                    ))
                }
            }
        }
        Movement::Transfer { from, to, amount } => {
            if from == to {
                return Err(PoolError::InvalidInput("transfer source equals destination"));
            }
            let source = *account_mut(staged, &from)?;
            let dest_mint = account_mut(staged, &to)?.mint;
            if source.mint != dest_mint {
                return Err(PoolError::InvalidInput("mint mismatch"));
            }
            if !signers.authorizes(&source.owner, source.custody) {
                return Err(PoolError::MissingSignature);
            }
            if source.amount < amount {
                return Err(PoolError::InsufficientFunds);
            }

            account_mut(staged, &from)?.amount = source.amount - amount;
            let dest = account_mut(staged, &to)?;
            dest.amount = dest.amount.checked_add(amount).ok_or(PoolError::Overflow)?;
        }
        Movement::MintTo { mint, to, amount } => {
            let definition = *mint_mut(staged, &mint)?;
            if !signers.authorizes(&definition.authority, definition.custody) {
                return Err(PoolError::MissingSignature);
            }
            let dest = account_mut(staged, &to)?;
            if dest.mint != mint {
                return Err(PoolError::InvalidInput("mint mismatch"));
            }
            dest.amount = dest.amount.checked_add(amount).ok_or(PoolError::Overflow)?;

            let definition = mint_mut(staged, &mint)?;
            definition.supply = definition.supply.checked_add(amount).ok_or(PoolError::Overflow)?;
        }
        Movement::Burn { mint, from, amount } => {
            let source = account_mut(staged, &from)?;
            if source.mint != mint {
                return Err(PoolError::InvalidInput("mint mismatch"));
            }
            if !signers.authorizes(&source.owner, source.custody) {
                return Err(PoolError::MissingSignature);
            }
            if source.amount < amount {
                return Err(PoolError::InsufficientFunds);
            }
            source.amount -= amount;

            let definition = mint_mut(staged, &mint)?;
            definition.supply = definition.supply.checked_sub(amount).ok_or(PoolError::Overflow)?;
        }
    }
    Ok(())
}

impl Ledger for MemoryLedger {
    fn token_account(&self, address: &Pubkey) -> Option<TokenAccount> {
        match self.read(address)? {
            Entry::Account(account) => Some(account),
            Entry::Mint(_) => None,
        }
    }

    fn mint(&self, address: &Pubkey) -> Option<Mint> {
        match self.read(address)? {
            Entry::Mint(mint) => Some(mint),
            Entry::Account(_) => None,
        }
    }

    fn create_mint(&self, address: Pubkey, mint: Mint) -> Result<(), PoolError> {
        self.with_slots(&[address].into_iter().collect(), |slots| {
            let mut guard = slots[0].1.lock();
            if guard.is_some() {
                return Err(PoolError::AlreadyExists);
            }
            *guard = Some(Entry::Mint(mint));
            Ok(())
        })
    }

    fn open_accounts(&self, accounts: &[(Pubkey, TokenAccount)]) -> Result<(), PoolError> {
        let mut addresses = BTreeSet::new();
        for (address, account) in accounts {
            if !addresses.insert(*address) {
                return Err(PoolError::InvalidInput("duplicate account address"));
            }
            addresses.insert(account.mint);
        }

        self.with_slots(&addresses, |slots| {
            let mut guards: Vec<_> = slots.iter().map(|(_, slot)| slot.lock()).collect();
            let mut staged = stage(slots, &guards);

            for (address, account) in accounts {
                mint_mut(&mut staged, &account.mint)?;
                match staged.get_mut(address) {
                    Some(slot) if slot.is_none() => *slot = Some(Entry::Account(*account)),
                    _ => return Err(PoolError::AlreadyExists),
                }
            }

            commit(slots, &mut guards, staged);
            Ok(())
        })
    }

    fn settle(&self, movements: &[Movement], signers: &SignerSet) -> Result<(), PoolError> {
        let mut addresses = BTreeSet::new();
        for movement in movements {
            movement.touch(&mut addresses);
        }

        self.with_slots(&addresses, |slots| {
            let mut guards: Vec<_> = slots.iter().map(|(_, slot)| slot.lock()).collect();
            let mut staged = stage(slots, &guards);

            for movement in movements {
                apply(&mut staged, movement, signers)?;
            }

            commit(slots, &mut guards, staged);
            Ok(())
        })
    }
}
