//! Liquidity accounting against a live ledger

use duopool_core::instruction;
use duopool_core::{AddressRole, Ledger, PoolError, PoolStage, SignerSet};
use solana_program::instruction::AccountMeta;
use duopool_integration_tests::{TestContext, UNIT};

#[test]
fn test_first_deposit_fixes_price() {
    let ctx = TestContext::new();
    ctx.setup_pool().unwrap();
    let alice = ctx.create_user(1_000, 1_000).unwrap();

    let shares = ctx
        .exchange
        .add_liquidity(&ctx.addresses().pool_state, &alice.liquidity_accounts(), 500, 50, &alice.signers())
        .unwrap();

    assert_eq!(shares, 500);
    assert_eq!(ctx.shares(&alice), 500);
    assert_eq!(ctx.balance(&alice.base_account), 500);
    assert_eq!(ctx.balance(&alice.owner), 950);

    let state = ctx.state().unwrap();
    assert_eq!(state.stage(), PoolStage::Funded);
    assert_eq!((state.ledger.reserve0, state.ledger.reserve1), (500, 50));
    ctx.assert_reserves_backed().unwrap();
}

#[test]
fn test_second_depositor_must_match_ratio() {
    let ctx = TestContext::new();
    let pool = ctx.setup_pool().unwrap().pool_state;
    let alice = ctx.create_user(10 * UNIT, 10 * UNIT).unwrap();
    let bob = ctx.create_user(10 * UNIT, 10 * UNIT).unwrap();

    ctx.exchange
        .add_liquidity(&pool, &alice.liquidity_accounts(), 5 * UNIT, UNIT / 2, &alice.signers())
        .unwrap();

    assert_eq!(
        ctx.exchange
            .add_liquidity(&pool, &bob.liquidity_accounts(), UNIT, UNIT, &bob.signers()),
        Err(PoolError::RatioMismatch)
    );
    // Nothing moved
    assert_eq!(ctx.balance(&bob.base_account), 10 * UNIT);
    assert_eq!(ctx.shares(&bob), 0);

    let shares = ctx
        .exchange
        .add_liquidity(&pool, &bob.liquidity_accounts(), UNIT, UNIT / 10, &bob.signers())
        .unwrap();
    assert_eq!(shares, UNIT);
    ctx.assert_reserves_backed().unwrap();
}

#[test]
fn test_deposit_beyond_balance_rolls_back() {
    let ctx = TestContext::new();
    let pool = ctx.setup_pool().unwrap().pool_state;
    let alice = ctx.create_user(1_000, 10).unwrap();

    assert_eq!(
        ctx.exchange
            .add_liquidity(&pool, &alice.liquidity_accounts(), 500, 50, &alice.signers()),
        Err(PoolError::InsufficientFunds)
    );

    assert_eq!(ctx.balance(&alice.base_account), 1_000);
    assert_eq!(ctx.state().unwrap().stage(), PoolStage::Empty);
    // Share account creation was rolled back too
    assert!(ctx.exchange.ledger().token_account(&alice.share_account).is_none());
}

#[test]
fn test_withdraw_more_than_held() {
    let ctx = TestContext::new();
    let pool = ctx.setup_pool().unwrap().pool_state;
    let alice = ctx.create_user(1_000, 1_000).unwrap();
    let bob = ctx.create_user(1_000, 1_000).unwrap();
    ctx.exchange
        .add_liquidity(&pool, &alice.liquidity_accounts(), 500, 50, &alice.signers())
        .unwrap();
    ctx.exchange
        .add_liquidity(&pool, &bob.liquidity_accounts(), 100, 10, &bob.signers())
        .unwrap();

    assert_eq!(
        ctx.exchange
            .remove_liquidity(&pool, &bob.liquidity_accounts(), 101, &bob.signers())
            .unwrap_err(),
        PoolError::InsufficientShares
    );
}

#[test]
fn test_cannot_burn_someone_elses_shares() {
    let ctx = TestContext::new();
    let pool = ctx.setup_pool().unwrap().pool_state;
    let alice = ctx.create_user(1_000, 1_000).unwrap();
    let mallory = ctx.create_user(0, 0).unwrap();
    ctx.exchange
        .add_liquidity(&pool, &alice.liquidity_accounts(), 500, 50, &alice.signers())
        .unwrap();

    // Mallory's own share account holds nothing
    assert_eq!(
        ctx.exchange
            .remove_liquidity(&pool, &mallory.liquidity_accounts(), 100, &mallory.signers())
            .unwrap_err(),
        PoolError::InsufficientShares
    );

    // Naming Alice's share account on the wire fails the derivation check
    let mut ix = instruction::remove_liquidity(
        &ctx.program_id,
        &ctx.base_asset,
        &mallory.liquidity_accounts(),
        100,
    );
    ix.accounts[8] = AccountMeta::new(alice.share_account, false);
    assert_eq!(
        ctx.process(&ix),
        Err(PoolError::AddressMismatch(AddressRole::ShareAccount))
    );

    // Signing as Alice without her key is not possible either
    assert_eq!(
        ctx.exchange
            .remove_liquidity(&pool, &alice.liquidity_accounts(), 100, &mallory.signers())
            .unwrap_err(),
        PoolError::MissingSignature
    );
    assert_eq!(ctx.shares(&alice), 500);
}

#[test]
fn test_deposit_cannot_claim_another_pools_addresses() {
    let ctx = TestContext::new();
    ctx.setup_pool().unwrap();
    let victim = ctx.sibling();
    let target = victim.addresses();
    let alice = ctx.create_user(1_000, 1_000).unwrap();

    // Share mint of a pool that does not exist yet
    let mut ix = instruction::add_liquidity(
        &ctx.program_id,
        &ctx.base_asset,
        &alice.liquidity_accounts(),
        500,
        50,
    );
    ix.accounts[8] = AccountMeta::new(target.share_mint, false);
    assert_eq!(
        ctx.process(&ix),
        Err(PoolError::AddressMismatch(AddressRole::ShareAccount))
    );
    assert!(ctx.exchange.ledger().mint(&target.share_mint).is_none());
    assert!(ctx.exchange.ledger().token_account(&target.share_mint).is_none());

    // Reserve of a pool that is declared but not yet allocated
    victim.initialize().unwrap();
    ix.accounts[8] = AccountMeta::new(target.reserve0, false);
    assert_eq!(
        ctx.process(&ix),
        Err(PoolError::AddressMismatch(AddressRole::ShareAccount))
    );
    assert!(ctx.exchange.ledger().token_account(&target.reserve0).is_none());

    // Nothing was charged and the other pool still comes up
    assert_eq!(ctx.balance(&alice.base_account), 1_000);
    assert_eq!(ctx.shares(&alice), 0);
    victim.initialize_pool().unwrap();
    assert_eq!(ctx.exchange.pool_count(), 2);

    // The honest deposit lands on the derived share account
    ctx.process(&instruction::add_liquidity(
        &ctx.program_id,
        &ctx.base_asset,
        &alice.liquidity_accounts(),
        500,
        50,
    ))
    .unwrap();
    assert_eq!(ctx.shares(&alice), 500);
    assert_eq!(
        alice.share_account,
        ctx.exchange.share_account(&ctx.addresses().pool_state, &alice.owner)
    );
    ctx.assert_reserves_backed().unwrap();
    victim.assert_reserves_backed().unwrap();
}

#[test]
fn test_full_withdrawal_empties_pool_and_allows_refunding() {
    let ctx = TestContext::new();
    let pool = ctx.setup_pool().unwrap().pool_state;
    let alice = ctx.create_user(1_000, 1_000).unwrap();
    ctx.exchange
        .add_liquidity(&pool, &alice.liquidity_accounts(), 700, 33, &alice.signers())
        .unwrap();

    let w = ctx
        .exchange
        .remove_liquidity(&pool, &alice.liquidity_accounts(), 700, &alice.signers())
        .unwrap();
    assert_eq!((w.base_out, w.native_out), (700, 33));

    let state = ctx.state().unwrap();
    assert_eq!(state.stage(), PoolStage::Empty);
    assert_eq!(state.ledger.reserve0, 0);
    assert_eq!(state.ledger.reserve1, 0);
    assert_eq!(ctx.balance(&alice.base_account), 1_000);
    assert_eq!(ctx.balance(&alice.owner), 1_000);
    ctx.assert_reserves_backed().unwrap();

    // A drained pool can be funded again at a new price
    ctx.exchange
        .add_liquidity(&pool, &alice.liquidity_accounts(), 100, 100, &alice.signers())
        .unwrap();
    assert_eq!(ctx.state().unwrap().spot_price(), 1_000_000_000);
}

#[test]
fn test_deposit_into_unallocated_pool() {
    let ctx = TestContext::new();
    let pool = ctx.initialize().unwrap().pool_state;
    let alice = ctx.create_user(1_000, 1_000).unwrap();

    assert_eq!(
        ctx.exchange
            .add_liquidity(&pool, &alice.liquidity_accounts(), 500, 50, &alice.signers()),
        Err(PoolError::NotFound)
    );
}

#[test]
fn test_liquidity_through_processor() {
    let ctx = TestContext::new();
    ctx.setup_pool().unwrap();
    let alice = ctx.create_user(1_000, 1_000).unwrap();
    let accounts = alice.liquidity_accounts();

    let add = instruction::add_liquidity(&ctx.program_id, &ctx.base_asset, &accounts, 500, 50);
    ctx.process(&add).unwrap();
    assert_eq!(ctx.shares(&alice), 500);

    let remove = instruction::remove_liquidity(&ctx.program_id, &ctx.base_asset, &accounts, 400);
    ctx.process(&remove).unwrap();
    assert_eq!(ctx.shares(&alice), 100);
    ctx.assert_reserves_backed().unwrap();
}

#[test]
fn test_user_account_cannot_alias_reserve() {
    let ctx = TestContext::new();
    let addrs = ctx.setup_pool().unwrap();
    let alice = ctx.create_user(1_000, 1_000).unwrap();
    ctx.exchange
        .add_liquidity(&addrs.pool_state, &alice.liquidity_accounts(), 500, 50, &alice.signers())
        .unwrap();

    let mut accounts = alice.liquidity_accounts();
    accounts.base_account = addrs.reserve0;
    assert!(matches!(
        ctx.exchange
            .remove_liquidity(&addrs.pool_state, &accounts, 1, &SignerSet::new(&[alice.owner])),
        Err(PoolError::InvalidInput(_))
    ));
}
