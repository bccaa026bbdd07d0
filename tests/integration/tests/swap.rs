//! Swap engine against a live ledger

use duopool_core::instruction;
use duopool_core::{AssetSide, PoolConfig, PoolError, PricingCurve};
use duopool_integration_tests::{TestContext, TestUser, RATE, UNIT};
use solana_program::pubkey::Pubkey;

/// Pool funded with 100 base / 10 native by a dedicated provider
fn funded(ctx: &TestContext) -> Pubkey {
    let pool = ctx.setup_pool().unwrap().pool_state;
    let provider = ctx.create_user(100 * UNIT, 10 * UNIT).unwrap();
    ctx.exchange
        .add_liquidity(&pool, &provider.liquidity_accounts(), 100 * UNIT, 10 * UNIT, &provider.signers())
        .unwrap();
    pool
}

fn trader(ctx: &TestContext) -> TestUser {
    ctx.create_user(50 * UNIT, 50 * UNIT).unwrap()
}

#[test]
fn test_swap_native_for_base() {
    let ctx = TestContext::new();
    let pool = funded(&ctx);
    let bob = trader(&ctx);

    let q = ctx
        .exchange
        .swap_native_for_base(&pool, &bob.sell_native(bob.base_account), 2 * UNIT, 0, &bob.signers())
        .unwrap();

    // 100 * 2 / (10 + 2)
    assert_eq!(q.amount_out, 16_666_666_666);
    assert_eq!(ctx.balance(&bob.owner), 48 * UNIT);
    assert_eq!(ctx.balance(&bob.base_account), 50 * UNIT + q.amount_out);

    let state = ctx.state().unwrap();
    assert_eq!(state.ledger.reserve1, 12 * UNIT);
    assert_eq!(state.ledger.reserve0, 100 * UNIT - q.amount_out);
    ctx.assert_reserves_backed().unwrap();
}

#[test]
fn test_swap_base_for_native() {
    let ctx = TestContext::new();
    let pool = funded(&ctx);
    let bob = trader(&ctx);

    let q = ctx
        .exchange
        .swap_base_for_native(&pool, &bob.sell_base(bob.owner), 10 * UNIT, 0, &bob.signers())
        .unwrap();

    // 10 * 10 / (100 + 10)
    assert_eq!(q.amount_out, 909_090_909);
    assert_eq!(ctx.balance(&bob.base_account), 40 * UNIT);
    assert_eq!(ctx.balance(&bob.owner), 50 * UNIT + q.amount_out);
    ctx.assert_reserves_backed().unwrap();
}

#[test]
fn test_quote_matches_execution() {
    let ctx = TestContext::new();
    let pool = funded(&ctx);
    let bob = trader(&ctx);

    let quoted = ctx.exchange.quote_swap(&pool, AssetSide::Native, 3 * UNIT).unwrap();
    let before = ctx.state().unwrap();
    assert_eq!(before.seqno, ctx.state().unwrap().seqno, "quote must not mutate");

    let executed = ctx
        .exchange
        .swap(&pool, &bob.sell_native(bob.base_account), AssetSide::Native, 3 * UNIT, 0, &bob.signers())
        .unwrap();
    assert_eq!(quoted, executed);
    assert_eq!(ctx.state().unwrap().seqno, before.seqno + 1);
}

#[test]
fn test_slippage_limit() {
    let ctx = TestContext::new();
    let pool = funded(&ctx);
    let bob = trader(&ctx);
    let before = ctx.state().unwrap();

    let quoted = ctx.exchange.quote_swap(&pool, AssetSide::Native, UNIT).unwrap();
    assert_eq!(
        ctx.exchange.swap_native_for_base(
            &pool,
            &bob.sell_native(bob.base_account),
            UNIT,
            quoted.amount_out + 1,
            &bob.signers()
        ),
        Err(PoolError::SlippageExceeded)
    );
    assert_eq!(ctx.state().unwrap(), before);
    assert_eq!(ctx.balance(&bob.owner), 50 * UNIT);

    assert!(ctx
        .exchange
        .swap_native_for_base(&pool, &bob.sell_native(bob.base_account), UNIT, quoted.amount_out, &bob.signers())
        .is_ok());
}

#[test]
fn test_swap_on_empty_pool() {
    let ctx = TestContext::new();
    let pool = ctx.setup_pool().unwrap().pool_state;
    let bob = trader(&ctx);

    assert_eq!(
        ctx.exchange
            .swap_native_for_base(&pool, &bob.sell_native(bob.base_account), UNIT, 0, &bob.signers()),
        Err(PoolError::InsufficientReserve)
    );
}

#[test]
fn test_swap_beyond_balance() {
    let ctx = TestContext::new();
    let pool = funded(&ctx);
    let bob = trader(&ctx);
    let before = ctx.state().unwrap();

    assert_eq!(
        ctx.exchange
            .swap_base_for_native(&pool, &bob.sell_base(bob.owner), 51 * UNIT, 0, &bob.signers()),
        Err(PoolError::InsufficientFunds)
    );
    assert_eq!(ctx.state().unwrap(), before);
}

#[test]
fn test_swap_requires_source_owner() {
    let ctx = TestContext::new();
    let pool = funded(&ctx);
    let bob = trader(&ctx);
    let mallory = trader(&ctx);

    // Mallory signs, but the source is Bob's account
    let mut accounts = mallory.sell_base(mallory.owner);
    accounts.source = bob.base_account;
    assert_eq!(
        ctx.exchange.swap_base_for_native(&pool, &accounts, UNIT, 0, &mallory.signers()),
        Err(PoolError::MissingSignature)
    );
    assert_eq!(ctx.balance(&bob.base_account), 50 * UNIT);
}

#[test]
fn test_swap_cannot_redirect_reserve() {
    let ctx = TestContext::new();
    let pool = funded(&ctx);
    let addrs = ctx.addresses();
    let mallory = trader(&ctx);

    // Naming the pool's own reserve as the source
    let mut accounts = mallory.sell_base(mallory.owner);
    accounts.source = addrs.reserve0;
    assert!(matches!(
        ctx.exchange.swap_base_for_native(&pool, &accounts, UNIT, 0, &mallory.signers()),
        Err(PoolError::InvalidInput(_))
    ));
}

#[test]
fn test_fixed_rate_pool() {
    let config = PoolConfig {
        curve: PricingCurve::FixedRate { base_per_native: RATE },
        fee_bps: 0,
    };
    let ctx = TestContext::with_config(config).unwrap();
    let pool = funded(&ctx);
    let bob = trader(&ctx);

    let q = ctx
        .exchange
        .swap_native_for_base(&pool, &bob.sell_native(bob.base_account), 2 * UNIT, 0, &bob.signers())
        .unwrap();
    assert_eq!(q.amount_out, 2 * UNIT * RATE);

    let state = ctx.state().unwrap();
    assert_eq!((state.ledger.reserve0, state.ledger.reserve1), (80 * UNIT, 12 * UNIT));

    // Would drain reserve0
    assert_eq!(
        ctx.exchange
            .swap_native_for_base(&pool, &bob.sell_native(bob.base_account), 8 * UNIT, 0, &bob.signers()),
        Err(PoolError::InsufficientReserve)
    );
}

#[test]
fn test_fee_stays_in_pool() {
    let config = PoolConfig {
        curve: PricingCurve::ConstantProduct,
        fee_bps: 30,
    };
    let ctx = TestContext::with_config(config).unwrap();
    let pool = funded(&ctx);
    let bob = trader(&ctx);
    let k_before = {
        let s = ctx.state().unwrap();
        u128::from(s.ledger.reserve0) * u128::from(s.ledger.reserve1)
    };

    let q = ctx
        .exchange
        .swap_base_for_native(&pool, &bob.sell_base(bob.owner), 10 * UNIT, 0, &bob.signers())
        .unwrap();
    assert_eq!(q.fee, 30_000_000);

    let s = ctx.state().unwrap();
    assert_eq!(s.ledger.reserve0, 110 * UNIT);
    assert!(u128::from(s.ledger.reserve0) * u128::from(s.ledger.reserve1) > k_before);
}

#[test]
fn test_swap_through_processor() {
    let ctx = TestContext::new();
    funded(&ctx);
    let bob = trader(&ctx);

    let ix = instruction::swap(
        &ctx.program_id,
        &ctx.base_asset,
        &bob.sell_native(bob.base_account),
        AssetSide::Native,
        2 * UNIT,
        0,
    );
    ctx.process(&ix).unwrap();

    assert_eq!(ctx.balance(&bob.owner), 48 * UNIT);
    ctx.assert_reserves_backed().unwrap();
}
