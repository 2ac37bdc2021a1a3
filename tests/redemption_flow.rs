//! Integration tests for promo redemption under concurrency.
//!
//! The usage-limit and no-duplicate invariants must hold however many
//! redemption attempts race; these tests drive the full coordinator stack
//! over the in-memory adapters, which reproduce the conditional-update
//! semantics of the Postgres ledger.

use std::collections::HashSet;
use std::sync::Arc;

use peakform::adapters::memory::{
    InMemoryAccountCache, InMemoryAccountRepository, InMemoryAuditLog, InMemoryPromoCodeRepository,
};
use peakform::domain::account::Account;
use peakform::domain::billing::AccountLocks;
use peakform::domain::foundation::{ExternalIdentityId, Timestamp};
use peakform::domain::promo::{
    PromoCode, PromoCodeEntry, PromoCodeKind, RedemptionCoordinator, RedemptionDenied,
    RedemptionError,
};
use peakform::ports::{AccountRepository, PromoCodeRepository};

struct Stack {
    coordinator: Arc<RedemptionCoordinator>,
    ledger: Arc<InMemoryPromoCodeRepository>,
    accounts: Arc<InMemoryAccountRepository>,
}

fn stack() -> Stack {
    let ledger = Arc::new(InMemoryPromoCodeRepository::new());
    let accounts = Arc::new(InMemoryAccountRepository::new());
    let coordinator = Arc::new(RedemptionCoordinator::new(
        ledger.clone(),
        accounts.clone(),
        Arc::new(InMemoryAccountCache::new()),
        Arc::new(InMemoryAuditLog::new()),
        AccountLocks::new(),
    ));
    Stack {
        coordinator,
        ledger,
        accounts,
    }
}

async fn seed_code(stack: &Stack, code: &str, kind: PromoCodeKind, limit: Option<u32>) {
    let entry = PromoCodeEntry::new(
        PromoCode::try_new(code).unwrap(),
        kind,
        None,
        limit,
        Timestamp::now().add_days(-1),
        None,
    )
    .unwrap();
    stack.ledger.insert(&entry).await.unwrap();
}

async fn seed_account(stack: &Stack, tag: &str) -> Account {
    let account = Account::register(
        ExternalIdentityId::new(format!("idp|{}", tag)).unwrap(),
        format!("{}@example.com", tag),
        None,
        14,
    );
    stack.accounts.create(&account).await.unwrap();
    account
}

#[tokio::test]
async fn fifty_concurrent_redeemers_never_exceed_limit_of_ten() {
    let stack = stack();
    seed_code(&stack, "LIMITED", PromoCodeKind::FreeMonth, Some(10)).await;

    let mut accounts = Vec::new();
    for i in 0..50 {
        accounts.push(seed_account(&stack, &format!("racer{}", i)).await);
    }

    let code = PromoCode::try_new("LIMITED").unwrap();
    let mut handles = Vec::new();
    for account in &accounts {
        let coordinator = stack.coordinator.clone();
        let code = code.clone();
        let account_id = account.id;
        handles.push(tokio::spawn(async move {
            coordinator.redeem(&code, account_id).await
        }));
    }

    let mut successes = 0;
    let mut exhausted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(RedemptionError::Invalid(RedemptionDenied::Exhausted { .. })) => exhausted += 1,
            Err(other) => panic!("unexpected rejection: {:?}", other),
        }
    }

    assert_eq!(successes, 10);
    assert_eq!(exhausted, 40);

    let entry = stack.ledger.find(&code).await.unwrap().unwrap();
    assert_eq!(entry.used_count, 10);
    let unique: HashSet<_> = entry.used_by.iter().collect();
    assert_eq!(unique.len(), entry.used_by.len(), "used_by has duplicates");
}

#[tokio::test]
async fn concurrent_redeems_by_one_account_apply_exactly_once() {
    let stack = stack();
    seed_code(&stack, "ONEACCT", PromoCodeKind::FreeMonth, Some(100)).await;
    let account = seed_account(&stack, "solo").await;

    let code = PromoCode::try_new("ONEACCT").unwrap();
    let mut handles = Vec::new();
    for _ in 0..10 {
        let coordinator = stack.coordinator.clone();
        let code = code.clone();
        let account_id = account.id;
        handles.push(tokio::spawn(async move {
            coordinator.redeem(&code, account_id).await
        }));
    }

    let mut successes = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            successes += 1;
        }
    }

    assert_eq!(successes, 1);
    let entry = stack.ledger.find(&code).await.unwrap().unwrap();
    assert_eq!(entry.used_count, 1);
    assert_eq!(entry.used_by, vec![account.id]);
}

#[tokio::test]
async fn second_attempt_reports_already_used_even_with_headroom() {
    let stack = stack();
    seed_code(&stack, "PLENTY", PromoCodeKind::FreeMonth, Some(1000)).await;
    let account = seed_account(&stack, "repeat").await;
    let code = PromoCode::try_new("PLENTY").unwrap();

    stack.coordinator.redeem(&code, account.id).await.unwrap();
    let second = stack.coordinator.redeem(&code, account.id).await;

    assert!(matches!(
        second,
        Err(RedemptionError::Invalid(RedemptionDenied::AlreadyRedeemed))
    ));
}

#[tokio::test]
async fn free_month_moves_period_end_by_one_calendar_month() {
    let stack = stack();
    seed_code(&stack, "JAN2FEB", PromoCodeKind::FreeMonth, None).await;
    let mut account = seed_account(&stack, "dated").await;

    // 2025-01-10T00:00:00Z
    let jan_tenth = Timestamp::from_unix_secs(1_736_467_200);
    account.subscription.current_period_end = Some(jan_tenth);
    stack.accounts.update(&account).await.unwrap();

    stack
        .coordinator
        .redeem(&PromoCode::try_new("JAN2FEB").unwrap(), account.id)
        .await
        .unwrap();

    let stored = stack.accounts.find_by_id(&account.id).await.unwrap().unwrap();
    // 2025-02-10T00:00:00Z
    assert_eq!(
        stored.subscription.current_period_end,
        Some(Timestamp::from_unix_secs(1_739_145_600))
    );
}

#[tokio::test]
async fn entitlement_is_persisted_before_redeem_returns() {
    let stack = stack();
    seed_code(&stack, "UPFRONT", PromoCodeKind::Lifetime, None).await;
    let account = seed_account(&stack, "eager").await;

    stack
        .coordinator
        .redeem(&PromoCode::try_new("UPFRONT").unwrap(), account.id)
        .await
        .unwrap();

    // The store already reflects the grant; no eventual consistency.
    let stored = stack.accounts.find_by_id(&account.id).await.unwrap().unwrap();
    assert_eq!(stored.subscription.current_period_end.unwrap().year(), 9999);
}
