mod common;

use std::error::Error;

use anyhow::Result;
use common::{DEFAULT_PHONE, TestAccount, add_account_with_balance};
use purse::application::{LedgerError, WalletService};
use purse::domain::{Account, LedgerState, Payment, PaymentStatus};
use uuid::Uuid;

// ========================
// Registration
// ========================

#[test]
fn test_register_account_assigns_sequential_ids() -> Result<()> {
    let mut service = WalletService::new();

    let first = service.register_account(DEFAULT_PHONE)?;
    let second = service.register_account("+992900801442")?;

    assert_eq!(first.id, 1);
    assert_eq!(first.balance, 0);
    assert_eq!(second.id, 2);
    assert_eq!(service.accounts().len(), 2);
    Ok(())
}

#[test]
fn test_register_account_twice_fails() -> Result<()> {
    let mut service = WalletService::new();
    service.register_account(DEFAULT_PHONE)?;

    let result = service.register_account(DEFAULT_PHONE);

    assert_eq!(
        result,
        Err(LedgerError::PhoneAlreadyRegistered(DEFAULT_PHONE.to_string()))
    );
    assert_eq!(service.accounts().len(), 1);

    // The failed attempt does not consume an ID
    let next = service.register_account("+992900801442")?;
    assert_eq!(next.id, 2);
    Ok(())
}

// ========================
// Deposits
// ========================

#[test]
fn test_deposit_increases_balance() -> Result<()> {
    let mut service = WalletService::new();
    let account = add_account_with_balance(&mut service, DEFAULT_PHONE, 1000)?;

    service.deposit(account.id, 250)?;

    assert_eq!(service.find_account_by_id(account.id)?.balance, 1250);
    Ok(())
}

#[test]
fn test_deposit_non_positive_amount_fails() -> Result<()> {
    let mut service = WalletService::new();
    let account = add_account_with_balance(&mut service, DEFAULT_PHONE, 1000)?;

    for amount in [0, -1, -1000] {
        assert_eq!(
            service.deposit(account.id, amount),
            Err(LedgerError::AmountMustBePositive(amount))
        );
    }

    assert_eq!(service.find_account_by_id(account.id)?.balance, 1000);
    Ok(())
}

#[test]
fn test_deposit_unknown_account_fails() {
    let mut service = WalletService::new();

    assert_eq!(
        service.deposit(42, 100),
        Err(LedgerError::AccountNotFound(42))
    );
    // Amount is validated before the account lookup
    assert_eq!(
        service.deposit(42, 0),
        Err(LedgerError::AmountMustBePositive(0))
    );
}

#[test]
fn test_deposit_past_max_balance_fails() -> Result<()> {
    let mut service = WalletService::new();
    let account = add_account_with_balance(&mut service, DEFAULT_PHONE, i64::MAX)?;

    assert_eq!(
        service.deposit(account.id, 1),
        Err(LedgerError::BalanceOverflow {
            account_id: account.id,
            balance: i64::MAX,
            amount: 1,
        })
    );
    assert_eq!(service.find_account_by_id(account.id)?.balance, i64::MAX);
    Ok(())
}

// ========================
// Payments
// ========================

#[test]
fn test_pay_debits_balance() -> Result<()> {
    let mut service = WalletService::new();
    let account = add_account_with_balance(&mut service, DEFAULT_PHONE, 1000)?;

    let payment = service.pay(account.id, 100, "fun")?;

    assert_eq!(payment.account_id, account.id);
    assert_eq!(payment.amount, 100);
    assert_eq!(payment.category, "fun");
    assert_eq!(payment.status, PaymentStatus::InProgress);
    assert_eq!(service.find_account_by_id(account.id)?.balance, 900);
    assert_eq!(service.payments().len(), 1);
    Ok(())
}

#[test]
fn test_pay_whole_balance() -> Result<()> {
    let mut service = WalletService::new();
    let account = add_account_with_balance(&mut service, DEFAULT_PHONE, 1000)?;

    service.pay(account.id, 1000, "rent")?;

    assert_eq!(service.find_account_by_id(account.id)?.balance, 0);
    Ok(())
}

#[test]
fn test_pay_whole_max_balance() -> Result<()> {
    let mut service = WalletService::new();
    let account = add_account_with_balance(&mut service, DEFAULT_PHONE, i64::MAX)?;

    service.pay(account.id, i64::MAX, "everything")?;

    assert_eq!(service.find_account_by_id(account.id)?.balance, 0);
    Ok(())
}

#[test]
fn test_pay_more_than_balance_fails() -> Result<()> {
    let mut service = WalletService::new();
    let account = add_account_with_balance(&mut service, DEFAULT_PHONE, 1000)?;

    let result = service.pay(account.id, 1001, "fun");

    assert_eq!(
        result,
        Err(LedgerError::InsufficientBalance {
            account_id: account.id,
            balance: 1000,
            required: 1001,
        })
    );
    assert_eq!(service.find_account_by_id(account.id)?.balance, 1000);
    assert!(service.payments().is_empty());
    Ok(())
}

#[test]
fn test_pay_non_positive_amount_fails() -> Result<()> {
    let mut service = WalletService::new();
    let account = add_account_with_balance(&mut service, DEFAULT_PHONE, 1000)?;

    assert_eq!(
        service.pay(account.id, 0, "fun"),
        Err(LedgerError::AmountMustBePositive(0))
    );
    assert_eq!(
        service.pay(account.id, -10, "fun"),
        Err(LedgerError::AmountMustBePositive(-10))
    );
    assert!(service.payments().is_empty());
    Ok(())
}

#[test]
fn test_pay_unknown_account_fails() {
    let mut service = WalletService::new();

    assert_eq!(
        service.pay(7, 100, "fun"),
        Err(LedgerError::AccountNotFound(7))
    );
}

#[test]
fn test_payments_for_account() -> Result<()> {
    let mut service = WalletService::new();
    let (first, _) = TestAccount::standard().create(&mut service)?;
    let second = add_account_with_balance(&mut service, "+992900801442", 500)?;
    service.pay(second.id, 50, "mobile")?;
    service.pay(first.id, 20, "food")?;

    let categories: Vec<&str> = service
        .payments_for_account(first.id)
        .map(|p| p.category.as_str())
        .collect();

    assert_eq!(categories, vec!["fun", "food"]);
    assert_eq!(service.payments_for_account(second.id).count(), 1);
    Ok(())
}

// ========================
// Lookups
// ========================

#[test]
fn test_find_account_by_id() -> Result<()> {
    let mut service = WalletService::new();
    let account = service.register_account(DEFAULT_PHONE)?;

    let found = service.find_account_by_id(account.id)?;

    assert_eq!(found, &account);
    Ok(())
}

#[test]
fn test_find_account_by_id_not_found() {
    let service = WalletService::new();

    assert_eq!(
        service.find_account_by_id(12345),
        Err(LedgerError::AccountNotFound(12345))
    );
}

#[test]
fn test_find_payment_by_id() -> Result<()> {
    let mut service = WalletService::new();
    let (_, payments) = TestAccount::standard().create(&mut service)?;

    let found = service.find_payment_by_id(payments[0].id)?;

    assert_eq!(found, &payments[0]);
    Ok(())
}

#[test]
fn test_find_payment_by_id_not_found() -> Result<()> {
    let mut service = WalletService::new();
    TestAccount::standard().create(&mut service)?;

    let missing = Uuid::new_v4();
    assert_eq!(
        service.find_payment_by_id(missing),
        Err(LedgerError::PaymentNotFound(missing))
    );
    Ok(())
}

// ========================
// Reject
// ========================

#[test]
fn test_reject_refunds_and_fails_payment() -> Result<()> {
    let mut service = WalletService::new();
    let account = add_account_with_balance(&mut service, DEFAULT_PHONE, 100)?;
    let payment = service.pay(account.id, 10, "fun")?;

    service.reject(payment.id)?;

    let rejected = service.find_payment_by_id(payment.id)?;
    assert_eq!(rejected.status, PaymentStatus::Fail);
    assert_eq!(rejected.amount, 10);
    assert_eq!(service.find_account_by_id(account.id)?.balance, 100);
    Ok(())
}

#[test]
fn test_reject_unknown_payment_fails() {
    let mut service = WalletService::new();
    let missing = Uuid::new_v4();

    assert_eq!(
        service.reject(missing),
        Err(LedgerError::PaymentNotFound(missing))
    );
}

#[test]
fn test_reject_twice_does_not_refund_twice() -> Result<()> {
    let mut service = WalletService::new();
    let (account, payments) = TestAccount::standard().create(&mut service)?;
    let payment_id = payments[0].id;

    service.reject(payment_id)?;
    let second = service.reject(payment_id);

    assert_eq!(second, Err(LedgerError::PaymentAlreadyRejected(payment_id)));
    assert_eq!(service.find_account_by_id(account.id)?.balance, 1000);
    assert_eq!(
        service.find_payment_by_id(payment_id)?.status,
        PaymentStatus::Fail
    );
    Ok(())
}

#[test]
fn test_reject_with_missing_account_changes_nothing() -> Result<()> {
    // Not reachable through the service itself; build the state by hand.
    let payment = Payment::new(99, 100, "fun");
    let payment_id = payment.id;
    let mut service = WalletService::from_state(LedgerState {
        next_account_id: 1,
        accounts: vec![Account::new(1, DEFAULT_PHONE)],
        payments: vec![payment],
        favorites: vec![],
    });

    assert_eq!(
        service.reject(payment_id),
        Err(LedgerError::AccountNotFound(99))
    );
    assert_eq!(
        service.find_payment_by_id(payment_id)?.status,
        PaymentStatus::InProgress
    );
    Ok(())
}

#[test]
fn test_reject_refund_past_max_balance_changes_nothing() -> Result<()> {
    // A balance at the limit with a payment still outstanding only arises
    // from a hand-built state.
    let mut account = Account::new(1, DEFAULT_PHONE);
    account.balance = i64::MAX;
    let payment = Payment::new(1, 1, "fun");
    let payment_id = payment.id;
    let mut service = WalletService::from_state(LedgerState {
        next_account_id: 1,
        accounts: vec![account],
        payments: vec![payment],
        favorites: vec![],
    });

    assert_eq!(
        service.reject(payment_id),
        Err(LedgerError::BalanceOverflow {
            account_id: 1,
            balance: i64::MAX,
            amount: 1,
        })
    );
    assert_eq!(service.find_account_by_id(1)?.balance, i64::MAX);
    assert_eq!(
        service.find_payment_by_id(payment_id)?.status,
        PaymentStatus::InProgress
    );

    // Once the balance has room the refund goes through
    service.pay(1, 1, "fun")?;
    service.reject(payment_id)?;
    assert_eq!(service.find_account_by_id(1)?.balance, i64::MAX);
    Ok(())
}

// ========================
// Repeat
// ========================

#[test]
fn test_repeat_creates_new_payment() -> Result<()> {
    let mut service = WalletService::new();
    let account = add_account_with_balance(&mut service, DEFAULT_PHONE, 100)?;
    let payment = service.pay(account.id, 25, "fun")?;

    let repeated = service.repeat(payment.id)?;

    assert_ne!(repeated.id, payment.id);
    assert_eq!(repeated.account_id, payment.account_id);
    assert_eq!(repeated.amount, payment.amount);
    assert_eq!(repeated.category, payment.category);
    assert_eq!(repeated.status, PaymentStatus::InProgress);
    assert_eq!(service.find_account_by_id(account.id)?.balance, 50);
    assert_eq!(service.find_payment_by_id(payment.id)?, &payment);
    assert_eq!(service.payments().len(), 2);
    Ok(())
}

#[test]
fn test_repeat_unknown_payment_fails() -> Result<()> {
    let mut service = WalletService::new();
    TestAccount::standard().create(&mut service)?;

    let missing = Uuid::new_v4();
    assert_eq!(
        service.repeat(missing),
        Err(LedgerError::PaymentNotFound(missing))
    );
    assert_eq!(service.payments().len(), 1);
    Ok(())
}

#[test]
fn test_repeat_without_funds_wraps_the_cause() -> Result<()> {
    let mut service = WalletService::new();
    let account = add_account_with_balance(&mut service, DEFAULT_PHONE, 100)?;
    let payment = service.pay(account.id, 60, "fun")?;

    let err = service.repeat(payment.id).unwrap_err();

    assert_eq!(
        err,
        LedgerError::PaymentCreationFailed {
            payment_id: payment.id,
            source: Box::new(LedgerError::InsufficientBalance {
                account_id: account.id,
                balance: 40,
                required: 60,
            }),
        }
    );
    let cause = err.source().expect("wrapped error keeps its cause");
    assert!(cause.to_string().starts_with("Insufficient balance"));
    assert_eq!(service.find_account_by_id(account.id)?.balance, 40);
    Ok(())
}

#[test]
fn test_repeat_with_missing_account_wraps_the_cause() {
    let payment = Payment::new(5, 100, "fun");
    let payment_id = payment.id;
    let mut service = WalletService::from_state(LedgerState {
        payments: vec![payment],
        ..LedgerState::default()
    });

    assert!(matches!(
        service.repeat(payment_id),
        Err(LedgerError::PaymentCreationFailed { source, .. })
            if *source == LedgerError::AccountNotFound(5)
    ));
}

// ========================
// End to end
// ========================

#[test]
fn test_reject_then_repeat_scenario() -> Result<()> {
    let mut service = WalletService::new();

    let account = service.register_account(DEFAULT_PHONE)?;
    assert_eq!(account.id, 1);
    assert_eq!(account.balance, 0);

    service.deposit(account.id, 1000)?;
    assert_eq!(service.find_account_by_id(1)?.balance, 1000);

    let payment = service.pay(1, 100, "fun")?;
    assert_eq!(payment.account_id, 1);
    assert_eq!(payment.amount, 100);
    assert_eq!(payment.status, PaymentStatus::InProgress);
    assert_eq!(service.find_account_by_id(1)?.balance, 900);

    service.reject(payment.id)?;
    assert_eq!(
        service.find_payment_by_id(payment.id)?.status,
        PaymentStatus::Fail
    );
    assert_eq!(service.find_account_by_id(1)?.balance, 1000);

    // Repeat ignores the status of the original payment
    let repeated = service.repeat(payment.id)?;
    assert_ne!(repeated.id, payment.id);
    assert_eq!(repeated.status, PaymentStatus::InProgress);
    assert_eq!(service.find_account_by_id(1)?.balance, 900);
    assert_eq!(service.payments().len(), 2);
    Ok(())
}

#[test]
fn test_restored_service_continues_id_sequence() -> Result<()> {
    let mut service = WalletService::new();
    TestAccount::standard().create(&mut service)?;
    service.register_account("+992900801442")?;

    let state = service.snapshot();
    assert_eq!(state.next_account_id, 2);

    let mut restored = WalletService::from_state(state.clone());
    assert_eq!(restored.snapshot(), state);

    let account = restored.register_account("+992900801443")?;
    assert_eq!(account.id, 3);
    assert_eq!(
        restored.register_account(DEFAULT_PHONE),
        Err(LedgerError::PhoneAlreadyRegistered(DEFAULT_PHONE.to_string()))
    );
    Ok(())
}
