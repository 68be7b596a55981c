use tracing::{debug, info};

use crate::domain::{
    Account, AccountId, Favorite, FavoriteId, LedgerState, Money, Payment, PaymentCategory,
    PaymentId, PaymentStatus, Phone,
};

use super::LedgerError;

/// In-memory wallet ledger: accounts, the payments made against them, and
/// favorites saved from those payments.
/// This is the primary interface for any client (CLI, storage, tests).
///
/// Every mutation takes `&mut self`, so a caller sharing one service across
/// threads has to put the whole service behind a single lock.
#[derive(Debug, Default)]
pub struct WalletService {
    next_account_id: AccountId,
    accounts: Vec<Account>,
    payments: Vec<Payment>,
    favorites: Vec<Favorite>,
}

impl WalletService {
    /// Create an empty service. The first registered account gets ID 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a service from a previously saved state.
    /// The state is taken as-is; run `LedgerState::check_integrity` first
    /// when it comes from an untrusted source.
    pub fn from_state(state: LedgerState) -> Self {
        Self {
            next_account_id: state.next_account_id,
            accounts: state.accounts,
            payments: state.payments,
            favorites: state.favorites,
        }
    }

    /// Copy of the current state, for checkpointing.
    pub fn snapshot(&self) -> LedgerState {
        LedgerState {
            next_account_id: self.next_account_id,
            accounts: self.accounts.clone(),
            payments: self.payments.clone(),
            favorites: self.favorites.clone(),
        }
    }

    pub fn into_state(self) -> LedgerState {
        LedgerState {
            next_account_id: self.next_account_id,
            accounts: self.accounts,
            payments: self.payments,
            favorites: self.favorites,
        }
    }

    // ========================
    // Account operations
    // ========================

    /// Register a new account with a zero balance.
    pub fn register_account(&mut self, phone: impl Into<Phone>) -> Result<Account, LedgerError> {
        let phone = phone.into();
        if self.accounts.iter().any(|account| account.phone == phone) {
            return Err(refused(LedgerError::PhoneAlreadyRegistered(phone)));
        }

        self.next_account_id += 1;
        let account = Account::new(self.next_account_id, phone);
        self.accounts.push(account.clone());

        info!(account_id = account.id, phone = %account.phone, "Registered account");
        Ok(account)
    }

    /// Top up an existing account.
    pub fn deposit(&mut self, account_id: AccountId, amount: Money) -> Result<(), LedgerError> {
        if amount <= 0 {
            return Err(refused(LedgerError::AmountMustBePositive(amount)));
        }

        let account = self.account_mut(account_id)?;
        account.balance = credited(account, amount)?;

        info!(account_id, amount, balance = account.balance, "Deposited");
        Ok(())
    }

    pub fn find_account_by_id(&self, account_id: AccountId) -> Result<&Account, LedgerError> {
        self.accounts
            .iter()
            .find(|account| account.id == account_id)
            .ok_or(LedgerError::AccountNotFound(account_id))
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    fn account_mut(&mut self, account_id: AccountId) -> Result<&mut Account, LedgerError> {
        self.accounts
            .iter_mut()
            .find(|account| account.id == account_id)
            .ok_or_else(|| refused(LedgerError::AccountNotFound(account_id)))
    }

    // ========================
    // Payment operations
    // ========================

    /// Debit an account and record the payment as in progress.
    pub fn pay(
        &mut self,
        account_id: AccountId,
        amount: Money,
        category: impl Into<PaymentCategory>,
    ) -> Result<Payment, LedgerError> {
        if amount <= 0 {
            return Err(refused(LedgerError::AmountMustBePositive(amount)));
        }

        let account = self.account_mut(account_id)?;
        if !account.can_afford(amount) {
            return Err(refused(LedgerError::InsufficientBalance {
                account_id,
                balance: account.balance,
                required: amount,
            }));
        }
        account.balance -= amount;

        let payment = Payment::new(account_id, amount, category);
        self.payments.push(payment.clone());

        info!(
            payment_id = %payment.id,
            account_id,
            amount,
            category = %payment.category,
            "Payment made"
        );
        Ok(payment)
    }

    pub fn find_payment_by_id(&self, payment_id: PaymentId) -> Result<&Payment, LedgerError> {
        self.payments
            .iter()
            .find(|payment| payment.id == payment_id)
            .ok_or(LedgerError::PaymentNotFound(payment_id))
    }

    pub fn payments(&self) -> &[Payment] {
        &self.payments
    }

    pub fn payments_for_account(&self, account_id: AccountId) -> impl Iterator<Item = &Payment> {
        self.payments
            .iter()
            .filter(move |payment| payment.account_id == account_id)
    }

    /// Reverse a payment: mark it failed and refund its amount.
    ///
    /// A payment can be rejected once. Rejecting it again returns
    /// `PaymentAlreadyRejected` and does not refund a second time.
    pub fn reject(&mut self, payment_id: PaymentId) -> Result<(), LedgerError> {
        let payment = self
            .payments
            .iter_mut()
            .find(|payment| payment.id == payment_id)
            .ok_or_else(|| refused(LedgerError::PaymentNotFound(payment_id)))?;

        if payment.is_rejected() {
            return Err(refused(LedgerError::PaymentAlreadyRejected(payment_id)));
        }

        // Both lookups happen before any write so a failure changes nothing.
        let account = self
            .accounts
            .iter_mut()
            .find(|account| account.id == payment.account_id)
            .ok_or_else(|| refused(LedgerError::AccountNotFound(payment.account_id)))?;

        let refunded = credited(account, payment.amount)?;

        payment.status = PaymentStatus::Fail;
        account.balance = refunded;

        info!(
            %payment_id,
            account_id = account.id,
            refunded = payment.amount,
            balance = account.balance,
            "Payment rejected"
        );
        Ok(())
    }

    /// Pay again with the parameters of an earlier payment.
    ///
    /// The earlier payment's status is not consulted, so a rejected payment
    /// can be repeated. Any failure of the new payment is reported as
    /// `PaymentCreationFailed` with the underlying error as its source.
    pub fn repeat(&mut self, payment_id: PaymentId) -> Result<Payment, LedgerError> {
        let original = self.find_payment_by_id(payment_id)?;
        let (account_id, amount, category) =
            (original.account_id, original.amount, original.category.clone());

        self.pay(account_id, amount, category)
            .map_err(|source| LedgerError::PaymentCreationFailed {
                payment_id,
                source: Box::new(source),
            })
    }

    // ========================
    // Favorite operations
    // ========================

    /// Save a payment's account, amount and category under a name.
    pub fn favorite_payment(
        &mut self,
        payment_id: PaymentId,
        name: impl Into<String>,
    ) -> Result<Favorite, LedgerError> {
        let favorite = Favorite::from_payment(self.find_payment_by_id(payment_id)?, name);
        self.favorites.push(favorite.clone());

        info!(favorite_id = %favorite.id, %payment_id, name = %favorite.name, "Favorite saved");
        Ok(favorite)
    }

    pub fn find_favorite_by_id(&self, favorite_id: FavoriteId) -> Result<&Favorite, LedgerError> {
        self.favorites
            .iter()
            .find(|favorite| favorite.id == favorite_id)
            .ok_or(LedgerError::FavoriteNotFound(favorite_id))
    }

    pub fn favorites(&self) -> &[Favorite] {
        &self.favorites
    }

    /// Make a payment from a favorite. Errors from the payment itself are
    /// returned as they are.
    pub fn pay_from_favorite(&mut self, favorite_id: FavoriteId) -> Result<Payment, LedgerError> {
        let favorite = self.find_favorite_by_id(favorite_id)?;
        let (account_id, amount, category) =
            (favorite.account_id, favorite.amount, favorite.category.clone());

        self.pay(account_id, amount, category)
    }
}

/// Balance after crediting `amount`, or `BalanceOverflow` if it does not fit.
fn credited(account: &Account, amount: Money) -> Result<Money, LedgerError> {
    account.balance.checked_add(amount).ok_or_else(|| {
        refused(LedgerError::BalanceOverflow {
            account_id: account.id,
            balance: account.balance,
            amount,
        })
    })
}

fn refused(err: LedgerError) -> LedgerError {
    debug!(error = %err, "Operation refused");
    err
}
