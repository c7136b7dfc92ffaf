use std::future::Future;

use crate::{
    db_types::{NewWithdrawal, UserAccount, Withdrawal},
    traits::StoreError,
};

/// The `LedgerManagement` trait defines the balance ledger behaviour of the database backend.
///
/// Credits are not part of this trait. The only way to increase a balance is through
/// [`crate::LoyaltyDatabase::settle_order`], so that a credit can never be separated from the order that earned it.
pub trait LedgerManagement: Send + Sync {
    /// Creates a user with a zero balance. Returns [`StoreError::UserAlreadyExists`] if the login is taken.
    fn create_user(&self, login: &str) -> impl Future<Output = Result<UserAccount, StoreError>> + Send;

    /// Fetches the user account associated with the given id. If no account exists, `None` is returned.
    fn fetch_user(&self, user_id: i64) -> impl Future<Output = Result<Option<UserAccount>, StoreError>> + Send;

    /// Debits the user's balance and records the withdrawal, in a single atomic transaction.
    ///
    /// * The amount must be positive, otherwise [`StoreError::InvalidAmount`].
    /// * The balance may not go below zero, otherwise [`StoreError::InsufficientFunds`].
    /// * The withdrawal order number is unique, otherwise [`StoreError::WithdrawalAlreadyExists`].
    ///
    /// Returns the withdrawal record and the updated account.
    fn withdraw(
        &self,
        withdrawal: NewWithdrawal,
    ) -> impl Future<Output = Result<(Withdrawal, UserAccount), StoreError>> + Send;

    /// All withdrawals made by the user, oldest first.
    fn fetch_withdrawals_for_user(
        &self,
        user_id: i64,
    ) -> impl Future<Output = Result<Vec<Withdrawal>, StoreError>> + Send;
}
