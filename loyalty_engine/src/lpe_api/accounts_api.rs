//! Read access to a user's orders and ledger, plus withdrawals.

use std::fmt::Debug;

use log::*;
use lp_common::Points;

use crate::{
    db_types::{NewWithdrawal, Order, Withdrawal},
    helpers::{is_valid_order_number, normalize_order_number},
    lpe_api::{errors::AccountApiError, order_objects::Balance},
    traits::{LedgerManagement, OrderManagement},
};

pub struct AccountApi<B> {
    db: B,
}

impl<B: Debug> Debug for AccountApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccountApi ({:?})", self.db)
    }
}

impl<B> AccountApi<B>
where B: OrderManagement + LedgerManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// All orders the user has submitted, oldest first.
    pub async fn orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, AccountApiError> {
        let orders = self.db.fetch_orders_for_user(user_id).await?;
        Ok(orders)
    }

    /// The user's spendable balance and lifetime withdrawals, as committed in the ledger.
    pub async fn balance(&self, user_id: i64) -> Result<Balance, AccountApiError> {
        let account = self.db.fetch_user(user_id).await?.ok_or(AccountApiError::UserNotFound(user_id))?;
        Ok(Balance::from(&account))
    }

    /// Spends `amount` points against `order_number`. Each order number can only be used for one withdrawal, and
    /// the balance may not go negative.
    pub async fn withdraw(
        &self,
        user_id: i64,
        order_number: &str,
        amount: Points,
    ) -> Result<Withdrawal, AccountApiError> {
        let number = normalize_order_number(order_number);
        if !is_valid_order_number(&number) {
            return Err(AccountApiError::InvalidFormat(number));
        }
        let (withdrawal, account) = self.db.withdraw(NewWithdrawal::new(user_id, number, amount)).await?;
        info!("💸️ User #{user_id} spent {amount} points. Balance is now {}", account.current_balance);
        Ok(withdrawal)
    }

    /// All withdrawals the user has made, oldest first.
    pub async fn withdrawals(&self, user_id: i64) -> Result<Vec<Withdrawal>, AccountApiError> {
        let withdrawals = self.db.fetch_withdrawals_for_user(user_id).await?;
        trace!("💸️ User #{user_id} has made {} withdrawals", withdrawals.len());
        Ok(withdrawals)
    }
}
