use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use sqlx::{migrate, SqlitePool};

use super::{new_pool, orders, user_accounts, withdrawals};
use crate::{
    db_types::{NewOrder, NewWithdrawal, Order, TerminalStatus, UserAccount, Withdrawal},
    traits::{LedgerManagement, LoyaltyDatabase, OrderManagement, SettlementResult, StoreError},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl LoyaltyDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    /// The order update is the first statement of the transaction, so the write lock is taken up front and
    /// concurrent settlements queue up behind it rather than failing on a lock upgrade.
    async fn settle_order(&self, order_id: i64, terminal: TerminalStatus) -> Result<SettlementResult, StoreError> {
        let mut tx = self.pool.begin().await?;
        let order = match orders::settle_order(order_id, terminal, &mut tx).await? {
            Some(order) => order,
            None => {
                let existing = orders::fetch_order_by_id(order_id, &mut tx)
                    .await?
                    .ok_or(StoreError::OrderIdNotFound(order_id))?;
                debug!("🗃️ Order #{} is already {}. Nothing to settle.", existing.number, existing.status);
                tx.rollback().await?;
                return Ok(SettlementResult::AlreadySettled(existing));
            },
        };
        let account = match terminal {
            TerminalStatus::Processed(accrual) => {
                Some(user_accounts::credit_balance(order.user_id, accrual, &mut tx).await?)
            },
            TerminalStatus::Invalid => None,
        };
        tx.commit().await?;
        debug!("🗃️ Order #{} settled as {terminal} for user #{}", order.number, order.user_id);
        Ok(SettlementResult::Settled { order, account })
    }

    async fn close(&mut self) -> Result<(), StoreError> {
        self.pool.close().await;
        Ok(())
    }
}

impl OrderManagement for SqliteDatabase {
    async fn insert_order(&self, order: NewOrder) -> Result<Order, StoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::insert_order(order, &mut conn).await
    }

    async fn fetch_order_by_number(&self, number: &str) -> Result<Option<Order>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order_by_number(number, &mut conn).await
    }

    async fn fetch_order_by_id(&self, id: i64) -> Result<Option<Order>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order_by_id(id, &mut conn).await
    }

    async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_orders_for_user(user_id, &mut conn).await
    }

    async fn mark_order_processing(&self, id: i64) -> Result<Order, StoreError> {
        let mut conn = self.pool.acquire().await?;
        match orders::mark_processing(id, &mut conn).await? {
            Some(order) => {
                trace!("🗃️ Order #{} is now {}", order.number, order.status);
                Ok(order)
            },
            None => orders::fetch_order_by_id(id, &mut conn).await?.ok_or(StoreError::OrderIdNotFound(id)),
        }
    }

    async fn fetch_unresolved_orders(&self, updated_before: Option<DateTime<Utc>>) -> Result<Vec<Order>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_unresolved_orders(updated_before, &mut conn).await
    }
}

impl LedgerManagement for SqliteDatabase {
    async fn create_user(&self, login: &str) -> Result<UserAccount, StoreError> {
        let mut conn = self.pool.acquire().await?;
        user_accounts::create_user(login, &mut conn).await
    }

    async fn fetch_user(&self, user_id: i64) -> Result<Option<UserAccount>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        user_accounts::user_account_by_id(user_id, &mut conn).await
    }

    /// The debit is the first statement of the transaction. If the withdrawal record cannot be written (e.g. the
    /// order number was already used), the transaction is dropped and the debit rolls back with it.
    async fn withdraw(&self, withdrawal: NewWithdrawal) -> Result<(Withdrawal, UserAccount), StoreError> {
        if !withdrawal.amount.is_positive() {
            return Err(StoreError::InvalidAmount(withdrawal.amount));
        }
        let user_id = withdrawal.user_id;
        let amount = withdrawal.amount;
        let mut tx = self.pool.begin().await?;
        let account = match user_accounts::debit_balance(user_id, amount, &mut tx).await? {
            Some(account) => account,
            None => {
                let user =
                    user_accounts::user_account_by_id(user_id, &mut tx).await?.ok_or(StoreError::UserNotFound(user_id))?;
                info!("💸️ User #{user_id} tried to withdraw {amount} but only has {}", user.current_balance);
                return Err(StoreError::InsufficientFunds { user_id, requested: amount, available: user.current_balance });
            },
        };
        let record = withdrawals::insert_withdrawal(withdrawal, &mut tx).await?;
        tx.commit().await?;
        debug!("💸️ User #{user_id} withdrew {amount}. Remaining balance: {}", account.current_balance);
        Ok((record, account))
    }

    async fn fetch_withdrawals_for_user(&self, user_id: i64) -> Result<Vec<Withdrawal>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        withdrawals::fetch_withdrawals_for_user(user_id, &mut conn).await
    }
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the schema up to date. Safe to call on every startup.
    pub async fn run_migrations(&self) -> Result<(), StoreError> {
        migrate!("./src/db/sqlite/migrations").run(&self.pool).await.map_err(|e| StoreError::DatabaseError(e.to_string()))?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }
}
