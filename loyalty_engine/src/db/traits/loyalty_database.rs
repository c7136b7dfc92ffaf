use std::future::Future;

use lp_common::Points;
use thiserror::Error;

use crate::{
    db_types::TerminalStatus,
    traits::{LedgerManagement, OrderManagement, SettlementResult},
};

/// This trait defines the highest level of behaviour for backends supporting the loyalty engine.
///
/// Besides the order store and ledger, a backend has to provide the settlement transaction, which is the only writer
/// of terminal order states and the only source of balance credits.
pub trait LoyaltyDatabase: Clone + OrderManagement + LedgerManagement + 'static {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Applies the accrual system's final verdict to an order, in a single atomic transaction:
    /// * The order status moves from `NEW` or `PROCESSING` to the terminal status, and the accrual is recorded.
    /// * If the status is `PROCESSED`, the owner's current balance is increased by the accrual.
    ///
    /// Either both changes are committed or neither is. If the order is already terminal, nothing is written and
    /// [`SettlementResult::AlreadySettled`] is returned, which makes retrying a settlement safe.
    ///
    /// Concurrent settlements of different orders for the same user must both land.
    fn settle_order(
        &self,
        order_id: i64,
        terminal: TerminalStatus,
    ) -> impl Future<Output = Result<SettlementResult, StoreError>> + Send;

    /// Closes the database connection.
    fn close(&mut self) -> impl Future<Output = Result<(), StoreError>> + Send {
        async { Ok(()) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("We have an internal database engine (configuration/uptime etc.) error: {0}")]
    DatabaseError(String),
    #[error("Cannot insert order, since order number {0} already exists")]
    OrderAlreadyExists(String),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(String),
    #[error("The requested order (internal id {0}) does not exist")]
    OrderIdNotFound(i64),
    #[error("The requested user id {0} does not exist")]
    UserNotFound(i64),
    #[error("A user with login '{0}' already exists")]
    UserAlreadyExists(String),
    #[error("User {user_id} cannot withdraw {requested}. Only {available} is available")]
    InsufficientFunds { user_id: i64, requested: Points, available: Points },
    #[error("A withdrawal against order {0} has already been made")]
    WithdrawalAlreadyExists(String),
    #[error("{0} is not a valid amount for this operation")]
    InvalidAmount(Points),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::DatabaseError(e.to_string())
    }
}
