//! Loyalty Points Engine
//!
//! Users submit purchase order numbers. An external accrual system decides, asynchronously, how many points each
//! order earns, and the engine credits the owner's balance once the accrual is known. This library contains the core
//! logic of that flow. It is independent of the HTTP layer that sits in front of it.
//!
//! The library is divided into four main sections:
//! 1. Database management and control ([`traits`]). Backends implement the order store, the balance ledger and the
//!    settlement transaction. SQLite is the supported backend. The data types used in the database are defined in
//!    [`db_types`].
//! 2. The accrual system client ([`accrual`]), which polls the external service with retries and back-off.
//! 3. The processing pipeline ([`pipeline`]): a bounded queue and a fixed pool of workers that poll and settle
//!    orders.
//! 4. The public API ([`mod@lpe_api`]) used by the HTTP layer to submit orders and read balances.
//!
//! Each order is credited at most once. Settlement only writes to orders that are not yet terminal, and it does so in
//! the same transaction as the balance credit.
mod db;

pub mod accrual;
pub mod db_types;
pub mod helpers;
pub mod lpe_api;
pub mod pipeline;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use db::sqlite::SqliteDatabase;
pub use db::traits;
pub use db::traits::{LedgerManagement, LoyaltyDatabase, OrderManagement, SettlementResult, StoreError};
pub use lpe_api::{
    accounts_api::AccountApi,
    errors::{AccountApiError, OrderFlowError},
    order_flow_api::OrderFlowApi,
    order_objects,
};
