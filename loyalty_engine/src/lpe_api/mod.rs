//! # Loyalty engine public API
//!
//! The `lpe_api` module is the boundary used by the (external) HTTP layer.
//!
//! * [`order_flow_api`] accepts order submissions, stores them and hands them to the accrual pipeline. It also
//!   re-drives orders that fell out of the pipeline.
//! * [`accounts_api`] reads a user's orders, balance and withdrawals, and debits the balance for withdrawals.
//!
//! # API usage
//!
//! An API instance is created by supplying a database backend that implements the backend traits required by the
//! API.
//!
//! ```rust,ignore
//! use loyalty_engine::{AccountApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! let api = AccountApi::new(db);
//! let balance = api.balance(user_id).await?;
//! ```
pub mod accounts_api;
pub mod errors;
pub mod order_flow_api;
pub mod order_objects;
