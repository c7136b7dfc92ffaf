//! #  Database management and control.
//!
//! This module provides the interfaces that define the contracts of the loyalty engine database *backends*.
//!
//! ## Orders
//! An order is a purchase number submitted by a user. Its number is globally unique: the first user to submit it owns
//! it. The order then moves from `NEW` to `PROCESSING` while the accrual system is polled, and finally to one of the
//! terminal states, `INVALID` or `PROCESSED`.
//!
//! ## Ledger
//! Every user has a spendable balance and a lifetime withdrawn total. The balance only grows through settlement of a
//! `PROCESSED` order and only shrinks through withdrawals.
//!
//! ## Traits
//! * [`LoyaltyDatabase`] defines the highest level of behavior for backends, including the settlement transaction.
//! * [`OrderManagement`] defines the order store.
//! * [`LedgerManagement`] defines the balance ledger.
//!
//! Trait methods return `Send` futures so that backends can be driven from the worker pool's spawned tasks.
mod ledger_management;
mod loyalty_database;
mod order_management;

mod data_objects;

pub use data_objects::SettlementResult;
pub use ledger_management::LedgerManagement;
pub use loyalty_database::{LoyaltyDatabase, StoreError};
pub use order_management::OrderManagement;
