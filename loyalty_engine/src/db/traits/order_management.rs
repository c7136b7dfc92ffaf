use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{
    db_types::{NewOrder, Order},
    traits::StoreError,
};

/// The `OrderManagement` trait defines the order store behaviour of the database backend.
pub trait OrderManagement: Send + Sync {
    /// Stores a brand-new order with status `NEW`.
    ///
    /// The order number is unique across all users. If it has already been stored, by anyone,
    /// [`StoreError::OrderAlreadyExists`] is returned and nothing is written. If the user does not exist,
    /// [`StoreError::UserNotFound`] is returned.
    fn insert_order(&self, order: NewOrder) -> impl Future<Output = Result<Order, StoreError>> + Send;

    /// Fetches the order with the given (normalized) number, or `None` if no such order exists.
    fn fetch_order_by_number(&self, number: &str) -> impl Future<Output = Result<Option<Order>, StoreError>> + Send;

    /// Fetches the order with the given internal id, or `None` if no such order exists.
    fn fetch_order_by_id(&self, id: i64) -> impl Future<Output = Result<Option<Order>, StoreError>> + Send;

    /// All orders belonging to the user, oldest first.
    fn fetch_orders_for_user(&self, user_id: i64) -> impl Future<Output = Result<Vec<Order>, StoreError>> + Send;

    /// Moves a `NEW` order to `PROCESSING` and refreshes its `updated_at` timestamp. A `PROCESSING` order only has its
    /// timestamp refreshed. Terminal orders are returned untouched.
    ///
    /// Returns the order as it is after the call, or [`StoreError::OrderIdNotFound`].
    fn mark_order_processing(&self, id: i64) -> impl Future<Output = Result<Order, StoreError>> + Send;

    /// Fetches orders that are still `NEW` or `PROCESSING`, oldest first. If `updated_before` is given, only orders
    /// that have not been touched since then are returned.
    fn fetch_unresolved_orders(
        &self,
        updated_before: Option<DateTime<Utc>>,
    ) -> impl Future<Output = Result<Vec<Order>, StoreError>> + Send;
}
