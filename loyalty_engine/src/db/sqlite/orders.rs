use chrono::{DateTime, Utc};
use log::{debug, trace};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db_types::{NewOrder, Order, TerminalStatus},
    traits::StoreError,
};

const ORDER_COLUMNS: &str = "id, number, user_id, status, accrual, created_at, updated_at";

/// Inserts a new order into the database using the given connection. This is not atomic. You can embed this call
/// inside a transaction if you need to ensure atomicity, and pass `&mut tx` as the connection argument.
///
/// Uniqueness of the order number is enforced by the database, so two racing inserts of the same number cannot both
/// succeed.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, StoreError> {
    let sql = format!("INSERT INTO orders (number, user_id) VALUES ($1, $2) RETURNING {ORDER_COLUMNS};");
    let result = sqlx::query_as::<_, Order>(&sql).bind(&order.number).bind(order.user_id).fetch_one(conn).await;
    match result {
        Ok(o) => {
            debug!("📝️ Order #{} saved for user #{} with id {}", o.number, o.user_id, o.id);
            Ok(o)
        },
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(StoreError::OrderAlreadyExists(order.number)),
        Err(sqlx::Error::Database(e)) if e.is_foreign_key_violation() => Err(StoreError::UserNotFound(order.user_id)),
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_order_by_number(number: &str, conn: &mut SqliteConnection) -> Result<Option<Order>, StoreError> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE number = $1;");
    let order = sqlx::query_as::<_, Order>(&sql).bind(number).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, StoreError> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1;");
    let order = sqlx::query_as::<_, Order>(&sql).bind(id).fetch_optional(conn).await?;
    Ok(order)
}

/// Resulting orders are ordered by upload time, in ascending order
pub async fn fetch_orders_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Order>, StoreError> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at ASC, id ASC;");
    let orders = sqlx::query_as::<_, Order>(&sql).bind(user_id).fetch_all(conn).await?;
    trace!("📝️ User #{user_id} has {} orders", orders.len());
    Ok(orders)
}

/// Moves the order to `PROCESSING` if it is not terminal. Returns `None` if no row was updated, i.e. the order is
/// either terminal or does not exist.
pub(crate) async fn mark_processing(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, StoreError> {
    let sql = format!(
        "UPDATE orders SET status = 'PROCESSING', updated_at = CURRENT_TIMESTAMP WHERE id = $1 AND status IN ('NEW', \
         'PROCESSING') RETURNING {ORDER_COLUMNS};"
    );
    let order = sqlx::query_as::<_, Order>(&sql).bind(id).fetch_optional(conn).await?;
    Ok(order)
}

/// Writes the terminal status and accrual for the order, provided it is not terminal yet. This is the only statement
/// in the crate that writes a terminal status.
///
/// Returns `None` if no row was updated, i.e. the order is already terminal or does not exist.
pub(crate) async fn settle_order(
    id: i64,
    terminal: TerminalStatus,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, StoreError> {
    let sql = format!(
        "UPDATE orders SET status = $1, accrual = $2, updated_at = CURRENT_TIMESTAMP WHERE id = $3 AND status IN \
         ('NEW', 'PROCESSING') RETURNING {ORDER_COLUMNS};"
    );
    let order = sqlx::query_as::<_, Order>(&sql)
        .bind(terminal.status())
        .bind(terminal.accrual())
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

/// Fetches `NEW` and `PROCESSING` orders, oldest first, optionally only those last updated before the given time.
pub async fn fetch_unresolved_orders(
    updated_before: Option<DateTime<Utc>>,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, StoreError> {
    let mut builder = QueryBuilder::<Sqlite>::new(format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE status IN ('NEW', 'PROCESSING')"
    ));
    if let Some(cutoff) = updated_before {
        // datetime() normalises both the CURRENT_TIMESTAMP and RFC3339 text formats before comparing
        builder.push(" AND datetime(updated_at) < datetime(");
        builder.push_bind(cutoff);
        builder.push(")");
    }
    builder.push(" ORDER BY created_at ASC, id ASC");
    trace!("📝️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    trace!("📝️ {} unresolved orders found", orders.len());
    Ok(orders)
}
