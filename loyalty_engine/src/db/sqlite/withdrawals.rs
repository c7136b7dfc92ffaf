use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewWithdrawal, Withdrawal},
    traits::StoreError,
};

const WITHDRAWAL_COLUMNS: &str = "id, order_number, user_id, amount, processed_at";

/// Records a withdrawal. This does not touch the user's balance; see [`super::user_accounts::debit_balance`].
pub(crate) async fn insert_withdrawal(
    withdrawal: NewWithdrawal,
    conn: &mut SqliteConnection,
) -> Result<Withdrawal, StoreError> {
    let sql = format!(
        "INSERT INTO withdrawals (order_number, user_id, amount) VALUES ($1, $2, $3) RETURNING {WITHDRAWAL_COLUMNS};"
    );
    let result = sqlx::query_as::<_, Withdrawal>(&sql)
        .bind(&withdrawal.order_number)
        .bind(withdrawal.user_id)
        .bind(withdrawal.amount)
        .fetch_one(conn)
        .await;
    match result {
        Ok(w) => {
            debug!("💸️ Withdrawal #{} of {} against order {} recorded", w.id, w.amount, w.order_number);
            Ok(w)
        },
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            Err(StoreError::WithdrawalAlreadyExists(withdrawal.order_number))
        },
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_withdrawals_for_user(
    user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Withdrawal>, StoreError> {
    let sql = format!("SELECT {WITHDRAWAL_COLUMNS} FROM withdrawals WHERE user_id = $1 ORDER BY processed_at ASC, id ASC;");
    let withdrawals = sqlx::query_as::<_, Withdrawal>(&sql).bind(user_id).fetch_all(conn).await?;
    Ok(withdrawals)
}
