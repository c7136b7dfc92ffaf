use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db_types::{Points, UserAccount},
    traits::StoreError,
};

const USER_COLUMNS: &str = "id, login, current_balance, withdrawn, created_at, updated_at";

pub async fn create_user(login: &str, conn: &mut SqliteConnection) -> Result<UserAccount, StoreError> {
    let sql = format!("INSERT INTO users (login) VALUES ($1) RETURNING {USER_COLUMNS};");
    let result = sqlx::query_as::<_, UserAccount>(&sql).bind(login).fetch_one(conn).await;
    match result {
        Ok(user) => {
            debug!("🧑️ Created user '{}' with id #{}", user.login, user.id);
            Ok(user)
        },
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(StoreError::UserAlreadyExists(login.into())),
        Err(e) => Err(e.into()),
    }
}

pub async fn user_account_by_id(user_id: i64, conn: &mut SqliteConnection) -> Result<Option<UserAccount>, StoreError> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1;");
    let user = sqlx::query_as::<_, UserAccount>(&sql).bind(user_id).fetch_optional(conn).await?;
    Ok(user)
}

/// Adds `amount` to the user's current balance. The increment happens inside the `UPDATE` statement itself, so
/// concurrent credits for the same user cannot overwrite each other.
pub(crate) async fn credit_balance(
    user_id: i64,
    amount: Points,
    conn: &mut SqliteConnection,
) -> Result<UserAccount, StoreError> {
    let sql = format!(
        "UPDATE users SET current_balance = current_balance + $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 \
         RETURNING {USER_COLUMNS};"
    );
    let user = sqlx::query_as::<_, UserAccount>(&sql)
        .bind(amount)
        .bind(user_id)
        .fetch_optional(conn)
        .await?
        .ok_or(StoreError::UserNotFound(user_id))?;
    trace!("🧑️ Credited {amount} to user #{user_id}. New balance: {}", user.current_balance);
    Ok(user)
}

/// Moves `amount` from the user's current balance to their withdrawn total, provided the balance covers it.
///
/// Returns `None` if no row was updated, i.e. the balance is too low or the user does not exist.
pub(crate) async fn debit_balance(
    user_id: i64,
    amount: Points,
    conn: &mut SqliteConnection,
) -> Result<Option<UserAccount>, StoreError> {
    let sql = format!(
        "UPDATE users SET current_balance = current_balance - $1, withdrawn = withdrawn + $1, updated_at = \
         CURRENT_TIMESTAMP WHERE id = $2 AND current_balance >= $1 RETURNING {USER_COLUMNS};"
    );
    let user = sqlx::query_as::<_, UserAccount>(&sql).bind(amount).bind(user_id).fetch_optional(conn).await?;
    if let Some(u) = &user {
        trace!("🧑️ Debited {amount} from user #{user_id}. New balance: {}", u.current_balance);
    }
    Ok(user)
}
