//! Defines the core data models and database queries for transactions.
//!
//! Every query takes the owner's [UserID] and filters on it in SQL, so a
//! user can never read or change another user's rows.

use std::fmt::Display;

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, UtcOffset};
use uuid::Uuid;

use crate::{Error, UserID};

// ============================================================================
// MODELS
// ============================================================================

/// A newtype wrapper for transaction IDs.
///
/// IDs are random UUIDs stored as text in the database.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct TransactionId(Uuid);

impl TransactionId {
    /// Generate a new, random transaction ID.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl ToSql for TransactionId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0.to_string()))
    }
}

impl FromSql for TransactionId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        Uuid::parse_str(value.as_str()?)
            .map(Self)
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// To create a new `Transaction`, use [NewTransaction::new] and [create_transaction].
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// A short text description of what the transaction was for.
    pub label: String,
    /// The amount of money spent (negative) or earned (positive).
    pub amount: f64,
    /// When the transaction happened, in UTC.
    pub date: OffsetDateTime,
    /// The user that owns the transaction.
    pub user_id: UserID,
    /// When the row was inserted.
    pub created_at: OffsetDateTime,
    /// When the row was last changed. Rows are never edited, so this equals `created_at`.
    pub updated_at: OffsetDateTime,
}

/// A validated transaction that has not been saved yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    label: String,
    amount: f64,
    date: Option<OffsetDateTime>,
}

impl NewTransaction {
    /// Validate the fields for a new transaction.
    ///
    /// The label is stored trimmed. The date defaults to the time the
    /// transaction is inserted, use [NewTransaction::date] to override it.
    ///
    /// # Errors
    ///
    /// Returns a:
    /// - [Error::EmptyLabel] if `label` is empty or only whitespace,
    /// - [Error::NonFiniteAmount] if `amount` is NaN or infinite.
    pub fn new(label: &str, amount: f64) -> Result<Self, Error> {
        let label = label.trim();

        if label.is_empty() {
            return Err(Error::EmptyLabel);
        }

        if !amount.is_finite() {
            return Err(Error::NonFiniteAmount);
        }

        Ok(Self {
            label: label.to_owned(),
            amount,
            date: None,
        })
    }

    /// Set when the transaction happened, stored in UTC.
    pub fn date(mut self, date: OffsetDateTime) -> Self {
        self.date = Some(date.to_offset(UtcOffset::UTC));
        self
    }

    /// The trimmed label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The signed amount.
    pub fn amount(&self) -> f64 {
        self.amount
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id TEXT PRIMARY KEY,
                label TEXT NOT NULL CHECK(trim(label) <> ''),
                amount REAL NOT NULL,
                date TEXT NOT NULL,
                user_id TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    // Composite index used by the dashboard queries.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date);",
        (),
    )?;

    Ok(())
}

/// Create a new transaction owned by `owner`.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error,
/// e.g. `owner` does not refer to a registered user.
pub fn create_transaction(
    owner: UserID,
    new_transaction: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let now = OffsetDateTime::now_utc();
    let date = new_transaction.date.unwrap_or(now);

    let transaction = connection
        .prepare(
            "INSERT INTO \"transaction\" (id, label, amount, date, user_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             RETURNING id, label, amount, date, user_id, created_at, updated_at",
        )?
        .query_row(
            (
                TransactionId::new_random(),
                new_transaction.label,
                new_transaction.amount,
                date,
                owner,
                now,
                now,
            ),
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Get all of `owner`'s transactions, newest first.
///
/// Transactions with the same date are ordered by most recently inserted first.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn list_transactions(
    owner: UserID,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(
            "SELECT id, label, amount, date, user_id, created_at, updated_at
             FROM \"transaction\"
             WHERE user_id = :user_id
             ORDER BY date DESC, rowid DESC",
        )?
        .query_map(&[(":user_id", &owner)], map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// The number of rows changed by a query.
pub type RowsAffected = usize;

/// Delete the transaction `id` if it belongs to `owner`.
///
/// Deleting a transaction that does not exist or belongs to another user
/// affects zero rows and is not an error.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn delete_transaction(
    owner: UserID,
    id: TransactionId,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    connection
        .execute(
            "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
            (id, owner),
        )
        .map_err(|error| error.into())
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let label = row.get(1)?;
    let amount = row.get(2)?;
    let date = row.get(3)?;
    let user_id = row.get(4)?;
    let created_at = row.get(5)?;
    let updated_at = row.get(6)?;

    Ok(Transaction {
        id,
        label,
        amount,
        date,
        user_id,
        created_at,
        updated_at,
    })
}

// ============================================================================
// TESTS
// ============================================================================


#[cfg(test)]
mod database_tests {
    use time::{OffsetDateTime, macros::datetime};

    use crate::{
        Error,
        test_utils::{create_test_user, get_test_connection},
        transaction::{
            NewTransaction, TransactionId, create_transaction, delete_transaction,
            list_transactions,
        },
    };

    #[test]
    fn create_then_list_returns_new_row() {
        let conn = get_test_connection();
        let user = create_test_user(&conn, "alice@example.com");

        let created = create_transaction(
            user.id,
            NewTransaction::new("salary", 20000.0).unwrap(),
            &conn,
        )
        .expect("Could not create transaction");

        let transactions = list_transactions(user.id, &conn).unwrap();

        assert_eq!(transactions, vec![created.clone()]);
        assert_eq!(created.label, "salary");
        assert_eq!(created.amount, 20000.0);
        assert_eq!(created.user_id, user.id);
        assert_eq!(created.created_at, created.updated_at);
    }

    #[test]
    fn date_defaults_to_now() {
        let conn = get_test_connection();
        let user = create_test_user(&conn, "alice@example.com");
        let before = OffsetDateTime::now_utc();

        let created =
            create_transaction(user.id, NewTransaction::new("tea", -3.0).unwrap(), &conn).unwrap();

        assert!(created.date >= before);
        assert!(created.date <= OffsetDateTime::now_utc());
    }

    #[test]
    fn create_fails_for_unknown_owner() {
        let conn = get_test_connection();

        let result = create_transaction(
            crate::UserID::new_random(),
            NewTransaction::new("tea", -3.0).unwrap(),
            &conn,
        );

        assert!(matches!(result, Err(Error::SqlError(_))), "got {result:?}");
    }

    #[test]
    fn label_check_constraint_rejects_blank_label() {
        let conn = get_test_connection();
        let user = create_test_user(&conn, "alice@example.com");

        let result = conn.execute(
            "INSERT INTO \"transaction\" (id, label, amount, date, user_id, created_at, updated_at)
             VALUES ('x', '   ', 1.0, '2025-01-01', ?1, '2025-01-01', '2025-01-01')",
            [user.id],
        );

        assert!(result.is_err());
    }

    #[test]
    fn list_is_newest_first() {
        let conn = get_test_connection();
        let user = create_test_user(&conn, "alice@example.com");
        for (label, date) in [
            ("middle", datetime!(2025-03-02 09:00 UTC)),
            ("oldest", datetime!(2025-03-01 09:00 UTC)),
            ("newest", datetime!(2025-03-03 09:00 UTC)),
        ] {
            create_transaction(
                user.id,
                NewTransaction::new(label, 1.0).unwrap().date(date),
                &conn,
            )
            .unwrap();
        }

        let labels: Vec<String> = list_transactions(user.id, &conn)
            .unwrap()
            .into_iter()
            .map(|transaction| transaction.label)
            .collect();

        assert_eq!(labels, ["newest", "middle", "oldest"]);
    }

    #[test]
    fn list_orders_by_instant_across_offsets() {
        let conn = get_test_connection();
        let user = create_test_user(&conn, "alice@example.com");
        for (label, date) in [
            ("ten_utc", datetime!(2025-03-01 18:00 +08:00)),
            ("twelve_utc", datetime!(2025-03-01 04:00 -08:00)),
        ] {
            create_transaction(
                user.id,
                NewTransaction::new(label, 1.0).unwrap().date(date),
                &conn,
            )
            .unwrap();
        }

        let transactions = list_transactions(user.id, &conn).unwrap();
        let labels: Vec<&str> = transactions
            .iter()
            .map(|transaction| transaction.label.as_str())
            .collect();

        assert_eq!(labels, ["twelve_utc", "ten_utc"]);
        assert_eq!(transactions[0].date, datetime!(2025-03-01 12:00 UTC));
        assert_eq!(transactions[0].date.offset(), time::UtcOffset::UTC);
    }

    #[test]
    fn list_breaks_date_ties_by_insertion_order() {
        let conn = get_test_connection();
        let user = create_test_user(&conn, "alice@example.com");
        let date = datetime!(2025-03-01 09:00 UTC);
        for label in ["first", "second", "third"] {
            create_transaction(
                user.id,
                NewTransaction::new(label, 1.0).unwrap().date(date),
                &conn,
            )
            .unwrap();
        }

        let labels: Vec<String> = list_transactions(user.id, &conn)
            .unwrap()
            .into_iter()
            .map(|transaction| transaction.label)
            .collect();

        assert_eq!(labels, ["third", "second", "first"]);
    }

    #[test]
    fn list_only_returns_owners_rows() {
        let conn = get_test_connection();
        let alice = create_test_user(&conn, "alice@example.com");
        let bob = create_test_user(&conn, "bob@example.com");
        create_transaction(alice.id, NewTransaction::new("a", 1.0).unwrap(), &conn).unwrap();
        create_transaction(bob.id, NewTransaction::new("b", 2.0).unwrap(), &conn).unwrap();

        let transactions = list_transactions(alice.id, &conn).unwrap();

        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].label, "a");
    }

    #[test]
    fn delete_removes_own_row() {
        let conn = get_test_connection();
        let user = create_test_user(&conn, "alice@example.com");
        let transaction =
            create_transaction(user.id, NewTransaction::new("a", 1.0).unwrap(), &conn).unwrap();

        let rows_affected = delete_transaction(user.id, transaction.id, &conn).unwrap();

        assert_eq!(rows_affected, 1);
        assert_eq!(list_transactions(user.id, &conn).unwrap(), vec![]);
    }

    #[test]
    fn delete_leaves_other_users_row_unchanged() {
        let conn = get_test_connection();
        let alice = create_test_user(&conn, "alice@example.com");
        let mallory = create_test_user(&conn, "mallory@example.com");
        let transaction =
            create_transaction(alice.id, NewTransaction::new("a", 1.0).unwrap(), &conn).unwrap();

        let rows_affected = delete_transaction(mallory.id, transaction.id, &conn).unwrap();

        assert_eq!(rows_affected, 0);
        assert_eq!(list_transactions(alice.id, &conn).unwrap(), vec![transaction]);
    }

    #[test]
    fn delete_missing_row_affects_nothing() {
        let conn = get_test_connection();
        let user = create_test_user(&conn, "alice@example.com");

        let rows_affected = delete_transaction(user.id, TransactionId::new_random(), &conn);

        assert_eq!(rows_affected, Ok(0));
    }

    #[test]
    fn deleting_user_cascades_to_transactions() {
        let conn = get_test_connection();
        let user = create_test_user(&conn, "alice@example.com");
        create_transaction(user.id, NewTransaction::new("a", 1.0).unwrap(), &conn).unwrap();

        conn.execute("DELETE FROM user WHERE id = ?1", [user.id])
            .unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM \"transaction\"", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
