//! Database initialization for the application's SQLite store.

use rusqlite::{Connection, Transaction as SqlTransaction};

use crate::{Error, auth::create_user_table, transaction::create_transaction_table};

/// Enable foreign keys and create the tables for the domain models if they do not exist yet.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    // Foreign key enforcement is a per-connection setting and cannot be changed inside a transaction.
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_transaction_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
