use axum::{
    Extension,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use axum_htmx::HX_TRIGGER;

use crate::{
    Error, UserID,
    alert::Alert,
    transaction::{
        TRANSACTIONS_CHANGED_EVENT, TransactionId, create_endpoint::TransactionState,
        delete_transaction,
    },
};

/// A route handler for deleting one of the logged in user's transactions,
/// responds with an alert.
///
/// Deleting a transaction that is already gone, or that belongs to someone
/// else, changes nothing and still reports success.
pub async fn delete_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<TransactionId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_transaction(user_id, transaction_id, &connection) {
        Ok(0) => {
            tracing::debug!(
                "delete of transaction {transaction_id} by user {user_id} matched no rows"
            );
        }
        Ok(_) => {}
        Err(error) => {
            tracing::error!("could not delete transaction {transaction_id}: {error}");
            return error.into_alert_response();
        }
    }

    (
        [(HX_TRIGGER, TRANSACTIONS_CHANGED_EVENT)],
        Alert::SuccessSimple {
            message: "Transaction deleted".to_owned(),
        },
    )
        .into_response()
}
