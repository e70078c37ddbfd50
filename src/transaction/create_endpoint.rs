//! Defines the endpoint for creating a new transaction from the manual entry form.
use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::Form;
use axum_htmx::HX_TRIGGER;
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error, UserID,
    alert::Alert,
    html::format_currency,
    transaction::{NewTransaction, TRANSACTIONS_CHANGED_EVENT, create_transaction},
};

/// The state needed to create or delete a transaction.
#[derive(Debug, Clone)]
pub struct TransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for creating a transaction.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionForm {
    /// Text describing the transaction.
    #[serde(default)]
    pub label: String,
    /// The signed amount as typed by the user, parsed in the handler so that
    /// bad input gets an alert rather than a bare 422 from the extractor.
    #[serde(default)]
    pub amount: String,
}

/// A route handler for creating a new transaction owned by the logged in user.
///
/// Responds with a success alert and the `transactions-changed` trigger, or
/// an error alert (422) if the form is invalid, in which case nothing is saved.
pub async fn create_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<TransactionForm>,
) -> Response {
    let new_transaction = match parse_form(&form) {
        Ok(new_transaction) => new_transaction,
        Err(error) => {
            tracing::warn!("rejected new transaction {form:?}: {error}");
            return error.into_alert_response();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let transaction = match create_transaction(user_id, new_transaction, &connection) {
        Ok(transaction) => transaction,
        Err(error) => {
            tracing::error!("could not create transaction: {error}");
            return error.into_alert_response();
        }
    };

    (
        [(HX_TRIGGER, TRANSACTIONS_CHANGED_EVENT)],
        Alert::SuccessSimple {
            message: format!(
                "Added {} ({})",
                transaction.label,
                format_currency(transaction.amount)
            ),
        },
    )
        .into_response()
}

fn parse_form(form: &TransactionForm) -> Result<NewTransaction, Error> {
    let amount = form
        .amount
        .trim()
        .parse::<f64>()
        .map_err(|_| Error::InvalidAmount(form.amount.clone()))?;

    NewTransaction::new(&form.label, amount)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, http::StatusCode};
    use axum_extra::extract::Form;
    use scraper::Selector;

    use crate::{
        UserID,
        test_utils::{create_test_user, get_header, get_test_connection, parse_html_fragment},
        transaction::{
            create_endpoint::{TransactionForm, TransactionState, create_transaction_endpoint},
            list_transactions,
        },
    };

    fn get_state_and_user() -> (TransactionState, UserID) {
        let conn = get_test_connection();
        let user = create_test_user(&conn, "alice@example.com");
        let state = TransactionState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        (state, user.id)
    }

    fn form(label: &str, amount: &str) -> Form<TransactionForm> {
        Form(TransactionForm {
            label: label.to_owned(),
            amount: amount.to_owned(),
        })
    }

    fn count_rows(state: &TransactionState, user_id: UserID) -> usize {
        let connection = state.db_connection.lock().unwrap();
        list_transactions(user_id, &connection).unwrap().len()
    }

    #[tokio::test]
    async fn can_create_transaction() {
        let (state, user_id) = get_state_and_user();

        let response = create_transaction_endpoint(
            State(state.clone()),
            Extension(user_id),
            form("  taxi ", "-23.5"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(get_header(&response, "hx-trigger"), "transactions-changed");
        let connection = state.db_connection.lock().unwrap();
        let transactions = list_transactions(user_id, &connection).unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].label, "taxi");
        assert_eq!(transactions[0].amount, -23.5);
        assert_eq!(transactions[0].user_id, user_id);
    }

    #[tokio::test]
    async fn success_shows_alert() {
        let (state, user_id) = get_state_and_user();

        let response =
            create_transaction_endpoint(State(state), Extension(user_id), form("salary", "20000"))
                .await;

        let html = parse_html_fragment(response).await;
        let alert = html
            .select(&Selector::parse("[role=alert]").unwrap())
            .next()
            .expect("want an alert");
        assert_eq!(alert.value().attr("data-alert-kind"), Some("success"));
        let text = alert.text().collect::<String>();
        assert!(text.contains("salary"), "got alert text {text:?}");
    }

    #[tokio::test]
    async fn rejects_empty_label() {
        let (state, user_id) = get_state_and_user();

        let response =
            create_transaction_endpoint(State(state.clone()), Extension(user_id), form("  ", "5"))
                .await;

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(response.headers().get("hx-trigger").is_none());
        assert_eq!(count_rows(&state, user_id), 0);
    }

    #[tokio::test]
    async fn rejects_unparseable_amount() {
        let (state, user_id) = get_state_and_user();

        for amount in ["", "abc", "12,5"] {
            let response = create_transaction_endpoint(
                State(state.clone()),
                Extension(user_id),
                form("coffee", amount),
            )
            .await;

            assert_eq!(
                response.status(),
                StatusCode::UNPROCESSABLE_ENTITY,
                "amount {amount:?}"
            );
        }

        assert_eq!(count_rows(&state, user_id), 0);
    }

    #[tokio::test]
    async fn rejects_non_finite_amount() {
        let (state, user_id) = get_state_and_user();

        for amount in ["NaN", "inf", "-infinity"] {
            let response = create_transaction_endpoint(
                State(state.clone()),
                Extension(user_id),
                form("coffee", amount),
            )
            .await;

            assert_eq!(
                response.status(),
                StatusCode::UNPROCESSABLE_ENTITY,
                "amount {amount:?}"
            );
        }

        assert_eq!(count_rows(&state, user_id), 0);
    }

    #[test]
    fn form_decodes_label_and_amount() {
        let form: TransactionForm =
            serde_html_form::from_str("label=%E5%92%96%E5%95%A1&amount=-35.5").unwrap();

        assert_eq!(form.label, "咖啡");
        assert_eq!(form.amount, "-35.5");
    }

    #[test]
    fn empty_form_decodes_to_blank_fields() {
        let form: TransactionForm = serde_html_form::from_str("").unwrap();

        assert_eq!(form.label, "");
        assert_eq!(form.amount, "");
    }
}
