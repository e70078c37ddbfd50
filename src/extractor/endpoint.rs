//! The route handler that records a transaction from a plain language description.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HX_TRIGGER;
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error, UserID,
    alert::Alert,
    extractor::{
        CompletionClient, ExtractionError, SYSTEM_INSTRUCTION, parse_extraction,
        prompt::UNKNOWN_LABEL, strip_code_fences, user_prompt,
    },
    transaction::{NewTransaction, TRANSACTIONS_CHANGED_EVENT, Transaction, create_transaction},
};

/// Shown for every failure, the cause is only logged.
const FAILURE_MESSAGE: &str = "The assistant got confused, please try again.";

/// The state needed to create a transaction from text.
#[derive(Debug, Clone)]
pub struct ExtractorState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The language model used to read the text.
    pub completion_client: Arc<dyn CompletionClient>,
}

impl FromRef<AppState> for ExtractorState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            completion_client: state.completion_client.clone(),
        }
    }
}

/// The form data for the AI input.
#[derive(Debug, Default, Deserialize)]
pub struct AiTransactionForm {
    /// What the user typed, e.g. "发工资了20000元".
    #[serde(default)]
    pub text: String,
}

/// What happened to a description the user typed.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionOutcome {
    /// A transaction was saved.
    Recorded {
        /// Confirms the label and amount that were saved.
        message: String,
    },
    /// Nothing was saved.
    Failed {
        /// A generic request to try again.
        message: String,
    },
}

/// Ask the model to turn `text` into a transaction and save it for `owner`.
///
/// The database lock is only taken after the model has answered.
///
/// # Errors
///
/// Returns an [Error::Extraction] if the model could not be reached or its
/// reply could not be used, or another [Error] if saving failed.
pub async fn create_transaction_from_text(
    owner: UserID,
    text: &str,
    completion_client: Arc<dyn CompletionClient>,
    db_connection: &Mutex<Connection>,
) -> Result<Transaction, Error> {
    let text = text.trim();

    if text.is_empty() {
        return Err(ExtractionError::InvalidValues("the description is empty".to_owned()).into());
    }

    let prompt = user_prompt(text);
    let reply = tokio::task::spawn_blocking(move || {
        completion_client.complete(SYSTEM_INSTRUCTION, &prompt)
    })
    .await
    .map_err(|error| ExtractionError::Request(format!("the completion task failed: {error}")))??;

    tracing::debug!("model replied {reply:?}");

    let extracted = parse_extraction(&strip_code_fences(&reply))?;

    if extracted.label == UNKNOWN_LABEL {
        tracing::warn!("the model could not understand {text:?}");
    }

    let new_transaction = NewTransaction::new(&extracted.label, extracted.amount)
        .map_err(|error| ExtractionError::InvalidValues(error.to_string()))?;

    let connection = db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    create_transaction(owner, new_transaction, &connection)
}

/// Run [create_transaction_from_text] and describe the result for the user.
///
/// Errors are logged here and never included in the outcome.
pub async fn record_from_text(
    owner: UserID,
    text: &str,
    completion_client: Arc<dyn CompletionClient>,
    db_connection: &Mutex<Connection>,
) -> ExtractionOutcome {
    match create_transaction_from_text(owner, text, completion_client, db_connection).await {
        Ok(transaction) => ExtractionOutcome::Recorded {
            message: format!("Recorded: {} ({})", transaction.label, transaction.amount),
        },
        Err(error) => {
            tracing::error!("could not create a transaction from {text:?}: {error}");
            ExtractionOutcome::Failed {
                message: FAILURE_MESSAGE.to_owned(),
            }
        }
    }
}

/// A route handler for the AI input.
///
/// Always responds 200 with an alert so the message is shown in place. On
/// success the `transactions-changed` trigger is also sent.
pub async fn create_ai_transaction_endpoint(
    State(state): State<ExtractorState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<AiTransactionForm>,
) -> Response {
    match record_from_text(
        user_id,
        &form.text,
        state.completion_client,
        &state.db_connection,
    )
    .await
    {
        ExtractionOutcome::Recorded { message } => (
            [(HX_TRIGGER, TRANSACTIONS_CHANGED_EVENT)],
            Alert::SuccessSimple { message },
        )
            .into_response(),
        ExtractionOutcome::Failed { message } => Alert::ErrorSimple { message }.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, http::StatusCode};
    use axum_extra::extract::Form;
    use rusqlite::Connection;
    use scraper::Selector;

    use crate::{
        UserID,
        extractor::{
            CompletionClient, ExtractionError, ExtractionOutcome, SYSTEM_INSTRUCTION,
            endpoint::{
                AiTransactionForm, ExtractorState, FAILURE_MESSAGE, create_ai_transaction_endpoint,
                record_from_text,
            },
        },
        test_utils::{create_test_user, get_header, get_test_connection, parse_html_fragment},
        transaction::{Transaction, list_transactions},
    };

    /// Answers every prompt with the same reply and remembers the prompts.
    #[derive(Debug)]
    struct ScriptedClient {
        reply: Result<String, ExtractionError>,
        prompts: Mutex<Vec<(String, String)>>,
    }

    impl ScriptedClient {
        fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply.to_owned()),
                prompts: Mutex::default(),
            })
        }

        fn failing(error: ExtractionError) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(error),
                prompts: Mutex::default(),
            })
        }

        fn prompts(&self) -> Vec<(String, String)> {
            self.prompts.lock().unwrap().clone()
        }
    }

    impl CompletionClient for ScriptedClient {
        fn complete(
            &self,
            system_instruction: &str,
            prompt: &str,
        ) -> Result<String, ExtractionError> {
            self.prompts
                .lock()
                .unwrap()
                .push((system_instruction.to_owned(), prompt.to_owned()));
            self.reply.clone()
        }
    }

    fn get_db_and_user() -> (Mutex<Connection>, UserID) {
        let conn = get_test_connection();
        let user = create_test_user(&conn, "alice@example.com");

        (Mutex::new(conn), user.id)
    }

    fn transactions(db: &Mutex<Connection>, user_id: UserID) -> Vec<Transaction> {
        list_transactions(user_id, &db.lock().unwrap()).unwrap()
    }

    fn failed() -> ExtractionOutcome {
        ExtractionOutcome::Failed {
            message: FAILURE_MESSAGE.to_owned(),
        }
    }

    #[tokio::test]
    async fn records_coffee_expense() {
        let (db, user_id) = get_db_and_user();
        let client = ScriptedClient::replying(r#"{"label": "咖啡", "amount": -35}"#);

        let outcome = record_from_text(user_id, "今天买咖啡花了35元", client.clone(), &db).await;

        assert_eq!(
            outcome,
            ExtractionOutcome::Recorded {
                message: "Recorded: 咖啡 (-35)".to_owned()
            }
        );
        let saved = transactions(&db, user_id);
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].label, "咖啡");
        assert_eq!(saved[0].amount, -35.0);
        assert_eq!(
            client.prompts(),
            vec![(
                SYSTEM_INSTRUCTION.to_owned(),
                "User input: 今天买咖啡花了35元".to_owned()
            )]
        );
    }

    #[tokio::test]
    async fn records_salary_income() {
        let (db, user_id) = get_db_and_user();
        let client = ScriptedClient::replying(r#"{"label": "工资", "amount": 20000}"#);

        let outcome = record_from_text(user_id, "发工资了20000元", client, &db).await;

        assert_eq!(
            outcome,
            ExtractionOutcome::Recorded {
                message: "Recorded: 工资 (20000)".to_owned()
            }
        );
        assert_eq!(transactions(&db, user_id)[0].amount, 20000.0);
    }

    #[tokio::test]
    async fn fenced_reply_still_parses() {
        let (db, user_id) = get_db_and_user();
        let client =
            ScriptedClient::replying("```json\n{\"label\": \"咖啡\", \"amount\": -35}\n```");

        let outcome = record_from_text(user_id, "今天买咖啡花了35元", client, &db).await;

        assert!(matches!(outcome, ExtractionOutcome::Recorded { .. }));
        assert_eq!(transactions(&db, user_id)[0].amount, -35.0);
    }

    #[tokio::test]
    async fn invalid_json_fails_without_writing() {
        let (db, user_id) = get_db_and_user();
        let client = ScriptedClient::replying("Sorry, I am not sure what you mean.");

        let outcome = record_from_text(user_id, "asdf", client, &db).await;

        assert_eq!(outcome, failed());
        assert!(transactions(&db, user_id).is_empty());
    }

    #[tokio::test]
    async fn blank_label_from_model_fails_without_writing() {
        let (db, user_id) = get_db_and_user();
        let client = ScriptedClient::replying(r#"{"label": "  ", "amount": 5}"#);

        let outcome = record_from_text(user_id, "something", client, &db).await;

        assert_eq!(outcome, failed());
        assert!(transactions(&db, user_id).is_empty());
    }

    #[tokio::test]
    async fn unknown_sentinel_is_recorded() {
        let (db, user_id) = get_db_and_user();
        let client = ScriptedClient::replying(r#"{"label": "未知", "amount": 0}"#);

        let outcome = record_from_text(user_id, "???", client, &db).await;

        assert_eq!(
            outcome,
            ExtractionOutcome::Recorded {
                message: "Recorded: 未知 (0)".to_owned()
            }
        );
        assert_eq!(transactions(&db, user_id).len(), 1);
    }

    #[tokio::test]
    async fn provider_errors_fail_without_writing() {
        for error in [
            ExtractionError::NotConfigured,
            ExtractionError::Timeout,
            ExtractionError::Request("connection refused".to_owned()),
            ExtractionError::MalformedResponse("no choices".to_owned()),
        ] {
            let (db, user_id) = get_db_and_user();

            let outcome =
                record_from_text(user_id, "今天买咖啡花了35元", ScriptedClient::failing(error), &db)
                    .await;

            assert_eq!(outcome, failed());
            assert!(transactions(&db, user_id).is_empty());
        }
    }

    #[tokio::test]
    async fn empty_text_is_not_sent_to_model() {
        let (db, user_id) = get_db_and_user();
        let client = ScriptedClient::replying(r#"{"label": "咖啡", "amount": -35}"#);

        let outcome = record_from_text(user_id, "   ", client.clone(), &db).await;

        assert_eq!(outcome, failed());
        assert!(client.prompts().is_empty());
        assert!(transactions(&db, user_id).is_empty());
    }

    #[tokio::test]
    async fn endpoint_sends_trigger_and_success_alert() {
        let (db, user_id) = get_db_and_user();
        let state = ExtractorState {
            db_connection: Arc::new(db),
            completion_client: ScriptedClient::replying(r#"{"label": "咖啡", "amount": -35}"#),
        };

        let response = create_ai_transaction_endpoint(
            State(state),
            Extension(user_id),
            Form(AiTransactionForm {
                text: "今天买咖啡花了35元".to_owned(),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(get_header(&response, "hx-trigger"), "transactions-changed");
        let html = parse_html_fragment(response).await;
        let message = html
            .select(&Selector::parse(".alert-message").unwrap())
            .next()
            .expect("want alert message");
        assert_eq!(message.text().collect::<String>(), "Recorded: 咖啡 (-35)");
    }

    #[tokio::test]
    async fn endpoint_failure_shows_generic_error() {
        let (db, user_id) = get_db_and_user();
        let state = ExtractorState {
            db_connection: Arc::new(db),
            completion_client: ScriptedClient::replying("not json"),
        };

        let response = create_ai_transaction_endpoint(
            State(state.clone()),
            Extension(user_id),
            Form(AiTransactionForm {
                text: "今天买咖啡花了35元".to_owned(),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get("hx-trigger").is_none());
        let html = parse_html_fragment(response).await;
        let alert = html
            .select(&Selector::parse("[role=alert]").unwrap())
            .next()
            .expect("want alert");
        assert_eq!(alert.value().attr("data-alert-kind"), Some("error"));
        assert!(
            alert
                .text()
                .collect::<String>()
                .contains("The assistant got confused, please try again.")
        );
        assert!(transactions(&state.db_connection, user_id).is_empty());
    }
}
