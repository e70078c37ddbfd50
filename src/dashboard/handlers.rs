//! Dashboard HTTP handlers and view rendering.
//!
//! This module contains:
//! - The handler for the full dashboard page
//! - The handler for the dashboard content, which htmx reloads whenever a
//!   response carries the `transactions-changed` trigger
//! - The HTML view functions for both

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use time::UtcOffset;

use crate::{
    AppState, Email, Error, UserID,
    dashboard::{
        cards::summary_cards_view,
        charts::{DashboardChart, ECHARTS_SRC, chart_view, trend_chart},
        forms::{ai_input_form, manual_transaction_form},
    },
    endpoints,
    html::{HeadElement, LINK_STYLE, base},
    timezone::local_offset_or_error,
    transaction::{
        TRANSACTIONS_CHANGED_EVENT, Transaction, list_transactions, summarize,
        transaction_list_view,
    },
};

/// The state needed for displaying the dashboard.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Asia/Shanghai".
    pub local_timezone: String,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Display the page with the logged in user's totals, trend chart,
/// transaction list and the forms for adding transactions.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    Extension(user_id): Extension<UserID>,
    Extension(email): Extension<Email>,
) -> Result<Response, Error> {
    let local_offset = local_offset_or_error(&state.local_timezone)?;
    let transactions = get_transactions(user_id, &state.db_connection)?;

    Ok(dashboard_view(&email, &transactions, local_offset).into_response())
}

/// Render only the dashboard content (cards, chart and list) for htmx.
pub async fn get_dashboard_content(
    State(state): State<DashboardState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let local_offset = match local_offset_or_error(&state.local_timezone) {
        Ok(local_offset) => local_offset,
        Err(error) => return error.into_alert_response(),
    };

    match get_transactions(user_id, &state.db_connection) {
        Ok(transactions) => dashboard_content(&transactions, local_offset).into_response(),
        Err(error) => error.into_alert_response(),
    }
}

fn get_transactions(
    user_id: UserID,
    db_connection: &Mutex<Connection>,
) -> Result<Vec<Transaction>, Error> {
    let connection = db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    list_transactions(user_id, &connection)
        .inspect_err(|error| tracing::error!("could not get transactions: {error}"))
}

fn dashboard_content(transactions: &[Transaction], local_offset: UtcOffset) -> Markup {
    let summary = summarize(transactions);
    let chart = (!summary.recent_trend.is_empty()).then(|| DashboardChart {
        id: "trend-chart",
        options: trend_chart(&summary.recent_trend).to_string(),
    });

    html!(
        (summary_cards_view(&summary))

        @if let Some(chart) = &chart {
            (chart_view(chart))
        }

        (transaction_list_view(transactions, local_offset))
    )
}

fn dashboard_view(email: &Email, transactions: &[Transaction], local_offset: UtcOffset) -> Markup {
    let content = html!(
        header
            class="flex justify-between items-center px-6 py-4 mx-auto max-w-screen-lg
                text-gray-900 dark:text-white"
        {
            h1 class="text-2xl font-bold" { "CashFlow AI" }

            div class="flex items-center gap-3 text-sm"
            {
                span class="font-medium max-w-[200px] truncate" data-user-email { (email) }
                a href=(endpoints::LOG_OUT) class=(LINK_STYLE) { "Log out" }
            }
        }

        main
            class="flex flex-col items-center px-6 pb-8 mx-auto max-w-screen-lg
                text-gray-900 dark:text-white"
        {
            (ai_input_form())
            (manual_transaction_form())

            div
                id="dashboard-content"
                class="w-full"
                hx-get=(endpoints::DASHBOARD_API)
                hx-trigger={ (TRANSACTIONS_CHANGED_EVENT) " from:body" }
                hx-target-error="#alert-container"
            {
                (dashboard_content(transactions, local_offset))
            }
        }
    );

    let scripts = [HeadElement::ScriptLink(ECHARTS_SRC.to_owned())];

    base("Dashboard", &scripts, &content)
}
