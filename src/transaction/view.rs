//! HTML rendering for the list of transactions on the dashboard.

use maud::{Markup, html};
use time::UtcOffset;
use unicode_segmentation::UnicodeSegmentation;

use crate::{
    endpoints::{self, format_endpoint},
    html::{BUTTON_DELETE_STYLE, LIST_ROW_STYLE, format_currency},
    transaction::Transaction,
};

/// The max number of graphemes to display in a row before truncating and
/// displaying ellipses.
const MAX_LABEL_GRAPHEMES: usize = 32;

fn amount_class(amount: f64) -> &'static str {
    if amount < 0.0 {
        "text-red-600 dark:text-red-400 font-bold"
    } else {
        "text-green-600 dark:text-green-400 font-bold"
    }
}

/// Render `transactions` as a list with a delete button on each row.
///
/// Dates are shown in the timezone `local_offset`.
pub(crate) fn transaction_list_view(
    transactions: &[Transaction],
    local_offset: UtcOffset,
) -> Markup {
    html! {
        section id="transactions" class="w-full space-y-4"
        {
            h2 class="text-xl font-bold" { "Transactions" }

            @if transactions.is_empty() {
                p class="text-gray-500 dark:text-gray-400" data-empty-state
                {
                    "No transactions yet. Add one above or ask the assistant."
                }
            } @else {
                ul class="space-y-4"
                {
                    @for transaction in transactions {
                        (transaction_row_view(transaction, local_offset))
                    }
                }
            }
        }
    }
}

fn transaction_row_view(transaction: &Transaction, local_offset: UtcOffset) -> Markup {
    let (label, tooltip) = format_label(&transaction.label);
    let local_date = transaction.date.to_offset(local_offset).date();
    let delete_url = format_endpoint(endpoints::TRANSACTION, transaction.id);
    let confirm_message = format!(
        "Are you sure you want to delete the transaction '{}'? This cannot be undone.",
        transaction.label
    );

    html! {
        li class=(LIST_ROW_STYLE) data-transaction-row
        {
            div
            {
                div class="font-medium" title=[tooltip] { (label) }
                time class="text-sm text-gray-500 dark:text-gray-400" datetime=(local_date)
                {
                    (local_date)
                }
            }

            div class="flex items-center gap-4"
            {
                span class=(amount_class(transaction.amount)) data-amount
                {
                    (format_currency(transaction.amount))
                }

                button
                    type="button"
                    class=(BUTTON_DELETE_STYLE)
                    hx-delete=(delete_url)
                    hx-confirm=(confirm_message)
                    hx-target="#alert-container"
                    hx-target-error="#alert-container"
                {
                    "Delete"
                }
            }
        }
    }
}

fn format_label(label: &str) -> (String, Option<&str>) {
    let label_length = label.graphemes(true).count();

    if label_length <= MAX_LABEL_GRAPHEMES {
        (label.to_owned(), None)
    } else {
        let truncated: String = label
            .graphemes(true)
            .take(MAX_LABEL_GRAPHEMES - 3)
            .collect();
        (truncated + "...", Some(label))
    }
}
