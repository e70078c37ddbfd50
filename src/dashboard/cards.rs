//! Summary cards for the balance, income and expense totals.

use maud::{Markup, html};

use crate::{
    html::{CARD_STYLE, format_currency},
    transaction::Summary,
};

/// Renders the balance, income and expense cards.
pub(super) fn summary_cards_view(summary: &Summary) -> Markup {
    html! {
        section
            id="summary-cards"
            class="w-full grid grid-cols-1 sm:grid-cols-3 gap-4 mb-8"
        {
            (summary_card("Balance", summary.balance, "balance", balance_class(summary.balance)))
            (summary_card("Income", summary.income, "income", "text-green-600 dark:text-green-400"))
            (summary_card("Expense", summary.expense, "expense", "text-red-600 dark:text-red-400"))
        }
    }
}

fn balance_class(balance: f64) -> &'static str {
    if balance < 0.0 {
        "text-red-600 dark:text-red-400"
    } else {
        "text-gray-900 dark:text-white"
    }
}

fn summary_card(title: &str, amount: f64, card_id: &str, amount_class: &str) -> Markup {
    html! {
        div class=(CARD_STYLE) data-card=(card_id)
        {
            h3 class="text-sm font-medium text-gray-500 dark:text-gray-400" { (title) }
            p class={ "mt-2 text-2xl font-bold tabular-nums " (amount_class) }
            {
                (format_currency(amount))
            }
        }
    }
}
