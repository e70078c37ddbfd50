//! Dashboard module
//!
//! The page a logged in user lands on: the balance, income and expense totals,
//! a chart of the most recent transactions, the transaction list, and the
//! forms for adding transactions by hand or by describing them to the assistant.

mod cards;
mod charts;
mod forms;
mod handlers;

pub use handlers::{get_dashboard_content, get_dashboard_page};
