//! Transaction management.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and `NewTransaction` for validated input
//! - Owner-scoped database functions for storing, listing and deleting transactions
//! - The summary (totals and recent trend) shown on the dashboard
//! - Route handlers and views for transactions

mod core;
mod create_endpoint;
mod delete_endpoint;
mod summary;
mod view;

pub use core::{
    NewTransaction, Transaction, TransactionId, create_transaction, create_transaction_table,
    delete_transaction, list_transactions,
};
pub use create_endpoint::create_transaction_endpoint;
pub use delete_endpoint::delete_transaction_endpoint;
pub use summary::{Summary, TrendPoint, compute_summary, summarize};
pub(crate) use view::transaction_list_view;

/// The htmx event sent with every response that changes a user's transactions.
///
/// The dashboard content listens for it and reloads itself.
pub const TRANSACTIONS_CHANGED_EVENT: &str = "transactions-changed";
