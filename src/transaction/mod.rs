//! Transaction management for the finance tracker.
//!
//! This module contains everything related to the ledger of transactions:
//! - The `Transaction` model and its builder for creating transactions
//! - Filters and database functions for storing, querying and soft deleting transactions
//! - Route handlers for the transaction endpoints

mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod filter;
mod query_endpoint;

pub use core::{
    Transaction, TransactionId, TransactionType, TransactionUpdate,
    create_transaction, create_transaction_table, get_transaction, get_transactions,
    soft_delete_transaction, update_transaction,
};
pub use create_endpoint::create_transaction_endpoint;
pub use delete_endpoint::delete_transaction_endpoint;
pub use edit_endpoint::edit_transaction_endpoint;
pub use filter::{FilterParams, TransactionFilter};
pub use query_endpoint::{TransactionState, get_transaction_endpoint, get_transactions_endpoint};

#[cfg(test)]
pub use core::count_transactions;
