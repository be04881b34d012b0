//! Transaction management for the finance tracker.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and `TransactionBuilder` for creating transactions
//! - Database functions for storing, querying, and deleting transactions
//! - View handlers for transaction-related web pages

mod core;
mod create_endpoint;
mod delete_endpoint;
mod detail_page;
mod new_transaction_page;
mod transactions_page;

pub use core::{
    Transaction, TransactionBuilder, TransactionType, create_transaction,
    create_transaction_table, get_categories_for_user, get_transactions_for_user,
};
pub use create_endpoint::create_transaction_endpoint;
pub use delete_endpoint::delete_transaction_endpoint;
pub use detail_page::get_transaction_detail_page;
pub use new_transaction_page::get_new_transaction_page;
pub use transactions_page::get_transactions_page;

#[cfg(test)]
pub use core::{count_transactions, get_transaction};
