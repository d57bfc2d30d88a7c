//! Transactions, the record of money that was spent or earned.
//!
//! This module contains:
//! - The `Transaction` model and `TransactionBuilder` for creating transactions
//! - Database functions for storing and querying transactions
//! - The page that lists a user's transactions

mod core;
mod transactions_page;

pub use core::{
    Transaction, TransactionBuilder, TransactionKind, UnknownKindError, create_transaction,
    create_transaction_table, get_transaction, get_transactions_for_owner, map_transaction_row,
};
pub use transactions_page::{TransactionsState, get_transactions_page};

#[cfg(test)]
pub use core::count_transactions;
