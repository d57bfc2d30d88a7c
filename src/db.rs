//! Creates the application's database schema.

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::{
    category::create_category_table, recurring::create_recurring_rule_table,
    transaction::create_transaction_table,
};

/// Enable foreign keys and create any missing tables and indexes.
///
/// Safe to call on a database that has already been initialized.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), rusqlite::Error> {
    // Has no effect inside a transaction.
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_category_table(&transaction)?;
    create_recurring_rule_table(&transaction)?;
    create_transaction_table(&transaction)?;

    transaction.commit()
}
