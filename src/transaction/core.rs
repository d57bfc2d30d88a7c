//! Defines the core data models and database queries for transactions.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error, UserID,
    category::CategoryId,
    database_id::{DatabaseId, TransactionId},
    recurring::RuleId,
};

// ============================================================================
// MODELS
// ============================================================================

/// Whether money was earned or spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money earned, e.g. a salary.
    Income,
    /// Money spent, e.g. rent.
    Expense,
}

impl TransactionKind {
    /// The lowercase name used in forms and in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }

    /// The capitalised name shown in the UI.
    pub fn label(&self) -> &'static str {
        match self {
            TransactionKind::Income => "Income",
            TransactionKind::Expense => "Expense",
        }
    }
}

/// The string did not name a [TransactionKind].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown transaction kind \"{0}\", expected \"income\" or \"expense\"")]
pub struct UnknownKindError(pub String);

impl FromStr for TransactionKind {
    type Err = UnknownKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            other => Err(UnknownKindError(other.to_owned())),
        }
    }
}

impl Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for TransactionKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: DatabaseId,
    /// The user the transaction belongs to.
    pub owner_id: UserID,
    /// The amount of money spent or earned in this transaction. Always positive.
    pub amount: f64,
    /// Whether the money was spent or earned.
    pub kind: TransactionKind,
    /// When the transaction happened.
    pub date: Date,
    /// A text description of what the transaction was for.
    pub description: String,
    /// The ID of the category the transaction belongs to.
    pub category_id: Option<CategoryId>,
    /// How the transaction was paid, e.g. "Credit card".
    pub payment_method: Option<String>,
    /// The recurring rule that created this transaction, if any.
    pub recurring_rule_id: Option<RuleId>,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(
        owner_id: UserID,
        amount: f64,
        kind: TransactionKind,
        date: Date,
        description: &str,
    ) -> TransactionBuilder {
        TransactionBuilder {
            owner_id,
            amount,
            kind,
            date,
            description: description.to_owned(),
            category_id: None,
            payment_method: None,
            recurring_rule_id: None,
        }
    }

    /// The amount with expenses made negative.
    pub fn signed_amount(&self) -> f64 {
        match self.kind {
            TransactionKind::Income => self.amount,
            TransactionKind::Expense => -self.amount,
        }
    }
}

/// A builder for creating [Transaction] instances.
///
/// Optional fields default to `None`. Pass the finished builder to
/// [create_transaction] to store it.
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// The user the transaction belongs to.
    pub owner_id: UserID,

    /// The positive amount of money that moved.
    pub amount: f64,

    /// Whether the money was spent or earned.
    pub kind: TransactionKind,

    /// The date when the transaction occurred.
    ///
    /// For transactions created by recurring rules this is the date the
    /// occurrence was due, not the date it was recorded.
    pub date: Date,

    /// A human-readable description of the transaction.
    pub description: String,

    /// The category of the transaction, e.g. "Groceries", "Transport", "Rent".
    pub category_id: Option<CategoryId>,

    /// How the transaction was paid.
    pub payment_method: Option<String>,

    /// The recurring rule that produced the transaction.
    pub recurring_rule_id: Option<RuleId>,
}

impl TransactionBuilder {
    /// Set the category ID for the transaction.
    pub fn category_id(mut self, category_id: Option<CategoryId>) -> Self {
        self.category_id = category_id;
        self
    }

    /// Set the payment method for the transaction.
    pub fn payment_method(mut self, payment_method: Option<String>) -> Self {
        self.payment_method = payment_method;
        self
    }

    /// Link the transaction to the recurring rule that produced it.
    pub fn recurring_rule_id(mut self, recurring_rule_id: Option<RuleId>) -> Self {
        self.recurring_rule_id = recurring_rule_id;
        self
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create a new transaction in the database from a builder.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidCategory] if a foreign key does not refer to a real row,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "INSERT INTO \"transaction\"
                (owner_id, amount, kind, date, description, category_id, payment_method, recurring_rule_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             RETURNING id, owner_id, amount, kind, date, description, category_id, payment_method, recurring_rule_id",
        )?
        .query_row(
            (
                builder.owner_id,
                builder.amount,
                builder.kind,
                builder.date,
                &builder.description,
                builder.category_id,
                &builder.payment_method,
                builder.recurring_rule_id,
            ),
            map_transaction_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::InvalidCategory(builder.category_id),
            error => error.into(),
        })?;

    Ok(transaction)
}

/// Retrieve a transaction of `owner_id` from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction owned by `owner_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(
    id: TransactionId,
    owner_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "SELECT id, owner_id, amount, kind, date, description, category_id, payment_method, recurring_rule_id
             FROM \"transaction\" WHERE id = ?1 AND owner_id = ?2",
        )?
        .query_one((id, owner_id), map_transaction_row)?;

    Ok(transaction)
}

/// Get the transactions of `owner_id`, newest first.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn get_transactions_for_owner(
    owner_id: UserID,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(
            "SELECT id, owner_id, amount, kind, date, description, category_id, payment_method, recurring_rule_id
             FROM \"transaction\" WHERE owner_id = ?1
             ORDER BY date DESC, id DESC",
        )?
        .query_map((owner_id,), map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// Get the number of transactions that belong to `owner_id`.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn count_transactions(owner_id: UserID, connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row(
            "SELECT COUNT(id) FROM \"transaction\" WHERE owner_id = ?1;",
            (owner_id,),
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            owner_id INTEGER NOT NULL,
            amount REAL NOT NULL,
            kind TEXT NOT NULL,
            date TEXT NOT NULL,
            description TEXT NOT NULL,
            category_id INTEGER,
            payment_method TEXT,
            recurring_rule_id INTEGER,
            FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE SET NULL,
            FOREIGN KEY(recurring_rule_id) REFERENCES recurring_rule(id) ON DELETE SET NULL
        );

        CREATE INDEX IF NOT EXISTS idx_transaction_owner_date ON \"transaction\"(owner_id, date);
        CREATE INDEX IF NOT EXISTS idx_transaction_recurring_rule ON \"transaction\"(recurring_rule_id);",
    )
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        amount: row.get(2)?,
        kind: row.get(3)?,
        date: row.get(4)?,
        description: row.get(5)?,
        category_id: row.get(6)?,
        payment_method: row.get(7)?,
        recurring_rule_id: row.get(8)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================
