//! Database operations for recurring rules, and the SQLite implementations of
//! the rule store and transaction sink.

use rusqlite::{Connection, Row};
use time::Date;

use crate::{
    Error, UserID,
    category::CategoryId,
    database_id::TransactionId,
    recurring::{
        AdvanceOutcome, Frequency, InvalidRuleError, MaterializedTransaction, RecurrenceRule,
        RecurringRuleStore, RuleAdvance, RuleId, RulePayload, Schedule, TransactionSink,
        ValidatedRule,
    },
    transaction::{TransactionKind, create_transaction},
};

const RULE_COLUMNS: &str = "id, owner_id, description, amount, kind, category_id, payment_method, \
    frequency, interval_count, day_of_week, day_of_month, start_date, end_date, next_due_date, \
    last_created_date, is_active, auto_create";

/// Create an active rule for `owner_id`, due on its first occurrence.
///
/// # Errors
///
/// Returns [Error::InvalidCategory] if the category does not exist.
pub fn create_rule(
    owner_id: UserID,
    rule: &ValidatedRule,
    connection: &Connection,
) -> Result<RecurrenceRule, Error> {
    let schedule = &rule.schedule;
    let payload = &rule.payload;

    connection
        .execute(
            "INSERT INTO recurring_rule (
                owner_id, description, amount, kind, category_id, payment_method, frequency,
                interval_count, day_of_week, day_of_month, start_date, end_date, next_due_date,
                last_created_date, is_active, auto_create
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, NULL, 1, ?14)",
            rusqlite::params![
                owner_id,
                payload.description,
                payload.amount,
                payload.kind,
                payload.category_id,
                payload.payment_method,
                schedule.frequency().as_str(),
                schedule.interval().get(),
                schedule
                    .weekday()
                    .map(|weekday| weekday.number_days_from_sunday()),
                schedule.day_of_month().map(|day| day.get()),
                rule.start_date,
                rule.end_date,
                rule.first_occurrence,
                rule.auto_create,
            ],
        )
        .map_err(|error| map_category_error(error, payload.category_id))?;

    Ok(RecurrenceRule {
        id: connection.last_insert_rowid(),
        owner_id,
        payload: payload.clone(),
        schedule: rule.schedule,
        start_date: rule.start_date,
        end_date: rule.end_date,
        next_due_date: rule.first_occurrence,
        last_created_date: None,
        is_active: true,
        auto_create: rule.auto_create,
    })
}

/// Retrieve a rule of `owner_id` by ID.
///
/// # Errors
///
/// Returns [Error::NotFound] if the rule does not exist or belongs to someone
/// else, or [Error::InvalidRule] if the stored rule is corrupt.
pub fn get_rule(
    rule_id: RuleId,
    owner_id: UserID,
    connection: &Connection,
) -> Result<RecurrenceRule, Error> {
    let row = connection
        .prepare(&format!(
            "SELECT {RULE_COLUMNS} FROM recurring_rule WHERE id = ?1 AND owner_id = ?2"
        ))?
        .query_row((rule_id, owner_id), map_row)?;

    decode(row)
}

/// Retrieve the rules of `owner_id`, active rules first, then by next due date.
pub fn get_rules_for_owner(
    owner_id: UserID,
    connection: &Connection,
) -> Result<Vec<RecurrenceRule>, Error> {
    connection
        .prepare(&format!(
            "SELECT {RULE_COLUMNS} FROM recurring_rule WHERE owner_id = ?1
             ORDER BY is_active DESC, next_due_date ASC, id ASC"
        ))?
        .query_map((owner_id,), map_row)?
        .map(|row| decode(row?))
        .collect()
}

/// Retrieve the active rules of `owner_id` that are due on or before `as_of`.
pub fn load_active_rules_due_by(
    owner_id: UserID,
    as_of: Date,
    connection: &Connection,
) -> Result<Vec<RecurrenceRule>, Error> {
    connection
        .prepare(&format!(
            "SELECT {RULE_COLUMNS} FROM recurring_rule
             WHERE owner_id = ?1 AND is_active = 1 AND next_due_date <= ?2
             ORDER BY next_due_date ASC, id ASC"
        ))?
        .query_map((owner_id, as_of), map_row)?
        .map(|row| decode(row?))
        .collect()
}

/// The owners with at least one active auto-create rule due on or before `as_of`.
pub fn get_owners_with_due_rules(
    as_of: Date,
    connection: &Connection,
) -> Result<Vec<UserID>, Error> {
    connection
        .prepare(
            "SELECT DISTINCT owner_id FROM recurring_rule
             WHERE is_active = 1 AND auto_create = 1 AND next_due_date <= ?1
             ORDER BY owner_id",
        )?
        .query_map((as_of,), |row| row.get(0))?
        .map(|owner_id| owner_id.map_err(Error::from))
        .collect()
}

/// Replace the payload and schedule of a rule.
///
/// `next_due_date` and `is_active` must have been recomputed for the new schedule.
///
/// # Errors
///
/// Returns [Error::UpdateMissingRule] if the rule does not exist or belongs to someone else.
pub fn update_rule(
    rule_id: RuleId,
    owner_id: UserID,
    rule: &ValidatedRule,
    next_due_date: Date,
    is_active: bool,
    connection: &Connection,
) -> Result<(), Error> {
    let schedule = &rule.schedule;
    let payload = &rule.payload;

    let rows_affected = connection
        .execute(
            "UPDATE recurring_rule SET
                description = ?1, amount = ?2, kind = ?3, category_id = ?4, payment_method = ?5,
                frequency = ?6, interval_count = ?7, day_of_week = ?8, day_of_month = ?9,
                start_date = ?10, end_date = ?11, next_due_date = ?12, is_active = ?13,
                auto_create = ?14
             WHERE id = ?15 AND owner_id = ?16",
            rusqlite::params![
                payload.description,
                payload.amount,
                payload.kind,
                payload.category_id,
                payload.payment_method,
                schedule.frequency().as_str(),
                schedule.interval().get(),
                schedule
                    .weekday()
                    .map(|weekday| weekday.number_days_from_sunday()),
                schedule.day_of_month().map(|day| day.get()),
                rule.start_date,
                rule.end_date,
                next_due_date,
                is_active,
                rule.auto_create,
                rule_id,
                owner_id,
            ],
        )
        .map_err(|error| map_category_error(error, payload.category_id))?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingRule);
    }

    Ok(())
}

/// Pause or resume a rule.
///
/// # Errors
///
/// Returns [Error::UpdateMissingRule] if the rule does not exist or belongs to someone else.
pub fn set_rule_active(
    rule_id: RuleId,
    owner_id: UserID,
    is_active: bool,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE recurring_rule SET is_active = ?1 WHERE id = ?2 AND owner_id = ?3",
        (is_active, rule_id, owner_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingRule);
    }

    Ok(())
}

/// Delete a rule. Transactions it created are kept and lose their link to it.
///
/// # Errors
///
/// Returns [Error::DeleteMissingRule] if the rule does not exist or belongs to someone else.
pub fn delete_rule(rule_id: RuleId, owner_id: UserID, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM recurring_rule WHERE id = ?1 AND owner_id = ?2",
        (rule_id, owner_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingRule);
    }

    Ok(())
}

/// Apply `advance` if the stored rule is still active and due on the expected date.
pub fn advance_rule(advance: &RuleAdvance, connection: &Connection) -> Result<AdvanceOutcome, Error> {
    let rows_affected = connection.execute(
        "UPDATE recurring_rule
         SET next_due_date = ?1, last_created_date = ?2, is_active = ?3
         WHERE id = ?4 AND owner_id = ?5 AND next_due_date = ?6 AND is_active = 1",
        rusqlite::params![
            advance.new_next_due_date,
            advance.new_last_created_date,
            advance.new_is_active,
            advance.rule_id,
            advance.owner_id,
            advance.expected_next_due_date,
        ],
    )?;

    if rows_affected == 0 {
        Ok(AdvanceOutcome::Conflict)
    } else {
        Ok(AdvanceOutcome::Applied)
    }
}

/// Initialize the recurring rule table and indexes.
pub fn create_recurring_rule_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS recurring_rule (
            id INTEGER PRIMARY KEY,
            owner_id INTEGER NOT NULL,
            description TEXT NOT NULL,
            amount REAL NOT NULL CHECK (amount > 0),
            kind TEXT NOT NULL,
            category_id INTEGER NOT NULL,
            payment_method TEXT,
            frequency TEXT NOT NULL,
            interval_count INTEGER NOT NULL DEFAULT 1,
            day_of_week INTEGER,
            day_of_month INTEGER,
            start_date TEXT NOT NULL,
            end_date TEXT,
            next_due_date TEXT NOT NULL,
            last_created_date TEXT,
            is_active INTEGER NOT NULL DEFAULT 1,
            auto_create INTEGER NOT NULL DEFAULT 1,
            FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE RESTRICT
        );

        CREATE INDEX IF NOT EXISTS idx_recurring_rule_due
            ON recurring_rule(owner_id, is_active, next_due_date);",
    )
}

/// Reads rules and writes rule advances through a SQLite connection.
///
/// Pass a [rusqlite::Transaction] to group a whole scan into one commit.
pub struct SQLiteRuleStore<'c> {
    connection: &'c Connection,
}

impl<'c> SQLiteRuleStore<'c> {
    /// Create a store that uses `connection`.
    pub fn new(connection: &'c Connection) -> Self {
        Self { connection }
    }
}

impl RecurringRuleStore for SQLiteRuleStore<'_> {
    fn load_active_rules_due_by(
        &self,
        owner_id: UserID,
        as_of: Date,
    ) -> Result<Vec<RecurrenceRule>, Error> {
        load_active_rules_due_by(owner_id, as_of, self.connection)
    }

    fn advance(&self, advance: &RuleAdvance) -> Result<AdvanceOutcome, Error> {
        advance_rule(advance, self.connection)
    }
}

/// Stores materialized transactions in the transaction table.
pub struct SQLiteTransactionSink<'c> {
    connection: &'c Connection,
}

impl<'c> SQLiteTransactionSink<'c> {
    /// Create a sink that uses `connection`.
    pub fn new(connection: &'c Connection) -> Self {
        Self { connection }
    }
}

impl TransactionSink for SQLiteTransactionSink<'_> {
    fn create(&self, transaction: &MaterializedTransaction) -> Result<TransactionId, Error> {
        create_transaction(transaction.to_builder(), self.connection)
            .map(|transaction| transaction.id)
    }
}

/// A rule row before its schedule has been checked.
struct RuleRow {
    id: RuleId,
    owner_id: UserID,
    description: String,
    amount: f64,
    kind: TransactionKind,
    category_id: CategoryId,
    payment_method: Option<String>,
    frequency: String,
    interval_count: i64,
    day_of_week: Option<i64>,
    day_of_month: Option<i64>,
    start_date: Date,
    end_date: Option<Date>,
    next_due_date: Date,
    last_created_date: Option<Date>,
    is_active: bool,
    auto_create: bool,
}

impl RuleRow {
    fn into_rule(self) -> Result<RecurrenceRule, InvalidRuleError> {
        let frequency: Frequency = self.frequency.parse()?;
        let schedule = Schedule::from_parts(
            frequency,
            self.interval_count,
            self.day_of_week,
            self.day_of_month,
        )?;

        Ok(RecurrenceRule {
            id: self.id,
            owner_id: self.owner_id,
            payload: RulePayload {
                description: self.description,
                amount: self.amount,
                kind: self.kind,
                category_id: self.category_id,
                payment_method: self.payment_method,
            },
            schedule,
            start_date: self.start_date,
            end_date: self.end_date,
            next_due_date: self.next_due_date,
            last_created_date: self.last_created_date,
            is_active: self.is_active,
            auto_create: self.auto_create,
        })
    }
}

fn map_row(row: &Row) -> Result<RuleRow, rusqlite::Error> {
    Ok(RuleRow {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        description: row.get(2)?,
        amount: row.get(3)?,
        kind: row.get(4)?,
        category_id: row.get(5)?,
        payment_method: row.get(6)?,
        frequency: row.get(7)?,
        interval_count: row.get(8)?,
        day_of_week: row.get(9)?,
        day_of_month: row.get(10)?,
        start_date: row.get(11)?,
        end_date: row.get(12)?,
        next_due_date: row.get(13)?,
        last_created_date: row.get(14)?,
        is_active: row.get(15)?,
        auto_create: row.get(16)?,
    })
}

fn decode(row: RuleRow) -> Result<RecurrenceRule, Error> {
    let rule_id = row.id;

    row.into_rule()
        .inspect_err(|error| tracing::error!("stored recurring rule {rule_id} is invalid: {error}"))
        .map_err(Error::from)
}

fn map_category_error(error: rusqlite::Error, category_id: CategoryId) -> Error {
    match error {
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: _,
                extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
            },
            _,
        ) => Error::InvalidCategory(Some(category_id)),
        error => error.into(),
    }
}
