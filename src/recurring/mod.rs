//! Recurring transactions.
//!
//! A recurring rule is a template for a transaction plus a schedule. Each
//! rule keeps a cursor, its next due date, that only moves forward. When the
//! due scan or the user materializes the pending occurrence, the rule is
//! advanced with a conditional write and the transaction is created in the
//! same SQLite transaction, so every occurrence turns into at most one
//! transaction.
//!
//! This module contains:
//! - the schedule arithmetic and rule model
//! - validation of the rule form
//! - materialization of due occurrences and the storage traits it writes through
//! - the SQLite store, the scheduled due scan and the recurring pages

mod actions;
mod create;
pub(crate) mod db;
mod delete;
mod edit;
mod form;
mod list;
pub(crate) mod materialize;
mod models;
pub(crate) mod process;
mod rule;
mod schedule;
mod scheduler;
mod store;
mod toggle;
pub(crate) mod validation;

pub use actions::{create_now_endpoint, process_due_endpoint};
pub use create::{create_recurring_endpoint, get_new_recurring_page};
pub use db::{
    SQLiteRuleStore, SQLiteTransactionSink, advance_rule, create_recurring_rule_table,
    create_rule, delete_rule, get_owners_with_due_rules, get_rule, get_rules_for_owner,
    load_active_rules_due_by, set_rule_active, update_rule,
};
pub use delete::delete_recurring_endpoint;
pub use edit::{get_edit_recurring_page, update_recurring_endpoint};
pub use list::get_recurring_page;
pub use materialize::{
    Materialized, MaterializedTransaction, RuleAdvance, materialize_due, materialize_occurrence,
};
pub use models::RecurringState;
pub use process::{
    CreateNowOutcome, ProcessSummary, create_now, create_now_in_db, process_due_rules,
    process_due_rules_in_db,
};
pub use rule::{RecurrenceRule, RuleId, RulePayload};
pub use schedule::{
    DayOfMonth, Frequency, IntervalCount, InvalidRuleError, Schedule, compute_next_occurrence,
    first_occurrence, next_occurrence_after, weekday_from_number,
};
pub use scheduler::{run_due_scan_job, scan_all_owners};
pub use store::{AdvanceOutcome, RecurringRuleStore, TransactionSink};
pub use toggle::toggle_recurring_endpoint;
pub use validation::{RuleForm, ValidatedRule, ValidationErrors, validate_rule};
