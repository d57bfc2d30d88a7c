//! The storage boundary of due-rule processing.

use time::Date;

use crate::{
    Error, UserID,
    database_id::TransactionId,
    recurring::{MaterializedTransaction, RecurrenceRule, RuleAdvance},
};

/// Whether a conditional rule advance was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// The stored rule still matched and now holds the advanced cursor.
    Applied,
    /// Someone else advanced, paused or deleted the rule first.
    Conflict,
}

/// Where recurring rules are read from and their cursors written to.
pub trait RecurringRuleStore {
    /// The active rules of `owner_id` with a `next_due_date` on or before `as_of`.
    fn load_active_rules_due_by(
        &self,
        owner_id: UserID,
        as_of: Date,
    ) -> Result<Vec<RecurrenceRule>, Error>;

    /// Apply `advance` only if the stored rule is active and its
    /// `next_due_date` still equals `advance.expected_next_due_date`.
    fn advance(&self, advance: &RuleAdvance) -> Result<AdvanceOutcome, Error>;
}

/// Where materialized transactions are stored.
pub trait TransactionSink {
    /// Store `transaction`, returning its new ID.
    fn create(&self, transaction: &MaterializedTransaction) -> Result<TransactionId, Error>;
}
