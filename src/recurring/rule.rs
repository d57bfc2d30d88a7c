//! The recurring rule model.

use time::Date;

use crate::{
    UserID, category::CategoryId, database_id::DatabaseId, recurring::Schedule,
    transaction::TransactionKind,
};

/// Database identifier for a recurring rule.
pub type RuleId = DatabaseId;

/// What every transaction created by a rule looks like.
#[derive(Debug, Clone, PartialEq)]
pub struct RulePayload {
    /// The description copied to each transaction.
    pub description: String,
    /// The positive amount of each transaction.
    pub amount: f64,
    /// Whether the transactions are income or expenses.
    pub kind: TransactionKind,
    /// The category of each transaction.
    pub category_id: CategoryId,
    /// How the transactions are paid, e.g. "Direct debit".
    pub payment_method: Option<String>,
}

/// A template that produces a transaction on every occurrence of its schedule.
///
/// `next_due_date` is always an occurrence of the schedule. It is set to the
/// first occurrence when the rule is created and only ever moves by being
/// advanced after materializing, or recomputed when the schedule is edited.
#[derive(Debug, Clone, PartialEq)]
pub struct RecurrenceRule {
    /// The ID of the rule.
    pub id: RuleId,
    /// The user the rule belongs to.
    pub owner_id: UserID,
    /// The transaction to create on each occurrence.
    pub payload: RulePayload,
    /// When the rule occurs.
    pub schedule: Schedule,
    /// The first day the rule may occur on.
    pub start_date: Date,
    /// The last day the rule may occur on, if any.
    pub end_date: Option<Date>,
    /// The occurrence that has not been materialized yet.
    pub next_due_date: Date,
    /// The occurrence that was materialized most recently.
    pub last_created_date: Option<Date>,
    /// Whether the rule is processed at all.
    pub is_active: bool,
    /// Whether the scheduled scan creates the transactions, or the user does it explicitly.
    pub auto_create: bool,
}

impl RecurrenceRule {
    /// Whether the pending occurrence should be materialized on or before `as_of`.
    pub fn is_due(&self, as_of: Date) -> bool {
        self.is_active && self.next_due_date <= as_of
    }

    /// Whether every occurrence up to the end date has been materialized.
    ///
    /// An ended rule keeps the out of range `next_due_date` it was advanced to.
    pub fn has_ended(&self) -> bool {
        self.end_date
            .is_some_and(|end_date| self.next_due_date > end_date)
    }

    /// A human readable description of the schedule, e.g. "Every month on day 15".
    pub fn schedule_label(&self) -> String {
        self.schedule.label(self.start_date)
    }
}

#[cfg(test)]
pub(crate) mod test_rules {
    use time::{Date, macros::date};

    use crate::{
        UserID,
        recurring::{DayOfMonth, IntervalCount, RecurrenceRule, RulePayload, Schedule},
        transaction::TransactionKind,
    };

    /// A monthly rule on the 15th that starts and is next due on 2025-01-15.
    pub(crate) fn monthly_rule() -> RecurrenceRule {
        RecurrenceRule {
            id: 1,
            owner_id: UserID::new(1),
            payload: RulePayload {
                description: "Rent".to_owned(),
                amount: 450.0,
                kind: TransactionKind::Expense,
                category_id: 1,
                payment_method: Some("Direct debit".to_owned()),
            },
            schedule: Schedule::Monthly {
                interval: IntervalCount::ONE,
                day: DayOfMonth::new(15).unwrap(),
            },
            start_date: date!(2025 - 01 - 15),
            end_date: None,
            next_due_date: date!(2025 - 01 - 15),
            last_created_date: None,
            is_active: true,
            auto_create: true,
        }
    }

    pub(crate) fn with_dates(
        rule: RecurrenceRule,
        next_due_date: Date,
        end_date: Option<Date>,
    ) -> RecurrenceRule {
        RecurrenceRule {
            next_due_date,
            end_date,
            ..rule
        }
    }
}
