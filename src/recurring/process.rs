//! Applying materialized occurrences through a rule store and a transaction sink.

use rusqlite::Connection;
use time::Date;

use crate::{
    Error, UserID,
    database_id::TransactionId,
    recurring::{
        AdvanceOutcome, MaterializedTransaction, RecurrenceRule, RecurringRuleStore, RuleAdvance,
        SQLiteRuleStore, SQLiteTransactionSink, TransactionSink, materialize_due,
        materialize_occurrence,
    },
};

/// What one due-rule scan did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessSummary {
    /// The IDs of the transactions that were created.
    pub created: Vec<TransactionId>,
    /// The number of occurrences discarded because the rule changed underneath the scan.
    pub conflicts: usize,
    /// The number of rules that reached their end date.
    pub ended: usize,
}

/// The result of materializing a rule's pending occurrence on request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateNowOutcome {
    /// The transaction was created and the rule advanced.
    Created {
        transaction_id: TransactionId,
        /// Whether the rule reached its end date.
        ended: bool,
    },
    /// The rule was advanced, paused or deleted by someone else first.
    Conflict,
}

/// Create the pending transaction of every active auto-create rule of
/// `owner_id` that is due on or before `as_of`.
///
/// Each rule is advanced before its transaction is created. A rule whose
/// advance conflicts is skipped and its transaction discarded.
///
/// # Errors
///
/// Returns an [Error] if the store or the sink fail, or [Error::InvalidRule]
/// if the next occurrence of a rule cannot be computed.
pub fn process_due_rules(
    store: &impl RecurringRuleStore,
    sink: &impl TransactionSink,
    owner_id: UserID,
    as_of: Date,
) -> Result<ProcessSummary, Error> {
    let rules: Vec<RecurrenceRule> = store
        .load_active_rules_due_by(owner_id, as_of)?
        .into_iter()
        .filter(|rule| rule.auto_create)
        .collect();

    let materialized = materialize_due(&rules, as_of)
        .inspect_err(|error| tracing::error!("could not materialize due rules of {owner_id}: {error}"))?;

    let mut summary = ProcessSummary::default();

    for (advance, transaction) in materialized.into_pairs() {
        match apply(store, sink, &advance, &transaction)? {
            Some(transaction_id) => {
                summary.created.push(transaction_id);

                if advance.ends_rule() {
                    summary.ended += 1;
                }
            }
            None => summary.conflicts += 1,
        }
    }

    Ok(summary)
}

/// Create the transaction for the pending occurrence of `rule` right away,
/// even if it is not due yet or the rule does not auto-create.
///
/// # Errors
///
/// Returns [Error::RuleInactive] if the rule is paused or has ended, or any
/// error of the store or sink.
pub fn create_now(
    store: &impl RecurringRuleStore,
    sink: &impl TransactionSink,
    rule: &RecurrenceRule,
) -> Result<CreateNowOutcome, Error> {
    if !rule.is_active {
        return Err(Error::RuleInactive);
    }

    let (advance, transaction) = materialize_occurrence(rule)
        .inspect_err(|error| tracing::error!("could not materialize rule {}: {error}", rule.id))?;

    let outcome = match apply(store, sink, &advance, &transaction)? {
        Some(transaction_id) => CreateNowOutcome::Created {
            transaction_id,
            ended: advance.ends_rule(),
        },
        None => CreateNowOutcome::Conflict,
    };

    Ok(outcome)
}

/// Run [process_due_rules] against the database in one SQLite transaction.
pub fn process_due_rules_in_db(
    owner_id: UserID,
    as_of: Date,
    connection: &Connection,
) -> Result<ProcessSummary, Error> {
    let transaction = connection.unchecked_transaction()?;

    let summary = process_due_rules(
        &SQLiteRuleStore::new(&transaction),
        &SQLiteTransactionSink::new(&transaction),
        owner_id,
        as_of,
    )?;

    transaction.commit()?;

    Ok(summary)
}

/// Run [create_now] against the database in one SQLite transaction.
pub fn create_now_in_db(
    rule: &RecurrenceRule,
    connection: &Connection,
) -> Result<CreateNowOutcome, Error> {
    let transaction = connection.unchecked_transaction()?;

    let outcome = create_now(
        &SQLiteRuleStore::new(&transaction),
        &SQLiteTransactionSink::new(&transaction),
        rule,
    )?;

    transaction.commit()?;

    Ok(outcome)
}

/// Advance the rule, then store the transaction. `None` means the advance conflicted.
fn apply(
    store: &impl RecurringRuleStore,
    sink: &impl TransactionSink,
    advance: &RuleAdvance,
    transaction: &MaterializedTransaction,
) -> Result<Option<TransactionId>, Error> {
    match store.advance(advance)? {
        AdvanceOutcome::Applied => sink.create(transaction).map(Some),
        AdvanceOutcome::Conflict => {
            tracing::info!(
                "discarding occurrence {} of rule {}: the rule changed since it was loaded",
                advance.expected_next_due_date,
                advance.rule_id
            );
            Ok(None)
        }
    }
}
