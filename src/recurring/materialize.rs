//! Turning due occurrences of recurring rules into transactions.

use time::Date;

use crate::{
    UserID,
    category::CategoryId,
    recurring::{InvalidRuleError, RecurrenceRule, RuleId, compute_next_occurrence},
    transaction::{Transaction, TransactionBuilder, TransactionKind},
};

/// A transaction produced by one occurrence of a recurring rule.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterializedTransaction {
    /// The rule that produced the transaction.
    pub rule_id: RuleId,
    /// The owner of the rule.
    pub owner_id: UserID,
    /// The occurrence date.
    pub date: Date,
    pub description: String,
    pub amount: f64,
    pub kind: TransactionKind,
    pub category_id: CategoryId,
    pub payment_method: Option<String>,
}

impl MaterializedTransaction {
    /// The builder for storing this transaction with [crate::transaction::create_transaction].
    pub fn to_builder(&self) -> TransactionBuilder {
        Transaction::build(
            self.owner_id,
            self.amount,
            self.kind,
            self.date,
            &self.description,
        )
        .category_id(Some(self.category_id))
        .payment_method(self.payment_method.clone())
        .recurring_rule_id(Some(self.rule_id))
    }
}

/// The new cursor of a rule after one of its occurrences was materialized.
///
/// Applying it is a compare-and-swap: it only takes effect if the stored rule
/// is still active and due on `expected_next_due_date`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleAdvance {
    pub rule_id: RuleId,
    pub owner_id: UserID,
    /// The `next_due_date` the rule had when the occurrence was materialized.
    pub expected_next_due_date: Date,
    /// The occurrence after the materialized one.
    pub new_next_due_date: Date,
    /// The materialized occurrence.
    pub new_last_created_date: Date,
    /// False if `new_next_due_date` is past the rule's end date.
    pub new_is_active: bool,
}

impl RuleAdvance {
    /// Whether applying the advance ends the rule.
    pub fn ends_rule(&self) -> bool {
        !self.new_is_active
    }
}

/// The output of [materialize_due].
///
/// `advanced_rules[i]` belongs to `new_transactions[i]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Materialized {
    pub advanced_rules: Vec<RuleAdvance>,
    pub new_transactions: Vec<MaterializedTransaction>,
}

impl Materialized {
    /// Each rule advance with the transaction it belongs to.
    pub fn into_pairs(self) -> impl Iterator<Item = (RuleAdvance, MaterializedTransaction)> {
        self.advanced_rules.into_iter().zip(self.new_transactions)
    }

    /// Whether nothing was due.
    pub fn is_empty(&self) -> bool {
        self.new_transactions.is_empty()
    }
}

/// Materialize the pending occurrence of every active rule due on or before `as_of`.
///
/// Each due rule produces exactly one transaction, dated on its pending
/// occurrence, and is advanced by exactly one period even if more occurrences
/// have passed since. Inactive and not yet due rules are skipped. Nothing is
/// written anywhere, the caller applies the result.
///
/// # Errors
///
/// Returns an [InvalidRuleError] if a rule's next occurrence cannot be computed.
pub fn materialize_due(
    rules: &[RecurrenceRule],
    as_of: Date,
) -> Result<Materialized, InvalidRuleError> {
    let mut materialized = Materialized::default();

    for rule in rules.iter().filter(|rule| rule.is_due(as_of)) {
        let (advance, transaction) = materialize_occurrence(rule)?;
        materialized.advanced_rules.push(advance);
        materialized.new_transactions.push(transaction);
    }

    Ok(materialized)
}

/// Materialize the pending occurrence of `rule`, whether or not it is due yet.
///
/// # Errors
///
/// Returns an [InvalidRuleError] if the rule's next occurrence cannot be computed.
pub fn materialize_occurrence(
    rule: &RecurrenceRule,
) -> Result<(RuleAdvance, MaterializedTransaction), InvalidRuleError> {
    let occurrence = rule.next_due_date;
    let next_due_date = compute_next_occurrence(rule, occurrence)?;
    let is_past_end = rule
        .end_date
        .is_some_and(|end_date| next_due_date > end_date);

    let advance = RuleAdvance {
        rule_id: rule.id,
        owner_id: rule.owner_id,
        expected_next_due_date: occurrence,
        new_next_due_date: next_due_date,
        new_last_created_date: occurrence,
        new_is_active: !is_past_end,
    };

    let payload = &rule.payload;
    let transaction = MaterializedTransaction {
        rule_id: rule.id,
        owner_id: rule.owner_id,
        date: occurrence,
        description: payload.description.clone(),
        amount: payload.amount,
        kind: payload.kind,
        category_id: payload.category_id,
        payment_method: payload.payment_method.clone(),
    };

    Ok((advance, transaction))
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::recurring::{
        InvalidRuleError, RecurrenceRule, Schedule,
        rule::test_rules::{monthly_rule, with_dates},
    };

    use super::materialize_due;

    /// Apply the advances to the rules as a store would.
    fn apply(rules: &mut [RecurrenceRule], as_of: time::Date) -> usize {
        let materialized = materialize_due(rules, as_of).unwrap();
        let count = materialized.new_transactions.len();

        for advance in materialized.advanced_rules {
            let rule = rules
                .iter_mut()
                .find(|rule| rule.id == advance.rule_id)
                .unwrap();
            rule.next_due_date = advance.new_next_due_date;
            rule.last_created_date = Some(advance.new_last_created_date);
            rule.is_active = advance.new_is_active;
        }

        count
    }

    #[test]
    fn monthly_rule_due_last_week_creates_one_transaction() {
        let rule = monthly_rule();

        let materialized = materialize_due(&[rule.clone()], date!(2025 - 01 - 20)).unwrap();

        assert_eq!(materialized.new_transactions.len(), 1);
        let transaction = &materialized.new_transactions[0];
        assert_eq!(transaction.date, date!(2025 - 01 - 15));
        assert_eq!(transaction.rule_id, rule.id);
        assert_eq!(transaction.owner_id, rule.owner_id);
        assert_eq!(transaction.description, "Rent");
        assert_eq!(transaction.amount, 450.0);
        assert_eq!(transaction.kind, rule.payload.kind);
        assert_eq!(transaction.category_id, rule.payload.category_id);
        assert_eq!(transaction.payment_method, rule.payload.payment_method);

        let advance = &materialized.advanced_rules[0];
        assert_eq!(advance.expected_next_due_date, date!(2025 - 01 - 15));
        assert_eq!(advance.new_next_due_date, date!(2025 - 02 - 15));
        assert_eq!(advance.new_last_created_date, date!(2025 - 01 - 15));
        assert!(advance.new_is_active);
    }

    #[test]
    fn overdue_rule_advances_only_one_period() {
        let rule = monthly_rule();

        let materialized = materialize_due(&[rule], date!(2025 - 06 - 30)).unwrap();

        assert_eq!(materialized.new_transactions.len(), 1);
        assert_eq!(
            materialized.advanced_rules[0].new_next_due_date,
            date!(2025 - 02 - 15)
        );
    }

    #[test]
    fn repeated_calls_catch_up_one_occurrence_at_a_time() {
        let mut rules = [monthly_rule()];
        let as_of = date!(2025 - 03 - 20);

        assert_eq!(apply(&mut rules, as_of), 1);
        assert_eq!(apply(&mut rules, as_of), 1);
        assert_eq!(apply(&mut rules, as_of), 1);
        assert_eq!(apply(&mut rules, as_of), 0);
        assert_eq!(rules[0].next_due_date, date!(2025 - 04 - 15));
        assert_eq!(rules[0].last_created_date, Some(date!(2025 - 03 - 15)));
    }

    #[test]
    fn skips_rules_that_are_not_due_or_inactive() {
        let not_due = monthly_rule();
        let inactive = RecurrenceRule {
            id: 2,
            is_active: false,
            ..monthly_rule()
        };

        let materialized = materialize_due(&[not_due, inactive], date!(2025 - 01 - 14)).unwrap();

        assert!(materialized.is_empty());
        assert!(materialized.advanced_rules.is_empty());

        let inactive_but_due = RecurrenceRule {
            is_active: false,
            ..monthly_rule()
        };
        assert!(
            materialize_due(&[inactive_but_due], date!(2025 - 12 - 31))
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn last_occurrence_before_end_date_ends_rule() {
        let rule = with_dates(
            monthly_rule(),
            date!(2025 - 03 - 15),
            Some(date!(2025 - 04 - 01)),
        );

        let materialized = materialize_due(&[rule], date!(2025 - 03 - 15)).unwrap();

        assert_eq!(materialized.new_transactions.len(), 1);
        assert_eq!(
            materialized.new_transactions[0].date,
            date!(2025 - 03 - 15)
        );
        let advance = &materialized.advanced_rules[0];
        assert_eq!(advance.new_next_due_date, date!(2025 - 04 - 15));
        assert!(!advance.new_is_active);
        assert!(advance.ends_rule());
    }

    #[test]
    fn ended_rule_produces_nothing_more() {
        let mut rules = [with_dates(
            monthly_rule(),
            date!(2025 - 03 - 15),
            Some(date!(2025 - 04 - 01)),
        )];
        let as_of = date!(2025 - 12 - 31);

        assert_eq!(apply(&mut rules, as_of), 1);
        assert!(!rules[0].is_active);
        assert_eq!(apply(&mut rules, as_of), 0);
    }

    #[test]
    fn occurrence_on_end_date_keeps_rule_active() {
        let rule = with_dates(
            monthly_rule(),
            date!(2025 - 03 - 15),
            Some(date!(2025 - 04 - 15)),
        );

        let materialized = materialize_due(&[rule], date!(2025 - 03 - 15)).unwrap();

        assert!(materialized.advanced_rules[0].new_is_active);
    }

    #[test]
    fn pairs_line_up() {
        let first = monthly_rule();
        let second = RecurrenceRule {
            id: 2,
            next_due_date: date!(2025 - 01 - 10),
            start_date: date!(2025 - 01 - 10),
            schedule: Schedule::Daily {
                interval: crate::recurring::IntervalCount::ONE,
            },
            ..monthly_rule()
        };

        let materialized = materialize_due(&[first, second], date!(2025 - 01 - 31)).unwrap();

        for (advance, transaction) in materialized.into_pairs() {
            assert_eq!(advance.rule_id, transaction.rule_id);
            assert_eq!(advance.expected_next_due_date, transaction.date);
        }
    }

    #[test]
    fn output_is_identical_for_identical_input() {
        let rules = [monthly_rule()];

        assert_eq!(
            materialize_due(&rules, date!(2025 - 02 - 01)),
            materialize_due(&rules, date!(2025 - 02 - 01))
        );
    }

    #[test]
    fn unrepresentable_next_occurrence_is_an_error() {
        let rule = RecurrenceRule {
            start_date: time::Date::MAX,
            next_due_date: time::Date::MAX,
            schedule: Schedule::Daily {
                interval: crate::recurring::IntervalCount::ONE,
            },
            ..monthly_rule()
        };

        let result = materialize_due(&[rule], time::Date::MAX);

        assert_eq!(
            result,
            Err(InvalidRuleError::DateOutOfRange(time::Date::MAX))
        );
    }
}
