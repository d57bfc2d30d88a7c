//! Turns the raw recurring rule form into a typed rule, collecting an error
//! for every invalid field.

use std::{collections::BTreeMap, str::FromStr};

use serde::{Deserialize, Serialize};
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    category::CategoryId,
    recurring::{
        DayOfMonth, Frequency, IntervalCount, InvalidRuleError, RulePayload, Schedule,
        first_occurrence, next_occurrence_after, weekday_from_number,
    },
    transaction::TransactionKind,
};

/// The form input names, used as the keys of [ValidationErrors].
pub mod fields {
    /// The rule description.
    pub const DESCRIPTION: &str = "description";
    /// The transaction amount.
    pub const AMOUNT: &str = "amount";
    /// Income or expense.
    pub const KIND: &str = "kind";
    /// The category ID.
    pub const CATEGORY_ID: &str = "category_id";
    /// The payment method.
    pub const PAYMENT_METHOD: &str = "payment_method";
    /// The frequency name.
    pub const FREQUENCY: &str = "frequency";
    /// The interval multiplier.
    pub const INTERVAL_COUNT: &str = "interval_count";
    /// The day of the week, 0 for Sunday.
    pub const DAY_OF_WEEK: &str = "day_of_week";
    /// The day of the month.
    pub const DAY_OF_MONTH: &str = "day_of_month";
    /// The start date.
    pub const START_DATE: &str = "start_date";
    /// The optional end date.
    pub const END_DATE: &str = "end_date";
    /// The auto create checkbox.
    pub const AUTO_CREATE: &str = "auto_create";
}

/// The date format of date inputs, e.g. "2025-01-15".
pub const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// The recurring rule form exactly as submitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleForm {
    #[serde(default)]
    pub description: String,
    pub amount: Option<String>,
    pub kind: Option<String>,
    pub category_id: Option<String>,
    pub payment_method: Option<String>,
    pub frequency: Option<String>,
    pub interval_count: Option<String>,
    pub day_of_week: Option<String>,
    pub day_of_month: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    /// Present, usually as "on", when the checkbox is ticked.
    pub auto_create: Option<String>,
}

/// Error messages keyed by form input name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(BTreeMap<&'static str, String>);

impl ValidationErrors {
    /// Record `message` for `field`, keeping the first message if the field already has one.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    /// The message for `field`, if it is invalid.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Whether no field is invalid.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The number of invalid fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// The invalid fields and their messages, ordered by field name.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0
            .iter()
            .map(|(field, message)| (*field, message.as_str()))
    }
}

/// A rule form that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRule {
    pub payload: RulePayload,
    pub schedule: Schedule,
    pub start_date: Date,
    pub end_date: Option<Date>,
    pub auto_create: bool,
    /// The first occurrence on or after the start date.
    pub first_occurrence: Date,
}

/// Check every field of `form`.
///
/// Selectors that the chosen frequency does not use are ignored. A blank
/// interval means an interval of one.
///
/// # Errors
///
/// Returns a [ValidationErrors] with a message for every invalid field.
pub fn validate_rule(form: &RuleForm) -> Result<ValidatedRule, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let description = form.description.trim();
    if description.is_empty() {
        errors.add(fields::DESCRIPTION, "Description cannot be empty");
    }

    let amount = match non_blank(&form.amount).map(str::parse::<f64>) {
        None => {
            errors.add(fields::AMOUNT, "Amount is required");
            None
        }
        Some(Ok(amount)) if amount.is_finite() && amount > 0.0 => Some(amount),
        Some(Ok(amount)) if amount.is_finite() => {
            errors.add(fields::AMOUNT, "Amount must be greater than zero");
            None
        }
        Some(_) => {
            errors.add(fields::AMOUNT, "Amount must be a number");
            None
        }
    };

    let kind = match non_blank(&form.kind).map(TransactionKind::from_str) {
        Some(Ok(kind)) => Some(kind),
        _ => {
            errors.add(fields::KIND, "Choose either income or expense");
            None
        }
    };

    let category_id = match non_blank(&form.category_id).map(str::parse::<CategoryId>) {
        None => {
            errors.add(fields::CATEGORY_ID, "Choose a category");
            None
        }
        Some(Ok(category_id)) => Some(category_id),
        Some(Err(_)) => {
            errors.add(fields::CATEGORY_ID, "Choose a valid category");
            None
        }
    };

    let frequency = match non_blank(&form.frequency).map(Frequency::from_str) {
        None => {
            errors.add(fields::FREQUENCY, "Choose how often the transaction repeats");
            None
        }
        Some(Ok(frequency)) => Some(frequency),
        Some(Err(error)) => {
            errors.add(fields::FREQUENCY, capitalise(&error.to_string()));
            None
        }
    };

    let interval = match non_blank(&form.interval_count) {
        None => Some(IntervalCount::ONE),
        Some(raw) => match raw.parse::<i64>().map(IntervalCount::new) {
            Ok(Ok(interval)) => Some(interval),
            _ => {
                errors.add(
                    fields::INTERVAL_COUNT,
                    "Interval must be a whole number of at least 1",
                );
                None
            }
        },
    };

    let day_of_week = match frequency {
        Some(frequency) if frequency.uses_day_of_week() => {
            match non_blank(&form.day_of_week).map(parse_day_of_week) {
                None => {
                    errors.add(fields::DAY_OF_WEEK, "Choose a day of the week");
                    None
                }
                Some(Ok(day)) => Some(day),
                Some(Err(_)) => {
                    errors.add(
                        fields::DAY_OF_WEEK,
                        "Day of the week must be between 0 (Sunday) and 6 (Saturday)",
                    );
                    None
                }
            }
        }
        _ => None,
    };

    let day_of_month = match frequency {
        Some(frequency) if frequency.uses_day_of_month() => {
            match non_blank(&form.day_of_month).map(parse_day_of_month) {
                None => {
                    errors.add(fields::DAY_OF_MONTH, "Choose a day of the month");
                    None
                }
                Some(Ok(day)) => Some(day),
                Some(Err(_)) => {
                    errors.add(
                        fields::DAY_OF_MONTH,
                        "Day of the month must be between 1 and 31",
                    );
                    None
                }
            }
        }
        _ => None,
    };

    let start_date = match non_blank(&form.start_date).map(parse_date) {
        None => {
            errors.add(fields::START_DATE, "Start date is required");
            None
        }
        Some(Ok(date)) => Some(date),
        Some(Err(_)) => {
            errors.add(
                fields::START_DATE,
                "Start date must be a valid date (YYYY-MM-DD)",
            );
            None
        }
    };

    let end_date = match non_blank(&form.end_date).map(parse_date) {
        None => None,
        Some(Ok(date)) => Some(date),
        Some(Err(_)) => {
            errors.add(fields::END_DATE, "End date must be a valid date (YYYY-MM-DD)");
            None
        }
    };

    if let (Some(start_date), Some(end_date)) = (start_date, end_date)
        && end_date < start_date
    {
        errors.add(fields::END_DATE, "End date cannot be before the start date");
    }

    let schedule = match (frequency, interval) {
        (Some(frequency), Some(interval)) => {
            let weekday = day_of_week.map(|day| i64::from(day.number_days_from_sunday()));
            let day = day_of_month.map(|day| i64::from(day.get()));

            match Schedule::from_parts(frequency, i64::from(interval.get()), weekday, day) {
                Ok(schedule) => Some(schedule),
                // Missing selectors have already been reported above.
                Err(_) => None,
            }
        }
        _ => None,
    };

    let first = match (schedule, start_date) {
        (Some(schedule), Some(start_date)) => match first_occurrence(&schedule, start_date) {
            Ok(first) => Some(first),
            Err(_) => {
                errors.add(fields::START_DATE, "Start date is too far in the future");
                None
            }
        },
        _ => None,
    };

    if let (Some(schedule), Some(start_date), Some(first)) = (schedule, start_date, first)
        && next_occurrence_after(&schedule, start_date, first).is_err()
    {
        errors.add(
            fields::INTERVAL_COUNT,
            format!("Interval is too long, the occurrence after {first} is not a valid date"),
        );
    }

    if let (Some(first), Some(end_date)) = (first, end_date)
        && end_date < first
    {
        errors.add(
            fields::END_DATE,
            format!("End date is before the first occurrence on {first}"),
        );
    }

    match (
        amount,
        kind,
        category_id,
        schedule,
        start_date,
        first,
        errors.is_empty(),
    ) {
        (
            Some(amount),
            Some(kind),
            Some(category_id),
            Some(schedule),
            Some(start_date),
            Some(first_occurrence),
            true,
        ) => Ok(ValidatedRule {
            payload: RulePayload {
                description: description.to_owned(),
                amount,
                kind,
                category_id,
                payment_method: non_blank(&form.payment_method).map(str::to_owned),
            },
            schedule,
            start_date,
            end_date,
            auto_create: non_blank(&form.auto_create).is_some(),
            first_occurrence,
        }),
        _ => Err(errors),
    }
}

/// Parse a date in the `YYYY-MM-DD` format of date inputs.
pub fn parse_date(raw: &str) -> Result<Date, time::error::Parse> {
    Date::parse(raw, DATE_FORMAT)
}

fn parse_day_of_week(raw: &str) -> Result<time::Weekday, InvalidRuleError> {
    raw.parse::<i64>()
        .map_err(|_| InvalidRuleError::DayOfWeekOutOfRange(-1))
        .and_then(weekday_from_number)
}

fn parse_day_of_month(raw: &str) -> Result<DayOfMonth, InvalidRuleError> {
    raw.parse::<i64>()
        .map_err(|_| InvalidRuleError::DayOfMonthOutOfRange(-1))
        .and_then(DayOfMonth::new)
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn capitalise(message: &str) -> String {
    let mut chars = message.chars();

    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use time::{Weekday, macros::date};

    use crate::{
        recurring::{DayOfMonth, IntervalCount, Schedule},
        transaction::TransactionKind,
    };

    use super::{RuleForm, ValidationErrors, fields, validate_rule};

    fn some(value: &str) -> Option<String> {
        Some(value.to_owned())
    }

    fn valid_monthly_form() -> RuleForm {
        RuleForm {
            description: "Rent".to_owned(),
            amount: some("450.00"),
            kind: some("expense"),
            category_id: some("3"),
            payment_method: some("Direct debit"),
            frequency: some("monthly"),
            interval_count: some("1"),
            day_of_week: None,
            day_of_month: some("15"),
            start_date: some("2025-01-15"),
            end_date: None,
            auto_create: some("on"),
        }
    }

    #[track_caller]
    fn must_fail(form: &RuleForm) -> ValidationErrors {
        match validate_rule(form) {
            Ok(rule) => panic!("want validation errors, got {rule:?}"),
            Err(errors) => errors,
        }
    }

    #[test]
    fn accepts_valid_monthly_rule() {
        let rule = validate_rule(&valid_monthly_form()).expect("Form should be valid");

        assert_eq!(rule.payload.description, "Rent");
        assert_eq!(rule.payload.amount, 450.0);
        assert_eq!(rule.payload.kind, TransactionKind::Expense);
        assert_eq!(rule.payload.category_id, 3);
        assert_eq!(rule.payload.payment_method.as_deref(), Some("Direct debit"));
        assert_eq!(
            rule.schedule,
            Schedule::Monthly {
                interval: IntervalCount::ONE,
                day: DayOfMonth::new(15).unwrap()
            }
        );
        assert_eq!(rule.start_date, date!(2025 - 01 - 15));
        assert_eq!(rule.first_occurrence, date!(2025 - 01 - 15));
        assert!(rule.auto_create);
    }

    #[test]
    fn blank_interval_defaults_to_one() {
        let form = RuleForm {
            interval_count: some(""),
            ..valid_monthly_form()
        };

        let rule = validate_rule(&form).expect("Form should be valid");

        assert_eq!(rule.schedule.interval(), IntervalCount::ONE);
    }

    #[test]
    fn rejects_interval_whose_next_occurrence_is_not_a_date() {
        let form = RuleForm {
            frequency: some("yearly"),
            interval_count: some("100000"),
            day_of_month: some("1"),
            start_date: some("2025-01-01"),
            ..valid_monthly_form()
        };

        let errors = must_fail(&form);

        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors.get(fields::INTERVAL_COUNT),
            Some("Interval is too long, the occurrence after 2025-01-01 is not a valid date")
        );
    }

    #[test]
    fn accepts_long_interval_with_representable_next_occurrence() {
        let form = RuleForm {
            frequency: some("yearly"),
            interval_count: some("100"),
            day_of_month: some("1"),
            start_date: some("2025-01-01"),
            ..valid_monthly_form()
        };

        assert!(validate_rule(&form).is_ok());
    }

    #[test]
    fn weekly_without_day_of_week_is_keyed_to_day_of_week() {
        let form = RuleForm {
            frequency: some("weekly"),
            day_of_week: None,
            ..valid_monthly_form()
        };

        let errors = must_fail(&form);

        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors.get(fields::DAY_OF_WEEK),
            Some("Choose a day of the week")
        );
    }

    #[test]
    fn weekly_ignores_day_of_month_and_uses_first_matching_weekday() {
        let form = RuleForm {
            frequency: some("weekly"),
            day_of_week: some("1"),
            day_of_month: some("not a number"),
            ..valid_monthly_form()
        };

        let rule = validate_rule(&form).expect("Form should be valid");

        assert_eq!(
            rule.schedule,
            Schedule::Weekly {
                interval: IntervalCount::ONE,
                weekday: Weekday::Monday
            }
        );
        assert_eq!(rule.first_occurrence, date!(2025 - 01 - 20));
    }

    #[test]
    fn reports_missing_amount_and_invalid_start_date_together() {
        let form = RuleForm {
            amount: None,
            start_date: some("2025-02-30"),
            ..valid_monthly_form()
        };

        let errors = must_fail(&form);

        assert_eq!(errors.get(fields::AMOUNT), Some("Amount is required"));
        assert_eq!(
            errors.get(fields::START_DATE),
            Some("Start date must be a valid date (YYYY-MM-DD)")
        );
    }

    #[test]
    fn reports_every_invalid_field_of_an_empty_form() {
        let errors = must_fail(&RuleForm::default());

        let invalid_fields: Vec<&str> = errors.iter().map(|(field, _)| field).collect();
        assert_eq!(
            invalid_fields,
            vec![
                fields::AMOUNT,
                fields::CATEGORY_ID,
                fields::DESCRIPTION,
                fields::FREQUENCY,
                fields::KIND,
                fields::START_DATE,
            ]
        );
    }

    #[test]
    fn rejects_non_positive_and_non_numeric_amounts() {
        for (amount, want) in [
            ("0", "Amount must be greater than zero"),
            ("-12.5", "Amount must be greater than zero"),
            ("abc", "Amount must be a number"),
            ("NaN", "Amount must be a number"),
            ("inf", "Amount must be a number"),
        ] {
            let form = RuleForm {
                amount: some(amount),
                ..valid_monthly_form()
            };

            let errors = must_fail(&form);

            assert_eq!(errors.get(fields::AMOUNT), Some(want), "amount {amount:?}");
        }
    }

    #[test]
    fn rejects_unknown_kind_and_frequency() {
        let form = RuleForm {
            kind: some("transfer"),
            frequency: some("hourly"),
            ..valid_monthly_form()
        };

        let errors = must_fail(&form);

        assert_eq!(
            errors.get(fields::KIND),
            Some("Choose either income or expense")
        );
        assert_eq!(
            errors.get(fields::FREQUENCY),
            Some("Unknown frequency \"hourly\"")
        );
    }

    #[test]
    fn rejects_zero_interval() {
        let form = RuleForm {
            interval_count: some("0"),
            ..valid_monthly_form()
        };

        let errors = must_fail(&form);

        assert_eq!(
            errors.get(fields::INTERVAL_COUNT),
            Some("Interval must be a whole number of at least 1")
        );
    }

    #[test]
    fn rejects_out_of_range_selectors() {
        let monthly = RuleForm {
            day_of_month: some("32"),
            ..valid_monthly_form()
        };
        let weekly = RuleForm {
            frequency: some("biweekly"),
            day_of_week: some("7"),
            ..valid_monthly_form()
        };

        assert_eq!(
            must_fail(&monthly).get(fields::DAY_OF_MONTH),
            Some("Day of the month must be between 1 and 31")
        );
        assert_eq!(
            must_fail(&weekly).get(fields::DAY_OF_WEEK),
            Some("Day of the week must be between 0 (Sunday) and 6 (Saturday)")
        );
    }

    #[test]
    fn rejects_end_date_before_start_date() {
        let form = RuleForm {
            end_date: some("2025-01-14"),
            ..valid_monthly_form()
        };

        let errors = must_fail(&form);

        assert_eq!(
            errors.get(fields::END_DATE),
            Some("End date cannot be before the start date")
        );
    }

    #[test]
    fn rejects_end_date_before_first_occurrence() {
        let form = RuleForm {
            day_of_month: some("20"),
            end_date: some("2025-01-16"),
            ..valid_monthly_form()
        };

        let errors = must_fail(&form);

        assert_eq!(
            errors.get(fields::END_DATE),
            Some("End date is before the first occurrence on 2025-01-20")
        );
    }

    #[test]
    fn end_date_on_first_occurrence_is_valid() {
        let form = RuleForm {
            end_date: some("2025-01-15"),
            ..valid_monthly_form()
        };

        let rule = validate_rule(&form).expect("Form should be valid");

        assert_eq!(rule.end_date, Some(date!(2025 - 01 - 15)));
    }

    #[test]
    fn unticked_auto_create_and_blank_payment_method() {
        let form = RuleForm {
            auto_create: None,
            payment_method: some("   "),
            ..valid_monthly_form()
        };

        let rule = validate_rule(&form).expect("Form should be valid");

        assert!(!rule.auto_create);
        assert_eq!(rule.payload.payment_method, None);
    }

    #[test]
    fn description_is_trimmed() {
        let form = RuleForm {
            description: "  Netflix \n".to_owned(),
            ..valid_monthly_form()
        };

        let rule = validate_rule(&form).expect("Form should be valid");

        assert_eq!(rule.payload.description, "Netflix");
    }
}
