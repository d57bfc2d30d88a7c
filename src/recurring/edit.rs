//! The page and endpoint for editing a recurring rule.

use axum::{
    Extension, Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use time::Date;

use crate::{
    Error, UserID,
    category::get_categories,
    endpoints::{self, format_endpoint},
    recurring::{
        InvalidRuleError, RuleForm, RuleId, ValidatedRule, ValidationErrors,
        create::validate_for_owner,
        form::{FormAction, rule_form_view, rule_page_view, rule_to_form},
        get_rule,
        models::RecurringState,
        next_occurrence_after, update_rule,
    },
};

/// The pending occurrence and active flag of a rule after its schedule is replaced by `rule`.
///
/// A rule that never materialized anything is due on its new first
/// occurrence. Otherwise it is due on the first occurrence strictly after the
/// last materialized one, so no date is materialized twice. A rule whose new
/// pending occurrence is past its end date is deactivated; a paused rule stays paused.
pub(super) fn recompute_cursor(
    rule: &ValidatedRule,
    last_created_date: Option<Date>,
    was_active: bool,
) -> Result<(Date, bool), InvalidRuleError> {
    let next_due_date = match last_created_date {
        None => rule.first_occurrence,
        Some(last_created_date) => {
            next_occurrence_after(&rule.schedule, rule.start_date, last_created_date)?
        }
    };

    let is_past_end = rule
        .end_date
        .is_some_and(|end_date| next_due_date > end_date);

    Ok((next_due_date, was_active && !is_past_end))
}

/// Render the page for editing a recurring rule.
pub async fn get_edit_recurring_page(
    State(state): State<RecurringState>,
    Extension(user_id): Extension<UserID>,
    Path(rule_id): Path<RuleId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let rule = get_rule(rule_id, user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve rule {rule_id}: {error}"))?;
    let categories = get_categories(user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve categories: {error}"))?;

    let update_endpoint = format_endpoint(endpoints::PUT_RECURRING, rule_id);
    let form = rule_form_view(
        FormAction::Update {
            endpoint: &update_endpoint,
        },
        &rule_to_form(&rule),
        &categories,
        &ValidationErrors::default(),
    );

    Ok(rule_page_view("Edit Recurring Transaction", endpoints::EDIT_RECURRING_VIEW, form)
        .into_response())
}

/// Replace a recurring rule with the submitted form.
pub async fn update_recurring_endpoint(
    State(state): State<RecurringState>,
    Extension(user_id): Extension<UserID>,
    Path(rule_id): Path<RuleId>,
    Form(form): Form<RuleForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let existing = match get_rule(rule_id, user_id, &connection) {
        Ok(rule) => rule,
        Err(Error::NotFound) => return Error::UpdateMissingRule.into_alert_response(),
        Err(error) => {
            tracing::error!("could not get rule {rule_id}: {error}");
            return error.into_alert_response();
        }
    };

    let rule = match validate_for_owner(&form, user_id, &connection) {
        Ok(Ok(rule)) => rule,
        Ok(Err((errors, categories))) => {
            let update_endpoint = format_endpoint(endpoints::PUT_RECURRING, rule_id);

            return rule_form_view(
                FormAction::Update {
                    endpoint: &update_endpoint,
                },
                &form,
                &categories,
                &errors,
            )
            .into_response();
        }
        Err(error) => {
            tracing::error!("could not validate recurring rule: {error}");
            return error.into_alert_response();
        }
    };

    let (next_due_date, is_active) =
        match recompute_cursor(&rule, existing.last_created_date, existing.is_active) {
            Ok(cursor) => cursor,
            Err(error) => {
                tracing::error!("could not compute the next occurrence of rule {rule_id}: {error}");
                return Error::from(error).into_alert_response();
            }
        };

    match update_rule(rule_id, user_id, &rule, next_due_date, is_active, &connection) {
        Ok(()) => {
            tracing::info!("updated recurring rule {rule_id}, next due {next_due_date}");

            (
                HxRedirect(endpoints::RECURRING_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!("An unexpected error occurred while updating rule {rule_id}: {error}");

            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod recompute_cursor_tests {
    use time::macros::date;

    use crate::recurring::{DayOfMonth, IntervalCount, Schedule, db::test_db::monthly_validated_rule};

    use super::recompute_cursor;

    #[test]
    fn untouched_rule_is_due_on_new_first_occurrence() {
        let mut rule = monthly_validated_rule(1);
        rule.schedule = Schedule::Monthly {
            interval: IntervalCount::ONE,
            day: DayOfMonth::new(20).unwrap(),
        };
        rule.first_occurrence = date!(2025 - 01 - 20);

        assert_eq!(
            recompute_cursor(&rule, None, true),
            Ok((date!(2025 - 01 - 20), true))
        );
    }

    #[test]
    fn materialized_rule_continues_after_last_created_date() {
        let mut rule = monthly_validated_rule(1);
        rule.schedule = Schedule::Monthly {
            interval: IntervalCount::ONE,
            day: DayOfMonth::new(1).unwrap(),
        };
        rule.first_occurrence = date!(2025 - 02 - 01);

        assert_eq!(
            recompute_cursor(&rule, Some(date!(2025 - 03 - 15)), true),
            Ok((date!(2025 - 04 - 01), true))
        );
    }

    #[test]
    fn deactivates_when_next_occurrence_is_past_end_date() {
        let mut rule = monthly_validated_rule(1);
        rule.end_date = Some(date!(2025 - 02 - 28));

        assert_eq!(
            recompute_cursor(&rule, Some(date!(2025 - 02 - 15)), true),
            Ok((date!(2025 - 03 - 15), false))
        );
    }

    #[test]
    fn paused_rule_stays_paused() {
        let rule = monthly_validated_rule(1);

        assert_eq!(
            recompute_cursor(&rule, None, false),
            Ok((date!(2025 - 01 - 15), false))
        );
    }
}
