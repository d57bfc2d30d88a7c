//! The endpoint that pauses and resumes recurring rules.

use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;

use crate::{
    Error, UserID, endpoints,
    recurring::{RuleId, get_rule, models::RecurringState, set_rule_active},
};

/// Pause an active rule or resume a paused one.
///
/// A rule that has materialized every occurrence up to its end date cannot be resumed.
pub async fn toggle_recurring_endpoint(
    State(state): State<RecurringState>,
    Extension(user_id): Extension<UserID>,
    Path(rule_id): Path<RuleId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let rule = match get_rule(rule_id, user_id, &connection) {
        Ok(rule) => rule,
        Err(Error::NotFound) => return Error::UpdateMissingRule.into_alert_response(),
        Err(error) => {
            tracing::error!("could not get rule {rule_id}: {error}");
            return error.into_alert_response();
        }
    };

    if rule.has_ended() {
        return Error::RuleEnded.into_alert_response();
    }

    let is_active = !rule.is_active;

    match set_rule_active(rule_id, user_id, is_active, &connection) {
        Ok(()) => {
            tracing::info!(
                "{} recurring rule {rule_id}",
                if is_active { "resumed" } else { "paused" }
            );

            (
                HxRedirect(endpoints::RECURRING_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!("could not toggle rule {rule_id}: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
    };
    use time::macros::date;

    use crate::{
        UserID, endpoints,
        recurring::{
            db::test_db::{insert_monthly_rule, monthly_validated_rule},
            get_rule,
            models::RecurringState,
            update_rule,
        },
        test_utils::{
            assert_alert_message, assert_hx_redirect, get_test_app_state, parse_html_fragment,
        },
    };

    use super::toggle_recurring_endpoint;

    const OWNER: UserID = UserID::new(1);

    fn get_state() -> RecurringState {
        let state = get_test_app_state();

        RecurringState {
            db_connection: state.db_connection,
            local_timezone: state.local_timezone,
        }
    }

    #[tokio::test]
    async fn pauses_then_resumes_rule() {
        let state = get_state();
        let rule = insert_monthly_rule(OWNER, &state.db_connection.lock().unwrap());

        let response =
            toggle_recurring_endpoint(State(state.clone()), Extension(OWNER), Path(rule.id)).await;

        assert_hx_redirect(&response, endpoints::RECURRING_VIEW);
        let paused = get_rule(rule.id, OWNER, &state.db_connection.lock().unwrap()).unwrap();
        assert!(!paused.is_active);
        assert_eq!(paused.next_due_date, rule.next_due_date);

        toggle_recurring_endpoint(State(state.clone()), Extension(OWNER), Path(rule.id)).await;

        let resumed = get_rule(rule.id, OWNER, &state.db_connection.lock().unwrap()).unwrap();
        assert!(resumed.is_active);
    }

    #[tokio::test]
    async fn ended_rule_cannot_be_resumed() {
        let state = get_state();
        let rule = {
            let connection = state.db_connection.lock().unwrap();
            let rule = insert_monthly_rule(OWNER, &connection);
            let mut validated = monthly_validated_rule(rule.payload.category_id);
            validated.end_date = Some(date!(2025 - 01 - 31));
            update_rule(rule.id, OWNER, &validated, date!(2025 - 02 - 15), false, &connection)
                .unwrap();
            rule
        };

        let response =
            toggle_recurring_endpoint(State(state.clone()), Extension(OWNER), Path(rule.id)).await;

        assert_eq!(response.status(), StatusCode::CONFLICT);
        let html = parse_html_fragment(response).await;
        assert_alert_message(&html, "Recurring transaction has ended");
        let unchanged = get_rule(rule.id, OWNER, &state.db_connection.lock().unwrap()).unwrap();
        assert!(!unchanged.is_active);
    }

    #[tokio::test]
    async fn rule_of_another_owner_is_not_found() {
        let state = get_state();
        let rule = insert_monthly_rule(UserID::new(2), &state.db_connection.lock().unwrap());

        let response =
            toggle_recurring_endpoint(State(state.clone()), Extension(OWNER), Path(rule.id)).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let unchanged =
            get_rule(rule.id, UserID::new(2), &state.db_connection.lock().unwrap()).unwrap();
        assert!(unchanged.is_active);
    }
}
