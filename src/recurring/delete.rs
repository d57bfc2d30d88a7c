//! The endpoint that deletes recurring rules.

use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    Error, UserID,
    alert::Alert,
    recurring::{RuleId, delete_rule, models::RecurringState},
};

/// Delete a recurring rule. The transactions it created are kept.
pub async fn delete_recurring_endpoint(
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

    match delete_rule(rule_id, user_id, &connection) {
        Ok(()) => {
            tracing::info!("deleted recurring rule {rule_id}");

            (
                StatusCode::OK,
                Alert::SuccessSimple {
                    message: "Recurring transaction deleted successfully".to_owned(),
                }
                .into_html(),
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!("could not delete rule {rule_id}: {error}");
            error.into_alert_response()
        }
    }
}
