//! Endpoints that create transactions from recurring rules on request.

use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;

use crate::{
    Error, UserID,
    alert::Alert,
    endpoints,
    recurring::{
        RuleId, get_rule,
        models::RecurringState,
        process::{CreateNowOutcome, ProcessSummary, create_now_in_db, process_due_rules_in_db},
    },
    timezone::local_today,
};

/// Create the transaction for a rule's pending occurrence right away.
///
/// Works for rules that do not auto-create and for occurrences that are not due yet.
pub async fn create_now_endpoint(
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
        Err(error) => {
            tracing::debug!("could not get rule {rule_id} for create now: {error}");
            return error.into_alert_response();
        }
    };

    match create_now_in_db(&rule, &connection) {
        Ok(CreateNowOutcome::Created {
            transaction_id,
            ended,
        }) => {
            tracing::info!(
                "created transaction {transaction_id} for {} of rule {rule_id}{}",
                rule.next_due_date,
                if ended { ", the rule has ended" } else { "" }
            );

            (
                HxRedirect(endpoints::RECURRING_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Ok(CreateNowOutcome::Conflict) => (
            StatusCode::CONFLICT,
            Alert::Error {
                message: "Recurring transaction changed".to_owned(),
                details: "It was updated while the transaction was being created. \
                    Refresh the page and try again."
                    .to_owned(),
            }
            .into_html(),
        )
            .into_response(),
        Err(error) => {
            tracing::error!("could not create transaction for rule {rule_id}: {error}");
            error.into_alert_response()
        }
    }
}

/// Create the transactions of every due auto-create rule of the user.
pub async fn process_due_endpoint(
    State(state): State<RecurringState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let today = match local_today(&state.local_timezone) {
        Ok(today) => today,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match process_due_rules_in_db(user_id, today, &connection) {
        Ok(summary) => {
            tracing::info!(
                "processed due rules of user {user_id} as of {today}: {} created, {} conflicts, {} ended",
                summary.created.len(),
                summary.conflicts,
                summary.ended
            );

            (StatusCode::OK, summary_alert(&summary).into_html()).into_response()
        }
        Err(error) => {
            tracing::error!("could not process due rules of user {user_id}: {error}");
            error.into_alert_response()
        }
    }
}

fn plural(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}

fn summary_alert(summary: &ProcessSummary) -> Alert {
    let created = summary.created.len();

    if created == 0 && summary.conflicts == 0 {
        return Alert::SuccessSimple {
            message: "No recurring transactions are due".to_owned(),
        };
    }

    let mut details = Vec::new();
    if summary.ended > 0 {
        details.push(format!(
            "{} reached {} end date.",
            plural(summary.ended, "recurring transaction", "recurring transactions"),
            if summary.ended == 1 { "its" } else { "their" }
        ));
    }
    if summary.conflicts > 0 {
        details.push(format!(
            "Skipped {} that changed during processing.",
            plural(summary.conflicts, "occurrence", "occurrences")
        ));
    }

    Alert::Success {
        message: format!("Created {}", plural(created, "transaction", "transactions")),
        details: details.join(" "),
    }
}
