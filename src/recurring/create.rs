//! The page and endpoint for creating a recurring rule.

use axum::{
    Extension, Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use rusqlite::Connection;

use crate::{
    Error, UserID,
    category::{Category, get_categories, get_category},
    endpoints,
    recurring::{
        RuleForm, ValidatedRule, ValidationErrors, create_rule,
        form::{FormAction, rule_form_view, rule_page_view},
        models::RecurringState,
        validate_rule,
        validation::fields,
    },
};

/// Render the page for creating a recurring rule.
pub async fn get_new_recurring_page(
    State(state): State<RecurringState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let categories = get_categories(user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve categories: {error}"))?;

    let form = rule_form_view(
        FormAction::Create,
        &RuleForm::default(),
        &categories,
        &ValidationErrors::default(),
    );

    Ok(rule_page_view("Create Recurring Transaction", endpoints::NEW_RECURRING_VIEW, form)
        .into_response())
}

/// Validate `form` and check that its category belongs to `owner_id`.
///
/// Returns the owner's categories alongside the errors so the form can be shown again.
pub(super) fn validate_for_owner(
    form: &RuleForm,
    owner_id: UserID,
    connection: &Connection,
) -> Result<Result<ValidatedRule, (ValidationErrors, Vec<Category>)>, Error> {
    let result = match validate_rule(form) {
        Ok(rule) => match get_category(rule.payload.category_id, owner_id, connection) {
            Ok(_) => Ok(rule),
            Err(Error::NotFound) => {
                let mut errors = ValidationErrors::default();
                errors.add(fields::CATEGORY_ID, "Choose a valid category");
                Err(errors)
            }
            Err(error) => return Err(error),
        },
        Err(errors) => Err(errors),
    };

    match result {
        Ok(rule) => Ok(Ok(rule)),
        Err(errors) => {
            let categories = get_categories(owner_id, connection)?;
            Ok(Err((errors, categories)))
        }
    }
}

/// Create a recurring rule from the submitted form.
///
/// Invalid input re-renders the form with a message for every invalid field.
pub async fn create_recurring_endpoint(
    State(state): State<RecurringState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<RuleForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let rule = match validate_for_owner(&form, user_id, &connection) {
        Ok(Ok(rule)) => rule,
        Ok(Err((errors, categories))) => {
            tracing::debug!("rejected recurring rule with {} invalid fields", errors.len());
            return rule_form_view(FormAction::Create, &form, &categories, &errors)
                .into_response();
        }
        Err(error) => {
            tracing::error!("could not validate recurring rule: {error}");
            return error.into_alert_response();
        }
    };

    match create_rule(user_id, &rule, &connection) {
        Ok(rule) => {
            tracing::info!(
                "created recurring rule {} for user {user_id}, first due {}",
                rule.id,
                rule.next_due_date
            );

            (
                HxRedirect(endpoints::RECURRING_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating a recurring rule: {error}");

            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod new_recurring_page_tests {
    use axum::{Extension, extract::State};

    use crate::{
        UserID,
        endpoints,
        recurring::{db::test_db::create_test_category, get_new_recurring_page, models::RecurringState},
        test_utils::{
            assert_form_input, assert_form_submit_button, assert_hx_endpoint, assert_select_options,
            assert_status_ok, assert_valid_html, get_test_app_state, must_get_form,
            parse_html_document,
        },
    };

    #[tokio::test]
    async fn render_page() {
        let state = get_test_app_state();
        let category_id = create_test_category(UserID::new(1), &state.db_connection.lock().unwrap());
        create_test_category(UserID::new(2), &state.db_connection.lock().unwrap());
        let state = RecurringState {
            db_connection: state.db_connection,
            local_timezone: state.local_timezone,
        };

        let response = get_new_recurring_page(State(state), Extension(UserID::new(1)))
            .await
            .expect("Could not render page");

        assert_status_ok(&response);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::POST_RECURRING, "hx-post");
        assert_form_input(&form, "description", "text");
        assert_form_input(&form, "amount", "number");
        assert_form_input(&form, "start_date", "date");
        assert_select_options(&form, "category_id", &["", &category_id.to_string()]);
        assert_select_options(
            &form,
            "frequency",
            &["", "daily", "weekly", "biweekly", "monthly", "quarterly", "yearly"],
        );
        assert_select_options(&form, "day_of_week", &["", "0", "1", "2", "3", "4", "5", "6"]);
        assert_form_submit_button(&form);
    }
}
