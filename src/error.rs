//! Defines the app level error type and conversions to rendered HTML pages and alerts.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    alert::Alert, category::CategoryId, internal_server_error::InternalServerError,
    not_found::NotFoundError, recurring::InvalidRuleError,
};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The auth cookie is missing from the cookie jar in the request.
    #[error("no cookies in the cookie jar :(")]
    CookieMissing,

    /// The auth cookie could not be decoded into a token.
    #[error("invalid auth token: {0}")]
    InvalidToken(String),

    /// The auth token has expired and the user must sign in again.
    #[error("the auth token has expired")]
    SessionExpired,

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// A stored recurring rule does not describe a valid schedule.
    ///
    /// Forms are validated before rules are stored, so this indicates a bug
    /// or a database that was edited by hand.
    #[error("invalid recurring rule: {0}")]
    InvalidRule(#[from] InvalidRuleError),

    /// Tried to create a transaction from a paused or ended rule.
    #[error("the recurring rule is not active")]
    RuleInactive,

    /// Tried to resume a rule that is past its end date.
    #[error("the recurring rule has ended")]
    RuleEnded,

    /// Tried to update a rule that does not exist
    #[error("tried to update a rule that is not in the database")]
    UpdateMissingRule,

    /// Tried to delete a rule that does not exist
    #[error("tried to delete a rule that is not in the database")]
    DeleteMissingRule,

    /// The category ID did not match a category of the user.
    #[error("the category ID does not refer to a valid category")]
    InvalidCategory(Option<CategoryId>),

    /// An empty string was used to create a category name.
    #[error("Category name cannot be empty")]
    EmptyCategoryName,

    /// The user already has a category with this name.
    #[error("the category \"{0}\" already exists")]
    DuplicateCategoryName(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => NotFoundError.into_response(),
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "Invalid Timezone Settings",
                fix: &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            }
            .into_response(),
            Error::InvalidRule(_) => InternalServerError {
                description: "Invalid Recurring Transaction",
                fix: "A recurring transaction has an invalid schedule. Check the server logs for details.",
            }
            .into_response(),
            Error::DatabaseLockError => InternalServerError::default().into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    /// Convert the error into an HTTP response with an HTML alert.
    pub fn into_alert_response(self) -> Response {
        let (status_code, alert) = match self {
            Error::InvalidTimezoneError(timezone) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Invalid Timezone Settings".to_owned(),
                    details: format!(
                        "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                    ),
                },
            ),
            Error::NotFound => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Not found".to_owned(),
                    details: "The recurring transaction could not be found. \
                    Try refreshing the page to see if it has been deleted."
                        .to_owned(),
                },
            ),
            Error::InvalidCategory(category_id) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid category".to_owned(),
                    details: match category_id {
                        Some(id) => format!("Could not find a category with the ID {id}"),
                        None => "Choose a category for the transaction.".to_owned(),
                    },
                },
            ),
            Error::InvalidRule(error) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Invalid recurring transaction".to_owned(),
                    details: format!("The stored schedule is invalid: {error}"),
                },
            ),
            Error::RuleInactive => (
                StatusCode::CONFLICT,
                Alert::Error {
                    message: "Recurring transaction is paused".to_owned(),
                    details: "Resume the recurring transaction before creating its next transaction."
                        .to_owned(),
                },
            ),
            Error::RuleEnded => (
                StatusCode::CONFLICT,
                Alert::Error {
                    message: "Recurring transaction has ended".to_owned(),
                    details: "Every transaction up to the end date has been created. \
                    Move the end date later, then resume it."
                        .to_owned(),
                },
            ),
            Error::UpdateMissingRule => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not update recurring transaction".to_owned(),
                    details: "The recurring transaction could not be found.".to_owned(),
                },
            ),
            Error::DeleteMissingRule => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not delete recurring transaction".to_owned(),
                    details: "The recurring transaction could not be found. \
                    Try refreshing the page to see if it has already been deleted."
                        .to_owned(),
                },
            ),
            Error::DuplicateCategoryName(name) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Duplicate Category Name".to_owned(),
                    details: format!(
                        "The category {name} already exists. Choose a different category name."
                    ),
                },
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Something went wrong".to_owned(),
                    details:
                        "An unexpected error occurred, check the server logs for more details."
                            .to_owned(),
                },
            ),
        };

        (status_code, alert.into_html()).into_response()
    }
}
