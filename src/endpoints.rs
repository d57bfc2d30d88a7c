//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/recurring/{rule_id}/edit', use [format_endpoint].

/// The root route which redirects to the recurring transactions page.
pub const ROOT: &str = "/";
/// The page listing a user's recurring rules.
pub const RECURRING_VIEW: &str = "/recurring";
/// The page for creating a new recurring rule.
pub const NEW_RECURRING_VIEW: &str = "/recurring/new";
/// The page for editing an existing recurring rule.
pub const EDIT_RECURRING_VIEW: &str = "/recurring/{rule_id}/edit";
/// The page for displaying a user's transactions.
pub const TRANSACTIONS_VIEW: &str = "/transactions";
/// The page for creating a new category.
pub const NEW_CATEGORY_VIEW: &str = "/categories/new";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The route to create a recurring rule.
pub const POST_RECURRING: &str = "/api/recurring";
/// The route to update a recurring rule.
pub const PUT_RECURRING: &str = "/api/recurring/{rule_id}";
/// The route to delete a recurring rule.
pub const DELETE_RECURRING: &str = "/api/recurring/{rule_id}";
/// The route to pause or resume a recurring rule.
pub const TOGGLE_RECURRING: &str = "/api/recurring/{rule_id}/toggle";
/// The route to create the pending transaction of a recurring rule right away.
pub const CREATE_NOW_RECURRING: &str = "/api/recurring/{rule_id}/create_now";
/// The route to create the transactions of every due recurring rule.
pub const PROCESS_DUE_RECURRING: &str = "/api/recurring/process_due";
/// The route to create a category.
pub const POST_CATEGORY: &str = "/api/categories";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/recurring/{rule_id}', '{rule_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_string();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|offset| param_start + offset + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
