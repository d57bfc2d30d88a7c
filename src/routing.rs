//! This file defines the routes for the web app.

use axum::{
    Router, middleware,
    response::Redirect,
    routing::{delete, get, post, put},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    auth::{auth_guard, auth_guard_hx},
    category::{create_category_endpoint, get_new_category_page},
    endpoints,
    internal_server_error::get_internal_server_error_page,
    not_found::get_404_not_found,
    recurring::{
        create_now_endpoint, create_recurring_endpoint, delete_recurring_endpoint,
        get_edit_recurring_page, get_new_recurring_page, get_recurring_page, process_due_endpoint,
        toggle_recurring_endpoint, update_recurring_endpoint,
    },
    transaction::get_transactions_page,
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new().route(
        endpoints::INTERNAL_ERROR_VIEW,
        get(get_internal_server_error_page),
    );

    let protected_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::RECURRING_VIEW, get(get_recurring_page))
        .route(endpoints::NEW_RECURRING_VIEW, get(get_new_recurring_page))
        .route(endpoints::EDIT_RECURRING_VIEW, get(get_edit_recurring_page))
        .route(endpoints::TRANSACTIONS_VIEW, get(get_transactions_page))
        .route(endpoints::NEW_CATEGORY_VIEW, get(get_new_category_page))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    // These POST/PUT/DELETE routes need to use HX-REDIRECT for auth redirects to work properly for
    // HTMX requests.
    let protected_routes = protected_routes.merge(
        Router::new()
            .route(endpoints::POST_RECURRING, post(create_recurring_endpoint))
            .route(endpoints::PUT_RECURRING, put(update_recurring_endpoint))
            .route(endpoints::DELETE_RECURRING, delete(delete_recurring_endpoint))
            .route(endpoints::TOGGLE_RECURRING, post(toggle_recurring_endpoint))
            .route(endpoints::CREATE_NOW_RECURRING, post(create_now_endpoint))
            .route(endpoints::PROCESS_DUE_RECURRING, post(process_due_endpoint))
            .route(endpoints::POST_CATEGORY, post(create_category_endpoint))
            .layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx)),
    );

    protected_routes
        .merge(unprotected_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// Redirect the user to the recurring transactions page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::RECURRING_VIEW)
}
