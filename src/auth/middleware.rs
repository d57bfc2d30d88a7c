//! Authentication middleware that checks the auth cookie and redirects to sign in.

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use time::OffsetDateTime;

use crate::{
    AppState,
    auth::{cookie::authenticate, redirect::build_sign_in_redirect_url},
};

/// The state needed for the auth middleware
#[derive(Clone)]
pub struct AuthState {
    /// The key used to decrypt the private auth cookie.
    pub cookie_key: Key,
    /// Where users without a valid auth cookie are sent.
    pub sign_in_url: String,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            sign_in_url: state.sign_in_url.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_key.clone()
    }
}

#[inline]
async fn auth_guard_internal(
    state: AuthState,
    request: Request,
    next: Next,
    get_redirect: impl Fn(String) -> Response,
) -> Response {
    let redirect_url = build_sign_in_redirect_url(&state.sign_in_url, &request);

    let (mut parts, body) = request.into_parts();
    let jar = match PrivateCookieJar::from_request_parts(&mut parts, &state).await {
        Ok(jar) => jar,
        Err(err) => {
            tracing::error!("Error getting cookie jar: {err:?}. Redirecting to sign in.");
            return get_redirect(redirect_url);
        }
    };

    let user_id = match authenticate(&jar, OffsetDateTime::now_utc()) {
        Ok(user_id) => user_id,
        Err(error) => {
            tracing::debug!("Rejected request to {}: {error}", parts.uri);
            return get_redirect(redirect_url);
        }
    };

    parts.extensions.insert(user_id);
    next.run(Request::from_parts(parts, body)).await
}

/// Middleware function that checks for a valid auth cookie.
///
/// The user ID is placed into the request extensions if the cookie is valid,
/// otherwise a redirect to the sign-in page is returned.
///
/// **Note**: Route handlers can use the function argument `Extension(user_id): Extension<UserID>` to receive the user ID.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    auth_guard_internal(state, request, next, |redirect_url| {
        Redirect::to(&redirect_url).into_response()
    })
    .await
}

/// Like [auth_guard], but redirects with the `HX-Redirect` header for htmx requests.
pub async fn auth_guard_hx(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    auth_guard_internal(state, request, next, |redirect_url| {
        (HxRedirect(redirect_url), StatusCode::OK).into_response()
    })
    .await
}
