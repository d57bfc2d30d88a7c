//! Building the sign-in URL that brings the user back to the page they wanted.

use axum::{extract::Request, http::Uri};
use tracing::{error, warn};

use crate::endpoints;

fn is_safe_redirect_url(redirect_url: &str) -> bool {
    redirect_url.starts_with('/') && !redirect_url.starts_with("//")
}

/// The path and query of `raw_url` if it stays on this site.
pub fn normalize_redirect_url(raw_url: &str) -> Option<String> {
    let uri = raw_url.parse::<Uri>().ok()?;
    let path_and_query = uri.path_and_query()?.as_str();

    is_safe_redirect_url(path_and_query).then(|| path_and_query.to_owned())
}

/// `sign_in_url` with a `redirect_url` query parameter for the page of `request`.
///
/// API requests made by htmx are sent back to the page they were made from.
/// Falls back to the home page if no safe target can be found.
pub fn build_sign_in_redirect_url(sign_in_url: &str, request: &Request) -> String {
    let redirect_target = if request.uri().path().starts_with("/api") {
        redirect_target_from_hx_request(request)
    } else {
        request
            .uri()
            .path_and_query()
            .and_then(|path_and_query| normalize_redirect_url(path_and_query.as_str()))
    };

    let redirect_target = redirect_target.unwrap_or_else(|| {
        warn!(
            "No safe redirect target for {}. Falling back to {}.",
            request.uri(),
            endpoints::ROOT
        );
        endpoints::ROOT.to_owned()
    });

    build_sign_in_redirect_url_from_target(sign_in_url, &redirect_target)
}

fn build_sign_in_redirect_url_from_target(sign_in_url: &str, redirect_target: &str) -> String {
    match serde_urlencoded::to_string([("redirect_url", redirect_target)]) {
        Ok(param) => format!("{sign_in_url}?{param}"),
        Err(error) => {
            error!("Could not encode redirect URL {redirect_target}: {error}");
            sign_in_url.to_owned()
        }
    }
}

fn redirect_target_from_hx_request(request: &Request) -> Option<String> {
    let headers = request.headers();
    let is_hx_request = headers
        .get("hx-request")
        .and_then(|header| header.to_str().ok())
        .is_some_and(|header| header.eq_ignore_ascii_case("true"));

    if !is_hx_request {
        warn!("Missing HX-Request header for /api request.");
        return None;
    }

    let current_url = headers
        .get("hx-current-url")
        .and_then(|header| header.to_str().ok())?;

    normalize_redirect_url(current_url)
}
