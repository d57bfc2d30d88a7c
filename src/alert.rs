//! Alert messages that htmx swaps into the page's alert container.

use axum::response::{Html, IntoResponse, Response};
use maud::{Markup, html};

/// A dismissable success or error message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Alert {
    Success { message: String, details: String },
    SuccessSimple { message: String },
    Error { message: String, details: String },
}

impl Alert {
    pub fn into_html(self) -> Markup {
        let (is_error, message, details) = match self {
            Alert::Success { message, details } => (false, message, details),
            Alert::SuccessSimple { message } => (false, message, String::new()),
            Alert::Error { message, details } => (true, message, details),
        };

        let style = if is_error {
            "flex items-start gap-3 p-4 mb-4 rounded-lg border text-red-800 \
            border-red-300 bg-red-50 dark:bg-gray-800 dark:text-red-400 \
            dark:border-red-800"
        } else {
            "flex items-start gap-3 p-4 mb-4 rounded-lg border text-green-800 \
            border-green-300 bg-green-50 dark:bg-gray-800 dark:text-green-400 \
            dark:border-green-800"
        };

        html! {
            div
                id="alert-container"
                class="w-full max-w-md px-4"
                style="position: fixed; bottom: 1rem; left: 50%; transform: translateX(-50%); z-index: 9999;"
            {
                div
                    role="alert"
                    data-alert=(if is_error { "error" } else { "success" })
                    class=(style)
                {
                    div class="flex-1"
                    {
                        p class="font-medium" data-alert-message { (message) }

                        @if !details.is_empty() {
                            p class="text-sm" { (details) }
                        }
                    }

                    button
                        type="button"
                        aria-label="Dismiss"
                        class="ms-auto -mx-1.5 -my-1.5 rounded-lg p-1.5 hover:opacity-75"
                        onclick="this.closest('[role=alert]').remove()"
                    {
                        "×"
                    }
                }
            }
        }
    }
}

impl IntoResponse for Alert {
    fn into_response(self) -> Response {
        Html(self.into_html().into_string()).into_response()
    }
}
