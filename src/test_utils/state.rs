use rusqlite::Connection;

use crate::AppState;

pub(crate) const TEST_SIGN_IN_URL: &str = "https://id.example.com/sign_in";

/// An [AppState] backed by an initialized in-memory database.
pub(crate) fn get_test_app_state() -> AppState {
    let connection =
        Connection::open_in_memory().expect("Could not open in-memory SQLite database");

    AppState::new(connection, "averysecretsecret", "Etc/UTC", TEST_SIGN_IN_URL)
        .expect("Could not create app state")
}
