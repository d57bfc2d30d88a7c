//! The identifier of the user that owns rules, categories and transactions.
//!
//! Users are managed by the external identity provider, this application only
//! ever sees the stable integer ID carried by the session token.

use std::fmt::Display;

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl ToSql for UserID {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        self.0.to_sql()
    }
}

impl FromSql for UserID {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        i64::column_result(value).map(UserID::new)
    }
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::UserID;

    #[test]
    fn round_trips_through_sqlite() {
        let connection = Connection::open_in_memory().unwrap();
        connection
            .execute("CREATE TABLE owner (id INTEGER NOT NULL)", ())
            .unwrap();

        connection
            .execute("INSERT INTO owner (id) VALUES (?1)", (UserID::new(42),))
            .unwrap();
        let got: UserID = connection
            .query_row("SELECT id FROM owner", [], |row| row.get(0))
            .unwrap();

        assert_eq!(got, UserID::new(42));
    }

    #[test]
    fn displays_as_integer() {
        assert_eq!(UserID::new(7).to_string(), "7");
    }
}
