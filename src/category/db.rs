//! Database operations for categories.

use rusqlite::{Connection, Row};

use crate::{
    Error, UserID,
    category::{Category, CategoryId, CategoryName},
};

/// Create a category for `owner_id` and return it with its generated ID.
///
/// # Errors
///
/// Returns [Error::DuplicateCategoryName] if the owner already has a category with this name.
pub fn create_category(
    owner_id: UserID,
    name: CategoryName,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .execute(
            "INSERT INTO category (owner_id, name) VALUES (?1, ?2);",
            (owner_id, name.as_ref()),
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                _,
            ) => Error::DuplicateCategoryName(name.to_string()),
            error => error.into(),
        })?;

    let id = connection.last_insert_rowid();

    Ok(Category { id, owner_id, name })
}

/// Retrieve a single category of `owner_id` by ID.
///
/// Categories of other owners are reported as [Error::NotFound].
pub fn get_category(
    category_id: CategoryId,
    owner_id: UserID,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .prepare("SELECT id, owner_id, name FROM category WHERE id = ?1 AND owner_id = ?2;")?
        .query_row((category_id, owner_id), map_row)
        .map_err(|error| error.into())
}

/// Retrieve the categories of `owner_id` ordered alphabetically by name.
pub fn get_categories(owner_id: UserID, connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare("SELECT id, owner_id, name FROM category WHERE owner_id = ?1 ORDER BY name ASC;")?
        .query_map((owner_id,), map_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Initialize the category table and indexes.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            owner_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            UNIQUE(owner_id, name)
        );

        CREATE INDEX IF NOT EXISTS idx_category_owner ON category(owner_id, name);",
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let id = row.get(0)?;
    let owner_id = row.get(1)?;
    let raw_name: String = row.get(2)?;
    let name = CategoryName::new_unchecked(&raw_name);

    Ok(Category { id, owner_id, name })
}

#[cfg(test)]
mod category_name_tests {
    use crate::{Error, category::CategoryName};

    #[test]
    fn new_fails_on_empty_string() {
        let name = CategoryName::new("");

        assert_eq!(name, Err(Error::EmptyCategoryName));
    }

    #[test]
    fn new_fails_on_just_whitespace() {
        let name = CategoryName::new("\n\t \r");

        assert_eq!(name, Err(Error::EmptyCategoryName));
    }

    #[test]
    fn new_trims_whitespace() {
        let name = CategoryName::new("  Rent ");

        assert_eq!(name, Ok(CategoryName::new_unchecked("Rent")));
    }
}

#[cfg(test)]
mod category_query_tests {
    use rusqlite::Connection;

    use crate::{
        Error, UserID,
        category::{CategoryName, create_category, get_categories, get_category},
    };

    use super::create_category_table;

    fn get_test_db_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        create_category_table(&connection).expect("Could not create category table");
        connection
    }

    #[test]
    fn create_category_succeeds() {
        let connection = get_test_db_connection();
        let name = CategoryName::new("Groceries").unwrap();

        let category = create_category(UserID::new(1), name.clone(), &connection)
            .expect("Could not create category");

        assert!(category.id > 0);
        assert_eq!(category.name, name);
        assert_eq!(category.owner_id, UserID::new(1));
    }

    #[test]
    fn create_category_fails_on_duplicate_name_for_same_owner() {
        let connection = get_test_db_connection();
        let name = CategoryName::new_unchecked("Rent");
        create_category(UserID::new(1), name.clone(), &connection).unwrap();

        let result = create_category(UserID::new(1), name, &connection);

        assert_eq!(result, Err(Error::DuplicateCategoryName("Rent".to_owned())));
    }

    #[test]
    fn same_name_is_allowed_for_different_owners() {
        let connection = get_test_db_connection();
        let name = CategoryName::new_unchecked("Rent");
        create_category(UserID::new(1), name.clone(), &connection).unwrap();

        let result = create_category(UserID::new(2), name, &connection);

        assert!(result.is_ok());
    }

    #[test]
    fn get_category_of_other_owner_returns_not_found() {
        let connection = get_test_db_connection();
        let category =
            create_category(UserID::new(1), CategoryName::new_unchecked("Foo"), &connection)
                .unwrap();

        assert_eq!(
            get_category(category.id, UserID::new(1), &connection),
            Ok(category.clone())
        );
        assert_eq!(
            get_category(category.id, UserID::new(2), &connection),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn get_categories_is_sorted_and_scoped_to_owner() {
        let connection = get_test_db_connection();
        for name in ["Salary", "Groceries", "Rent"] {
            create_category(UserID::new(1), CategoryName::new_unchecked(name), &connection)
                .unwrap();
        }
        create_category(UserID::new(2), CategoryName::new_unchecked("Other"), &connection)
            .unwrap();

        let names: Vec<String> = get_categories(UserID::new(1), &connection)
            .unwrap()
            .into_iter()
            .map(|category| category.name.to_string())
            .collect();

        assert_eq!(names, vec!["Groceries", "Rent", "Salary"]);
    }
}
