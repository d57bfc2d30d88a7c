//! Categories that transactions and recurring rules are filed under.

mod create;
mod db;
mod domain;

pub use create::{create_category_endpoint, get_new_category_page};
pub use db::{create_category, create_category_table, get_categories, get_category};
pub use domain::{Category, CategoryId, CategoryName};
