//! The page listing a user's transactions, including those created by recurring rules.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use unicode_segmentation::UnicodeSegmentation;

use crate::{
    AppState, Error, UserID,
    category::{CategoryId, get_categories},
    endpoints,
    html::{
        BADGE_MUTED_STYLE, BADGE_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, format_currency,
    },
    navigation::NavBar,
    transaction::{Transaction, get_transactions_for_owner},
};

/// The max number of graphemes to display in the transaction table rows before
/// truncating and displaying ellipses.
const MAX_DESCRIPTION_GRAPHEMES: usize = 32;

/// The state needed for the transactions page.
#[derive(Debug, Clone)]
pub struct TransactionsState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Route handler for the transactions page.
pub async fn get_transactions_page(
    State(state): State<TransactionsState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transactions = get_transactions_for_owner(user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve transactions: {error}"))?;
    let category_names: HashMap<CategoryId, String> = get_categories(user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve categories: {error}"))?
        .into_iter()
        .map(|category| (category.id, category.name.to_string()))
        .collect();

    Ok(transactions_view(&transactions, &category_names).into_response())
}

fn amount_class(amount: f64) -> &'static str {
    if amount < 0.0 {
        "text-red-700 dark:text-red-300"
    } else {
        "text-green-700 dark:text-green-300"
    }
}

fn format_description(description: &str) -> (String, Option<&str>) {
    let description_length = description.graphemes(true).count();

    if description_length <= MAX_DESCRIPTION_GRAPHEMES {
        (description.to_owned(), None)
    } else {
        let truncated: String = description
            .graphemes(true)
            .take(MAX_DESCRIPTION_GRAPHEMES - 3)
            .collect();
        (truncated + "...", Some(description))
    }
}

fn transaction_row_view(
    transaction: &Transaction,
    category_names: &HashMap<CategoryId, String>,
) -> Markup {
    let amount = transaction.signed_amount();
    let (description, tooltip) = format_description(&transaction.description);
    let category_name = transaction
        .category_id
        .and_then(|category_id| category_names.get(&category_id));

    html! {
        tr class=(TABLE_ROW_STYLE) data-transaction-id=(transaction.id)
        {
            td class=(TABLE_CELL_STYLE)
            {
                time datetime=(transaction.date) { (transaction.date) }
            }

            td class=(TABLE_CELL_STYLE) title=[tooltip]
            {
                (description)

                @if transaction.recurring_rule_id.is_some() {
                    " "
                    span class=(BADGE_STYLE) data-recurring { "Recurring" }
                }
            }

            td class=(TABLE_CELL_STYLE)
            {
                @if let Some(category_name) = category_name {
                    span class=(BADGE_MUTED_STYLE) { (category_name) }
                } @else {
                    span class="text-gray-400 dark:text-gray-500" { "-" }
                }
            }

            td class=(TABLE_CELL_STYLE)
            {
                (transaction.payment_method.as_deref().unwrap_or("-"))
            }

            td class={ "px-6 py-4 text-right " (amount_class(amount)) }
            {
                (format_currency(amount))
            }
        }
    }
}

fn transactions_view(
    transactions: &[Transaction],
    category_names: &HashMap<CategoryId, String>,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 lg:max-w-5xl lg:w-full lg:mx-auto dark:bg-gray-800"
            {
                h1 class="text-xl font-bold" { "Transactions" }

                div class="overflow-x-auto"
                {
                    table class="w-full text-sm text-left rtl:text-right
                        text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Payment Method" }
                                th scope="col" class="px-6 py-4 text-right" { "Amount" }
                            }
                        }

                        tbody
                        {
                            @for transaction in transactions {
                                (transaction_row_view(transaction, category_names))
                            }

                            @if transactions.is_empty() {
                                tr
                                {
                                    td
                                        colspan="5"
                                        class="px-6 py-4 text-center
                                            text-gray-500 dark:text-gray-400"
                                    {
                                        "No transactions yet. Transactions appear here when "
                                        a href=(endpoints::RECURRING_VIEW) class=(LINK_STYLE)
                                        {
                                            "recurring transactions"
                                        }
                                        " come due."
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    };

    base("Transactions", &[], &content)
}
