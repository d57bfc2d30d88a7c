//! The page listing a user's recurring rules.

use std::collections::HashMap;

use axum::{
    Extension,
    extract::State,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use time::Date;

use crate::{
    Error, UserID,
    category::{CategoryId, get_categories},
    endpoints::{self, format_endpoint},
    html::{
        BADGE_MUTED_STYLE, BADGE_STYLE, BADGE_WARNING_STYLE, BUTTON_DELETE_STYLE, LINK_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
        format_currency, loading_spinner,
    },
    navigation::NavBar,
    recurring::{RecurrenceRule, get_rules_for_owner, models::RecurringState},
    timezone::local_today,
    transaction::TransactionKind,
};

/// Route handler for the recurring rules page.
pub async fn get_recurring_page(
    State(state): State<RecurringState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let rules = get_rules_for_owner(user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve recurring rules: {error}"))?;
    let category_names: HashMap<CategoryId, String> = get_categories(user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve categories: {error}"))?
        .into_iter()
        .map(|category| (category.id, category.name.to_string()))
        .collect();

    let rows: Vec<RuleRowView> = rules
        .iter()
        .map(|rule| RuleRowView::new(rule, &category_names, today))
        .collect();

    Ok(recurring_view(&rows).into_response())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RuleStatus {
    Active,
    Paused,
    Ended,
}

/// Everything a table row shows about a rule.
struct RuleRowView<'a> {
    rule: &'a RecurrenceRule,
    category_name: &'a str,
    schedule_label: String,
    status: RuleStatus,
    is_overdue: bool,
    edit_url: String,
    toggle_url: String,
    create_now_url: String,
    delete_url: String,
}

impl<'a> RuleRowView<'a> {
    fn new(
        rule: &'a RecurrenceRule,
        category_names: &'a HashMap<CategoryId, String>,
        today: Date,
    ) -> Self {
        let status = if rule.has_ended() {
            RuleStatus::Ended
        } else if rule.is_active {
            RuleStatus::Active
        } else {
            RuleStatus::Paused
        };

        Self {
            rule,
            category_name: category_names
                .get(&rule.payload.category_id)
                .map(String::as_str)
                .unwrap_or("Unknown"),
            schedule_label: rule.schedule_label(),
            status,
            is_overdue: status == RuleStatus::Active && rule.next_due_date < today,
            edit_url: format_endpoint(endpoints::EDIT_RECURRING_VIEW, rule.id),
            toggle_url: format_endpoint(endpoints::TOGGLE_RECURRING, rule.id),
            create_now_url: format_endpoint(endpoints::CREATE_NOW_RECURRING, rule.id),
            delete_url: format_endpoint(endpoints::DELETE_RECURRING, rule.id),
        }
    }
}

fn signed_amount(rule: &RecurrenceRule) -> f64 {
    match rule.payload.kind {
        TransactionKind::Income => rule.payload.amount,
        TransactionKind::Expense => -rule.payload.amount,
    }
}

fn status_badge(status: RuleStatus) -> Markup {
    match status {
        RuleStatus::Active => html!(span class=(BADGE_STYLE) data-status="active" { "Active" }),
        RuleStatus::Paused => {
            html!(span class=(BADGE_MUTED_STYLE) data-status="paused" { "Paused" })
        }
        RuleStatus::Ended => html!(span class=(BADGE_MUTED_STYLE) data-status="ended" { "Ended" }),
    }
}

fn actions_view(row: &RuleRowView, target: &str, swap: &str) -> Markup {
    let description = &row.rule.payload.description;

    html!(
        a href=(row.edit_url) class=(LINK_STYLE) { "Edit" }

        @if row.status != RuleStatus::Ended {
            button
                hx-post=(row.toggle_url)
                hx-target-error="#alert-container"
                class=(LINK_STYLE)
            {
                @if row.rule.is_active { "Pause" } @else { "Resume" }
            }
        }

        @if row.status == RuleStatus::Active {
            button
                hx-post=(row.create_now_url)
                hx-confirm={
                    "Create the transaction for '" (description) "' due on "
                    (row.rule.next_due_date) " now?"
                }
                hx-target-error="#alert-container"
                class=(LINK_STYLE)
            {
                "Create now"
            }
        }

        button
            hx-delete=(row.delete_url)
            hx-confirm={
                "Are you sure you want to delete the recurring transaction '"
                (description) "'? Transactions it already created are kept."
            }
            hx-target=(target)
            hx-target-error="#alert-container"
            hx-swap=(swap)
            class=(BUTTON_DELETE_STYLE)
        {
            "Delete"
        }
    )
}

fn next_due_view(row: &RuleRowView) -> Markup {
    html!(
        @if row.status == RuleStatus::Ended {
            "-"
        } @else {
            time datetime=(row.rule.next_due_date) { (row.rule.next_due_date) }

            @if row.is_overdue {
                " "
                span class=(BADGE_WARNING_STYLE) data-overdue { "Overdue" }
            }
        }
    )
}

fn recurring_view(rows: &[RuleRowView]) -> Markup {
    let nav_bar = NavBar::new(endpoints::RECURRING_VIEW).into_html();
    let spinner = loading_spinner();
    let new_rule_route = endpoints::NEW_RECURRING_VIEW;

    let table_row = |row: &RuleRowView| {
        html!(
            tr class=(TABLE_ROW_STYLE) data-rule-id=(row.rule.id)
            {
                td class=(TABLE_CELL_STYLE)
                {
                    div class="font-medium text-gray-900 dark:text-white"
                    {
                        (row.rule.payload.description)
                    }

                    div class="text-xs" { (row.category_name) }
                }

                td class="px-6 py-4 text-right" { (format_currency(signed_amount(row.rule))) }

                td class=(TABLE_CELL_STYLE) { (row.schedule_label) }

                td class=(TABLE_CELL_STYLE) { (next_due_view(row)) }

                td class=(TABLE_CELL_STYLE)
                {
                    (status_badge(row.status))

                    @if !row.rule.auto_create {
                        " "
                        span class=(BADGE_MUTED_STYLE) { "Manual" }
                    }
                }

                td class=(TABLE_CELL_STYLE)
                {
                    div class="flex gap-4" { (actions_view(row, "closest tr", "delete")) }
                }
            }
        )
    };

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 lg:max-w-6xl lg:w-full lg:mx-auto"
            {
                h1 class="text-xl font-bold" { "Recurring Transactions" }

                header class="flex justify-between flex-wrap items-end gap-4"
                {
                    a href=(new_rule_route) class=(LINK_STYLE) { "Create Recurring Transaction" }

                    @if rows.iter().any(|row| row.status == RuleStatus::Active) {
                        button
                            hx-post=(endpoints::PROCESS_DUE_RECURRING)
                            hx-indicator="#process-due-indicator"
                            hx-target="#alert-container"
                            hx-target-error="#alert-container"
                            hx-swap="outerHTML"
                            class="px-4 py-2 bg-blue-600 hover:bg-blue-700
                                active:enabled:bg-blue-800 disabled:opacity-50
                                text-white text-sm font-medium rounded transition-colors
                                focus:outline-hidden
                                focus:ring-2 focus:ring-blue-500 focus:ring-offset-2
                                flex items-center"
                        {
                            span
                                id="process-due-indicator"
                                class="htmx-indicator"
                                style="display: none;"
                            {
                                (spinner)
                            }

                            span class="button-text" { "Create Due Transactions" }
                        }
                    }
                }

                ul class="lg:hidden space-y-4"
                {
                    @for row in rows {
                        li class="rounded border border-gray-200 bg-white px-4 py-3 shadow-sm dark:border-gray-700 dark:bg-gray-800"
                            data-rule-card="true"
                        {
                            div class="flex items-start justify-between gap-3"
                            {
                                span class="font-medium" { (row.rule.payload.description) }
                                span { (format_currency(signed_amount(row.rule))) }
                            }

                            p class="mt-1 text-sm text-gray-500 dark:text-gray-400"
                            {
                                (row.schedule_label) ", next " (next_due_view(row))
                            }

                            div class="mt-2 flex items-center gap-4 text-sm"
                            {
                                (status_badge(row.status))
                                (actions_view(row, "closest [data-rule-card='true']", "outerHTML"))
                            }
                        }
                    }
                }

                section class="hidden lg:block dark:bg-gray-800"
                {
                    table class="w-full text-sm text-left rtl:text-right
                        text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                                th scope="col" class="px-6 py-4 text-right" { "Amount" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Schedule" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Next Due" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Status" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for row in rows {
                                (table_row(row))
                            }

                            @if rows.is_empty() {
                                tr
                                {
                                    td
                                        colspan="6"
                                        class="px-6 py-4 text-center
                                            text-gray-500 dark:text-gray-400"
                                    {
                                        "No recurring transactions yet. "
                                        a href=(new_rule_route) class=(LINK_STYLE)
                                        {
                                            "Create your first recurring transaction"
                                        }
                                        " to stop entering the same bills by hand."
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    );

    base("Recurring Transactions", &[], &content)
}

#[cfg(test)]
mod tests {
    use axum::{Extension, extract::State};
    use scraper::{Html, Selector};
    use time::macros::date;

    use crate::{
        UserID,
        endpoints::{self, format_endpoint},
        recurring::{
            create_rule, db::test_db::*, models::RecurringState, set_rule_active,
            update_rule,
        },
        test_utils::{
            assert_content_type, assert_status_ok, assert_valid_html, get_test_app_state,
            parse_html_document, select_texts,
        },
    };

    use super::get_recurring_page;

    const OWNER: UserID = UserID::new(1);

    fn get_state() -> RecurringState {
        let state = get_test_app_state();

        RecurringState {
            db_connection: state.db_connection,
            local_timezone: state.local_timezone,
        }
    }

    async fn render_page(state: &RecurringState, user_id: UserID) -> Html {
        let response = get_recurring_page(State(state.clone()), Extension(user_id))
            .await
            .expect("Could not render recurring page");

        assert_status_ok(&response);
        assert_content_type(&response, "text/html; charset=utf-8");
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        html
    }

    #[track_caller]
    fn count(html: &Html, selector: &str) -> usize {
        let selector = Selector::parse(selector).unwrap();
        html.select(&selector).count()
    }

    #[tokio::test]
    async fn shows_empty_state_without_rules() {
        let state = get_state();

        let html = render_page(&state, OWNER).await;

        assert_eq!(count(&html, "tbody tr[data-rule-id]"), 0);
        let empty_row = select_texts(&html, "tbody td[colspan]");
        assert_eq!(empty_row.len(), 1);
        assert!(empty_row[0].starts_with("No recurring transactions yet."));
        assert_eq!(
            count(&html, &format!("button[hx-post='{}']", endpoints::PROCESS_DUE_RECURRING)),
            0
        );
    }

    #[tokio::test]
    async fn shows_rule_with_overdue_marker_and_actions() {
        let state = get_state();
        let rule = insert_monthly_rule(OWNER, &state.db_connection.lock().unwrap());

        let html = render_page(&state, OWNER).await;

        let row_selector = format!("tr[data-rule-id='{}']", rule.id);
        let cells = select_texts(&html, &format!("{row_selector} td"));
        assert_eq!(
            select_texts(&html, &format!("{row_selector} td:first-child div")),
            vec!["Rent".to_owned(), "Bills 1".to_owned()]
        );
        assert_eq!(cells[1], "-$450.00");
        assert_eq!(cells[2], "Every month on day 15");
        assert_eq!(cells[3], "2025-01-15 Overdue");
        assert_eq!(cells[4], "Active");
        assert_eq!(count(&html, &format!("{row_selector} [data-overdue]")), 1);

        for (attribute, endpoint) in [
            ("href", endpoints::EDIT_RECURRING_VIEW),
            ("hx-post", endpoints::TOGGLE_RECURRING),
            ("hx-post", endpoints::CREATE_NOW_RECURRING),
            ("hx-delete", endpoints::DELETE_RECURRING),
        ] {
            let url = format_endpoint(endpoint, rule.id);
            assert_eq!(
                count(&html, &format!("{row_selector} [{attribute}='{url}']")),
                1,
                "want one {attribute}={url} in row"
            );
        }
        assert_eq!(
            count(&html, &format!("button[hx-post='{}']", endpoints::PROCESS_DUE_RECURRING)),
            1
        );
    }

    #[tokio::test]
    async fn future_rule_is_not_overdue() {
        let state = get_state();
        let rule = {
            let connection = state.db_connection.lock().unwrap();
            let category_id = create_test_category(OWNER, &connection);
            let mut validated = monthly_validated_rule(category_id);
            validated.start_date = date!(2999 - 01 - 15);
            validated.first_occurrence = date!(2999 - 01 - 15);
            create_rule(OWNER, &validated, &connection).unwrap()
        };

        let html = render_page(&state, OWNER).await;

        assert_eq!(
            count(&html, &format!("tr[data-rule-id='{}'] [data-overdue]", rule.id)),
            0
        );
    }

    #[tokio::test]
    async fn paused_rule_can_be_resumed_but_not_created_now() {
        let state = get_state();
        let rule = {
            let connection = state.db_connection.lock().unwrap();
            let rule = insert_monthly_rule(OWNER, &connection);
            set_rule_active(rule.id, OWNER, false, &connection).unwrap();
            rule
        };

        let html = render_page(&state, OWNER).await;

        let row_selector = format!("tr[data-rule-id='{}']", rule.id);
        assert_eq!(count(&html, &format!("{row_selector} [data-status=paused]")), 1);
        assert_eq!(count(&html, &format!("{row_selector} [data-overdue]")), 0);
        let toggle = format_endpoint(endpoints::TOGGLE_RECURRING, rule.id);
        assert_eq!(
            select_texts(&html, &format!("{row_selector} button[hx-post='{toggle}']")),
            vec!["Resume".to_owned()]
        );
        let create_now = format_endpoint(endpoints::CREATE_NOW_RECURRING, rule.id);
        assert_eq!(count(&html, &format!("[hx-post='{create_now}']")), 0);
    }

    #[tokio::test]
    async fn ended_rule_has_no_toggle() {
        let state = get_state();
        let rule = {
            let connection = state.db_connection.lock().unwrap();
            let rule = insert_monthly_rule(OWNER, &connection);
            let mut validated = monthly_validated_rule(rule.payload.category_id);
            validated.end_date = Some(date!(2025 - 01 - 31));
            update_rule(
                rule.id,
                OWNER,
                &validated,
                date!(2025 - 02 - 15),
                false,
                &connection,
            )
            .unwrap();
            rule
        };

        let html = render_page(&state, OWNER).await;

        let row_selector = format!("tr[data-rule-id='{}']", rule.id);
        assert_eq!(count(&html, &format!("{row_selector} [data-status=ended]")), 1);
        let toggle = format_endpoint(endpoints::TOGGLE_RECURRING, rule.id);
        assert_eq!(count(&html, &format!("[hx-post='{toggle}']")), 0);
    }

    #[tokio::test]
    async fn does_not_show_rules_of_other_owners() {
        let state = get_state();
        insert_monthly_rule(UserID::new(2), &state.db_connection.lock().unwrap());

        let html = render_page(&state, OWNER).await;

        assert_eq!(count(&html, "tbody tr[data-rule-id]"), 0);
        assert_eq!(count(&html, "[data-rule-card]"), 0);
    }
}
