//! The form shared by the create and edit recurring rule pages.

use maud::{Markup, html};

use crate::{
    category::Category,
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_ERROR_STYLE, FORM_LABEL_STYLE,
        FORM_RADIO_GROUP_STYLE, FORM_RADIO_INPUT_STYLE, FORM_RADIO_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, LINK_STYLE, base, dollar_input_styles,
    },
    navigation::NavBar,
    recurring::{
        Frequency, RecurrenceRule, RuleForm, ValidationErrors,
        validation::{DATE_FORMAT, fields},
    },
    transaction::TransactionKind,
};

const WEEKDAYS: [(&str, &str); 7] = [
    ("0", "Sunday"),
    ("1", "Monday"),
    ("2", "Tuesday"),
    ("3", "Wednesday"),
    ("4", "Thursday"),
    ("5", "Friday"),
    ("6", "Saturday"),
];

/// How the form is submitted.
pub(super) enum FormAction<'a> {
    Create,
    Update { endpoint: &'a str },
}

/// The form values that show `rule` as it is stored.
pub(super) fn rule_to_form(rule: &RecurrenceRule) -> RuleForm {
    let format_date =
        |date: time::Date| date.format(DATE_FORMAT).unwrap_or_else(|_| date.to_string());

    RuleForm {
        description: rule.payload.description.clone(),
        amount: Some(rule.payload.amount.to_string()),
        kind: Some(rule.payload.kind.as_str().to_owned()),
        category_id: Some(rule.payload.category_id.to_string()),
        payment_method: rule.payload.payment_method.clone(),
        frequency: Some(rule.schedule.frequency().as_str().to_owned()),
        interval_count: Some(rule.schedule.interval().get().to_string()),
        day_of_week: rule
            .schedule
            .weekday()
            .map(|weekday| weekday.number_days_from_sunday().to_string()),
        day_of_month: rule.schedule.day_of_month().map(|day| day.get().to_string()),
        start_date: Some(format_date(rule.start_date)),
        end_date: rule.end_date.map(format_date),
        auto_create: rule.auto_create.then(|| "on".to_owned()),
    }
}

/// A full page around `form`.
pub(super) fn rule_page_view(title: &str, active_endpoint: &str, form: Markup) -> Markup {
    let nav_bar = NavBar::new(active_endpoint).into_html();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="w-full mb-4 text-xl font-bold" { (title) }
            (form)
        }
    };

    base(title, &[dollar_input_styles()], &content)
}

/// The recurring rule form filled in with `form` and the messages in `errors`.
pub(super) fn rule_form_view(
    action: FormAction<'_>,
    form: &RuleForm,
    categories: &[Category],
    errors: &ValidationErrors,
) -> Markup {
    let value = |field: &Option<String>| field.clone().unwrap_or_default();
    let error = |field: &'static str| {
        html! {
            @if let Some(message) = errors.get(field) {
                p class=(FORM_ERROR_STYLE) data-error-for=(field) { (message) }
            }
        }
    };

    let selected_kind = form.kind.as_deref().unwrap_or(TransactionKind::Expense.as_str());
    let selected_frequency = form.frequency.as_deref().unwrap_or_default();
    let selected_category = form.category_id.as_deref().unwrap_or_default();
    let selected_weekday = form.day_of_week.as_deref().unwrap_or_default();
    let interval_count = form
        .interval_count
        .clone()
        .filter(|count| !count.trim().is_empty())
        .unwrap_or_else(|| "1".to_owned());
    let (create_endpoint, update_endpoint) = match action {
        FormAction::Create => (Some(endpoints::POST_RECURRING), None),
        FormAction::Update { endpoint } => (None, Some(endpoint)),
    };
    let is_new = create_endpoint.is_some();
    let auto_create = form.auto_create.is_some() || (is_new && form == &RuleForm::default());

    html! {
        form
            hx-post=[create_endpoint]
            hx-put=[update_endpoint]
            hx-target-error="#alert-container"
            hx-swap="outerHTML"
            class="w-full space-y-4 md:space-y-6"
        {
            div
            {
                label for=(fields::DESCRIPTION) class=(FORM_LABEL_STYLE) { "Description" }

                input
                    id=(fields::DESCRIPTION)
                    type="text"
                    name=(fields::DESCRIPTION)
                    placeholder="e.g., Rent"
                    value=(form.description)
                    required
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);

                (error(fields::DESCRIPTION))
            }

            div
            {
                label for=(fields::AMOUNT) class=(FORM_LABEL_STYLE) { "Amount" }

                div class="input-wrapper w-full"
                {
                    input
                        id=(fields::AMOUNT)
                        type="number"
                        name=(fields::AMOUNT)
                        step="0.01"
                        min="0.01"
                        placeholder="0.00"
                        value=(value(&form.amount))
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                (error(fields::AMOUNT))
            }

            fieldset
            {
                legend class=(FORM_LABEL_STYLE) { "Type" }

                div class=(FORM_RADIO_GROUP_STYLE)
                {
                    @for kind in [TransactionKind::Expense, TransactionKind::Income] {
                        label class="flex items-center gap-3"
                        {
                            input
                                type="radio"
                                name=(fields::KIND)
                                value=(kind.as_str())
                                checked[selected_kind == kind.as_str()]
                                required
                                class=(FORM_RADIO_INPUT_STYLE);

                            span class=(FORM_RADIO_LABEL_STYLE) { (kind.label()) }
                        }
                    }
                }

                (error(fields::KIND))
            }

            div
            {
                label for=(fields::CATEGORY_ID) class=(FORM_LABEL_STYLE) { "Category" }

                select
                    id=(fields::CATEGORY_ID)
                    name=(fields::CATEGORY_ID)
                    required
                    class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" selected[selected_category.is_empty()] { "Choose a category" }

                    @for category in categories {
                        option
                            value=(category.id)
                            selected[selected_category == category.id.to_string()]
                        {
                            (category.name)
                        }
                    }
                }

                (error(fields::CATEGORY_ID))

                @if categories.is_empty() {
                    p class="mt-1 text-xs text-gray-500 dark:text-gray-400"
                    {
                        "You have no categories yet. "
                        a href=(endpoints::NEW_CATEGORY_VIEW) class=(LINK_STYLE) { "Create a category" }
                        " first."
                    }
                }
            }

            div
            {
                label for=(fields::PAYMENT_METHOD) class=(FORM_LABEL_STYLE) { "Payment method (optional)" }

                input
                    id=(fields::PAYMENT_METHOD)
                    type="text"
                    name=(fields::PAYMENT_METHOD)
                    placeholder="e.g., Direct debit"
                    value=(value(&form.payment_method))
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div class="grid grid-cols-2 gap-4"
            {
                div
                {
                    label for=(fields::FREQUENCY) class=(FORM_LABEL_STYLE) { "Repeats" }

                    select
                        id=(fields::FREQUENCY)
                        name=(fields::FREQUENCY)
                        required
                        class=(FORM_TEXT_INPUT_STYLE)
                    {
                        option value="" selected[selected_frequency.is_empty()] { "Choose" }

                        @for frequency in Frequency::ALL {
                            option
                                value=(frequency.as_str())
                                selected[selected_frequency == frequency.as_str()]
                            {
                                (frequency.label())
                            }
                        }
                    }

                    (error(fields::FREQUENCY))
                }

                div
                {
                    label for=(fields::INTERVAL_COUNT) class=(FORM_LABEL_STYLE) { "Every" }

                    input
                        id=(fields::INTERVAL_COUNT)
                        type="number"
                        name=(fields::INTERVAL_COUNT)
                        min="1"
                        step="1"
                        value=(interval_count)
                        class=(FORM_TEXT_INPUT_STYLE);

                    (error(fields::INTERVAL_COUNT))
                }
            }

            div class="grid grid-cols-2 gap-4"
            {
                div
                {
                    label for=(fields::DAY_OF_WEEK) class=(FORM_LABEL_STYLE) { "Day of the week" }

                    select
                        id=(fields::DAY_OF_WEEK)
                        name=(fields::DAY_OF_WEEK)
                        class=(FORM_TEXT_INPUT_STYLE)
                    {
                        option value="" selected[selected_weekday.is_empty()] { "-" }

                        @for (number, name) in WEEKDAYS {
                            option value=(number) selected[selected_weekday == number] { (name) }
                        }
                    }

                    p class="mt-1 text-xs text-gray-500 dark:text-gray-400" { "Weekly and biweekly" }

                    (error(fields::DAY_OF_WEEK))
                }

                div
                {
                    label for=(fields::DAY_OF_MONTH) class=(FORM_LABEL_STYLE) { "Day of the month" }

                    input
                        id=(fields::DAY_OF_MONTH)
                        type="number"
                        name=(fields::DAY_OF_MONTH)
                        min="1"
                        max="31"
                        step="1"
                        value=(value(&form.day_of_month))
                        class=(FORM_TEXT_INPUT_STYLE);

                    p class="mt-1 text-xs text-gray-500 dark:text-gray-400"
                    {
                        "Monthly, quarterly and yearly. Short months use their last day."
                    }

                    (error(fields::DAY_OF_MONTH))
                }
            }

            div class="grid grid-cols-2 gap-4"
            {
                div
                {
                    label for=(fields::START_DATE) class=(FORM_LABEL_STYLE) { "Start date" }

                    input
                        id=(fields::START_DATE)
                        type="date"
                        name=(fields::START_DATE)
                        value=(value(&form.start_date))
                        required
                        class=(FORM_TEXT_INPUT_STYLE);

                    (error(fields::START_DATE))
                }

                div
                {
                    label for=(fields::END_DATE) class=(FORM_LABEL_STYLE) { "End date (optional)" }

                    input
                        id=(fields::END_DATE)
                        type="date"
                        name=(fields::END_DATE)
                        value=(value(&form.end_date))
                        class=(FORM_TEXT_INPUT_STYLE);

                    (error(fields::END_DATE))
                }
            }

            label class="flex items-center gap-3 text-sm"
            {
                input
                    type="checkbox"
                    name=(fields::AUTO_CREATE)
                    value="on"
                    checked[auto_create]
                    class="h-4 w-4";

                "Create transactions automatically when they are due"
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE)
            {
                @if is_new { "Create Recurring Transaction" } @else { "Save Changes" }
            }
        }
    }
}
