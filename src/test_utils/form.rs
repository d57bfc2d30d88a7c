use scraper::{ElementRef, Html, Selector};

#[track_caller]
pub(crate) fn must_get_form(html: &Html) -> ElementRef<'_> {
    html.select(&Selector::parse("form").unwrap())
        .next()
        .expect("No form found")
}

#[track_caller]
pub(crate) fn assert_hx_endpoint(form: &ElementRef<'_>, endpoint: &str, attribute: &str) {
    let got = form
        .value()
        .attr(attribute)
        .unwrap_or_else(|| panic!("{attribute} attribute missing"));

    assert_eq!(
        got, endpoint,
        "want form with attribute {attribute}=\"{endpoint}\", got {got:?}"
    );
}

#[track_caller]
fn must_get_named<'a>(form: &ElementRef<'a>, tag: &str, name: &str) -> ElementRef<'a> {
    let selector = Selector::parse(&format!("{tag}[name=\"{name}\"]")).unwrap();

    form.select(&selector)
        .next()
        .unwrap_or_else(|| panic!("No {tag} found with name \"{name}\""))
}

/// Assert that `form` has a required input called `name` of type `type_`.
#[track_caller]
pub(crate) fn assert_form_input(form: &ElementRef<'_>, name: &str, type_: &str) {
    let input = must_get_named(form, "input", name);
    let input_type = input.value().attr("type").unwrap_or_default();

    assert_eq!(
        input_type, type_,
        "want input {name} with type \"{type_}\", got {input_type:?}"
    );
    assert!(
        input.value().attr("required").is_some(),
        "want input with name {name} to have the required attribute but got none"
    );
}

/// Assert that the input called `name` holds `value`.
#[track_caller]
pub(crate) fn assert_form_input_value(form: &ElementRef<'_>, name: &str, value: &str) {
    let input = must_get_named(form, "input", name);
    let got = input.value().attr("value").unwrap_or_default();

    assert_eq!(got, value, "want input {name} with value \"{value}\", got {got:?}");
}

/// Assert that the select called `name` offers exactly `want_values`, in order.
#[track_caller]
pub(crate) fn assert_select_options(form: &ElementRef<'_>, name: &str, want_values: &[&str]) {
    let select = must_get_named(form, "select", name);
    let option_selector = Selector::parse("option").unwrap();
    let got_values: Vec<&str> = select
        .select(&option_selector)
        .filter_map(|option| option.value().attr("value"))
        .collect();

    assert_eq!(got_values, want_values, "options of select {name}");
}

/// The value of the selected option of the select called `name`.
#[track_caller]
pub(crate) fn get_selected_option<'a>(form: &ElementRef<'a>, name: &str) -> Option<&'a str> {
    let select = must_get_named(form, "select", name);
    let selector = Selector::parse("option[selected]").unwrap();

    select
        .select(&selector)
        .next()
        .and_then(|option| option.value().attr("value"))
}

#[track_caller]
pub(crate) fn assert_form_submit_button(form: &ElementRef<'_>) {
    let submit_button = form
        .select(&Selector::parse("button[type=\"submit\"]").unwrap())
        .next()
        .expect("No submit button found");

    assert!(
        !submit_button.text().collect::<String>().trim().is_empty(),
        "want submit button with a label"
    );
}

/// Assert that the first paragraph of `form` is `want_error_message`.
#[track_caller]
pub(crate) fn assert_form_error_message(form: &ElementRef<'_>, want_error_message: &str) {
    let error_message = form
        .select(&Selector::parse("p").unwrap())
        .next()
        .expect("No error message found")
        .text()
        .collect::<String>();

    assert_eq!(want_error_message, error_message.trim());
}

/// The error message shown below the input called `field`, if any.
pub(crate) fn get_field_error(form: &ElementRef<'_>, field: &str) -> Option<String> {
    let selector = Selector::parse(&format!("p[data-error-for=\"{field}\"]")).unwrap();

    form.select(&selector)
        .next()
        .map(|p| p.text().collect::<String>().trim().to_owned())
}

#[track_caller]
pub(crate) fn assert_field_error(form: &ElementRef<'_>, field: &str, want_message: &str) {
    match get_field_error(form, field) {
        Some(message) => assert_eq!(message, want_message, "error message for {field}"),
        None => panic!("want error message \"{want_message}\" for {field}, got none"),
    }
}
