#![allow(missing_docs)]

pub(crate) mod form;
pub(crate) mod html;
pub(crate) mod http;
pub(crate) mod state;

pub(crate) use form::{
    assert_field_error, assert_form_error_message, assert_form_input, assert_form_input_value,
    assert_form_submit_button, assert_hx_endpoint, assert_select_options, get_field_error,
    get_selected_option, must_get_form,
};
pub(crate) use html::{
    assert_alert_message, assert_valid_html, parse_html_document, parse_html_fragment,
    select_texts,
};
pub(crate) use http::{assert_content_type, assert_hx_redirect, assert_status_ok, get_header};
pub(crate) use state::{TEST_SIGN_IN_URL, get_test_app_state};
