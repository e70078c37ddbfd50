//! Assertions about the forms rendered by the views.

use scraper::{ElementRef, Html, Selector};

#[track_caller]
pub(crate) fn must_get_form(html: &Html) -> ElementRef<'_> {
    html.select(&Selector::parse("form").unwrap())
        .next()
        .expect("want a form in the HTML")
}

#[track_caller]
pub(crate) fn assert_hx_endpoint(form: &ElementRef<'_>, endpoint: &str, attribute: &str) {
    let got = form.value().attr(attribute);

    assert_eq!(
        got,
        Some(endpoint),
        "want form with attribute {attribute}=\"{endpoint}\""
    );
}

/// Assert that `form` has a required input called `name` of type `type_`.
#[track_caller]
pub(crate) fn assert_form_input(form: &ElementRef<'_>, name: &str, type_: &str) {
    let selector = Selector::parse(&format!("input[name=\"{name}\"]")).unwrap();
    let input = form
        .select(&selector)
        .next()
        .unwrap_or_else(|| panic!("want an input named \"{name}\""));

    assert_eq!(
        input.value().attr("type"),
        Some(type_),
        "want input {name} to have type \"{type_}\""
    );
    assert!(
        input.value().attr("required").is_some(),
        "want input {name} to be required"
    );
}

#[track_caller]
pub(crate) fn assert_form_submit_button_with_text(form: &ElementRef<'_>, text: &str) {
    let button = form
        .select(&Selector::parse("button[type=submit]").unwrap())
        .next()
        .expect("want a submit button");

    let got_text: String = button.text().collect();
    assert_eq!(got_text.trim(), text);
}

/// Assert that the first paragraph in `form` is the error message.
#[track_caller]
pub(crate) fn assert_form_error_message(form: &ElementRef<'_>, want_error_message: &str) {
    let error_message: String = form
        .select(&Selector::parse("p").unwrap())
        .next()
        .expect("want an error message")
        .text()
        .collect();

    assert_eq!(error_message.trim(), want_error_message);
}
