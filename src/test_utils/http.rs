use axum::{body::Body, response::Response};

/// The value of `header_name`, panicking if it is missing or not text.
#[track_caller]
pub(crate) fn get_header(response: &Response<Body>, header_name: &str) -> String {
    response
        .headers()
        .get(header_name)
        .unwrap_or_else(|| panic!("want a {header_name} header"))
        .to_str()
        .expect("Could not convert header to str")
        .to_owned()
}
