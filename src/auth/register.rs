//! The registration page for creating a new account with an email and password.
use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Email, Error, PasswordHash, ValidatedPassword,
    auth::{create_user, get_user_by_email, log_in::email_input, set_auth_cookie},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base, link,
        loading_spinner, log_in_register, password_input,
    },
    routing::get_internal_server_error_redirect,
    timezone::get_local_offset,
};

/// The minimum number of characters the password should have to be considered valid on the client side (server-side validation is done on top of this validation).
const PASSWORD_INPUT_MIN_LENGTH: u8 = 14;

const DUPLICATE_EMAIL_MSG: &str = "This email is already registered. Log in instead.";

fn confirm_password_input(min_length: u8, error_message: Option<&str>) -> Markup {
    html! {
        div
        {
            label
                for="confirm-password"
                class=(FORM_LABEL_STYLE)
            {
                "Confirm Password"
            }

            input
                type="password"
                name="confirm_password"
                id="confirm-password"
                placeholder="••••••••"
                class=(FORM_TEXT_INPUT_STYLE)
                required
                minlength=(min_length)
                autofocus[error_message.is_some()]
            ;

            @if let Some(error_message) = error_message
            {
                p class="text-red-500 text-base" { (error_message) }
            }
        }
    }
}

/// The error messages to show beside each field of the registration form.
#[derive(Default)]
struct RegistrationErrors<'a> {
    email: Option<&'a str>,
    password: Option<&'a str>,
    confirm_password: Option<&'a str>,
}

fn registration_form(email: &str, errors: RegistrationErrors) -> Markup {
    html! {
        form
            hx-post=(endpoints::USERS)
            hx-indicator="#indicator"
            hx-disabled-elt="#email, #password, #confirm-password, #submit-button"
            class="space-y-4 md:space-y-6"
        {
            (email_input(email, errors.email))
            (password_input(PASSWORD_INPUT_MIN_LENGTH, errors.password))
            (confirm_password_input(PASSWORD_INPUT_MIN_LENGTH, errors.confirm_password))

            button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator"
                {
                    (loading_spinner())
                }
                "Create Account"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Already have an account? "
                (link(endpoints::LOG_IN_VIEW, "Log in here"))
            }
        }
    }
}

/// Display the registration page.
pub async fn get_register_page() -> Response {
    let registration_form = registration_form("", RegistrationErrors::default());
    let content = log_in_register("Create an account", &registration_form);
    base("Register", &[], &content).into_response()
}

/// The state needed for creating a new user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The local timezone as a canonical timezone name, e.g. "Asia/Shanghai".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<RegistrationState> for Key {
    fn from_ref(state: &RegistrationState) -> Self {
        state.cookie_key.clone()
    }
}

#[derive(Default, Serialize, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

fn form_with_errors(user_data: &RegisterForm, errors: RegistrationErrors) -> Response {
    registration_form(&user_data.email, errors).into_response()
}

/// Create a new user, log them in and send them to the dashboard.
///
/// Problems with the submitted details are shown beside the offending field.
pub async fn register_user(
    State(state): State<RegistrationState>,
    jar: PrivateCookieJar,
    Form(user_data): Form<RegisterForm>,
) -> Response {
    if user_data.email.trim().is_empty() {
        let errors = RegistrationErrors {
            email: Some("Enter your email address."),
            ..Default::default()
        };
        return form_with_errors(&user_data, errors);
    }

    if user_data.password.is_empty() {
        let errors = RegistrationErrors {
            password: Some("Enter a password."),
            ..Default::default()
        };
        return form_with_errors(&user_data, errors);
    }

    let email = match Email::new(&user_data.email) {
        Ok(email) => email,
        Err(error) => {
            let message = error.to_string();
            let errors = RegistrationErrors {
                email: Some(&message),
                ..Default::default()
            };
            return form_with_errors(&user_data, errors);
        }
    };

    let validated_password = match ValidatedPassword::new(&user_data.password) {
        Ok(password) => password,
        Err(error) => {
            let message = error.to_string();
            let errors = RegistrationErrors {
                password: Some(&message),
                ..Default::default()
            };
            return form_with_errors(&user_data, errors);
        }
    };

    if user_data.password != user_data.confirm_password {
        let errors = RegistrationErrors {
            confirm_password: Some("Passwords do not match"),
            ..Default::default()
        };
        return form_with_errors(&user_data, errors);
    }

    let existing_user = match state.db_connection.lock() {
        Ok(connection) => get_user_by_email(&email, &connection),
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return get_internal_server_error_redirect();
        }
    };

    match existing_user {
        Ok(_) => return duplicate_email_form(&user_data),
        Err(Error::NotFound) => {}
        Err(error) => {
            tracing::error!("Could not check whether {email} is registered: {error}");
            return get_internal_server_error_redirect();
        }
    }

    let password_hash = match PasswordHash::new(validated_password, PasswordHash::DEFAULT_COST) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::error!("an error occurred while hashing a password: {e}");

            return get_internal_server_error_redirect();
        }
    };

    let local_offset = match get_local_offset(&state.local_timezone) {
        Some(offset) => offset,
        None => return Error::InvalidTimezoneError(state.local_timezone).into_response(),
    };

    let user = match state.db_connection.lock() {
        Ok(connection) => create_user(email, password_hash, &connection),
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return get_internal_server_error_redirect();
        }
    };

    let user = match user {
        Ok(user) => user,
        // Another request registered the same email between the check above and the insert.
        Err(Error::DuplicateEmail) => return duplicate_email_form(&user_data),
        Err(e) => {
            tracing::error!("An unhandled error occurred while inserting a new user: {e}");

            return get_internal_server_error_redirect();
        }
    };

    tracing::info!("Registered new user {}", user.id);

    match set_auth_cookie(
        jar,
        user.id,
        user.email,
        state.cookie_duration,
        local_offset,
    ) {
        Ok(jar) => (
            StatusCode::SEE_OTHER,
            HxRedirect(endpoints::DASHBOARD_VIEW.to_owned()),
            jar,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("An error occurred while setting the auth cookie: {e}");

            get_internal_server_error_redirect()
        }
    }
}

fn duplicate_email_form(user_data: &RegisterForm) -> Response {
    let errors = RegistrationErrors {
        email: Some(DUPLICATE_EMAIL_MSG),
        ..Default::default()
    };
    form_with_errors(user_data, errors)
}
