//! User accounts and sessions: registration, log-in, log-out, and the
//! middleware that guards every page and API route holding user data.

mod cookie;
mod email;
mod log_in;
mod log_out;
mod middleware;
mod password;
mod redirect;
mod register;
mod token;
mod user;

pub(crate) use cookie::{DEFAULT_COOKIE_DURATION, invalidate_auth_cookie, set_auth_cookie};
pub use email::Email;
pub use log_in::{get_log_in_page, post_log_in};
pub use log_out::get_log_out;
pub use middleware::{auth_guard, auth_guard_hx, redirect_if_logged_in};
pub use password::{PasswordHash, ValidatedPassword};
pub(crate) use redirect::normalize_redirect_url;
pub use register::{get_register_page, register_user};
pub(crate) use token::Token;
pub use user::{User, UserID, create_user, create_user_table, get_user_by_email};

#[cfg(test)]
pub(crate) use cookie::COOKIE_TOKEN;

#[cfg(test)]
pub use middleware::AuthState;
