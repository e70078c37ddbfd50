//! Authentication middleware that validates cookies, extends sessions, and handles redirects.

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{StatusCode, header::SET_COOKIE, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use time::{Duration, UtcOffset};

use crate::{
    AppState,
    auth::{
        Token,
        cookie::{extend_auth_cookie_duration_if_needed, get_token_from_cookies},
        redirect::{build_log_in_redirect_url, build_log_in_redirect_url_from_target},
    },
    endpoints,
    timezone::get_local_offset,
};

/// The state needed for the auth middleware
#[derive(Clone)]
pub struct AuthState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The local timezone as a canonical timezone name, e.g. "Asia/Shanghai".
    pub local_timezone: String,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_key.clone()
    }
}

/// How far into the future each authenticated request pushes the session expiry.
const SLIDING_SESSION_DURATION: Duration = Duration::minutes(5);

/// How a request without a valid session is sent to the log-in page.
#[derive(Debug, Clone, Copy)]
enum Rejection {
    /// A plain `303 See Other`, for page loads.
    Redirect,
    /// An `HX-Redirect` header, for requests made by htmx.
    HxRedirect,
}

impl Rejection {
    fn respond(self, log_in_url: &str) -> Response {
        match self {
            Rejection::Redirect => Redirect::to(log_in_url).into_response(),
            Rejection::HxRedirect => {
                (HxRedirect(log_in_url.to_owned()), StatusCode::OK).into_response()
            }
        }
    }
}

/// The log-in page URL that brings the user back to where they were going.
fn log_in_url_for(request: &Request) -> String {
    build_log_in_redirect_url(request).unwrap_or_else(|| {
        if request.uri().path().starts_with("/api") {
            tracing::warn!(
                "Missing or invalid HTMX headers for /api request. Falling back to dashboard."
            );
        } else {
            tracing::warn!("Invalid redirect URL from request URI. Falling back to dashboard.");
        }

        build_log_in_redirect_url_from_target(endpoints::DASHBOARD_VIEW)
            .unwrap_or_else(|| endpoints::LOG_IN_VIEW.to_owned())
    })
}

/// The session token and the jar it came from, if the request has a valid session.
async fn read_session(
    state: &AuthState,
    parts: &mut Parts,
) -> Option<(Token, PrivateCookieJar)> {
    let jar = PrivateCookieJar::from_request_parts(parts, state)
        .await
        .inspect_err(|error| tracing::error!("Error getting cookie jar: {error:?}"))
        .ok()?;
    let token = get_token_from_cookies(&jar).ok()?;

    Some((token, jar))
}

/// Copy the `Set-Cookie` headers for the extended session onto `response`.
fn with_extended_session(
    response: Response,
    jar: PrivateCookieJar,
    local_offset: UtcOffset,
) -> Response {
    let jar = extend_auth_cookie_duration_if_needed(
        jar.clone(),
        SLIDING_SESSION_DURATION,
        local_offset,
    )
    .unwrap_or_else(|error| {
        tracing::error!("Error extending cookie duration: {error:?}. Rolling back cookie jar.");
        jar
    });

    let (mut parts, body) = response.into_parts();
    for value in jar.into_response().headers().get_all(SET_COOKIE) {
        parts.headers.append(SET_COOKIE, value.to_owned());
    }

    Response::from_parts(parts, body)
}

/// Run `next` for requests with a valid session, otherwise reject them.
///
/// The user's ID and email are placed into the request extensions and the
/// session expiry is pushed back once the handler has responded.
async fn require_session(
    state: AuthState,
    request: Request,
    next: Next,
    rejection: Rejection,
) -> Response {
    let log_in_url = log_in_url_for(&request);

    let Some(local_offset) = get_local_offset(&state.local_timezone) else {
        tracing::error!("Error getting local timezone. Redirecting to log in page.");
        return rejection.respond(&log_in_url);
    };

    let (mut parts, body) = request.into_parts();
    let Some((token, jar)) = read_session(&state, &mut parts).await else {
        return rejection.respond(&log_in_url);
    };

    parts.extensions.insert(token.user_id);
    parts.extensions.insert(token.email);
    let response = next.run(Request::from_parts(parts, body)).await;

    with_extended_session(response, jar, local_offset)
}

/// Middleware for pages: a request without a valid session is redirected to
/// the log-in page.
///
/// **Note**: Route handlers can use the function argument `Extension(user_id): Extension<UserID>` to receive the user ID,
/// and `Extension(email): Extension<Email>` to receive the user's email.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    require_session(state, request, next, Rejection::Redirect).await
}

/// Middleware for routes called by htmx: a request without a valid session
/// gets an `HX-Redirect` to the log-in page and the handler never runs, so
/// nothing is read or written.
pub async fn auth_guard_hx(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    require_session(state, request, next, Rejection::HxRedirect).await
}

/// Middleware function for the log-in and registration pages that sends
/// users who already have a valid session to the dashboard.
pub async fn redirect_if_logged_in(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();

    if read_session(&state, &mut parts).await.is_some() {
        return Redirect::to(endpoints::DASHBOARD_VIEW).into_response();
    }

    next.run(Request::from_parts(parts, body)).await
}
