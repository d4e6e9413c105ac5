use crate::adapters::RouteRecorder;
use crate::guard::{self, Access};
use crate::ports::Route;
use crate::session::{LOGIN_FAILED, LoginOutcome, SessionError};
use crate::state::{self, BrowserSession};
use crate::templates;

use axum::Json;
use axum::body::Body;
use axum::extract::Form;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::HeaderValue;
use axum::http::Request;
use axum::http::StatusCode;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use serde::Deserialize;
use serde::Serialize;
use tracing::{debug, error, info};

use std::sync::Arc;

#[derive(Serialize)]
struct AuthErrorResponse {
    error: &'static str,
}

/// Runs the navigation guard in front of every screen that needs a signed-in
/// user. Granted requests carry the browser session and identity as
/// extensions.
pub(crate) async fn session_guard(
    State(state): State<state::AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let path = req.uri().path().to_string();
    if is_public_path(&path) {
        return next.run(req).await;
    }

    let browser = browser_session(&state, req.headers()).map(|(_, browser)| browser);
    let snapshot = browser.as_ref().map(|browser| browser.session.snapshot());

    match (guard::evaluate(snapshot.as_ref()), browser) {
        (Access::Granted(identity), Some(browser)) => {
            req.extensions_mut().insert(browser);
            req.extensions_mut().insert(identity);
            next.run(req).await
        }
        (Access::Loading, _) if !is_api_path(&path) => templates::LoadingTemplate {
            app_name: state.config.app_name.clone(),
            display_name: String::new(),
            active: "",
        }
        .into_response(),
        (Access::Redirect(route), _) => deny(&path, route),
        _ => deny(&path, Route::Login),
    }
}

fn deny(path: &str, route: Route) -> Response {
    debug!(path, to = route.path(), "guard denied request");
    if is_api_path(path) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(AuthErrorResponse {
                error: "unauthorized",
            }),
        )
            .into_response();
    }
    Redirect::to(route.path()).into_response()
}

fn is_public_path(path: &str) -> bool {
    path == "/login" || path == "/logout" || path == "/health" || path.starts_with("/static/")
}

fn is_api_path(path: &str) -> bool {
    path.starts_with("/api/")
}

/// Resolves the browser session named by a valid session cookie.
pub(crate) fn browser_session(
    state: &state::AppState,
    headers: &HeaderMap,
) -> Option<(String, Arc<BrowserSession>)> {
    let token = auth_cookie(headers, state.cookies.name())?;
    let session_id = match state.cookies.session_id(token) {
        Ok(session_id) => session_id,
        Err(err) => {
            debug!(%err, "ignoring session cookie");
            return None;
        }
    };
    let browser = state.sessions.get(&session_id)?;
    Some((session_id, browser))
}

fn auth_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    for header in headers.get_all(COOKIE).iter() {
        if let Ok(raw) = header.to_str()
            && let Some(value) = cookie_from_header(raw, name)
        {
            return Some(value);
        }
    }
    None
}

fn cookie_from_header<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    for part in header.split(';') {
        let trimmed = part.trim();
        if let Some((cookie_name, cookie_value)) = trimmed.split_once('=')
            && cookie_name == name
        {
            return Some(cookie_value);
        }
    }
    None
}

fn with_cookie(mut response: Response, cookie: &str) -> Response {
    match HeaderValue::from_str(cookie) {
        Ok(value) => {
            response.headers_mut().append(SET_COOKIE, value);
        }
        Err(err) => error!(%err, "failed to encode session cookie"),
    }
    response
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginForm {
    email: String,
    password: String,
}

pub(crate) async fn login_form(
    State(state): State<state::AppState>,
    headers: HeaderMap,
) -> Response {
    let Some((_, browser)) = browser_session(&state, &headers) else {
        return login_page(&state, String::new(), String::new(), false).into_response();
    };
    let session = browser.session.snapshot();
    if session.identity().is_some() {
        return Redirect::to(Route::Booking.path()).into_response();
    }
    login_page(
        &state,
        session.last_email().to_string(),
        session.error().unwrap_or_default().to_string(),
        session.is_loading(),
    )
    .into_response()
}

/// Signs a browser in. A browser without a session gets one for the attempt,
/// kept only if the attempt succeeds. An existing session keeps its booking
/// draft only when the same user signs in again.
pub(crate) async fn login_submit(
    State(state): State<state::AppState>,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> Response {
    let (session_id, browser, mut discard) = match browser_session(&state, &headers) {
        Some((session_id, browser)) => (session_id, browser, None),
        None => {
            let (session_id, browser) = state.sessions.create();
            let discard = DiscardSession::new(&state.sessions, &session_id);
            (session_id, browser, Some(discard))
        }
    };
    let fresh = discard.is_some();
    let owner = browser.session.identity().map(|identity| identity.email);

    let navigator = RouteRecorder::default();
    let outcome = state
        .login
        .login(&browser.session, &navigator, &form.email, &form.password)
        .await;

    if fresh {
        if let Some(discard) = discard.take()
            && matches!(outcome, Ok(LoginOutcome::Authenticated(_)))
        {
            discard.keep();
        }
    } else {
        match &outcome {
            Ok(LoginOutcome::Authenticated(identity))
                if owner.as_deref() == Some(identity.email.as_str()) => {}
            Ok(LoginOutcome::Authenticated(_) | LoginOutcome::Rejected | LoginOutcome::Failed) => {
                browser.reset_booking()
            }
            Ok(LoginOutcome::Superseded) | Err(SessionError::LoginInFlight) => {}
        }
    }

    match outcome {
        Ok(LoginOutcome::Authenticated(_)) => {
            let route = navigator.take().unwrap_or(Route::Booking);
            let response = Redirect::to(route.path()).into_response();
            if !fresh {
                return response;
            }
            match state.cookies.issue(&session_id) {
                Ok(cookie) => with_cookie(response, &cookie),
                Err(err) => {
                    error!(%err, "failed to issue session cookie");
                    state.sessions.remove(&session_id);
                    let page = login_page(&state, form.email, LOGIN_FAILED.to_string(), false);
                    (StatusCode::INTERNAL_SERVER_ERROR, page).into_response()
                }
            }
        }
        Ok(LoginOutcome::Rejected) => {
            let session = browser.session.snapshot();
            let page = login_page(
                &state,
                form.email,
                session.error().unwrap_or_default().to_string(),
                false,
            );
            (StatusCode::UNAUTHORIZED, page).into_response()
        }
        Ok(LoginOutcome::Failed) => {
            let page = login_page(&state, form.email, LOGIN_FAILED.to_string(), false);
            (StatusCode::SERVICE_UNAVAILABLE, page).into_response()
        }
        Ok(LoginOutcome::Superseded) => Redirect::to(Route::Login.path()).into_response(),
        Err(SessionError::LoginInFlight) => {
            debug!(email = %form.email, "login already in flight");
            let page = login_page(&state, form.email, String::new(), true);
            (StatusCode::CONFLICT, page).into_response()
        }
    }
}

pub(crate) async fn logout(State(state): State<state::AppState>, headers: HeaderMap) -> Response {
    let navigator = RouteRecorder::default();
    if let Some((session_id, browser)) = browser_session(&state, &headers) {
        browser.session.logout(&navigator);
        state.sessions.remove(&session_id);
        info!("session signed out");
    }
    let route = navigator.take().unwrap_or(Route::Login);
    with_cookie(
        Redirect::to(route.path()).into_response(),
        &state.cookies.expired(),
    )
}

/// Removes a session created for a login attempt unless the attempt signs
/// the browser in, including when the request is dropped mid-attempt.
struct DiscardSession<'a> {
    sessions: &'a state::SessionRegistry,
    id: Option<String>,
}

impl<'a> DiscardSession<'a> {
    fn new(sessions: &'a state::SessionRegistry, id: &str) -> Self {
        Self {
            sessions,
            id: Some(id.to_string()),
        }
    }

    fn keep(mut self) {
        self.id = None;
    }
}

impl Drop for DiscardSession<'_> {
    fn drop(&mut self) {
        if let Some(id) = self.id.take() {
            debug!("dropping session of unsuccessful login");
            self.sessions.remove(&id);
        }
    }
}

fn login_page(
    state: &state::AppState,
    email: String,
    error: String,
    loading: bool,
) -> templates::LoginTemplate {
    templates::LoginTemplate {
        app_name: state.config.app_name.clone(),
        display_name: String::new(),
        active: "",
        email,
        error,
        loading,
    }
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;

    #[test]
    fn cookie_from_header__should_pick_named_cookie() {
        // Given
        let header = "theme=dark; shiftbook_session=abc.def; other=1";

        // Then
        assert_eq!(
            cookie_from_header(header, "shiftbook_session"),
            Some("abc.def")
        );
        assert_eq!(cookie_from_header(header, "missing"), None);
    }

    #[test]
    fn is_public_path__should_only_open_login_and_assets() {
        // Then
        assert!(is_public_path("/login"));
        assert!(is_public_path("/logout"));
        assert!(is_public_path("/health"));
        assert!(is_public_path("/static/style.css"));
        assert!(!is_public_path("/"));
        assert!(!is_public_path("/booking"));
        assert!(!is_public_path("/api/bookings"));
    }
}
