pub mod billing;
pub mod webhooks;

use axum::Router;
use axum_extra::extract::cookie::CookieJar;

use crate::{
    adapters::http::app_state::AppState,
    app_error::{AppError, AppResult},
    application::jwt::{self, SessionUser},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/billing", billing::router())
        .nest("/webhooks", webhooks::router())
}

/// Extract the authenticated user from the session cookie.
/// Missing or invalid sessions redirect to login, never render an error.
pub(crate) fn get_current_user(app_state: &AppState, cookies: &CookieJar) -> AppResult<SessionUser> {
    let token = cookies
        .get("access_token")
        .ok_or(AppError::AuthenticationRequired)?;

    jwt::verify(token.value(), &app_state.config.jwt_secret)
}
