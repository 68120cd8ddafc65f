use crate::app_error::{AppError, ErrorCode};
use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};

/// Where unauthenticated requests are sent.
pub const LOGIN_PATH: &str = "/login";

/// Generic message for failures the user can do nothing about except retry.
/// Provider and database internals never leak into responses.
const RETRY_MESSAGE: &str = "Unknown error. If issue persists, please contact us.";

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the error before it gets converted into a status response.
        tracing::error!(error = ?self, "Request failed");

        match self {
            AppError::AuthenticationRequired => Redirect::to(LOGIN_PATH).into_response(),
            AppError::Database(_) => error_resp(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::DatabaseError,
                Some(RETRY_MESSAGE.to_string()),
            ),
            AppError::InvalidInput(msg) => {
                error_resp(StatusCode::BAD_REQUEST, ErrorCode::InvalidInput, Some(msg))
            }
            AppError::NotFound => error_resp(StatusCode::NOT_FOUND, ErrorCode::NotFound, None),
            AppError::Conflict => error_resp(StatusCode::CONFLICT, ErrorCode::Conflict, None),
            AppError::Provider(_) => error_resp(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::ProviderError,
                Some(RETRY_MESSAGE.to_string()),
            ),
            AppError::Internal(_) => error_resp(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::InternalError,
                Some(RETRY_MESSAGE.to_string()),
            ),
        }
    }
}

fn error_resp(status: StatusCode, code: ErrorCode, message: Option<String>) -> Response {
    let body = match message {
        Some(msg) => serde_json::json!({ "code": code.as_str(), "message": msg }),
        None => serde_json::json!({ "code": code.as_str() }),
    };
    (status, Json(body)).into_response()
}
