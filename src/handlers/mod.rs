pub mod bookings;
pub mod health;
pub mod users;
pub mod workers;

use axum::http::HeaderMap;

use crate::errors::AppError;

/// Admin routes require `Authorization: Bearer <admin_token>`.
pub(crate) fn check_admin(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token.is_empty() || token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

/// Customer identity arrives as an `x-user-id` header, set by the upstream
/// auth layer after it has validated the session.
pub(crate) fn require_user(headers: &HeaderMap) -> Result<String, AppError> {
    headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or(AppError::Unauthorized)
}
