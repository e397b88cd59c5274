use super::*;

/// Convert a taxonomy error into the fixed-shape failure body. Internal
/// failures are logged here with full detail and reach the client only as
/// a generic string.
pub(super) fn failure(err: AccountError) -> Response {
    let (status, message) = match &err {
        AccountError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        AccountError::Upload(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        AccountError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
        AccountError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
        AccountError::InvalidCredentials | AccountError::Unauthorized => {
            (StatusCode::UNAUTHORIZED, err.to_string())
        }
        AccountError::Internal(source) => {
            tracing::error!(error = ?source, "request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_string(),
            )
        }
    };

    (
        status,
        Json(serde_json::json!({
            "status": status.as_u16(),
            "message": message,
            "data": message,
        })),
    )
        .into_response()
}
