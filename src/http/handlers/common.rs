use crate::analysis::normalize::is_truthy;
use crate::types::ErrorResponse;
use axum::http::StatusCode;
use axum::response::Json;
use serde_json::Value;

pub type HandlerError = (StatusCode, Json<ErrorResponse>);

pub fn bad_request(message: &str) -> HandlerError {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(message)))
}

pub fn server_error(message: &str, details: impl std::fmt::Display) -> HandlerError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new(message).with_details(details.to_string())),
    )
}

/// The request's `data` field, rejecting absent and falsy values.
pub fn require_data<'a>(data: &'a Option<Value>, message: &str) -> Result<&'a Value, HandlerError> {
    data.as_ref()
        .filter(|v| is_truthy(v))
        .ok_or_else(|| bad_request(message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_require_data() {
        assert!(require_data(&Some(json!({"a": 1})), "x").is_ok());
        assert!(require_data(&Some(json!([])), "x").is_ok());
        let (status, body) = require_data(&Some(json!("")), "데이터가 필요합니다.").unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.0.message, "데이터가 필요합니다.");
        assert!(require_data(&None, "x").is_err());
    }
}
