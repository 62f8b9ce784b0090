//! Classification of Cost Explorer error responses

use awsce_core::ApiError;
use reqwest::StatusCode;

/// `__type` values that mean the caller is not authenticated or authorized
const AUTH_ERRORS: &[&str] = &[
    "AccessDeniedException",
    "UnrecognizedClientException",
    "InvalidSignatureException",
    "SignatureDoesNotMatch",
    "IncompleteSignature",
    "InvalidClientTokenId",
    "MissingAuthenticationToken",
    "ExpiredTokenException",
];

/// `__type` values that mean the request rate or quota was exceeded
const THROTTLING_ERRORS: &[&str] = &[
    "ThrottlingException",
    "LimitExceededException",
    "RequestLimitExceeded",
    "TooManyRequestsException",
];

/// `__type` values Cost Explorer uses for requests it cannot answer as asked
const VALIDATION_ERRORS: &[&str] = &[
    "ValidationException",
    "DataUnavailableException",
    "BillExpirationException",
    "InvalidNextTokenException",
    "RequestChangedException",
    "UnresolvableUsageUnitException",
];

/// Build an [`ApiError`] from a non-success response.
///
/// The error type comes from `__type` (the part after `#` when namespaced),
/// falling back to the HTTP status when the body is not a JSON error document.
pub fn parse_aws_error(operation: &str, status: StatusCode, body: &str) -> ApiError {
    let parsed = serde_json::from_str::<serde_json::Value>(body).ok();

    let error_type = parsed
        .as_ref()
        .and_then(|json| {
            json.get("__type")
                .or_else(|| json.get("code"))
                .or_else(|| json.get("Error").and_then(|e| e.get("Code")))
        })
        .and_then(|v| v.as_str())
        .map(|t| t.rsplit('#').next().unwrap_or(t).to_string());

    let message = parsed
        .as_ref()
        .and_then(|json| {
            json.get("message")
                .or_else(|| json.get("Message"))
                .or_else(|| json.get("Error").and_then(|e| e.get("Message")))
        })
        .and_then(|v| v.as_str())
        .unwrap_or(body);

    let text = match &error_type {
        Some(t) => format!(
            "ce.{} returned {} (HTTP {}): {}",
            operation,
            t,
            status.as_u16(),
            message
        ),
        None => format!(
            "ce.{} failed (HTTP {}): {}",
            operation,
            status.as_u16(),
            message
        ),
    };

    match error_type.as_deref() {
        Some(t) if AUTH_ERRORS.contains(&t) => ApiError::Authentication(text),
        Some(t) if THROTTLING_ERRORS.contains(&t) => ApiError::Throttled(text),
        Some(t) if VALIDATION_ERRORS.contains(&t) => ApiError::Validation(text),
        _ => classify_status(status, text),
    }
}

fn classify_status(status: StatusCode, text: String) -> ApiError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Authentication(text),
        StatusCode::TOO_MANY_REQUESTS => ApiError::Throttled(text),
        s if s.is_server_error() => ApiError::Unavailable(text),
        s if s.is_client_error() => ApiError::Validation(text),
        _ => ApiError::Other(text),
    }
}

/// Map a transport failure to an [`ApiError`]
pub fn transport_error(operation: &str, err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Network(format!("ce.{} timed out: {}", operation, err))
    } else if err.is_connect() {
        ApiError::Network(format!("ce.{} could not connect: {}", operation, err))
    } else {
        ApiError::Network(format!("ce.{} request failed: {}", operation, err))
    }
}
