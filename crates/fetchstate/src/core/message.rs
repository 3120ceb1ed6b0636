use http::StatusCode;

use crate::error::Error;

/// Generic description of a status code, e.g. `HTTP 404 Not Found`.
pub fn status_description(status: u16) -> String {
    match StatusCode::from_u16(status).ok().and_then(|s| s.canonical_reason()) {
        Some(reason) => format!("HTTP {status} {reason}"),
        None => format!("HTTP {status}"),
    }
}

/// Message for a completed response with a non-success status.
///
/// Prefers the body's `message` field, then its `error` field, then the
/// status description.
pub fn failure_message(status: u16, body: &[u8]) -> String {
    serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|json| {
            ["message", "error"]
                .iter()
                .filter_map(|key| json.get(*key).and_then(|v| v.as_str()))
                .map(str::trim)
                .find(|m| !m.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| status_description(status))
}

/// Build the application-level error for a non-success response.
pub fn application_error(status: u16, body: &[u8]) -> Error {
    Error::Application { status, message: failure_message(status, body) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_field() {
        assert_eq!(failure_message(404, br#"{"message":"not found"}"#), "not found");
    }

    #[test]
    fn test_error_field_when_no_message() {
        assert_eq!(failure_message(401, br#"{"error":"unauthorized"}"#), "unauthorized");
    }

    #[test]
    fn test_message_preferred_over_error() {
        assert_eq!(failure_message(400, br#"{"error":"bad","message":"missing id"}"#), "missing id");
    }

    #[test]
    fn test_blank_message_falls_back() {
        assert_eq!(failure_message(500, br#"{"message":"  "}"#), "HTTP 500 Internal Server Error");
    }

    #[test]
    fn test_non_json_body_falls_back() {
        assert_eq!(failure_message(502, b"<html>Bad Gateway</html>"), "HTTP 502 Bad Gateway");
    }

    #[test]
    fn test_non_string_message_falls_back() {
        assert_eq!(failure_message(404, br#"{"message":{"code":1}}"#), "HTTP 404 Not Found");
    }

    #[test]
    fn test_unknown_status_description() {
        assert_eq!(status_description(599), "HTTP 599");
    }

    #[test]
    fn test_application_error() {
        match application_error(404, br#"{"message":"not found"}"#) {
            Error::Application { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
