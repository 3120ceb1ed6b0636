use std::fmt;

use serde::Serialize;

use crate::error::Error;

/// Progress marker of a retrieval.
///
/// A controller starts in `Idle`, enters `Loading` whenever a new target is
/// adopted and ends each attempt in either `Fetched` or `Failed`:
///
/// Idle → Loading → Fetched | Failed
///
/// Adopting another target re-enters `Loading` from any phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// No target adopted, or no attempt started yet.
    #[default]
    Idle,

    /// An attempt for the current target is in flight.
    Loading,

    /// The attempt resolved and `data` holds the payload.
    Fetched,

    /// The attempt failed and `error` describes why.
    Failed,
}

impl Phase {
    /// Returns `true` for the two terminal phases of an attempt.
    #[must_use]
    pub fn is_settled(&self) -> bool { matches!(self, Phase::Fetched | Phase::Failed) }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Idle => write!(f, "idle"),
            Phase::Loading => write!(f, "loading"),
            Phase::Fetched => write!(f, "fetched"),
            Phase::Failed => write!(f, "failed"),
        }
    }
}

/// Where a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// The transport itself failed (connectivity, client setup).
    Transport,
    /// The transport completed with a non-success status.
    Application,
    /// The body could not be decoded into the expected payload.
    Decode,
}

/// Failure description carried by a `Failed` state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    /// Human-readable message, never empty.
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

const FALLBACK_MESSAGE: &str = "request failed";

impl ErrorInfo {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() { FALLBACK_MESSAGE.to_string() } else { message };
        Self { kind, message, status: None }
    }

    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.message) }
}

impl From<&Error> for ErrorInfo {
    fn from(e: &Error) -> Self {
        match e {
            Error::Application { status, message } => {
                ErrorInfo::new(ErrorKind::Application, message.as_str()).with_status(*status)
            }
            Error::Decode(_) => ErrorInfo::new(ErrorKind::Decode, e.to_string()),
            _ => ErrorInfo::new(ErrorKind::Transport, e.to_string()),
        }
    }
}

impl From<Error> for ErrorInfo {
    fn from(e: Error) -> Self { ErrorInfo::from(&e) }
}

/// Snapshot of a retrieval as seen by observers.
///
/// At most one of `data` and `error` is populated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalState<T> {
    pub phase: Phase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl<T> RetrievalState<T> {
    pub fn idle() -> Self { Self { phase: Phase::Idle, data: None, error: None } }

    pub fn loading() -> Self { Self { phase: Phase::Loading, data: None, error: None } }

    pub fn fetched(data: T) -> Self { Self { phase: Phase::Fetched, data: Some(data), error: None } }

    pub fn failed(error: ErrorInfo) -> Self { Self { phase: Phase::Failed, data: None, error: Some(error) } }

    #[must_use]
    pub fn is_idle(&self) -> bool { self.phase == Phase::Idle }

    #[must_use]
    pub fn is_loading(&self) -> bool { self.phase == Phase::Loading }

    #[must_use]
    pub fn is_settled(&self) -> bool { self.phase.is_settled() }

    pub fn data(&self) -> Option<&T> { self.data.as_ref() }

    pub fn error(&self) -> Option<&ErrorInfo> { self.error.as_ref() }
}

impl<T> Default for RetrievalState<T> {
    fn default() -> Self { Self::idle() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_idle() {
        let state: RetrievalState<u32> = RetrievalState::default();
        assert!(state.is_idle());
        assert!(state.data.is_none());
        assert!(state.error.is_none());
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::Idle.to_string(), "idle");
        assert_eq!(Phase::Loading.to_string(), "loading");
        assert_eq!(Phase::Fetched.to_string(), "fetched");
        assert_eq!(Phase::Failed.to_string(), "failed");
    }

    #[test]
    fn test_phase_is_settled() {
        assert!(!Phase::Idle.is_settled());
        assert!(!Phase::Loading.is_settled());
        assert!(Phase::Fetched.is_settled());
        assert!(Phase::Failed.is_settled());
    }

    #[test]
    fn test_error_info_never_empty() {
        let info = ErrorInfo::new(ErrorKind::Transport, "   ");
        assert_eq!(info.message, "request failed");
    }

    #[test]
    fn test_error_info_from_application_error() {
        let err = Error::Application { status: 404, message: "not found".to_string() };
        let info = ErrorInfo::from(&err);
        assert_eq!(info.kind, ErrorKind::Application);
        assert_eq!(info.message, "not found");
        assert_eq!(info.status, Some(404));
    }

    #[test]
    fn test_error_info_from_decode_error() {
        let err = Error::Decode("expected value at line 1 column 1".to_string());
        let info = ErrorInfo::from(err);
        assert_eq!(info.kind, ErrorKind::Decode);
        assert!(info.message.contains("malformed response body"));
        assert_eq!(info.status, None);
    }

    #[test]
    fn test_state_serializes_without_empty_fields() {
        let state = RetrievalState::fetched(vec![1, 2, 3]);
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json, serde_json::json!({ "phase": "fetched", "data": [1, 2, 3] }));

        let state: RetrievalState<()> =
            RetrievalState::failed(ErrorInfo::new(ErrorKind::Application, "not found").with_status(404));
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "phase": "failed",
                "error": { "kind": "application", "message": "not found", "status": 404 }
            })
        );
    }
}
