use crate::data::{ErrorInfo, Phase, RetrievalState};

/// Inputs of the retrieval state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Action<T> {
    /// A new attempt started.
    Request,
    /// The attempt produced a payload.
    Success(T),
    /// The attempt failed.
    Failure(ErrorInfo),
}

/// Apply an action to a state.
///
/// `Request` clears both `data` and `error`, so a snapshot never carries a
/// result from an earlier target while loading.
///
/// # Examples
///
/// ```
/// use fetchstate::{reduce, Action, Phase, RetrievalState};
///
/// let state = reduce(RetrievalState::idle(), Action::Request);
/// assert_eq!(state.phase, Phase::Loading);
///
/// let state = reduce(state, Action::Success(vec![1, 2, 3]));
/// assert_eq!(state.phase, Phase::Fetched);
/// assert_eq!(state.data, Some(vec![1, 2, 3]));
/// ```
pub fn reduce<T>(_state: RetrievalState<T>, action: Action<T>) -> RetrievalState<T> {
    match action {
        Action::Request => RetrievalState::loading(),
        Action::Success(payload) => RetrievalState::fetched(payload),
        Action::Failure(error) => RetrievalState::failed(error),
    }
}

/// Phase an action leads to, independent of the current state.
pub fn target_phase<T>(action: &Action<T>) -> Phase {
    match action {
        Action::Request => Phase::Loading,
        Action::Success(_) => Phase::Fetched,
        Action::Failure(_) => Phase::Failed,
    }
}
