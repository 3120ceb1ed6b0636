use std::fmt;
use std::sync::Arc;

use super::state::Phase;

/// An applied state transition, as reported to `on_transition`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionEvent {
    /// Target of the attempt that produced the transition (empty for a reset to idle).
    pub target: String,
    /// Generation of that attempt.
    pub generation: u64,
    /// Phase entered.
    pub phase: Phase,
}

pub type TransitionCallback = Arc<dyn Fn(&TransitionEvent) + Send + Sync>;

/// Controller configuration.
///
/// # Examples
///
/// ```
/// use fetchstate::ControllerOptions;
///
/// let options = ControllerOptions::default().cache(false);
/// assert!(!options.cache);
/// assert!(options.discard_superseded);
/// ```
#[derive(Clone)]
pub struct ControllerOptions {
    /// Keep successful payloads per target and serve repeats without the transport.
    ///
    /// Default: true
    pub cache: bool,

    /// Ignore results of attempts that were superseded by a newer target.
    ///
    /// Without this a slow attempt for an old target can overwrite the
    /// result of a newer one.
    ///
    /// Default: true
    pub discard_superseded: bool,

    /// Invoked after every applied transition.
    ///
    /// The state channel only keeps the latest snapshot; this sees each one,
    /// in the order they were applied. It runs while the controller holds
    /// its transition lock, so it must not call `set_target` or `teardown`.
    /// Reading `state()` is fine.
    ///
    /// Default: None
    pub on_transition: Option<TransitionCallback>,
}

impl fmt::Debug for ControllerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerOptions")
            .field("cache", &self.cache)
            .field("discard_superseded", &self.discard_superseded)
            .field("on_transition", &self.on_transition.as_ref().map(|_| "{ ... }"))
            .finish()
    }
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            cache: true,
            discard_superseded: true,
            on_transition: None,
        }
    }
}

impl ControllerOptions {
    #[must_use]
    pub fn cache(mut self, cache: bool) -> Self {
        self.cache = cache;
        self
    }

    #[must_use]
    pub fn discard_superseded(mut self, discard: bool) -> Self {
        self.discard_superseded = discard;
        self
    }

    /// Set the transition observer.
    ///
    /// # Examples
    ///
    /// ```
    /// use fetchstate::{ControllerOptions, Phase};
    /// use std::sync::Arc;
    ///
    /// let options = ControllerOptions::default().on_transition(Arc::new(|event| {
    ///     if event.phase == Phase::Failed {
    ///         eprintln!("{} failed", event.target);
    ///     }
    /// }));
    /// assert!(options.on_transition.is_some());
    /// ```
    #[must_use]
    pub fn on_transition(mut self, callback: TransitionCallback) -> Self {
        self.on_transition = Some(callback);
        self
    }
}
