use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::core::{Action, reduce, target_phase};
use crate::data::{ControllerOptions, ErrorInfo, Phase, RequestDescriptor, RetrievalState, TransitionCallback, TransitionEvent};
use crate::effects::cache::ResponseCache;
use crate::effects::cancel::CancellationFlag;
use crate::effects::transport::{Transport, retrieve};

/// Why a transition was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Applied(Phase),
    TornDown,
    Superseded,
}

/// State shared between a controller and the tasks it spawns.
struct Shared<T> {
    state: watch::Sender<RetrievalState<T>>,
    cache: Option<ResponseCache<T>>,
    cancel: CancellationFlag,
    generation: AtomicU64,
    discard_superseded: bool,
    on_transition: Option<TransitionCallback>,
    /// Serializes check, write and observer call of every transition, and
    /// teardown against all three.
    transitions: Mutex<()>,
}

impl<T> Shared<T> {
    fn lock_transitions(&self) -> MutexGuard<'_, ()> {
        self.transitions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `action` unless the controller was torn down or, with the
    /// generation guard on, a newer attempt started.
    ///
    /// Runs under the transition lock, so observers see transitions in the
    /// order they were written and a newer attempt's `Request` is never
    /// followed by an older attempt's result.
    fn apply(&self, generation: u64, target: &str, action: Action<T>) -> bool {
        let _guard = self.lock_transitions();
        let mut outcome = Outcome::TornDown;

        self.state.send_if_modified(|state| {
            if self.cancel.is_armed() {
                return false;
            }
            if self.discard_superseded && self.generation.load(Ordering::SeqCst) != generation {
                outcome = Outcome::Superseded;
                return false;
            }
            outcome = Outcome::Applied(target_phase(&action));
            *state = reduce(std::mem::take(state), action);
            true
        });

        match outcome {
            Outcome::Applied(phase) => {
                trace!(url = %target, generation, %phase, "transition applied");
                if let Some(ref callback) = self.on_transition {
                    callback(&TransitionEvent { target: target.to_string(), generation, phase });
                }
                true
            }
            Outcome::TornDown => {
                debug!(url = %target, generation, "discarding result: controller torn down");
                false
            }
            Outcome::Superseded => {
                debug!(url = %target, generation, "discarding result: attempt superseded");
                false
            }
        }
    }

    /// Arm the flag once no transition is in flight.
    fn tear_down(&self) -> bool {
        let _guard = self.lock_transitions();
        self.cancel.arm()
    }
}

/// Handle to one retrieval attempt started by [`FetchController::set_target`].
///
/// Dropping it does not affect the attempt.
#[derive(Debug, Default)]
pub struct Attempt {
    generation: Option<u64>,
    handle: Option<JoinHandle<()>>,
}

impl Attempt {
    fn skipped() -> Self { Self::default() }

    /// Generation the attempt was tagged with, `None` if nothing was started.
    pub fn generation(&self) -> Option<u64> { self.generation }

    /// `true` while a transport call is still running.
    pub fn is_pending(&self) -> bool { self.handle.as_ref().is_some_and(|h| !h.is_finished()) }

    /// Wait until the attempt has applied (or discarded) its result.
    pub async fn settled(self) {
        if let Some(handle) = self.handle
            && let Err(e) = handle.await
        {
            warn!(generation = ?self.generation, error = %e, "retrieval task did not complete");
        }
    }
}

/// Performs one retrieval per adopted target and exposes its progress.
///
/// State moves `Idle → Loading → Fetched | Failed`; adopting a new target
/// re-enters `Loading` synchronously. Failures are reported as state, never
/// returned. After [`teardown`](Self::teardown), or once the controller is
/// dropped, no attempt changes the state again.
///
/// Attempts run on the ambient tokio runtime, so `set_target` must be called
/// from within one.
///
/// # Examples
///
/// ```no_run
/// use fetchstate::{FetchController, Phase, ReqwestTransport};
///
/// # async fn example() -> Result<(), fetchstate::Error> {
/// let mut controller = FetchController::<Vec<u32>, _>::new(ReqwestTransport::new()?);
/// let attempt = controller.set_target("https://example.com/items");
/// assert_eq!(controller.state().phase, Phase::Loading);
///
/// attempt.settled().await;
/// if let Some(items) = controller.state().data {
///     println!("{} items", items.len());
/// }
/// # Ok(())
/// # }
/// ```
pub struct FetchController<T, C> {
    transport: Arc<C>,
    shared: Arc<Shared<T>>,
    current: Option<RequestDescriptor>,
}

impl<T, C> FetchController<T, C>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
    C: Transport,
{
    pub fn new(transport: C) -> Self { Self::with_options(transport, ControllerOptions::default()) }

    pub fn with_options(transport: C, options: ControllerOptions) -> Self {
        let (state, _) = watch::channel(RetrievalState::idle());
        Self {
            transport: Arc::new(transport),
            shared: Arc::new(Shared {
                state,
                cache: options.cache.then(ResponseCache::new),
                cancel: CancellationFlag::new(),
                generation: AtomicU64::new(0),
                discard_superseded: options.discard_superseded,
                on_transition: options.on_transition,
                transitions: Mutex::new(()),
            }),
            current: None,
        }
    }

    /// Adopt a new activation key.
    ///
    /// A target equal to the current one is ignored, an empty one behaves
    /// like [`clear_target`](Self::clear_target). Otherwise the state enters
    /// `Loading` before this returns; a cached payload is applied
    /// immediately, anything else is retrieved on a spawned task.
    pub fn set_target(&mut self, descriptor: impl Into<RequestDescriptor>) -> Attempt {
        let descriptor = descriptor.into();

        if self.shared.cancel.is_armed() {
            debug!(url = %descriptor.target, "ignoring target: controller torn down");
            return Attempt::skipped();
        }
        if descriptor.is_empty() {
            self.clear_target();
            return Attempt::skipped();
        }
        if self.current.as_ref().is_some_and(|c| c.target == descriptor.target) {
            return Attempt::skipped();
        }

        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.current = Some(descriptor.clone());
        debug!(url = %descriptor.target, generation, "starting retrieval");

        self.shared.apply(generation, &descriptor.target, Action::Request);

        if let Some(payload) = self.shared.cache.as_ref().and_then(|c| c.get(&descriptor.target)) {
            debug!(url = %descriptor.target, generation, "cache hit");
            self.shared.apply(generation, &descriptor.target, Action::Success(payload));
            return Attempt { generation: Some(generation), handle: None };
        }

        let shared = Arc::clone(&self.shared);
        let transport = Arc::clone(&self.transport);
        let handle = tokio::spawn(async move {
            let RequestDescriptor { target, options } = descriptor;
            let action = match retrieve::<C, T>(&*transport, &target, options.as_ref()).await {
                Ok(payload) => {
                    if let Some(ref cache) = shared.cache {
                        cache.insert(target.clone(), payload.clone());
                    }
                    Action::Success(payload)
                }
                Err(e) => Action::Failure(ErrorInfo::from(&e)),
            };
            shared.apply(generation, &target, action);
        });

        Attempt { generation: Some(generation), handle: Some(handle) }
    }

    /// Drop the activation key. Starts nothing and leaves the state as is;
    /// adopting the same target again starts a fresh attempt.
    pub fn clear_target(&mut self) {
        if let Some(previous) = self.current.take() {
            debug!(url = %previous.target, "target cleared");
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> RetrievalState<T> { self.shared.state.borrow().clone() }

    /// Receiver notified on every applied transition.
    pub fn subscribe(&self) -> watch::Receiver<RetrievalState<T>> { self.shared.state.subscribe() }
}

impl<T, C> FetchController<T, C> {
    /// Deliver the lifecycle signal: no pending or future attempt will
    /// change the state after this.
    ///
    /// Waits for a transition already being applied, including its
    /// `on_transition` call, before returning.
    pub fn teardown(&self) {
        if self.shared.tear_down() {
            debug!(generation = self.generation(), "controller torn down");
        }
    }

    #[must_use]
    pub fn is_torn_down(&self) -> bool { self.shared.cancel.is_armed() }

    /// The flag armed by [`teardown`](Self::teardown), for scopes that end
    /// without access to the controller.
    pub fn cancellation_flag(&self) -> CancellationFlag { self.shared.cancel.clone() }

    /// Currently adopted target, if any.
    pub fn target(&self) -> Option<&str> { self.current.as_ref().map(|c| c.target.as_str()) }

    /// Generation of the most recent attempt; 0 before the first one.
    pub fn generation(&self) -> u64 { self.shared.generation.load(Ordering::SeqCst) }

    /// The response cache, if enabled.
    pub fn cache(&self) -> Option<&ResponseCache<T>> { self.shared.cache.as_ref() }
}

impl<T, C> Drop for FetchController<T, C> {
    fn drop(&mut self) { self.teardown(); }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::data::RequestOptions;
    use crate::effects::transport::TransportResponse;

    #[derive(Debug)]
    struct Unreachable;

    impl std::fmt::Display for Unreachable {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "unreachable") }
    }

    impl std::error::Error for Unreachable {}

    /// Transport that must never be called.
    struct NoTransport;

    impl Transport for NoTransport {
        type Error = Unreachable;

        async fn perform(
            &self,
            target: &str,
            _options: Option<&RequestOptions>,
        ) -> std::result::Result<TransportResponse, Self::Error> {
            panic!("transport invoked for {target}");
        }
    }

    #[test]
    fn test_new_controller_is_idle() {
        let controller = FetchController::<u32, _>::new(NoTransport);
        assert!(controller.state().is_idle());
        assert_eq!(controller.target(), None);
        assert_eq!(controller.generation(), 0);
        assert!(controller.cache().is_some());
    }

    #[test]
    fn test_cache_disabled() {
        let controller = FetchController::<u32, _>::with_options(NoTransport, ControllerOptions::default().cache(false));
        assert!(controller.cache().is_none());
    }

    #[test]
    fn test_empty_target_stays_idle() {
        let mut controller = FetchController::<u32, _>::new(NoTransport);
        let attempt = controller.set_target("");
        assert_eq!(attempt.generation(), None);
        assert!(!attempt.is_pending());
        assert!(controller.state().is_idle());
        assert_eq!(controller.generation(), 0);
    }

    #[test]
    fn test_cached_target_does_not_spawn() {
        let mut controller = FetchController::<u32, _>::new(NoTransport);
        controller.cache().unwrap().insert("/n", 5);

        let attempt = controller.set_target("/n");
        assert_eq!(attempt.generation(), Some(1));
        assert!(!attempt.is_pending());
        assert_eq!(controller.state(), RetrievalState::fetched(5));
    }

    #[test]
    fn test_teardown_is_idempotent() {
        let controller = FetchController::<u32, _>::new(NoTransport);
        let flag = controller.cancellation_flag();
        controller.teardown();
        controller.teardown();
        assert!(controller.is_torn_down());
        assert!(flag.is_armed());
    }

    #[test]
    fn test_set_target_after_teardown_is_ignored() {
        let mut controller = FetchController::<u32, _>::new(NoTransport);
        controller.teardown();
        let attempt = controller.set_target("/items");
        assert_eq!(attempt.generation(), None);
        assert!(controller.state().is_idle());
        assert_eq!(controller.target(), None);
    }

    #[test]
    fn test_drop_arms_flag() {
        let controller = FetchController::<u32, _>::new(NoTransport);
        let flag = controller.cancellation_flag();
        drop(controller);
        assert!(flag.is_armed());
    }
}
