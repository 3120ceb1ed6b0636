use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Teardown marker shared between a controller and its in-flight attempts.
///
/// Armed once when the owning scope ends; never disarmed. Clones observe the
/// same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self { Self::default() }

    /// Arm the flag. Returns `true` only for the call that armed it.
    pub fn arm(&self) -> bool { !self.0.swap(true, Ordering::SeqCst) }

    #[must_use]
    pub fn is_armed(&self) -> bool { self.0.load(Ordering::SeqCst) }
}
