//! Effectful side of the crate: the transport abstraction, the response
//! cache, the teardown flag and the controller that ties them together.

mod cache;
mod cancel;
mod controller;
mod transport;

pub use cache::ResponseCache;
pub use cancel::CancellationFlag;
pub use controller::{Attempt, FetchController};
pub use transport::{Transport, TransportResponse};

#[cfg(feature = "reqwest")]
pub use transport::{ReqwestTransport, TransportSettings};
