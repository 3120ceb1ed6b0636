//! Immutable data types for retrieval.
//!
//! Request descriptors, controller options and the observable state
//! snapshot. None of these perform I/O.

pub mod options;
pub mod request;
pub mod state;

pub use options::{ControllerOptions, TransitionCallback, TransitionEvent};
pub use request::{RequestDescriptor, RequestOptions};
pub use state::{ErrorInfo, ErrorKind, Phase, RetrievalState};
