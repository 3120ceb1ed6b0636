//! Pure transformations: the state transition reducer and failure-message
//! extraction. Nothing here performs I/O or touches shared state.

mod message;
mod transition;

pub use message::{application_error, failure_message, status_description};
pub use transition::{Action, reduce, target_phase};
