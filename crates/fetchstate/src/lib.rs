//! Single-retrieval HTTP controller with observable state.
//!
//! A [`FetchController`] performs one retrieval per adopted target through an
//! injected [`Transport`], publishes each step as a [`RetrievalState`] and
//! guarantees that nothing is published once its owner has torn it down.
//!
//! # Architecture
//!
//! - [`data`] - Immutable request, option and state types
//! - [`core`](crate::core) - Pure transition and failure-message logic
//! - effects - Transport, cache, cancellation and the controller
//!
//! # Key Features
//!
//! - **Synchronous loading**: a new target is `loading` before any await point
//! - **Teardown safety**: a [`CancellationFlag`] checked before every transition
//! - **Superseded attempts**: generation tags keep late results from older targets out
//! - **Response cache**: repeat targets are served without touching the transport

pub mod core;
pub mod data;
mod effects;
mod error;

pub use crate::core::{Action, reduce};
pub use data::{
    ControllerOptions, ErrorInfo, ErrorKind, Phase, RequestDescriptor, RequestOptions, RetrievalState,
    TransitionCallback, TransitionEvent,
};
pub use effects::{Attempt, CancellationFlag, FetchController, ResponseCache, Transport, TransportResponse};

#[cfg(feature = "reqwest")]
pub use effects::{ReqwestTransport, TransportSettings};

pub use error::{Error, Result};
pub use http::Method;
