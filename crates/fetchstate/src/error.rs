//! Error types for fetchstate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("{message}")]
    Application { status: u16, message: String },

    #[error("malformed response body: {0}")]
    Decode(String),

    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[cfg(feature = "reqwest")]
    #[error("invalid proxy URL {url}: {source}")]
    InvalidProxy {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[cfg(feature = "reqwest")]
    #[error("failed to build client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self { Error::Decode(e.to_string()) }
}

pub type Result<T> = std::result::Result<T, Error>;
