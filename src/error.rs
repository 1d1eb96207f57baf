use std::io;

use thiserror::Error;

/// Errors surfaced by the fetch and bootstrap operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Transport-level failure of an outbound request (connect, DNS, body read, bad URL).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The listening socket could not be acquired.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
