//! Transport-level failures of the remote carrier/warehouse client.
//!
//! Business outcomes never show up here; they are status tags on the
//! response types. A [`RemoteError`] means the call itself did not produce a
//! usable answer, and callers treat it as transient.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoteError {
    /// The remote answered with a non-success HTTP status and a body that is
    /// not a recognised status payload.
    #[error("remote returned status {status}: {message}")]
    Api { status: u16, message: String },

    /// A success response whose body does not match the expected shape.
    #[error("failed to decode remote response: {0}")]
    Decode(String),

    #[error("invalid remote base url: {0}")]
    InvalidUrl(String),

    /// Connection refused, DNS failure, timeout and friends.
    #[error("network error: {0}")]
    Http(#[from] reqwest::Error),
}
