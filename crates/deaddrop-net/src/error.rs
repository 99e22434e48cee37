//! Error types for transport operations.

use thiserror::Error;
use url::Url;

/// Errors that can occur during relay and blob-store operations.
#[derive(Error, Debug)]
pub enum NetError {
    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status {
        /// Response status code.
        status: u16,
        /// Request URL.
        url: Url,
    },

    /// The requested resource no longer exists.
    ///
    /// Kept separate from [`NetError::Status`] because the channel
    /// treats expired inbox pointers and expired blobs as cleanup
    /// signals, not failures.
    #[error("Not found: {0}")]
    NotFound(Url),

    /// Connection, DNS or TLS failure.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The transport layer timed out.
    ///
    /// Under long-poll this is the relay's idle disconnect; the channel
    /// retries it when the caller has not cancelled.
    #[error("Request timed out")]
    Timeout,

    /// The caller's cancellation token fired while a request was in
    /// flight.
    #[error("Request cancelled")]
    Cancelled,

    /// A response body failed to parse.
    #[error("Invalid response body: {0}")]
    InvalidResponse(String),

    /// A request URL could not be constructed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for NetError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            NetError::Timeout
        } else {
            NetError::Connection(error.to_string())
        }
    }
}

/// Result type for transport operations.
pub type Result<T> = std::result::Result<T, NetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_distinguishable() {
        let url = Url::parse("https://relay.example/inbox/1/item/2").unwrap();
        let error = NetError::NotFound(url.clone());
        assert!(matches!(error, NetError::NotFound(u) if u == url));
    }
}
