use thiserror::Error;

/// Failure talking to the remote catalog API.
///
/// The response body is never inspected for application error codes; a non-2xx
/// status, a transport fault, and an unreadable payload are the only
/// distinctions made, and all of them collapse into the same user-visible
/// error state at the controller boundary.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("server returned status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("unexpected payload: {0}")]
    Decode(String),
}
