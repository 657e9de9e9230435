use thiserror::Error;

/// Error types for song service operations.
///
/// This enum covers everything that can go wrong between the caller and the
/// song service: rejected input, transport failures, credential problems and
/// domain failures reported by the server.
///
/// The type is `Clone` because a single fetch result is shared by every
/// caller that joined the same in-flight query.
///
/// # Error Handling Examples
///
/// ```rust,no_run
/// use top5_client::{SongBoard, Top5Error};
///
/// # async fn run(board: &SongBoard) {
/// match board.approve("song-1").await {
///     Ok(_) => println!("Approved"),
///     Err(Top5Error::Unauthorized(msg)) => eprintln!("Please log in again: {}", msg),
///     Err(Top5Error::NotFound(msg)) => eprintln!("Song is gone: {}", msg),
///     Err(Top5Error::Http(msg)) => eprintln!("Network error: {}", msg),
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// # }
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Top5Error {
    /// Input rejected locally before any request was made.
    ///
    /// Raised by the validating constructors (YouTube URLs, titles, login
    /// and registration forms). Never produced by a network call.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// HTTP/network related errors.
    ///
    /// This includes connection failures, timeouts surfaced by the transport,
    /// DNS errors, and other low-level networking issues.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The service rejected the credential.
    ///
    /// Not retryable. The session is cleared when this is observed so the
    /// presenting layer can ask the user to authenticate again.
    #[error("Authorization failed: {0}")]
    Unauthorized(String),

    /// The targeted song no longer exists (e.g. a double delete).
    #[error("Not found: {0}")]
    NotFound(String),

    /// The service refused the operation because of conflicting state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Any other non-success response from the service.
    #[error("Request failed with status {status}: {message}")]
    Api {
        /// HTTP status code returned by the service
        status: u16,
        /// Message extracted from the response body
        message: String,
    },

    /// Failed to parse the service's response.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Reading or writing the persisted session failed.
    #[error("Session storage error: {0}")]
    Storage(String),
}

impl Top5Error {
    /// Whether this failure means the stored credential is no longer usable.
    pub fn requires_reauthentication(&self) -> bool {
        matches!(self, Top5Error::Unauthorized(_))
    }
}
