use thiserror::Error;

/// Classified failure returned by every protocol capability.
///
/// The coordination core matches these kinds exhaustively; the variant
/// chosen by an implementation decides whether the core retries, rebuilds
/// the session, or surfaces the failure and stops.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The service rejected the stored credentials. Not retried
    /// automatically; the user has to re-authenticate.
    #[error("credentials rejected by the scrobble service")]
    BadCredentials,

    /// The current session is no longer accepted by the service. Not a
    /// network failure; the session must be rebuilt via a new handshake.
    #[error("session no longer valid, re-handshake required")]
    StaleSession,

    /// Recoverable failure (timeouts, 5xx, connectivity). Retried with
    /// backoff.
    #[error("temporary failure: {0}")]
    Transient(String),

    /// Unclassified, unexpected failure. Logged and surfaced, never
    /// auto-retried within the same pass.
    #[error("failure: {0}")]
    Failure(String),
}

/// Error type for [`CredentialStore`](crate::store::CredentialStore) operations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("credential store not available: {0}")]
    NotAvailable(String),

    #[error("credential store operation failed: {0}")]
    OperationFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ApiError>;
