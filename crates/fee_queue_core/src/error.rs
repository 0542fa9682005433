//! crates/fee_queue_core/src/error.rs
//!
//! The tagged error taxonomy shared by the core services and the storage
//! ports. The HTTP layer maps each variant to a status code.

/// Every way a core operation can fail.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Malformed or missing input, e.g. a non-positive amount.
    #[error("{0}")]
    Validation(String),

    /// A referenced counter, fee type, entry, or profile does not exist.
    #[error("{0}")]
    NotFound(String),

    /// A transition was attempted on a terminal or already-claimed entry.
    #[error("{0}")]
    InvalidState(String),

    /// Unknown identifier or password mismatch at login.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Bearer credential with a bad signature, bad shape, or past expiry.
    #[error("Invalid token")]
    InvalidToken,

    /// The credential verified but the account has been deactivated.
    #[error("User not found or inactive")]
    InactiveAccount,

    /// Underlying persistence failure.
    #[error("Storage error: {0}")]
    Storage(String),
}

/// A convenience type alias for `Result<T, CoreError>`.
pub type CoreResult<T> = Result<T, CoreError>;
