//! Session store error types.

/// Errors that can occur during session store operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Failed to load a session.
    #[error("failed to load session '{id}': {reason}")]
    Read { id: String, reason: String },

    /// Failed to store a session.
    #[error("failed to save session '{id}': {reason}")]
    Write { id: String, reason: String },

    /// Failed to drop a session.
    #[error("failed to remove session '{id}': {reason}")]
    Delete { id: String, reason: String },
}
