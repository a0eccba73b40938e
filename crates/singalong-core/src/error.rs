//! Error types for `singalong-core`.
//!
//! [`ApiError`] covers transport-level failures talking to the upstream API.
//! [`GatewayError`] is the taxonomy the front door renders: four expected
//! domain outcomes plus a single upstream-failure class. Variants never carry
//! the credential.

/// Transport-level failures from the upstream API client.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request did not complete within the configured deadline.
    #[error("upstream request to '{url}' timed out")]
    Timeout { url: String },

    /// Connection, TLS, or other transport failure.
    #[error("upstream request to '{url}' failed: {reason}")]
    Network { url: String, reason: String },

    /// The upstream answered with a status the caller did not expect.
    #[error("upstream returned HTTP {status} for '{url}'")]
    UnexpectedStatus { url: String, status: u16 },

    /// A successful response body could not be decoded.
    #[error("failed to decode upstream response from '{url}': {reason}")]
    Decode { url: String, reason: String },

    /// The HTTP client itself could not be constructed.
    #[error("failed to build upstream client: {reason}")]
    Client { reason: String },
}

/// Outcome of resolving and fetching a page, as seen by the caller.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The upstream rejected the credential.
    #[error("credential rejected by upstream")]
    InvalidCredential,

    /// No group matched the configured group name.
    #[error("unknown group '{group}'")]
    UnknownGroup { group: String },

    /// The group has no project with this exact name.
    #[error("unknown project '{project}'")]
    UnknownProject { project: String },

    /// The project exists but has no `{path}.html` file.
    #[error("file '{path}.html' missing in project '{project}'")]
    FileMissing { project: String, path: String },

    /// The upstream could not be reached or misbehaved.
    #[error("upstream unavailable: {0}")]
    Upstream(#[from] ApiError),
}

impl GatewayError {
    /// Whether this error should clear the stored session credential.
    #[must_use]
    pub fn invalidates_credential(&self) -> bool {
        matches!(self, Self::InvalidCredential)
    }
}
