//! Bearer credential newtype.
//!
//! A [`Credential`] is the user's personal access token. It is never
//! validated up front; the upstream API accepts or rejects it. The inner
//! string is zeroized on drop and never exposed in `Debug` output.

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

/// An opaque bearer token, compared by value.
#[derive(Clone, PartialEq, Eq, Hash, Zeroize, ZeroizeOnDrop)]
pub struct Credential(String);

impl Credential {
    /// Wrap a raw token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Borrow the raw token.
    ///
    /// The caller must not log or persist this value.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether the token is empty (or only whitespace).
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&"[REDACTED]").finish()
    }
}
