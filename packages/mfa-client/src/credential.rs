//! Bearer credential bound to one login transaction.

use std::fmt;

/// Opaque bearer token authorizing requests on behalf of one transaction.
///
/// The token is supplied at construction and never changes. The core treats
/// it as a raw string; parsing JWT claims out of it is someone else's job.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
}

impl Credential {
    /// Wrap a bearer token value.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// The raw bearer value, as supplied at construction.
    pub fn token(&self) -> &str {
        &self.token
    }
}

// Bearer tokens must not end up in logs via {:?}.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .finish()
    }
}
