//! Bearer credential carried by every authenticated backend call.
//!
//! DESIGN
//! ======
//! The credential is an explicit value handed to the directory, poller and
//! submitter rather than ambient global storage, so tests can inject a fake
//! token without touching process-wide state. Only the login collaborator
//! creates one; this crate never refreshes or revokes it.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::api::types::ApiError;

/// Access token plus optional expiry (unix seconds).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    #[serde(rename = "access_token")]
    token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_at: Option<u64>,
}

impl Credential {
    /// A token with no known expiry.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into(), expires_at: None }
    }

    #[must_use]
    pub fn with_expiry(token: impl Into<String>, expires_at: Option<u64>) -> Self {
        Self { token: token.into(), expires_at }
    }

    /// A freshly issued token valid for `ttl` from now.
    #[must_use]
    pub fn issued_now(token: impl Into<String>, ttl: Duration) -> Self {
        Self::with_expiry(token, Some(now_secs().saturating_add(ttl.as_secs())))
    }

    #[must_use]
    pub fn expires_at(&self) -> Option<u64> {
        self.expires_at
    }

    #[must_use]
    pub fn is_expired_at(&self, now: u64) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(now_secs())
    }

    /// Token for the `Authorization: Bearer` header.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthenticated`] if the token is blank or expired.
    pub fn bearer(&self) -> Result<&str, ApiError> {
        if self.token.trim().is_empty() || self.is_expired() {
            return Err(ApiError::Unauthenticated(None));
        }
        Ok(&self.token)
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

pub(crate) fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
