//! In-memory token store.
//!
//! Holds the access and refresh tokens of one session together with the
//! expiry read from each token's claims.

use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};

use crate::codec::decode_expiry;

/// Buffer before expiry at which a token already counts as expired (10 seconds).
pub const SKEW_BUFFER_MS: i64 = 10 * 1000;

// ============================================================================
// TokenRecord
// ============================================================================

/// A token value and its decoded expiry.
///
/// `expiry` is present only when `value` is present and decoded cleanly.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct TokenRecord {
    pub value: Option<String>,
    pub expiry: Option<DateTime<Utc>>,
}

impl TokenRecord {
    fn issue(token: &str) -> Self {
        Self {
            value: Some(token.to_string()),
            expiry: decode_expiry(token),
        }
    }

    /// Whether a token has been stored.
    pub fn is_issued(&self) -> bool {
        self.value.is_some()
    }

    /// Valid iff both fields are present and `expiry > now + 10s`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        match (&self.value, self.expiry) {
            (Some(_), Some(expiry)) => {
                expiry.timestamp_millis() > now.timestamp_millis() + SKEW_BUFFER_MS
            }
            _ => false,
        }
    }

    /// Time left before the declared expiry, zero once passed.
    pub fn expires_in(&self, now: DateTime<Utc>) -> Option<TimeDelta> {
        self.expiry
            .map(|expiry| (expiry - now).max(TimeDelta::zero()))
    }
}

impl fmt::Debug for TokenRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenRecord")
            .field("value", &self.value.as_ref().map(|_| "<redacted>"))
            .field("expiry", &self.expiry)
            .finish()
    }
}

// ============================================================================
// TokenStore
// ============================================================================

/// Access and refresh tokens for one session.
#[derive(Debug, Clone, Default)]
pub struct TokenStore {
    access: TokenRecord,
    refresh: TokenRecord,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an access token. An undecodable token is kept but never valid.
    pub fn set_access(&mut self, token: &str) {
        self.access = TokenRecord::issue(token);
    }

    /// Store a refresh token. An undecodable token is kept but never valid.
    pub fn set_refresh(&mut self, token: &str) {
        self.refresh = TokenRecord::issue(token);
    }

    pub fn is_access_valid(&self) -> bool {
        self.is_access_valid_at(Utc::now())
    }

    pub fn is_refresh_valid(&self) -> bool {
        self.is_refresh_valid_at(Utc::now())
    }

    pub fn is_access_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.access.is_valid_at(now)
    }

    pub fn is_refresh_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.refresh.is_valid_at(now)
    }

    pub fn access(&self) -> TokenRecord {
        self.access.clone()
    }

    pub fn refresh(&self) -> TokenRecord {
        self.refresh.clone()
    }

    pub fn clear_access(&mut self) {
        self.access = TokenRecord::default();
    }

    pub fn clear_refresh(&mut self) {
        self.refresh = TokenRecord::default();
    }

    pub fn clear_all(&mut self) {
        self.clear_access();
        self.clear_refresh();
    }

    /// The access token, if it is currently valid.
    pub(crate) fn valid_access(&self) -> Option<String> {
        if self.is_access_valid() {
            self.access.value.clone()
        } else {
            None
        }
    }

    /// The refresh token, if it is currently valid.
    pub(crate) fn valid_refresh(&self) -> Option<String> {
        if self.is_refresh_valid() {
            self.refresh.value.clone()
        } else {
            None
        }
    }
}
