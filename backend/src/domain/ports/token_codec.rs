//! Port for issuing and verifying bearer tokens.

use chrono::{DateTime, Utc};

use crate::domain::{IssuedToken, TokenSubject, User};

use super::define_port_error;

define_port_error! {
    /// Failures raised by token codecs.
    pub enum TokenCodecError {
        /// A token could not be produced.
        Encode { message: String } => "token encoding failed: {message}",
        /// The presented token is malformed, forged or unreadable.
        Invalid { message: String } => "token rejected: {message}",
        /// The presented token has expired.
        Expired => "token expired",
    }
}

/// Sign and verify bearer tokens.
///
/// Expiry is checked against the caller-supplied `now` so services stay in
/// control of time.
#[cfg_attr(test, mockall::automock)]
pub trait TokenCodec: Send + Sync {
    /// Issue a token for `user` valid from `issued_at`.
    fn issue(&self, user: &User, issued_at: DateTime<Utc>) -> Result<IssuedToken, TokenCodecError>;

    /// Verify `token` and return its subject.
    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<TokenSubject, TokenCodecError>;
}
