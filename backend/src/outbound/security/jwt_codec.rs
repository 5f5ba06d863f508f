//! HS256 JSON Web Token implementation of the `TokenCodec` port.
//!
//! Claims carry the subject id, role, issue time and expiry. Expiry is
//! compared with the `now` supplied by the caller rather than the system
//! clock, so the domain clock stays authoritative.

use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::ports::{TokenCodec, TokenCodecError};
use crate::domain::{IssuedToken, Role, TokenSubject, User, UserId};

/// Shortest accepted signing secret, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: Uuid,
    role: Role,
    iat: i64,
    exp: i64,
}

/// Signs and verifies bearer tokens with a shared secret.
#[derive(Clone)]
pub struct JwtTokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: TimeDelta,
}

impl JwtTokenCodec {
    /// Build a codec from `secret`, issuing tokens valid for `ttl`.
    ///
    /// # Errors
    /// [`TokenCodecError::Encode`] when the secret is shorter than
    /// [`MIN_SECRET_LEN`] bytes.
    pub fn new(secret: &[u8], ttl: TimeDelta) -> Result<Self, TokenCodecError> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(TokenCodecError::encode(format!(
                "signing secret must be at least {MIN_SECRET_LEN} bytes"
            )));
        }
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);
        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        })
    }
}

impl TokenCodec for JwtTokenCodec {
    fn issue(&self, user: &User, issued_at: DateTime<Utc>) -> Result<IssuedToken, TokenCodecError> {
        let expires_at = issued_at + self.ttl;
        let claims = Claims {
            sub: *user.id.as_uuid(),
            role: user.role,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|err| TokenCodecError::encode(err.to_string()))?;
        Ok(IssuedToken { token, expires_at })
    }

    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<TokenSubject, TokenCodecError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|err| {
            match err.kind() {
                ErrorKind::ExpiredSignature => TokenCodecError::expired(),
                _ => TokenCodecError::invalid(err.to_string()),
            }
        })?;
        let claims = data.claims;
        if claims.exp <= now.timestamp() {
            return Err(TokenCodecError::expired());
        }
        let expires_at = DateTime::from_timestamp(claims.exp, 0)
            .ok_or_else(|| TokenCodecError::invalid("expiry out of range"))?;
        Ok(TokenSubject {
            user_id: UserId::from_uuid(claims.sub),
            expires_at,
        })
    }
}
