use bcrypt::{hash, verify};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use crate::models::AuthPayload;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
    #[error("invalid or expired token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

pub fn hash_password(password: &str, cost: u32) -> Result<String, AuthError> {
    Ok(hash(password, cost)?)
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    Ok(verify(password, hash)?)
}

/// Issues and checks HS256 tokens carrying a user id.
///
/// Verification is a pure function of the shared secret and the clock:
/// a token is accepted only with a valid signature and an unexpired `exp`.
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    pub fn issue(&self, subject: &str) -> Result<String, AuthError> {
        self.issue_at(subject, Utc::now())
    }

    /// Issue a token as if it had been created at `issued_at`.
    pub fn issue_at(&self, subject: &str, issued_at: DateTime<Utc>) -> Result<String, AuthError> {
        let claims = AuthPayload {
            sub: subject.to_owned(),
            iat: unix_seconds(issued_at),
            exp: unix_seconds(issued_at + self.ttl),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    pub fn verify(&self, token: &str) -> Result<AuthPayload, AuthError> {
        let token_data = decode::<AuthPayload>(token, &self.decoding, &self.validation)?;
        Ok(token_data.claims)
    }
}

fn unix_seconds(at: DateTime<Utc>) -> usize {
    usize::try_from(at.timestamp()).unwrap_or(0)
}
