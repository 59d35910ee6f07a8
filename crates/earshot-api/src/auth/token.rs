//! Stateless signed auth tokens.
//!
//! Payload: `subject_id|expires_at|issued_at`, pipe-separated. The HMAC-SHA256
//! hex signature over the payload is appended with the same separator, and the
//! whole string is base64url-encoded. Verification recomputes the signature in
//! constant time before looking at expiry, so tampered tokens never reach the
//! expiry branch.

use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};
use subtle::ConstantTimeEq;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Missing authorization header")]
    MissingHeader,

    #[error("Invalid token format")]
    BadFormat,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Token expired")]
    Expired,

    #[error("Invalid subject id")]
    InvalidSubject,
}

/// Issues and verifies stateless auth tokens.
#[derive(Clone)]
pub struct TokenService {
    secret: Vec<u8>,
    ttl_secs: u64,
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

impl TokenService {
    pub fn new(secret: Vec<u8>, ttl_secs: u64) -> Self {
        Self { secret, ttl_secs }
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    fn sign(&self, payload: &str) -> String {
        let mut mac =
            Hmac::<Sha256>::new_from_slice(&self.secret).expect("HMAC accepts any key size");
        mac.update(payload.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Issue a token for `subject_id`, valid for the configured TTL.
    /// Subject ids containing the field separator are rejected: a `|` in the
    /// subject would shift the payload fields and forge a different claim.
    pub fn issue(&self, subject_id: &str) -> Result<String, AuthError> {
        self.issue_at(subject_id, unix_now())
    }

    pub(crate) fn issue_at(&self, subject_id: &str, now: u64) -> Result<String, AuthError> {
        if subject_id.is_empty() || subject_id.contains('|') {
            return Err(AuthError::InvalidSubject);
        }

        let expires_at = now + self.ttl_secs;
        let payload = format!("{}|{}|{}", subject_id, expires_at, now);
        let signature = self.sign(&payload);
        let token = format!("{}|{}", payload, signature);

        Ok(base64::engine::general_purpose::URL_SAFE.encode(token.as_bytes()))
    }

    /// Verify a token and return its subject id.
    pub fn verify(&self, token: &str) -> Result<String, AuthError> {
        self.verify_at(token, unix_now())
    }

    pub(crate) fn verify_at(&self, token: &str, now: u64) -> Result<String, AuthError> {
        let decoded = base64::engine::general_purpose::URL_SAFE
            .decode(token)
            .map_err(|_| AuthError::BadFormat)?;
        let decoded = String::from_utf8(decoded).map_err(|_| AuthError::BadFormat)?;

        let parts: Vec<&str> = decoded.split('|').collect();
        if parts.len() != 4 {
            return Err(AuthError::BadFormat);
        }
        let (subject_id, expires_at, issued_at, signature) =
            (parts[0], parts[1], parts[2], parts[3]);

        let payload = format!("{}|{}|{}", subject_id, expires_at, issued_at);
        let expected = self.sign(&payload);
        let matches: bool = expected.as_bytes().ct_eq(signature.as_bytes()).into();
        if !matches {
            return Err(AuthError::InvalidSignature);
        }

        let expires_at: u64 = expires_at.parse().map_err(|_| AuthError::BadFormat)?;
        if now > expires_at {
            return Err(AuthError::Expired);
        }

        Ok(subject_id.to_string())
    }
}
