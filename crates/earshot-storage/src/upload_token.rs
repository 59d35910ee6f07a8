//! Signed grant for direct PUT uploads.
//!
//! Payload: expiry_ts (u64 BE) || SHA-256(key) || SHA-256(content_type).
//! Token = base64url(payload || HMAC-SHA256(secret, payload)).
//! Binding the grant to hashes of the key and content type keeps the token a
//! fixed size while still rejecting any mismatch at verification time.

use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::traits::StorageError;

const PAYLOAD_LEN: usize = 8 + 32 + 32; // expiry + key hash + content-type hash
const MAC_LEN: usize = 32;
const TOKEN_LEN: usize = PAYLOAD_LEN + MAC_LEN;

fn payload_for(expiry_ts: u64, key: &str, content_type: &str) -> [u8; PAYLOAD_LEN] {
    let mut payload = [0u8; PAYLOAD_LEN];
    payload[0..8].copy_from_slice(&expiry_ts.to_be_bytes());
    payload[8..40].copy_from_slice(&Sha256::digest(key.as_bytes()));
    payload[40..72].copy_from_slice(&Sha256::digest(content_type.as_bytes()));
    payload
}

/// Build a signed upload grant for the given key and content type.
pub fn create(key: &str, content_type: &str, expires_in: Duration, secret: &[u8]) -> String {
    let expiry_ts = SystemTime::now()
        .checked_add(expires_in)
        .unwrap_or(SystemTime::UNIX_EPOCH)
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let payload = payload_for(expiry_ts, key, content_type);

    let mut mac = Hmac::<Sha256>::new_from_slice(secret).expect("HMAC accepts any key size");
    mac.update(&payload);
    let tag = mac.finalize().into_bytes();

    let mut token_bytes = [0u8; TOKEN_LEN];
    token_bytes[0..PAYLOAD_LEN].copy_from_slice(&payload);
    token_bytes[PAYLOAD_LEN..].copy_from_slice(&tag);

    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(token_bytes)
}

/// Verify a grant against the key and content type of the incoming PUT.
pub fn verify(
    token: &str,
    key: &str,
    content_type: &str,
    secret: &[u8],
) -> Result<(), StorageError> {
    let decoded = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(token)
        .map_err(|_| StorageError::InvalidSignature("malformed upload token".to_string()))?;
    if decoded.len() != TOKEN_LEN {
        return Err(StorageError::InvalidSignature(
            "malformed upload token".to_string(),
        ));
    }

    let (payload, tag) = decoded.split_at(PAYLOAD_LEN);
    let mut mac = Hmac::<Sha256>::new_from_slice(secret).expect("HMAC accepts any key size");
    mac.update(payload);
    mac.verify_slice(tag)
        .map_err(|_| StorageError::InvalidSignature("invalid upload signature".to_string()))?;

    let expiry_ts = u64::from_be_bytes(payload[0..8].try_into().expect("fixed layout"));
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    if now > expiry_ts {
        return Err(StorageError::InvalidSignature(
            "upload URL has expired".to_string(),
        ));
    }

    let expected = payload_for(expiry_ts, key, content_type);
    // signature already verified; payload mismatch means the grant was issued
    // for a different key or content type
    if payload != expected {
        return Err(StorageError::InvalidSignature(
            "upload grant does not match this object".to_string(),
        ));
    }

    Ok(())
}
