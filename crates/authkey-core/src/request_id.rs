//! Per-request nonce generation.
//!
//! The request id binds a response to the request that caused it and makes
//! captured signatures useless for other requests. It must be unique per
//! signing operation and hard to predict, but it is not a cryptographic
//! commitment.

use std::time::{SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use rand::RngExt;
use sha1::{Digest, Sha1};

/// Generate a request id: a random seed, a v4 UUID and a nanosecond clock
/// token, SHA-1 hashed and base64-encoded.
#[must_use]
pub fn generate() -> String {
    let seed: u64 = rand::rng().random();
    let unique = uuid::Uuid::new_v4();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_nanos());

    let token = format!("{seed}{unique}{nanos}");
    BASE64.encode(Sha1::digest(token.as_bytes()))
}
