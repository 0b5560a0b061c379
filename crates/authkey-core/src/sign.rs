//! Signing key derivation and HMAC signature computation.
//!
//! The HMAC key is never the raw shared secret: each request derives a fresh
//! key from the secret and the request timestamp, so a leaked derived key is
//! only useful within the replay window of a single timestamp.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, KeyInit, Mac};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Derive the per-request signing key: raw SHA-256 digest of the shared
/// secret concatenated with the decimal timestamp.
///
/// # Examples
///
/// ```
/// use authkey_core::sign::derive_signing_key;
///
/// let key = derive_signing_key("secret", 1700000000);
/// assert_eq!(key.len(), 32);
/// ```
#[must_use]
pub fn derive_signing_key(account_key: &str, timestamp: i64) -> [u8; 32] {
    Sha256::digest(format!("{account_key}{timestamp}").as_bytes()).into()
}

/// Compute the signature: Base64(HMAC-SHA256(canonical, signing_key)).
#[must_use]
pub fn sign(canonical: &str, signing_key: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(signing_key).expect("HMAC can accept any key length");
    mac.update(canonical.as_bytes());
    BASE64.encode(mac.finalize().into_bytes())
}

/// Recompute the signature and compare against a candidate in constant time.
#[must_use]
pub fn verify(canonical: &str, signing_key: &[u8], candidate: &str) -> bool {
    sign(canonical, signing_key)
        .as_bytes()
        .ct_eq(candidate.as_bytes())
        .into()
}
