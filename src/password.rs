//! One-way password storage.
//!
//! PBKDF2-HMAC-SHA256 with a random per-user salt, stored as
//! `base64(salt)$base64(digest)`. Verification recomputes the digest and
//! compares in constant time; plaintext is never stored or logged.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use pbkdf2::pbkdf2_hmac_array;
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;

const SALT_LEN: usize = 16;
const DIGEST_LEN: usize = 32;
const ROUNDS: u32 = 10_000;

/// Hashes a plaintext password with a fresh random salt.
pub fn hash(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);

    let digest = pbkdf2_hmac_array::<Sha256, DIGEST_LEN>(password.as_bytes(), &salt, ROUNDS);

    format!("{}${}", BASE64.encode(salt), BASE64.encode(digest))
}

/// Checks a plaintext password against a stored hash. An undecodable
/// stored value verifies as false rather than erroring.
pub fn verify(password: &str, stored: &str) -> bool {
    let Some((salt, digest)) = stored.split_once('$') else {
        return false;
    };
    let (Ok(salt), Ok(digest)) = (BASE64.decode(salt), BASE64.decode(digest)) else {
        return false;
    };
    if digest.len() != DIGEST_LEN {
        return false;
    }

    let candidate = pbkdf2_hmac_array::<Sha256, DIGEST_LEN>(password.as_bytes(), &salt, ROUNDS);

    candidate.ct_eq(&digest[..]).into()
}
