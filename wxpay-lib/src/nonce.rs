//! Random `nonce_str` values.

use rand::distributions::Alphanumeric;
use rand::Rng;

/// Length of generated nonces; the gateway accepts up to 32 characters.
pub const NONCE_LEN: usize = 32;

/// Generate a fresh alphanumeric nonce.
pub fn generate() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(NONCE_LEN)
        .map(char::from)
        .collect()
}
