//! Session tokens and email verification keys
//!
//! A session token is 32 random bytes followed by their HMAC-SHA256 under
//! the server secret, hex-encoded (128 characters). The MAC lets the server
//! drop forged or garbled tokens without touching the store; the random half
//! makes every token unique.
//!
//! # Example
//!
//! ```
//! use todoapp_shared::auth::token::{generate_token, verify_token_format, TOKEN_LEN};
//!
//! let secret = b"a-server-secret-of-at-least-32-bytes!!";
//! let token = generate_token(secret).unwrap();
//!
//! assert_eq!(token.len(), TOKEN_LEN);
//! assert!(verify_token_format(secret, &token));
//! assert!(!verify_token_format(b"some-other-secret", &token));
//! ```

use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;

use crate::error::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

/// Random bytes at the front of a token
pub const NONCE_LEN: usize = 32;
/// HMAC-SHA256 output size
const MAC_LEN: usize = 32;
/// Hex length of a session token
pub const TOKEN_LEN: usize = (NONCE_LEN + MAC_LEN) * 2;

/// Random bytes in an email verification key
pub const VERIFICATION_KEY_BYTES: usize = 16;

fn mac(secret: &[u8]) -> Result<HmacSha256> {
    HmacSha256::new_from_slice(secret).map_err(|e| Error::Token(e.to_string()))
}

fn random_bytes<const N: usize>() -> Result<[u8; N]> {
    let mut bytes = [0u8; N];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| Error::Token(format!("OS RNG unavailable: {e}")))?;
    Ok(bytes)
}

/// Mints a new session token signed with `secret`
pub fn generate_token(secret: &[u8]) -> Result<String> {
    let nonce = random_bytes::<NONCE_LEN>()?;

    let mut mac = mac(secret)?;
    mac.update(&nonce);
    let tag = mac.finalize().into_bytes();

    let mut raw = Vec::with_capacity(NONCE_LEN + MAC_LEN);
    raw.extend_from_slice(&nonce);
    raw.extend_from_slice(&tag);
    Ok(hex::encode(raw))
}

/// True when `token` is well-formed and carries a valid MAC for `secret`
///
/// The MAC comparison is constant-time.
pub fn verify_token_format(secret: &[u8], token: &str) -> bool {
    if token.len() != TOKEN_LEN {
        return false;
    }
    let Ok(raw) = hex::decode(token) else {
        return false;
    };
    let (nonce, tag) = raw.split_at(NONCE_LEN);

    let Ok(mut mac) = mac(secret) else {
        return false;
    };
    mac.update(nonce);
    mac.verify_slice(tag).is_ok()
}

/// Mints an email verification key (16 random bytes, hex)
pub fn generate_verification_key() -> Result<String> {
    Ok(hex::encode(random_bytes::<VERIFICATION_KEY_BYTES>()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    #[test]
    fn test_token_shape() {
        let token = generate_token(SECRET).unwrap();
        assert_eq!(token.len(), TOKEN_LEN);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_tokens_are_unique() {
        let a = generate_token(SECRET).unwrap();
        let b = generate_token(SECRET).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_verify_accepts_own_tokens() {
        let token = generate_token(SECRET).unwrap();
        assert!(verify_token_format(SECRET, &token));
    }

    #[test]
    fn test_verify_rejects_tampered_token() {
        let token = generate_token(SECRET).unwrap();

        // Flip one nibble of the random half
        let mut chars: Vec<char> = token.chars().collect();
        chars[0] = if chars[0] == '0' { '1' } else { '0' };
        let tampered: String = chars.into_iter().collect();

        assert!(!verify_token_format(SECRET, &tampered));
    }

    #[test]
    fn test_verify_rejects_malformed() {
        assert!(!verify_token_format(SECRET, ""));
        assert!(!verify_token_format(SECRET, "abc"));
        assert!(!verify_token_format(SECRET, &"z".repeat(TOKEN_LEN)));
        // Plain random hex of the legacy 64-char shape
        assert!(!verify_token_format(SECRET, &"ab".repeat(NONCE_LEN)));
    }

    #[test]
    fn test_verify_rejects_other_secret() {
        let token = generate_token(SECRET).unwrap();
        assert!(!verify_token_format(b"another-secret-another-secret-xx", &token));
    }

    #[test]
    fn test_verification_key_shape() {
        let key = generate_verification_key().unwrap();
        assert_eq!(key.len(), VERIFICATION_KEY_BYTES * 2);
        assert_ne!(key, generate_verification_key().unwrap());
    }
}
