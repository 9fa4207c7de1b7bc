//! # Share capability tokens
//!
//! A share token is 16 bytes from the thread-local CSPRNG, hex encoded to 32
//! characters. At 128 bits of entropy collisions are not a practical concern; the
//! `share_token` column is still unique, so a collision would surface as a
//! storage error rather than two documents sharing a link.

use rand::RngCore;

pub const SHARE_TOKEN_BYTES: usize = 16;

/// Generate a fresh, unguessable share token.
pub fn generate_share_token() -> String {
    let mut bytes = [0u8; SHARE_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_shape() {
        let token = generate_share_token();
        assert_eq!(token.len(), SHARE_TOKEN_BYTES * 2);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_tokens_differ() {
        assert_ne!(generate_share_token(), generate_share_token());
    }
}
