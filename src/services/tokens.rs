use rand::RngCore;
use sha2::{Digest, Sha256};

/// Bytes of entropy in every opaque token (256 bits).
pub const OPAQUE_TOKEN_BYTES: usize = 32;

/// Random lookup token for email verification and password reset links.
/// Always `2 * OPAQUE_TOKEN_BYTES` lowercase hex characters.
pub fn generate_opaque_token() -> String {
    let mut bytes = [0u8; OPAQUE_TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Storage key for a signed refresh token.
pub fn digest_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
