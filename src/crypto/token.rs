use crate::error::Result;
use rand::RngCore;
use rand::rngs::OsRng;
use base64::{Engine as _, engine::general_purpose};

/// Generates a new random attendance token.
///
/// The token is what the QR code carries; guessing one inside the validity
/// window must be infeasible, so the bytes come from the OS entropy source.
///
/// # Arguments
///
/// * `token_bytes` - The number of random bytes to draw (the config enforces
///   a floor of 16, i.e. 128 bits).
///
/// # Returns
///
/// A URL-safe base64-encoded token; fixed length for a given byte count.
pub fn generate_attendance_token(token_bytes: usize) -> Result<String> {
    let mut token = vec![0u8; token_bytes];
    OsRng.fill_bytes(&mut token);

    Ok(general_purpose::URL_SAFE_NO_PAD.encode(token))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_have_fixed_length() {
        let a = generate_attendance_token(32).unwrap();
        let b = generate_attendance_token(32).unwrap();
        // 32 bytes -> 43 unpadded base64 characters
        assert_eq!(a.len(), 43);
        assert_eq!(a.len(), b.len());
    }

    #[test]
    fn tokens_are_unique() {
        let a = generate_attendance_token(16).unwrap();
        let b = generate_attendance_token(16).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn tokens_are_url_safe() {
        let token = generate_attendance_token(32).unwrap();
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }
}
