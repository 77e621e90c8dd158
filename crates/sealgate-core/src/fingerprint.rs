//! Content fingerprinting for log correlation
//!
//! Raw upload bytes never go to the log stream; log lines identify content by
//! this digest instead.

use sha2::{Digest, Sha256};

/// Hex SHA-256 of `bytes`.
pub fn content_fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_fingerprint() {
        assert_eq!(
            content_fingerprint(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_fingerprint_is_stable_and_content_sensitive() {
        let a = content_fingerprint(b"%PDF-1.7");
        let b = content_fingerprint(b"%PDF-1.7");
        let c = content_fingerprint(b"%PDF-1.4");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }
}
