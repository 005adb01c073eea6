// crates/devdesc-rs/src/checksum.rs

use sha2::{Digest, Sha256};

/// SHA-256 of `bytes`, lower-case hex.
pub fn content_checksum(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        assert_eq!(
            content_checksum(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_distinct_inputs_differ() {
        assert_ne!(content_checksum(b"[File]"), content_checksum(b"[File] "));
    }
}
