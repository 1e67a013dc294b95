//! Streaming SHA-256 over range contents.
//!
//! The checksum of a key range is the SHA-256 digest of every row's
//! checksum column value, folded in ascending index order with no
//! separator. Given the same ordered contents, the digest is reproducible
//! byte for byte.

use sha2::{Digest, Sha256};

/// Incremental hasher for one contiguous key range.
///
/// Rows are folded one at a time so the memory cost of hashing a large
/// range stays constant.
pub struct RangeHasher {
    inner: Sha256,
}

impl RangeHasher {
    pub fn new() -> Self {
        Self {
            inner: Sha256::new(),
        }
    }

    /// Fold one row's checksum column value into the digest.
    pub fn update(&mut self, bytes: &[u8]) {
        self.inner.update(bytes);
    }

    /// Finish the digest as 64 lowercase hex characters.
    pub fn finish_hex(self) -> String {
        hex::encode(self.inner.finalize())
    }
}

impl Default for RangeHasher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        let mut hasher = RangeHasher::new();
        hasher.update(b"aecf1235445354");
        assert_eq!(
            hasher.finish_hex(),
            "c5dcae9d302e6c131194d392700dd52d42e5003677ce5df44cf1473ec5d5f950"
        );
    }

    #[test]
    fn test_incremental_matches_one_shot() {
        let mut split = RangeHasher::new();
        split.update(b"96482cde495f716fcd66a71a601fbb905c13b426");
        split.update(b"e041159610c7ec18490345af13f7f49371b56893");

        let mut whole = RangeHasher::new();
        whole.update(
            b"96482cde495f716fcd66a71a601fbb905c13b426e041159610c7ec18490345af13f7f49371b56893",
        );

        assert_eq!(split.finish_hex(), whole.finish_hex());
    }

    #[test]
    fn test_digest_is_lowercase_hex() {
        let mut hasher = RangeHasher::new();
        hasher.update(b"anything");
        let digest = hasher.finish_hex();
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
