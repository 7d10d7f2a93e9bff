//! Content fingerprinting primitives
//!
//! Provides [`ContentFingerprint`], a strongly-typed 32-byte digest used for
//! cheap change detection across sync cycles.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// A 32-byte content fingerprint (Blake3)
///
/// Computed over the raw source bytes of a document and stored alongside it.
/// A later sync cycle recomputes the fingerprint of freshly fetched content
/// and compares it against the stored value to decide whether an expensive
/// regeneration can be skipped. Immutable and cheap to clone (Copy).
///
/// # Stability
/// The digest is deterministic across process restarts and hosts: the stored
/// value may have been produced by a different process than the one comparing
/// against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContentFingerprint([u8; 32]);

impl ContentFingerprint {
    /// Create a fingerprint from raw bytes
    #[inline]
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get reference to the underlying bytes
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Create fingerprint from a byte slice
    ///
    /// # Errors
    /// Returns error if slice length is not exactly 32 bytes
    #[inline]
    pub fn from_slice(bytes: &[u8]) -> Result<Self, FingerprintError> {
        if bytes.len() != 32 {
            return Err(FingerprintError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(bytes);
        Ok(Self(arr))
    }

    /// Compute the fingerprint of arbitrary content bytes
    #[inline]
    #[must_use]
    pub fn compute(data: &[u8]) -> Self {
        let hash = blake3::hash(data);
        Self::new(*hash.as_bytes())
    }

    /// Compute the fingerprint of string content
    #[inline]
    #[must_use]
    pub fn of_str(content: &str) -> Self {
        Self::compute(content.as_bytes())
    }

    /// Check whether the given content matches this fingerprint
    #[inline]
    #[must_use]
    pub fn matches(&self, content: &str) -> bool {
        *self == Self::of_str(content)
    }

    /// Short string representation (first 16 hex chars)
    #[inline]
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl Display for ContentFingerprint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl FromStr for ContentFingerprint {
    type Err = FingerprintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)?;
        Self::from_slice(&bytes)
    }
}

impl AsRef<[u8; 32]> for ContentFingerprint {
    fn as_ref(&self) -> &[u8; 32] {
        &self.0
    }
}

// Stored and transported as a hex string.
impl serde::Serialize for ContentFingerprint {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for ContentFingerprint {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Errors that can occur when working with content fingerprints
#[derive(Debug, thiserror::Error)]
pub enum FingerprintError {
    /// Invalid fingerprint length
    #[error("invalid fingerprint length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// Hex encoding error
    #[error("hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_new_and_access() {
        let bytes = [1u8; 32];
        let fp = ContentFingerprint::new(bytes);
        assert_eq!(fp.as_bytes(), &bytes);
    }

    #[test]
    fn fingerprint_from_slice_invalid_length() {
        let bytes = vec![1u8; 31];
        let result = ContentFingerprint::from_slice(&bytes);
        assert!(matches!(
            result,
            Err(FingerprintError::InvalidLength {
                expected: 32,
                actual: 31
            })
        ));
    }

    #[test]
    fn fingerprint_deterministic() {
        let data = b"quarterly revenue by region";
        let f1 = ContentFingerprint::compute(data);
        let f2 = ContentFingerprint::compute(data);
        assert_eq!(f1, f2);
    }

    #[test]
    fn fingerprint_differs_on_single_byte() {
        let f1 = ContentFingerprint::of_str("region,revenue\nwest,100");
        let f2 = ContentFingerprint::of_str("region,revenue\nwest,101");
        assert_ne!(f1, f2);
    }

    #[test]
    fn fingerprint_matches_content() {
        let content = "a,b\n1,2\n";
        let fp = ContentFingerprint::of_str(content);
        assert!(fp.matches(content));
        assert!(!fp.matches("a,b\n1,3\n"));
    }

    #[test]
    fn fingerprint_display_and_parse() {
        let fp = ContentFingerprint::of_str("test");
        let s = fp.to_string();
        let parsed: ContentFingerprint = s.parse().unwrap();
        assert_eq!(fp, parsed);
    }

    #[test]
    fn fingerprint_short() {
        let fp = ContentFingerprint::of_str("test");
        let short = fp.short();
        assert_eq!(short.len(), 16);
        assert!(fp.to_string().starts_with(&short));
    }

    #[test]
    fn fingerprint_serde_round_trip() {
        let fp = ContentFingerprint::of_str("serde");
        let json = serde_json::to_string(&fp).unwrap();
        assert!(json.contains('"'));
        let decoded: ContentFingerprint = serde_json::from_str(&json).unwrap();
        assert_eq!(fp, decoded);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn identical_bytes_identical_fingerprints(data: Vec<u8>) {
                prop_assert_eq!(
                    ContentFingerprint::compute(&data),
                    ContentFingerprint::compute(&data)
                );
            }

            #[test]
            fn any_flipped_byte_changes_fingerprint(
                mut data in proptest::collection::vec(any::<u8>(), 1..256),
                idx in any::<prop::sample::Index>(),
            ) {
                let original = ContentFingerprint::compute(&data);
                let i = idx.index(data.len());
                data[i] = data[i].wrapping_add(1);
                prop_assert_ne!(original, ContentFingerprint::compute(&data));
            }

            #[test]
            fn display_parse_round_trip(data: Vec<u8>) {
                let fp = ContentFingerprint::compute(&data);
                let parsed: ContentFingerprint = fp.to_string().parse().unwrap();
                prop_assert_eq!(fp, parsed);
            }
        }
    }
}
