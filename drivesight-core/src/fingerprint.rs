//! Content-addressed identity for uploaded images.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Sha3_256};

use crate::error::{Error, Result};

/// Digest length in bytes (SHA3-256).
pub const FINGERPRINT_BYTES: usize = 32;

/// SHA3-256 digest of the raw image bytes.
///
/// Used as the cache key: byte-identical uploads map to the same fingerprint,
/// any single-byte difference maps to a different one.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageFingerprint([u8; FINGERPRINT_BYTES]);

impl ImageFingerprint {
    /// Hash raw bytes. Empty input is accepted and yields the digest of the empty string.
    pub fn of(data: &[u8]) -> Self {
        let mut hasher = Sha3_256::new();
        hasher.update(data);
        let result = hasher.finalize();

        let mut digest = [0u8; FINGERPRINT_BYTES];
        digest.copy_from_slice(&result);
        Self(digest)
    }

    pub fn from_hex(encoded: &str) -> Result<Self> {
        hex::decode(encoded)
            .map_err(|e| Error::MalformedInput(format!("Invalid fingerprint hex: {e}")))?
            .try_into()
            .map(Self)
            .map_err(|v: Vec<u8>| {
                Error::MalformedInput(format!(
                    "Expected {FINGERPRINT_BYTES} fingerprint bytes, got {}",
                    v.len()
                ))
            })
    }

    pub fn as_bytes(&self) -> &[u8; FINGERPRINT_BYTES] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Abbreviated form for log lines.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..6])
    }
}

impl std::fmt::Display for ImageFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl std::fmt::Debug for ImageFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ImageFingerprint({})", self.short())
    }
}

impl Serialize for ImageFingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ImageFingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        Self::from_hex(&encoded).map_err(serde::de::Error::custom)
    }
}
