//! Deterministic digests over sorted sets of byte strings.
//!
//! Used for both class-level fingerprints (sorted allowlisted API calls)
//! and package-level fingerprints (sorted child fingerprints). The choice
//! of hash algorithm is fixed for a deployment: mixing algorithms across a
//! reference database silently invalidates every stored fingerprint, so
//! there is deliberately no configuration knob here.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// A fixed-length digest. Collisions are treated as non-existent, per spec.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Fingerprint(#[serde(with = "fingerprint_hex")] [u8; 32]);

impl Fingerprint {
    pub const BYTE_LEN: usize = 32;

    #[must_use]
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let mut bytes = [0_u8; 32];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.to_hex())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

mod fingerprint_hex {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8; 32], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<[u8; 32], D::Error> {
        let s = String::deserialize(d)?;
        let mut bytes = [0_u8; 32];
        hex::decode_to_slice(&s, &mut bytes).map_err(serde::de::Error::custom)?;
        Ok(bytes)
    }
}

/// Computes [`Fingerprint`]s over a sorted, lexicographically-ordered sequence
/// of byte strings.
pub struct Hasher;

impl Hasher {
    /// Sort `items` by raw byte ordering, then hash the concatenation.
    pub fn digest<I, T>(items: I) -> Fingerprint
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        let mut sorted: Vec<Vec<u8>> = items.into_iter().map(|item| item.as_ref().to_vec()).collect();
        sorted.sort();

        let mut hasher = Sha256::new();
        for item in &sorted {
            hasher.update(item);
        }
        Fingerprint(hasher.finalize().into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_order_independent() {
        let a = Hasher::digest(["B", "A", "C"]);
        let b = Hasher::digest(["C", "B", "A"]);
        assert_eq!(a, b);
    }

    #[test]
    fn digest_is_sensitive_to_content() {
        let a = Hasher::digest(["A", "B"]);
        let b = Hasher::digest(["A", "C"]);
        assert_ne!(a, b);
    }

    #[test]
    fn hex_round_trips() {
        let fp = Hasher::digest(["x"]);
        let hex = fp.to_hex();
        assert_eq!(Fingerprint::from_hex(&hex).unwrap(), fp);
    }
}
