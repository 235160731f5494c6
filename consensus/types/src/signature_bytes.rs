use crate::{public_key_bytes::BytesError, BLS_SIGNATURE_BYTES_LEN};
use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};
use ssz::{Decode, DecodeError, Encode};
use std::fmt;
use std::str::FromStr;

/// A compressed (possibly aggregate) BLS signature, stored as opaque bytes.
///
/// Signatures participate in SSZ encoding and tree hashing because they sit inside hashed
/// payloads, but they are never verified at this layer.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SignatureBytes([u8; BLS_SIGNATURE_BYTES_LEN]);

impl SignatureBytes {
    pub fn empty() -> Self {
        Self([0; BLS_SIGNATURE_BYTES_LEN])
    }

    pub fn serialize(&self) -> [u8; BLS_SIGNATURE_BYTES_LEN] {
        self.0
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self, BytesError> {
        if bytes.len() == BLS_SIGNATURE_BYTES_LEN {
            let mut out = [0; BLS_SIGNATURE_BYTES_LEN];
            out.copy_from_slice(bytes);
            Ok(Self(out))
        } else {
            Err(BytesError::InvalidByteLength {
                got: bytes.len(),
                expected: BLS_SIGNATURE_BYTES_LEN,
            })
        }
    }
}

impl Default for SignatureBytes {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for SignatureBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for SignatureBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl FromStr for SignatureBytes {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(stripped).map_err(|e| format!("invalid hex: {}", e))?;
        Self::deserialize(&bytes).map_err(|e| format!("invalid signature: {:?}", e))
    }
}

impl Serialize for SignatureBytes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for SignatureBytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl Encode for SignatureBytes {
    fn is_ssz_fixed_len() -> bool {
        true
    }

    fn ssz_fixed_len() -> usize {
        BLS_SIGNATURE_BYTES_LEN
    }

    fn ssz_bytes_len(&self) -> usize {
        BLS_SIGNATURE_BYTES_LEN
    }

    fn ssz_append(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.0);
    }
}

impl Decode for SignatureBytes {
    fn is_ssz_fixed_len() -> bool {
        true
    }

    fn ssz_fixed_len() -> usize {
        BLS_SIGNATURE_BYTES_LEN
    }

    fn from_ssz_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        Self::deserialize(bytes).map_err(|_| DecodeError::InvalidByteLength {
            len: bytes.len(),
            expected: BLS_SIGNATURE_BYTES_LEN,
        })
    }
}

impl tree_hash::TreeHash for SignatureBytes {
    fn tree_hash_type() -> tree_hash::TreeHashType {
        tree_hash::TreeHashType::Vector
    }

    fn tree_hash_packed_encoding(&self) -> tree_hash::PackedEncoding {
        unreachable!("Vector should never be packed.")
    }

    fn tree_hash_packing_factor() -> usize {
        unreachable!("Vector should never be packed.")
    }

    fn tree_hash_root(&self) -> tree_hash::Hash256 {
        tree_hash::merkle_root(&self.0, 0)
    }
}
