use crate::BLS_PUBLIC_KEY_BYTES_LEN;
use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Raised when constructing a fixed-length byte wrapper from a slice of the wrong length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BytesError {
    InvalidByteLength { got: usize, expected: usize },
}

/// A compressed BLS public key, stored as opaque bytes.
///
/// The duty layer never verifies signatures, so keys are carried without decompression.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKeyBytes([u8; BLS_PUBLIC_KEY_BYTES_LEN]);

impl PublicKeyBytes {
    pub fn empty() -> Self {
        Self([0; BLS_PUBLIC_KEY_BYTES_LEN])
    }

    pub fn serialize(&self) -> [u8; BLS_PUBLIC_KEY_BYTES_LEN] {
        self.0
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self, BytesError> {
        if bytes.len() == BLS_PUBLIC_KEY_BYTES_LEN {
            let mut out = [0; BLS_PUBLIC_KEY_BYTES_LEN];
            out.copy_from_slice(bytes);
            Ok(Self(out))
        } else {
            Err(BytesError::InvalidByteLength {
                got: bytes.len(),
                expected: BLS_PUBLIC_KEY_BYTES_LEN,
            })
        }
    }
}

impl fmt::Display for PublicKeyBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for PublicKeyBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl FromStr for PublicKeyBytes {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(stripped).map_err(|e| format!("invalid hex: {}", e))?;
        Self::deserialize(&bytes).map_err(|e| format!("invalid public key: {:?}", e))
    }
}

impl Serialize for PublicKeyBytes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PublicKeyBytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trip() {
        let mut bytes = [0_u8; BLS_PUBLIC_KEY_BYTES_LEN];
        bytes[0] = 0xab;
        bytes[47] = 0x01;
        let pubkey = PublicKeyBytes::deserialize(&bytes).unwrap();

        let json = serde_json::to_string(&pubkey).unwrap();
        assert!(json.starts_with("\"0xab"));
        assert_eq!(serde_json::from_str::<PublicKeyBytes>(&json).unwrap(), pubkey);
    }

    #[test]
    fn rejects_wrong_length() {
        assert_eq!(
            PublicKeyBytes::deserialize(&[0; 47]),
            Err(BytesError::InvalidByteLength {
                got: 47,
                expected: BLS_PUBLIC_KEY_BYTES_LEN
            })
        );
    }
}
