//! 256-bit wrapping seed used as the poem's running entropy

use super::Address;
use num_bigint::BigUint;
use num_traits::ToPrimitive;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A 256-bit unsigned integer stored as 32 big-endian bytes.
///
/// All arithmetic wraps modulo 2^256; there is no checked variant.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Seed([u8; 32]);

impl Seed {
    pub const ZERO: Seed = Seed([0u8; 32]);

    /// Starting value of a freshly built poem
    pub const ONE: Seed = {
        let mut bytes = [0u8; 32];
        bytes[31] = 1;
        Seed(bytes)
    };

    /// Number of bits in a seed
    pub const BITS: usize = 256;

    /// Create a seed from raw big-endian bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Seed(bytes)
    }

    /// Widen a u64
    pub fn from_u64(value: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&value.to_be_bytes());
        Seed(bytes)
    }

    /// Widen a 160-bit address
    pub fn from_address(address: &Address) -> Self {
        let mut bytes = [0u8; 32];
        bytes[12..].copy_from_slice(address.as_bytes());
        Seed(bytes)
    }

    /// Derive a seed by hashing arbitrary parts with BLAKE3
    pub fn digest_many(parts: &[&[u8]]) -> Self {
        let mut hasher = blake3::Hasher::new();
        for part in parts {
            hasher.update(part);
        }
        Seed(*hasher.finalize().as_bytes())
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    fn to_biguint(&self) -> BigUint {
        BigUint::from_bytes_be(&self.0)
    }

    /// Reduce modulo 2^256 and store as 32 big-endian bytes
    fn from_biguint(value: &BigUint) -> Seed {
        let reduced = value % two_pow_256();
        let bytes = reduced.to_bytes_be();
        let mut out = [0u8; 32];
        out[32 - bytes.len()..].copy_from_slice(&bytes);
        Seed(out)
    }

    pub fn wrapping_add(&self, rhs: &Seed) -> Seed {
        Seed::from_biguint(&(self.to_biguint() + rhs.to_biguint()))
    }

    pub fn wrapping_sub(&self, rhs: &Seed) -> Seed {
        // rhs < 2^256, so adding 2^256 first keeps this non-negative
        Seed::from_biguint(&(two_pow_256() + self.to_biguint() - rhs.to_biguint()))
    }

    /// Remainder of the whole 256-bit value divided by `modulus`
    pub fn rem(&self, modulus: u32) -> u32 {
        assert!(modulus > 0, "modulus must be non-zero");
        (self.to_biguint() % modulus).to_u32().unwrap_or_default()
    }

    /// Read one bit, counting from the most significant (position 0 is bit 255)
    pub fn bit_msb_first(&self, position: usize) -> bool {
        debug_assert!(position < Self::BITS);
        let byte = self.0[position / 8];
        (byte >> (7 - position % 8)) & 1 == 1
    }

    /// Convert to hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from a hex string, with or without `0x`; shorter input is left-padded
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        if s.len() > 64 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let padded = format!("{:0>64}", s);
        let bytes = hex::decode(padded)?;
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Seed(arr))
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

/// 2^256
fn two_pow_256() -> BigUint {
    BigUint::from(1u8) << 256
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Seed(0x{})", self.to_hex())
    }
}

impl Default for Seed {
    fn default() -> Self {
        Seed::ONE
    }
}

impl From<u64> for Seed {
    fn from(value: u64) -> Self {
        Seed::from_u64(value)
    }
}

impl Serialize for Seed {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_string())
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for Seed {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            Seed::from_hex(&s).map_err(serde::de::Error::custom)
        } else {
            Ok(Seed(<[u8; 32]>::deserialize(deserializer)?))
        }
    }
}
