//! Entity ids and the id namespace.
//!
//! Ordinary ids live in `[1, 2^144 - 1]`. Everything above is reserved for the
//! two boundary entities of each line: the leftmost at `2^144 + line` and the
//! rightmost at `2^152 - 1 + line`.

use std::fmt;
use std::sync::LazyLock;

use num_bigint::{BigInt, BigUint};
use num_traits::{One, Zero};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub static UINT96_MAX: LazyLock<BigUint> = LazyLock::new(|| (BigUint::one() << 96u32) - 1u32);
pub static UINT144_MAX: LazyLock<BigUint> = LazyLock::new(|| (BigUint::one() << 144u32) - 1u32);
pub static UINT152_MAX: LazyLock<BigUint> = LazyLock::new(|| (BigUint::one() << 152u32) - 1u32);
pub static UINT160_MAX: LazyLock<BigUint> = LazyLock::new(|| (BigUint::one() << 160u32) - 1u32);

/// A 160-bit entity identifier. Zero means "not set".
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(BigUint);

impl EntityId {
    pub fn new(raw: BigUint) -> Self {
        Self(raw)
    }

    /// The unset id.
    pub fn none() -> Self {
        Self(BigUint::zero())
    }

    #[inline]
    pub fn is_none(&self) -> bool {
        self.0.is_zero()
    }

    #[inline]
    pub fn as_biguint(&self) -> &BigUint {
        &self.0
    }

    /// The id as a signed integer, for arithmetic against WAD values.
    pub fn to_bigint(&self) -> BigInt {
        BigInt::from(self.0.clone())
    }

    /// Map a 256-bit seed into the ordinary id range. Never returns 0 or a
    /// boundary id.
    pub fn from_seed(seed: &BigUint) -> Self {
        Self(seed % &*UINT144_MAX + 1u32)
    }

    pub fn leftmost(line_id: u32) -> Self {
        Self(&*UINT144_MAX + 1u32 + line_id)
    }

    pub fn rightmost(line_id: u32) -> Self {
        Self(&*UINT152_MAX + line_id)
    }

    /// Boundary entities occupy every id above `2^144 - 1`.
    #[inline]
    pub fn is_boundary(&self) -> bool {
        self.0 > *UINT144_MAX
    }

    #[inline]
    pub fn is_rightmost(&self) -> bool {
        self.0 >= *UINT152_MAX
    }

    #[inline]
    pub fn is_leftmost(&self) -> bool {
        self.is_boundary() && self.0 < *UINT152_MAX
    }
}

impl From<u64> for EntityId {
    fn from(raw: u64) -> Self {
        Self(BigUint::from(raw))
    }
}

impl From<BigUint> for EntityId {
    fn from(raw: BigUint) -> Self {
        Self(raw)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            f.write_str("N/A")
        } else if self.is_leftmost() {
            f.write_str("[LEFT_BOUNDARY]")
        } else if self.is_rightmost() {
            f.write_str("[RIGHT_BOUNDARY]")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl Serialize for EntityId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        crate::serde_big::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        crate::serde_big::deserialize(deserializer).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_never_maps_to_zero_or_boundary() {
        assert_eq!(EntityId::from_seed(&BigUint::zero()), EntityId::from(1));
        assert_eq!(EntityId::from_seed(&UINT144_MAX), EntityId::from(1));

        let just_below = &*UINT144_MAX - 1u32;
        let id = EntityId::from_seed(&just_below);
        assert_eq!(id.as_biguint(), &*UINT144_MAX);
        assert!(!id.is_boundary());
    }

    #[test]
    fn test_boundary_namespace() {
        for line in [0u32, 1, 7, 1000] {
            let left = EntityId::leftmost(line);
            let right = EntityId::rightmost(line);
            assert!(left.is_boundary() && left.is_leftmost() && !left.is_rightmost());
            assert!(right.is_boundary() && right.is_rightmost() && !right.is_leftmost());
        }
        let ordinary = EntityId::from(42);
        assert!(!ordinary.is_boundary());
        assert!(!ordinary.is_leftmost());
        assert!(!ordinary.is_rightmost());
    }

    #[test]
    fn test_display() {
        assert_eq!(EntityId::none().to_string(), "N/A");
        assert_eq!(EntityId::leftmost(3).to_string(), "[LEFT_BOUNDARY]");
        assert_eq!(EntityId::rightmost(3).to_string(), "[RIGHT_BOUNDARY]");
        assert_eq!(EntityId::from(1234).to_string(), "1234");
    }
}
