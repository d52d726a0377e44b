//! The condition value type: an immutable, collision-resistant
//! commitment to a satisfiability rule.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use crate::codec::{var_octet_len, var_uint_len, Reader, Writer};
use crate::error::{ConditionError, Result};
use crate::registry;

/// Width of every fingerprint in the catalogue, in bytes.
pub const FINGERPRINT_LEN: usize = 32;

/// Bitset of the variant capabilities present within a condition's
/// subtree. The bit assignments belong to the wire profile; `0x04` is
/// reserved for the PREFIX variant this catalogue does not carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SubtypeMask(u64);

impl SubtypeMask {
    /// SHA-256 fingerprinting.
    pub const SHA_256: SubtypeMask = SubtypeMask(0x01);
    /// Preimage comparison.
    pub const PREIMAGE: SubtypeMask = SubtypeMask(0x02);
    /// Weighted threshold composition.
    pub const THRESHOLD: SubtypeMask = SubtypeMask(0x08);
    /// RSA-PSS signatures.
    pub const RSA_PSS: SubtypeMask = SubtypeMask(0x10);
    /// Ed25519 signatures.
    pub const ED25519: SubtypeMask = SubtypeMask(0x20);

    /// The empty set.
    pub const fn empty() -> Self {
        SubtypeMask(0)
    }

    /// Raw bit representation.
    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Reconstruct a mask from its raw bits.
    pub const fn from_bits(bits: u64) -> Self {
        SubtypeMask(bits)
    }

    /// True if every bit of `other` is present in `self`.
    pub const fn contains(self, other: SubtypeMask) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for SubtypeMask {
    type Output = SubtypeMask;

    fn bitor(self, rhs: SubtypeMask) -> SubtypeMask {
        SubtypeMask(self.0 | rhs.0)
    }
}

impl BitOrAssign for SubtypeMask {
    fn bitor_assign(&mut self, rhs: SubtypeMask) {
        self.0 |= rhs.0;
    }
}

impl fmt::LowerHex for SubtypeMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

/// An immutable commitment to a satisfiability rule.
///
/// Two conditions are equal iff all four fields match byte-for-byte. A
/// condition parsed standalone from a URI is usable only for
/// comparison; verification always runs against a fulfillment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Condition {
    type_id: u16,
    subtypes: SubtypeMask,
    fingerprint: [u8; FINGERPRINT_LEN],
    cost: u64,
}

impl Condition {
    pub(crate) fn new(
        type_id: u16,
        subtypes: SubtypeMask,
        fingerprint: [u8; FINGERPRINT_LEN],
        cost: u64,
    ) -> Self {
        Self {
            type_id,
            subtypes,
            fingerprint,
            cost,
        }
    }

    /// Registry identifier of the variant this condition commits to.
    pub fn type_id(&self) -> u16 {
        self.type_id
    }

    /// Capability bitset of the whole subtree.
    pub fn subtypes(&self) -> SubtypeMask {
        self.subtypes
    }

    /// Digest of the canonical fingerprint contents.
    pub fn fingerprint(&self) -> &[u8; FINGERPRINT_LEN] {
        &self.fingerprint
    }

    /// Upper bound, in bytes, on any fulfillment satisfying this
    /// condition.
    pub fn cost(&self) -> u64 {
        self.cost
    }

    /// Append the canonical binary form to `writer`.
    pub fn encode(&self, writer: &mut Writer) {
        writer.write_u16(self.type_id);
        writer.write_var_uint(self.subtypes.bits());
        writer.write_var_octet_string(&self.fingerprint);
        writer.write_var_uint(self.cost);
    }

    /// Canonical binary form as a fresh buffer.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = Writer::new();
        self.encode(&mut writer);
        writer.into_vec()
    }

    /// Size of the canonical binary form without encoding it.
    pub fn encoded_len(&self) -> u64 {
        2 + var_uint_len(self.subtypes.bits())
            + var_octet_len(FINGERPRINT_LEN as u64)
            + var_uint_len(self.cost)
    }

    /// Decode one condition from `reader`, leaving the reader at the
    /// first byte past it.
    pub fn decode(reader: &mut Reader<'_>) -> Result<Self> {
        let type_id = reader.read_u16()?;
        // Reject unsupported variants before touching the rest of the
        // structure.
        registry::lookup(type_id)?;
        let subtypes = SubtypeMask::from_bits(reader.read_var_uint()?);
        let fingerprint_bytes = reader.read_var_octet_string()?;
        let fingerprint: [u8; FINGERPRINT_LEN] =
            fingerprint_bytes.try_into().map_err(|_| {
                ConditionError::MalformedEncoding(format!(
                    "fingerprint of {} bytes, expected {FINGERPRINT_LEN}",
                    fingerprint_bytes.len()
                ))
            })?;
        let cost = reader.read_var_uint()?;
        Ok(Self::new(type_id, subtypes, fingerprint, cost))
    }

    /// Decode a condition that must span the whole buffer.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(bytes);
        let condition = Self::decode(&mut reader)?;
        reader.expect_eof()?;
        Ok(condition)
    }

    /// Textual `cc:` form of this condition.
    pub fn uri(&self) -> String {
        crate::uri::serialize_condition_uri(self)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri())
    }
}
