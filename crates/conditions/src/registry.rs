//! Process-wide registry of condition types.
//!
//! The catalogue is fixed at compile time, materialized once, and never
//! mutated afterwards, so lookups are safe from any thread without
//! locking.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;

use crate::codec::Reader;
use crate::condition::SubtypeMask;
use crate::error::{ConditionError, Result};
use crate::fulfillment::Fulfillment;
use crate::types::{Ed25519Sha512, PreimageSha256, RsaSha256, ThresholdSha256};

/// PREIMAGE-SHA-256 registry identifier.
pub const TYPE_ID_PREIMAGE_SHA256: u16 = 0;
/// THRESHOLD-SHA-256 registry identifier.
pub const TYPE_ID_THRESHOLD_SHA256: u16 = 2;
/// RSA-SHA-256 registry identifier.
pub const TYPE_ID_RSA_SHA256: u16 = 3;
/// ED25519-SHA-512 registry identifier.
pub const TYPE_ID_ED25519_SHA512: u16 = 4;

/// Static descriptor of one condition variant: its identity plus the
/// capability needed to decode its fulfillment payload.
pub struct ConditionType {
    /// Registry identifier.
    pub type_id: u16,
    /// Canonical name.
    pub name: &'static str,
    /// Capability bits this variant itself contributes to a subtype
    /// mask.
    pub features: SubtypeMask,
    decode_payload: fn(&mut Reader<'_>) -> Result<Fulfillment>,
}

impl std::fmt::Debug for ConditionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConditionType")
            .field("type_id", &self.type_id)
            .field("name", &self.name)
            .finish()
    }
}

static REGISTRY: Lazy<BTreeMap<u16, ConditionType>> = Lazy::new(|| {
    let catalogue = [
        ConditionType {
            type_id: TYPE_ID_PREIMAGE_SHA256,
            name: "preimage-sha-256",
            features: SubtypeMask::SHA_256 | SubtypeMask::PREIMAGE,
            decode_payload: PreimageSha256::decode_payload,
        },
        ConditionType {
            type_id: TYPE_ID_THRESHOLD_SHA256,
            name: "threshold-sha-256",
            features: SubtypeMask::SHA_256 | SubtypeMask::THRESHOLD,
            decode_payload: ThresholdSha256::decode_payload,
        },
        ConditionType {
            type_id: TYPE_ID_RSA_SHA256,
            name: "rsa-sha-256",
            features: SubtypeMask::SHA_256 | SubtypeMask::RSA_PSS,
            decode_payload: RsaSha256::decode_payload,
        },
        ConditionType {
            type_id: TYPE_ID_ED25519_SHA512,
            name: "ed25519-sha-512",
            features: SubtypeMask::ED25519,
            decode_payload: Ed25519Sha512::decode_payload,
        },
    ];
    catalogue.into_iter().map(|ty| (ty.type_id, ty)).collect()
});

/// Look up a variant descriptor, failing with
/// [`ConditionError::UnknownType`] for identifiers outside the
/// catalogue.
pub fn lookup(type_id: u16) -> Result<&'static ConditionType> {
    REGISTRY
        .get(&type_id)
        .ok_or(ConditionError::UnknownType(type_id))
}

/// Decode a fulfillment payload through the registry. The payload must
/// be consumed exactly.
pub fn decode_fulfillment_payload(type_id: u16, payload: &[u8]) -> Result<Fulfillment> {
    let ty = lookup(type_id)?;
    let mut reader = Reader::new(payload);
    let fulfillment = (ty.decode_payload)(&mut reader)?;
    reader.expect_eof()?;
    Ok(fulfillment)
}
