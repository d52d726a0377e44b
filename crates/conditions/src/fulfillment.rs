//! The polymorphic fulfillment model.
//!
//! The variant set is fixed by the wire profile, so fulfillments are a
//! closed enum dispatched by exhaustive match rather than dynamic
//! dispatch. Every fulfillment derives exactly one condition via a
//! pure, idempotent operation and exclusively owns its subtree.

use crate::codec::{Reader, Writer};
use crate::condition::Condition;
use crate::error::Result;
use crate::registry;
use crate::types::{Ed25519Sha512, PreimageSha256, RsaSha256, ThresholdSha256};

/// Concrete evidence that a condition's rule is satisfied for a
/// message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fulfillment {
    /// PREIMAGE-SHA-256 leaf.
    Preimage(PreimageSha256),
    /// THRESHOLD-SHA-256 composite.
    Threshold(ThresholdSha256),
    /// RSA-SHA-256 leaf.
    Rsa(RsaSha256),
    /// ED25519-SHA-512 leaf.
    Ed25519(Ed25519Sha512),
}

impl Fulfillment {
    /// Registry identifier of this variant.
    pub fn type_id(&self) -> u16 {
        match self {
            Fulfillment::Preimage(_) => registry::TYPE_ID_PREIMAGE_SHA256,
            Fulfillment::Threshold(_) => registry::TYPE_ID_THRESHOLD_SHA256,
            Fulfillment::Rsa(_) => registry::TYPE_ID_RSA_SHA256,
            Fulfillment::Ed25519(_) => registry::TYPE_ID_ED25519_SHA512,
        }
    }

    /// Derive the condition this fulfillment satisfies.
    ///
    /// Fails with [`crate::ConditionError::Unsatisfiable`] only for
    /// threshold trees whose subconditions cannot reach their stated
    /// threshold.
    pub fn condition(&self) -> Result<Condition> {
        match self {
            Fulfillment::Preimage(preimage) => Ok(preimage.condition()),
            Fulfillment::Threshold(threshold) => threshold.condition(),
            Fulfillment::Rsa(rsa) => Ok(rsa.condition()),
            Fulfillment::Ed25519(ed25519) => Ok(ed25519.condition()),
        }
    }

    /// Append the canonical payload (the URI body) to `writer`.
    pub fn encode_payload(&self, writer: &mut Writer) -> Result<()> {
        match self {
            Fulfillment::Preimage(preimage) => {
                preimage.encode_payload(writer);
                Ok(())
            }
            Fulfillment::Threshold(threshold) => threshold.encode_payload(writer),
            Fulfillment::Rsa(rsa) => {
                rsa.encode_payload(writer);
                Ok(())
            }
            Fulfillment::Ed25519(ed25519) => {
                ed25519.encode_payload(writer);
                Ok(())
            }
        }
    }

    /// Canonical payload as a fresh buffer.
    pub fn payload(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new();
        self.encode_payload(&mut writer)?;
        Ok(writer.into_vec())
    }

    /// Append the framed binary form (type identifier plus payload) to
    /// `writer`. This is the form embedded in threshold slots.
    pub fn encode(&self, writer: &mut Writer) -> Result<()> {
        writer.write_u16(self.type_id());
        writer.write_var_octet_string(&self.payload()?);
        Ok(())
    }

    /// Framed binary form as a fresh buffer.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new();
        self.encode(&mut writer)?;
        Ok(writer.into_vec())
    }

    /// Decode one framed fulfillment from `reader`.
    pub fn decode(reader: &mut Reader<'_>) -> Result<Self> {
        let type_id = reader.read_u16()?;
        let payload = reader.read_var_octet_string()?;
        registry::decode_fulfillment_payload(type_id, payload)
    }

    /// Decode a framed fulfillment that must span the whole buffer.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(bytes);
        let fulfillment = Self::decode(&mut reader)?;
        reader.expect_eof()?;
        Ok(fulfillment)
    }

    /// Check this fulfillment against `message`.
    ///
    /// Leaves run their primitive check; thresholds check the weighted
    /// quorum and then every fulfilled slot, depth first, against the
    /// same message.
    pub fn verify(&self, message: &[u8]) -> Result<()> {
        match self {
            Fulfillment::Preimage(preimage) => preimage.verify(message),
            Fulfillment::Threshold(threshold) => threshold.verify(message),
            Fulfillment::Rsa(rsa) => rsa.verify(message),
            Fulfillment::Ed25519(ed25519) => ed25519.verify(message),
        }
    }

    /// Textual `cf:` form of this fulfillment.
    pub fn uri(&self) -> Result<String> {
        crate::uri::serialize_fulfillment_uri(self)
    }

    /// Textual `cc:` form of the derived condition.
    pub fn condition_uri(&self) -> Result<String> {
        Ok(crate::uri::serialize_condition_uri(&self.condition()?))
    }
}

impl From<PreimageSha256> for Fulfillment {
    fn from(preimage: PreimageSha256) -> Self {
        Fulfillment::Preimage(preimage)
    }
}

impl From<ThresholdSha256> for Fulfillment {
    fn from(threshold: ThresholdSha256) -> Self {
        Fulfillment::Threshold(threshold)
    }
}

impl From<RsaSha256> for Fulfillment {
    fn from(rsa: RsaSha256) -> Self {
        Fulfillment::Rsa(rsa)
    }
}

impl From<Ed25519Sha512> for Fulfillment {
    fn from(ed25519: Ed25519Sha512) -> Self {
        Fulfillment::Ed25519(ed25519)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use crate::error::ConditionError;

    #[test]
    fn test_binary_round_trip() {
        let fulfillment: Fulfillment = PreimageSha256::new(b"secret".to_vec()).into();
        let bytes = fulfillment.to_bytes().unwrap();
        let parsed = Fulfillment::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, fulfillment);
        assert_eq!(
            parsed.condition().unwrap(),
            fulfillment.condition().unwrap()
        );
    }

    #[test]
    fn test_decode_rejects_unknown_type() {
        // Type 1 is the reserved PREFIX slot.
        let bytes = [0x00, 0x01, 0x00];
        assert_matches!(
            Fulfillment::from_bytes(&bytes),
            Err(ConditionError::UnknownType(1))
        );
    }

    #[test]
    fn test_condition_is_idempotent() {
        let fulfillment: Fulfillment = PreimageSha256::new(vec![1, 2, 3]).into();
        assert_eq!(
            fulfillment.condition().unwrap(),
            fulfillment.condition().unwrap()
        );
    }
}
