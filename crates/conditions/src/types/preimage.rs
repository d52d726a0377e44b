//! PREIMAGE-SHA-256: a hashlock satisfied by revealing the preimage.

use sha2::{Digest, Sha256};

use crate::codec::{Reader, Writer};
use crate::condition::{Condition, SubtypeMask};
use crate::error::Result;
use crate::fulfillment::Fulfillment;
use crate::registry;

/// Hashlock fulfillment: the preimage itself is the evidence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreimageSha256 {
    preimage: Vec<u8>,
}

impl PreimageSha256 {
    /// Wrap a preimage. Any byte string qualifies, including the empty
    /// one.
    pub fn new(preimage: impl Into<Vec<u8>>) -> Self {
        Self {
            preimage: preimage.into(),
        }
    }

    /// The committed preimage.
    pub fn preimage(&self) -> &[u8] {
        &self.preimage
    }

    /// Derive the hashlock condition: fingerprint is the SHA-256 of the
    /// preimage, cost is the preimage length.
    pub fn condition(&self) -> Condition {
        let fingerprint: [u8; 32] = Sha256::digest(&self.preimage).into();
        Condition::new(
            registry::TYPE_ID_PREIMAGE_SHA256,
            SubtypeMask::SHA_256 | SubtypeMask::PREIMAGE,
            fingerprint,
            self.preimage.len() as u64,
        )
    }

    /// The payload is the raw preimage; the surrounding frame carries
    /// the length.
    pub(crate) fn encode_payload(&self, writer: &mut Writer) {
        writer.write_raw(&self.preimage);
    }

    pub(crate) fn decode_payload(reader: &mut Reader<'_>) -> Result<Fulfillment> {
        Ok(PreimageSha256::new(reader.read_rest().to_vec()).into())
    }

    /// Preimage evidence needs no message check: revealing a preimage
    /// whose digest matches the condition is the whole proof, and the
    /// digest comparison happens during condition matching.
    pub fn verify(&self, _message: &[u8]) -> Result<()> {
        Ok(())
    }
}
