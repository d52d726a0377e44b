//! RSA-SHA-256: an RSA-PSS signature over the message.
//!
//! Keys are committed by raw modulus with a fixed public exponent of
//! 65537, so two conditions are equal exactly when their moduli are.

use rsa::pss::Pss;
use rsa::{BigUint, RsaPublicKey};
use sha2::{Digest, Sha256};

use crate::codec::{var_octet_len, Reader, Writer};
use crate::condition::{Condition, SubtypeMask};
use crate::error::{ConditionError, Result};
use crate::fulfillment::Fulfillment;
use crate::registry;

/// Smallest acceptable modulus, in bytes (1024-bit keys).
pub const MIN_MODULUS_LEN: usize = 128;
/// Largest acceptable modulus, in bytes (4096-bit keys).
pub const MAX_MODULUS_LEN: usize = 512;

const PUBLIC_EXPONENT: u32 = 65537;

/// RSA-PSS signature fulfillment over a raw modulus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsaSha256 {
    modulus: Vec<u8>,
    signature: Vec<u8>,
}

impl RsaSha256 {
    /// Wrap a big-endian modulus and a signature of the same width.
    pub fn new(modulus: Vec<u8>, signature: Vec<u8>) -> Result<Self> {
        if modulus.len() < MIN_MODULUS_LEN || modulus.len() > MAX_MODULUS_LEN {
            return Err(ConditionError::MalformedEncoding(format!(
                "rsa modulus of {} bytes outside {MIN_MODULUS_LEN}..={MAX_MODULUS_LEN}",
                modulus.len()
            )));
        }
        if modulus[0] == 0 {
            return Err(ConditionError::MalformedEncoding(
                "rsa modulus has a leading zero byte".into(),
            ));
        }
        if signature.len() != modulus.len() {
            return Err(ConditionError::MalformedEncoding(format!(
                "rsa signature of {} bytes does not match {}-byte modulus",
                signature.len(),
                modulus.len()
            )));
        }
        Ok(Self { modulus, signature })
    }

    /// Big-endian modulus bytes.
    pub fn modulus(&self) -> &[u8] {
        &self.modulus
    }

    /// Signature bytes, as wide as the modulus.
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    fn fingerprint_contents(&self) -> Vec<u8> {
        let mut writer = Writer::new();
        writer.write_var_octet_string(&self.modulus);
        writer.into_vec()
    }

    /// Derive the condition: the fingerprint hashes the framed modulus,
    /// and the cost is the predicted payload size (a signature is
    /// always exactly as wide as its modulus).
    pub fn condition(&self) -> Condition {
        let fingerprint: [u8; 32] = Sha256::digest(self.fingerprint_contents()).into();
        Condition::new(
            registry::TYPE_ID_RSA_SHA256,
            SubtypeMask::SHA_256 | SubtypeMask::RSA_PSS,
            fingerprint,
            2 * var_octet_len(self.modulus.len() as u64),
        )
    }

    pub(crate) fn encode_payload(&self, writer: &mut Writer) {
        writer.write_var_octet_string(&self.modulus);
        writer.write_var_octet_string(&self.signature);
    }

    pub(crate) fn decode_payload(reader: &mut Reader<'_>) -> Result<Fulfillment> {
        let modulus = reader.read_var_octet_string()?.to_vec();
        let signature = reader.read_var_octet_string()?.to_vec();
        Ok(RsaSha256::new(modulus, signature)?.into())
    }

    /// Check the RSA-PSS/SHA-256 signature over `message`.
    pub fn verify(&self, message: &[u8]) -> Result<()> {
        let public_key = RsaPublicKey::new(
            BigUint::from_bytes_be(&self.modulus),
            BigUint::from(PUBLIC_EXPONENT),
        )
        .map_err(|err| {
            ConditionError::VerificationFailed(format!("invalid rsa public key: {err}"))
        })?;
        let digest = Sha256::digest(message);
        public_key
            .verify(Pss::new::<Sha256>(), &digest, &self.signature)
            .map_err(|_| {
                ConditionError::VerificationFailed(
                    "rsa-pss signature does not verify against the message".into(),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn fake_modulus(len: usize) -> Vec<u8> {
        let mut modulus = vec![0xc3u8; len];
        modulus[len - 1] = 0x01;
        modulus
    }

    #[test]
    fn test_rejects_undersized_modulus() {
        assert_matches!(
            RsaSha256::new(fake_modulus(64), vec![0u8; 64]),
            Err(ConditionError::MalformedEncoding(_))
        );
    }

    #[test]
    fn test_rejects_signature_width_mismatch() {
        assert_matches!(
            RsaSha256::new(fake_modulus(256), vec![0u8; 128]),
            Err(ConditionError::MalformedEncoding(_))
        );
    }

    #[test]
    fn test_rejects_leading_zero_modulus() {
        let mut modulus = fake_modulus(256);
        modulus[0] = 0;
        assert_matches!(
            RsaSha256::new(modulus, vec![0u8; 256]),
            Err(ConditionError::MalformedEncoding(_))
        );
    }

    #[test]
    fn test_condition_cost_is_predicted_payload_size() {
        let fulfillment = RsaSha256::new(fake_modulus(256), vec![0u8; 256]).unwrap();
        let condition = fulfillment.condition();
        // Two framed 256-byte strings: 3-byte long-form prefix each.
        assert_eq!(condition.cost(), 2 * (3 + 256));
        assert_eq!(condition.type_id(), registry::TYPE_ID_RSA_SHA256);
        assert_eq!(condition.subtypes().bits(), 0x11);
    }

    #[test]
    fn test_garbage_signature_fails_verification() {
        let fulfillment = RsaSha256::new(fake_modulus(128), vec![7u8; 128]).unwrap();
        assert_matches!(
            fulfillment.verify(b"message"),
            Err(ConditionError::VerificationFailed(_))
        );
    }
}
