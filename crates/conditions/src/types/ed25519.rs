//! ED25519-SHA-512: an Ed25519 signature over the message.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};

use crate::codec::{Reader, Writer};
use crate::condition::{Condition, SubtypeMask};
use crate::error::{ConditionError, Result};
use crate::fulfillment::Fulfillment;
use crate::registry;

/// Encoded payload size: 32-byte public key plus 64-byte signature.
/// Also the cost, since Ed25519 fulfillments have a fixed size.
pub const ED25519_COST: u64 = 96;

/// Ed25519 signature fulfillment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ed25519Sha512 {
    public_key: VerifyingKey,
    signature: Signature,
}

impl Ed25519Sha512 {
    /// Wrap an existing public key and signature.
    pub fn new(public_key: VerifyingKey, signature: Signature) -> Self {
        Self {
            public_key,
            signature,
        }
    }

    /// Sign `message` and produce the corresponding fulfillment.
    pub fn sign(signing_key: &SigningKey, message: &[u8]) -> Self {
        Self {
            public_key: signing_key.verifying_key(),
            signature: signing_key.sign(message),
        }
    }

    /// The signer's public key.
    pub fn public_key(&self) -> &VerifyingKey {
        &self.public_key
    }

    /// The signature carried as evidence.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Derive the condition. The fingerprint is the public key itself:
    /// it already identifies the rule and is exactly digest-sized.
    pub fn condition(&self) -> Condition {
        Condition::new(
            registry::TYPE_ID_ED25519_SHA512,
            SubtypeMask::ED25519,
            self.public_key.to_bytes(),
            ED25519_COST,
        )
    }

    pub(crate) fn encode_payload(&self, writer: &mut Writer) {
        writer.write_raw(&self.public_key.to_bytes());
        writer.write_raw(&self.signature.to_bytes());
    }

    pub(crate) fn decode_payload(reader: &mut Reader<'_>) -> Result<Fulfillment> {
        if reader.remaining() != 96 {
            return Err(truncated(reader.remaining()));
        }
        let key_bytes: [u8; 32] = reader.read_array()?;
        let public_key = VerifyingKey::from_bytes(&key_bytes).map_err(|err| {
            ConditionError::MalformedEncoding(format!("invalid ed25519 public key: {err}"))
        })?;
        let sig_bytes: [u8; 64] = reader.read_array()?;
        let signature = Signature::from_bytes(&sig_bytes);
        Ok(Ed25519Sha512::new(public_key, signature).into())
    }

    /// Check the signature over `message`.
    pub fn verify(&self, message: &[u8]) -> Result<()> {
        self.public_key
            .verify(message, &self.signature)
            .map_err(|_| {
                ConditionError::VerificationFailed(
                    "ed25519 signature does not verify against the message".into(),
                )
            })
    }
}

fn truncated(len: usize) -> ConditionError {
    ConditionError::MalformedEncoding(format!(
        "ed25519 payload must be a 32-byte key and a 64-byte signature, got {len} bytes"
    ))
}
