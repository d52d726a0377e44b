//! Condition/fulfillment variants.

/// ED25519-SHA-512 signature leaf.
pub mod ed25519;
/// PREIMAGE-SHA-256 hashlock leaf.
pub mod preimage;
/// RSA-SHA-256 (RSA-PSS) signature leaf.
pub mod rsa;
/// THRESHOLD-SHA-256 weighted quorum composite.
pub mod threshold;

pub use ed25519::Ed25519Sha512;
pub use preimage::PreimageSha256;
pub use rsa::RsaSha256;
pub use threshold::{calculate_worst_case_length, Slot, ThresholdSha256, WeightedSize};
