//! Crypto-conditions: distributable commitments and their proofs.
//!
//! A *condition* is a small, immutable commitment to a satisfiability
//! rule; a *fulfillment* is the evidence that satisfies it. Conditions
//! travel as `cc:` URIs, fulfillments as `cf:` URIs, and both have a
//! canonical binary form so that equal structures always serialize to
//! equal bytes.
//!
//! ## Variant catalogue
//!
//! - **PreimageSha256**: hashlock, satisfied by revealing the preimage
//! - **ThresholdSha256**: weighted M-of-N composition over any variants
//! - **RsaSha256**: RSA-PSS signature over the verified message
//! - **Ed25519Sha512**: Ed25519 signature over the verified message
//!
//! ## Quick start
//!
//! ```
//! use crypto_conditions::{validate_fulfillment, Fulfillment, ThresholdSha256};
//! use crypto_conditions::types::PreimageSha256;
//!
//! let mut threshold = ThresholdSha256::new(1);
//! threshold.add_subfulfillment(PreimageSha256::new(b"open sesame".to_vec()).into());
//!
//! let fulfillment = Fulfillment::from(threshold);
//! let condition_uri = fulfillment.condition_uri().unwrap();
//! let fulfillment_uri = fulfillment.uri().unwrap();
//! assert!(validate_fulfillment(&fulfillment_uri, &condition_uri, b""));
//! ```

pub mod codec;
pub mod condition;
pub mod error;
pub mod fulfillment;
pub mod registry;
pub mod types;
pub mod uri;
pub mod validate;

pub use condition::{Condition, SubtypeMask, FINGERPRINT_LEN};
pub use error::{ConditionError, Result};
pub use fulfillment::Fulfillment;
pub use types::{calculate_worst_case_length, ThresholdSha256, WeightedSize};
pub use uri::{
    parse_condition_uri, parse_fulfillment_uri, serialize_condition_uri,
    serialize_fulfillment_uri,
};
pub use validate::{check_fulfillment, validate_fulfillment};
