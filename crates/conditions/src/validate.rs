//! One-call check of a fulfillment URI against a condition URI.

use tracing::debug;

use crate::error::{ConditionError, Result};
use crate::uri;

/// Check that `fulfillment_uri` satisfies `condition_uri` for
/// `message`.
///
/// Both URIs are parsed strictly, the condition the fulfillment commits
/// to is rederived and compared field-by-field against the stated one,
/// and only then is the cryptographic evidence verified.
pub fn check_fulfillment(fulfillment_uri: &str, condition_uri: &str, message: &[u8]) -> Result<()> {
    let fulfillment = uri::parse_fulfillment_uri(fulfillment_uri)?;
    let expected = uri::parse_condition_uri(condition_uri)?;
    let derived = fulfillment.condition()?;
    if derived != expected {
        return Err(ConditionError::ConditionMismatch {
            expected: expected.uri(),
            derived: derived.uri(),
        });
    }
    fulfillment.verify(message)
}

/// Boolean form of [`check_fulfillment`]; the rejection reason is
/// reported at debug level.
pub fn validate_fulfillment(fulfillment_uri: &str, condition_uri: &str, message: &[u8]) -> bool {
    match check_fulfillment(fulfillment_uri, condition_uri, message) {
        Ok(()) => true,
        Err(err) => {
            debug!(%condition_uri, %err, "fulfillment rejected");
            false
        }
    }
}
