//! Unified error handling for condition and fulfillment operations.

/// Errors produced while encoding, decoding, deriving, or verifying
/// conditions and fulfillments.
///
/// Parse-time failures (`MalformedEncoding`, `InvalidUri`, `UnknownType`)
/// are structurally distinct from verification failures
/// (`ThresholdNotMet`, `VerificationFailed`, `ConditionMismatch`), so
/// callers can tell malformed input apart from a valid but unsatisfied
/// proof without re-parsing.
#[derive(Debug, thiserror::Error)]
pub enum ConditionError {
    /// Byte input is not a valid canonical encoding of its declared type.
    #[error("malformed encoding: {0}")]
    MalformedEncoding(String),

    /// Textual wrapper is malformed (bad prefix, bad charset, bad shape).
    #[error("invalid URI: {0}")]
    InvalidUri(String),

    /// Type identifier absent from the registry.
    #[error("unknown condition type {0}")]
    UnknownType(u16),

    /// The weighted sum of fulfilled slots does not reach the threshold.
    #[error("threshold not met: fulfilled weight {actual} of required {required}")]
    ThresholdNotMet {
        /// Threshold the fulfillment committed to.
        required: u64,
        /// Weight actually backed by evidence.
        actual: u64,
    },

    /// Well-formed input that fails the cryptographic or logical check.
    #[error("verification failed: {0}")]
    VerificationFailed(String),

    /// The derived condition disagrees with the supplied one.
    #[error("condition mismatch: expected {expected}, derived {derived}")]
    ConditionMismatch {
        /// Condition URI the caller supplied.
        expected: String,
        /// Condition URI derived from the fulfillment tree.
        derived: String,
    },

    /// A threshold structure whose subconditions cannot reach the stated
    /// threshold. A caller error in the condition definition, not a
    /// failed proof.
    #[error("threshold is unsatisfiable by its subconditions")]
    Unsatisfiable,
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ConditionError>;
