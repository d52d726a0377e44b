//! Textual `cf:`/`cc:` serialization.
//!
//! Grammar (exact, case-sensitive):
//!
//! ```text
//! fulfillment-uri = "cf:" typeId ":" base64url-payload
//! condition-uri   = "cc:" typeId ":" subtypeHex ":" base64url-fingerprint ":" cost-decimal
//! ```
//!
//! Base64 is the RFC 4648 URL-safe alphabet without padding. Decimal
//! fields reject leading zeros so every condition has one textual form.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::condition::{Condition, SubtypeMask, FINGERPRINT_LEN};
use crate::error::{ConditionError, Result};
use crate::fulfillment::Fulfillment;
use crate::registry;

const FULFILLMENT_PREFIX: &str = "cf";
const CONDITION_PREFIX: &str = "cc";

/// Serialize a fulfillment as a `cf:` URI.
pub fn serialize_fulfillment_uri(fulfillment: &Fulfillment) -> Result<String> {
    Ok(format!(
        "{FULFILLMENT_PREFIX}:{}:{}",
        fulfillment.type_id(),
        URL_SAFE_NO_PAD.encode(fulfillment.payload()?)
    ))
}

/// Serialize a condition as a `cc:` URI.
pub fn serialize_condition_uri(condition: &Condition) -> String {
    format!(
        "{CONDITION_PREFIX}:{}:{:x}:{}:{}",
        condition.type_id(),
        condition.subtypes(),
        URL_SAFE_NO_PAD.encode(condition.fingerprint()),
        condition.cost()
    )
}

/// Parse a `cf:` URI into a fulfillment, enforcing the canonical
/// payload encoding.
pub fn parse_fulfillment_uri(uri: &str) -> Result<Fulfillment> {
    let parts: Vec<&str> = uri.split(':').collect();
    let [prefix, type_id, payload] = parts[..] else {
        return Err(ConditionError::InvalidUri(format!(
            "fulfillment URI has {} segments, expected 3",
            parts.len()
        )));
    };
    if prefix != FULFILLMENT_PREFIX {
        return Err(ConditionError::InvalidUri(format!(
            "fulfillment URI must start with \"{FULFILLMENT_PREFIX}:\", got \"{prefix}:\""
        )));
    }
    let type_id = parse_decimal(type_id, "type id")?;
    let type_id = u16::try_from(type_id)
        .map_err(|_| ConditionError::InvalidUri(format!("type id {type_id} out of range")))?;
    let payload = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|err| ConditionError::InvalidUri(format!("invalid base64url payload: {err}")))?;
    registry::decode_fulfillment_payload(type_id, &payload)
}

/// Parse a `cc:` URI into a detached condition.
pub fn parse_condition_uri(uri: &str) -> Result<Condition> {
    let parts: Vec<&str> = uri.split(':').collect();
    let [prefix, type_id, subtypes, fingerprint, cost] = parts[..] else {
        return Err(ConditionError::InvalidUri(format!(
            "condition URI has {} segments, expected 5",
            parts.len()
        )));
    };
    if prefix != CONDITION_PREFIX {
        return Err(ConditionError::InvalidUri(format!(
            "condition URI must start with \"{CONDITION_PREFIX}:\", got \"{prefix}:\""
        )));
    }
    let type_id = parse_decimal(type_id, "type id")?;
    let type_id = u16::try_from(type_id)
        .map_err(|_| ConditionError::InvalidUri(format!("type id {type_id} out of range")))?;
    // Surface unsupported variants before decoding the rest.
    registry::lookup(type_id)?;

    // Lowercase without leading zeros, so each mask has one textual
    // form, same as the cost field.
    if subtypes.is_empty()
        || !subtypes
            .bytes()
            .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    {
        return Err(ConditionError::InvalidUri(format!(
            "subtype mask \"{subtypes}\" is not lowercase hexadecimal"
        )));
    }
    if subtypes.len() > 1 && subtypes.starts_with('0') {
        return Err(ConditionError::InvalidUri(format!(
            "subtype mask \"{subtypes}\" has leading zeros"
        )));
    }
    let subtypes = u64::from_str_radix(subtypes, 16)
        .map_err(|err| ConditionError::InvalidUri(format!("subtype mask overflow: {err}")))?;

    let fingerprint = URL_SAFE_NO_PAD.decode(fingerprint).map_err(|err| {
        ConditionError::InvalidUri(format!("invalid base64url fingerprint: {err}"))
    })?;
    let fingerprint: [u8; FINGERPRINT_LEN] = fingerprint.as_slice().try_into().map_err(|_| {
        ConditionError::InvalidUri(format!(
            "fingerprint of {} bytes, expected {FINGERPRINT_LEN}",
            fingerprint.len()
        ))
    })?;

    let cost = parse_decimal(cost, "cost")?;

    Ok(Condition::new(
        type_id,
        SubtypeMask::from_bits(subtypes),
        fingerprint,
        cost,
    ))
}

/// Parse a non-negative decimal with no sign, no empty string, and no
/// leading zeros.
fn parse_decimal(text: &str, what: &str) -> Result<u64> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ConditionError::InvalidUri(format!(
            "{what} \"{text}\" is not a decimal integer"
        )));
    }
    if text.len() > 1 && text.starts_with('0') {
        return Err(ConditionError::InvalidUri(format!(
            "{what} \"{text}\" has leading zeros"
        )));
    }
    text.parse::<u64>()
        .map_err(|err| ConditionError::InvalidUri(format!("{what} \"{text}\" overflows: {err}")))
}
