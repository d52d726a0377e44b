//! THRESHOLD-SHA-256: a condition satisfied by a weighted quorum of
//! subconditions.
//!
//! The derived condition depends only on the threshold and the multiset
//! of `(weight, subcondition)` pairs. Slot order never matters, and
//! neither does which slots actually carry evidence: canonical sibling
//! ordering is computed at encode and derive time, so construction
//! order is irrelevant by construction.

use std::collections::HashMap;

use sha2::{Digest, Sha256};

use crate::codec::{
    canonical_cmp, sort_canonical, var_octet_len, var_uint_len, Reader, Writer,
};
use crate::condition::{Condition, SubtypeMask};
use crate::error::{ConditionError, Result};
use crate::fulfillment::Fulfillment;
use crate::registry;

/// One weighted position inside a threshold fulfillment.
///
/// A slot either carries evidence (`Fulfilled`) or only the commitment
/// (`ConditionOnly`). Both kinds contribute identically to the derived
/// condition; only `Fulfilled` slots participate in verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    /// Evidence is present for this subcondition.
    Fulfilled {
        /// Quorum weight of this slot.
        weight: u32,
        /// The sub-fulfillment backing the slot.
        fulfillment: Fulfillment,
    },
    /// Only the commitment is present; this slot is not relied upon for
    /// this fulfillment instance.
    ConditionOnly {
        /// Quorum weight of this slot.
        weight: u32,
        /// The stored subcondition.
        condition: Condition,
    },
}

impl Slot {
    /// Quorum weight of this slot.
    pub fn weight(&self) -> u32 {
        match self {
            Slot::Fulfilled { weight, .. } | Slot::ConditionOnly { weight, .. } => *weight,
        }
    }

    /// The subcondition this slot commits to, derived from the
    /// fulfillment when evidence is present.
    pub fn subcondition(&self) -> Result<Condition> {
        match self {
            Slot::Fulfilled { fulfillment, .. } => fulfillment.condition(),
            Slot::ConditionOnly { condition, .. } => Ok(condition.clone()),
        }
    }
}

/// Weighted quorum fulfillment over nested subconditions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThresholdSha256 {
    threshold: u32,
    slots: Vec<Slot>,
}

impl ThresholdSha256 {
    /// Create an empty threshold fulfillment. The threshold and every
    /// slot weight must be positive; deriving a condition or encoding
    /// a payload fails otherwise.
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold,
            slots: Vec::new(),
        }
    }

    /// Replace the threshold.
    pub fn set_threshold(&mut self, threshold: u32) {
        self.threshold = threshold;
    }

    /// The committed threshold.
    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// The slots in insertion order. Order carries no meaning; encoding
    /// and derivation canonicalize it.
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Add a sub-fulfillment with the default weight of 1.
    pub fn add_subfulfillment(&mut self, fulfillment: Fulfillment) {
        self.add_subfulfillment_weighted(1, fulfillment);
    }

    /// Add a sub-fulfillment with an explicit positive weight.
    pub fn add_subfulfillment_weighted(&mut self, weight: u32, fulfillment: Fulfillment) {
        self.slots.push(Slot::Fulfilled {
            weight,
            fulfillment,
        });
    }

    /// Add a bare subcondition with the default weight of 1.
    pub fn add_subcondition(&mut self, condition: Condition) {
        self.add_subcondition_weighted(1, condition);
    }

    /// Add a bare subcondition with an explicit positive weight.
    pub fn add_subcondition_weighted(&mut self, weight: u32, condition: Condition) {
        self.slots.push(Slot::ConditionOnly { weight, condition });
    }

    /// Zero thresholds and zero weights are rejected at decode, so
    /// emitting them would produce unparseable output. The same bound
    /// applies before deriving or encoding.
    fn require_positive(&self) -> Result<()> {
        if self.threshold == 0 {
            return Err(ConditionError::MalformedEncoding(
                "threshold 0 outside the positive range".into(),
            ));
        }
        if self.slots.iter().any(|slot| slot.weight() == 0) {
            return Err(ConditionError::MalformedEncoding(
                "slot weight 0 outside the positive range".into(),
            ));
        }
        Ok(())
    }

    fn subconditions(&self) -> Result<Vec<(u32, Condition)>> {
        self.slots
            .iter()
            .map(|slot| Ok((slot.weight(), slot.subcondition()?)))
            .collect()
    }

    /// Canonical fingerprint contents: the threshold plus every
    /// `(weight, subcondition)` pair in canonical sibling order. Each
    /// occurrence of a duplicate subcondition is a distinct element.
    pub(crate) fn fingerprint_contents(&self) -> Result<Vec<u8>> {
        let subconditions = self.subconditions()?;
        let mut items: Vec<Vec<u8>> = subconditions
            .iter()
            .map(|(weight, condition)| {
                let mut item = Writer::new();
                item.write_var_uint(u64::from(*weight));
                condition.encode(&mut item);
                item.into_vec()
            })
            .collect();
        sort_canonical(&mut items);

        let mut writer = Writer::new();
        writer.write_u32(self.threshold);
        writer.write_var_uint(items.len() as u64);
        for item in &items {
            writer.write_raw(item);
        }
        Ok(writer.into_vec())
    }

    /// Derive the condition for this threshold tree.
    pub fn condition(&self) -> Result<Condition> {
        self.require_positive()?;
        let subconditions = self.subconditions()?;
        let fingerprint: [u8; 32] = Sha256::digest(self.fingerprint_contents()?).into();
        let mut subtypes = SubtypeMask::SHA_256 | SubtypeMask::THRESHOLD;
        for (_, condition) in &subconditions {
            subtypes |= condition.subtypes();
        }
        let cost = self.calculate_cost(&subconditions)?;
        Ok(Condition::new(
            registry::TYPE_ID_THRESHOLD_SHA256,
            subtypes,
            fingerprint,
            cost,
        ))
    }

    /// Upper bound on the encoded size of any fulfillment of this
    /// condition: the envelope plus the worst weight-satisfying mix of
    /// sub-fulfillments and leftover subconditions.
    ///
    /// Subcondition costs come off the wire, so the size arithmetic
    /// must not trust them: a predicted fulfillment size beyond `i64`
    /// is rejected as malformed rather than wrapped.
    fn calculate_cost(&self, subconditions: &[(u32, Condition)]) -> Result<u64> {
        let mut total_condition_len: i64 = 0;
        let mut entries = Vec::with_capacity(subconditions.len());
        for (weight, condition) in subconditions {
            let condition_len = condition.encoded_len() as i64;
            let fulfillment_len = i64::try_from(predicted_fulfillment_len(condition.cost()))
                .map_err(|_| {
                    ConditionError::MalformedEncoding(format!(
                        "subcondition cost {} overflows the cost envelope",
                        condition.cost()
                    ))
                })?;
            total_condition_len += condition_len;
            entries.push(WeightedSize {
                weight: u64::from(*weight),
                size: fulfillment_len - condition_len,
            });
        }

        let worst = calculate_worst_case_length(u64::from(self.threshold), &entries)
            .ok_or(ConditionError::Unsatisfiable)?;
        let bodies = u64::try_from(total_condition_len.saturating_add(worst)).map_err(|_| {
            ConditionError::MalformedEncoding(
                "worst-case fulfillment size underflows the cost envelope".into(),
            )
        })?;

        let slot_count = self.slots.len() as u64;
        Ok(var_uint_len(u64::from(self.threshold))
            .saturating_add(var_uint_len(slot_count))
            .saturating_add(2)
            .saturating_add(slot_count)
            .saturating_add(bodies))
    }

    /// Encode the canonical payload.
    ///
    /// The smallest weight-satisfying set of fulfilled slots is
    /// serialized as evidence; every other slot is demoted to its bare
    /// subcondition. Slots are written in canonical sibling order.
    pub(crate) fn encode_payload(&self, writer: &mut Writer) -> Result<()> {
        self.require_positive()?;
        let slot_count = self.slots.len();
        let mut condition_bins = Vec::with_capacity(slot_count);
        let mut fulfillment_bins: Vec<Option<Vec<u8>>> = Vec::with_capacity(slot_count);
        for slot in &self.slots {
            condition_bins.push(slot.subcondition()?.to_bytes());
            fulfillment_bins.push(match slot {
                Slot::Fulfilled { fulfillment, .. } => Some(fulfillment.to_bytes()?),
                Slot::ConditionOnly { .. } => None,
            });
        }

        // Pick the cheapest quorum among the slots that carry evidence.
        // Candidates are ordered by content, not insertion order, so
        // ties in the selection cannot leak construction order into the
        // encoding.
        let mut candidate_indexes: Vec<usize> = (0..slot_count)
            .filter(|&index| fulfillment_bins[index].is_some())
            .collect();
        candidate_indexes.sort_by(|&a, &b| {
            self.slots[b]
                .weight()
                .cmp(&self.slots[a].weight())
                .then_with(|| {
                    canonical_cmp(
                        fulfillment_bins[a].as_deref().unwrap_or(&[]),
                        fulfillment_bins[b].as_deref().unwrap_or(&[]),
                    )
                })
                .then_with(|| canonical_cmp(&condition_bins[a], &condition_bins[b]))
        });
        let candidates: Vec<(u64, i64)> = candidate_indexes
            .iter()
            .map(|&index| {
                let fulfillment_len = fulfillment_bins[index]
                    .as_deref()
                    .map(|bin| bin.len() as i64)
                    .unwrap_or_default();
                (
                    u64::from(self.slots[index].weight()),
                    fulfillment_len - condition_bins[index].len() as i64,
                )
            })
            .collect();
        let selection = smallest_valid_set(u64::from(self.threshold), &candidates)
            .ok_or(ConditionError::Unsatisfiable)?;
        let mut keep_evidence = vec![false; slot_count];
        for (candidate, &index) in candidate_indexes.iter().enumerate() {
            keep_evidence[index] = selection[candidate];
        }

        let empty: [u8; 0] = [];
        let mut encoded_slots: Vec<Vec<u8>> = Vec::with_capacity(slot_count);
        for index in 0..slot_count {
            let mut slot_writer = Writer::new();
            slot_writer.write_var_uint(u64::from(self.slots[index].weight()));
            if keep_evidence[index] {
                slot_writer.write_var_octet_string(
                    fulfillment_bins[index].as_deref().unwrap_or(&empty),
                );
                slot_writer.write_var_octet_string(&empty);
            } else {
                slot_writer.write_var_octet_string(&empty);
                slot_writer.write_var_octet_string(&condition_bins[index]);
            }
            encoded_slots.push(slot_writer.into_vec());
        }
        sort_canonical(&mut encoded_slots);

        writer.write_var_uint(u64::from(self.threshold));
        writer.write_var_uint(slot_count as u64);
        for slot in &encoded_slots {
            writer.write_raw(slot);
        }
        Ok(())
    }

    pub(crate) fn decode_payload(reader: &mut Reader<'_>) -> Result<Fulfillment> {
        let threshold = reader.read_var_uint()?;
        if threshold == 0 || threshold > u64::from(u32::MAX) {
            return Err(ConditionError::MalformedEncoding(format!(
                "threshold {threshold} outside the positive 32-bit range"
            )));
        }
        let slot_count = reader.read_var_uint()?;
        if slot_count == 0 {
            return Err(ConditionError::MalformedEncoding(
                "threshold fulfillment with no slots".into(),
            ));
        }

        let mut slots = Vec::new();
        let mut previous: Option<&[u8]> = None;
        for _ in 0..slot_count {
            let start = reader.position();
            let weight = reader.read_var_uint()?;
            if weight == 0 || weight > u64::from(u32::MAX) {
                return Err(ConditionError::MalformedEncoding(format!(
                    "slot weight {weight} outside the positive 32-bit range"
                )));
            }
            let fulfillment_bin = reader.read_var_octet_string()?;
            let condition_bin = reader.read_var_octet_string()?;

            let slot_bytes = reader.consumed_since(start);
            if let Some(previous) = previous {
                if canonical_cmp(previous, slot_bytes) == std::cmp::Ordering::Greater {
                    return Err(ConditionError::MalformedEncoding(
                        "threshold slots out of canonical order".into(),
                    ));
                }
            }
            previous = Some(slot_bytes);

            let weight = weight as u32;
            let slot = match (fulfillment_bin.is_empty(), condition_bin.is_empty()) {
                (false, true) => Slot::Fulfilled {
                    weight,
                    fulfillment: Fulfillment::from_bytes(fulfillment_bin)?,
                },
                (true, false) => Slot::ConditionOnly {
                    weight,
                    condition: Condition::from_bytes(condition_bin)?,
                },
                (true, true) => {
                    return Err(ConditionError::MalformedEncoding(
                        "slot carries neither fulfillment nor condition".into(),
                    ))
                }
                (false, false) => {
                    return Err(ConditionError::MalformedEncoding(
                        "slot carries both fulfillment and condition".into(),
                    ))
                }
            };
            slots.push(slot);
        }

        Ok(ThresholdSha256 {
            threshold: threshold as u32,
            slots,
        }
        .into())
    }

    /// Check the weighted quorum, then every fulfilled slot against the
    /// same message. Condition-only slots are never verified.
    pub fn verify(&self, message: &[u8]) -> Result<()> {
        let required = u64::from(self.threshold);
        let actual: u64 = self
            .slots
            .iter()
            .filter(|slot| matches!(slot, Slot::Fulfilled { .. }))
            .map(|slot| u64::from(slot.weight()))
            .sum();
        if actual < required {
            return Err(ConditionError::ThresholdNotMet { required, actual });
        }
        for slot in &self.slots {
            if let Slot::Fulfilled { fulfillment, .. } = slot {
                fulfillment.verify(message)?;
            }
        }
        Ok(())
    }
}

/// Predicted framed size of a fulfillment whose condition reports
/// `cost` payload bytes: type identifier plus the framed payload.
fn predicted_fulfillment_len(cost: u64) -> u64 {
    var_octet_len(cost).saturating_add(2)
}

/// One subcondition as seen by the worst-case-size algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeightedSize {
    /// Quorum weight of the subcondition.
    pub weight: u64,
    /// Size contribution if this subcondition is fulfilled. May be
    /// negative when the fulfillment is cheaper than the condition it
    /// replaces.
    pub size: i64,
}

/// Maximum total size over every subset of `subconditions` whose
/// weights sum to at least `threshold`. Returns `None` when no subset
/// reaches the threshold, which happens exactly when the weights sum to
/// less than it.
///
/// The scan stops crediting a branch once its remaining threshold is
/// met, so the admitted subsets depend on scan order. Entries are
/// therefore sorted by descending weight internally: that both fixes
/// the result independent of caller order and enables suffix-weight
/// pruning. Memoized on `(index, remaining)`; unmemoized recursion
/// would be exponential on adversarial trees.
pub fn calculate_worst_case_length(
    threshold: u64,
    subconditions: &[WeightedSize],
) -> Option<i64> {
    if threshold == 0 {
        return Some(0);
    }
    let mut entries = subconditions.to_vec();
    entries.sort_by(|a, b| b.weight.cmp(&a.weight));
    let mut suffix_weight = vec![0u64; entries.len() + 1];
    for index in (0..entries.len()).rev() {
        suffix_weight[index] = suffix_weight[index + 1].saturating_add(entries[index].weight);
    }
    let mut memo = HashMap::new();
    worst_case(&entries, &suffix_weight, &mut memo, threshold, 0)
}

fn worst_case(
    subconditions: &[WeightedSize],
    suffix_weight: &[u64],
    memo: &mut HashMap<(usize, u64), Option<i64>>,
    remaining: u64,
    index: usize,
) -> Option<i64> {
    // The suffix cannot reach the remaining threshold, so neither can
    // any branch below this point. Also covers running off the end.
    if suffix_weight[index] < remaining {
        return None;
    }
    if let Some(&cached) = memo.get(&(index, remaining)) {
        return cached;
    }
    let entry = subconditions[index];
    let with_it = if entry.weight >= remaining {
        Some(entry.size)
    } else {
        worst_case(
            subconditions,
            suffix_weight,
            memo,
            remaining - entry.weight,
            index + 1,
        )
        .map(|rest| rest.saturating_add(entry.size))
    };
    let without_it = worst_case(subconditions, suffix_weight, memo, remaining, index + 1);
    let best = match (with_it, without_it) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (some, None) => some,
        (None, some) => some,
    };
    memo.insert((index, remaining), best);
    best
}

/// Choose the cheapest subset of `candidates` whose weights reach
/// `threshold`, minimizing the summed size deltas. Returns one flag per
/// candidate, or `None` when the threshold is unreachable.
fn smallest_valid_set(threshold: u64, candidates: &[(u64, i64)]) -> Option<Vec<bool>> {
    let mut suffix_weight = vec![0u64; candidates.len() + 1];
    for index in (0..candidates.len()).rev() {
        suffix_weight[index] = suffix_weight[index + 1].saturating_add(candidates[index].0);
    }
    let mut memo = HashMap::new();
    min_extra_size(candidates, &suffix_weight, &mut memo, threshold, 0)?;

    // Walk the memo table again to recover one optimal selection.
    let mut selected = vec![false; candidates.len()];
    let mut remaining = threshold;
    let mut index = 0;
    while remaining > 0 {
        let (weight, size) = candidates[index];
        let with_it = if weight >= remaining {
            Some(size)
        } else {
            min_extra_size(candidates, &suffix_weight, &mut memo, remaining - weight, index + 1)
                .map(|rest| rest.saturating_add(size))
        };
        let without_it =
            min_extra_size(candidates, &suffix_weight, &mut memo, remaining, index + 1);
        let take = match (with_it, without_it) {
            (Some(a), Some(b)) => a <= b,
            (Some(_), None) => true,
            (None, _) => false,
        };
        if take {
            selected[index] = true;
            remaining = remaining.saturating_sub(weight);
        }
        index += 1;
    }
    Some(selected)
}

fn min_extra_size(
    candidates: &[(u64, i64)],
    suffix_weight: &[u64],
    memo: &mut HashMap<(usize, u64), Option<i64>>,
    remaining: u64,
    index: usize,
) -> Option<i64> {
    if remaining == 0 {
        return Some(0);
    }
    if suffix_weight[index] < remaining {
        return None;
    }
    if let Some(&cached) = memo.get(&(index, remaining)) {
        return cached;
    }
    let (weight, size) = candidates[index];
    let with_it = if weight >= remaining {
        Some(size)
    } else {
        min_extra_size(candidates, suffix_weight, memo, remaining - weight, index + 1)
            .map(|rest| rest.saturating_add(size))
    };
    let without_it = min_extra_size(candidates, suffix_weight, memo, remaining, index + 1);
    let best = match (with_it, without_it) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (some, None) => some,
        (None, some) => some,
    };
    memo.insert((index, remaining), best);
    best
}
