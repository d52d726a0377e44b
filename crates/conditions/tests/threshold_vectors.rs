//! Known-answer vectors for THRESHOLD-SHA-256 serialization.
//!
//! Every URI here is fixed by the wire profile; a change to canonical
//! ordering, cost arithmetic, or the fingerprint contents will move one
//! of these strings.

use crypto_conditions::types::PreimageSha256;
use crypto_conditions::{
    parse_condition_uri, parse_fulfillment_uri, validate_fulfillment, Fulfillment,
    ThresholdSha256,
};

const EMPTY_PREIMAGE_URI: &str = "cf:0:";
const ONE_BYTE_PREIMAGE_URI: &str = "cf:0:AA";
const ED25519_URI: &str = "cf:4:dqFZIESm5PURJlvKc6YE2QsFKdHfYCvjChmpJXZg0fWuxqtqkSKv8PfcuWZ_\
                           9hMTaJRzK254wm9bZzEB4mf-Litl-k1T2tR4oa2mTVD9Hf232Ukg3D4aVkpkexy6NWAB";

fn sub(uri: &str) -> Fulfillment {
    parse_fulfillment_uri(uri).unwrap()
}

#[test]
fn test_one_of_one_over_empty_preimage() {
    let mut threshold = ThresholdSha256::new(1);
    threshold.add_subfulfillment(sub(EMPTY_PREIMAGE_URI));
    let fulfillment = Fulfillment::from(threshold);

    assert_eq!(fulfillment.uri().unwrap(), "cf:2:AQEBAQEBAwAAAAA");
    assert_eq!(
        fulfillment.condition_uri().unwrap(),
        "cc:2:b:x07W1xU1_oBcV9zUheOzspx6Beq8vgy0vYgBVifNV1Q:10"
    );
}

#[test]
fn test_two_of_two_over_duplicate_subconditions() {
    let mut threshold = ThresholdSha256::new(2);
    threshold.add_subfulfillment(sub(EMPTY_PREIMAGE_URI));
    threshold.add_subfulfillment(sub(EMPTY_PREIMAGE_URI));
    let fulfillment = Fulfillment::from(threshold);

    assert_eq!(fulfillment.uri().unwrap(), "cf:2:AQIBAgEBAwAAAAABAQMAAAAA");
    assert_eq!(
        fulfillment.condition_uri().unwrap(),
        "cc:2:b:y93kXzLJ49Qdn3CeCe6Qtuzmdg9LhPHQIESn8H4ghE0:14"
    );
}

#[test]
fn test_one_of_two_demotes_the_signature_slot() {
    let expected_fulfillment = "cf:2:AQEBAgEBBAAAAQAAAQEAJwAEASAgdqFZIESm5PURJlvKc6YE2QsFKdHfYCvjChmpJXZg0fUBYA";
    let expected_condition = "cc:2:2b:qD3rZtABzeF5vPqkXN_AJYRStKoowpnivH1-9fQFjSo:146";

    // Both insertion orders must serialize identically.
    for reversed in [false, true] {
        let mut subs = vec![sub(ED25519_URI), sub(ONE_BYTE_PREIMAGE_URI)];
        if reversed {
            subs.reverse();
        }
        let mut threshold = ThresholdSha256::new(1);
        for fulfillment in subs {
            threshold.add_subfulfillment(fulfillment);
        }
        let fulfillment = Fulfillment::from(threshold);

        assert_eq!(fulfillment.uri().unwrap(), expected_fulfillment);
        assert_eq!(fulfillment.condition_uri().unwrap(), expected_condition);
    }
}

#[test]
fn test_two_of_two_mixed_variants() {
    let mut threshold = ThresholdSha256::new(2);
    threshold.add_subfulfillment(sub(ONE_BYTE_PREIMAGE_URI));
    threshold.add_subfulfillment(sub(ED25519_URI));
    let fulfillment = Fulfillment::from(threshold);

    let fulfillment_uri = fulfillment.uri().unwrap();
    let condition_uri = fulfillment.condition_uri().unwrap();
    assert_eq!(
        fulfillment_uri,
        "cf:2:AQIBAgEBBAAAAQAAAQFjAARgdqFZIESm5PURJlvKc6YE2QsFKdHfYCvjChmpJXZg0fWuxqtqkSKv8PfcuWZ_\
         9hMTaJRzK254wm9bZzEB4mf-Litl-k1T2tR4oa2mTVD9Hf232Ukg3D4aVkpkexy6NWABAA"
    );
    assert_eq!(
        condition_uri,
        "cc:2:2b:qmhBlTdYm8mukRoIJla3EH9vNorXqXSWaKnlMHzz5D4:111"
    );

    // The embedded signature covers exactly this message.
    assert!(validate_fulfillment(&fulfillment_uri, &condition_uri, b"abc"));
    assert!(!validate_fulfillment(&fulfillment_uri, &condition_uri, b"abd"));
}

#[test]
fn test_vector_uris_parse_back_to_equal_structures() {
    let mut threshold = ThresholdSha256::new(2);
    threshold.add_subfulfillment(sub(ONE_BYTE_PREIMAGE_URI));
    threshold.add_subfulfillment(sub(ED25519_URI));
    let fulfillment = Fulfillment::from(threshold);

    let reparsed = parse_fulfillment_uri(&fulfillment.uri().unwrap()).unwrap();
    assert_eq!(
        reparsed.condition().unwrap(),
        parse_condition_uri(&fulfillment.condition_uri().unwrap()).unwrap()
    );
    assert_eq!(reparsed.uri().unwrap(), fulfillment.uri().unwrap());
}

#[test]
fn test_nested_threshold_condition_is_stable() {
    let mut inner = ThresholdSha256::new(1);
    inner.add_subfulfillment(PreimageSha256::new(b"inner".to_vec()).into());

    let mut outer = ThresholdSha256::new(2);
    outer.add_subfulfillment(inner.into());
    outer.add_subfulfillment(PreimageSha256::new(b"outer".to_vec()).into());
    let outer = Fulfillment::from(outer);

    let fulfillment_uri = outer.uri().unwrap();
    let condition_uri = outer.condition_uri().unwrap();
    assert!(validate_fulfillment(&fulfillment_uri, &condition_uri, b"anything"));

    let reparsed = parse_fulfillment_uri(&fulfillment_uri).unwrap();
    assert_eq!(reparsed.uri().unwrap(), fulfillment_uri);
}
