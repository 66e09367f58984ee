//! Retry policy lock tests: snapshot canonical form and digest binding.

use levelcert_harness::{PolicyConfig, RetryPolicy};
use levelcert_kernel::proof::canon::canonical_json_bytes;
use levelcert_search::Budget;

#[test]
fn snapshot_is_canonical_json() {
    let snapshot = RetryPolicy::default().snapshot().unwrap();
    let value: serde_json::Value = serde_json::from_slice(&snapshot.bytes).unwrap();
    assert_eq!(canonical_json_bytes(&value).unwrap(), snapshot.bytes);
    assert_eq!(value["max_attempts"], 10);
    assert_eq!(value["narrowing_rounds"], 3);
    assert_eq!(value["analyzer"]["density_fraction"]["$q"], 500_000);
    assert_eq!(value["quantization_decimals"], 6);
}

#[test]
fn snapshot_digest_is_stable_n10() {
    let first = RetryPolicy::default().snapshot().unwrap().digest();
    for _ in 0..10 {
        assert_eq!(RetryPolicy::default().snapshot().unwrap().digest(), first);
    }
}

#[test]
fn every_knob_is_bound_by_the_digest() {
    let base = RetryPolicy::default().snapshot().unwrap().digest();
    let variants = [
        PolicyConfig {
            max_attempts: Some(11),
            ..PolicyConfig::default()
        },
        PolicyConfig {
            narrowing_rounds: Some(0),
            ..PolicyConfig::default()
        },
        PolicyConfig {
            budget: Some(Budget::default().with_max_depth(99)),
            ..PolicyConfig::default()
        },
    ];
    for config in variants {
        let digest = config.build().snapshot().unwrap().digest();
        assert_ne!(digest, base);
    }
}

#[test]
fn empty_config_builds_default_policy() {
    assert_eq!(PolicyConfig::default().build(), RetryPolicy::default());
}
