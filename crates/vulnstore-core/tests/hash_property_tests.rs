// Property tests for the enrichment content hasher

use proptest::prelude::*;
use vulnstore_core::{hash_enrichment, EnrichmentRecord, HASH_KIND};

fn tag() -> impl Strategy<Value = String> {
    "[a-z]{1,6}:[a-z0-9-]{1,10}"
}

proptest! {
    #[test]
    fn prop_tag_permutation_does_not_change_key(
        tags in proptest::collection::vec(tag(), 0..8),
        payload in proptest::collection::vec(any::<u8>(), 0..64),
    ) {
        let mut reversed = tags.clone();
        reversed.reverse();

        let a = EnrichmentRecord::new(tags, payload.clone());
        let b = EnrichmentRecord::new(reversed, payload);
        prop_assert_eq!(hash_enrichment(&a), hash_enrichment(&b));
    }

    #[test]
    fn prop_digest_has_fixed_length(
        tags in proptest::collection::vec(tag(), 0..8),
        payload in proptest::collection::vec(any::<u8>(), 0..256),
    ) {
        let key = hash_enrichment(&EnrichmentRecord::new(tags, payload));
        prop_assert_eq!(key.kind, HASH_KIND);
        prop_assert_eq!(key.digest.len(), 32);
        prop_assert_eq!(key.hex().len(), 64);
    }

    #[test]
    fn prop_payload_change_changes_key(
        tags in proptest::collection::vec(tag(), 1..4),
        payload in proptest::collection::vec(any::<u8>(), 1..64),
    ) {
        let mut altered = payload.clone();
        altered[0] = altered[0].wrapping_add(1);

        let a = EnrichmentRecord::new(tags.clone(), payload);
        let b = EnrichmentRecord::new(tags, altered);
        prop_assert_ne!(hash_enrichment(&a), hash_enrichment(&b));
    }
}

#[test]
fn test_same_content_same_key_across_calls() {
    let r = EnrichmentRecord::new(["CVE-2023-0001", "os:rhel"], r#"{"cvss":7.5}"#);
    assert_eq!(hash_enrichment(&r), hash_enrichment(&r.clone()));
}

#[test]
fn test_tags_contribute_to_key() {
    let a = EnrichmentRecord::new(["os:rhel"], "X");
    let b = EnrichmentRecord::new(["os:debian"], "X");
    assert_ne!(hash_enrichment(&a), hash_enrichment(&b));
}
