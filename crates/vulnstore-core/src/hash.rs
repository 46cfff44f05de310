//! Content hashing for enrichment deduplication.
//!
//! The dedup key covers the record's tags and payload. Tags are sorted before
//! hashing, so the key does not depend on the order an updater emitted them.

use crate::model::EnrichmentRecord;
use sha2::{Digest, Sha256};

/// Identifier stored alongside every digest.
pub const HASH_KIND: &str = "sha256";

/// Byte written after each tag so `["ab","c"]` and `["a","bc"]` differ.
const TAG_SEPARATOR: u8 = 0x00;

/// (algorithm, digest) pair identifying a record's content.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    pub kind: &'static str,
    pub digest: Vec<u8>,
}

impl DedupKey {
    pub fn hex(&self) -> String {
        hex::encode(&self.digest)
    }
}

/// Compute the dedup key for a record. Pure; the record is not modified.
pub fn hash_enrichment(record: &EnrichmentRecord) -> DedupKey {
    let mut tags: Vec<&str> = record.tags.iter().map(String::as_str).collect();
    tags.sort_unstable();

    let mut hasher = Sha256::new();
    for tag in tags {
        hasher.update(tag.as_bytes());
        hasher.update([TAG_SEPARATOR]);
    }
    hasher.update(&record.enrichment);

    DedupKey {
        kind: HASH_KIND,
        digest: hasher.finalize().to_vec(),
    }
}
