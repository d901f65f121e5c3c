//! In-batch duplicate detection.

use sha2::{Digest, Sha256};
use std::collections::HashSet;

use crate::domain::NewActivity;

/// Stable content hash over title, locality and start date.
pub fn fingerprint(record: &NewActivity) -> String {
    let start = record
        .start
        .map(|s| s.to_rfc3339())
        .unwrap_or_default();

    let mut hasher = Sha256::new();
    for part in [record.title.trim(), record.locality.trim(), start.as_str()] {
        hasher.update(part.as_bytes());
        hasher.update([0x1f]);
    }
    hex::encode(hasher.finalize())
}

/// Remembers fingerprints for the lifetime of one batch. A fresh
/// deduplicator is built per execution, so nothing leaks across batches.
#[derive(Debug, Default)]
pub struct BatchDeduplicator {
    seen: HashSet<String>,
}

impl BatchDeduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` the first time a fingerprint is seen, `false` afterwards.
    pub fn admit(&mut self, record: &NewActivity) -> bool {
        self.seen.insert(fingerprint(record))
    }
}
