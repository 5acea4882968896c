//! Predicate sharding across ingest instances.

use xxhash_rust::xxh64::xxh64;

/// Stable 64-bit fingerprint. Must give the same value in every instance of a partitioned load.
pub fn fingerprint64(bytes: &[u8]) -> u64 {
    xxh64(bytes, 0)
}

/// Index of the instance (out of `num_instances`) that owns `predicate`.
pub fn owner_of(predicate: &str, num_instances: u64) -> u64 {
    fingerprint64(predicate.as_bytes()) % num_instances.max(1)
}
