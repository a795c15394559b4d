//! Effective partition keys and the even split of the hash space.

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::routing::{MAX_EXCLUSIVE_EPK, MIN_INCLUSIVE_EPK};

/// Keys are hashed into `[0, HASH_SPACE)` so every key sorts below `"FF"`.
const HASH_SPACE: u64 = 0xFF00_0000;

/// Effective partition key of a partition-key value: 8 upper-case hex digits.
pub fn effective_partition_key(value: &Value) -> String {
    let encoded = serde_json::to_vec(&[value]).unwrap_or_default();
    let digest = Sha256::digest(&encoded);
    let prefix = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    format!("{:08X}", u64::from(prefix) % HASH_SPACE)
}

/// `(min_inclusive, max_exclusive)` bounds of `count` contiguous ranges covering the key space.
pub fn split_ranges(count: u32) -> Vec<(String, String)> {
    let count = u64::from(count.max(1));
    let boundary = |i: u64| format!("{:08X}", HASH_SPACE * i / count);
    (0..count)
        .map(|i| {
            let min = if i == 0 {
                MIN_INCLUSIVE_EPK.to_string()
            } else {
                boundary(i)
            };
            let max = if i == count - 1 {
                MAX_EXCLUSIVE_EPK.to_string()
            } else {
                boundary(i + 1)
            };
            (min, max)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::EffectivePartitionKeyRange;
    use serde_json::json;

    #[test]
    fn single_range_covers_everything() {
        assert_eq!(split_ranges(1), vec![("".to_string(), "FF".to_string())]);
        assert_eq!(split_ranges(0).len(), 1);
    }

    #[test]
    fn ranges_are_contiguous() {
        let ranges = split_ranges(4);
        assert_eq!(ranges.len(), 4);
        for pair in ranges.windows(2) {
            assert_eq!(pair[0].1, pair[1].0);
            assert!(pair[0].1 < pair[1].1);
        }
        assert_eq!(ranges[0].0, MIN_INCLUSIVE_EPK);
        assert_eq!(ranges[3].1, MAX_EXCLUSIVE_EPK);
    }

    #[test]
    fn every_key_lands_in_exactly_one_range() {
        let ranges = split_ranges(3);
        for n in 0..200 {
            let epk = effective_partition_key(&json!(n));
            assert_eq!(epk.len(), 8);
            let hits = ranges
                .iter()
                .filter(|(min, max)| EffectivePartitionKeyRange::new(min.clone(), max.clone()).contains(&epk))
                .count();
            assert_eq!(hits, 1, "key {epk}");
        }
    }

    #[test]
    fn hashing_is_stable() {
        assert_eq!(
            effective_partition_key(&json!("a")),
            effective_partition_key(&json!("a"))
        );
        assert_ne!(
            effective_partition_key(&json!("a")),
            effective_partition_key(&json!("b"))
        );
    }
}
