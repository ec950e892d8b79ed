//! Row and byte budgets for snapshot data.
//!
//! Guarding runs in two passes:
//! 1. Every top-level sequence longer than `max_rows` is sampled down to
//!    exactly `max_rows` elements (head kept in order, rest drawn at random).
//! 2. If the compact JSON of the result still exceeds `max_bytes`, the data
//!    is dropped and only a [`DataProfile`] is kept.

use crate::profile::{profile, DataProfile};
use crate::types::DotData;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_MAX_BYTES: usize = 200_000;
pub const DEFAULT_MAX_ROWS: usize = 200;

/// Budgets applied by [`size_guard`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeGuardOptions {
    pub max_bytes: usize,
    pub max_rows: usize,
}

impl Default for SizeGuardOptions {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
            max_rows: DEFAULT_MAX_ROWS,
        }
    }
}

/// Outcome of guarding a snapshot.
///
/// `data_profile` is present iff sampling happened; `data` is empty iff the
/// byte budget was exceeded.
#[derive(Debug, Clone, PartialEq)]
pub struct SizeGuardResult {
    pub data: DotData,
    pub was_sampled: bool,
    pub data_profile: Option<DataProfile>,
}

/// Guard `data` using the thread-local RNG for row sampling.
pub fn size_guard(data: &DotData, options: SizeGuardOptions) -> SizeGuardResult {
    size_guard_with_rng(data, options, &mut rand::rng())
}

/// Guard `data` with a caller-supplied RNG.
pub fn size_guard_with_rng<R: Rng + ?Sized>(
    data: &DotData,
    options: SizeGuardOptions,
    rng: &mut R,
) -> SizeGuardResult {
    let mut was_sampled = false;
    let mut guarded = data.clone();

    for (key, value) in guarded.iter_mut() {
        if let Value::Array(items) = value {
            if items.len() > options.max_rows {
                tracing::debug!(
                    field = %key,
                    rows = items.len(),
                    max_rows = options.max_rows,
                    "Sampling oversized field"
                );
                *items = sample_rows(items, options.max_rows, rng);
                was_sampled = true;
            }
        }
    }

    let size = serde_json::to_string(&guarded)
        .map(|text| text.len())
        .unwrap_or(usize::MAX);
    if size > options.max_bytes {
        tracing::info!(
            bytes = size,
            max_bytes = options.max_bytes,
            "Snapshot over byte budget, sending profile only"
        );
        let data_profile = profile(&guarded, true);
        return SizeGuardResult {
            data: DotData::new(),
            was_sampled: true,
            data_profile: Some(data_profile),
        };
    }

    let data_profile = was_sampled.then(|| profile(&guarded, true));
    SizeGuardResult {
        data: guarded,
        was_sampled,
        data_profile,
    }
}

/// Keep the first `max_rows / 2` items, then fill up to `max_rows` with a
/// random draw (without replacement) from the remainder.
pub fn sample_rows<R: Rng + ?Sized>(items: &[Value], max_rows: usize, rng: &mut R) -> Vec<Value> {
    if items.len() <= max_rows {
        return items.to_vec();
    }
    let head_count = max_rows / 2;
    let (head, rest) = items.split_at(head_count);
    let draw = max_rows - head_count;

    let mut sampled = head.to_vec();
    sampled.extend(
        rand::seq::index::sample(rng, rest.len(), draw)
            .into_iter()
            .map(|i| rest[i].clone()),
    );
    sampled
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;
    use std::collections::HashSet;

    fn rows(n: usize) -> Value {
        Value::Array((0..n).map(|i| json!(i)).collect())
    }

    fn data(value: Value) -> DotData {
        value.as_object().cloned().expect("test data must be an object")
    }

    #[test]
    fn test_small_data_passes_through() {
        let d = data(json!({"rows": rows(5), "name": "x"}));
        let result = size_guard(&d, SizeGuardOptions::default());
        assert_eq!(result.data, d);
        assert!(!result.was_sampled);
        assert!(result.data_profile.is_none());
    }

    #[test]
    fn test_long_sequences_sampled_to_max_rows() {
        let mut rng = StdRng::seed_from_u64(7);
        let d = data(json!({"rows": rows(100)}));
        let options = SizeGuardOptions {
            max_bytes: DEFAULT_MAX_BYTES,
            max_rows: 11,
        };
        let result = size_guard_with_rng(&d, options, &mut rng);

        let sampled = result.data["rows"].as_array().unwrap();
        assert_eq!(sampled.len(), 11);
        assert_eq!(&sampled[..5], &rows(5).as_array().unwrap()[..]);

        let tail: HashSet<u64> = sampled[5..].iter().filter_map(Value::as_u64).collect();
        assert_eq!(tail.len(), 6, "draw must be without replacement");
        assert!(tail.iter().all(|&i| (5..100).contains(&i)));

        assert!(result.was_sampled);
        let profile = result.data_profile.unwrap();
        assert_eq!(profile.note.as_deref(), Some(crate::profile::SAMPLED_NOTE));
        assert_eq!(profile.fields[0].row_count, Some(11));
    }

    #[test]
    fn test_byte_budget_falls_back_to_profile() {
        let d = data(json!({"blob": "x".repeat(500), "n": [1, 2, 3]}));
        let options = SizeGuardOptions {
            max_bytes: 100,
            max_rows: 200,
        };
        let result = size_guard(&d, options);
        assert!(result.data.is_empty());
        assert!(result.was_sampled);
        let profile = result.data_profile.unwrap();
        assert_eq!(profile.fields.len(), 2);
        assert!(profile.note.is_some());
    }

    #[test]
    fn test_profile_describes_row_sampled_data() {
        let d = data(json!({"rows": rows(50), "blob": "y".repeat(400)}));
        let options = SizeGuardOptions {
            max_bytes: 200,
            max_rows: 4,
        };
        let result = size_guard(&d, options);
        assert!(result.data.is_empty());
        assert_eq!(result.data_profile.unwrap().fields[0].row_count, Some(4));
    }

    #[test]
    fn test_nested_sequences_are_not_sampled() {
        let d = data(json!({"outer": {"inner": rows(10)}}));
        let options = SizeGuardOptions {
            max_bytes: DEFAULT_MAX_BYTES,
            max_rows: 2,
        };
        let result = size_guard(&d, options);
        assert_eq!(result.data, d);
        assert!(!result.was_sampled);
    }

    #[test]
    fn test_sample_rows_zero_budget() {
        let mut rng = StdRng::seed_from_u64(1);
        let items: Vec<Value> = (0..3).map(|i| json!(i)).collect();
        assert!(sample_rows(&items, 0, &mut rng).is_empty());
    }
}
