//! Chunking policy for batched store calls.
//!
//! Store writes and batched queries are partitioned into contiguous,
//! order-preserving chunks of at most `batch_size` items; embedding calls
//! are never chunked here since the provider batches natively.

use std::ops::Range;

/// Partition `total` items into ceil(total / batch_size) contiguous ranges.
///
/// The final range may be shorter than `batch_size`. A `batch_size` of zero
/// degenerates to a single range covering everything; an empty input yields
/// no ranges.
pub fn batch_ranges(total: usize, batch_size: usize) -> Vec<Range<usize>> {
    if total == 0 {
        return Vec::new();
    }
    if batch_size == 0 {
        return vec![0..total];
    }

    let mut ranges = Vec::with_capacity(total.div_ceil(batch_size));
    let mut start = 0;
    while start < total {
        let end = (start + batch_size).min(total);
        ranges.push(start..end);
        start = end;
    }
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_multiple() {
        let ranges = batch_ranges(6, 2);
        assert_eq!(ranges, vec![0..2, 2..4, 4..6]);
    }

    #[test]
    fn test_final_chunk_smaller() {
        let ranges = batch_ranges(5, 2);
        assert_eq!(ranges, vec![0..2, 2..4, 4..5]);
    }

    #[test]
    fn test_chunk_count_is_ceil() {
        for total in 1..50usize {
            for batch_size in 1..10usize {
                let ranges = batch_ranges(total, batch_size);
                assert_eq!(ranges.len(), total.div_ceil(batch_size));

                // Contiguous, ordered, covering every index exactly once
                let mut expected_start = 0;
                for range in &ranges {
                    assert_eq!(range.start, expected_start);
                    assert!(range.end - range.start <= batch_size);
                    expected_start = range.end;
                }
                assert_eq!(expected_start, total);
            }
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(batch_ranges(0, 4).is_empty());
    }

    #[test]
    fn test_zero_batch_size() {
        assert_eq!(batch_ranges(7, 0), vec![0..7]);
    }

    #[test]
    fn test_batch_larger_than_input() {
        assert_eq!(batch_ranges(3, 10), vec![0..3]);
    }
}
