//! Latency statistics.
//!
//! Latencies are collected unordered during a batch and sorted only here,
//! at analysis time.

use std::time::Duration;

/// Percentile by `index = floor(n * fraction)` over a sorted slice,
/// clamped to the last element. `None` for an empty slice.
pub fn percentile(sorted: &[Duration], fraction: f64) -> Option<Duration> {
    if sorted.is_empty() {
        return None;
    }
    let index = (sorted.len() as f64 * fraction).floor() as usize;
    Some(sorted[index.min(sorted.len() - 1)])
}

/// Sorted copy of a latency collection.
pub fn sorted(latencies: &[Duration]) -> Vec<Duration> {
    let mut copy = latencies.to_vec();
    copy.sort();
    copy
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(values: &[u64]) -> Vec<Duration> {
        values.iter().map(|&v| Duration::from_millis(v)).collect()
    }

    #[test]
    fn percentile_index_semantics() {
        // Ten values 1..=10: p50 is index 5 (value 6), p90 index 9 (value 10).
        let latencies = ms(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
        assert_eq!(percentile(&latencies, 0.5), Some(Duration::from_millis(6)));
        assert_eq!(percentile(&latencies, 0.9), Some(Duration::from_millis(10)));
    }

    #[test]
    fn percentile_clamps_at_the_top() {
        let latencies = ms(&[1, 2, 3]);
        assert_eq!(percentile(&latencies, 1.0), Some(Duration::from_millis(3)));
    }

    #[test]
    fn percentile_of_empty_is_none() {
        assert_eq!(percentile(&[], 0.5), None);
    }

    #[test]
    fn percentile_single_element() {
        let latencies = ms(&[7]);
        assert_eq!(percentile(&latencies, 0.5), Some(Duration::from_millis(7)));
        assert_eq!(percentile(&latencies, 0.99), Some(Duration::from_millis(7)));
    }

    #[test]
    fn sorted_does_not_mutate_input() {
        let latencies = ms(&[5, 1, 3]);
        let sorted_copy = sorted(&latencies);
        assert_eq!(sorted_copy, ms(&[1, 3, 5]));
        assert_eq!(latencies, ms(&[5, 1, 3]));
    }
}
