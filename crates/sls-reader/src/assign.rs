//! Round-robin distribution of windows across workers

use sls_common::{Result, SlsError, TimeWindow};

/// Distribute `windows` over `workers` buckets
///
/// The window at position `i` lands in bucket `i % workers`, so buckets keep
/// the input order. Buckets are empty when there are fewer windows than
/// workers.
pub fn assign_round_robin(windows: &[TimeWindow], workers: usize) -> Result<Vec<Vec<TimeWindow>>> {
    if workers == 0 {
        return Err(SlsError::config("worker count must be greater than 0"));
    }

    let mut buckets: Vec<Vec<TimeWindow>> = (0..workers)
        .map(|_| Vec::with_capacity(windows.len() / workers + 1))
        .collect();

    for (i, window) in windows.iter().enumerate() {
        buckets[i % workers].push(*window);
    }

    Ok(buckets)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::partition::split_time_range;
    use proptest::prelude::*;

    fn w(from: i64, to: i64) -> TimeWindow {
        TimeWindow::new(from, to).unwrap()
    }

    #[test]
    fn test_zero_workers_is_a_configuration_error() {
        assert!(matches!(
            assign_round_robin(&[w(0, 1)], 0),
            Err(SlsError::Config(_))
        ));
    }

    #[test]
    fn test_round_robin_order() {
        let windows = vec![w(0, 1), w(1, 2), w(2, 3), w(3, 4), w(4, 5)];
        let buckets = assign_round_robin(&windows, 2).unwrap();
        assert_eq!(buckets[0], vec![w(0, 1), w(2, 3), w(4, 5)]);
        assert_eq!(buckets[1], vec![w(1, 2), w(3, 4)]);
    }

    #[test]
    fn test_more_workers_than_windows() {
        let buckets = assign_round_robin(&[w(0, 1), w(1, 2)], 4).unwrap();
        assert_eq!(buckets.len(), 4);
        assert_eq!(buckets[0], vec![w(0, 1)]);
        assert_eq!(buckets[1], vec![w(1, 2)]);
        assert!(buckets[2].is_empty());
        assert!(buckets[3].is_empty());
    }

    proptest! {
        #[test]
        fn prop_buckets_reassemble_the_partition(
            span in 1i64..100_000,
            duration in 1i64..5_000,
            workers in 1usize..16,
        ) {
            let windows = split_time_range(TimeWindow::new(0, span).unwrap(), Some(duration));
            let buckets = assign_round_robin(&windows, workers).unwrap();
            prop_assert_eq!(buckets.len(), workers);

            let mut merged: Vec<TimeWindow> = buckets.into_iter().flatten().collect();
            merged.sort();
            prop_assert_eq!(merged, windows);
        }
    }
}
