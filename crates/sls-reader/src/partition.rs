//! Time range partitioning
//!
//! Splits the global extraction range into contiguous fixed-length windows.
//! Every window is `duration` seconds long except the last, which is clipped
//! to the end of the range.

use sls_common::TimeWindow;

use crate::config::DEFAULT_DURATION_SECS;

const MAX_PREALLOCATED: usize = 4096;

/// Window length to use for a configured duration
///
/// Absent or non-positive durations fall back to one hour.
pub fn effective_duration(duration: Option<i64>) -> i64 {
    match duration {
        Some(d) if d > 0 => d,
        _ => DEFAULT_DURATION_SECS,
    }
}

/// Split `range` into ordered, gap-free windows of `duration` seconds
pub fn split_time_range(range: TimeWindow, duration: Option<i64>) -> Vec<TimeWindow> {
    let step = effective_duration(duration);
    let expected = (range.len_secs() / step.unsigned_abs()).saturating_add(1);
    let capacity = usize::try_from(expected).unwrap_or(usize::MAX).min(MAX_PREALLOCATED);
    let mut windows = Vec::with_capacity(capacity);

    let mut start = range.from;
    while start < range.to {
        let end = start.saturating_add(step).min(range.to);
        windows.push(TimeWindow {
            from: start,
            to: end,
        });
        start = start.saturating_add(step);
    }

    windows
}
