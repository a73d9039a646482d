//! Shared utilities for CLI commands

use std::time::Duration;

/// Format a duration as whole milliseconds ("5000ms")
pub fn format_ms(duration: Duration) -> String {
    format!("{}ms", duration.as_millis())
}

/// Format a millisecond offset on the simulation clock ("t=  1000ms")
pub fn format_offset(ms: u64) -> String {
    format!("t={:>6}ms", ms)
}

/// Sort join offsets, keeping duplicates
pub fn sorted_offsets(offsets: &[u64]) -> Vec<u64> {
    let mut sorted = offsets.to_vec();
    sorted.sort_unstable();
    sorted
}
