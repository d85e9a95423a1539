// Unix-epoch timestamp source for cache stamp files.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current unix time in whole seconds.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Seconds elapsed since `earlier`, as an absolute difference.
pub fn seconds_elapsed(earlier: u64) -> u64 {
    let now = unix_now();
    now.abs_diff(earlier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_is_past_2020() {
        // 2020-01-01T00:00:00Z
        assert!(unix_now() > 1_577_836_800);
    }

    #[test]
    fn elapsed_is_absolute() {
        let now = unix_now();
        assert_eq!(seconds_elapsed(now + 100), 100);
        assert!(seconds_elapsed(now.saturating_sub(5)) >= 5);
    }
}
