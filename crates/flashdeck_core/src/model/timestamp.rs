//! Generic timestamp representation shared by entities and repositories.

use std::time::{SystemTime, UNIX_EPOCH};

/// Unix epoch milliseconds.
pub type EpochMillis = i64;

/// Returns the current wall-clock time in epoch milliseconds.
///
/// Clocks set before the epoch collapse to `0` instead of panicking.
pub fn now_epoch_ms() -> EpochMillis {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::now_epoch_ms;

    #[test]
    fn now_is_after_2020() {
        assert!(now_epoch_ms() > 1_577_836_800_000);
    }
}
