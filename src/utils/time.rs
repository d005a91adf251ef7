use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[inline]
pub fn current_time_span() -> Duration {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
}

/// Seconds since the unix epoch with sub-second precision
///
#[inline]
pub fn current_time_secs() -> f64 {
    current_time_span().as_secs_f64()
}
