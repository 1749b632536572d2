//! Countdown reconciliation against the authoritative start timestamp
//!
//! Clients never count down on their own. The round carries the moment it
//! entered the active status and the countdown length; every device derives
//! the remaining time from those two values and its own clock on a short
//! cadence. This module holds that arithmetic plus the small presentation
//! helpers built on it (ceiling seconds for the digits, an urgency flag, the
//! ring fraction on the shared display, and elapsed-time formatting).

use std::time::Duration;

use web_time::SystemTime;

use crate::constants;

/// Computes the elapsed time since the round started
///
/// A clock reading earlier than the start timestamp (clock skew between the
/// writer and this device) counts as no time elapsed rather than an error.
///
/// # Arguments
///
/// * `started_at` - The authoritative start timestamp carried by the round
/// * `now` - The local clock reading
pub fn elapsed(started_at: SystemTime, now: SystemTime) -> Duration {
    now.duration_since(started_at).unwrap_or(Duration::ZERO)
}

/// Computes the elapsed time since the round started, in whole milliseconds
///
/// # Arguments
///
/// * `started_at` - The authoritative start timestamp carried by the round
/// * `now` - The local clock reading
pub fn elapsed_millis(started_at: SystemTime, now: SystemTime) -> u64 {
    elapsed(started_at, now).as_millis() as u64
}

/// Computes the time left on the countdown
///
/// `remaining = max(0, timer - (now - started_at))`: once the countdown has
/// run out this saturates at zero instead of going negative.
///
/// # Arguments
///
/// * `started_at` - The authoritative start timestamp carried by the round
/// * `timer` - The countdown length of the round
/// * `now` - The local clock reading
pub fn remaining(started_at: SystemTime, timer: Duration, now: SystemTime) -> Duration {
    timer.saturating_sub(elapsed(started_at, now))
}

/// Converts a remaining duration into the digits clients display
///
/// The displayed number is the ceiling of the fractional remainder, so the
/// countdown shows the full length at the start and only reaches zero when
/// the time is actually up.
pub fn display_seconds(remaining: Duration) -> u64 {
    remaining.as_secs_f64().ceil() as u64
}

/// Whether the countdown has entered its urgent final stretch
///
/// True in the last few seconds while time actually remains; an expired
/// countdown is not urgent, it is over.
pub fn is_urgent(remaining: Duration) -> bool {
    !remaining.is_zero() && display_seconds(remaining) <= constants::round::URGENT_SECONDS
}

/// Fraction of the countdown still remaining, for the display's progress ring
///
/// Returns a value in `[0, 1]`; a zero-length timer counts as fully elapsed.
///
/// # Arguments
///
/// * `remaining` - The time left on the countdown
/// * `timer` - The countdown length of the round
pub fn progress(remaining: Duration, timer: Duration) -> f64 {
    if timer.is_zero() {
        return 0.0;
    }
    (remaining.as_secs_f64() / timer.as_secs_f64()).clamp(0.0, 1.0)
}

/// Formats an elapsed time in milliseconds as seconds with two decimals
///
/// Matches the formatting clients show next to response times, e.g. `"3.52s"`.
pub fn format_elapsed(elapsed_ms: u64) -> String {
    format!("{:.2}s", elapsed_ms as f64 / 1000.0)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn at(seconds: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(seconds)
    }

    #[test]
    fn test_elapsed_grows_with_the_clock() {
        let started = at(100);
        assert_eq!(elapsed(started, at(100)), Duration::ZERO);
        assert_eq!(
            elapsed(started, at(100) + Duration::from_millis(3000)),
            Duration::from_millis(3000)
        );
        assert_eq!(
            elapsed_millis(started, at(100) + Duration::from_millis(3522)),
            3522
        );
    }

    #[test]
    fn test_elapsed_tolerates_clock_skew() {
        // local clock behind the writer's clock
        assert_eq!(elapsed(at(100), at(99)), Duration::ZERO);
        assert_eq!(remaining(at(100), Duration::from_secs(20), at(99)), Duration::from_secs(20));
    }

    #[test]
    fn test_remaining_counts_down_and_clamps() {
        let started = at(100);
        let timer = Duration::from_secs(20);
        assert_eq!(remaining(started, timer, at(100)), timer);
        assert_eq!(
            remaining(started, timer, at(100) + Duration::from_millis(5500)),
            Duration::from_millis(14500)
        );
        assert_eq!(remaining(started, timer, at(120)), Duration::ZERO);
        assert_eq!(remaining(started, timer, at(500)), Duration::ZERO);
    }

    #[test]
    fn test_display_seconds_is_a_ceiling() {
        assert_eq!(display_seconds(Duration::from_secs(20)), 20);
        assert_eq!(display_seconds(Duration::from_millis(14500)), 15);
        assert_eq!(display_seconds(Duration::from_millis(1)), 1);
        assert_eq!(display_seconds(Duration::ZERO), 0);
    }

    #[test]
    fn test_urgency_covers_the_final_stretch_only() {
        assert!(is_urgent(Duration::from_secs(5)));
        assert!(is_urgent(Duration::from_millis(4200)));
        assert!(is_urgent(Duration::from_millis(1)));
        assert!(!is_urgent(Duration::from_millis(5200)));
        assert!(!is_urgent(Duration::from_secs(19)));
        assert!(!is_urgent(Duration::ZERO));
    }

    #[test]
    fn test_progress_fraction() {
        let timer = Duration::from_secs(20);
        assert!((progress(timer, timer) - 1.0).abs() < f64::EPSILON);
        assert!((progress(Duration::from_secs(10), timer) - 0.5).abs() < f64::EPSILON);
        assert!((progress(Duration::ZERO, timer)).abs() < f64::EPSILON);
        assert!((progress(Duration::ZERO, Duration::ZERO)).abs() < f64::EPSILON);
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(3000), "3.00s");
        assert_eq!(format_elapsed(12340), "12.34s");
        assert_eq!(format_elapsed(999), "1.00s");
        assert_eq!(format_elapsed(0), "0.00s");
    }
}
