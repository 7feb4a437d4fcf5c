use crate::types::{ClockTime, MINUTES_PER_DAY};

/// Advance a time of day by `minutes`, wrapping at 24:00.
///
/// Durations are unsigned, so a negative offset cannot reach this function;
/// edit entry points clamp negative input to zero before calling it.
pub fn add_minutes(time: ClockTime, minutes: u32) -> ClockTime {
    let total = time.minutes_of_day() as u64 + minutes as u64;
    ClockTime::from_minutes((total % MINUTES_PER_DAY as u64) as u32)
}

/// Minutes from `start` to `end`. An `end` before `start` is treated as
/// equal to `start`, giving zero.
pub fn diff_minutes(start: ClockTime, end: ClockTime) -> u32 {
    end.minutes_of_day().saturating_sub(start.minutes_of_day())
}

/// Clamp a signed minute count coming from user input into a duration.
pub fn clamp_duration(minutes: i64) -> u32 {
    minutes.clamp(0, u32::MAX as i64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_minutes_within_day() {
        assert_eq!(add_minutes(ClockTime::hm(6, 0), 10), ClockTime::hm(6, 10));
        assert_eq!(add_minutes(ClockTime::hm(6, 50), 25), ClockTime::hm(7, 15));
        assert_eq!(add_minutes(ClockTime::hm(6, 0), 0), ClockTime::hm(6, 0));
    }

    #[test]
    fn add_minutes_wraps_past_midnight() {
        assert_eq!(add_minutes(ClockTime::hm(23, 50), 20), ClockTime::hm(0, 10));
        assert_eq!(add_minutes(ClockTime::hm(1, 0), 3 * 1440), ClockTime::hm(1, 0));
        assert_eq!(add_minutes(ClockTime::hm(0, 0), u32::MAX), ClockTime::from_minutes(u32::MAX % 1440));
    }

    #[test]
    fn diff_minutes_forward() {
        assert_eq!(diff_minutes(ClockTime::hm(6, 0), ClockTime::hm(6, 45)), 45);
        assert_eq!(diff_minutes(ClockTime::hm(6, 0), ClockTime::hm(6, 0)), 0);
    }

    #[test]
    fn diff_minutes_end_before_start_is_zero() {
        assert_eq!(diff_minutes(ClockTime::hm(7, 0), ClockTime::hm(6, 30)), 0);
    }

    #[test]
    fn clamp_duration_rejects_negative() {
        assert_eq!(clamp_duration(-5), 0);
        assert_eq!(clamp_duration(0), 0);
        assert_eq!(clamp_duration(45), 45);
    }
}
