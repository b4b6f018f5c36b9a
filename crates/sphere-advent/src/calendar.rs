//! Calendar day arithmetic.
//!
//! All computations are against UTC with the room's `start_at` instant
//! as the room-wide origin, so every participant resolves the same day
//! number for the same instant.

use chrono::{DateTime, Datelike, Utc};

use crate::snapshot::RoomView;

const SECONDS_PER_DAY: i64 = 86_400;

/// ## Summary
/// Maps an instant to a 1-based day number relative to a room's start.
///
/// `floor((instant − start_at) / 1 day) + 1`. Instants before the start
/// yield day 0 or below; callers gate on the valid 1..=25 range.
#[must_use]
pub fn day_number(start_at: DateTime<Utc>, instant: DateTime<Utc>) -> i64 {
    let elapsed = (instant - start_at).num_seconds();
    elapsed.div_euclid(SECONDS_PER_DAY) + 1
}

/// ## Summary
/// The day number an observer at `now` sees for this room.
#[must_use]
pub fn today_day(start_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    day_number(start_at, now)
}

/// ## Summary
/// Whether two instants fall on the same UTC calendar date.
#[must_use]
pub fn same_calendar_date(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    a.year() == b.year() && a.month() == b.month() && a.day() == b.day()
}

/// ## Summary
/// Whether `open_date` falls on the room's final snowdome part date.
///
/// Rooms without a snowdome track have no final date; always false.
#[must_use]
pub fn is_final_part_date(room: &RoomView, open_date: DateTime<Utc>) -> bool {
    room.snow_dome_parts_last_date
        .is_some_and(|last| same_calendar_date(last, open_date))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use uuid::Uuid;

    use super::*;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn test_day_number_basic_mapping() {
        let start = utc(2025, 12, 1, 0, 0, 0);

        assert_eq!(day_number(start, utc(2025, 12, 1, 0, 0, 0)), 1);
        assert_eq!(day_number(start, utc(2025, 12, 1, 23, 59, 59)), 1);
        assert_eq!(day_number(start, utc(2025, 12, 5, 14, 0, 0)), 5);
        assert_eq!(day_number(start, utc(2025, 12, 25, 6, 0, 0)), 25);
    }

    #[test]
    fn test_day_number_ignores_time_of_day_within_a_day() {
        let start = utc(2025, 12, 1, 9, 30, 0);

        // Day boundaries are whole days from start_at, not midnight.
        assert_eq!(day_number(start, utc(2025, 12, 2, 9, 29, 59)), 1);
        assert_eq!(day_number(start, utc(2025, 12, 2, 9, 30, 0)), 2);
    }

    #[test]
    fn test_day_number_is_deterministic() {
        let start = utc(2025, 12, 1, 0, 0, 0);
        let instant = utc(2025, 12, 17, 3, 15, 42);
        let first = day_number(start, instant);
        for _ in 0..10 {
            assert_eq!(day_number(start, instant), first);
        }
    }

    #[test]
    fn test_day_number_before_start_floors_downward() {
        let start = utc(2025, 12, 1, 0, 0, 0);

        assert_eq!(day_number(start, utc(2025, 11, 30, 23, 0, 0)), 0);
        assert_eq!(day_number(start, utc(2025, 11, 29, 1, 0, 0)), -1);
    }

    #[test]
    fn test_same_calendar_date() {
        assert!(same_calendar_date(
            utc(2025, 12, 22, 0, 0, 1),
            utc(2025, 12, 22, 23, 59, 59)
        ));
        assert!(!same_calendar_date(
            utc(2025, 12, 22, 23, 59, 59),
            utc(2025, 12, 23, 0, 0, 0)
        ));
    }

    #[test]
    fn test_is_final_part_date() {
        let room = RoomView {
            id: Uuid::new_v4(),
            start_at: utc(2025, 12, 1, 0, 0, 0),
            snow_dome_parts_last_date: Some(utc(2025, 12, 22, 10, 0, 0)),
        };

        assert!(is_final_part_date(&room, utc(2025, 12, 22, 18, 30, 0)));
        assert!(!is_final_part_date(&room, utc(2025, 12, 3, 10, 0, 0)));

        let no_track = RoomView {
            snow_dome_parts_last_date: None,
            ..room
        };
        assert!(!is_final_part_date(&no_track, utc(2025, 12, 22, 10, 0, 0)));
    }
}
