//! The openability predicate: may a given drawer be opened right now.

use chrono::{DateTime, Utc};

use crate::calendar::{day_number, today_day};
use crate::snapshot::{CalendarItemView, RoomView};

/// ## Summary
/// Finds the unopened slot scheduled for `day`, if any.
///
/// Already-opened slots stay visually open through their persisted flag;
/// they are never candidates here.
#[must_use]
pub fn item_for_day<'a>(
    items: &'a [CalendarItemView],
    start_at: DateTime<Utc>,
    day: i64,
) -> Option<&'a CalendarItemView> {
    items
        .iter()
        .find(|item| !item.is_opened && day_number(start_at, item.open_date) == day)
}

/// ## Summary
/// Whether `day`'s drawer may be opened at `now`.
///
/// All of the following must hold:
/// 1. `day` is today's day for this room — no future or past days.
/// 2. An unopened slot exists whose computed day number equals `day`.
/// 3. `now` has reached that slot's full reveal timestamp.
///
/// A day with no unopened slot is inert.
#[must_use]
pub fn can_open_day(
    room: &RoomView,
    items: &[CalendarItemView],
    day: i64,
    now: DateTime<Utc>,
) -> bool {
    if day != today_day(room.start_at, now) {
        return false;
    }

    match item_for_day(items, room.start_at, day) {
        Some(item) => now >= item.open_date,
        None => false,
    }
}

/// ## Summary
/// The slot openable at `now`, if today's drawer passes the predicate.
#[must_use]
pub fn today_openable_item<'a>(
    room: &RoomView,
    items: &'a [CalendarItemView],
    now: DateTime<Utc>,
) -> Option<&'a CalendarItemView> {
    let today = today_day(room.start_at, now);
    if can_open_day(room, items, today, now) {
        item_for_day(items, room.start_at, today)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use sphere_core::types::ItemType;
    use uuid::Uuid;

    use super::*;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    fn room(start: DateTime<Utc>) -> RoomView {
        RoomView {
            id: Uuid::new_v4(),
            start_at: start,
            snow_dome_parts_last_date: None,
        }
    }

    fn slot(item_type: ItemType, open_date: DateTime<Utc>) -> CalendarItemView {
        CalendarItemView {
            id: Uuid::new_v4(),
            item_type,
            open_date,
            is_opened: false,
            position: None,
            rotation: None,
            bundle_id: None,
        }
    }

    #[test]
    fn test_reveal_time_gates_within_the_day() {
        // Room starts 2025-12-01; a photo frame reveals at 14:00 on day 5.
        let room = room(utc(2025, 12, 1, 0, 0, 0));
        let items = vec![slot(ItemType::PhotoFrame, utc(2025, 12, 5, 14, 0, 0))];

        assert!(!can_open_day(&room, &items, 5, utc(2025, 12, 5, 13, 0, 0)));
        assert!(can_open_day(&room, &items, 5, utc(2025, 12, 5, 15, 0, 0)));
        assert!(can_open_day(&room, &items, 5, utc(2025, 12, 5, 14, 0, 0)));
    }

    #[test]
    fn test_only_todays_day_is_openable() {
        let room = room(utc(2025, 12, 1, 0, 0, 0));
        let now = utc(2025, 12, 5, 15, 0, 0);
        let items: Vec<_> = (1..=25)
            .map(|d| slot(ItemType::Christmas, utc(2025, 12, d, 0, 0, 0)))
            .collect();

        for day in 1..=25 {
            assert_eq!(can_open_day(&room, &items, day, now), day == 5);
        }
    }

    #[test]
    fn test_opened_slot_makes_the_day_inert() {
        let room = room(utc(2025, 12, 1, 0, 0, 0));
        let mut items = vec![slot(ItemType::Christmas, utc(2025, 12, 5, 0, 0, 0))];
        items[0].is_opened = true;

        assert!(!can_open_day(&room, &items, 5, utc(2025, 12, 5, 12, 0, 0)));
    }

    #[test]
    fn test_day_without_slot_is_inert() {
        let room = room(utc(2025, 12, 1, 0, 0, 0));
        assert!(!can_open_day(&room, &[], 5, utc(2025, 12, 5, 12, 0, 0)));
    }

    #[test]
    fn test_today_openable_item() {
        let room = room(utc(2025, 12, 1, 0, 0, 0));
        let items = vec![
            slot(ItemType::Christmas, utc(2025, 12, 4, 0, 0, 0)),
            slot(ItemType::PhotoFrame, utc(2025, 12, 5, 8, 0, 0)),
        ];

        let found = today_openable_item(&room, &items, utc(2025, 12, 5, 9, 0, 0));
        assert_eq!(found.map(|i| i.id), Some(items[1].id));

        // Before the reveal time nothing is openable.
        assert!(today_openable_item(&room, &items, utc(2025, 12, 5, 7, 0, 0)).is_none());
    }
}
