//! Unit tests for the acquisition flow machine.

use chrono::{DateTime, TimeZone, Utc};
use sphere_core::types::ItemType;
use uuid::Uuid;

use crate::flow::{FlowEvent, FlowState, RoomContext, WriteIntent};
use crate::snapshot::{CalendarItemView, RoomView, Vec3};

fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
}

fn december_room() -> RoomView {
    RoomView {
        id: Uuid::new_v4(),
        start_at: utc(2025, 12, 1, 0, 0, 0),
        snow_dome_parts_last_date: Some(utc(2025, 12, 22, 9, 0, 0)),
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

fn snowdome_part(bundle_id: Uuid, day: u32) -> CalendarItemView {
    CalendarItemView {
        bundle_id: Some(bundle_id),
        ..slot(ItemType::Snowdome, utc(2025, 12, day, 9, 0, 0))
    }
}

#[test_log::test]
fn test_happy_path_reveal_place_complete() {
    let room = december_room();
    let items = vec![slot(ItemType::Christmas, utc(2025, 12, 5, 8, 0, 0))];
    let ctx = RoomContext {
        room: Some(&room),
        items: &items,
    };
    let now = utc(2025, 12, 5, 10, 0, 0);

    let step = FlowState::Idle.step(FlowEvent::DayClicked { day: 5 }, &ctx, now);
    assert_eq!(
        step.state,
        FlowState::GetModal {
            day: 5,
            item_id: items[0].id,
            pending: false
        }
    );
    assert!(step.intent.is_none());

    let step = step.state.step(FlowEvent::Next, &ctx, now);
    assert_eq!(step.state.phase_name(), "placement");
    assert!(step.intent.is_none());

    let position = Vec3::new(1.0, 0.0, 2.0);
    let rotation = Vec3::new(0.0, 1.5, 0.0);
    let step = step
        .state
        .step(FlowEvent::ConfirmPlacement { position, rotation }, &ctx, now);
    assert!(step.state.is_pending());
    assert_eq!(
        step.intent,
        Some(WriteIntent::Place {
            item_ids: vec![items[0].id],
            position,
            rotation,
        })
    );

    let step = step.state.step(FlowEvent::WriteSucceeded, &ctx, now);
    assert_eq!(step.state, FlowState::Completed);

    let step = step.state.step(FlowEvent::CompletedShown, &ctx, now);
    assert_eq!(step.state, FlowState::Idle);
}

#[test_log::test]
fn test_clicking_a_non_openable_day_is_ignored() {
    let room = december_room();
    let items = vec![slot(ItemType::Christmas, utc(2025, 12, 6, 0, 0, 0))];
    let ctx = RoomContext {
        room: Some(&room),
        items: &items,
    };
    let now = utc(2025, 12, 5, 10, 0, 0);

    // Tomorrow's drawer.
    let step = FlowState::Idle.step(FlowEvent::DayClicked { day: 6 }, &ctx, now);
    assert_eq!(step.state, FlowState::Idle);
    assert!(step.intent.is_none());

    // Today's drawer, but its slot is scheduled for tomorrow.
    let step = FlowState::Idle.step(FlowEvent::DayClicked { day: 5 }, &ctx, now);
    assert_eq!(step.state, FlowState::Idle);
}

#[test_log::test]
fn test_missing_room_fails_every_guard() {
    let items = vec![slot(ItemType::Christmas, utc(2025, 12, 5, 0, 0, 0))];
    let ctx = RoomContext {
        room: None,
        items: &items,
    };

    let step = FlowState::Idle.step(
        FlowEvent::DayClicked { day: 5 },
        &ctx,
        utc(2025, 12, 5, 10, 0, 0),
    );
    assert_eq!(step.state, FlowState::Idle);
}

#[test_log::test]
fn test_reveal_before_open_time_is_ignored() {
    let room = december_room();
    let items = vec![slot(ItemType::PhotoFrame, utc(2025, 12, 5, 14, 0, 0))];
    let ctx = RoomContext {
        room: Some(&room),
        items: &items,
    };

    let step = FlowState::Idle.step(
        FlowEvent::DayClicked { day: 5 },
        &ctx,
        utc(2025, 12, 5, 13, 0, 0),
    );
    assert_eq!(step.state, FlowState::Idle);

    let step = FlowState::Idle.step(
        FlowEvent::DayClicked { day: 5 },
        &ctx,
        utc(2025, 12, 5, 15, 0, 0),
    );
    assert_eq!(step.state.phase_name(), "get_modal");
}

#[test_log::test]
fn test_skip_sends_item_to_inventory() {
    let room = december_room();
    let items = vec![slot(ItemType::Christmas, utc(2025, 12, 5, 8, 0, 0))];
    let ctx = RoomContext {
        room: Some(&room),
        items: &items,
    };
    let now = utc(2025, 12, 5, 10, 0, 0);

    let state = FlowState::Placement {
        item_id: items[0].id,
        day: Some(5),
        pending: false,
    };
    let step = state.step(FlowEvent::SkipPlacement, &ctx, now);
    assert!(step.state.is_pending());
    assert_eq!(
        step.intent,
        Some(WriteIntent::SkipPlacement {
            item_id: items[0].id
        })
    );
}

#[test_log::test]
fn test_duplicate_confirm_while_pending_is_ignored() {
    let room = december_room();
    let items = vec![slot(ItemType::Christmas, utc(2025, 12, 5, 8, 0, 0))];
    let ctx = RoomContext {
        room: Some(&room),
        items: &items,
    };
    let now = utc(2025, 12, 5, 10, 0, 0);

    let pending = FlowState::Placement {
        item_id: items[0].id,
        day: Some(5),
        pending: true,
    };
    let step = pending.clone().step(
        FlowEvent::ConfirmPlacement {
            position: Vec3::new(0.0, 0.0, 0.0),
            rotation: Vec3::new(0.0, 0.0, 0.0),
        },
        &ctx,
        now,
    );
    assert_eq!(step.state, pending);
    assert!(step.intent.is_none());
}

#[test_log::test]
fn test_write_failure_returns_to_retryable_state() {
    let room = december_room();
    let items = vec![slot(ItemType::Christmas, utc(2025, 12, 5, 8, 0, 0))];
    let ctx = RoomContext {
        room: Some(&room),
        items: &items,
    };
    let now = utc(2025, 12, 5, 10, 0, 0);

    let pending = FlowState::Placement {
        item_id: items[0].id,
        day: Some(5),
        pending: true,
    };
    let step = pending.step(FlowEvent::WriteFailed, &ctx, now);
    assert_eq!(
        step.state,
        FlowState::Placement {
            item_id: items[0].id,
            day: Some(5),
            pending: false,
        }
    );
    assert!(step.intent.is_none());
}

#[test_log::test]
fn test_dismiss_abandons_from_any_state() {
    let room = december_room();
    let items = vec![slot(ItemType::Christmas, utc(2025, 12, 5, 8, 0, 0))];
    let ctx = RoomContext {
        room: Some(&room),
        items: &items,
    };
    let now = utc(2025, 12, 5, 10, 0, 0);

    for state in [
        FlowState::GetModal {
            day: 5,
            item_id: items[0].id,
            pending: false,
        },
        FlowState::Placement {
            item_id: items[0].id,
            day: None,
            pending: true,
        },
        FlowState::SnowdomePlacement {
            item_id: items[0].id,
            day: None,
            pending: false,
        },
    ] {
        let step = state.step(FlowEvent::Dismissed, &ctx, now);
        assert_eq!(step.state, FlowState::Idle);
        assert!(step.intent.is_none());
    }
}

#[test_log::test]
fn test_non_final_snowdome_part_goes_straight_to_inventory() {
    // Parts on days {3, 9, 17, 22}; day 22 is the final date.
    let bundle = Uuid::new_v4();
    let room = december_room();
    let items = vec![
        snowdome_part(bundle, 3),
        snowdome_part(bundle, 9),
        snowdome_part(bundle, 17),
        snowdome_part(bundle, 22),
    ];
    let ctx = RoomContext {
        room: Some(&room),
        items: &items,
    };
    let now = utc(2025, 12, 3, 10, 0, 0);

    let step = FlowState::Idle.step(FlowEvent::DayClicked { day: 3 }, &ctx, now);
    assert_eq!(step.state.phase_name(), "get_modal");

    let step = step.state.step(FlowEvent::Next, &ctx, now);
    assert!(step.state.is_pending());
    assert_eq!(
        step.intent,
        Some(WriteIntent::SkipPlacement {
            item_id: items[0].id
        })
    );

    let step = step.state.step(FlowEvent::WriteSucceeded, &ctx, now);
    assert_eq!(step.state, FlowState::Completed);
}

#[test_log::test]
fn test_final_snowdome_part_bundles_opened_unplaced_parts() {
    let bundle = Uuid::new_v4();
    let room = december_room();
    let mut items = vec![
        snowdome_part(bundle, 3),
        snowdome_part(bundle, 9),
        snowdome_part(bundle, 17),
        snowdome_part(bundle, 22),
    ];
    // Days 3 and 9 were opened and deferred; day 17 was never opened.
    items[0].is_opened = true;
    items[1].is_opened = true;
    let ctx = RoomContext {
        room: Some(&room),
        items: &items,
    };
    let now = utc(2025, 12, 22, 10, 0, 0);

    let step = FlowState::Idle.step(FlowEvent::DayClicked { day: 22 }, &ctx, now);
    let step = step.state.step(FlowEvent::Next, &ctx, now);
    assert_eq!(step.state.phase_name(), "snowdome_placement");
    assert!(step.intent.is_none());

    let position = Vec3::new(1.0, 0.0, 2.0);
    let rotation = Vec3::new(0.0, 0.0, 0.0);
    let step = step
        .state
        .step(FlowEvent::ConfirmPlacement { position, rotation }, &ctx, now);

    let Some(WriteIntent::Place { item_ids, .. }) = step.intent else {
        panic!("expected a bundle placement intent");
    };
    // Opened-and-unplaced parts (days 3, 9) plus the trigger (day 22);
    // the unopened day-17 part stays in its drawer.
    assert_eq!(item_ids.len(), 3);
    assert!(item_ids.contains(&items[0].id));
    assert!(item_ids.contains(&items[1].id));
    assert!(item_ids.contains(&items[3].id));
    assert!(!item_ids.contains(&items[2].id));
}

#[test_log::test]
fn test_inventory_selection_routes_by_item_type() {
    let bundle = Uuid::new_v4();
    let room = december_room();
    let mut items = vec![
        snowdome_part(bundle, 3),
        slot(ItemType::PhotoFrame, utc(2025, 12, 5, 8, 0, 0)),
    ];
    items[0].is_opened = true;
    items[1].is_opened = true;
    let ctx = RoomContext {
        room: Some(&room),
        items: &items,
    };
    let now = utc(2025, 12, 23, 10, 0, 0);

    let step = FlowState::Idle.step(
        FlowEvent::StartFromInventory {
            item_id: items[0].id,
        },
        &ctx,
        now,
    );
    assert_eq!(
        step.state,
        FlowState::SnowdomePlacement {
            item_id: items[0].id,
            day: None,
            pending: false,
        }
    );

    let step = FlowState::Idle.step(
        FlowEvent::StartFromInventory {
            item_id: items[1].id,
        },
        &ctx,
        now,
    );
    assert_eq!(
        step.state,
        FlowState::Placement {
            item_id: items[1].id,
            day: None,
            pending: false,
        }
    );
}

#[test_log::test]
fn test_unopened_item_cannot_start_from_inventory() {
    let room = december_room();
    let items = vec![slot(ItemType::PhotoFrame, utc(2025, 12, 5, 8, 0, 0))];
    let ctx = RoomContext {
        room: Some(&room),
        items: &items,
    };

    let step = FlowState::Idle.step(
        FlowEvent::StartFromInventory {
            item_id: items[0].id,
        },
        &ctx,
        utc(2025, 12, 6, 10, 0, 0),
    );
    assert_eq!(step.state, FlowState::Idle);
}

#[test_log::test]
fn test_repositioning_a_placed_bundle_targets_cohabiting_parts() {
    let bundle = Uuid::new_v4();
    let room = december_room();
    let spot = Vec3::new(1.0, 0.0, 2.0);
    let mut items = vec![
        snowdome_part(bundle, 3),
        snowdome_part(bundle, 9),
        snowdome_part(bundle, 17),
        snowdome_part(bundle, 22),
    ];
    for item in &mut items {
        item.is_opened = true;
        item.position = Some(spot);
    }
    // One part was separately returned to the inventory earlier.
    items[3].position = None;

    let ctx = RoomContext {
        room: Some(&room),
        items: &items,
    };
    let now = utc(2025, 12, 23, 10, 0, 0);

    let step = FlowState::Idle.step(
        FlowEvent::StartFromInventory {
            item_id: items[0].id,
        },
        &ctx,
        now,
    );
    assert_eq!(step.state.phase_name(), "snowdome_placement");

    let target = Vec3::new(3.0, 0.0, 1.0);
    let step = step.state.step(
        FlowEvent::ConfirmPlacement {
            position: target,
            rotation: Vec3::new(0.0, 0.0, 0.0),
        },
        &ctx,
        now,
    );

    let Some(WriteIntent::Place { item_ids, position, .. }) = step.intent else {
        panic!("expected a bundle placement intent");
    };
    assert_eq!(position, target);
    // The three parts standing at the old spot move; the inventoried one
    // does not.
    assert_eq!(item_ids.len(), 3);
    assert!(!item_ids.contains(&items[3].id));
}
