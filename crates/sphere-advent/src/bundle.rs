//! Snowdome bundle resolution.
//!
//! Parts of a multi-part collectible carry a shared `bundle_id` assigned
//! at creation; membership is resolved by that key. Position equality
//! within [`sphere_core::constants::POSITION_EPSILON`] decides which of
//! a bundle's parts are standing together when a placed group is moved
//! or returned.

use sphere_core::constants::POSITION_EPSILON;
use uuid::Uuid;

use crate::snapshot::{CalendarItemView, Position};

/// ## Summary
/// Component-wise position equality within the bundling epsilon.
#[must_use]
pub fn positions_match(a: Position, b: Position) -> bool {
    a.approx_eq(b, POSITION_EPSILON)
}

/// Two slots belong to the same bundle when their bundle ids match.
/// Slots created before bundle ids existed fall back to type identity.
fn in_same_bundle(a: &CalendarItemView, trigger: &CalendarItemView) -> bool {
    match (a.bundle_id, trigger.bundle_id) {
        (Some(left), Some(right)) => left == right,
        _ => a.item_type.is_bundled() && trigger.item_type.is_bundled(),
    }
}

/// ## Summary
/// The bundle parts standing at `position`.
#[must_use]
pub fn placed_parts_at<'a>(
    items: &'a [CalendarItemView],
    trigger: &CalendarItemView,
    position: Position,
) -> Vec<&'a CalendarItemView> {
    items
        .iter()
        .filter(|item| in_same_bundle(item, trigger) && item.is_opened)
        .filter(|item| item.position.is_some_and(|p| positions_match(p, position)))
        .collect()
}

/// ## Summary
/// The bundle parts sitting in the inventory (opened, unplaced).
#[must_use]
pub fn inventory_parts<'a>(
    items: &'a [CalendarItemView],
    trigger: &CalendarItemView,
) -> Vec<&'a CalendarItemView> {
    items
        .iter()
        .filter(|item| in_same_bundle(item, trigger) && item.is_in_inventory())
        .collect()
}

/// ## Summary
/// Resolves the set of slot ids a bundle operation acts on.
///
/// A placed trigger means a reposition: the result is every part
/// standing at the trigger's position. An unplaced trigger means a
/// fresh placement: every opened-and-unplaced part plus the trigger
/// itself, deduplicated by id.
#[must_use]
pub fn resolve_bundle(trigger: &CalendarItemView, items: &[CalendarItemView]) -> Vec<Uuid> {
    let mut ids: Vec<Uuid> = match trigger.position {
        Some(position) => placed_parts_at(items, trigger, position)
            .iter()
            .map(|item| item.id)
            .collect(),
        None => inventory_parts(items, trigger)
            .iter()
            .map(|item| item.id)
            .collect(),
    };

    if !ids.contains(&trigger.id) {
        ids.push(trigger.id);
    }
    ids
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use sphere_core::types::ItemType;

    use super::*;
    use crate::snapshot::Vec3;

    fn part(bundle_id: Uuid, opened: bool, position: Option<Position>) -> CalendarItemView {
        CalendarItemView {
            id: Uuid::new_v4(),
            item_type: ItemType::Snowdome,
            open_date: Utc.with_ymd_and_hms(2025, 12, 3, 0, 0, 0).unwrap(),
            is_opened: opened,
            position,
            rotation: None,
            bundle_id: Some(bundle_id),
        }
    }

    #[test]
    fn test_fresh_placement_gathers_inventory_parts_and_trigger() {
        let bundle = Uuid::new_v4();
        let items = vec![
            part(bundle, true, None),
            part(bundle, true, None),
            part(bundle, false, None), // unopened part stays in its drawer
            part(bundle, true, Some(Vec3::new(5.0, 0.0, 5.0))),
        ];
        let trigger = part(bundle, true, None);

        let mut all = items.clone();
        all.push(trigger.clone());

        let resolved = resolve_bundle(&trigger, &all);
        assert_eq!(resolved.len(), 3);
        assert!(resolved.contains(&trigger.id));
        assert!(resolved.contains(&items[0].id));
        assert!(resolved.contains(&items[1].id));
    }

    #[test]
    fn test_trigger_already_in_snapshot_is_not_duplicated() {
        let bundle = Uuid::new_v4();
        let trigger = part(bundle, true, None);
        let items = vec![trigger.clone(), part(bundle, true, None)];

        let resolved = resolve_bundle(&trigger, &items);
        assert_eq!(resolved.len(), 2);
        assert_eq!(
            resolved.iter().filter(|id| **id == trigger.id).count(),
            1
        );
    }

    #[test]
    fn test_reposition_gathers_parts_at_the_old_position() {
        let bundle = Uuid::new_v4();
        let spot = Vec3::new(1.0, 0.0, 2.0);
        let nearby = Vec3::new(1.0004, 0.0, 2.0003);
        let elsewhere = Vec3::new(4.0, 0.0, 2.0);

        let items = vec![
            part(bundle, true, Some(spot)),
            part(bundle, true, Some(nearby)),
            part(bundle, true, Some(elsewhere)),
            part(bundle, true, None),
        ];

        let resolved = resolve_bundle(&items[0], &items);
        assert_eq!(resolved.len(), 2);
        assert!(resolved.contains(&items[0].id));
        assert!(resolved.contains(&items[1].id));
    }

    #[test]
    fn test_different_bundles_never_mix() {
        let spot = Vec3::new(0.0, 0.0, 0.0);
        let items = vec![
            part(Uuid::new_v4(), true, Some(spot)),
            part(Uuid::new_v4(), true, Some(spot)),
        ];

        let resolved = resolve_bundle(&items[0], &items);
        assert_eq!(resolved, vec![items[0].id]);
    }

    #[test]
    fn test_positions_match_epsilon_boundary() {
        let a = Vec3::new(1.0, 0.0, 2.0);
        assert!(positions_match(a, Vec3::new(1.0009, 0.0, 2.0)));
        assert!(!positions_match(a, Vec3::new(1.0011, 0.0, 2.0)));
    }
}
