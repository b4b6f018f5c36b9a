//! Room lifecycle: creation (including the snowdome track), settings
//! updates, and deletion.

use chrono::{DateTime, Duration, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use rand::Rng;
use rand::seq::SliceRandom;
use sphere_core::constants::{CALENDAR_DAY_COUNT, SNOWDOME_PART_COUNT};
use sphere_db::db::connection::DbConnection;
use sphere_db::db::enums::ItemType;
use sphere_db::db::query::{calendar_item as calendar_item_query, room as room_query};
use sphere_db::db::schema;
use sphere_db::model::calendar_item::NewCalendarItem;
use sphere_db::model::item::{Item, NewItem};
use sphere_db::model::room::{NewRoom, Room, UpdateRoom};

use crate::error::{ServiceError, ServiceResult};
use crate::storage::{StorageClient, user_image_key};

const SECONDS_PER_DAY: i64 = 86_400;

/// Inputs for creating a room.
#[derive(Debug, Clone)]
pub struct CreateRoom<'a> {
    pub owner_id: uuid::Uuid,
    pub password: Option<&'a str>,
    pub is_anonymous: bool,
    pub start_at: DateTime<Utc>,
    /// Fixed daily reveal instant; when absent each slot's reveal time
    /// is randomized at creation.
    pub item_get_time: Option<DateTime<Utc>>,
}

/// One planned snowdome part: its day number and reveal instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedPart {
    pub day: i64,
    pub open_date: DateTime<Utc>,
}

/// ## Summary
/// Plans the snowdome track: [`SNOWDOME_PART_COUNT`] parts on distinct
/// random days within the room's span, each with a reveal instant
/// inside its day window. The part on the latest day is the final one.
///
/// Reveal instants are offsets from `start_at`, so the planned day
/// number always round-trips through the day resolver.
pub fn plan_snowdome_track(
    start_at: DateTime<Utc>,
    item_get_time: Option<DateTime<Utc>>,
    rng: &mut (impl Rng + ?Sized),
) -> Vec<PlannedPart> {
    let mut days: Vec<i64> = (1..=CALENDAR_DAY_COUNT).collect();
    days.shuffle(rng);
    days.truncate(SNOWDOME_PART_COUNT);
    days.sort_unstable();

    days.into_iter()
        .map(|day| {
            let offset_secs = match item_get_time {
                Some(fixed) => (fixed - start_at).num_seconds().rem_euclid(SECONDS_PER_DAY),
                None => rng.gen_range(0..SECONDS_PER_DAY),
            };
            let open_date =
                start_at + Duration::seconds((day - 1) * SECONDS_PER_DAY + offset_secs);
            PlannedPart { day, open_date }
        })
        .collect()
}

/// ## Summary
/// Finds the snowdome catalog item, creating it on first use.
///
/// ## Errors
/// Returns an error if the lookup or insert fails.
async fn ensure_snowdome_item(conn: &mut DbConnection<'_>) -> ServiceResult<Item> {
    let existing = schema::item::table
        .filter(schema::item::item_type.eq(ItemType::Snowdome))
        .select(Item::as_select())
        .first(conn)
        .await
        .optional()
        .map_err(sphere_db::error::DbError::from)?;

    if let Some(item) = existing {
        return Ok(item);
    }

    let new_item = NewItem {
        id: uuid::Uuid::now_v7(),
        name: "Snowdome",
        description: "A snowdome that assembles from four collected parts.",
        item_type: ItemType::Snowdome,
    };

    Ok(diesel::insert_into(schema::item::table)
        .values(&new_item)
        .returning(Item::as_returning())
        .get_result(conn)
        .await
        .map_err(sphere_db::error::DbError::from)?)
}

/// ## Summary
/// Creates a room together with its snowdome track: four parts on
/// distinct random days sharing a fresh bundle id, the latest of which
/// becomes the room's final part date.
///
/// ## Side Effects
/// Inserts one `room` row and four `calendar_item` rows.
///
/// ## Errors
/// Returns an error if any insert fails.
#[tracing::instrument(skip(conn, input, rng), fields(owner_id = %input.owner_id))]
pub async fn create_room(
    conn: &mut DbConnection<'_>,
    input: &CreateRoom<'_>,
    rng: &mut (impl Rng + ?Sized),
) -> ServiceResult<Room> {
    let snowdome = ensure_snowdome_item(conn).await?;
    let parts = plan_snowdome_track(input.start_at, input.item_get_time, rng);
    let last_part = parts
        .last()
        .ok_or(ServiceError::InvariantViolation("snowdome track is empty"))?;

    let new_room = NewRoom {
        id: uuid::Uuid::now_v7(),
        owner_id: input.owner_id,
        password: input.password,
        is_anonymous: input.is_anonymous,
        start_at: input.start_at,
        item_get_time: input.item_get_time,
        edit_id: uuid::Uuid::new_v4(),
        snow_dome_parts_last_date: Some(last_part.open_date),
    };

    let room = diesel::insert_into(schema::room::table)
        .values(&new_room)
        .returning(Room::as_returning())
        .get_result::<Room>(conn)
        .await
        .map_err(sphere_db::error::DbError::from)?;

    let bundle_id = uuid::Uuid::new_v4();
    let rows: Vec<NewCalendarItem> = parts
        .iter()
        .map(|part| NewCalendarItem {
            id: uuid::Uuid::now_v7(),
            room_id: room.id,
            user_id: input.owner_id,
            item_id: snowdome.id,
            open_date: part.open_date,
            position: None,
            rotation: None,
            image_id: None,
            bundle_id: Some(bundle_id),
        })
        .collect();

    diesel::insert_into(schema::calendar_item::table)
        .values(&rows)
        .execute(conn)
        .await
        .map_err(sphere_db::error::DbError::from)?;

    tracing::info!(
        room_id = %room.id,
        part_days = ?parts.iter().map(|p| p.day).collect::<Vec<_>>(),
        "Room created with snowdome track"
    );

    Ok(room)
}

/// ## Summary
/// Fetches a room or fails with `NotFound`.
///
/// ## Errors
/// `NotFound` for an unknown id, or any query error.
pub async fn get_room(conn: &mut DbConnection<'_>, id: uuid::Uuid) -> ServiceResult<Room> {
    room_query::get(conn, id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("room {id}")))
}

/// ## Summary
/// Fetches a room and checks its edit capability token.
///
/// ## Errors
/// `NotFound` for an unknown id, `EditTokenMismatch` for a wrong token.
pub async fn require_edit_token(
    conn: &mut DbConnection<'_>,
    id: uuid::Uuid,
    edit_id: uuid::Uuid,
) -> ServiceResult<Room> {
    let room = get_room(conn, id).await?;
    if room.edit_id == edit_id {
        Ok(room)
    } else {
        Err(ServiceError::EditTokenMismatch(id))
    }
}

/// ## Summary
/// Updates a room's settings. The start date is immutable and is not
/// part of the changeset.
///
/// ## Errors
/// `NotFound`, `EditTokenMismatch`, or any query error.
#[tracing::instrument(skip(conn, changes))]
pub async fn update_room(
    conn: &mut DbConnection<'_>,
    id: uuid::Uuid,
    edit_id: uuid::Uuid,
    changes: &UpdateRoom<'_>,
) -> ServiceResult<Room> {
    require_edit_token(conn, id, edit_id).await?;

    Ok(diesel::update(schema::room::table.filter(schema::room::id.eq(id)))
        .set(changes)
        .returning(Room::as_returning())
        .get_result(conn)
        .await
        .map_err(sphere_db::error::DbError::from)?)
}

/// ## Summary
/// Deletes a room, its slots, and their stored user images.
///
/// ## Side Effects
/// Removes rows and issues storage deletes for attached photos.
///
/// ## Errors
/// `NotFound`, `EditTokenMismatch`, or any query/storage error.
#[tracing::instrument(skip(conn, storage))]
pub async fn delete_room(
    conn: &mut DbConnection<'_>,
    storage: &StorageClient,
    id: uuid::Uuid,
    edit_id: uuid::Uuid,
) -> ServiceResult<()> {
    require_edit_token(conn, id, edit_id).await?;

    let deleted = calendar_item_query::delete_for_room(conn, id).await?;

    diesel::delete(schema::room::table.filter(schema::room::id.eq(id)))
        .execute(conn)
        .await
        .map_err(sphere_db::error::DbError::from)?;

    for slot in &deleted {
        if let Some(image_id) = slot.image_id {
            storage.delete_object(&user_image_key(image_id)).await?;
        }
    }

    tracing::info!(room_id = %id, slots = deleted.len(), "Room deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use sphere_advent::calendar::day_number;

    use super::*;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn test_track_has_four_distinct_days_in_range() {
        let start = utc(2025, 12, 1, 0, 0, 0);
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..50 {
            let parts = plan_snowdome_track(start, None, &mut rng);
            assert_eq!(parts.len(), SNOWDOME_PART_COUNT);

            let mut days: Vec<i64> = parts.iter().map(|p| p.day).collect();
            days.dedup();
            assert_eq!(days.len(), SNOWDOME_PART_COUNT, "days must be distinct");
            assert!(days.iter().all(|d| (1..=25).contains(d)));
        }
    }

    #[test]
    fn test_planned_days_round_trip_through_the_resolver() {
        let start = utc(2025, 12, 1, 9, 30, 0);
        let mut rng = StdRng::seed_from_u64(42);

        let parts = plan_snowdome_track(start, None, &mut rng);
        for part in parts {
            assert_eq!(day_number(start, part.open_date), part.day);
        }
    }

    #[test]
    fn test_final_part_is_the_latest_day() {
        let start = utc(2025, 12, 1, 0, 0, 0);
        let mut rng = StdRng::seed_from_u64(3);

        let parts = plan_snowdome_track(start, None, &mut rng);
        let max_day = parts.iter().map(|p| p.day).max().unwrap();
        assert_eq!(parts.last().unwrap().day, max_day);
    }

    #[test]
    fn test_fixed_item_get_time_pins_the_reveal_offset() {
        let start = utc(2025, 12, 1, 0, 0, 0);
        let fixed = utc(2025, 12, 1, 10, 30, 0);
        let mut rng = StdRng::seed_from_u64(11);

        let parts = plan_snowdome_track(start, Some(fixed), &mut rng);
        for part in parts {
            let into_day = (part.open_date - start).num_seconds() % SECONDS_PER_DAY;
            assert_eq!(into_day, 10 * 3600 + 30 * 60);
        }
    }
}
