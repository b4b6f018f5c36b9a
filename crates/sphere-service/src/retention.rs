//! Retention sweep: rooms older than the retention window are removed
//! together with their slots and stored photos.

use chrono::{DateTime, Duration, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use sphere_core::constants::ROOM_RETENTION_DAYS;
use sphere_db::db::connection::DbConnection;
use sphere_db::db::query::{calendar_item as slot_query, room as room_query};
use sphere_db::db::schema;
use sphere_db::model::room::Room;

use crate::error::ServiceResult;
use crate::storage::{StorageClient, user_image_key};

/// ## Summary
/// Deletes every room whose start date is more than
/// [`ROOM_RETENTION_DAYS`] before `now`, along with its slots and
/// their user images. Returns the number of rooms removed.
///
/// ## Side Effects
/// Deletes rows and storage objects.
///
/// ## Errors
/// Returns an error if a query or storage delete fails; rooms already
/// swept stay deleted.
#[tracing::instrument(skip(conn, storage))]
pub async fn sweep_expired_rooms(
    conn: &mut DbConnection<'_>,
    storage: &StorageClient,
    now: DateTime<Utc>,
) -> ServiceResult<usize> {
    let cutoff = now - Duration::days(ROOM_RETENTION_DAYS);

    let expired: Vec<Room> = room_query::started_before(cutoff)
        .select(Room::as_select())
        .load(conn)
        .await
        .map_err(sphere_db::error::DbError::from)?;

    let mut removed = 0;
    for room in expired {
        let slots = slot_query::delete_for_room(conn, room.id).await?;

        diesel::delete(schema::room::table.filter(schema::room::id.eq(room.id)))
            .execute(conn)
            .await
            .map_err(sphere_db::error::DbError::from)?;

        for slot in &slots {
            if let Some(image_id) = slot.image_id {
                storage.delete_object(&user_image_key(image_id)).await?;
            }
        }

        tracing::info!(room_id = %room.id, slots = slots.len(), "Swept expired room");
        removed += 1;
    }

    Ok(removed)
}
