//! Calendar-slot CRUD and the patch surface the client drives
//! placement through.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use sphere_advent::calendar::day_number;
use sphere_advent::openability::can_open_day;
use sphere_db::db::connection::DbConnection;
use sphere_db::db::query::calendar_item as slot_query;
use sphere_db::db::schema;
use sphere_db::model::calendar_item::{
    CalendarItem, CalendarItemWithItem, NewCalendarItem, UpdateCalendarItem,
};

use crate::acquisition::load_snapshot;
use crate::error::{ServiceError, ServiceResult};
use crate::invalidation::Invalidation;
use crate::room::require_edit_token;
use crate::storage::{StorageClient, user_image_key};

/// ## Summary
/// Lists all of a room's slots joined with catalog fields.
///
/// ## Errors
/// Returns an error if the query fails.
pub async fn list(
    conn: &mut DbConnection<'_>,
    room_id: uuid::Uuid,
) -> ServiceResult<Vec<CalendarItemWithItem>> {
    Ok(slot_query::list_with_items(conn, room_id).await?)
}

/// ## Summary
/// Lists the room's inventory view (opened, unplaced).
///
/// ## Errors
/// Returns an error if the query fails.
pub async fn inventory(
    conn: &mut DbConnection<'_>,
    room_id: uuid::Uuid,
) -> ServiceResult<Vec<CalendarItemWithItem>> {
    Ok(slot_query::inventory(conn, room_id).await?)
}

/// ## Summary
/// Lists the room's placed view.
///
/// ## Errors
/// Returns an error if the query fails.
pub async fn placed(
    conn: &mut DbConnection<'_>,
    room_id: uuid::Uuid,
) -> ServiceResult<Vec<CalendarItemWithItem>> {
    Ok(slot_query::placed(conn, room_id).await?)
}

/// Inputs for scheduling a new slot at edit time.
#[derive(Debug, Clone)]
pub struct CreateSlot {
    pub user_id: uuid::Uuid,
    pub item_id: uuid::Uuid,
    pub open_date: DateTime<Utc>,
    pub image_id: Option<uuid::Uuid>,
}

/// ## Summary
/// Creates a slot in a room. Slots are born unopened and unplaced; an
/// item cannot be placed before it is revealed.
///
/// ## Errors
/// `EditTokenMismatch` without the room's edit capability, or any
/// query error.
#[tracing::instrument(skip(conn, input))]
pub async fn create(
    conn: &mut DbConnection<'_>,
    room_id: uuid::Uuid,
    edit_id: uuid::Uuid,
    input: &CreateSlot,
) -> ServiceResult<CalendarItem> {
    require_edit_token(conn, room_id, edit_id).await?;

    let new_slot = NewCalendarItem {
        id: uuid::Uuid::now_v7(),
        room_id,
        user_id: input.user_id,
        item_id: input.item_id,
        open_date: input.open_date,
        position: None,
        rotation: None,
        image_id: input.image_id,
        bundle_id: None,
    };

    Ok(diesel::insert_into(schema::calendar_item::table)
        .values(&new_slot)
        .returning(CalendarItem::as_returning())
        .get_result(conn)
        .await
        .map_err(sphere_db::error::DbError::from)?)
}

/// A partial update to a slot, as the wire carries it. Double options
/// distinguish "leave unchanged" from "set to NULL".
#[derive(Debug, Clone, Default)]
pub struct SlotPatch {
    pub open_date: Option<DateTime<Utc>>,
    pub is_opened: Option<bool>,
    pub position: Option<Option<[f64; 3]>>,
    pub rotation: Option<Option<[f64; 3]>>,
    pub image_id: Option<Option<uuid::Uuid>>,
}

impl SlotPatch {
    /// Editorial fields require the room's edit capability; placement
    /// fields are driven by participants.
    #[must_use]
    pub const fn is_editorial(&self) -> bool {
        self.open_date.is_some() || self.image_id.is_some()
    }
}

/// ## Summary
/// Applies a patch to one slot.
///
/// Guards:
/// - `is_opened` is monotonic; a patch asking for `false` is rejected.
/// - Flipping a closed slot open re-checks the openability predicate
///   server-side against `now`.
/// - A position on a slot that is not (being) opened is rejected.
/// - Editorial fields require the edit token.
///
/// ## Errors
/// `ValidationError`, `NotOpenable`, `EditTokenMismatch`, `NotFound`,
/// or any query error.
#[tracing::instrument(skip(conn, patch), fields(room_id = %room_id, id = %id))]
pub async fn patch(
    conn: &mut DbConnection<'_>,
    room_id: uuid::Uuid,
    id: uuid::Uuid,
    patch: &SlotPatch,
    edit_id: Option<uuid::Uuid>,
    now: DateTime<Utc>,
) -> ServiceResult<(CalendarItem, Invalidation)> {
    if patch.is_opened == Some(false) {
        return Err(ServiceError::ValidationError(
            "a slot cannot be un-opened".into(),
        ));
    }

    if patch.is_editorial() {
        let token = edit_id.ok_or(ServiceError::EditTokenMismatch(room_id))?;
        require_edit_token(conn, room_id, token).await?;
    }

    let snapshot = load_snapshot(conn, room_id).await?;
    let current = snapshot
        .items
        .iter()
        .find(|item| item.id == id)
        .ok_or_else(|| ServiceError::NotFound(format!("calendar item {id}")))?;

    let will_be_opened = current.is_opened || patch.is_opened == Some(true);
    if matches!(patch.position, Some(Some(_))) && !will_be_opened {
        return Err(ServiceError::ValidationError(
            "a slot cannot be placed before it is opened".into(),
        ));
    }

    // Server-side authority on opening: the client's clock does not get
    // a vote.
    if patch.is_opened == Some(true) && !current.is_opened {
        let day = day_number(snapshot.room.start_at, current.open_date);
        if !can_open_day(&snapshot.room, &snapshot.items, day, now) {
            return Err(ServiceError::NotOpenable { day });
        }
    }

    let changes = UpdateCalendarItem {
        open_date: patch.open_date,
        is_opened: patch.is_opened,
        position: patch.position.map(|p| p.map(|v| v.to_vec())),
        rotation: patch.rotation.map(|r| r.map(|v| v.to_vec())),
        image_id: patch.image_id,
    };

    let row = slot_query::update_one(conn, room_id, id, &changes).await?;
    Ok((row, Invalidation::slot_views(room_id)))
}

/// ## Summary
/// Deletes a slot and its attached photo, if any.
///
/// ## Errors
/// `EditTokenMismatch`, `NotFound`, or any query/storage error.
#[tracing::instrument(skip(conn, storage))]
pub async fn delete(
    conn: &mut DbConnection<'_>,
    storage: &StorageClient,
    room_id: uuid::Uuid,
    id: uuid::Uuid,
    edit_id: uuid::Uuid,
) -> ServiceResult<Invalidation> {
    require_edit_token(conn, room_id, edit_id).await?;

    let deleted = slot_query::delete_one(conn, room_id, id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("calendar item {id}")))?;

    if let Some(image_id) = deleted.image_id {
        storage.delete_object(&user_image_key(image_id)).await?;
    }

    Ok(Invalidation::slot_views(room_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placement_fields_are_not_editorial() {
        let patch = SlotPatch {
            is_opened: Some(true),
            position: Some(Some([1.0, 0.0, 2.0])),
            rotation: Some(Some([0.0, 0.0, 0.0])),
            ..SlotPatch::default()
        };
        assert!(!patch.is_editorial());
    }

    #[test]
    fn test_schedule_and_photo_changes_are_editorial() {
        let reschedule = SlotPatch {
            open_date: Some(chrono::Utc::now()),
            ..SlotPatch::default()
        };
        assert!(reschedule.is_editorial());

        let attach_photo = SlotPatch {
            image_id: Some(Some(uuid::Uuid::new_v4())),
            ..SlotPatch::default()
        };
        assert!(attach_photo.is_editorial());
    }
}
