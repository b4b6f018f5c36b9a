//! Query and update functions for calendar slots.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::db::connection::DbConnection;
use crate::db::schema::{calendar_item, item};
use crate::error::DbResult;
use crate::model::calendar_item::{CalendarItem, CalendarItemWithItem, UpdateCalendarItem};

/// ## Summary
/// Returns a query to select a room's slots.
#[must_use]
pub fn for_room(room_id: uuid::Uuid) -> calendar_item::BoxedQuery<'static, diesel::pg::Pg> {
    calendar_item::table
        .filter(calendar_item::room_id.eq(room_id))
        .into_boxed()
}

/// ## Summary
/// Lists a room's slots joined with their catalog items, ordered by
/// reveal date.
///
/// ## Errors
/// Returns an error if the query fails.
pub async fn list_with_items(
    conn: &mut DbConnection<'_>,
    room_id: uuid::Uuid,
) -> DbResult<Vec<CalendarItemWithItem>> {
    Ok(calendar_item::table
        .inner_join(item::table)
        .filter(calendar_item::room_id.eq(room_id))
        .order(calendar_item::open_date.asc())
        .select(CalendarItemWithItem::as_select())
        .load(conn)
        .await?)
}

/// ## Summary
/// Lists a room's inventory: opened slots without a position.
///
/// ## Errors
/// Returns an error if the query fails.
pub async fn inventory(
    conn: &mut DbConnection<'_>,
    room_id: uuid::Uuid,
) -> DbResult<Vec<CalendarItemWithItem>> {
    Ok(calendar_item::table
        .inner_join(item::table)
        .filter(calendar_item::room_id.eq(room_id))
        .filter(calendar_item::is_opened.eq(true))
        .filter(calendar_item::position.is_null())
        .order(calendar_item::open_date.asc())
        .select(CalendarItemWithItem::as_select())
        .load(conn)
        .await?)
}

/// ## Summary
/// Lists the slots placed in a room's 3D scene.
///
/// ## Errors
/// Returns an error if the query fails.
pub async fn placed(
    conn: &mut DbConnection<'_>,
    room_id: uuid::Uuid,
) -> DbResult<Vec<CalendarItemWithItem>> {
    Ok(calendar_item::table
        .inner_join(item::table)
        .filter(calendar_item::room_id.eq(room_id))
        .filter(calendar_item::position.is_not_null())
        .order(calendar_item::open_date.asc())
        .select(CalendarItemWithItem::as_select())
        .load(conn)
        .await?)
}

/// ## Summary
/// Fetches one slot of a room, joined with its catalog item.
///
/// ## Errors
/// Returns an error if the query fails.
pub async fn get_with_item(
    conn: &mut DbConnection<'_>,
    room_id: uuid::Uuid,
    id: uuid::Uuid,
) -> DbResult<Option<CalendarItemWithItem>> {
    Ok(calendar_item::table
        .inner_join(item::table)
        .filter(calendar_item::room_id.eq(room_id))
        .filter(calendar_item::id.eq(id))
        .select(CalendarItemWithItem::as_select())
        .first(conn)
        .await
        .optional()?)
}

/// ## Summary
/// Applies a changeset to one slot of a room and returns the row.
///
/// ## Errors
/// Returns `NotFound` if the slot is not in the room, or any query
/// error.
pub async fn update_one(
    conn: &mut DbConnection<'_>,
    room_id: uuid::Uuid,
    id: uuid::Uuid,
    changes: &UpdateCalendarItem,
) -> DbResult<CalendarItem> {
    Ok(diesel::update(
        calendar_item::table
            .filter(calendar_item::room_id.eq(room_id))
            .filter(calendar_item::id.eq(id)),
    )
    .set(changes)
    .returning(CalendarItem::as_returning())
    .get_result(conn)
    .await?)
}

/// ## Summary
/// Applies one changeset to a set of a room's slots, returning the
/// number of rows touched. Callers wrap this in a transaction when the
/// set must move as one.
///
/// ## Errors
/// Returns an error if the update fails.
pub async fn update_many(
    conn: &mut DbConnection<'_>,
    room_id: uuid::Uuid,
    ids: &[uuid::Uuid],
    changes: &UpdateCalendarItem,
) -> DbResult<usize> {
    Ok(diesel::update(
        calendar_item::table
            .filter(calendar_item::room_id.eq(room_id))
            .filter(calendar_item::id.eq_any(ids.to_vec())),
    )
    .set(changes)
    .execute(conn)
    .await?)
}

/// ## Summary
/// Deletes one slot of a room, returning the deleted row if it existed.
///
/// ## Errors
/// Returns an error if the delete fails.
pub async fn delete_one(
    conn: &mut DbConnection<'_>,
    room_id: uuid::Uuid,
    id: uuid::Uuid,
) -> DbResult<Option<CalendarItem>> {
    Ok(diesel::delete(
        calendar_item::table
            .filter(calendar_item::room_id.eq(room_id))
            .filter(calendar_item::id.eq(id)),
    )
    .returning(CalendarItem::as_returning())
    .get_results(conn)
    .await?
    .into_iter()
    .next())
}

/// ## Summary
/// Deletes every slot of a room, returning the deleted rows (the
/// retention sweep needs their image ids).
///
/// ## Errors
/// Returns an error if the delete fails.
pub async fn delete_for_room(
    conn: &mut DbConnection<'_>,
    room_id: uuid::Uuid,
) -> DbResult<Vec<CalendarItem>> {
    Ok(
        diesel::delete(calendar_item::table.filter(calendar_item::room_id.eq(room_id)))
            .returning(CalendarItem::as_returning())
            .get_results(conn)
            .await?,
    )
}
