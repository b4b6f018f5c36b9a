//! Query builder functions for rooms.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::db::connection::DbConnection;
use crate::db::schema::room;
use crate::error::DbResult;
use crate::model::room::Room;

/// ## Summary
/// Returns a query to select all rooms.
#[must_use]
pub fn all() -> room::BoxedQuery<'static, diesel::pg::Pg> {
    room::table.into_boxed()
}

/// ## Summary
/// Returns a query to find a room by ID.
#[must_use]
pub fn by_id(id: uuid::Uuid) -> room::BoxedQuery<'static, diesel::pg::Pg> {
    all().filter(room::id.eq(id))
}

/// ## Summary
/// Returns a query for rooms whose start date is older than `cutoff`,
/// oldest first. Used by the retention sweep.
#[must_use]
pub fn started_before(
    cutoff: chrono::DateTime<chrono::Utc>,
) -> room::BoxedQuery<'static, diesel::pg::Pg> {
    all()
        .filter(room::start_at.lt(cutoff))
        .order(room::created_at.asc())
}

/// ## Summary
/// Fetches a room by ID.
///
/// ## Errors
/// Returns an error if the query fails.
pub async fn get(conn: &mut DbConnection<'_>, id: uuid::Uuid) -> DbResult<Option<Room>> {
    Ok(by_id(id)
        .select(Room::as_select())
        .first(conn)
        .await
        .optional()?)
}

/// ## Summary
/// Atomically increments a room's AI generation counter.
///
/// ## Errors
/// Returns an error if the update fails.
pub async fn increment_generate_count(
    conn: &mut DbConnection<'_>,
    id: uuid::Uuid,
) -> DbResult<usize> {
    Ok(diesel::update(room::table.filter(room::id.eq(id)))
        .set(room::generate_count.eq(room::generate_count + 1))
        .execute(conn)
        .await?)
}
