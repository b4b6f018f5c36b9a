use diesel::{pg::Pg, prelude::*};
use serde::{Deserialize, Serialize};
use sphere_advent::snapshot::RoomView;

use crate::db::schema;

#[derive(
    Debug, Clone, PartialEq, Eq, Identifiable, Queryable, Selectable, Serialize, Deserialize,
)]
#[diesel(table_name = schema::room)]
#[diesel(check_for_backend(Pg))]
pub struct Room {
    pub id: uuid::Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub owner_id: uuid::Uuid,
    pub password: Option<String>,
    pub is_anonymous: bool,
    pub start_at: chrono::DateTime<chrono::Utc>,
    pub item_get_time: Option<chrono::DateTime<chrono::Utc>>,
    pub generate_count: i32,
    pub edit_id: uuid::Uuid,
    pub snow_dome_parts_last_date: Option<chrono::DateTime<chrono::Utc>>,
}

impl Room {
    /// The slice of this row the decision layer consumes.
    #[must_use]
    pub const fn to_view(&self) -> RoomView {
        RoomView {
            id: self.id,
            start_at: self.start_at,
            snow_dome_parts_last_date: self.snow_dome_parts_last_date,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::room)]
pub struct NewRoom<'a> {
    pub id: uuid::Uuid,
    pub owner_id: uuid::Uuid,
    pub password: Option<&'a str>,
    pub is_anonymous: bool,
    pub start_at: chrono::DateTime<chrono::Utc>,
    pub item_get_time: Option<chrono::DateTime<chrono::Utc>>,
    pub edit_id: uuid::Uuid,
    pub snow_dome_parts_last_date: Option<chrono::DateTime<chrono::Utc>>,
}

/// Partial update for room settings.
///
/// `start_at` is deliberately absent: the start date is immutable after
/// creation. Double options distinguish "leave unchanged" (`None`) from
/// "set to NULL" (`Some(None)`).
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = schema::room)]
pub struct UpdateRoom<'a> {
    pub password: Option<Option<&'a str>>,
    pub is_anonymous: Option<bool>,
    pub item_get_time: Option<Option<chrono::DateTime<chrono::Utc>>>,
}
