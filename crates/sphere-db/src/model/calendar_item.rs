use diesel::{pg::Pg, prelude::*};
use serde::{Deserialize, Serialize};
use sphere_advent::snapshot::{CalendarItemView, Vec3};
use sphere_core::error::CoreError;

use crate::db::schema;
use crate::error::DbResult;
use crate::model::item::Item;

#[derive(Debug, Clone, PartialEq, Identifiable, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = schema::calendar_item)]
#[diesel(check_for_backend(Pg))]
pub struct CalendarItem {
    pub id: uuid::Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub room_id: uuid::Uuid,
    pub user_id: uuid::Uuid,
    pub item_id: uuid::Uuid,
    pub open_date: chrono::DateTime<chrono::Utc>,
    pub is_opened: bool,
    pub position: Option<Vec<f64>>,
    pub rotation: Option<Vec<f64>>,
    pub image_id: Option<uuid::Uuid>,
    pub bundle_id: Option<uuid::Uuid>,
}

/// A slot joined with its catalog item, the shape the API serves and
/// the decision layer consumes.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize)]
#[diesel(check_for_backend(Pg))]
pub struct CalendarItemWithItem {
    #[diesel(embed)]
    pub calendar_item: CalendarItem,
    #[diesel(embed)]
    pub item: Item,
}

impl CalendarItemWithItem {
    /// ## Summary
    /// Maps this row into the decision layer's snapshot type.
    ///
    /// ## Errors
    /// Returns an error when a stored position or rotation is not a
    /// 3-component vector.
    pub fn to_view(&self) -> DbResult<CalendarItemView> {
        Ok(CalendarItemView {
            id: self.calendar_item.id,
            item_type: sphere_core::types::ItemType::from(self.item.item_type),
            open_date: self.calendar_item.open_date,
            is_opened: self.calendar_item.is_opened,
            position: vec3_from_column(self.calendar_item.position.as_deref())?,
            rotation: vec3_from_column(self.calendar_item.rotation.as_deref())?,
            bundle_id: self.calendar_item.bundle_id,
        })
    }
}

fn vec3_from_column(column: Option<&[f64]>) -> DbResult<Option<Vec3>> {
    column
        .map(|components| {
            Vec3::try_from(components).map_err(|_| {
                CoreError::InvariantViolation("stored vector must have 3 components").into()
            })
        })
        .transpose()
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::calendar_item)]
pub struct NewCalendarItem {
    pub id: uuid::Uuid,
    pub room_id: uuid::Uuid,
    pub user_id: uuid::Uuid,
    pub item_id: uuid::Uuid,
    pub open_date: chrono::DateTime<chrono::Utc>,
    pub position: Option<Vec<f64>>,
    pub rotation: Option<Vec<f64>>,
    pub image_id: Option<uuid::Uuid>,
    pub bundle_id: Option<uuid::Uuid>,
}

/// Partial update for a slot.
///
/// Double options distinguish "leave unchanged" (`None`) from "set to
/// NULL" (`Some(None)`) — placement writes need explicit NULLs.
/// `is_opened` is only ever written as `true`; callers enforce the
/// monotonic flag before building one of these.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = schema::calendar_item)]
pub struct UpdateCalendarItem {
    pub open_date: Option<chrono::DateTime<chrono::Utc>>,
    pub is_opened: Option<bool>,
    pub position: Option<Option<Vec<f64>>>,
    pub rotation: Option<Option<Vec<f64>>>,
    pub image_id: Option<Option<uuid::Uuid>>,
}

impl UpdateCalendarItem {
    /// Changeset for a placement: opened, positioned, rotated.
    #[must_use]
    pub fn placed(position: Vec3, rotation: Vec3) -> Self {
        Self {
            is_opened: Some(true),
            position: Some(Some(position.to_array().to_vec())),
            rotation: Some(Some(rotation.to_array().to_vec())),
            ..Self::default()
        }
    }

    /// Changeset for a deferral: opened, explicitly unplaced.
    #[must_use]
    pub fn skipped() -> Self {
        Self {
            is_opened: Some(true),
            position: Some(None),
            rotation: Some(None),
            ..Self::default()
        }
    }

    /// Changeset returning a placed slot to the inventory. `is_opened`
    /// is untouched.
    #[must_use]
    pub fn returned_to_inventory() -> Self {
        Self {
            position: Some(None),
            rotation: Some(None),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placed_changeset_opens_and_positions() {
        let changes = UpdateCalendarItem::placed(Vec3::new(1.0, 0.0, 2.0), Vec3::new(0.0, 0.5, 0.0));
        assert_eq!(changes.is_opened, Some(true));
        assert_eq!(changes.position, Some(Some(vec![1.0, 0.0, 2.0])));
        assert_eq!(changes.rotation, Some(Some(vec![0.0, 0.5, 0.0])));
    }

    #[test]
    fn test_skipped_changeset_opens_without_position() {
        let changes = UpdateCalendarItem::skipped();
        assert_eq!(changes.is_opened, Some(true));
        assert_eq!(changes.position, Some(None));
        assert_eq!(changes.rotation, Some(None));
    }

    #[test]
    fn test_return_to_inventory_never_touches_opened() {
        let changes = UpdateCalendarItem::returned_to_inventory();
        assert_eq!(changes.is_opened, None);
        assert_eq!(changes.position, Some(None));
    }
}
