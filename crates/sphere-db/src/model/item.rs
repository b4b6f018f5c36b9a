use diesel::{pg::Pg, prelude::*};
use serde::{Deserialize, Serialize};

use crate::db::{enums::ItemType, schema};

/// Catalog item definition. Reusable across many calendar slots and
/// never touched by the acquisition flow.
#[derive(
    Debug, Clone, PartialEq, Eq, Identifiable, Queryable, Selectable, Serialize, Deserialize,
)]
#[diesel(table_name = schema::item)]
#[diesel(check_for_backend(Pg))]
pub struct Item {
    pub id: uuid::Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub name: String,
    pub description: String,
    pub item_type: ItemType,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::item)]
pub struct NewItem<'a> {
    pub id: uuid::Uuid,
    pub name: &'a str,
    pub description: &'a str,
    pub item_type: ItemType,
}

#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = schema::item)]
pub struct UpdateItem<'a> {
    pub name: Option<&'a str>,
    pub description: Option<&'a str>,
    pub item_type: Option<ItemType>,
}
