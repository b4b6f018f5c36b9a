use diesel::{pg::Pg, prelude::*};
use serde::{Deserialize, Serialize};

use crate::db::schema;

#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Identifiable, Queryable, Selectable, Serialize, Deserialize,
)]
#[diesel(table_name = schema::app_user)]
#[diesel(check_for_backend(Pg))]
pub struct User {
    pub id: uuid::Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub name: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::app_user)]
pub struct NewUser<'a> {
    pub id: uuid::Uuid,
    pub name: &'a str,
}
