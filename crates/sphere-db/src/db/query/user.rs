//! Query builder functions for users.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::db::connection::DbConnection;
use crate::db::schema::app_user;
use crate::error::DbResult;
use crate::model::user::User;

/// ## Summary
/// Returns a query to find a user by ID.
#[must_use]
pub fn by_id(id: uuid::Uuid) -> app_user::BoxedQuery<'static, diesel::pg::Pg> {
    app_user::table.filter(app_user::id.eq(id)).into_boxed()
}

/// ## Summary
/// Fetches a user by ID.
///
/// ## Errors
/// Returns an error if the query fails.
pub async fn get(conn: &mut DbConnection<'_>, id: uuid::Uuid) -> DbResult<Option<User>> {
    Ok(by_id(id)
        .select(User::as_select())
        .first(conn)
        .await
        .optional()?)
}
