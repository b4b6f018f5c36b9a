//! Query builder functions for catalog items.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::db::connection::DbConnection;
use crate::db::enums::ItemType;
use crate::db::schema::item;
use crate::error::DbResult;
use crate::model::item::Item;

/// Default page size for catalog listings.
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// ## Summary
/// Returns a query to select all catalog items ordered by name.
#[must_use]
pub fn all() -> item::BoxedQuery<'static, diesel::pg::Pg> {
    item::table.order(item::name.asc()).into_boxed()
}

/// ## Summary
/// Returns a query to find a catalog item by ID.
#[must_use]
pub fn by_id(id: uuid::Uuid) -> item::BoxedQuery<'static, diesel::pg::Pg> {
    item::table.filter(item::id.eq(id)).into_boxed()
}

/// ## Summary
/// Returns a page of the catalog, optionally restricted to a type.
#[must_use]
pub fn page(
    item_type: Option<ItemType>,
    limit: Option<i64>,
    offset: Option<i64>,
) -> item::BoxedQuery<'static, diesel::pg::Pg> {
    let mut query = all();
    if let Some(ty) = item_type {
        query = query.filter(item::item_type.eq(ty));
    }
    query
        .limit(limit.unwrap_or(DEFAULT_PAGE_SIZE))
        .offset(offset.unwrap_or(0))
}

/// ## Summary
/// Fetches a catalog item by ID.
///
/// ## Errors
/// Returns an error if the query fails.
pub async fn get(conn: &mut DbConnection<'_>, id: uuid::Uuid) -> DbResult<Option<Item>> {
    Ok(by_id(id)
        .select(Item::as_select())
        .first(conn)
        .await
        .optional()?)
}
