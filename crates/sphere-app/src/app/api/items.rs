//! Catalog item routes: paged listing, CRUD, and asset uploads.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use salvo::{Depot, Request, Response, Router, handler, http::StatusCode, writing::Json};
use serde::{Deserialize, Serialize};
use sphere_db::db::enums::ItemType;
use sphere_db::db::query::item as item_query;
use sphere_db::db::schema;
use sphere_db::model::item::{Item, NewItem, UpdateItem};
use sphere_service::storage::{StorageClient, item_object_key, item_thumbnail_key};
use tracing::error;

use crate::app::api::util::{ErrorResponse, uuid_param};
use crate::clients::get_storage_from_depot;
use crate::db_handler::get_db_from_depot;

/// A base64-encoded file in a JSON body.
#[derive(Debug, Deserialize)]
pub struct FilePayload {
    pub data: String,
    pub extension: String,
}

impl FilePayload {
    fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        BASE64.decode(&self.data)
    }
}

/// ## Summary
/// Create item request payload
#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub object_file: FilePayload,
    pub object_thumbnail: FilePayload,
}

/// ## Summary
/// Update item request payload
#[derive(Debug, Default, Deserialize)]
pub struct UpdateItemRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub item_type: Option<ItemType>,
    pub object_file: Option<FilePayload>,
    pub object_thumbnail: Option<FilePayload>,
}

/// ## Summary
/// Item response payload
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemResponse {
    pub id: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
}

impl From<Item> for ItemResponse {
    fn from(item: Item) -> Self {
        Self {
            id: item.id.to_string(),
            created_at: item.created_at,
            name: item.name,
            description: item.description,
            item_type: item.item_type,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    limit: Option<i64>,
    offset: Option<i64>,
    #[serde(rename = "type")]
    item_type: Option<ItemType>,
}

/// ## Summary
/// GET /items - Page through the catalog, ordered by name.
///
/// ## Errors
/// Returns HTTP 500 if the query fails
#[handler]
async fn list_items_handler(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let query: ListQuery = match req.parse_queries() {
        Ok(q) => q,
        Err(e) => {
            error!(error = ?e, "Failed to parse item list query");
            ErrorResponse::render(res, StatusCode::BAD_REQUEST, "Invalid query parameters");
            return;
        }
    };

    let provider = match get_db_from_depot(depot) {
        Ok(p) => p,
        Err(e) => {
            error!(error = ?e, "Failed to get database provider");
            ErrorResponse::render(res, StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
            return;
        }
    };

    let mut conn = match provider.get_connection().await {
        Ok(c) => c,
        Err(e) => {
            error!(error = ?e, "Failed to get database connection");
            ErrorResponse::render(res, StatusCode::SERVICE_UNAVAILABLE, "Database unavailable");
            return;
        }
    };

    match item_query::page(query.item_type, query.limit, query.offset)
        .select(Item::as_select())
        .load::<Item>(&mut conn)
        .await
    {
        Ok(items) => {
            let body: Vec<ItemResponse> = items.into_iter().map(ItemResponse::from).collect();
            res.render(Json(body));
        }
        Err(e) => {
            error!(error = ?e, "Failed to list items");
            ErrorResponse::render(res, StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
        }
    }
}

/// ## Summary
/// GET /`items/{id}` - Fetch one catalog item.
///
/// ## Errors
/// Returns HTTP 404 if the item does not exist
#[handler]
async fn get_item_handler(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let Some(id) = uuid_param(req, res, "id") else {
        return;
    };

    let provider = match get_db_from_depot(depot) {
        Ok(p) => p,
        Err(e) => {
            error!(error = ?e, "Failed to get database provider");
            ErrorResponse::render(res, StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
            return;
        }
    };

    let mut conn = match provider.get_connection().await {
        Ok(c) => c,
        Err(e) => {
            error!(error = ?e, "Failed to get database connection");
            ErrorResponse::render(res, StatusCode::SERVICE_UNAVAILABLE, "Database unavailable");
            return;
        }
    };

    match item_query::get(&mut conn, id).await {
        Ok(Some(item)) => res.render(Json(ItemResponse::from(item))),
        Ok(None) => ErrorResponse::render(res, StatusCode::NOT_FOUND, "Item not found"),
        Err(e) => {
            error!(error = ?e, "Failed to query item");
            ErrorResponse::render(res, StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
        }
    }
}

async fn upload_item_assets(
    storage: &StorageClient,
    item_id: uuid::Uuid,
    object_file: &FilePayload,
    object_thumbnail: &FilePayload,
) -> anyhow::Result<()> {
    let model_bytes = object_file.decode()?;
    let thumb_bytes = object_thumbnail.decode()?;

    storage
        .put_object(
            &item_object_key(item_id, &object_file.extension),
            model_bytes,
            "application/octet-stream",
        )
        .await?;
    storage
        .put_object(
            &item_thumbnail_key(item_id, &object_thumbnail.extension),
            thumb_bytes,
            "image/png",
        )
        .await?;
    Ok(())
}

/// ## Summary
/// POST /items - Create a catalog item with its model and thumbnail.
///
/// ## Side Effects
/// - Inserts an `item` row
/// - Uploads the model and thumbnail objects; a failed upload rolls the
///   row back
///
/// ## Errors
/// Returns HTTP 400 for a malformed body
/// Returns HTTP 500 if the insert or an upload fails
#[handler]
async fn create_item_handler(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let create_req: CreateItemRequest = match req.parse_json().await {
        Ok(r) => r,
        Err(e) => {
            error!(error = ?e, "Failed to parse create item request");
            ErrorResponse::render(res, StatusCode::BAD_REQUEST, "Invalid request body");
            return;
        }
    };

    let storage = match get_storage_from_depot(depot) {
        Ok(s) => s,
        Err(e) => {
            error!(error = ?e, "Failed to get storage client");
            ErrorResponse::render(res, StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
            return;
        }
    };

    let provider = match get_db_from_depot(depot) {
        Ok(p) => p,
        Err(e) => {
            error!(error = ?e, "Failed to get database provider");
            ErrorResponse::render(res, StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
            return;
        }
    };

    let mut conn = match provider.get_connection().await {
        Ok(c) => c,
        Err(e) => {
            error!(error = ?e, "Failed to get database connection");
            ErrorResponse::render(res, StatusCode::SERVICE_UNAVAILABLE, "Database unavailable");
            return;
        }
    };

    let new_item = NewItem {
        id: uuid::Uuid::now_v7(),
        name: &create_req.name,
        description: &create_req.description,
        item_type: create_req.item_type,
    };

    let item = match diesel::insert_into(schema::item::table)
        .values(&new_item)
        .returning(Item::as_returning())
        .get_result::<Item>(&mut conn)
        .await
    {
        Ok(i) => i,
        Err(e) => {
            error!(error = ?e, "Failed to create item");
            ErrorResponse::render(res, StatusCode::INTERNAL_SERVER_ERROR, "Failed to create item");
            return;
        }
    };

    if let Err(e) = upload_item_assets(
        &storage,
        item.id,
        &create_req.object_file,
        &create_req.object_thumbnail,
    )
    .await
    {
        error!(error = ?e, item_id = %item.id, "Asset upload failed, rolling back item");
        if let Err(del) = diesel::delete(schema::item::table.filter(schema::item::id.eq(item.id)))
            .execute(&mut conn)
            .await
        {
            error!(error = ?del, item_id = %item.id, "Failed to roll back item row");
        }
        ErrorResponse::render(res, StatusCode::INTERNAL_SERVER_ERROR, "File upload failed");
        return;
    }

    tracing::info!(item_id = %item.id, "Item created");
    res.status_code(StatusCode::CREATED);
    res.render(Json(ItemResponse::from(item)));
}

/// ## Summary
/// PATCH /`items/{id}` - Update fields and/or replace assets.
///
/// ## Errors
/// Returns HTTP 400 when nothing is being updated
/// Returns HTTP 404 if the item does not exist
#[handler]
async fn patch_item_handler(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let Some(id) = uuid_param(req, res, "id") else {
        return;
    };

    let update_req: UpdateItemRequest = match req.parse_json().await {
        Ok(r) => r,
        Err(e) => {
            error!(error = ?e, "Failed to parse update item request");
            ErrorResponse::render(res, StatusCode::BAD_REQUEST, "Invalid request body");
            return;
        }
    };

    let has_field_updates = update_req.name.is_some()
        || update_req.description.is_some()
        || update_req.item_type.is_some();
    if !has_field_updates && update_req.object_file.is_none() && update_req.object_thumbnail.is_none()
    {
        ErrorResponse::render(res, StatusCode::BAD_REQUEST, "No fields to update");
        return;
    }

    let storage = match get_storage_from_depot(depot) {
        Ok(s) => s,
        Err(e) => {
            error!(error = ?e, "Failed to get storage client");
            ErrorResponse::render(res, StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
            return;
        }
    };

    let provider = match get_db_from_depot(depot) {
        Ok(p) => p,
        Err(e) => {
            error!(error = ?e, "Failed to get database provider");
            ErrorResponse::render(res, StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
            return;
        }
    };

    let mut conn = match provider.get_connection().await {
        Ok(c) => c,
        Err(e) => {
            error!(error = ?e, "Failed to get database connection");
            ErrorResponse::render(res, StatusCode::SERVICE_UNAVAILABLE, "Database unavailable");
            return;
        }
    };

    let item = if has_field_updates {
        let changes = UpdateItem {
            name: update_req.name.as_deref(),
            description: update_req.description.as_deref(),
            item_type: update_req.item_type,
        };
        match diesel::update(schema::item::table.filter(schema::item::id.eq(id)))
            .set(&changes)
            .returning(Item::as_returning())
            .get_result::<Item>(&mut conn)
            .await
            .optional()
        {
            Ok(Some(i)) => i,
            Ok(None) => {
                ErrorResponse::render(res, StatusCode::NOT_FOUND, "Item not found");
                return;
            }
            Err(e) => {
                error!(error = ?e, "Failed to update item");
                ErrorResponse::render(
                    res,
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to update item",
                );
                return;
            }
        }
    } else {
        match item_query::get(&mut conn, id).await {
            Ok(Some(i)) => i,
            Ok(None) => {
                ErrorResponse::render(res, StatusCode::NOT_FOUND, "Item not found");
                return;
            }
            Err(e) => {
                error!(error = ?e, "Failed to query item");
                ErrorResponse::render(
                    res,
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                );
                return;
            }
        }
    };

    if let Some(object_file) = &update_req.object_file {
        let replaced = async {
            let bytes = object_file.decode()?;
            storage
                .put_object(
                    &item_object_key(item.id, &object_file.extension),
                    bytes,
                    "application/octet-stream",
                )
                .await?;
            anyhow::Ok(())
        }
        .await;
        if let Err(e) = replaced {
            error!(error = ?e, item_id = %item.id, "Failed to replace model object");
            ErrorResponse::render(res, StatusCode::INTERNAL_SERVER_ERROR, "File update failed");
            return;
        }
    }

    if let Some(object_thumbnail) = &update_req.object_thumbnail {
        let replaced = async {
            let bytes = object_thumbnail.decode()?;
            storage
                .put_object(
                    &item_thumbnail_key(item.id, &object_thumbnail.extension),
                    bytes,
                    "image/png",
                )
                .await?;
            anyhow::Ok(())
        }
        .await;
        if let Err(e) = replaced {
            error!(error = ?e, item_id = %item.id, "Failed to replace thumbnail");
            ErrorResponse::render(res, StatusCode::INTERNAL_SERVER_ERROR, "File update failed");
            return;
        }
    }

    res.render(Json(ItemResponse::from(item)));
}

/// ## Summary
/// DELETE /`items/{id}` - Delete a catalog item and its assets.
///
/// ## Errors
/// Returns HTTP 404 if the item does not exist
#[handler]
async fn delete_item_handler(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let Some(id) = uuid_param(req, res, "id") else {
        return;
    };

    let storage = match get_storage_from_depot(depot) {
        Ok(s) => s,
        Err(e) => {
            error!(error = ?e, "Failed to get storage client");
            ErrorResponse::render(res, StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
            return;
        }
    };

    let provider = match get_db_from_depot(depot) {
        Ok(p) => p,
        Err(e) => {
            error!(error = ?e, "Failed to get database provider");
            ErrorResponse::render(res, StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
            return;
        }
    };

    let mut conn = match provider.get_connection().await {
        Ok(c) => c,
        Err(e) => {
            error!(error = ?e, "Failed to get database connection");
            ErrorResponse::render(res, StatusCode::SERVICE_UNAVAILABLE, "Database unavailable");
            return;
        }
    };

    let deleted = match diesel::delete(schema::item::table.filter(schema::item::id.eq(id)))
        .returning(Item::as_returning())
        .get_result::<Item>(&mut conn)
        .await
        .optional()
    {
        Ok(Some(i)) => i,
        Ok(None) => {
            ErrorResponse::render(res, StatusCode::NOT_FOUND, "Item not found");
            return;
        }
        Err(e) => {
            error!(error = ?e, "Failed to delete item");
            ErrorResponse::render(res, StatusCode::INTERNAL_SERVER_ERROR, "Failed to delete item");
            return;
        }
    };

    // Extensions vary per upload; sweep the known ones.
    for key in [
        item_object_key(deleted.id, "glb"),
        item_thumbnail_key(deleted.id, "png"),
    ] {
        if let Err(e) = storage.delete_object(&key).await {
            error!(error = ?e, key, "Failed to delete item asset");
        }
    }

    res.status_code(StatusCode::NO_CONTENT);
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path("items")
        .get(list_items_handler)
        .post(create_item_handler)
        .push(
            Router::with_path("<id>")
                .get(get_item_handler)
                .patch(patch_item_handler)
                .delete(delete_item_handler),
        )
}
