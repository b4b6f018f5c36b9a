//! Calendar slot routes: the room/inventory/placed views and the
//! open/place/return write surface.

use chrono::{DateTime, Utc};
use salvo::{Depot, Request, Response, Router, handler, http::StatusCode, writing::Json};
use serde::{Deserialize, Serialize};
use sphere_db::db::enums::ItemType;
use sphere_db::model::calendar_item::{CalendarItem, CalendarItemWithItem};
use sphere_service::acquisition;
use sphere_service::calendar_item as slot_service;
use sphere_service::calendar_item::{CreateSlot, SlotPatch};
use sphere_service::invalidation::Invalidation;
use tracing::error;

use crate::app::api::util::{ErrorResponse, double_option, render_service_error, uuid_param};
use crate::clients::get_storage_from_depot;
use crate::db_handler::get_db_from_depot;

/// ## Summary
/// Calendar slot response payload, joined with catalog fields.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarItemResponse {
    pub id: String,
    pub room_id: String,
    pub user_id: String,
    pub item_id: String,
    pub created_at: DateTime<Utc>,
    pub open_date: DateTime<Utc>,
    pub is_opened: bool,
    pub position: Option<Vec<f64>>,
    pub rotation: Option<Vec<f64>>,
    pub image_id: Option<String>,
    pub bundle_id: Option<String>,
    pub item: SlotItem,
}

/// Catalog fields carried on each slot.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotItem {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
}

impl From<CalendarItemWithItem> for CalendarItemResponse {
    fn from(row: CalendarItemWithItem) -> Self {
        let CalendarItemWithItem {
            calendar_item,
            item,
        } = row;
        Self {
            id: calendar_item.id.to_string(),
            room_id: calendar_item.room_id.to_string(),
            user_id: calendar_item.user_id.to_string(),
            item_id: calendar_item.item_id.to_string(),
            created_at: calendar_item.created_at,
            open_date: calendar_item.open_date,
            is_opened: calendar_item.is_opened,
            position: calendar_item.position,
            rotation: calendar_item.rotation,
            image_id: calendar_item.image_id.map(|id| id.to_string()),
            bundle_id: calendar_item.bundle_id.map(|id| id.to_string()),
            item: SlotItem {
                id: item.id.to_string(),
                name: item.name,
                description: item.description,
                item_type: item.item_type,
            },
        }
    }
}

/// Bare slot response for writes that do not need the catalog join.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BareCalendarItemResponse {
    pub id: String,
    pub room_id: String,
    pub open_date: DateTime<Utc>,
    pub is_opened: bool,
    pub position: Option<Vec<f64>>,
    pub rotation: Option<Vec<f64>>,
    pub image_id: Option<String>,
}

impl From<CalendarItem> for BareCalendarItemResponse {
    fn from(row: CalendarItem) -> Self {
        Self {
            id: row.id.to_string(),
            room_id: row.room_id.to_string(),
            open_date: row.open_date,
            is_opened: row.is_opened,
            position: row.position,
            rotation: row.rotation,
            image_id: row.image_id.map(|id| id.to_string()),
        }
    }
}

/// ## Summary
/// Create slot request payload
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCalendarItemRequest {
    pub edit_id: uuid::Uuid,
    pub calendar_item: CreateCalendarItemBody,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCalendarItemBody {
    pub user_id: uuid::Uuid,
    pub item_id: uuid::Uuid,
    pub open_date: DateTime<Utc>,
    pub image_id: Option<uuid::Uuid>,
}

/// ## Summary
/// Patch slot request payload. Placement fields need no edit token;
/// editorial fields do. Explicit `null` clears a field.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchCalendarItemRequest {
    pub edit_id: Option<uuid::Uuid>,
    pub calendar_item: PatchCalendarItemBody,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchCalendarItemBody {
    pub open_date: Option<DateTime<Utc>>,
    pub is_opened: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub position: Option<Option<[f64; 3]>>,
    #[serde(default, deserialize_with = "double_option")]
    pub rotation: Option<Option<[f64; 3]>>,
    #[serde(default, deserialize_with = "double_option")]
    pub image_id: Option<Option<uuid::Uuid>>,
}

/// Marker telling the client which room views to refetch.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteResponse {
    pub calendar_item: BareCalendarItemResponse,
    pub invalidate: Invalidation,
}

enum SlotView {
    All,
    Inventory,
    Placed,
}

async fn render_slot_view(view: SlotView, req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let Some(room_id) = uuid_param(req, res, "room_id") else {
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

    let rows = match view {
        SlotView::All => slot_service::list(&mut conn, room_id).await,
        SlotView::Inventory => slot_service::inventory(&mut conn, room_id).await,
        SlotView::Placed => slot_service::placed(&mut conn, room_id).await,
    };

    match rows {
        Ok(rows) => {
            let body: Vec<CalendarItemResponse> =
                rows.into_iter().map(CalendarItemResponse::from).collect();
            res.render(Json(body));
        }
        Err(e) => render_service_error(res, &e),
    }
}

/// ## Summary
/// GET /`calendarItems/{roomId}/calendarItems` - Every slot of a room.
#[handler]
async fn list_handler(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    render_slot_view(SlotView::All, req, depot, res).await;
}

/// ## Summary
/// GET /`calendarItems/{roomId}/calendarItems/inventory` - Opened,
/// unplaced slots.
#[handler]
async fn inventory_handler(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    render_slot_view(SlotView::Inventory, req, depot, res).await;
}

/// ## Summary
/// GET /`calendarItems/{roomId}/calendarItems/room` - Slots placed in
/// the 3D scene.
#[handler]
async fn placed_handler(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    render_slot_view(SlotView::Placed, req, depot, res).await;
}

/// ## Summary
/// POST /`calendarItems/{roomId}/calendarItems` - Schedule a slot.
///
/// ## Errors
/// Returns HTTP 403 for a wrong edit token
/// Returns HTTP 404 if the room does not exist
#[handler]
async fn create_handler(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let Some(room_id) = uuid_param(req, res, "room_id") else {
        return;
    };

    let create_req: CreateCalendarItemRequest = match req.parse_json().await {
        Ok(r) => r,
        Err(e) => {
            error!(error = ?e, "Failed to parse create calendar item request");
            ErrorResponse::render(res, StatusCode::BAD_REQUEST, "Invalid request body");
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

    let input = CreateSlot {
        user_id: create_req.calendar_item.user_id,
        item_id: create_req.calendar_item.item_id,
        open_date: create_req.calendar_item.open_date,
        image_id: create_req.calendar_item.image_id,
    };

    match slot_service::create(&mut conn, room_id, create_req.edit_id, &input).await {
        Ok(row) => {
            tracing::info!(room_id = %room_id, id = %row.id, "Calendar item created");
            res.status_code(StatusCode::CREATED);
            res.render(Json(BareCalendarItemResponse::from(row)));
        }
        Err(e) => render_service_error(res, &e),
    }
}

/// ## Summary
/// PATCH /`calendarItems/{roomId}/calendarItems/{id}` - The write
/// surface for open, place, return-to-inventory, and edit-time
/// changes.
///
/// ## Errors
/// Returns HTTP 400 for invariant-violating patches
/// Returns HTTP 403 when editorial fields lack the edit token
/// Returns HTTP 409 when opening a slot fails the openability check
#[handler]
async fn patch_handler(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let Some(room_id) = uuid_param(req, res, "room_id") else {
        return;
    };
    let Some(id) = uuid_param(req, res, "id") else {
        return;
    };

    let patch_req: PatchCalendarItemRequest = match req.parse_json().await {
        Ok(r) => r,
        Err(e) => {
            error!(error = ?e, "Failed to parse patch calendar item request");
            ErrorResponse::render(res, StatusCode::BAD_REQUEST, "Invalid request body");
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

    let patch = SlotPatch {
        open_date: patch_req.calendar_item.open_date,
        is_opened: patch_req.calendar_item.is_opened,
        position: patch_req.calendar_item.position,
        rotation: patch_req.calendar_item.rotation,
        image_id: patch_req.calendar_item.image_id,
    };

    match slot_service::patch(
        &mut conn,
        room_id,
        id,
        &patch,
        patch_req.edit_id,
        Utc::now(),
    )
    .await
    {
        Ok((row, invalidate)) => {
            res.render(Json(WriteResponse {
                calendar_item: BareCalendarItemResponse::from(row),
                invalidate,
            }));
        }
        Err(e) => render_service_error(res, &e),
    }
}

/// ## Summary
/// POST /`calendarItems/{roomId}/calendarItems/{id}/returnToInventory` -
/// Return a placed item to the inventory. A snowdome part takes every
/// part standing at the same spot back with it, atomically.
///
/// ## Errors
/// Returns HTTP 404 if the slot does not exist
#[handler]
async fn return_to_inventory_handler(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let Some(room_id) = uuid_param(req, res, "room_id") else {
        return;
    };
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

    let snapshot = match acquisition::load_snapshot(&mut conn, room_id).await {
        Ok(s) => s,
        Err(e) => {
            render_service_error(res, &e);
            return;
        }
    };

    match acquisition::return_bundle_to_inventory(&mut conn, &snapshot, id).await {
        Ok(invalidate) => res.render(Json(invalidate)),
        Err(e) => render_service_error(res, &e),
    }
}

/// ## Summary
/// DELETE /`calendarItems/{roomId}/calendarItems/{id}` - Remove a slot.
///
/// ## Errors
/// Returns HTTP 403 for a wrong edit token
/// Returns HTTP 404 if the slot does not exist
#[handler]
async fn delete_handler(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct DeleteCalendarItemRequest {
        edit_id: uuid::Uuid,
    }

    let Some(room_id) = uuid_param(req, res, "room_id") else {
        return;
    };
    let Some(id) = uuid_param(req, res, "id") else {
        return;
    };

    let delete_req: DeleteCalendarItemRequest = match req.parse_json().await {
        Ok(r) => r,
        Err(e) => {
            error!(error = ?e, "Failed to parse delete calendar item request");
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

    match slot_service::delete(&mut conn, &storage, room_id, id, delete_req.edit_id).await {
        Ok(_invalidate) => {
            res.status_code(StatusCode::NO_CONTENT);
        }
        Err(e) => render_service_error(res, &e),
    }
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path("calendarItems").push(
        Router::with_path("<room_id>/calendarItems")
            .get(list_handler)
            .post(create_handler)
            .push(Router::with_path("inventory").get(inventory_handler))
            .push(Router::with_path("room").get(placed_handler))
            .push(
                Router::with_path("<id>")
                    .patch(patch_handler)
                    .delete(delete_handler)
                    .push(
                        Router::with_path("returnToInventory").post(return_to_inventory_handler),
                    ),
            ),
    )
}
