//! Room routes: create (with the snowdome track), read, update, delete.

use chrono::{DateTime, Utc};
use salvo::{Depot, Request, Response, Router, handler, http::StatusCode, writing::Json};
use serde::{Deserialize, Serialize};
use sphere_db::model::room::{Room, UpdateRoom};
use sphere_service::room as room_service;
use tracing::error;

use crate::app::api::util::{ErrorResponse, double_option, render_service_error, uuid_param};
use crate::clients::get_storage_from_depot;
use crate::db_handler::get_db_from_depot;

/// ## Summary
/// Create room request payload
#[derive(Debug, Deserialize)]
pub struct CreateRoomRequest {
    pub owner_id: uuid::Uuid,
    pub item_get_time: Option<DateTime<Utc>>,
    pub password: Option<String>,
    pub is_anonymous: bool,
    pub start_at: DateTime<Utc>,
}

/// ## Summary
/// Create room response: the room id plus the edit capability token,
/// shown to the creator exactly once.
#[derive(Debug, Serialize)]
pub struct CreateRoomResponse {
    pub id: String,
    pub edit_id: String,
}

/// ## Summary
/// Room response payload. The edit token never leaves through reads.
#[derive(Debug, Serialize)]
pub struct RoomResponse {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub owner_id: String,
    pub password: Option<String>,
    pub is_anonymous: bool,
    pub start_at: DateTime<Utc>,
    pub item_get_time: Option<DateTime<Utc>>,
    pub generate_count: i32,
    pub snow_dome_parts_last_date: Option<DateTime<Utc>>,
}

impl From<Room> for RoomResponse {
    fn from(room: Room) -> Self {
        Self {
            id: room.id.to_string(),
            created_at: room.created_at,
            owner_id: room.owner_id.to_string(),
            password: room.password,
            is_anonymous: room.is_anonymous,
            start_at: room.start_at,
            item_get_time: room.item_get_time,
            generate_count: room.generate_count,
            snow_dome_parts_last_date: room.snow_dome_parts_last_date,
        }
    }
}

/// ## Summary
/// Update room request payload. `start_at` is immutable and absent.
#[derive(Debug, Deserialize)]
pub struct UpdateRoomRequest {
    pub edit_id: uuid::Uuid,
    #[serde(default, deserialize_with = "double_option")]
    pub item_get_time: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    pub password: Option<Option<String>>,
    pub is_anonymous: Option<bool>,
}

/// ## Summary
/// POST /rooms - Create a room and its snowdome track.
///
/// ## Side Effects
/// - Creates a `room` row
/// - Creates four snowdome `calendar_item` rows on distinct random days
///
/// ## Errors
/// Returns HTTP 400 for a malformed body
/// Returns HTTP 500 if database operations fail
#[handler]
async fn create_room_handler(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    tracing::debug!("Processing create room request");

    let create_req: CreateRoomRequest = match req.parse_json().await {
        Ok(r) => r,
        Err(e) => {
            error!(error = ?e, "Failed to parse create room request");
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

    let input = room_service::CreateRoom {
        owner_id: create_req.owner_id,
        password: create_req.password.as_deref(),
        is_anonymous: create_req.is_anonymous,
        start_at: create_req.start_at,
        item_get_time: create_req.item_get_time,
    };

    let mut rng = <rand::rngs::StdRng as rand::SeedableRng>::from_entropy();
    match room_service::create_room(&mut conn, &input, &mut rng).await {
        Ok(room) => {
            tracing::info!(room_id = %room.id, "Room created");
            res.status_code(StatusCode::CREATED);
            res.render(Json(CreateRoomResponse {
                id: room.id.to_string(),
                edit_id: room.edit_id.to_string(),
            }));
        }
        Err(e) => render_service_error(res, &e),
    }
}

/// ## Summary
/// GET /`rooms/{id}` - Fetch a room.
///
/// ## Errors
/// Returns HTTP 404 if the room does not exist
#[handler]
async fn get_room_handler(req: &mut Request, depot: &mut Depot, res: &mut Response) {
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

    match room_service::get_room(&mut conn, id).await {
        Ok(room) => res.render(Json(RoomResponse::from(room))),
        Err(e) => render_service_error(res, &e),
    }
}

/// ## Summary
/// PATCH /`rooms/{id}` - Update room settings.
///
/// ## Errors
/// Returns HTTP 403 for a wrong edit token
/// Returns HTTP 404 if the room does not exist
#[handler]
async fn patch_room_handler(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let Some(id) = uuid_param(req, res, "id") else {
        return;
    };

    let update_req: UpdateRoomRequest = match req.parse_json().await {
        Ok(r) => r,
        Err(e) => {
            error!(error = ?e, "Failed to parse update room request");
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

    let changes = UpdateRoom {
        password: update_req
            .password
            .as_ref()
            .map(|opt| opt.as_deref()),
        is_anonymous: update_req.is_anonymous,
        item_get_time: update_req.item_get_time,
    };

    match room_service::update_room(&mut conn, id, update_req.edit_id, &changes).await {
        Ok(room) => res.render(Json(RoomResponse::from(room))),
        Err(e) => render_service_error(res, &e),
    }
}

/// ## Summary
/// DELETE /`rooms/{id}` - Delete a room, its slots, and stored photos.
///
/// ## Errors
/// Returns HTTP 403 for a wrong edit token
/// Returns HTTP 404 if the room does not exist
#[handler]
async fn delete_room_handler(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    #[derive(Debug, Deserialize)]
    struct DeleteRoomRequest {
        edit_id: uuid::Uuid,
    }

    let Some(id) = uuid_param(req, res, "id") else {
        return;
    };

    let delete_req: DeleteRoomRequest = match req.parse_json().await {
        Ok(r) => r,
        Err(e) => {
            error!(error = ?e, "Failed to parse delete room request");
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

    match room_service::delete_room(&mut conn, &storage, id, delete_req.edit_id).await {
        Ok(()) => {
            res.status_code(StatusCode::NO_CONTENT);
        }
        Err(e) => render_service_error(res, &e),
    }
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path("rooms")
        .post(create_room_handler)
        .push(
            Router::with_path("<id>")
                .get(get_room_handler)
                .patch(patch_room_handler)
                .delete(delete_room_handler),
        )
}
