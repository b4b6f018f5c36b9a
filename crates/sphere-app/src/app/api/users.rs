//! User routes.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use salvo::{Depot, Request, Response, Router, handler, http::StatusCode, writing::Json};
use serde::{Deserialize, Serialize};
use sphere_db::db::query::user as user_query;
use sphere_db::db::schema;
use sphere_db::model::user::{NewUser, User};
use tracing::error;

use crate::app::api::util::{ErrorResponse, uuid_param};
use crate::db_handler::get_db_from_depot;

/// ## Summary
/// Create user request payload. Clients bring their own stable id.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub id: uuid::Uuid,
    pub name: String,
}

/// ## Summary
/// User response payload
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub name: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_string(),
            created_at: user.created_at,
            name: user.name,
        }
    }
}

/// ## Summary
/// POST /users - Create a user.
///
/// ## Errors
/// Returns HTTP 400 for a malformed body or empty name
/// Returns HTTP 500 if database operations fail
#[handler]
async fn create_user_handler(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    tracing::debug!("Processing create user request");

    let create_req: CreateUserRequest = match req.parse_json().await {
        Ok(r) => r,
        Err(e) => {
            error!(error = ?e, "Failed to parse create user request");
            ErrorResponse::render(res, StatusCode::BAD_REQUEST, "Invalid request body");
            return;
        }
    };

    if create_req.name.is_empty() {
        ErrorResponse::render(res, StatusCode::BAD_REQUEST, "Name is required");
        return;
    }

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

    let new_user = NewUser {
        id: create_req.id,
        name: &create_req.name,
    };

    match diesel::insert_into(schema::app_user::table)
        .values(&new_user)
        .returning(User::as_returning())
        .get_result::<User>(&mut conn)
        .await
    {
        Ok(user) => {
            tracing::info!(user_id = %user.id, "User created");
            res.status_code(StatusCode::CREATED);
            res.render(Json(UserResponse::from(user)));
        }
        Err(e) => {
            error!(error = ?e, "Failed to create user");
            ErrorResponse::render(res, StatusCode::INTERNAL_SERVER_ERROR, "Failed to create user");
        }
    }
}

/// ## Summary
/// GET /`users/{id}` - Fetch a user.
///
/// ## Errors
/// Returns HTTP 404 if the user does not exist
#[handler]
async fn get_user_handler(req: &mut Request, depot: &mut Depot, res: &mut Response) {
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

    match user_query::get(&mut conn, id).await {
        Ok(Some(user)) => res.render(Json(UserResponse::from(user))),
        Ok(None) => ErrorResponse::render(res, StatusCode::NOT_FOUND, "User not found"),
        Err(e) => {
            error!(error = ?e, "Failed to query user");
            ErrorResponse::render(res, StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
        }
    }
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path("users")
        .post(create_user_handler)
        .push(Router::with_path("<id>").get(get_user_handler))
}
