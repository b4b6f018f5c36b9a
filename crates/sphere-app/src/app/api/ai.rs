//! AI routes: photo generation (quota-gated per room) and prompt
//! refinement.

use rand::Rng;
use salvo::{Depot, Request, Response, Router, handler, http::StatusCode, writing::Json};
use serde::{Deserialize, Serialize};
use sphere_service::ai::{self, ChatMessage};
use tracing::error;

use crate::app::api::util::{ErrorResponse, render_service_error};
use crate::clients::get_ai_from_depot;
use crate::db_handler::get_db_from_depot;

/// ## Summary
/// Create photo request payload
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePhotoRequest {
    pub prompt: String,
    pub room_id: uuid::Uuid,
}

/// ## Summary
/// Create photo response payload
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePhotoResponse {
    /// Base64 data URI of the generated image.
    pub image_data: String,
}

/// ## Summary
/// Create prompt request payload
#[derive(Debug, Deserialize)]
pub struct CreatePromptRequest {
    pub prompt: String,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
}

/// ## Summary
/// Create prompt response payload
#[derive(Debug, Serialize)]
pub struct CreatePromptResponse {
    pub prompt: String,
    pub feedback: String,
}

/// ## Summary
/// POST /ai/createPhoto - Generate a photo for a photo frame.
///
/// ## Side Effects
/// Consumes one of the room's generation quota.
///
/// ## Errors
/// Returns HTTP 403 when the room's quota is exhausted
/// Returns HTTP 404 if the room does not exist
/// Returns HTTP 500 when generation fails
#[handler]
async fn create_photo_handler(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let photo_req: CreatePhotoRequest = match req.parse_json().await {
        Ok(r) => r,
        Err(e) => {
            error!(error = ?e, "Failed to parse create photo request");
            ErrorResponse::render(res, StatusCode::BAD_REQUEST, "Invalid request body");
            return;
        }
    };

    let ai_client = match get_ai_from_depot(depot) {
        Ok(c) => c,
        Err(e) => {
            error!(error = ?e, "Failed to get AI client");
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

    if let Err(e) = ai::ensure_quota(&mut conn, photo_req.room_id).await {
        render_service_error(res, &e);
        return;
    }

    let seed = rand::thread_rng().gen_range(0..10);
    match ai_client.create_photo(&photo_req.prompt, seed).await {
        Ok(image_data) => {
            // A failed generation must not consume quota.
            if let Err(e) = ai::record_generation(&mut conn, photo_req.room_id).await {
                error!(error = ?e, "Failed to record generation");
            }
            res.status_code(StatusCode::CREATED);
            res.render(Json(CreatePhotoResponse { image_data }));
        }
        Err(e) => {
            error!(error = ?e, "Photo generation failed");
            ErrorResponse::render(
                res,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to create photo",
            );
        }
    }
}

/// ## Summary
/// POST /ai/createPrompt - Refine an image prompt from a theme and the
/// conversation so far.
///
/// ## Errors
/// Returns HTTP 500 when the backend fails
#[handler]
async fn create_prompt_handler(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let prompt_req: CreatePromptRequest = match req.parse_json().await {
        Ok(r) => r,
        Err(e) => {
            error!(error = ?e, "Failed to parse create prompt request");
            ErrorResponse::render(res, StatusCode::BAD_REQUEST, "Invalid request body");
            return;
        }
    };

    let ai_client = match get_ai_from_depot(depot) {
        Ok(c) => c,
        Err(e) => {
            error!(error = ?e, "Failed to get AI client");
            ErrorResponse::render(res, StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
            return;
        }
    };

    match ai_client
        .create_prompt(&prompt_req.prompt, &prompt_req.history)
        .await
    {
        Ok(generated) => {
            tracing::debug!(prompt = %generated.query, "Prompt generated");
            res.render(Json(CreatePromptResponse {
                prompt: generated.query,
                feedback: generated.feedback,
            }));
        }
        Err(e) => {
            error!(error = ?e, "Prompt generation failed");
            ErrorResponse::render(
                res,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to create prompt",
            );
        }
    }
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path("ai")
        .push(Router::with_path("createPhoto").post(create_photo_handler))
        .push(Router::with_path("createPrompt").post(create_prompt_handler))
}
