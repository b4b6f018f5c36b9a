//! Shared helpers for the API handlers.

use salvo::http::StatusCode;
use salvo::writing::Json;
use salvo::{Request, Response};
use serde::{Deserialize, Deserializer, Serialize};
use sphere_service::error::ServiceError;

/// ## Summary
/// Error response payload
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn render(res: &mut Response, status: StatusCode, message: impl Into<String>) {
        res.status_code(status);
        res.render(Json(Self {
            error: message.into(),
        }));
    }
}

/// ## Summary
/// Maps a service error onto an HTTP response.
pub fn render_service_error(res: &mut Response, error: &ServiceError) {
    let status = match error {
        ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::EditTokenMismatch(_) | ServiceError::GenerationLimitReached(_) => {
            StatusCode::FORBIDDEN
        }
        ServiceError::NotOpenable { .. } => StatusCode::CONFLICT,
        ServiceError::ValidationError(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(error = ?error, "Request failed");
        ErrorResponse::render(res, status, "Internal server error");
    } else {
        ErrorResponse::render(res, status, error.to_string());
    }
}

/// ## Summary
/// Reads a UUID path parameter, rendering 400 when absent or invalid.
pub fn uuid_param(req: &Request, res: &mut Response, name: &str) -> Option<uuid::Uuid> {
    let Some(raw) = req.param::<String>(name) else {
        ErrorResponse::render(res, StatusCode::BAD_REQUEST, format!("{name} required"));
        return None;
    };
    match uuid::Uuid::parse_str(&raw) {
        Ok(id) => Some(id),
        Err(_) => {
            ErrorResponse::render(res, StatusCode::BAD_REQUEST, format!("Invalid {name}"));
            None
        }
    }
}

/// ## Summary
/// Deserializer for fields where an explicit `null` must be told apart
/// from an absent key: absent → `None`, `null` → `Some(None)`, a value
/// → `Some(Some(v))`. Pair with `#[serde(default)]`.
///
/// ## Errors
/// Propagates deserialization errors for present, malformed values.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "double_option")]
        position: Option<Option<Vec<f64>>>,
    }

    #[test]
    fn test_double_option_distinguishes_null_from_absent() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.position, None);

        let null: Patch = serde_json::from_str(r#"{"position": null}"#).unwrap();
        assert_eq!(null.position, Some(None));

        let value: Patch = serde_json::from_str(r#"{"position": [1.0, 2.0, 3.0]}"#).unwrap();
        assert_eq!(value.position, Some(Some(vec![1.0, 2.0, 3.0])));
    }
}
