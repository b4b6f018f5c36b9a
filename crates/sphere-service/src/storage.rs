//! Object storage gateway client.
//!
//! Binary assets (item models, thumbnails, user photos) live behind a
//! small HTTP gateway: `PUT`/`DELETE` on `{base_url}/{key}` with an
//! optional bearer token.

use sphere_core::config::StorageConfig;
use sphere_core::constants::{ITEM_OBJECT_PREFIX, ITEM_THUMBNAIL_PREFIX, USER_IMAGE_PREFIX};

use crate::error::{ServiceError, ServiceResult};

#[derive(Debug, Clone)]
pub struct StorageClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl StorageClient {
    /// ## Summary
    /// Builds a client for the configured storage gateway.
    #[must_use]
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        }
    }

    fn request(&self, method: reqwest::Method, key: &str) -> reqwest::RequestBuilder {
        let mut builder = self.http.request(method, format!("{}/{key}", self.base_url));
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    /// ## Summary
    /// Stores an object under `key`.
    ///
    /// ## Errors
    /// Returns an error if the gateway rejects the write.
    #[tracing::instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn put_object(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> ServiceResult<()> {
        let response = self
            .request(reqwest::Method::PUT, key)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await?;

        if response.status().is_success() {
            tracing::debug!(key, "Stored object");
            Ok(())
        } else {
            Err(ServiceError::StorageError(format!(
                "PUT {key} returned {}",
                response.status()
            )))
        }
    }

    /// ## Summary
    /// Deletes the object under `key`. Missing objects are not an error.
    ///
    /// ## Errors
    /// Returns an error if the gateway rejects the delete.
    #[tracing::instrument(skip(self))]
    pub async fn delete_object(&self, key: &str) -> ServiceResult<()> {
        let response = self.request(reqwest::Method::DELETE, key).send().await?;

        if response.status().is_success() || response.status() == reqwest::StatusCode::NOT_FOUND {
            Ok(())
        } else {
            Err(ServiceError::StorageError(format!(
                "DELETE {key} returned {}",
                response.status()
            )))
        }
    }
}

/// Key of a catalog item's 3D model object.
#[must_use]
pub fn item_object_key(item_id: uuid::Uuid, extension: &str) -> String {
    format!("{ITEM_OBJECT_PREFIX}/{item_id}.{extension}")
}

/// Key of a catalog item's thumbnail.
#[must_use]
pub fn item_thumbnail_key(item_id: uuid::Uuid, extension: &str) -> String {
    format!("{ITEM_THUMBNAIL_PREFIX}/{item_id}.{extension}")
}

/// Key of a user-uploaded or generated photo.
#[must_use]
pub fn user_image_key(image_id: uuid::Uuid) -> String {
    format!("{USER_IMAGE_PREFIX}/{image_id}.png")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_keys_follow_bucket_layout() {
        let id = uuid::Uuid::nil();
        assert_eq!(
            item_object_key(id, "glb"),
            "item/object/00000000-0000-0000-0000-000000000000.glb"
        );
        assert_eq!(
            item_thumbnail_key(id, "png"),
            "item/thumbnail/00000000-0000-0000-0000-000000000000.png"
        );
        assert_eq!(
            user_image_key(id),
            "item/user_image/00000000-0000-0000-0000-000000000000.png"
        );
    }
}
