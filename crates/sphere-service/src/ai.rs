//! Clients for the image-generation and prompt-refinement services,
//! plus the per-room generation quota.

use serde::{Deserialize, Serialize};
use sphere_core::config::AiConfig;
use sphere_core::constants::AI_GENERATE_LIMIT;
use sphere_db::db::connection::DbConnection;
use sphere_db::db::query::room as room_query;

use crate::error::{ServiceError, ServiceResult};

const PROMPT_SYSTEM: &str = "You are a prompt generator for image creation. \
Given a theme from the user, output strictly a valid JSON object with two keys: \
\"feedback\" and \"query\". \"feedback\" is a short, concise comment or suggestion. \
\"query\" is a vivid and detailed image generation prompt in English based on the \
context. Do not output any text outside the JSON object.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One turn of the prompt-refinement conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Serialize)]
struct ImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    seed: u32,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    /// Base64-encoded image payload.
    image: String,
}

#[derive(Debug, Serialize)]
struct PromptRequest<'a> {
    model: &'a str,
    messages: Vec<PromptMessage<'a>>,
    response_format: &'a str,
}

#[derive(Debug, Serialize)]
struct PromptMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct PromptResponse {
    content: String,
}

/// The refined prompt and conversational feedback for the user.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GeneratedPrompt {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub feedback: String,
}

#[derive(Debug, Clone)]
pub struct AiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    image_model: String,
    prompt_model: String,
}

impl AiClient {
    #[must_use]
    pub fn new(config: &AiConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            image_model: config.image_model.clone(),
            prompt_model: config.prompt_model.clone(),
        }
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self.http.post(format!("{}{path}", self.base_url));
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        builder
    }

    /// ## Summary
    /// Generates an image for `prompt` and returns it as a data URI.
    ///
    /// ## Errors
    /// Returns an error if the backend rejects the request or responds
    /// with a non-success status.
    #[tracing::instrument(skip(self, prompt))]
    pub async fn create_photo(&self, prompt: &str, seed: u32) -> ServiceResult<String> {
        let response = self
            .post("/images/generations")
            .json(&ImageRequest {
                model: &self.image_model,
                prompt,
                seed,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ServiceError::AiError(format!(
                "image generation returned {}",
                response.status()
            )));
        }

        let body: ImageResponse = response.json().await?;
        Ok(format!("data:image/jpeg;charset=utf-8;base64,{}", body.image))
    }

    /// ## Summary
    /// Refines a photo prompt from a theme and the conversation so far.
    ///
    /// ## Errors
    /// Returns an error if the backend fails or returns malformed JSON.
    #[tracing::instrument(skip(self, theme, history), fields(history_len = history.len()))]
    pub async fn create_prompt(
        &self,
        theme: &str,
        history: &[ChatMessage],
    ) -> ServiceResult<GeneratedPrompt> {
        let theme_line = format!("Theme: {theme}");
        let mut messages = vec![PromptMessage {
            role: "system",
            content: PROMPT_SYSTEM,
        }];
        messages.extend(history.iter().map(|msg| PromptMessage {
            role: match msg.role {
                ChatRole::User => "user",
                ChatRole::Assistant => "assistant",
            },
            content: &msg.content,
        }));
        messages.push(PromptMessage {
            role: "user",
            content: &theme_line,
        });

        let response = self
            .post("/chat/completions")
            .json(&PromptRequest {
                model: &self.prompt_model,
                messages,
                response_format: "json_object",
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ServiceError::AiError(format!(
                "prompt generation returned {}",
                response.status()
            )));
        }

        let body: PromptResponse = response.json().await?;
        serde_json::from_str(body.content.trim())
            .map_err(|e| ServiceError::AiError(format!("malformed prompt payload: {e}")))
    }
}

/// ## Summary
/// Checks that the room exists and has generation quota left.
///
/// ## Errors
/// `NotFound` for an unknown room, `GenerationLimitReached` once the
/// room has exhausted its quota, or any query error.
pub async fn ensure_quota(conn: &mut DbConnection<'_>, room_id: uuid::Uuid) -> ServiceResult<()> {
    let room = room_query::get(conn, room_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("room {room_id}")))?;

    if room.generate_count >= AI_GENERATE_LIMIT {
        return Err(ServiceError::GenerationLimitReached(room_id));
    }

    Ok(())
}

/// ## Summary
/// Counts a successful generation against the room's quota.
///
/// ## Errors
/// Returns an error if the update fails.
pub async fn record_generation(
    conn: &mut DbConnection<'_>,
    room_id: uuid::Uuid,
) -> ServiceResult<()> {
    room_query::increment_generate_count(conn, room_id).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_prompt_parses_model_output() {
        let parsed: GeneratedPrompt = serde_json::from_str(
            r#"{"feedback": "Try naming a light source.", "query": "A snowy street at dusk"}"#,
        )
        .unwrap();
        assert_eq!(parsed.query, "A snowy street at dusk");
        assert_eq!(parsed.feedback, "Try naming a light source.");
    }

    #[test]
    fn test_generated_prompt_tolerates_missing_keys() {
        let parsed: GeneratedPrompt = serde_json::from_str("{}").unwrap();
        assert!(parsed.query.is_empty());
        assert!(parsed.feedback.is_empty());
    }
}
