//! Boundary to the generative model.
//!
//! Each request flow (weekly plan, single recipe, shopping list) lives in its own
//! file with its prompt, its response schema and its decoder. This module holds the
//! shared plumbing: the error type, request building, fence stripping and retry.

pub mod meal_plan;
pub mod recipe;
pub mod shopping_list;

use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::api_connection::connection::{ApiConnectionError, ChatBackend};
use crate::api_connection::endpoints::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, JsonSchemaDefinition,
    ResponseFormat,
};

const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Error)]
pub enum GatewayFailure {
    #[error(transparent)]
    Api(#[from] ApiConnectionError),
    #[error("malformed model response: {0}")]
    Decode(String),
}

/// A failed generation call. The display text is what the user sees.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Failed to generate meal plan. Please check your API key and try again.")]
    MealPlan(#[source] GatewayFailure),
    #[error("Failed to generate recipe for {meal_name}.")]
    Recipe {
        meal_name: String,
        #[source]
        source: GatewayFailure,
    },
    #[error("Failed to generate shopping list.")]
    ShoppingList(#[source] GatewayFailure),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl GenerationError {
    pub fn failure(&self) -> Option<&GatewayFailure> {
        match self {
            GenerationError::MealPlan(failure)
            | GenerationError::Recipe {
                source: failure, ..
            }
            | GenerationError::ShoppingList(failure) => Some(failure),
            GenerationError::InvalidRequest(_) => None,
        }
    }
}

/// Stateless: holds no cache and no session data, only how to reach the model.
#[derive(Debug, Clone)]
pub struct GenerationGateway<B> {
    backend: B,
    model: String,
    retries: u32,
    retry_delay: Duration,
}

impl<B: ChatBackend> GenerationGateway<B> {
    pub fn new(backend: B, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
            retries: 0,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(
        &self,
        system_prompt: &str,
        user_prompt: String,
        schema: JsonSchemaDefinition,
        max_tokens: u32,
    ) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::system(system_prompt), ChatMessage::user(user_prompt)],
            response_format: Some(ResponseFormat::json_schema(schema)),
            temperature: Some(0.7),
            max_tokens: Some(max_tokens),
        }
    }

    /// Sends the request and decodes the first choice. Only transient transport
    /// errors are retried, and only `retries` times.
    async fn complete<T: DeserializeOwned>(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<T, GatewayFailure> {
        let mut attempt: u32 = 0;
        loop {
            match self.backend.call_chat_completion(request.clone()).await {
                Ok(response) => return decode_content(&response),
                Err(err) if err.is_transient() && attempt < self.retries => {
                    attempt += 1;
                    warn!(attempt, max = self.retries, error = %err, "transient model failure, retrying");
                    tokio::time::sleep(self.retry_delay * attempt).await;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}

pub(crate) fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    if !(trimmed.starts_with("```") && trimmed.ends_with("```") && trimmed.len() >= 6) {
        return trimmed;
    }
    let inner = &trimmed[3..trimmed.len() - 3];
    inner
        .strip_prefix("json")
        .or_else(|| inner.strip_prefix("JSON"))
        .unwrap_or(inner)
        .trim()
}

/// Every shape we request is a JSON object; anything else is a schema mismatch.
pub(crate) fn decode_content<T: DeserializeOwned>(
    response: &ChatCompletionResponse,
) -> Result<T, GatewayFailure> {
    let content = response
        .first_content()
        .map(strip_code_fences)
        .filter(|content| !content.is_empty())
        .ok_or(ApiConnectionError::EmptyResponse)?;
    debug!(content, "raw model content");

    let value: serde_json::Value =
        serde_json::from_str(content).map_err(|e| GatewayFailure::Decode(e.to_string()))?;
    if !value.is_object() {
        return Err(GatewayFailure::Decode(format!(
            "expected a JSON object, got {}",
            json_kind(&value)
        )));
    }
    serde_json::from_value(value).map_err(|e| GatewayFailure::Decode(e.to_string()))
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
