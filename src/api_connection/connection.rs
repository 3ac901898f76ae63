use async_trait::async_trait;
use dotenv::dotenv;
use reqwest::Client;
use std::env;
use thiserror::Error;
use tracing::debug;

use super::endpoints::{
    ChatCompletionRequest, ChatCompletionResponse, OpenRouterAvailableModel, Provider,
    OPENROUTER_CHAT_URL, OPENROUTER_MODELS,
};

#[derive(Debug, Error)]
pub enum ApiConnectionError {
    #[error("API key not found in environment: {0}")]
    MissingApiKey(String),
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("API error {status}: {error_body}")]
    ApiError {
        status: reqwest::StatusCode,
        error_body: String,
    },
    #[error("API returned no usable content")]
    EmptyResponse,
}

impl ApiConnectionError {
    /// Whether a second attempt could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiConnectionError::NetworkError(_) => true,
            ApiConnectionError::ApiError { status, .. } => {
                status.is_server_error() || *status == reqwest::StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }
}

/// Anything that can answer a chat-completion request.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn call_chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ApiConnectionError>;
}

impl Provider {
    pub fn openrouter(api_key_env_var_name: &str) -> Self {
        Self::openrouter_with_url(api_key_env_var_name, OPENROUTER_CHAT_URL)
    }

    pub fn openrouter_with_url(api_key_env_var_name: &str, api_url: &str) -> Self {
        dotenv().ok();
        Self::OpenRouter {
            api_key: api_key_env_var_name.to_string(),
            api_url: api_url.to_string(),
            client: Client::new(),
            available_models: OPENROUTER_MODELS.to_vec(),
        }
    }

    pub fn get_available_models(&self) -> Vec<OpenRouterAvailableModel> {
        match self {
            Provider::OpenRouter {
                available_models, ..
            } => available_models.clone(),
        }
    }
}

#[async_trait]
impl ChatBackend for Provider {
    async fn call_chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ApiConnectionError> {
        match self {
            Provider::OpenRouter {
                api_key: api_key_env_var_name,
                api_url,
                client,
                ..
            } => {
                let actual_api_key = env::var(api_key_env_var_name)
                    .map_err(|_| ApiConnectionError::MissingApiKey(api_key_env_var_name.clone()))?;

                let site_url =
                    env::var("SITE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());
                let app_name = env::var("APP_NAME").unwrap_or_else(|_| "MealPlanner".to_string());

                debug!(model = %request.model, url = %api_url, "sending chat completion");
                let response = client
                    .post(api_url)
                    .bearer_auth(actual_api_key)
                    .header("Content-Type", "application/json")
                    .header("HTTP-Referer", site_url)
                    .header("X-Title", app_name)
                    .json(&request)
                    .send()
                    .await?;

                if response.status().is_success() {
                    let chat_response = response.json::<ChatCompletionResponse>().await?;
                    Ok(chat_response)
                } else {
                    let status = response.status();
                    let error_body = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Failed to read error body".to_string());
                    Err(ApiConnectionError::ApiError { status, error_body })
                }
            }
        }
    }
}
