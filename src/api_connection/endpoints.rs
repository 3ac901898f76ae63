use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const OPENROUTER_CHAT_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct OpenRouterAvailableModel {
    pub model_name: &'static str,
    pub model_source: &'static str,
}

#[derive(Clone, Debug)]
pub enum Provider {
    OpenRouter {
        /// Name of the environment variable holding the key, not the key itself.
        api_key: String,
        api_url: String,
        client: reqwest::Client,
        available_models: Vec<OpenRouterAvailableModel>,
    },
}

/// Models known to honour `json_schema` response formats. The first entry is the default.
pub const OPENROUTER_MODELS: &[OpenRouterAvailableModel] = &[
    OpenRouterAvailableModel {
        model_name: "google/gemini-2.5-flash",
        model_source: "google",
    },
    OpenRouterAvailableModel {
        model_name: "openai/gpt-4o-mini",
        model_source: "openai",
    },
    OpenRouterAvailableModel {
        model_name: "qwen/qwen3-32b",
        model_source: "cerebras",
    },
];

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// `additionalProperties` is either a flag or a schema every extra value must match.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Allowed(bool),
    Schema(Box<JsonSchema>),
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct JsonSchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, JsonSchema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<JsonSchema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "additionalProperties")]
    pub additional_properties: Option<AdditionalProperties>,
}

impl JsonSchema {
    fn leaf(schema_type: &str) -> Self {
        Self {
            schema_type: schema_type.to_string(),
            description: None,
            properties: None,
            items: None,
            required: None,
            additional_properties: None,
        }
    }

    pub fn string() -> Self {
        Self::leaf("string")
    }

    pub fn array(items: JsonSchema) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::leaf("array")
        }
    }

    /// A closed object: every listed property is required and nothing else is allowed.
    pub fn object<I, K>(properties: I) -> Self
    where
        I: IntoIterator<Item = (K, JsonSchema)>,
        K: Into<String>,
    {
        let properties: BTreeMap<String, JsonSchema> = properties
            .into_iter()
            .map(|(name, schema)| (name.into(), schema))
            .collect();
        Self {
            required: Some(properties.keys().cloned().collect()),
            properties: Some(properties),
            additional_properties: Some(AdditionalProperties::Allowed(false)),
            ..Self::leaf("object")
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct JsonSchemaDefinition {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strict: Option<bool>,
    pub schema: JsonSchema,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub format_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_schema: Option<JsonSchemaDefinition>,
}

impl ResponseFormat {
    pub fn json_schema(definition: JsonSchemaDefinition) -> Self {
        Self {
            format_type: "json_schema".to_string(),
            json_schema: Some(definition),
        }
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatCompletionResponseMessage {
    pub role: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatCompletionChoice {
    pub message: ChatCompletionResponseMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
    pub index: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatCompletionUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: Option<u32>,
    pub total_tokens: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatCompletionResponse {
    pub id: String,
    #[serde(default)]
    pub object: Option<String>,
    pub created: u64,
    pub model: String,
    pub choices: Vec<ChatCompletionChoice>,
    #[serde(default)]
    pub usage: Option<ChatCompletionUsage>,
}

impl ChatCompletionResponse {
    /// Content of the first choice, if the model returned any.
    pub fn first_content(&self) -> Option<&str> {
        self.choices.first().map(|choice| choice.message.content.as_str())
    }
}
