//! Runtime configuration.
//!
//! Values resolve as: CLI flag, then environment (after `.env` is loaded), then default.

use std::env;
use std::path::PathBuf;

use crate::api_connection::endpoints::{OPENROUTER_CHAT_URL, OPENROUTER_MODELS};

pub const API_KEY_ENV_VAR: &str = "OPENROUTER_API_KEY";
pub const MODEL_ENV_VAR: &str = "MEAL_PLANNER_MODEL";
pub const API_URL_ENV_VAR: &str = "MEAL_PLANNER_API_URL";
pub const DATA_DIR_ENV_VAR: &str = "MEAL_PLANNER_DATA_DIR";
pub const RETRIES_ENV_VAR: &str = "MEAL_PLANNER_RETRIES";

const DATA_DIR_NAME: &str = "meal-planner";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub api_key_env_var: String,
    pub api_url: String,
    pub model: String,
    pub data_dir: PathBuf,
    /// Extra attempts after a transient failure. Zero means single-shot.
    pub retries: u32,
}

/// Values given on the command line; `None` falls through to the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub model: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub retries: Option<u32>,
}

impl AppConfig {
    pub fn resolve(overrides: ConfigOverrides) -> Self {
        Self::resolve_with(overrides, |name| env::var(name).ok())
    }

    pub fn resolve_with(
        overrides: ConfigOverrides,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let model = overrides
            .model
            .or_else(|| non_empty(MODEL_ENV_VAR))
            .unwrap_or_else(|| OPENROUTER_MODELS[0].model_name.to_string());

        let data_dir = overrides
            .data_dir
            .or_else(|| non_empty(DATA_DIR_ENV_VAR).map(PathBuf::from))
            .unwrap_or_else(default_data_dir);

        let retries = overrides
            .retries
            .or_else(|| non_empty(RETRIES_ENV_VAR).and_then(|raw| raw.trim().parse().ok()))
            .unwrap_or(0);

        Self {
            api_key_env_var: API_KEY_ENV_VAR.to_string(),
            api_url: non_empty(API_URL_ENV_VAR).unwrap_or_else(|| OPENROUTER_CHAT_URL.to_string()),
            model,
            data_dir,
            retries,
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(DATA_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(".").join(format!(".{}", DATA_DIR_NAME)))
}
