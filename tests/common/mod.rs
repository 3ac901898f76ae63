#![allow(dead_code)]

use async_trait::async_trait;
use meal_planner::api_connection::connection::{ApiConnectionError, ChatBackend};
use meal_planner::api_connection::endpoints::{
    ChatCompletionChoice, ChatCompletionRequest, ChatCompletionResponse,
    ChatCompletionResponseMessage,
};
use meal_planner::gateway::GenerationGateway;
use meal_planner::model::{MealPlan, MealType, Weekday};
use std::collections::VecDeque;
use std::sync::Mutex;

pub const TEST_MODEL: &str = "test/model";

/// Answers chat completions from a queue and records every request it sees.
#[derive(Default)]
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<Result<String, ApiConnectionError>>>,
    requests: Mutex<Vec<ChatCompletionRequest>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, content: impl Into<String>) -> Self {
        self.replies.lock().unwrap().push_back(Ok(content.into()));
        self
    }

    pub fn fail(self, error: ApiConnectionError) -> Self {
        self.replies.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn fail_status(self, status: reqwest::StatusCode) -> Self {
        self.fail(ApiConnectionError::ApiError {
            status,
            error_body: "scripted failure".to_string(),
        })
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ChatCompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_user_prompt(&self) -> String {
        self.requests()
            .last()
            .and_then(|request| request.messages.iter().find(|m| m.role == "user").cloned())
            .map(|message| message.content)
            .unwrap_or_default()
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn call_chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ApiConnectionError> {
        self.requests.lock().unwrap().push(request);
        let next = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected chat completion call: no scripted reply left");
        next.map(|content| ChatCompletionResponse {
            id: "gen-scripted".to_string(),
            object: Some("chat.completion".to_string()),
            created: 1_700_000_000,
            model: TEST_MODEL.to_string(),
            choices: vec![ChatCompletionChoice {
                message: ChatCompletionResponseMessage {
                    role: "assistant".to_string(),
                    content,
                },
                finish_reason: Some("stop".to_string()),
                index: 0,
            }],
            usage: None,
        })
    }
}

pub fn gateway(backend: ScriptedBackend) -> GenerationGateway<ScriptedBackend> {
    GenerationGateway::new(backend, TEST_MODEL)
}

/// Names each slot "<Day> <meal>", so all 21 are distinct.
pub fn distinct_plan_json() -> String {
    let days: Vec<String> = Weekday::ALL
        .into_iter()
        .map(|day| {
            let meals: Vec<String> = MealType::ALL
                .into_iter()
                .map(|meal| format!("\"{}\": \"{} {}\"", meal.key(), day.label(), meal.key()))
                .collect();
            format!("\"{}\": {{{}}}", day.key(), meals.join(", "))
        })
        .collect();
    format!("{{{}}}", days.join(", "))
}

/// Same three meals every day.
pub fn repetitive_plan_json() -> String {
    let days: Vec<String> = Weekday::ALL
        .into_iter()
        .map(|day| {
            format!(
                "\"{}\": {{\"breakfast\": \"Tofu Scramble\", \"lunch\": \"Minestrone\", \"dinner\": \"Pasta e Fagioli\"}}",
                day.key()
            )
        })
        .collect();
    format!("{{{}}}", days.join(", "))
}

pub fn recipe_json(name: &str) -> String {
    format!(
        r#"{{
            "name": "{}",
            "description": "A weeknight favourite.",
            "cookTime": "30 minutes",
            "ingredients": [{{"name": "Olive oil", "quantity": "2 tbsp"}}, {{"name": "Garlic", "quantity": "3 cloves"}}],
            "instructions": ["Prep everything.", "Cook it.", "Serve."],
            "nutrition": {{"calories": "450 kcal", "protein": "18g", "carbs": "60g", "fat": "14g"}}
        }}"#,
        name
    )
}

pub const SHOPPING_LIST_JSON: &str = r#"{
    "Produce": ["1 onion", "6 cloves garlic"],
    "Pantry": ["500g pasta", "2 cans cannellini beans"],
    "Spices": ["1 tsp oregano"]
}"#;

pub fn plan_from_json(json: &str) -> MealPlan {
    serde_json::from_str(json).unwrap()
}
