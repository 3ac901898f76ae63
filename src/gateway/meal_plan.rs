use tracing::{error, info};

use super::{GenerationError, GenerationGateway};
use crate::api_connection::connection::ChatBackend;
use crate::api_connection::endpoints::{JsonSchema, JsonSchemaDefinition};
use crate::model::{MealPlan, MealType, UserPreferences, Weekday};

const SYSTEM_PROMPT: &str =
    "You are a creative home-cooking meal planner. Respond only with JSON matching the provided schema.";

pub fn meal_plan_prompt(prefs: &UserPreferences) -> String {
    format!(
        "Generate a 7-day meal plan based on these preferences:
- Diet: {}
- Allergies: {}
- Preferred Cuisine: {}
- Number of People: {}
- Budget: {}

Provide a creative and varied meal for breakfast, lunch, and dinner for each day of the week. Only provide the name of the meal for each slot.",
        prefs.diet,
        prefs.allergies_or_none(),
        prefs.cuisine,
        prefs.people,
        prefs.budget
    )
}

pub fn meal_plan_schema() -> JsonSchemaDefinition {
    let day_schema = || {
        JsonSchema::object(
            MealType::ALL
                .into_iter()
                .map(|meal| (meal.key(), JsonSchema::string())),
        )
    };
    JsonSchemaDefinition {
        name: "weekly_meal_plan".to_string(),
        strict: Some(true),
        schema: JsonSchema::object(Weekday::ALL.into_iter().map(|day| (day.key(), day_schema()))),
    }
}

impl<B: ChatBackend> GenerationGateway<B> {
    /// One week of meal names for the given preferences. Single shot unless retries
    /// were configured; the caller decides whether to resubmit.
    pub async fn request_meal_plan(
        &self,
        prefs: &UserPreferences,
    ) -> Result<MealPlan, GenerationError> {
        if prefs.people < 1 {
            return Err(GenerationError::InvalidRequest(
                "number of people must be at least 1".to_string(),
            ));
        }

        let request = self.build_request(SYSTEM_PROMPT, meal_plan_prompt(prefs), meal_plan_schema(), 2048);
        match self.complete::<MealPlan>(request).await {
            Ok(plan) => {
                info!(diet = %prefs.diet, cuisine = %prefs.cuisine, "generated meal plan");
                Ok(plan)
            }
            Err(failure) => {
                error!(error = %failure, "meal plan generation failed");
                Err(GenerationError::MealPlan(failure))
            }
        }
    }
}
