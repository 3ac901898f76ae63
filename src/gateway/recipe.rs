use tracing::{error, info};

use super::{GenerationError, GenerationGateway};
use crate::api_connection::connection::ChatBackend;
use crate::api_connection::endpoints::{JsonSchema, JsonSchemaDefinition};
use crate::model::Recipe;

const SYSTEM_PROMPT: &str =
    "You are a recipe writer for home cooks. Respond only with JSON matching the provided schema.";

pub fn recipe_prompt(meal_name: &str) -> String {
    format!(
        "Provide a detailed recipe for \"{}\". Include a brief, appealing description, the total cook time, a list of ingredients with quantities, step-by-step instructions, and estimated nutritional information (calories, protein, carbs, fat).",
        meal_name
    )
}

pub fn recipe_schema() -> JsonSchemaDefinition {
    let ingredient = JsonSchema::object([
        ("name", JsonSchema::string()),
        ("quantity", JsonSchema::string().with_description("e.g., '2 cups'")),
    ]);
    let nutrition = JsonSchema::object(
        ["calories", "protein", "carbs", "fat"]
            .into_iter()
            .map(|field| (field, JsonSchema::string())),
    );

    JsonSchemaDefinition {
        name: "recipe_details".to_string(),
        strict: Some(true),
        schema: JsonSchema::object([
            ("name", JsonSchema::string()),
            ("description", JsonSchema::string()),
            ("cookTime", JsonSchema::string().with_description("e.g., '30 minutes'")),
            ("ingredients", JsonSchema::array(ingredient)),
            ("instructions", JsonSchema::array(JsonSchema::string())),
            ("nutrition", nutrition),
        ]),
    }
}

impl<B: ChatBackend> GenerationGateway<B> {
    pub async fn request_recipe_details(&self, meal_name: &str) -> Result<Recipe, GenerationError> {
        let meal_name = meal_name.trim();
        if meal_name.is_empty() {
            return Err(GenerationError::InvalidRequest(
                "meal name must not be empty".to_string(),
            ));
        }

        let request = self.build_request(SYSTEM_PROMPT, recipe_prompt(meal_name), recipe_schema(), 2048);
        match self.complete::<Recipe>(request).await {
            Ok(mut recipe) => {
                if recipe.name.trim().is_empty() {
                    recipe.name = meal_name.to_string();
                }
                info!(meal = meal_name, steps = recipe.instructions.len(), "generated recipe");
                Ok(recipe)
            }
            Err(failure) => {
                error!(meal = meal_name, error = %failure, "recipe generation failed");
                Err(GenerationError::Recipe {
                    meal_name: meal_name.to_string(),
                    source: failure,
                })
            }
        }
    }
}
