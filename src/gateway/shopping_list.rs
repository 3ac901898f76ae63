use std::collections::BTreeMap;
use tracing::{error, info};

use super::{GatewayFailure, GenerationError, GenerationGateway};
use crate::api_connection::connection::ChatBackend;
use crate::api_connection::endpoints::{AdditionalProperties, JsonSchema, JsonSchemaDefinition};
use crate::model::{GroceryCategory, MealPlan, ShoppingList};

const SYSTEM_PROMPT: &str =
    "You are a grocery assistant that consolidates ingredients. Respond only with JSON matching the provided schema.";

/// `meals` should already be de-duplicated.
pub fn shopping_list_prompt(meals: &[&str]) -> String {
    let categories: Vec<&str> = GroceryCategory::PREFERRED
        .into_iter()
        .map(GroceryCategory::name)
        .collect();
    format!(
        "Based on the following list of meals for a week, generate a consolidated shopping list.
Meals: {}.

First, determine all the necessary ingredients for every meal. Then, consolidate the ingredients, summing up quantities where the units match (e.g., 2 eggs + 3 eggs = 5 eggs). Finally, group the consolidated ingredients into common grocery store categories ({}). Use \"Other\" for anything that fits no category.",
        meals.join(", "),
        categories.join(", ")
    )
}

pub fn shopping_list_schema() -> JsonSchemaDefinition {
    let items = || JsonSchema::array(JsonSchema::string());
    let properties: BTreeMap<String, JsonSchema> = GroceryCategory::PREFERRED
        .into_iter()
        .map(|category| (category.name().to_string(), items()))
        .collect();

    JsonSchemaDefinition {
        name: "shopping_list".to_string(),
        // Category keys are open-ended, which strict mode cannot express.
        strict: Some(false),
        schema: JsonSchema {
            properties: Some(properties),
            additional_properties: Some(AdditionalProperties::Schema(Box::new(items()))),
            ..JsonSchema::object(Vec::<(String, JsonSchema)>::new())
        }
        .with_description(
            "An object where keys are grocery categories (e.g., 'Produce', 'Dairy & Eggs') and values are arrays of ingredient strings.",
        ),
    }
}

impl<B: ChatBackend> GenerationGateway<B> {
    /// Quantities are summed by the model; nothing here can check its arithmetic.
    pub async fn request_shopping_list(
        &self,
        plan: &MealPlan,
    ) -> Result<ShoppingList, GenerationError> {
        let meals = plan.unique_meal_names();
        if meals.is_empty() {
            return Err(GenerationError::InvalidRequest(
                "meal plan contains no meals".to_string(),
            ));
        }

        let request = self.build_request(SYSTEM_PROMPT, shopping_list_prompt(&meals), shopping_list_schema(), 4096);
        let outcome = self
            .complete::<ShoppingList>(request)
            .await
            .and_then(|list| {
                if list.is_empty() {
                    Err(GatewayFailure::Decode("shopping list contained no items".to_string()))
                } else {
                    Ok(list)
                }
            });

        match outcome {
            Ok(list) => {
                info!(meals = meals.len(), items = list.total_items(), "generated shopping list");
                Ok(list)
            }
            Err(failure) => {
                error!(error = %failure, "shopping list generation failed");
                Err(GenerationError::ShoppingList(failure))
            }
        }
    }
}
