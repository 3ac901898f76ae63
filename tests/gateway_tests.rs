mod common;

use common::{
    distinct_plan_json, gateway, plan_from_json, recipe_json, repetitive_plan_json,
    ScriptedBackend, SHOPPING_LIST_JSON, TEST_MODEL,
};
use meal_planner::api_connection::connection::ApiConnectionError;
use meal_planner::gateway::{GatewayFailure, GenerationError};
use meal_planner::model::{GroceryCategory, MealPlan, UserPreferences, Weekday};
use reqwest::StatusCode;
use std::time::Duration;

fn vegan_italian() -> UserPreferences {
    UserPreferences {
        diet: "Vegan".to_string(),
        allergies: "".to_string(),
        cuisine: "Italian".to_string(),
        people: 2,
        budget: "Low".to_string(),
    }
}

#[tokio::test]
async fn test_meal_plan_request_and_decode() {
    let gateway = gateway(ScriptedBackend::new().reply(distinct_plan_json()));

    let plan = gateway.request_meal_plan(&vegan_italian()).await.unwrap();
    assert_eq!(plan.wednesday.lunch, "Wednesday lunch");
    assert_eq!(plan.meal_names().len(), 21);

    let requests = gateway.backend().requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.model, TEST_MODEL);
    let format = request.response_format.as_ref().unwrap();
    assert_eq!(format.format_type, "json_schema");
    assert_eq!(format.json_schema.as_ref().unwrap().name, "weekly_meal_plan");

    let prompt = gateway.backend().last_user_prompt();
    assert!(prompt.contains("Diet: Vegan"));
    assert!(prompt.contains("Allergies: none"));
    assert!(prompt.contains("Number of People: 2"));
}

#[tokio::test]
async fn test_meal_plan_missing_days_are_empty_not_errors() {
    let gateway = gateway(
        ScriptedBackend::new().reply(r#"{"monday": {"breakfast": "Oats", "lunch": "Soup"}}"#),
    );
    let plan = gateway.request_meal_plan(&vegan_italian()).await.unwrap();
    assert_eq!(plan.monday.breakfast, "Oats");
    assert_eq!(plan.monday.dinner, "");
    for day in Weekday::ALL.into_iter().skip(1) {
        assert_eq!(plan.day(day).breakfast, "");
    }
}

#[tokio::test]
async fn test_meal_plan_null_slots_are_empty_not_errors() {
    let gateway = gateway(ScriptedBackend::new().reply(
        r#"{"monday": {"breakfast": "Oats", "lunch": null, "dinner": "Soup"}, "friday": null}"#,
    ));
    let plan = gateway.request_meal_plan(&vegan_italian()).await.unwrap();
    assert_eq!(plan.monday.breakfast, "Oats");
    assert_eq!(plan.monday.lunch, "");
    assert_eq!(plan.monday.dinner, "Soup");
    assert_eq!(plan.day(Weekday::Friday).dinner, "");
    assert_eq!(plan.unique_meal_names(), vec!["Oats", "Soup"]);
}

#[tokio::test]
async fn test_meal_plan_rejects_zero_people_without_calling() {
    let gateway = gateway(ScriptedBackend::new());
    let prefs = UserPreferences {
        people: 0,
        ..vegan_italian()
    };
    let result = gateway.request_meal_plan(&prefs).await;
    assert!(matches!(result, Err(GenerationError::InvalidRequest(_))));
    assert_eq!(gateway.backend().calls(), 0);
}

#[tokio::test]
async fn test_meal_plan_malformed_json_fails_cleanly() {
    let gateway = gateway(ScriptedBackend::new().reply("Sure! Here is your plan: monday..."));
    let err = gateway.request_meal_plan(&vegan_italian()).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Failed to generate meal plan. Please check your API key and try again."
    );
    assert!(matches!(err.failure(), Some(GatewayFailure::Decode(_))));
}

#[tokio::test]
async fn test_meal_plan_wrong_field_type_is_schema_mismatch() {
    let gateway = gateway(ScriptedBackend::new().reply(r#"{"monday": {"breakfast": 42}}"#));
    let err = gateway.request_meal_plan(&vegan_italian()).await.unwrap_err();
    assert!(matches!(err, GenerationError::MealPlan(GatewayFailure::Decode(_))));
}

#[tokio::test]
async fn test_no_retry_by_default() {
    let gateway = gateway(ScriptedBackend::new().fail_status(StatusCode::SERVICE_UNAVAILABLE));
    let err = gateway.request_meal_plan(&vegan_italian()).await.unwrap_err();
    assert!(matches!(
        err.failure(),
        Some(GatewayFailure::Api(ApiConnectionError::ApiError { .. }))
    ));
    assert_eq!(gateway.backend().calls(), 1);
}

#[tokio::test]
async fn test_bounded_retry_recovers_from_transient_failures() {
    let backend = ScriptedBackend::new()
        .fail_status(StatusCode::SERVICE_UNAVAILABLE)
        .fail_status(StatusCode::TOO_MANY_REQUESTS)
        .reply(distinct_plan_json());
    let gateway = gateway(backend)
        .with_retries(2)
        .with_retry_delay(Duration::ZERO);

    let plan = gateway.request_meal_plan(&vegan_italian()).await.unwrap();
    assert_eq!(plan.sunday.dinner, "Sunday dinner");
    assert_eq!(gateway.backend().calls(), 3);
}

#[tokio::test]
async fn test_retry_gives_up_after_budget() {
    let backend = ScriptedBackend::new()
        .fail_status(StatusCode::BAD_GATEWAY)
        .fail_status(StatusCode::BAD_GATEWAY);
    let gateway = gateway(backend)
        .with_retries(1)
        .with_retry_delay(Duration::ZERO);

    assert!(gateway.request_meal_plan(&vegan_italian()).await.is_err());
    assert_eq!(gateway.backend().calls(), 2);
}

#[tokio::test]
async fn test_permanent_failures_are_not_retried() {
    let gateway = gateway(ScriptedBackend::new().fail_status(StatusCode::UNAUTHORIZED))
        .with_retries(3)
        .with_retry_delay(Duration::ZERO);
    assert!(gateway.request_meal_plan(&vegan_italian()).await.is_err());
    assert_eq!(gateway.backend().calls(), 1);
}

#[tokio::test]
async fn test_recipe_decodes_fenced_response() {
    let fenced = format!("```json\n{}\n```", recipe_json("Mushroom Risotto"));
    let gateway = gateway(ScriptedBackend::new().reply(fenced));

    let recipe = gateway.request_recipe_details("Mushroom Risotto").await.unwrap();
    assert_eq!(recipe.name, "Mushroom Risotto");
    assert_eq!(recipe.cook_time, "30 minutes");
    assert_eq!(recipe.ingredients[1].quantity, "3 cloves");
    assert_eq!(recipe.instructions.len(), 3);
    assert_eq!(recipe.nutrition.fat, "14g");
    assert!(gateway.backend().last_user_prompt().contains("\"Mushroom Risotto\""));
}

#[tokio::test]
async fn test_recipe_without_name_takes_meal_name() {
    let gateway = gateway(ScriptedBackend::new().reply(r#"{"description": "Quick.", "instructions": ["Eat."]}"#));
    let recipe = gateway.request_recipe_details("Avocado Toast").await.unwrap();
    assert_eq!(recipe.name, "Avocado Toast");
    assert!(recipe.ingredients.is_empty());
}

#[tokio::test]
async fn test_recipe_failure_names_the_meal() {
    let gateway = gateway(ScriptedBackend::new().fail(ApiConnectionError::EmptyResponse));
    let err = gateway.request_recipe_details("Pad Thai").await.unwrap_err();
    assert_eq!(err.to_string(), "Failed to generate recipe for Pad Thai.");
    match err {
        GenerationError::Recipe { meal_name, .. } => assert_eq!(meal_name, "Pad Thai"),
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn test_recipe_rejects_blank_meal_name() {
    let gateway = gateway(ScriptedBackend::new());
    let result = gateway.request_recipe_details("   ").await;
    assert!(matches!(result, Err(GenerationError::InvalidRequest(_))));
    assert_eq!(gateway.backend().calls(), 0);
}

#[tokio::test]
async fn test_shopping_list_dedups_meals_in_request() {
    let plan = plan_from_json(&repetitive_plan_json());
    let gateway = gateway(ScriptedBackend::new().reply(SHOPPING_LIST_JSON));

    let list = gateway.request_shopping_list(&plan).await.unwrap();
    assert_eq!(list.items(GroceryCategory::Pantry).len(), 2);
    assert_eq!(list.extra["Spices"], vec!["1 tsp oregano".to_string()]);

    let prompt = gateway.backend().last_user_prompt();
    assert!(prompt.contains("Meals: Tofu Scramble, Minestrone, Pasta e Fagioli."));
    assert_eq!(prompt.matches("Minestrone").count(), 1);
}

#[tokio::test]
async fn test_shopping_list_empty_response_is_error() {
    let plan = plan_from_json(&distinct_plan_json());
    let gateway = gateway(ScriptedBackend::new().reply(r#"{"Produce": [], "Other": []}"#));
    let err = gateway.request_shopping_list(&plan).await.unwrap_err();
    assert_eq!(err.to_string(), "Failed to generate shopping list.");
}

#[tokio::test]
async fn test_shopping_list_for_empty_plan_is_invalid() {
    let gateway = gateway(ScriptedBackend::new());
    let result = gateway.request_shopping_list(&MealPlan::default()).await;
    assert!(matches!(result, Err(GenerationError::InvalidRequest(_))));
    assert_eq!(gateway.backend().calls(), 0);
}

#[tokio::test]
async fn test_vegan_week_then_shopping_list() {
    let gateway = gateway(
        ScriptedBackend::new()
            .reply(repetitive_plan_json())
            .reply(SHOPPING_LIST_JSON),
    );

    let plan = gateway.request_meal_plan(&vegan_italian()).await.unwrap();
    assert_eq!(plan.meal_names().len(), 21);
    assert_eq!(plan.unique_meal_names().len(), 3);

    let list = gateway.request_shopping_list(&plan).await.unwrap();
    assert_eq!(list.total_items(), 5);

    let requests = gateway.backend().requests();
    assert_eq!(requests.len(), 2);
    let shopping_prompt = &requests[1].messages[1].content;
    assert_eq!(shopping_prompt.matches("Tofu Scramble").count(), 1);
    assert_eq!(
        requests[1].response_format.as_ref().unwrap().json_schema.as_ref().unwrap().name,
        "shopping_list"
    );
}
