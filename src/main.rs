use anyhow::{bail, Context, Result};
use meal_planner::api_connection::Provider;
use meal_planner::cli::{parse_args, Command, SavedCommand};
use meal_planner::config::AppConfig;
use meal_planner::gateway::GenerationGateway;
use meal_planner::model::{MealType, UserPreferences, Weekday};
use meal_planner::session::AppState;
use meal_planner::shell::{render_recipe, Shell};
use meal_planner::storage::PlanStore;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("meal_planner=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok(); // Load .env file for API keys
    init_logging();

    let cli_args = parse_args();
    let config = AppConfig::resolve(cli_args.overrides());
    debug!(?config, "resolved configuration");

    let provider = Provider::openrouter_with_url(&config.api_key_env_var, &config.api_url);
    let gateway = GenerationGateway::new(provider, config.model.clone()).with_retries(config.retries);
    let store = PlanStore::new(&config.data_dir);

    match cli_args.command.unwrap_or(Command::Shell) {
        Command::Shell => {
            let mut shell = Shell::new(AppState::new(), gateway, store);
            shell.run().await.context("interactive shell failed")?;
        }
        Command::Plan {
            preferences,
            save,
            shopping_list,
        } => {
            let prefs = UserPreferences::from(preferences);
            println!("Generating a meal plan with {}...", gateway.model());
            let plan = gateway
                .request_meal_plan(&prefs)
                .await
                .context("meal plan request failed")?;
            for day in Weekday::ALL {
                println!("{}", day.label());
                for meal in MealType::ALL {
                    println!("  {:<9} {}", meal.key(), plan.day(day).get(meal));
                }
            }

            if shopping_list {
                println!("\nBuilding the shopping list...");
                let list = gateway
                    .request_shopping_list(&plan)
                    .await
                    .context("shopping list request failed")?;
                for (category, items) in list.sections() {
                    println!("{}", category);
                    for item in items {
                        println!("  - {}", item);
                    }
                }
            }

            if save {
                let saved = store
                    .save_plan(&plan, &Default::default())
                    .with_context(|| format!("Failed to save plan under {}", config.data_dir.display()))?;
                println!("\nSaved plan {} at {}", saved.id, saved.saved_at);
            }
        }
        Command::Recipe { meal } => {
            let meal_name = meal.join(" ");
            let recipe = gateway
                .request_recipe_details(&meal_name)
                .await
                .context("recipe request failed")?;
            println!("{}", render_recipe(&recipe));
        }
        Command::Saved { command } => match command {
            SavedCommand::List => {
                let mut plans = store.list_saved_plans();
                plans.reverse();
                if plans.is_empty() {
                    println!("No saved plans in {}", store.record_path().display());
                }
                for plan in plans {
                    println!("{}  saved {}  ({} recipes)", plan.id, plan.saved_at, plan.recipes.len());
                }
            }
            SavedCommand::Show { id } => {
                let Some(plan) = store.find_plan(&id) else {
                    bail!("no saved plan with id '{}'", id);
                };
                println!("{}", serde_json::to_string_pretty(&plan)?);
            }
            SavedCommand::Delete { id } => {
                let removed = store
                    .delete_plan(&id)
                    .with_context(|| format!("Failed to delete plan '{}'", id))?;
                if removed {
                    println!("Deleted {}", id);
                } else {
                    println!("No saved plan with id '{}'", id);
                }
            }
        },
    }

    Ok(())
}
