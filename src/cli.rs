use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::ConfigOverrides;
use crate::model::UserPreferences;

#[derive(Parser, Debug)]
#[command(author, version, about = "Plan a week of meals, recipes and a shopping list with an LLM", long_about = None)]
pub struct Cli {
    /// OpenRouter model id (overrides MEAL_PLANNER_MODEL)
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Directory holding saved plans (overrides MEAL_PLANNER_DATA_DIR)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Extra attempts on transient API failures (overrides MEAL_PLANNER_RETRIES)
    #[arg(long, global = true)]
    pub retries: Option<u32>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            model: self.model.clone(),
            data_dir: self.data_dir.clone(),
            retries: self.retries,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Interactive planner (default)
    Shell,
    /// Generate a weekly plan once and print it
    Plan {
        #[command(flatten)]
        preferences: PreferenceArgs,
        /// Save the plan after generating it
        #[arg(long)]
        save: bool,
        /// Also generate the shopping list
        #[arg(long)]
        shopping_list: bool,
    },
    /// Print the recipe for a single meal
    Recipe {
        /// Meal name, e.g. "Mushroom Risotto"
        #[arg(required = true, num_args = 1..)]
        meal: Vec<String>,
    },
    /// Manage saved plans
    Saved {
        #[command(subcommand)]
        command: SavedCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum SavedCommand {
    /// List saved plans, newest first
    List,
    /// Print one saved plan as JSON
    Show { id: String },
    /// Delete a saved plan (missing ids are ignored)
    Delete { id: String },
}

#[derive(Args, Debug, Clone)]
pub struct PreferenceArgs {
    /// Diet, e.g. Vegan, Keto, None
    #[arg(long, default_value = "None")]
    pub diet: String,
    /// Comma separated allergies
    #[arg(long, default_value = "")]
    pub allergies: String,
    /// Preferred cuisine, e.g. Italian
    #[arg(long, default_value = "Any")]
    pub cuisine: String,
    /// Number of people to cook for
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(1..))]
    pub people: u32,
    /// Budget: Low, Medium or High
    #[arg(long, default_value = "Low")]
    pub budget: String,
}

impl From<PreferenceArgs> for UserPreferences {
    fn from(args: PreferenceArgs) -> Self {
        UserPreferences {
            diet: args.diet,
            allergies: args.allergies,
            cuisine: args.cuisine,
            people: args.people,
            budget: args.budget,
        }
    }
}

pub fn parse_args() -> Cli {
    Cli::parse()
}
