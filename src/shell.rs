//! Line-oriented front end over [`AppState`]. Each command maps to one user
//! action on the active screen; the active screen is re-rendered after it.

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::api_connection::connection::ChatBackend;
use crate::gateway::GenerationGateway;
use crate::model::{MealType, Recipe, SavedMealPlan, Weekday};
use crate::session::{AppState, RecipeLookup, ShoppingScreen, View};
use crate::storage::PlanStore;

const HELP: &str = "Commands:
  planner | shopping | saved     switch screen
  prefs                          show preferences
  set <field> <value>            diet, allergies, cuisine, people, budget
  generate                       new plan (planner) or shopping list (shopping)
  recipe <day> <meal>            e.g. `recipe mon dinner`
  recipe <meal name>             any meal by name
  save                           save the current plan and its recipes
  check <n>                      tick item n on the shopping list
  load <n> | delete <n>          act on saved plan n
  dismiss                        hide the error on this screen
  help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Navigate(View),
    ShowPreferences,
    Set { field: String, value: String },
    Generate,
    RecipeSlot { day: Weekday, meal: MealType },
    RecipeNamed(String),
    Save,
    Check(usize),
    Load(usize),
    Delete(usize),
    Dismiss,
    Help,
    Quit,
}

impl ShellCommand {
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map(|(word, rest)| (word, rest.trim()))
            .unwrap_or((line, ""));

        let index = |rest: &str| -> Result<usize, String> {
            rest.parse::<usize>()
                .ok()
                .filter(|n| *n >= 1)
                .ok_or_else(|| format!("expected a number from 1, got '{}'", rest))
        };

        match word.to_lowercase().as_str() {
            "planner" | "plan" => Ok(ShellCommand::Navigate(View::Planner)),
            "shopping" | "list" => Ok(ShellCommand::Navigate(View::ShoppingList)),
            "saved" => Ok(ShellCommand::Navigate(View::SavedPlans)),
            "prefs" => Ok(ShellCommand::ShowPreferences),
            "set" => {
                let (field, value) = rest
                    .split_once(char::is_whitespace)
                    .map(|(field, value)| (field, value.trim()))
                    .unwrap_or((rest, ""));
                if field.is_empty() {
                    return Err("usage: set <field> <value>".to_string());
                }
                Ok(ShellCommand::Set {
                    field: field.to_lowercase(),
                    value: value.to_string(),
                })
            }
            "generate" | "gen" => Ok(ShellCommand::Generate),
            "recipe" => parse_recipe_target(rest),
            "save" => Ok(ShellCommand::Save),
            "check" => index(rest).map(ShellCommand::Check),
            "load" => index(rest).map(ShellCommand::Load),
            "delete" => index(rest).map(ShellCommand::Delete),
            "dismiss" => Ok(ShellCommand::Dismiss),
            "help" | "?" => Ok(ShellCommand::Help),
            "quit" | "exit" | "q" => Ok(ShellCommand::Quit),
            "" => Err(String::new()),
            other => Err(format!("unknown command '{}', try `help`", other)),
        }
    }
}

fn parse_recipe_target(rest: &str) -> Result<ShellCommand, String> {
    if rest.is_empty() {
        return Err("usage: recipe <day> <meal> | recipe <meal name>".to_string());
    }
    let mut words = rest.split_whitespace();
    if let (Some(day), Some(meal), None) = (words.next(), words.next(), words.next()) {
        if let (Ok(day), Ok(meal)) = (day.parse::<Weekday>(), meal.parse::<MealType>()) {
            return Ok(ShellCommand::RecipeSlot { day, meal });
        }
    }
    Ok(ShellCommand::RecipeNamed(rest.to_string()))
}

#[derive(Debug, PartialEq, Eq)]
pub enum Step {
    Continue(String),
    Quit,
}

pub struct Shell<B> {
    state: AppState,
    gateway: GenerationGateway<B>,
    store: PlanStore,
    /// The saved plans as last listed, so `load 2` means what the user saw.
    saved_listing: Vec<SavedMealPlan>,
}

impl<B: ChatBackend> Shell<B> {
    pub fn new(state: AppState, gateway: GenerationGateway<B>, store: PlanStore) -> Self {
        Self {
            state,
            gateway,
            store,
            saved_listing: Vec::new(),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut stdout = tokio::io::stdout();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        let banner = format!("{}\n{}\n", self.render(), "Type `help` for commands.");
        stdout.write_all(banner.as_bytes()).await?;
        loop {
            stdout.write_all(b"> ").await?;
            stdout.flush().await?;
            let Some(line) = lines.next_line().await? else {
                break;
            };
            match self.handle_line(&line).await {
                Step::Continue(output) => {
                    if !output.is_empty() {
                        stdout.write_all(output.as_bytes()).await?;
                        stdout.write_all(b"\n").await?;
                    }
                }
                Step::Quit => break,
            }
        }
        Ok(())
    }

    pub async fn handle_line(&mut self, line: &str) -> Step {
        let command = match ShellCommand::parse(line) {
            Ok(command) => command,
            Err(message) => return Step::Continue(message),
        };

        let note = match command {
            ShellCommand::Quit => return Step::Quit,
            ShellCommand::Help => return Step::Continue(HELP.to_string()),
            ShellCommand::ShowPreferences => return Step::Continue(self.render_preferences()),
            ShellCommand::Navigate(view) => {
                self.state.navigate(view);
                None
            }
            ShellCommand::Set { field, value } => Some(self.set_preference(&field, &value)),
            ShellCommand::Generate => self.generate().await,
            ShellCommand::RecipeSlot { day, meal } => {
                let name = self
                    .state
                    .meal_plan()
                    .map(|plan| plan.day(day).get(meal).to_string());
                match name {
                    Some(name) => return Step::Continue(self.show_recipe(&name).await),
                    None => Some("Generate a plan first.".to_string()),
                }
            }
            ShellCommand::RecipeNamed(name) => return Step::Continue(self.show_recipe(&name).await),
            ShellCommand::Save => Some(match self.state.save_current(&self.store) {
                Some(saved) => format!("Plan saved! ({})", saved.id),
                None if self.state.meal_plan().is_none() => "Nothing to save yet.".to_string(),
                None => "Save failed.".to_string(),
            }),
            ShellCommand::Check(n) => Some(self.check_item(n)),
            ShellCommand::Load(n) => self.load(n),
            ShellCommand::Delete(n) => Some(self.delete(n)),
            ShellCommand::Dismiss => {
                self.state.dismiss_error(self.state.view());
                None
            }
        };

        let screen = self.render();
        Step::Continue(match note {
            Some(note) => format!("{}\n{}", note, screen),
            None => screen,
        })
    }

    fn set_preference(&mut self, field: &str, value: &str) -> String {
        let prefs = self.state.preferences_mut();
        match field {
            "diet" => prefs.diet = value.to_string(),
            "allergies" => prefs.allergies = value.to_string(),
            "cuisine" => prefs.cuisine = value.to_string(),
            "budget" => prefs.budget = value.to_string(),
            "people" => match value.parse::<u32>() {
                Ok(people) if people >= 1 => prefs.people = people,
                _ => return format!("people must be a whole number of at least 1, got '{}'", value),
            },
            other => return format!("unknown preference '{}'", other),
        }
        format!("{} set.", field)
    }

    async fn generate(&mut self) -> Option<String> {
        match self.state.view() {
            View::Planner => {
                self.state.generate_plan(&self.gateway).await;
                None
            }
            View::ShoppingList => {
                self.state.generate_shopping_list(&self.gateway).await;
                None
            }
            View::SavedPlans => Some("Nothing to generate here.".to_string()),
        }
    }

    async fn show_recipe(&mut self, name: &str) -> String {
        match self.state.recipe(&self.gateway, name).await {
            RecipeLookup::Found(recipe) => render_recipe(recipe),
            RecipeLookup::Unavailable => format!("No recipe available for '{}'.", name),
            RecipeLookup::Failed(message) => message,
        }
    }

    fn check_item(&mut self, n: usize) -> String {
        let item = self.state.shopping_list().and_then(|list| {
            list.sections()
                .into_iter()
                .flat_map(|(_, items)| items.iter())
                .nth(n - 1)
                .cloned()
        });
        match item {
            Some(item) => {
                let checked = self.state.toggle_checked(&item);
                format!("{} {}", if checked { "Checked" } else { "Unchecked" }, item)
            }
            None => format!("No item {} on the list.", n),
        }
    }

    fn load(&mut self, n: usize) -> Option<String> {
        match self.saved_listing.get(n - 1).cloned() {
            Some(saved) => {
                self.state.load_saved(saved);
                None
            }
            None => Some(format!("No saved plan {}.", n)),
        }
    }

    fn delete(&mut self, n: usize) -> String {
        let Some(id) = self.saved_listing.get(n - 1).map(|saved| saved.id.clone()) else {
            return format!("No saved plan {}.", n);
        };
        match self.state.delete_saved(&self.store, &id) {
            Some(true) => "Plan deleted.".to_string(),
            Some(false) => format!("Plan {} was already deleted.", n),
            None => "Delete failed.".to_string(),
        }
    }

    /// Renders the active screen.
    pub fn render(&mut self) -> String {
        let view = self.state.view();
        let mut lines = vec![format!("== {} ==", view.title())];
        if let Some(error) = self.state.error(view) {
            lines.push(format!("! {} (type `dismiss` to hide)", error));
        }
        match view {
            View::Planner => lines.extend(self.planner_lines()),
            View::ShoppingList => lines.extend(self.shopping_lines()),
            View::SavedPlans => {
                self.saved_listing = self.state.saved_plans_newest_first(&self.store);
                lines.extend(saved_lines(&self.saved_listing));
            }
        }
        lines.join("\n")
    }

    fn render_preferences(&self) -> String {
        let prefs = self.state.preferences();
        [
            format!("diet:      {}", prefs.diet),
            format!("allergies: {}", prefs.allergies_or_none()),
            format!("cuisine:   {}", prefs.cuisine),
            format!("people:    {}", prefs.people),
            format!("budget:    {}", prefs.budget),
        ]
        .join("\n")
    }

    fn planner_lines(&self) -> Vec<String> {
        let Some(plan) = self.state.meal_plan() else {
            return vec!["No plan yet. Adjust `prefs` and run `generate`.".to_string()];
        };
        let mut lines = Vec::new();
        if self.state.plan_saved() {
            lines.push("Plan Saved!".to_string());
        }
        for day in Weekday::ALL {
            lines.push(day.label().to_string());
            for meal in MealType::ALL {
                let name = plan.day(day).get(meal);
                let marker = if self.state.cached_recipe(name).is_some() { "*" } else { " " };
                lines.push(format!("  {} {:<9} {}", marker, meal.key(), name));
            }
        }
        lines
    }

    fn shopping_lines(&self) -> Vec<String> {
        match self.state.shopping_screen() {
            ShoppingScreen::NoPlan => {
                vec!["No meal plan yet. Generate one on the planner first.".to_string()]
            }
            ShoppingScreen::Ready { list: None, .. } => {
                vec!["Run `generate` to build a shopping list for this plan.".to_string()]
            }
            ShoppingScreen::Ready {
                list: Some(list),
                checked,
            } => {
                let mut lines = Vec::new();
                let mut n = 0;
                for (category, items) in list.sections() {
                    lines.push(category.to_string());
                    for item in items {
                        n += 1;
                        let mark = if checked.is_checked(item) { "x" } else { " " };
                        lines.push(format!("  {:>3}. [{}] {}", n, mark, item));
                    }
                }
                lines
            }
        }
    }
}

fn saved_lines(saved: &[SavedMealPlan]) -> Vec<String> {
    if saved.is_empty() {
        return vec!["No saved plans yet.".to_string()];
    }
    saved
        .iter()
        .enumerate()
        .map(|(i, plan)| {
            format!(
                "{:>3}. saved {} ({} recipes, starts with {})",
                i + 1,
                plan.saved_at,
                plan.recipes.len(),
                first_meal(plan)
            )
        })
        .collect()
}

fn first_meal(saved: &SavedMealPlan) -> &str {
    saved
        .plan
        .meal_names()
        .into_iter()
        .find(|name| !name.is_empty())
        .unwrap_or("nothing")
}

pub fn render_recipe(recipe: &Recipe) -> String {
    let mut lines = vec![
        format!("## {}", recipe.name),
        recipe.description.clone(),
        format!("Cook time: {}", recipe.cook_time),
        format!(
            "Nutrition: {} calories, {} protein, {} carbs, {} fat",
            recipe.nutrition.calories,
            recipe.nutrition.protein,
            recipe.nutrition.carbs,
            recipe.nutrition.fat
        ),
        "Ingredients:".to_string(),
    ];
    lines.extend(
        recipe
            .ingredients
            .iter()
            .map(|ingredient| format!("  - {} {}", ingredient.quantity, ingredient.name)),
    );
    lines.push("Instructions:".to_string());
    lines.extend(
        recipe
            .instructions
            .iter()
            .enumerate()
            .map(|(i, step)| format!("  {}. {}", i + 1, step)),
    );
    lines.join("\n")
}
