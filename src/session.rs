//! Session state and the view controller.
//!
//! `AppState` is the single owner of everything a session knows: the active
//! screen, the current plan, the recipe cache and the shopping list. Screens
//! only change it through the methods below.

use tracing::{debug, info};

use crate::api_connection::connection::ChatBackend;
use crate::gateway::GenerationGateway;
use crate::model::{
    is_selectable_meal, CheckedItems, MealPlan, Recipe, RecipeBook, SavedMealPlan, ShoppingList,
    UserPreferences,
};
use crate::storage::PlanStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Planner,
    ShoppingList,
    SavedPlans,
}

impl View {
    pub const ALL: [View; 3] = [View::Planner, View::ShoppingList, View::SavedPlans];

    pub fn title(self) -> &'static str {
        match self {
            View::Planner => "Meal Planner",
            View::ShoppingList => "Shopping List",
            View::SavedPlans => "Saved Plans",
        }
    }
}

/// What the shopping list screen can show.
#[derive(Debug, PartialEq, Eq)]
pub enum ShoppingScreen<'a> {
    /// No plan yet, so there is nothing to generate from.
    NoPlan,
    Ready {
        list: Option<&'a ShoppingList>,
        checked: &'a CheckedItems,
    },
}

/// Outcome of opening a meal's recipe.
#[derive(Debug, PartialEq, Eq)]
pub enum RecipeLookup<'a> {
    Found(&'a Recipe),
    /// Blank or leftover slot: nothing to look up.
    Unavailable,
    /// The request failed; the message is also shown on the active screen.
    Failed(String),
}

impl<'a> RecipeLookup<'a> {
    pub fn recipe(self) -> Option<&'a Recipe> {
        match self {
            RecipeLookup::Found(recipe) => Some(recipe),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct AppState {
    view: View,
    preferences: UserPreferences,
    meal_plan: Option<MealPlan>,
    recipes: RecipeBook,
    shopping_list: Option<ShoppingList>,
    checked_items: CheckedItems,
    planner_error: Option<String>,
    shopping_error: Option<String>,
    saved_error: Option<String>,
    plan_saved: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn navigate(&mut self, view: View) {
        debug!(from = ?self.view, to = ?view, "navigate");
        self.view = view;
    }

    pub fn preferences(&self) -> &UserPreferences {
        &self.preferences
    }

    pub fn preferences_mut(&mut self) -> &mut UserPreferences {
        &mut self.preferences
    }

    pub fn meal_plan(&self) -> Option<&MealPlan> {
        self.meal_plan.as_ref()
    }

    pub fn recipes(&self) -> &RecipeBook {
        &self.recipes
    }

    pub fn cached_recipe(&self, meal_name: &str) -> Option<&Recipe> {
        self.recipes.get(meal_name)
    }

    pub fn shopping_list(&self) -> Option<&ShoppingList> {
        self.shopping_list.as_ref()
    }

    pub fn shopping_screen(&self) -> ShoppingScreen<'_> {
        match self.meal_plan {
            None => ShoppingScreen::NoPlan,
            Some(_) => ShoppingScreen::Ready {
                list: self.shopping_list.as_ref(),
                checked: &self.checked_items,
            },
        }
    }

    pub fn toggle_checked(&mut self, item: &str) -> bool {
        self.checked_items.toggle(item)
    }

    pub fn error(&self, view: View) -> Option<&str> {
        match view {
            View::Planner => self.planner_error.as_deref(),
            View::ShoppingList => self.shopping_error.as_deref(),
            View::SavedPlans => self.saved_error.as_deref(),
        }
    }

    pub fn dismiss_error(&mut self, view: View) {
        *self.error_slot(view) = None;
    }

    fn error_slot(&mut self, view: View) -> &mut Option<String> {
        match view {
            View::Planner => &mut self.planner_error,
            View::ShoppingList => &mut self.shopping_error,
            View::SavedPlans => &mut self.saved_error,
        }
    }

    /// Set right after a save, cleared by the next plan change.
    pub fn plan_saved(&self) -> bool {
        self.plan_saved
    }

    /// Installs a brand-new plan. The recipe cache and shopping list belong to
    /// the old plan and are dropped.
    fn replace_plan(&mut self, plan: MealPlan, recipes: RecipeBook) {
        self.meal_plan = Some(plan);
        self.recipes = recipes;
        self.shopping_list = None;
        self.checked_items.clear();
        self.plan_saved = false;
    }

    /// On failure the previous plan and cache are kept and the planner shows the error.
    pub async fn generate_plan<B: ChatBackend>(
        &mut self,
        gateway: &GenerationGateway<B>,
    ) -> Option<&MealPlan> {
        self.planner_error = None;
        let result = gateway.request_meal_plan(&self.preferences).await;
        match result {
            Ok(plan) => {
                self.replace_plan(plan, RecipeBook::new());
                self.meal_plan.as_ref()
            }
            Err(err) => {
                self.planner_error = Some(err.to_string());
                None
            }
        }
    }

    /// Cached recipes never reach the gateway. Unselectable names (blank,
    /// leftovers) are `Unavailable` and leave every error slot alone. A failure
    /// is reported on whichever screen asked.
    pub async fn recipe<B: ChatBackend>(
        &mut self,
        gateway: &GenerationGateway<B>,
        meal_name: &str,
    ) -> RecipeLookup<'_> {
        if !is_selectable_meal(meal_name) {
            return RecipeLookup::Unavailable;
        }
        if self.recipes.contains_key(meal_name) {
            debug!(meal = meal_name, "recipe cache hit");
            return self
                .recipes
                .get(meal_name)
                .map_or(RecipeLookup::Unavailable, RecipeLookup::Found);
        }

        let view = self.view;
        *self.error_slot(view) = None;
        let result = gateway.request_recipe_details(meal_name).await;
        match result {
            Ok(recipe) => {
                let recipe = self.recipes.entry(meal_name.to_string()).or_insert(recipe);
                RecipeLookup::Found(recipe)
            }
            Err(err) => {
                let message = err.to_string();
                *self.error_slot(view) = Some(message.clone());
                RecipeLookup::Failed(message)
            }
        }
    }

    /// Returns `None` with no error when there is no plan yet. A failure keeps
    /// whatever list was there before.
    pub async fn generate_shopping_list<B: ChatBackend>(
        &mut self,
        gateway: &GenerationGateway<B>,
    ) -> Option<&ShoppingList> {
        let plan = self.meal_plan.as_ref()?;
        self.shopping_error = None;
        let result = gateway.request_shopping_list(plan).await;
        match result {
            Ok(list) => {
                self.shopping_list = Some(list);
                self.checked_items.clear();
                self.shopping_list.as_ref()
            }
            Err(err) => {
                self.shopping_error = Some(err.to_string());
                None
            }
        }
    }

    /// Snapshots the current plan and recipes. `None` when there is no plan or
    /// the write failed; the failure is shown on the planner.
    pub fn save_current(&mut self, store: &PlanStore) -> Option<SavedMealPlan> {
        let plan = self.meal_plan.as_ref()?;
        match store.save_plan(plan, &self.recipes) {
            Ok(saved) => {
                self.plan_saved = true;
                Some(saved)
            }
            Err(err) => {
                self.planner_error = Some(format!("Failed to save plan: {}", err));
                None
            }
        }
    }

    /// Newest first, the way the saved plans screen lists them.
    pub fn saved_plans_newest_first(&self, store: &PlanStore) -> Vec<SavedMealPlan> {
        let mut plans = store.list_saved_plans();
        plans.reverse();
        plans
    }

    /// Replaces plan and cache wholesale, then returns to the planner.
    pub fn load_saved(&mut self, saved: SavedMealPlan) {
        info!(id = %saved.id, recipes = saved.recipes.len(), "loading saved plan");
        self.replace_plan(saved.plan, saved.recipes);
        self.planner_error = None;
        self.navigate(View::Planner);
    }

    /// `Some(removed)` once the record is written, `None` when the write failed.
    pub fn delete_saved(&mut self, store: &PlanStore, id: &str) -> Option<bool> {
        self.saved_error = None;
        match store.delete_plan(id) {
            Ok(removed) => Some(removed),
            Err(err) => {
                self.saved_error = Some(format!("Failed to delete plan: {}", err));
                None
            }
        }
    }
}
