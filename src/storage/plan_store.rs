use chrono::{DateTime, Local, Utc};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::model::{MealPlan, RecipeBook, SavedMealPlan};

/// The single record every saved plan lives under.
pub const STORAGE_KEY: &str = "ai-meal-plans";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to serialize saved plans: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Durable list of saved plans, rewritten whole on every mutation.
///
/// Assumes a single writer: two processes saving at once can lose an update.
#[derive(Debug, Clone)]
pub struct PlanStore {
    record_path: PathBuf,
}

impl PlanStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            record_path: data_dir.as_ref().join(format!("{}.json", STORAGE_KEY)),
        }
    }

    pub fn record_path(&self) -> &Path {
        &self.record_path
    }

    /// Oldest first. A missing or unreadable record is an empty list.
    pub fn list_saved_plans(&self) -> Vec<SavedMealPlan> {
        let contents = match fs::read_to_string(&self.record_path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!(path = %self.record_path.display(), error = %e, "failed to read saved meal plans");
                return Vec::new();
            }
        };
        if contents.trim().is_empty() {
            return Vec::new();
        }
        match serde_json::from_str(&contents) {
            Ok(plans) => plans,
            Err(e) => {
                warn!(path = %self.record_path.display(), error = %e, "failed to parse saved meal plans, treating as empty");
                Vec::new()
            }
        }
    }

    pub fn find_plan(&self, id: &str) -> Option<SavedMealPlan> {
        self.list_saved_plans().into_iter().find(|plan| plan.id == id)
    }

    /// Appends a snapshot; never replaces an existing record.
    pub fn save_plan(&self, plan: &MealPlan, recipes: &RecipeBook) -> Result<SavedMealPlan, StoreError> {
        self.save_plan_at(plan, recipes, Utc::now())
    }

    fn save_plan_at(
        &self,
        plan: &MealPlan,
        recipes: &RecipeBook,
        now: DateTime<Utc>,
    ) -> Result<SavedMealPlan, StoreError> {
        let mut plans = self.list_saved_plans();
        let saved = SavedMealPlan {
            id: unique_id(&plans, now),
            saved_at: now.with_timezone(&Local).format("%-m/%-d/%Y, %-I:%M:%S %p").to_string(),
            plan: plan.clone(),
            recipes: recipes.clone(),
        };
        plans.push(saved.clone());
        self.write_all(&plans)?;
        info!(id = %saved.id, recipes = saved.recipes.len(), "saved meal plan");
        Ok(saved)
    }

    /// Absent ids are not an error. Returns whether a record was removed.
    pub fn delete_plan(&self, id: &str) -> Result<bool, StoreError> {
        let mut plans = self.list_saved_plans();
        let before = plans.len();
        plans.retain(|plan| plan.id != id);
        if plans.len() == before {
            debug!(id, "no saved plan with this id");
        }
        self.write_all(&plans)?;
        info!(id, removed = before - plans.len(), "deleted meal plan");
        Ok(plans.len() < before)
    }

    /// Writes to a sibling temp file and renames it over the record.
    fn write_all(&self, plans: &[SavedMealPlan]) -> Result<(), StoreError> {
        let serialized = serde_json::to_string_pretty(plans)?;
        let io_err = |source: io::Error| StoreError::Io {
            path: self.record_path.clone(),
            source,
        };
        if let Some(parent) = self.record_path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let tmp_path = self.record_path.with_extension("json.tmp");
        fs::write(&tmp_path, serialized).map_err(io_err)?;
        fs::rename(&tmp_path, &self.record_path).map_err(io_err)?;
        Ok(())
    }
}

/// Timestamp-derived id, suffixed if another record already holds it.
fn unique_id(existing: &[SavedMealPlan], now: DateTime<Utc>) -> String {
    let base = now.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string();
    let taken = |candidate: &str| existing.iter().any(|plan| plan.id == candidate);
    if !taken(&base) {
        return base;
    }
    let mut n = 1;
    loop {
        let candidate = format!("{}-{}", base, n);
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Ingredient, NutritionEstimate, Recipe};
    use anyhow::Result;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn sample_plan(dinner: &str) -> MealPlan {
        let mut plan = MealPlan::default();
        plan.monday.breakfast = "Overnight Oats".to_string();
        plan.monday.dinner = dinner.to_string();
        plan
    }

    fn sample_recipes() -> RecipeBook {
        let mut recipes = RecipeBook::new();
        recipes.insert(
            "Overnight Oats".to_string(),
            Recipe {
                name: "Overnight Oats".to_string(),
                description: "Creamy and make-ahead.".to_string(),
                cook_time: "5 minutes".to_string(),
                ingredients: vec![Ingredient {
                    name: "Rolled oats".to_string(),
                    quantity: "1/2 cup".to_string(),
                }],
                instructions: vec!["Mix.".to_string(), "Chill overnight.".to_string()],
                nutrition: NutritionEstimate {
                    calories: "320 kcal".to_string(),
                    protein: "11g".to_string(),
                    carbs: "50g".to_string(),
                    fat: "8g".to_string(),
                },
            },
        );
        recipes
    }

    #[test]
    fn test_missing_record_lists_empty() {
        let dir = tempdir().unwrap();
        let store = PlanStore::new(dir.path().join("not-yet-created"));
        assert!(store.list_saved_plans().is_empty());
    }

    #[test]
    fn test_corrupt_record_lists_empty() -> Result<()> {
        let dir = tempdir()?;
        let store = PlanStore::new(dir.path());
        fs::write(store.record_path(), "{ not json")?;
        assert!(store.list_saved_plans().is_empty());
        Ok(())
    }

    #[test]
    fn test_saves_append_in_order_with_distinct_ids() -> Result<()> {
        let dir = tempdir()?;
        let store = PlanStore::new(dir.path());
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();

        let first = store.save_plan_at(&sample_plan("Lentil Soup"), &RecipeBook::new(), now)?;
        let second = store.save_plan_at(&sample_plan("Bean Chili"), &RecipeBook::new(), now)?;
        let third = store.save_plan(&sample_plan("Veggie Curry"), &sample_recipes())?;

        let listed = store.list_saved_plans();
        assert_eq!(listed.len(), 3);
        assert_eq!(listed[0], first);
        assert_eq!(listed[1], second);
        assert_eq!(listed[2], third);
        assert_eq!(first.id, "2025-03-01T12:00:00.000000Z");
        assert_eq!(second.id, "2025-03-01T12:00:00.000000Z-1");
        assert_ne!(third.id, first.id);
        Ok(())
    }

    #[test]
    fn test_round_trip_preserves_nested_data() -> Result<()> {
        let dir = tempdir()?;
        let store = PlanStore::new(dir.path());
        let saved = store.save_plan(&sample_plan("Lentil Soup"), &sample_recipes())?;

        let reopened = PlanStore::new(dir.path());
        let loaded = reopened.find_plan(&saved.id).expect("saved plan should be found");
        assert_eq!(loaded, saved);
        assert_eq!(loaded.recipes["Overnight Oats"].instructions.len(), 2);
        Ok(())
    }

    #[test]
    fn test_record_uses_wire_names() -> Result<()> {
        let dir = tempdir()?;
        let store = PlanStore::new(dir.path());
        store.save_plan(&sample_plan("Lentil Soup"), &sample_recipes())?;

        let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(store.record_path())?)?;
        let record = &raw.as_array().expect("record is an array")[0];
        assert!(record.get("savedAt").is_some());
        assert_eq!(record["plan"]["monday"]["dinner"], "Lentil Soup");
        assert_eq!(record["recipes"]["Overnight Oats"]["cookTime"], "5 minutes");
        Ok(())
    }

    #[test]
    fn test_delete_removes_only_matching_record() -> Result<()> {
        let dir = tempdir()?;
        let store = PlanStore::new(dir.path());
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let a = store.save_plan_at(&sample_plan("A"), &RecipeBook::new(), now)?;
        let b = store.save_plan_at(&sample_plan("B"), &RecipeBook::new(), now)?;
        let c = store.save_plan_at(&sample_plan("C"), &RecipeBook::new(), now)?;

        assert!(store.delete_plan(&b.id)?);
        assert_eq!(store.list_saved_plans(), vec![a.clone(), c.clone()]);

        assert!(!store.delete_plan("nonexistent-id")?);
        assert!(!store.delete_plan(&b.id)?);
        assert_eq!(store.list_saved_plans(), vec![a, c]);
        Ok(())
    }

    #[test]
    fn test_save_over_corrupt_record_starts_fresh() -> Result<()> {
        let dir = tempdir()?;
        let store = PlanStore::new(dir.path());
        fs::write(store.record_path(), "[{\"id\": 5}]")?;
        store.save_plan(&sample_plan("Lentil Soup"), &RecipeBook::new())?;
        assert_eq!(store.list_saved_plans().len(), 1);
        assert!(!dir.path().join("ai-meal-plans.json.tmp").exists());
        Ok(())
    }
}
