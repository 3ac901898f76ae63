use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

pub const DIET_OPTIONS: &[&str] = &[
    "None",
    "Vegetarian",
    "Vegan",
    "Keto",
    "Paleo",
    "Gluten-Free",
    "Mediterranean",
];

pub const CUISINE_OPTIONS: &[&str] = &[
    "Any",
    "Italian",
    "Mexican",
    "Chinese",
    "Indian",
    "Japanese",
    "Mediterranean",
    "American",
];

pub const BUDGET_OPTIONS: &[&str] = &["Low", "Medium", "High"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreferences {
    pub diet: String,
    /// Free-text, comma separated. Empty means none.
    pub allergies: String,
    pub cuisine: String,
    pub people: u32,
    pub budget: String,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            diet: DIET_OPTIONS[0].to_string(),
            allergies: String::new(),
            cuisine: CUISINE_OPTIONS[0].to_string(),
            people: 2,
            budget: BUDGET_OPTIONS[0].to_string(),
        }
    }
}

impl UserPreferences {
    pub fn allergies_or_none(&self) -> &str {
        let trimmed = self.allergies.trim();
        if trimmed.is_empty() {
            "none"
        } else {
            trimmed
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    /// The JSON key used for this day.
    pub fn key(self) -> &'static str {
        match self {
            Weekday::Monday => "monday",
            Weekday::Tuesday => "tuesday",
            Weekday::Wednesday => "wednesday",
            Weekday::Thursday => "thursday",
            Weekday::Friday => "friday",
            Weekday::Saturday => "saturday",
            Weekday::Sunday => "sunday",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
            Weekday::Sunday => "Sunday",
        }
    }
}

impl FromStr for Weekday {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        Weekday::ALL
            .into_iter()
            .find(|day| day.key() == lowered || day.key()[..3] == lowered)
            .ok_or_else(|| format!("unknown weekday '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
}

impl MealType {
    pub const ALL: [MealType; 3] = [MealType::Breakfast, MealType::Lunch, MealType::Dinner];

    pub fn key(self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
        }
    }
}

impl FromStr for MealType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        MealType::ALL
            .into_iter()
            .find(|meal| meal.key() == lowered)
            .ok_or_else(|| format!("unknown meal '{}', expected breakfast, lunch or dinner", s))
    }
}

/// Treats an explicit `null` the same as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One day's meals. Missing or null names decode as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealSlot {
    #[serde(default, deserialize_with = "null_as_default")]
    pub breakfast: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub lunch: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dinner: String,
}

impl MealSlot {
    pub fn get(&self, meal: MealType) -> &str {
        match meal {
            MealType::Breakfast => &self.breakfast,
            MealType::Lunch => &self.lunch,
            MealType::Dinner => &self.dinner,
        }
    }
}

/// A full week. All seven days are always present, even if the model skipped one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealPlan {
    #[serde(default, deserialize_with = "null_as_default")]
    pub monday: MealSlot,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tuesday: MealSlot,
    #[serde(default, deserialize_with = "null_as_default")]
    pub wednesday: MealSlot,
    #[serde(default, deserialize_with = "null_as_default")]
    pub thursday: MealSlot,
    #[serde(default, deserialize_with = "null_as_default")]
    pub friday: MealSlot,
    #[serde(default, deserialize_with = "null_as_default")]
    pub saturday: MealSlot,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sunday: MealSlot,
}

impl MealPlan {
    pub fn day(&self, day: Weekday) -> &MealSlot {
        match day {
            Weekday::Monday => &self.monday,
            Weekday::Tuesday => &self.tuesday,
            Weekday::Wednesday => &self.wednesday,
            Weekday::Thursday => &self.thursday,
            Weekday::Friday => &self.friday,
            Weekday::Saturday => &self.saturday,
            Weekday::Sunday => &self.sunday,
        }
    }

    pub fn day_mut(&mut self, day: Weekday) -> &mut MealSlot {
        match day {
            Weekday::Monday => &mut self.monday,
            Weekday::Tuesday => &mut self.tuesday,
            Weekday::Wednesday => &mut self.wednesday,
            Weekday::Thursday => &mut self.thursday,
            Weekday::Friday => &mut self.friday,
            Weekday::Saturday => &mut self.saturday,
            Weekday::Sunday => &mut self.sunday,
        }
    }

    /// All 21 slot values, Monday breakfast first.
    pub fn meal_names(&self) -> Vec<&str> {
        Weekday::ALL
            .into_iter()
            .flat_map(|day| {
                MealType::ALL
                    .into_iter()
                    .map(move |meal| self.day(day).get(meal))
            })
            .collect()
    }

    /// Distinct non-empty meal names by exact string equality, in first-seen order.
    pub fn unique_meal_names(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        self.meal_names()
            .into_iter()
            .filter(|name| !name.is_empty() && seen.insert(*name))
            .collect()
    }
}

/// Meals that cannot open a recipe: blanks and leftovers.
pub fn is_selectable_meal(name: &str) -> bool {
    !name.trim().is_empty() && !name.to_lowercase().contains("leftover")
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Free text such as "2 cups".
    #[serde(default, deserialize_with = "null_as_default")]
    pub quantity: String,
}

/// Model-estimated values, not guaranteed to be numeric.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NutritionEstimate {
    #[serde(default, deserialize_with = "null_as_default")]
    pub calories: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub protein: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub carbs: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fat: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(rename = "cookTime", default, deserialize_with = "null_as_default")]
    pub cook_time: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ingredients: Vec<Ingredient>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub instructions: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub nutrition: NutritionEstimate,
}

/// Recipes keyed by the exact meal name they were fetched for.
pub type RecipeBook = BTreeMap<String, Recipe>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GroceryCategory {
    Produce,
    DairyEggs,
    MeatSeafood,
    Pantry,
    Bakery,
    Frozen,
    Other,
}

impl GroceryCategory {
    pub const PREFERRED: [GroceryCategory; 7] = [
        GroceryCategory::Produce,
        GroceryCategory::DairyEggs,
        GroceryCategory::MeatSeafood,
        GroceryCategory::Pantry,
        GroceryCategory::Bakery,
        GroceryCategory::Frozen,
        GroceryCategory::Other,
    ];

    pub fn name(self) -> &'static str {
        match self {
            GroceryCategory::Produce => "Produce",
            GroceryCategory::DairyEggs => "Dairy & Eggs",
            GroceryCategory::MeatSeafood => "Meat & Seafood",
            GroceryCategory::Pantry => "Pantry",
            GroceryCategory::Bakery => "Bakery",
            GroceryCategory::Frozen => "Frozen",
            GroceryCategory::Other => "Other",
        }
    }

    /// Case-insensitive match against the preferred names.
    pub fn from_name(name: &str) -> Option<Self> {
        let trimmed = name.trim();
        GroceryCategory::PREFERRED
            .into_iter()
            .find(|category| category.name().eq_ignore_ascii_case(trimmed))
    }
}

impl fmt::Display for GroceryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Consolidated groceries grouped by aisle.
///
/// The preferred categories are typed; anything else the model invents is kept
/// under its own name in `extra`. Blank category names fold into `Other`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, Vec<String>>", into = "BTreeMap<String, Vec<String>>")]
pub struct ShoppingList {
    pub preferred: BTreeMap<GroceryCategory, Vec<String>>,
    pub extra: BTreeMap<String, Vec<String>>,
}

impl ShoppingList {
    pub fn is_empty(&self) -> bool {
        self.total_items() == 0
    }

    pub fn total_items(&self) -> usize {
        self.preferred.values().chain(self.extra.values()).map(Vec::len).sum()
    }

    pub fn items(&self, category: GroceryCategory) -> &[String] {
        self.preferred.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Preferred categories in their fixed order, then extras alphabetically.
    pub fn sections(&self) -> Vec<(&str, &[String])> {
        let preferred = GroceryCategory::PREFERRED.into_iter().filter_map(|category| {
            self.preferred
                .get(&category)
                .map(|items| (category.name(), items.as_slice()))
        });
        let extra = self
            .extra
            .iter()
            .map(|(name, items)| (name.as_str(), items.as_slice()));
        preferred.chain(extra).collect()
    }

    fn push(&mut self, category: &str, item: String) {
        let bucket = match GroceryCategory::from_name(category) {
            Some(known) => self.preferred.entry(known).or_default(),
            None if category.trim().is_empty() => {
                self.preferred.entry(GroceryCategory::Other).or_default()
            }
            None => self.extra.entry(category.trim().to_string()).or_default(),
        };
        if !bucket.contains(&item) {
            bucket.push(item);
        }
    }
}

impl From<BTreeMap<String, Vec<String>>> for ShoppingList {
    fn from(raw: BTreeMap<String, Vec<String>>) -> Self {
        let mut list = ShoppingList::default();
        for (category, items) in raw {
            for item in items {
                let item = item.trim();
                if !item.is_empty() {
                    list.push(&category, item.to_string());
                }
            }
        }
        list
    }
}

impl From<ShoppingList> for BTreeMap<String, Vec<String>> {
    fn from(list: ShoppingList) -> Self {
        list.preferred
            .into_iter()
            .map(|(category, items)| (category.name().to_string(), items))
            .chain(list.extra)
            .collect()
    }
}

/// Items the user has ticked off on the current shopping list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckedItems(BTreeSet<String>);

impl CheckedItems {
    /// Flips the item and returns its new state.
    pub fn toggle(&mut self, item: &str) -> bool {
        if self.0.remove(item) {
            false
        } else {
            self.0.insert(item.to_string());
            true
        }
    }

    pub fn is_checked(&self, item: &str) -> bool {
        self.0.contains(item)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedMealPlan {
    pub id: String,
    #[serde(rename = "savedAt")]
    pub saved_at: String,
    pub plan: MealPlan,
    #[serde(default)]
    pub recipes: RecipeBook,
}
