//! Request bodies, raw model answers and the validated results handed back
//! to clients. Raw types are lenient; nothing leaves this module unchecked.

use serde::{Deserialize, Serialize};

use crate::nutrition::types::{FoodCatalogEntry, Nutrients};

// --- requests ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateJsonRequest {
    pub photo_data_uri: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AugmentItem {
    pub food_item: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct AugmentRequest {
    pub items: Vec<AugmentItem>,
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecipeGoal {
    LowerCalorie,
    HigherProtein,
    LowerFat,
    LowerCarb,
    Vegan,
    Vegetarian,
}

impl RecipeGoal {
    /// Phrase used inside the prompt.
    pub fn describe(self) -> &'static str {
        match self {
            RecipeGoal::LowerCalorie => "lower in calories",
            RecipeGoal::HigherProtein => "higher in protein",
            RecipeGoal::LowerFat => "lower in fat",
            RecipeGoal::LowerCarb => "lower in carbohydrates",
            RecipeGoal::Vegan => "vegan (no animal products)",
            RecipeGoal::Vegetarian => "vegetarian (no meat)",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RecipeRequest {
    pub ingredients: String,
    pub instructions: String,
    pub goal: RecipeGoal,
}

// --- raw model answers ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawEstimate {
    #[serde(default)]
    pub food_items: Vec<RawEstimatedFood>,
    pub total_calories: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawEstimatedFood {
    pub name: String,
    pub weight_grams: Option<f64>,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawSuggestion {
    pub food_item: String,
    pub quantity: Option<String>,
    pub weight: Option<f64>,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawParsedFood {
    pub name: String,
    pub weight: f64,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawRecipeAnswer {
    pub original_nutrition: Nutrients,
    pub reimagined_recipe: ReimaginedRecipe,
    pub reimagined_nutrition: Nutrients,
}

// --- validated results ---

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub food_item: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    pub reason: String,
}

/// One food recognised in a photo, with suggested portion details.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimatedFood {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    pub reason: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageEstimate {
    pub items: Vec<EstimatedFood>,
    pub total_calories: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResults {
    pub results: Vec<FoodCatalogEntry>,
}

/// A food read from free text; values are absolute for `weight` grams.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedFood {
    pub name: String,
    pub weight: f64,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReimaginedRecipe {
    pub title: String,
    pub description: String,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    pub nutrition_analysis: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeResult {
    pub original_nutrition: Nutrients,
    pub reimagined_recipe: ReimaginedRecipe,
    pub reimagined_nutrition: Nutrients,
}
