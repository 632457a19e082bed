use serde::{Deserialize, Serialize};
use time::Date;

use crate::nutrition::aggregate::{DailySummary, DayTotals, MacroDistribution};
use crate::nutrition::goals::GoalProgress;
use crate::nutrition::scaler::ManualFood;
use crate::nutrition::types::{day, FoodCatalogEntry, FoodItem, MealType};

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    #[serde(default, deserialize_with = "day::option::deserialize")]
    pub date: Option<Date>,
}

#[derive(Debug, Deserialize)]
pub struct ProgressQuery {
    #[serde(default = "default_days")]
    pub days: u16,
}
fn default_days() -> u16 {
    7
}
pub const MAX_PROGRESS_DAYS: u16 = 31;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFood {
    pub name: String,
    pub weight: f64,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl From<NewFood> for ManualFood {
    fn from(f: NewFood) -> Self {
        ManualFood {
            name: f.name,
            weight: f.weight,
            calories: f.calories,
            protein: f.protein,
            carbs: f.carbs,
            fat: f.fat,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddFoodRequest {
    #[serde(default, deserialize_with = "day::option::deserialize")]
    pub date: Option<Date>,
    pub meal_type: MealType,
    pub items: Vec<NewFood>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCatalogFoodRequest {
    #[serde(default, deserialize_with = "day::option::deserialize")]
    pub date: Option<Date>,
    pub meal_type: MealType,
    pub food: FoodCatalogEntry,
    #[serde(default = "default_unit")]
    pub unit: String,
    pub quantity: f64,
}
fn default_unit() -> String {
    "g".into()
}

#[derive(Debug, Deserialize)]
pub struct RescaleRequest {
    pub weight: f64,
}

#[derive(Debug, Deserialize)]
pub struct ReplaceFoodRequest {
    pub food: FoodCatalogEntry,
}

#[derive(Debug, Serialize)]
pub struct AddedFoods {
    pub items: Vec<FoodItem>,
}

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub summary: DailySummary,
    pub goals: GoalProgress,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub daily_goal: f64,
    pub days: Vec<DayTotals>,
    pub macro_distribution: Option<MacroDistribution>,
}
