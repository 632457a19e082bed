use serde::Serialize;
use time::{Date, Duration};

use super::types::{day, FoodItem, MealType, Nutrients};

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MealSummary {
    pub meal_type: MealType,
    /// Insertion order.
    pub items: Vec<FoodItem>,
    pub totals: Nutrients,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    #[serde(with = "day")]
    pub date: Date,
    /// Always the four meals, in [`MealType::ALL`] order.
    pub meals: Vec<MealSummary>,
    pub totals: Nutrients,
}

/// Groups one day's entries by meal and sums them. Days and meals without
/// entries come back as zero totals.
pub fn summarize_day(items: &[FoodItem], date: Date) -> DailySummary {
    let meals: Vec<MealSummary> = MealType::ALL
        .iter()
        .map(|&meal_type| {
            let items: Vec<FoodItem> = items
                .iter()
                .filter(|i| i.date == date && i.meal_type == meal_type)
                .cloned()
                .collect();
            let totals = items.iter().map(FoodItem::nutrients).sum();
            MealSummary {
                meal_type,
                items,
                totals,
            }
        })
        .collect();
    let totals = meals.iter().map(|m| m.totals).sum();
    DailySummary {
        date,
        meals,
        totals,
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DayTotals {
    #[serde(with = "day")]
    pub date: Date,
    pub totals: Nutrients,
}

/// Per-day sums for the `days` days ending at `end`, oldest first.
pub fn daily_trend(items: &[FoodItem], end: Date, days: u16) -> Vec<DayTotals> {
    (0..i64::from(days))
        .rev()
        .filter_map(|back| end.checked_sub(Duration::days(back)))
        .map(|date| DayTotals {
            date,
            totals: items
                .iter()
                .filter(|i| i.date == date)
                .map(FoodItem::nutrients)
                .sum(),
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MacroShare {
    pub grams: f64,
    pub percent: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MacroDistribution {
    pub protein: MacroShare,
    pub carbs: MacroShare,
    pub fat: MacroShare,
}

/// Share of each macro (by grams) over every logged entry. `None` when no
/// macro grams were logged at all.
pub fn macro_distribution(items: &[FoodItem]) -> Option<MacroDistribution> {
    let sum: Nutrients = items.iter().map(FoodItem::nutrients).sum();
    let total = sum.protein + sum.carbs + sum.fat;
    if total <= 0.0 {
        return None;
    }
    let share = |grams: f64| MacroShare {
        grams,
        percent: grams / total * 100.0,
    };
    Some(MacroDistribution {
        protein: share(sum.protein),
        carbs: share(sum.carbs),
        fat: share(sum.fat),
    })
}
