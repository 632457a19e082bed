use serde::{Deserialize, Serialize};

use super::error::NutritionError;
use super::types::{Macros, Nutrients, UserProfile};

pub const KCAL_PER_GRAM_PROTEIN: f64 = 4.0;
pub const KCAL_PER_GRAM_CARBS: f64 = 4.0;
pub const KCAL_PER_GRAM_FAT: f64 = 9.0;

/// Consumption measured against the profile's targets.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GoalProgress {
    pub daily_goal: f64,
    /// Raw total, never clamped.
    pub consumed_calories: f64,
    /// Clamped at zero once the goal is exceeded.
    pub remaining_calories: f64,
    pub progress_percent: f64,
    pub macro_goal: Macros,
    /// Goal minus consumed; negative once a macro goal is exceeded.
    pub macros_remaining: Macros,
}

pub fn evaluate(totals: &Nutrients, profile: &UserProfile) -> GoalProgress {
    let goal = profile.daily_goal;
    let progress_percent = if goal > 0.0 {
        totals.calories / goal * 100.0
    } else {
        0.0
    };
    GoalProgress {
        daily_goal: goal,
        consumed_calories: totals.calories,
        remaining_calories: (goal - totals.calories).max(0.0),
        progress_percent,
        macro_goal: profile.macro_goal,
        macros_remaining: Macros {
            protein: profile.macro_goal.protein - totals.protein,
            carbs: profile.macro_goal.carbs - totals.carbs,
            fat: profile.macro_goal.fat - totals.fat,
        },
    }
}

/// Calorie share per macro, in whole percent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct MacroSplit {
    pub protein: u32,
    pub carbs: u32,
    pub fat: u32,
}

impl Default for MacroSplit {
    fn default() -> Self {
        Self {
            protein: 40,
            carbs: 40,
            fat: 20,
        }
    }
}

impl MacroSplit {
    pub fn total(&self) -> u32 {
        self.protein + self.carbs + self.fat
    }

    /// Macro grams for a daily calorie goal, rounded to whole grams.
    pub fn to_grams(&self, daily_goal: f64) -> Result<Macros, NutritionError> {
        let total = self.total();
        if total != 100 {
            return Err(NutritionError::MacroSplitTotal(total));
        }
        if !daily_goal.is_finite() || daily_goal <= 0.0 {
            return Err(NutritionError::invalid("dailyGoal", "must be positive"));
        }
        let grams = |pct: u32, kcal_per_gram: f64| {
            (daily_goal * (f64::from(pct) / 100.0) / kcal_per_gram).round()
        };
        Ok(Macros {
            protein: grams(self.protein, KCAL_PER_GRAM_PROTEIN),
            carbs: grams(self.carbs, KCAL_PER_GRAM_CARBS),
            fat: grams(self.fat, KCAL_PER_GRAM_FAT),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn totals(calories: f64, protein: f64, carbs: f64, fat: f64) -> Nutrients {
        Nutrients { calories, protein, carbs, fat }
    }

    #[test]
    fn remaining_never_negative_but_total_is_raw() {
        let profile = UserProfile { daily_goal: 2000.0, ..UserProfile::default() };
        let p = evaluate(&totals(3500.0, 0.0, 0.0, 0.0), &profile);
        assert_eq!(p.remaining_calories, 0.0);
        assert_eq!(p.consumed_calories, 3500.0);
        assert_eq!(p.progress_percent, 175.0);

        let under = evaluate(&totals(500.0, 0.0, 0.0, 0.0), &profile);
        assert_eq!(under.remaining_calories, 1500.0);
        assert_eq!(under.progress_percent, 25.0);
    }

    #[test]
    fn zero_goal_means_zero_progress() {
        let profile = UserProfile { daily_goal: 0.0, ..UserProfile::default() };
        let p = evaluate(&totals(800.0, 0.0, 0.0, 0.0), &profile);
        assert_eq!(p.progress_percent, 0.0);
        assert_eq!(p.remaining_calories, 0.0);
    }

    #[test]
    fn macro_remaining_goes_negative() {
        let profile = UserProfile::default(); // 150 / 250 / 70
        let p = evaluate(&totals(1800.0, 180.0, 100.0, 70.0), &profile);
        assert_eq!(p.macros_remaining.protein, -30.0);
        assert_eq!(p.macros_remaining.carbs, 150.0);
        assert_eq!(p.macros_remaining.fat, 0.0);
    }

    #[test]
    fn split_40_40_20_of_2200() {
        let grams = MacroSplit::default().to_grams(2200.0).unwrap();
        assert_eq!(grams, Macros { protein: 220.0, carbs: 220.0, fat: 49.0 });
    }

    #[test]
    fn split_must_total_100() {
        let low = MacroSplit { protein: 30, carbs: 40, fat: 20 };
        assert_eq!(low.to_grams(2200.0), Err(NutritionError::MacroSplitTotal(90)));
        let high = MacroSplit { protein: 50, carbs: 40, fat: 20 };
        assert_eq!(high.to_grams(2200.0), Err(NutritionError::MacroSplitTotal(110)));
    }
}
