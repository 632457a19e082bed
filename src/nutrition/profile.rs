use super::error::{ensure_non_negative, ensure_positive, NutritionError};
use super::goals::MacroSplit;
use super::tdee::TdeeEstimate;
use super::types::UserProfile;

/// Profile changes. Macro grams and the daily goal only move together when
/// explicitly asked to.
#[derive(Debug, Clone)]
pub enum ProfileAction {
    Replace(UserProfile),
    ApplyMacroSplit(MacroSplit),
    ApplyTdee(TdeeEstimate),
}

impl UserProfile {
    pub fn validate(&self) -> Result<(), NutritionError> {
        ensure_positive("currentWeight", self.current_weight)?;
        ensure_positive("goalWeight", self.goal_weight)?;
        ensure_positive("dailyGoal", self.daily_goal)?;
        ensure_non_negative("macroGoal.protein", self.macro_goal.protein)?;
        ensure_non_negative("macroGoal.carbs", self.macro_goal.carbs)?;
        ensure_non_negative("macroGoal.fat", self.macro_goal.fat)?;
        if let Some(height) = self.height {
            ensure_positive("height", height)?;
        }
        if self.age == Some(0) {
            return Err(NutritionError::invalid("age", "must be positive"));
        }
        if let Some(maintenance) = self.maintenance_calories {
            ensure_positive("maintenanceCalories", maintenance)?;
        }
        Ok(())
    }

    /// Applies `action` to a copy and swaps it in only if the result is
    /// valid.
    pub fn apply(&mut self, action: ProfileAction) -> Result<(), NutritionError> {
        let mut next = self.clone();
        match action {
            ProfileAction::Replace(profile) => next = profile,
            ProfileAction::ApplyMacroSplit(split) => {
                next.macro_goal = split.to_grams(next.daily_goal)?;
            }
            ProfileAction::ApplyTdee(estimate) => {
                next.daily_goal = estimate.suggested_goal;
                next.maintenance_calories = Some(estimate.maintenance_calories);
                next.weekly_goal = Some(estimate.weekly_goal);
                next.current_weight = estimate.metrics.weight;
                next.height = Some(estimate.metrics.height);
                next.age = Some(estimate.metrics.age);
                next.gender = Some(estimate.metrics.gender);
                next.activity_level = Some(estimate.metrics.activity_level);
            }
        }
        next.validate()?;
        *self = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrition::tdee::{estimate, BodyMetrics};
    use crate::nutrition::types::{ActivityLevel, Gender, Macros, WeeklyGoal};

    #[test]
    fn default_profile_is_valid() {
        assert!(UserProfile::default().validate().is_ok());
    }

    #[test]
    fn replace_rejects_invalid_and_keeps_old() {
        let mut profile = UserProfile::default();
        let bad = UserProfile { daily_goal: 0.0, ..UserProfile::default() };
        assert!(profile.apply(ProfileAction::Replace(bad)).is_err());
        assert_eq!(profile, UserProfile::default());

        let negative_fat = UserProfile {
            macro_goal: Macros { protein: 100.0, carbs: 100.0, fat: -1.0 },
            ..UserProfile::default()
        };
        assert!(profile.apply(ProfileAction::Replace(negative_fat)).is_err());
    }

    #[test]
    fn goal_edit_does_not_touch_macros() {
        let mut profile = UserProfile::default();
        let edited = UserProfile { daily_goal: 1800.0, ..profile.clone() };
        profile.apply(ProfileAction::Replace(edited)).unwrap();
        assert_eq!(profile.daily_goal, 1800.0);
        assert_eq!(profile.macro_goal, UserProfile::default().macro_goal);
    }

    #[test]
    fn macro_split_uses_current_goal() {
        let mut profile = UserProfile::default();
        profile.apply(ProfileAction::ApplyMacroSplit(MacroSplit::default())).unwrap();
        assert_eq!(profile.macro_goal, Macros { protein: 220.0, carbs: 220.0, fat: 49.0 });
    }

    #[test]
    fn rejected_split_leaves_macros_alone() {
        let mut profile = UserProfile::default();
        let split = MacroSplit { protein: 30, carbs: 30, fat: 30 };
        assert_eq!(
            profile.apply(ProfileAction::ApplyMacroSplit(split)),
            Err(NutritionError::MacroSplitTotal(90))
        );
        assert_eq!(profile.macro_goal, UserProfile::default().macro_goal);
    }

    #[test]
    fn tdee_sets_adjusted_goal_not_maintenance() {
        let mut profile = UserProfile::default();
        let metrics = BodyMetrics::new(75.0, 180.0, 30, Gender::Male, ActivityLevel::Sedentary).unwrap();
        profile.apply(ProfileAction::ApplyTdee(estimate(metrics, WeeklyGoal::Lose05))).unwrap();
        assert_eq!(profile.daily_goal, 1526.0);
        assert_eq!(profile.maintenance_calories, Some(2076.0));
        assert_eq!(profile.weekly_goal, Some(WeeklyGoal::Lose05));
        assert_eq!(profile.activity_level, Some(ActivityLevel::Sedentary));
        assert_eq!(profile.macro_goal, UserProfile::default().macro_goal);
    }
}
