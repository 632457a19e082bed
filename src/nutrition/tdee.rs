//! Maintenance-calorie estimate (Mifflin-St Jeor BMR times an activity
//! factor) and the weekly-goal adjustment applied on top of it.

use serde::{Deserialize, Serialize};

use super::error::NutritionError;
use super::types::{ActivityLevel, Gender, UserProfile, WeeklyGoal};

/// Roughly the energy in one kilogram of body mass.
pub const KCAL_PER_KG: f64 = 7700.0;

impl ActivityLevel {
    pub fn multiplier(self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::Light => 1.375,
            ActivityLevel::Moderate => 1.55,
            ActivityLevel::Active => 1.725,
            ActivityLevel::VeryActive => 1.9,
        }
    }
}

impl WeeklyGoal {
    /// Daily kcal delta for the goal.
    pub fn daily_adjustment(self) -> f64 {
        match self {
            WeeklyGoal::Lose1 => -1100.0,
            WeeklyGoal::Lose075 => -825.0,
            WeeklyGoal::Lose05 => -550.0,
            WeeklyGoal::Maintain => 0.0,
            WeeklyGoal::Gain05 => 550.0,
            WeeklyGoal::Gain075 => 825.0,
            WeeklyGoal::Gain1 => 1100.0,
        }
    }
}

/// Complete inputs for the estimate.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BodyMetrics {
    pub weight: f64,
    pub height: f64,
    pub age: u32,
    pub gender: Gender,
    pub activity_level: ActivityLevel,
}

/// Possibly incomplete inputs, as they arrive from a request.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MetricsInput {
    pub weight: Option<f64>,
    pub height: Option<f64>,
    pub age: Option<u32>,
    pub gender: Option<Gender>,
    pub activity_level: Option<ActivityLevel>,
    pub weekly_goal: Option<WeeklyGoal>,
}

impl MetricsInput {
    /// Fills gaps from the stored profile; the profile's current weight
    /// stands in for a missing weight.
    pub fn or_profile(self, profile: &UserProfile) -> Self {
        Self {
            weight: self.weight.or(Some(profile.current_weight)),
            height: self.height.or(profile.height),
            age: self.age.or(profile.age),
            gender: self.gender.or(profile.gender),
            activity_level: self.activity_level.or(profile.activity_level),
            weekly_goal: self.weekly_goal.or(profile.weekly_goal),
        }
    }

    pub fn into_metrics(self) -> Result<BodyMetrics, NutritionError> {
        let weight = self.weight.ok_or(NutritionError::MissingMetric("weight"))?;
        let height = self.height.ok_or(NutritionError::MissingMetric("height"))?;
        let age = self.age.ok_or(NutritionError::MissingMetric("age"))?;
        let gender = self.gender.ok_or(NutritionError::MissingMetric("gender"))?;
        let activity_level = self
            .activity_level
            .ok_or(NutritionError::MissingMetric("activityLevel"))?;
        BodyMetrics::new(weight, height, age, gender, activity_level)
    }
}

impl BodyMetrics {
    pub fn new(
        weight: f64,
        height: f64,
        age: u32,
        gender: Gender,
        activity_level: ActivityLevel,
    ) -> Result<Self, NutritionError> {
        if !weight.is_finite() || weight <= 0.0 {
            return Err(NutritionError::invalid("weight", "must be positive"));
        }
        if !height.is_finite() || height <= 0.0 {
            return Err(NutritionError::invalid("height", "must be positive"));
        }
        if age == 0 {
            return Err(NutritionError::invalid("age", "must be positive"));
        }
        Ok(Self {
            weight,
            height,
            age,
            gender,
            activity_level,
        })
    }

    /// Basal metabolic rate, kcal/day.
    pub fn bmr(&self) -> f64 {
        let offset = match self.gender {
            Gender::Male => 5.0,
            Gender::Female => -161.0,
        };
        10.0 * self.weight + 6.25 * self.height - 5.0 * f64::from(self.age) + offset
    }

    /// Maintenance calories, rounded to whole kcal.
    pub fn maintenance(&self) -> f64 {
        (self.bmr() * self.activity_level.multiplier()).round()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TdeeEstimate {
    pub metrics: BodyMetrics,
    pub bmr: f64,
    pub maintenance_calories: f64,
    pub weekly_goal: WeeklyGoal,
    pub adjustment: f64,
    /// The value offered for adoption as the daily goal.
    pub suggested_goal: f64,
}

pub fn estimate(metrics: BodyMetrics, weekly_goal: WeeklyGoal) -> TdeeEstimate {
    let maintenance = metrics.maintenance();
    let adjustment = weekly_goal.daily_adjustment();
    TdeeEstimate {
        metrics,
        bmr: metrics.bmr(),
        maintenance_calories: maintenance,
        weekly_goal,
        adjustment,
        suggested_goal: maintenance + adjustment,
    }
}
