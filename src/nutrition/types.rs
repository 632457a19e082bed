use std::iter::Sum;
use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};
use time::Date;
use uuid::Uuid;

/// Calendar days travel as `YYYY-MM-DD` everywhere: stored snapshots,
/// request bodies and query strings.
pub mod day {
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};
    use time::{format_description::BorrowedFormatItem, macros::format_description, Date};

    const DAY_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

    pub fn parse(s: &str) -> Result<Date, time::error::Parse> {
        Date::parse(s.trim(), DAY_FORMAT)
    }

    pub fn format(date: Date) -> String {
        // the format is statically valid for every Date
        date.format(DAY_FORMAT).unwrap_or_default()
    }

    pub fn serialize<S: Serializer>(date: &Date, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format(*date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Date, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).map_err(D::Error::custom)
    }

    pub mod option {
        use serde::{de::Error as _, Deserialize, Deserializer};
        use time::Date;

        use super::parse;

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Date>, D::Error> {
            Option::<String>::deserialize(d)?
                .map(|raw| parse(&raw).map_err(D::Error::custom))
                .transpose()
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snacks,
}

impl MealType {
    /// Display order of a day's log.
    pub const ALL: [MealType; 4] = [
        MealType::Breakfast,
        MealType::Lunch,
        MealType::Dinner,
        MealType::Snacks,
    ];
}

/// Macro grams, used both for goals and remaining amounts.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Macros {
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

/// Calories plus macros. Either absolute (for a logged weight) or
/// normalized to 100 g, depending on where it comes from.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Nutrients {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl Nutrients {
    pub fn macros(&self) -> Macros {
        Macros {
            protein: self.protein,
            carbs: self.carbs,
            fat: self.fat,
        }
    }
}

impl Add for Nutrients {
    type Output = Nutrients;

    fn add(self, rhs: Nutrients) -> Nutrients {
        Nutrients {
            calories: self.calories + rhs.calories,
            protein: self.protein + rhs.protein,
            carbs: self.carbs + rhs.carbs,
            fat: self.fat + rhs.fat,
        }
    }
}

impl AddAssign for Nutrients {
    fn add_assign(&mut self, rhs: Nutrients) {
        *self = *self + rhs;
    }
}

impl Sum for Nutrients {
    fn sum<I: Iterator<Item = Nutrients>>(iter: I) -> Nutrients {
        iter.fold(Nutrients::default(), Add::add)
    }
}

/// One logged food. Absolute values always correspond to `weight`;
/// the `base_*` fields keep the per-100g reference for later rescaling.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FoodItem {
    pub id: Uuid,
    pub name: String,
    pub weight: f64,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub meal_type: MealType,
    #[serde(with = "day")]
    pub date: Date,
    pub base_calories: f64,
    pub base_protein: f64,
    pub base_carbs: f64,
    pub base_fat: f64,
}

impl FoodItem {
    pub fn nutrients(&self) -> Nutrients {
        Nutrients {
            calories: self.calories,
            protein: self.protein,
            carbs: self.carbs,
            fat: self.fat,
        }
    }

    pub fn base(&self) -> Nutrients {
        Nutrients {
            calories: self.base_calories,
            protein: self.base_protein,
            carbs: self.base_carbs,
            fat: self.base_fat,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ActivityLevel {
    Sedentary,
    Light,
    Moderate,
    Active,
    VeryActive,
}

/// Named weekly weight-change target.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum WeeklyGoal {
    #[serde(rename = "lose1")]
    Lose1,
    #[serde(rename = "lose0.75")]
    Lose075,
    #[serde(rename = "lose0.5")]
    Lose05,
    #[default]
    #[serde(rename = "maintain")]
    Maintain,
    #[serde(rename = "gain0.5")]
    Gain05,
    #[serde(rename = "gain0.75")]
    Gain075,
    #[serde(rename = "gain1")]
    Gain1,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub current_weight: f64,
    pub goal_weight: f64,
    pub daily_goal: f64,
    pub macro_goal: Macros,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_level: Option<ActivityLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintenance_calories: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekly_goal: Option<WeeklyGoal>,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            current_weight: 75.0,
            goal_weight: 72.0,
            daily_goal: 2200.0,
            macro_goal: Macros {
                protein: 150.0,
                carbs: 250.0,
                fat: 70.0,
            },
            age: Some(30),
            gender: Some(Gender::Male),
            height: Some(180.0),
            activity_level: Some(ActivityLevel::Moderate),
            maintenance_calories: None,
            weekly_goal: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServingUnit {
    pub name: String,
    pub grams: f64,
}

impl ServingUnit {
    pub fn gram() -> Self {
        Self {
            name: "g".into(),
            grams: 1.0,
        }
    }
}

/// Read-only food reference data with per-100g values, as returned by a
/// food search. Copied into a [`FoodItem`] once the user picks it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FoodCatalogEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    #[serde(default)]
    pub serving_units: Vec<ServingUnit>,
}

impl FoodCatalogEntry {
    pub fn per_100g(&self) -> Nutrients {
        Nutrients {
            calories: self.calories,
            protein: self.protein,
            carbs: self.carbs,
            fat: self.fat,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn food_item_uses_camel_case_snapshot_keys() {
        let item = FoodItem {
            id: Uuid::nil(),
            name: "Apple".into(),
            weight: 150.0,
            calories: 78.0,
            protein: 0.0,
            carbs: 21.0,
            fat: 0.0,
            meal_type: MealType::Snacks,
            date: date!(2024 - 03 - 09),
            base_calories: 52.0,
            base_protein: 0.3,
            base_carbs: 14.0,
            base_fat: 0.2,
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["mealType"], "Snacks");
        assert_eq!(json["date"], "2024-03-09");
        assert_eq!(json["baseCalories"], 52.0);

        let back: FoodItem = serde_json::from_value(json).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn enums_use_wire_names() {
        assert_eq!(serde_json::to_string(&ActivityLevel::VeryActive).unwrap(), "\"veryActive\"");
        assert_eq!(serde_json::to_string(&Gender::Female).unwrap(), "\"female\"");
        let goal: WeeklyGoal = serde_json::from_str("\"lose0.75\"").unwrap();
        assert_eq!(goal, WeeklyGoal::Lose075);
    }

    #[test]
    fn day_rejects_garbage() {
        assert!(day::parse("2024-13-01").is_err());
        assert!(day::parse("yesterday").is_err());
        assert_eq!(day::parse(" 2024-01-31 ").unwrap(), date!(2024 - 01 - 31));
        assert_eq!(day::format(date!(2024 - 01 - 05)), "2024-01-05");
    }

    #[test]
    fn profile_without_metrics_still_loads() {
        let raw = r#"{"currentWeight":80,"goalWeight":75,"dailyGoal":2000,
                      "macroGoal":{"protein":120,"carbs":200,"fat":60}}"#;
        let profile: UserProfile = serde_json::from_str(raw).unwrap();
        assert_eq!(profile.age, None);
        assert_eq!(profile.daily_goal, 2000.0);
    }

    #[test]
    fn nutrients_sum() {
        let total: Nutrients = [
            Nutrients { calories: 100.0, protein: 1.0, carbs: 2.0, fat: 3.0 },
            Nutrients { calories: 50.0, protein: 4.0, carbs: 0.0, fat: 1.0 },
        ]
        .into_iter()
        .sum();
        assert_eq!(total, Nutrients { calories: 150.0, protein: 5.0, carbs: 2.0, fat: 4.0 });
    }
}
