//! Serving-size arithmetic: per-100g baselines to absolute amounts and back.

use time::Date;
use uuid::Uuid;

use super::error::{ensure_non_negative, ensure_positive, NutritionError};
use super::types::{FoodCatalogEntry, FoodItem, MealType, Nutrients, ServingUnit};

/// Weight every base value is normalized to.
pub const REFERENCE_GRAMS: f64 = 100.0;

/// Absolute nutrients for `grams` of a food, each field rounded to the
/// nearest whole unit.
pub fn scale(base: &Nutrients, grams: f64) -> Result<Nutrients, NutritionError> {
    ensure_weight(grams)?;
    let ratio = grams / REFERENCE_GRAMS;
    Ok(Nutrients {
        calories: (base.calories * ratio).round(),
        protein: (base.protein * ratio).round(),
        carbs: (base.carbs * ratio).round(),
        fat: (base.fat * ratio).round(),
    })
}

/// Inverse of [`scale`]: per-100g values for an absolute amount logged at
/// `grams`. Not rounded, since the base must survive later rescaling.
pub fn per_100g(absolute: &Nutrients, grams: f64) -> Result<Nutrients, NutritionError> {
    ensure_weight(grams)?;
    let ratio = REFERENCE_GRAMS / grams;
    Ok(Nutrients {
        calories: absolute.calories * ratio,
        protein: absolute.protein * ratio,
        carbs: absolute.carbs * ratio,
        fat: absolute.fat * ratio,
    })
}

/// Grams for `quantity` of a named serving unit. Unknown units are
/// rejected rather than silently read as grams.
pub fn resolve_serving(
    units: &[ServingUnit],
    unit: &str,
    quantity: f64,
) -> Result<f64, NutritionError> {
    if !quantity.is_finite() || quantity <= 0.0 {
        return Err(NutritionError::NonPositiveQuantity(quantity));
    }
    let unit = unit.trim();
    let per_unit = match units.iter().find(|u| u.name.eq_ignore_ascii_case(unit)) {
        Some(serving) => serving.grams,
        // every food answers to plain grams, listed or not
        None if unit == "g" => 1.0,
        None => return Err(NutritionError::UnknownServingUnit(unit.to_string())),
    };
    let grams = per_unit * quantity;
    ensure_weight(grams)?;
    Ok(grams)
}

fn ensure_weight(grams: f64) -> Result<(), NutritionError> {
    if !grams.is_finite() || grams <= 0.0 {
        return Err(NutritionError::NonPositiveWeight(grams));
    }
    Ok(())
}

/// Fields of a manually entered (or AI-accepted) food, all absolute for
/// `weight` grams.
#[derive(Debug, Clone, PartialEq)]
pub struct ManualFood {
    pub name: String,
    pub weight: f64,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl ManualFood {
    pub fn validate(&self) -> Result<(), NutritionError> {
        if self.name.trim().chars().count() < 2 {
            return Err(NutritionError::invalid("name", "must be at least 2 characters"));
        }
        if !self.weight.is_finite() || self.weight <= 0.0 {
            return Err(NutritionError::NonPositiveWeight(self.weight));
        }
        ensure_positive("calories", self.calories)?;
        ensure_non_negative("protein", self.protein)?;
        ensure_non_negative("carbs", self.carbs)?;
        ensure_non_negative("fat", self.fat)?;
        Ok(())
    }

    fn absolute(&self) -> Nutrients {
        Nutrients {
            calories: self.calories,
            protein: self.protein,
            carbs: self.carbs,
            fat: self.fat,
        }
    }
}

pub(crate) fn validate_catalog(food: &FoodCatalogEntry) -> Result<(), NutritionError> {
    if food.name.trim().is_empty() {
        return Err(NutritionError::invalid("name", "cannot be empty"));
    }
    ensure_non_negative("calories", food.calories)?;
    ensure_non_negative("protein", food.protein)?;
    ensure_non_negative("carbs", food.carbs)?;
    ensure_non_negative("fat", food.fat)?;
    Ok(())
}

impl FoodItem {
    /// New entry from absolute values; the base is derived from them.
    pub fn from_manual(
        food: &ManualFood,
        meal_type: MealType,
        date: Date,
    ) -> Result<Self, NutritionError> {
        food.validate()?;
        let base = per_100g(&food.absolute(), food.weight)?;
        Ok(Self {
            id: Uuid::new_v4(),
            name: food.name.trim().to_string(),
            weight: food.weight,
            calories: food.calories,
            protein: food.protein,
            carbs: food.carbs,
            fat: food.fat,
            meal_type,
            date,
            base_calories: base.calories,
            base_protein: base.protein,
            base_carbs: base.carbs,
            base_fat: base.fat,
        })
    }

    /// New entry for `grams` of a catalog food.
    pub fn from_catalog(
        food: &FoodCatalogEntry,
        grams: f64,
        meal_type: MealType,
        date: Date,
    ) -> Result<Self, NutritionError> {
        validate_catalog(food)?;
        let base = food.per_100g();
        let scaled = scale(&base, grams)?;
        let mut item = Self {
            id: Uuid::new_v4(),
            name: food.name.clone(),
            weight: grams,
            calories: 0.0,
            protein: 0.0,
            carbs: 0.0,
            fat: 0.0,
            meal_type,
            date,
            base_calories: base.calories,
            base_protein: base.protein,
            base_carbs: base.carbs,
            base_fat: base.fat,
        };
        item.set_absolute(scaled);
        Ok(item)
    }

    /// Checks a stored entry: a name, a usable weight, and no negative
    /// amounts in either the absolute or the base values.
    pub fn validate(&self) -> Result<(), NutritionError> {
        if self.name.trim().is_empty() {
            return Err(NutritionError::invalid("name", "cannot be empty"));
        }
        ensure_weight(self.weight)?;
        for (field, value) in [
            ("calories", self.calories),
            ("protein", self.protein),
            ("carbs", self.carbs),
            ("fat", self.fat),
            ("baseCalories", self.base_calories),
            ("baseProtein", self.base_protein),
            ("baseCarbs", self.base_carbs),
            ("baseFat", self.base_fat),
        ] {
            ensure_non_negative(field, value)?;
        }
        Ok(())
    }

    /// Changes the logged weight; absolute values follow the base.
    pub fn rescale(&mut self, grams: f64) -> Result<(), NutritionError> {
        let scaled = scale(&self.base(), grams)?;
        self.weight = grams;
        self.set_absolute(scaled);
        Ok(())
    }

    /// Swaps in a different food at the current weight. Id, date and meal
    /// are kept.
    pub fn replace_food(&mut self, food: &FoodCatalogEntry) -> Result<(), NutritionError> {
        validate_catalog(food)?;
        let base = food.per_100g();
        let scaled = scale(&base, self.weight)?;
        self.name = food.name.clone();
        self.base_calories = base.calories;
        self.base_protein = base.protein;
        self.base_carbs = base.carbs;
        self.base_fat = base.fat;
        self.set_absolute(scaled);
        Ok(())
    }

    fn set_absolute(&mut self, n: Nutrients) {
        self.calories = n.calories;
        self.protein = n.protein;
        self.carbs = n.carbs;
        self.fat = n.fat;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn oats() -> FoodCatalogEntry {
        FoodCatalogEntry {
            name: "Rolled oats".into(),
            brand: None,
            calories: 379.0,
            protein: 13.2,
            carbs: 67.7,
            fat: 6.5,
            serving_units: vec![
                ServingUnit::gram(),
                ServingUnit { name: "cup".into(), grams: 81.0 },
            ],
        }
    }

    #[test]
    fn scale_rounds_each_field() {
        let n = scale(&oats().per_100g(), 40.0).unwrap();
        assert_eq!(n.calories, (379.0_f64 * 0.4).round());
        assert_eq!(n.protein, 5.0);
        assert_eq!(n.carbs, 27.0);
        assert_eq!(n.fat, 3.0);
    }

    #[test]
    fn scale_matches_formula_across_weights() {
        let base = oats().per_100g();
        for w in [1.0, 7.5, 33.0, 100.0, 250.0, 1234.5] {
            let n = scale(&base, w).unwrap();
            assert_eq!(n.calories, (base.calories * (w / 100.0)).round());
            assert_eq!(n.protein, (base.protein * (w / 100.0)).round());
            assert_eq!(n.carbs, (base.carbs * (w / 100.0)).round());
            assert_eq!(n.fat, (base.fat * (w / 100.0)).round());
        }
    }

    #[test]
    fn rescaling_through_inverse_is_stable() {
        let base = oats().per_100g();
        for w in [3.0, 45.0, 180.0, 999.0] {
            let first = scale(&base, w).unwrap();
            let again = scale(&per_100g(&first, w).unwrap(), w).unwrap();
            assert!((first.calories - again.calories).abs() <= 1.0);
            assert!((first.protein - again.protein).abs() <= 1.0);
            assert!((first.carbs - again.carbs).abs() <= 1.0);
            assert!((first.fat - again.fat).abs() <= 1.0);
        }
    }

    #[test]
    fn rejects_non_positive_weight() {
        let base = oats().per_100g();
        assert_eq!(scale(&base, 0.0), Err(NutritionError::NonPositiveWeight(0.0)));
        assert!(scale(&base, -5.0).is_err());
        assert!(scale(&base, f64::NAN).is_err());
    }

    #[test]
    fn serving_units_resolve_to_grams() {
        let food = oats();
        assert_eq!(resolve_serving(&food.serving_units, "cup", 1.5).unwrap(), 121.5);
        assert_eq!(resolve_serving(&food.serving_units, "CUP", 1.0).unwrap(), 81.0);
        assert_eq!(resolve_serving(&[], "g", 30.0).unwrap(), 30.0);
        assert_eq!(
            resolve_serving(&food.serving_units, "slice", 1.0),
            Err(NutritionError::UnknownServingUnit("slice".into()))
        );
        assert!(resolve_serving(&food.serving_units, "cup", 0.0).is_err());
    }

    #[test]
    fn catalog_entry_keeps_base_and_scales() {
        let item = FoodItem::from_catalog(&oats(), 81.0, MealType::Breakfast, date!(2024 - 05 - 01))
            .unwrap();
        assert_eq!(item.base_calories, 379.0);
        assert_eq!(item.calories, 307.0);
        assert_eq!(item.weight, 81.0);
    }

    #[test]
    fn rescale_then_back_restores_values() {
        let mut item =
            FoodItem::from_catalog(&oats(), 60.0, MealType::Breakfast, date!(2024 - 05 - 01))
                .unwrap();
        let original = item.nutrients();
        item.rescale(200.0).unwrap();
        assert_eq!(item.calories, 758.0);
        item.rescale(60.0).unwrap();
        assert_eq!(item.nutrients(), original);
        assert!(item.rescale(0.0).is_err());
        assert_eq!(item.weight, 60.0);
    }

    #[test]
    fn replace_keeps_identity_and_weight() {
        let mut item =
            FoodItem::from_catalog(&oats(), 50.0, MealType::Lunch, date!(2024 - 05 - 02)).unwrap();
        let id = item.id;
        let rice = FoodCatalogEntry {
            name: "White rice, cooked".into(),
            brand: None,
            calories: 130.0,
            protein: 2.7,
            carbs: 28.0,
            fat: 0.3,
            serving_units: vec![ServingUnit::gram()],
        };
        item.replace_food(&rice).unwrap();
        assert_eq!(item.id, id);
        assert_eq!(item.weight, 50.0);
        assert_eq!(item.meal_type, MealType::Lunch);
        assert_eq!(item.name, "White rice, cooked");
        assert_eq!(item.calories, 65.0);
        assert_eq!(item.base_carbs, 28.0);
    }

    #[test]
    fn manual_entry_derives_base() {
        let food = ManualFood {
            name: " Banana ".into(),
            weight: 120.0,
            calories: 107.0,
            protein: 1.3,
            carbs: 27.0,
            fat: 0.4,
        };
        let mut item = FoodItem::from_manual(&food, MealType::Snacks, date!(2024 - 05 - 03)).unwrap();
        assert_eq!(item.name, "Banana");
        assert!((item.base_calories - 89.1666).abs() < 0.001);
        item.rescale(120.0).unwrap();
        assert_eq!(item.calories, 107.0);
    }

    #[test]
    fn manual_entry_validation() {
        let ok = ManualFood {
            name: "Egg".into(),
            weight: 50.0,
            calories: 72.0,
            protein: 6.0,
            carbs: 0.4,
            fat: 5.0,
        };
        assert!(ok.validate().is_ok());
        assert!(ManualFood { name: "E".into(), ..ok.clone() }.validate().is_err());
        assert!(ManualFood { weight: 0.0, ..ok.clone() }.validate().is_err());
        assert!(ManualFood { calories: 0.0, ..ok.clone() }.validate().is_err());
        assert!(ManualFood { fat: -1.0, ..ok }.validate().is_err());
    }
}
