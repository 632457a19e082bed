//! The food log and the actions that change it. Every action is validated
//! in full before the log is touched, so a rejected action leaves it as it
//! was.

use serde::{Deserialize, Serialize};
use time::Date;
use uuid::Uuid;

use super::error::NutritionError;
use super::scaler::{resolve_serving, ManualFood};
use super::types::{FoodCatalogEntry, FoodItem, MealType};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct FoodLog {
    items: Vec<FoodItem>,
}

#[derive(Debug, Clone)]
pub enum LogAction {
    Add {
        date: Date,
        meal_type: MealType,
        foods: Vec<ManualFood>,
    },
    AddFromCatalog {
        date: Date,
        meal_type: MealType,
        food: FoodCatalogEntry,
        unit: String,
        quantity: f64,
    },
    Rescale {
        id: Uuid,
        weight: f64,
    },
    ReplaceFood {
        id: Uuid,
        food: FoodCatalogEntry,
    },
    Remove {
        id: Uuid,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum LogChange {
    Added(Vec<FoodItem>),
    Updated(FoodItem),
    Removed(FoodItem),
}

impl FoodLog {
    pub fn items(&self) -> &[FoodItem] {
        &self.items
    }

    /// First stored entry that fails [`FoodItem::validate`], if any.
    pub fn validate(&self) -> Result<(), NutritionError> {
        self.items.iter().try_for_each(FoodItem::validate)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn apply(&mut self, action: LogAction) -> Result<LogChange, NutritionError> {
        match action {
            LogAction::Add {
                date,
                meal_type,
                foods,
            } => {
                if foods.is_empty() {
                    return Err(NutritionError::invalid("items", "cannot be empty"));
                }
                let added = foods
                    .iter()
                    .map(|f| FoodItem::from_manual(f, meal_type, date))
                    .collect::<Result<Vec<_>, _>>()?;
                self.items.extend(added.iter().cloned());
                Ok(LogChange::Added(added))
            }
            LogAction::AddFromCatalog {
                date,
                meal_type,
                food,
                unit,
                quantity,
            } => {
                let grams = resolve_serving(&food.serving_units, &unit, quantity)?;
                let item = FoodItem::from_catalog(&food, grams, meal_type, date)?;
                self.items.push(item.clone());
                Ok(LogChange::Added(vec![item]))
            }
            LogAction::Rescale { id, weight } => {
                let slot = self.slot_mut(id)?;
                let mut updated = slot.clone();
                updated.rescale(weight)?;
                *slot = updated.clone();
                Ok(LogChange::Updated(updated))
            }
            LogAction::ReplaceFood { id, food } => {
                let slot = self.slot_mut(id)?;
                let mut updated = slot.clone();
                updated.replace_food(&food)?;
                *slot = updated.clone();
                Ok(LogChange::Updated(updated))
            }
            LogAction::Remove { id } => {
                let idx = self
                    .items
                    .iter()
                    .position(|i| i.id == id)
                    .ok_or(NutritionError::EntryNotFound(id))?;
                Ok(LogChange::Removed(self.items.remove(idx)))
            }
        }
    }

    fn slot_mut(&mut self, id: Uuid) -> Result<&mut FoodItem, NutritionError> {
        self.items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(NutritionError::EntryNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrition::types::ServingUnit;
    use time::macros::date;

    fn food(name: &str, weight: f64, calories: f64) -> ManualFood {
        ManualFood {
            name: name.into(),
            weight,
            calories,
            protein: 5.0,
            carbs: 10.0,
            fat: 2.0,
        }
    }

    fn add(log: &mut FoodLog, date: Date, foods: Vec<ManualFood>) -> Vec<FoodItem> {
        match log
            .apply(LogAction::Add { date, meal_type: MealType::Lunch, foods })
            .unwrap()
        {
            LogChange::Added(items) => items,
            other => panic!("unexpected change {other:?}"),
        }
    }

    #[test]
    fn add_assigns_fresh_ids_and_date() {
        let mut log = FoodLog::default();
        let d = date!(2024 - 07 - 01);
        let added = add(&mut log, d, vec![food("Soup", 300.0, 180.0), food("Bread", 40.0, 100.0)]);
        assert_eq!(added.len(), 2);
        assert_ne!(added[0].id, added[1].id);
        assert!(added.iter().all(|i| i.date == d));
        assert_eq!(log.items().len(), 2);
    }

    #[test]
    fn invalid_batch_changes_nothing() {
        let mut log = FoodLog::default();
        let d = date!(2024 - 07 - 01);
        add(&mut log, d, vec![food("Soup", 300.0, 180.0)]);
        let before = log.clone();
        let err = log
            .apply(LogAction::Add {
                date: d,
                meal_type: MealType::Dinner,
                foods: vec![food("Rice", 150.0, 200.0), food("Oil", 0.0, 120.0)],
            })
            .unwrap_err();
        assert_eq!(err, NutritionError::NonPositiveWeight(0.0));
        assert_eq!(log, before);
    }

    #[test]
    fn add_then_remove_round_trips() {
        let mut log = FoodLog::default();
        let d = date!(2024 - 07 - 02);
        add(&mut log, d, vec![food("Soup", 300.0, 180.0)]);
        let before = log.clone();
        let id = add(&mut log, d, vec![food("Cake", 90.0, 350.0)])[0].id;
        let change = log.apply(LogAction::Remove { id }).unwrap();
        assert!(matches!(change, LogChange::Removed(ref i) if i.id == id));
        assert_eq!(log, before);
    }

    #[test]
    fn remove_unknown_is_not_found() {
        let mut log = FoodLog::default();
        let id = Uuid::new_v4();
        assert_eq!(log.apply(LogAction::Remove { id }), Err(NutritionError::EntryNotFound(id)));
    }

    #[test]
    fn rescale_updates_in_place_and_keeps_order() {
        let mut log = FoodLog::default();
        let d = date!(2024 - 07 - 03);
        let ids: Vec<Uuid> = add(&mut log, d, vec![food("A item", 100.0, 100.0), food("B item", 100.0, 250.0)])
            .iter()
            .map(|i| i.id)
            .collect();
        log.apply(LogAction::Rescale { id: ids[0], weight: 250.0 }).unwrap();
        assert_eq!(log.items()[0].id, ids[0]);
        assert_eq!(log.items()[0].calories, 250.0);
        assert_eq!(log.items()[0].weight, 250.0);

        let before = log.clone();
        assert!(log.apply(LogAction::Rescale { id: ids[1], weight: -3.0 }).is_err());
        assert_eq!(log, before);
    }

    #[test]
    fn catalog_add_resolves_unit() {
        let mut log = FoodLog::default();
        let egg = FoodCatalogEntry {
            name: "Egg".into(),
            brand: None,
            calories: 143.0,
            protein: 12.6,
            carbs: 0.7,
            fat: 9.5,
            serving_units: vec![ServingUnit::gram(), ServingUnit { name: "large".into(), grams: 50.0 }],
        };
        let change = log
            .apply(LogAction::AddFromCatalog {
                date: date!(2024 - 07 - 04),
                meal_type: MealType::Breakfast,
                food: egg.clone(),
                unit: "large".into(),
                quantity: 2.0,
            })
            .unwrap();
        let LogChange::Added(items) = change else { panic!("expected add") };
        assert_eq!(items[0].weight, 100.0);
        assert_eq!(items[0].calories, 143.0);

        let unknown = log.apply(LogAction::AddFromCatalog {
            date: date!(2024 - 07 - 04),
            meal_type: MealType::Breakfast,
            food: egg,
            unit: "slice".into(),
            quantity: 1.0,
        });
        assert!(matches!(unknown, Err(NutritionError::UnknownServingUnit(_))));
        assert_eq!(log.items().len(), 1);
    }
}
