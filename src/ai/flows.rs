//! The five AI flows: image estimation, detail augmentation, food search,
//! free-text parsing and recipe reimagining.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use super::client::{GenerativeModel, InlineImage};
use super::dto::{
    AugmentItem, EstimatedFood, ImageEstimate, ParsedFood, RawEstimate, RawParsedFood,
    RawRecipeAnswer, RawSuggestion, RecipeRequest, RecipeResult, Suggestion,
};
use super::error::AiError;
use crate::nutrition::error::{ensure_non_negative, ensure_positive};
use crate::nutrition::scaler::validate_catalog;
use crate::nutrition::types::{FoodCatalogEntry, Nutrients, ServingUnit};
use crate::nutrition::NutritionError;

pub const MIN_QUERY_CHARS: usize = 2;
pub const MAX_SEARCH_RESULTS: usize = 8;

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, AiError> {
    serde_json::from_value(value).map_err(|e| AiError::Malformed(e.to_string()))
}

fn malformed(what: &str) -> impl Fn(NutritionError) -> AiError + '_ {
    move |e| AiError::Malformed(format!("{what}: {e}"))
}

fn check_nutrients(what: &str, n: &Nutrients) -> Result<(), AiError> {
    ensure_non_negative("calories", n.calories).map_err(malformed(what))?;
    ensure_non_negative("protein", n.protein).map_err(malformed(what))?;
    ensure_non_negative("carbs", n.carbs).map_err(malformed(what))?;
    ensure_non_negative("fat", n.fat).map_err(malformed(what))?;
    Ok(())
}

fn check_name(name: &str) -> Result<String, AiError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AiError::Malformed("item without a name".into()));
    }
    Ok(name.to_owned())
}

fn check_optional_weight(what: &str, weight: Option<f64>) -> Result<(), AiError> {
    match weight {
        Some(w) => ensure_positive("weight", w).map_err(malformed(what)),
        None => Ok(()),
    }
}

// --- image estimation ---

const ESTIMATE_PROMPT: &str = r#"You estimate the nutrition of meals from photos.
Identify every food item visible in the attached image. For each item estimate calories, protein, carbs and fat in grams and, where possible, its weight in grams; when the weight is not obvious use a typical serving size.
Answer with a JSON object of this shape:
{"foodItems": [{"name": string, "weightGrams": number (optional), "calories": number, "protein": number, "carbs": number, "fat": number}], "totalCalories": number}"#;

/// Estimates the foods in `image`, then has their portions filled in.
/// Calories and macros from the estimate are merged back by name.
pub async fn estimate_image(
    model: &dyn GenerativeModel,
    image: InlineImage,
) -> Result<ImageEstimate, AiError> {
    let raw: RawEstimate = decode(model.generate_json(ESTIMATE_PROMPT, Some(image)).await?)?;

    let mut estimated = Vec::with_capacity(raw.food_items.len());
    for item in raw.food_items {
        let name = check_name(&item.name)?;
        let nutrients = Nutrients {
            calories: item.calories,
            protein: item.protein,
            carbs: item.carbs,
            fat: item.fat,
        };
        check_nutrients(&name, &nutrients)?;
        check_optional_weight(&name, item.weight_grams)?;
        estimated.push((name, item.weight_grams, nutrients));
    }
    if estimated.is_empty() {
        return Ok(ImageEstimate {
            items: Vec::new(),
            total_calories: 0.0,
        });
    }

    let total_calories = match raw.total_calories {
        Some(total) => {
            ensure_non_negative("totalCalories", total).map_err(malformed("estimate"))?;
            total
        }
        None => estimated.iter().map(|(_, _, n)| n.calories).sum(),
    };

    let request: Vec<AugmentItem> = estimated
        .iter()
        .map(|(name, weight, _)| AugmentItem {
            food_item: name.clone(),
            quantity: None,
            weight: *weight,
        })
        .collect();
    let suggestions = augment(model, &request).await?;

    let items = suggestions
        .into_iter()
        .filter_map(|s| {
            let found = estimated
                .iter()
                .find(|(name, _, _)| *name == s.food_item)
                .or_else(|| {
                    estimated
                        .iter()
                        .find(|(name, _, _)| name.eq_ignore_ascii_case(&s.food_item))
                });
            let Some((_, _, n)) = found else {
                warn!(food = %s.food_item, "augmented item has no estimate; dropping");
                return None;
            };
            Some(EstimatedFood {
                name: s.food_item,
                quantity: s.quantity,
                weight: s.weight,
                reason: s.reason,
                calories: n.calories,
                protein: n.protein,
                carbs: n.carbs,
                fat: n.fat,
            })
        })
        .collect();

    Ok(ImageEstimate {
        items,
        total_calories,
    })
}

// --- augmentation ---

fn augment_prompt(items: &[AugmentItem]) -> String {
    let mut prompt = String::from(
        "You suggest realistic portions for the foods in a meal.\n\
         For every item below that lacks a quantity or a weight, suggest one based on typical serving sizes, and explain your reasoning briefly.\n\
         Keep any quantity or weight that is already given exactly as it is.\n\n",
    );
    for item in items {
        prompt.push_str(&format!("- Food item: {}\n", item.food_item));
        if let Some(q) = &item.quantity {
            prompt.push_str(&format!("  Quantity: {q}\n"));
        }
        if let Some(w) = item.weight {
            prompt.push_str(&format!("  Weight: {w} grams\n"));
        }
    }
    prompt.push_str(
        "\nAnswer with a JSON array: [{\"foodItem\": string, \"quantity\": string (optional), \"weight\": number in grams (optional), \"reason\": string}]",
    );
    prompt
}

/// Suggested quantity/weight per item. Values present in `items` are kept
/// regardless of what the model answers, and items the model skipped come
/// back as given with an empty reason.
pub async fn augment(
    model: &dyn GenerativeModel,
    items: &[AugmentItem],
) -> Result<Vec<Suggestion>, AiError> {
    if items.is_empty() {
        return Ok(Vec::new());
    }
    let raw: Vec<RawSuggestion> = decode(model.generate_json(&augment_prompt(items), None).await?)?;

    let mut answered = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    for s in raw {
        let name = check_name(&s.food_item)?;
        let idx = items
            .iter()
            .position(|i| i.food_item == name)
            .or_else(|| items.iter().position(|i| i.food_item.eq_ignore_ascii_case(&name)));
        let original = match idx {
            Some(i) => {
                answered[i] = true;
                Some(&items[i])
            }
            None => None,
        };
        let quantity = original.and_then(|o| o.quantity.clone()).or(s.quantity);
        let weight = original.and_then(|o| o.weight).or(s.weight);
        check_optional_weight(&name, weight)?;
        out.push(Suggestion {
            food_item: original.map_or(name, |o| o.food_item.clone()),
            quantity,
            weight,
            reason: s.reason,
        });
    }

    for item in items.iter().zip(&answered).filter(|(_, done)| !**done).map(|(i, _)| i) {
        debug!(food = %item.food_item, "model skipped item; passing it through");
        out.push(Suggestion {
            food_item: item.food_item.clone(),
            quantity: item.quantity.clone(),
            weight: item.weight,
            reason: String::new(),
        });
    }
    Ok(out)
}

// --- search ---

fn search_prompt(query: &str) -> String {
    format!(
        "You act as a verified nutrition database for a calorie tracking app.\n\
         List the foods most likely meant by the search \"{query}\": at least 3 and at most {MAX_SEARCH_RESULTS}; a single result is fine for a very specific query.\n\
         For each give the common name, the brand if it is a branded product, calories, protein, carbs and fat per 100 g, and common serving units with their weight in grams. Always include a \"g\" unit weighing 1 gram.\n\
         Answer with a JSON array: [{{\"name\": string, \"brand\": string (optional), \"calories\": number, \"protein\": number, \"carbs\": number, \"fat\": number, \"servingUnits\": [{{\"name\": string, \"grams\": number}}]}}]"
    )
}

/// Catalog entries for `query`. Queries shorter than two characters return
/// nothing without calling the model.
pub async fn search(
    model: &dyn GenerativeModel,
    query: &str,
) -> Result<Vec<FoodCatalogEntry>, AiError> {
    let query = query.trim();
    if query.chars().count() < MIN_QUERY_CHARS {
        debug!("search query too short; skipping model call");
        return Ok(Vec::new());
    }
    let raw: Vec<FoodCatalogEntry> = decode(model.generate_json(&search_prompt(query), None).await?)?;

    raw.into_iter()
        .take(MAX_SEARCH_RESULTS)
        .map(normalize_catalog_entry)
        .collect()
}

fn normalize_catalog_entry(mut entry: FoodCatalogEntry) -> Result<FoodCatalogEntry, AiError> {
    entry.name = check_name(&entry.name)?;
    entry.brand = entry
        .brand
        .map(|b| b.trim().to_owned())
        .filter(|b| !b.is_empty());
    validate_catalog(&entry).map_err(malformed("search result"))?;
    for unit in &entry.serving_units {
        if unit.name.trim().is_empty() {
            return Err(AiError::Malformed("serving unit without a name".into()));
        }
        ensure_positive("grams", unit.grams).map_err(malformed("serving unit"))?;
    }
    if !entry.serving_units.iter().any(|u| u.name.eq_ignore_ascii_case("g")) {
        entry.serving_units.insert(0, ServingUnit::gram());
    }
    Ok(entry)
}

// --- free-text parsing ---

fn parse_prompt(query: &str) -> String {
    format!(
        "You are a nutrition logging assistant. Identify every food in the meal description below, convert its amount to grams (for example 1 cup of cooked rice is about 185 g, 1 tbsp of olive oil about 14 g; estimate vague amounts sensibly) and give its calories, protein, carbs and fat for that weight.\n\
         Meal: \"{query}\"\n\
         Answer with a JSON array: [{{\"name\": string, \"weight\": number, \"calories\": number, \"protein\": number, \"carbs\": number, \"fat\": number}}]"
    )
}

pub async fn parse_text(model: &dyn GenerativeModel, query: &str) -> Result<Vec<ParsedFood>, AiError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(AiError::BadInput("query cannot be empty".into()));
    }
    let raw: Vec<RawParsedFood> = decode(model.generate_json(&parse_prompt(query), None).await?)?;

    raw.into_iter()
        .map(|f| {
            let name = check_name(&f.name)?;
            ensure_positive("weight", f.weight).map_err(malformed(&name))?;
            let nutrients = Nutrients {
                calories: f.calories,
                protein: f.protein,
                carbs: f.carbs,
                fat: f.fat,
            };
            check_nutrients(&name, &nutrients)?;
            Ok(ParsedFood {
                name,
                weight: f.weight,
                calories: f.calories,
                protein: f.protein,
                carbs: f.carbs,
                fat: f.fat,
            })
        })
        .collect()
}

// --- recipe ---

fn recipe_prompt(req: &RecipeRequest) -> String {
    let goal = req.goal.describe();
    format!(
        "You are a recipe developer and nutritionist. Rework the recipe below so that it is {goal}.\n\n\
         Ingredients:\n{}\n\nInstructions:\n{}\n\n\
         1. Estimate calories, protein, carbs and fat for the whole original dish.\n\
         2. Write a new version that is {goal}: specific ingredient changes, clear complete steps, a catchy title, a short description, and a short analysis of why the changes serve the goal.\n\
         3. Estimate calories, protein, carbs and fat for the whole new dish.\n\
         Answer with a JSON object: {{\"originalNutrition\": {{\"calories\": number, \"protein\": number, \"carbs\": number, \"fat\": number}}, \"reimaginedRecipe\": {{\"title\": string, \"description\": string, \"ingredients\": [string], \"instructions\": [string], \"nutritionAnalysis\": string}}, \"reimaginedNutrition\": {{\"calories\": number, \"protein\": number, \"carbs\": number, \"fat\": number}}}}",
        req.ingredients.trim(),
        req.instructions.trim(),
    )
}

pub async fn reimagine_recipe(
    model: &dyn GenerativeModel,
    req: &RecipeRequest,
) -> Result<RecipeResult, AiError> {
    if req.ingredients.trim().is_empty() || req.instructions.trim().is_empty() {
        return Err(AiError::BadInput("ingredients and instructions are required".into()));
    }
    let raw: RawRecipeAnswer = decode(model.generate_json(&recipe_prompt(req), None).await?)?;

    check_nutrients("original recipe", &raw.original_nutrition)?;
    check_nutrients("reimagined recipe", &raw.reimagined_nutrition)?;
    let recipe = &raw.reimagined_recipe;
    if recipe.title.trim().is_empty()
        || recipe.ingredients.is_empty()
        || recipe.instructions.is_empty()
    {
        return Err(AiError::Malformed("reimagined recipe is incomplete".into()));
    }

    Ok(RecipeResult {
        original_nutrition: raw.original_nutrition,
        reimagined_recipe: raw.reimagined_recipe,
        reimagined_nutrition: raw.reimagined_nutrition,
    })
}
