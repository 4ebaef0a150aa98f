use std::collections::HashSet;

use super::dto::{IngredientAmount, RecipeWriteRequest};
use super::images::{decode_data_uri, DecodedImage};
use super::repo_types::{NewRecipe, RecipeChanges};
use crate::config::RecipeLimits;
use crate::error::{AppError, AppResult, FieldErrors};

const NAME_MAX_CHARS: usize = 200;

fn required<T>(value: Option<T>, field: &str, errors: &mut FieldErrors) -> Option<T> {
    if value.is_none() {
        errors.add(field, "This field is required.");
    }
    value
}

fn check_name(name: String, errors: &mut FieldErrors) -> Option<String> {
    let name = name.trim().to_string();
    let chars = name.chars().count();
    if chars == 0 {
        errors.add("name", "This field may not be blank.");
        return None;
    }
    if chars > NAME_MAX_CHARS {
        errors.add(
            "name",
            format!("Ensure this field has no more than {NAME_MAX_CHARS} characters."),
        );
        return None;
    }
    Some(name)
}

fn check_text(text: String, errors: &mut FieldErrors) -> Option<String> {
    if text.trim().is_empty() {
        errors.add("text", "This field may not be blank.");
        return None;
    }
    Some(text)
}

fn in_bounds(value: i64, min: i32, max: i32) -> Option<i32> {
    (i64::from(min)..=i64::from(max))
        .contains(&value)
        .then(|| value as i32)
}

fn check_cooking_time(value: i64, limits: &RecipeLimits, errors: &mut FieldErrors) -> Option<i32> {
    let checked = in_bounds(value, limits.cooking_time_min, limits.cooking_time_max);
    if checked.is_none() {
        errors.add(
            "cooking_time",
            format!(
                "Cooking time must be between {} and {} minutes.",
                limits.cooking_time_min, limits.cooking_time_max
            ),
        );
    }
    checked
}

fn check_image(value: String, errors: &mut FieldErrors) -> Option<DecodedImage> {
    match decode_data_uri(&value) {
        Ok(img) => Some(img),
        Err(msg) => {
            errors.add("image", msg);
            None
        }
    }
}

fn check_tags(tags: Option<Vec<i64>>, errors: &mut FieldErrors) -> Option<Vec<i64>> {
    let Some(tags) = tags.filter(|t| !t.is_empty()) else {
        errors.add("tags", "Add at least one tag to the recipe.");
        return None;
    };
    let mut seen = HashSet::with_capacity(tags.len());
    if let Some(dup) = tags.iter().find(|id| !seen.insert(**id)) {
        errors.add("tags", format!("Tags must not repeat: {dup}."));
        return None;
    }
    Some(tags)
}

fn check_ingredients(
    items: Option<Vec<IngredientAmount>>,
    limits: &RecipeLimits,
    errors: &mut FieldErrors,
) -> Option<Vec<(i64, i32)>> {
    let Some(items) = items.filter(|i| !i.is_empty()) else {
        errors.add("ingredients", "Add at least one ingredient to the recipe.");
        return None;
    };

    let mut seen = HashSet::with_capacity(items.len());
    let mut out = Vec::with_capacity(items.len());
    let mut ok = true;
    for item in items {
        if !seen.insert(item.id) {
            errors.add("ingredients", format!("Duplicate ingredient {}.", item.id));
            ok = false;
            continue;
        }
        match in_bounds(item.amount, limits.amount_min, limits.amount_max) {
            Some(amount) => out.push((item.id, amount)),
            None => {
                errors.add(
                    "ingredients",
                    format!(
                        "Amount of ingredient {} must be between {} and {}.",
                        item.id, limits.amount_min, limits.amount_max
                    ),
                );
                ok = false;
            }
        }
    }
    ok.then_some(out)
}

/// Validates a create request; every field is required.
pub fn validate_new(
    req: RecipeWriteRequest,
    limits: &RecipeLimits,
) -> AppResult<(NewRecipe, DecodedImage)> {
    let mut errors = FieldErrors::new();

    let tags = check_tags(req.tags, &mut errors);
    let ingredients = check_ingredients(req.ingredients, limits, &mut errors);
    let name = required(req.name, "name", &mut errors).and_then(|n| check_name(n, &mut errors));
    let text = required(req.text, "text", &mut errors).and_then(|t| check_text(t, &mut errors));
    let cooking_time = required(req.cooking_time, "cooking_time", &mut errors)
        .and_then(|c| check_cooking_time(c, limits, &mut errors));
    let image = required(req.image, "image", &mut errors).and_then(|i| check_image(i, &mut errors));

    match (tags, ingredients, name, text, cooking_time, image) {
        (Some(tags), Some(ingredients), Some(name), Some(text), Some(cooking_time), Some(image))
            if errors.is_empty() =>
        {
            Ok((
                NewRecipe {
                    name,
                    text,
                    cooking_time,
                    tags,
                    ingredients,
                },
                image,
            ))
        }
        _ => Err(AppError::Validation(errors)),
    }
}

/// Validates an update; tags and ingredients are required, the rest is optional.
pub fn validate_changes(
    req: RecipeWriteRequest,
    limits: &RecipeLimits,
) -> AppResult<(RecipeChanges, Option<DecodedImage>)> {
    let mut errors = FieldErrors::new();

    let tags = check_tags(req.tags, &mut errors);
    let ingredients = check_ingredients(req.ingredients, limits, &mut errors);
    let name = req.name.and_then(|n| check_name(n, &mut errors));
    let text = req.text.and_then(|t| check_text(t, &mut errors));
    let cooking_time = req
        .cooking_time
        .and_then(|c| check_cooking_time(c, limits, &mut errors));
    let image = req.image.and_then(|i| check_image(i, &mut errors));

    match (tags, ingredients) {
        (Some(tags), Some(ingredients)) if errors.is_empty() => Ok((
            RecipeChanges {
                name,
                text,
                cooking_time,
                tags,
                ingredients,
            },
            image,
        )),
        _ => Err(AppError::Validation(errors)),
    }
}

/// Reports ids that were referenced but do not exist.
pub fn unknown_ids(field: &str, requested: &[i64], existing: &[i64]) -> AppResult<()> {
    let existing: HashSet<i64> = existing.iter().copied().collect();
    let missing: Vec<String> = requested
        .iter()
        .filter(|id| !existing.contains(id))
        .map(|id| id.to_string())
        .collect();
    if missing.is_empty() {
        return Ok(());
    }
    Err(AppError::Validation(FieldErrors::single(
        field,
        format!("Unknown {field}: {}.", missing.join(", ")),
    )))
}
