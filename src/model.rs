use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::error::{CatalogError, CatalogResult, FieldError};

/// A named list of ingredient lines, e.g. "Sauce" or "Base"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientGroup {
    pub category: String,
    pub items: Vec<String>,
}

impl IngredientGroup {
    pub fn new(category: impl Into<String>, items: Vec<String>) -> Self {
        Self {
            category: category.into(),
            items,
        }
    }
}

/// A stored recipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: Uuid,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub image: String,
    pub cook_time: String,
    pub prep_time: String,
    pub serves: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rest_time: Option<String>,
    pub description: String,
    pub ingredients: Vec<IngredientGroup>,
    pub instructions: Vec<String>,
    pub nutrition: BTreeMap<String, String>,
    pub keywords: Vec<String>,
    pub author: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a recipe
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewRecipe {
    pub title: String,
    pub subtitle: Option<String>,
    pub image: String,
    pub cook_time: String,
    pub prep_time: String,
    pub serves: String,
    pub rest_time: Option<String>,
    pub description: String,
    pub ingredients: Vec<IngredientGroup>,
    pub instructions: Vec<String>,
    pub nutrition: BTreeMap<String, String>,
    pub keywords: Vec<String>,
}

/// Partial update. Has no `author` field: an author sent by a client is
/// dropped during deserialization.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecipePatch {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub image: Option<String>,
    pub cook_time: Option<String>,
    pub prep_time: Option<String>,
    pub serves: Option<String>,
    pub rest_time: Option<String>,
    pub description: Option<String>,
    pub ingredients: Option<Vec<IngredientGroup>>,
    pub instructions: Option<Vec<String>>,
    pub nutrition: Option<BTreeMap<String, String>>,
    pub keywords: Option<Vec<String>>,
}

fn require(errors: &mut Vec<FieldError>, field: &str, label: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(FieldError::new(field, format!("{label} is required")));
    }
}

/// Checks every schema constraint on the recipe content and reports all
/// violations at once.
#[allow(clippy::too_many_arguments)]
fn check_content(
    title: &str,
    image: &str,
    cook_time: &str,
    prep_time: &str,
    serves: &str,
    description: &str,
    ingredients: &[IngredientGroup],
    instructions: &[String],
) -> CatalogResult<()> {
    let mut errors = Vec::new();

    require(&mut errors, "title", "Title", title);
    require(&mut errors, "image", "Image", image);
    require(&mut errors, "cookTime", "Cook time", cook_time);
    require(&mut errors, "prepTime", "Prep time", prep_time);
    require(&mut errors, "serves", "Serves", serves);
    require(&mut errors, "description", "Description", description);

    if ingredients.is_empty() {
        errors.push(FieldError::new(
            "ingredients",
            "At least one ingredient category is required",
        ));
    }
    for (i, group) in ingredients.iter().enumerate() {
        if group.category.trim().is_empty() {
            errors.push(FieldError::new(
                format!("ingredients.{i}.category"),
                "Ingredient category name is required",
            ));
        }
        if group.items.is_empty() {
            errors.push(FieldError::new(
                format!("ingredients.{i}.items"),
                "Ingredient category needs at least one item",
            ));
        }
        for (j, item) in group.items.iter().enumerate() {
            if item.trim().is_empty() {
                errors.push(FieldError::new(
                    format!("ingredients.{i}.items.{j}"),
                    "Ingredient item must not be empty",
                ));
            }
        }
    }

    if instructions.is_empty() {
        errors.push(FieldError::new(
            "instructions",
            "At least one instruction is required",
        ));
    }
    for (i, step) in instructions.iter().enumerate() {
        if step.trim().is_empty() {
            errors.push(FieldError::new(
                format!("instructions.{i}"),
                "Instruction step must not be empty",
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(CatalogError::Validation(errors))
    }
}

/// Removes duplicate and blank keywords, keeping first appearance order
pub fn dedup_keywords(keywords: Vec<String>) -> Vec<String> {
    let mut seen = Vec::with_capacity(keywords.len());
    for keyword in keywords {
        let keyword = keyword.trim().to_string();
        if !keyword.is_empty() && !seen.contains(&keyword) {
            seen.push(keyword);
        }
    }
    seen
}

impl NewRecipe {
    pub fn validate(&self) -> CatalogResult<()> {
        check_content(
            &self.title,
            &self.image,
            &self.cook_time,
            &self.prep_time,
            &self.serves,
            &self.description,
            &self.ingredients,
            &self.instructions,
        )
    }

    /// Builds the stored record; callers validate first
    pub fn into_recipe(self, author: Uuid, now: DateTime<Utc>) -> Recipe {
        Recipe {
            id: Uuid::new_v4(),
            title: self.title,
            subtitle: self.subtitle,
            image: self.image,
            cook_time: self.cook_time,
            prep_time: self.prep_time,
            serves: self.serves,
            rest_time: self.rest_time,
            description: self.description,
            ingredients: self.ingredients,
            instructions: self.instructions,
            nutrition: self.nutrition,
            keywords: dedup_keywords(self.keywords),
            author,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Recipe {
    pub fn validate(&self) -> CatalogResult<()> {
        check_content(
            &self.title,
            &self.image,
            &self.cook_time,
            &self.prep_time,
            &self.serves,
            &self.description,
            &self.ingredients,
            &self.instructions,
        )
    }

    /// Returns a copy with the provided fields replaced. Id, author and
    /// creation time are never touched.
    pub fn merged(&self, patch: RecipePatch, now: DateTime<Utc>) -> Recipe {
        let mut recipe = self.clone();

        if let Some(title) = patch.title {
            recipe.title = title;
        }
        if let Some(subtitle) = patch.subtitle {
            recipe.subtitle = Some(subtitle);
        }
        if let Some(image) = patch.image {
            recipe.image = image;
        }
        if let Some(cook_time) = patch.cook_time {
            recipe.cook_time = cook_time;
        }
        if let Some(prep_time) = patch.prep_time {
            recipe.prep_time = prep_time;
        }
        if let Some(serves) = patch.serves {
            recipe.serves = serves;
        }
        if let Some(rest_time) = patch.rest_time {
            recipe.rest_time = Some(rest_time);
        }
        if let Some(description) = patch.description {
            recipe.description = description;
        }
        if let Some(ingredients) = patch.ingredients {
            recipe.ingredients = ingredients;
        }
        if let Some(instructions) = patch.instructions {
            recipe.instructions = instructions;
        }
        if let Some(nutrition) = patch.nutrition {
            recipe.nutrition = nutrition;
        }
        if let Some(keywords) = patch.keywords {
            recipe.keywords = dedup_keywords(keywords);
        }

        recipe.updated_at = now;
        recipe
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// A registered account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub phone: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Account data handed to the store once validation and hashing are done
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub phone: String,
    pub role: Role,
}
