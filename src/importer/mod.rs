//! Turns pasted recipe-page markup into a structured draft.

use log::{debug, info, warn};
use scraper::Html;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ParsingError;
use crate::model::{IngredientGroup, NewRecipe};

mod duration;
mod strategy;
mod wprm;

pub use duration::convert_duration;
pub use strategy::{first_match, Extraction};
pub use wprm::WprmExtractor;

/// Label used when ingredients were not grouped in the source page
pub const DEFAULT_CATEGORY: &str = "Imported Ingredients";
/// Label used when several source groups are flattened into one list
pub const MULTIPLE_GROUPS_CATEGORY: &str = "Imported Ingredients (Multiple Groups)";

pub trait Extractor {
    fn parse(&self, document: &Html) -> Result<ScrapedRecipe, ParsingError>;
}

/// Everything the importer could read from a page. Every field is empty
/// when the page did not provide it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrapedRecipe {
    pub title: String,
    pub description: String,
    pub image: String,
    pub video: String,
    pub ingredient_groups: Vec<IngredientGroup>,
    pub instructions: Vec<String>,
    pub serves: String,
    pub prep_time: String,
    pub cook_time: String,
    pub nutrition: BTreeMap<String, String>,
}

impl ScrapedRecipe {
    /// True when none of title, ingredients or instructions were found,
    /// which usually means the markup is not a WPRM recipe page.
    pub fn is_low_confidence(&self) -> bool {
        self.title.is_empty() && self.ingredient_groups.is_empty() && self.instructions.is_empty()
    }

    /// Starting point for the admin's review form. Ingredient groups are kept
    /// as they were found.
    pub fn into_new_recipe(self) -> NewRecipe {
        NewRecipe {
            title: self.title,
            image: self.image,
            cook_time: self.cook_time,
            prep_time: self.prep_time,
            serves: self.serves,
            description: self.description,
            ingredients: self.ingredient_groups,
            instructions: self.instructions,
            nutrition: self.nutrition,
            ..Default::default()
        }
    }
}

/// Wire form of a scraped recipe. The review form edits a single ingredient
/// list, so groups are flattened here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapedRecipeDraft {
    pub title: String,
    pub description: String,
    pub image: String,
    pub video: String,
    pub ingredients: Vec<String>,
    pub ingredient_category: String,
    pub instructions: Vec<String>,
    pub serves: String,
    pub prep_time: String,
    pub cook_time: String,
    pub nutrition: BTreeMap<String, String>,
}

impl From<ScrapedRecipe> for ScrapedRecipeDraft {
    fn from(recipe: ScrapedRecipe) -> Self {
        let mut groups = recipe.ingredient_groups;

        let (ingredients, ingredient_category) = match groups.len() {
            0 => (Vec::new(), DEFAULT_CATEGORY.to_string()),
            1 => {
                let group = groups.remove(0);
                (group.items, group.category)
            }
            n => {
                debug!("Flattening {} ingredient groups into one list", n);
                (
                    groups.into_iter().flat_map(|group| group.items).collect(),
                    MULTIPLE_GROUPS_CATEGORY.to_string(),
                )
            }
        };

        ScrapedRecipeDraft {
            title: recipe.title,
            description: recipe.description,
            image: recipe.image,
            video: recipe.video,
            ingredients,
            ingredient_category,
            instructions: recipe.instructions,
            serves: recipe.serves,
            prep_time: recipe.prep_time,
            cook_time: recipe.cook_time,
            nutrition: recipe.nutrition,
        }
    }
}

/// Parse pasted page markup into a recipe.
///
/// Missing fields are never an error; they come back empty. An error is
/// only returned when the document cannot be queried at all.
pub fn import_html(markup: &str) -> Result<ScrapedRecipe, ParsingError> {
    let document = Html::parse_document(markup);
    if !document.errors.is_empty() {
        debug!(
            "Markup had {} recoverable parse errors",
            document.errors.len()
        );
    }

    let recipe = WprmExtractor.parse(&document)?;

    if recipe.is_low_confidence() {
        warn!("Parsing might have failed - minimal data extracted from HTML");
    } else {
        info!(
            "Parsed recipe: {}",
            if recipe.title.is_empty() {
                "Pasted HTML"
            } else {
                recipe.title.as_str()
            }
        );
    }

    Ok(recipe)
}
