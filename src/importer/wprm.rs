use log::debug;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;

use super::strategy::{
    compile, decode_html_symbols, element_text, first_match, non_blank_texts, Extraction,
};
use super::{Extractor, ScrapedRecipe, DEFAULT_CATEGORY};
use crate::error::ParsingError;
use crate::model::IngredientGroup;

// WP Recipe Maker (WPRM) markup, plus the page-level meta tags WordPress emits

const TITLE: &[Extraction] = &[
    Extraction::Text("h1.entry-title"),
    Extraction::Text(".wprm-recipe-name"),
];

const DESCRIPTION: &[Extraction] = &[
    Extraction::Attribute {
        selector: r#"meta[name="description"]"#,
        attribute: "content",
    },
    Extraction::Attribute {
        selector: r#"meta[property="og:description"]"#,
        attribute: "content",
    },
];

const IMAGE: &[Extraction] = &[Extraction::Attribute {
    selector: r#"meta[property="og:image"]"#,
    attribute: "content",
}];

// First embedded player in document order, whichever host it is on
const VIDEO: &[Extraction] = &[Extraction::Attribute {
    selector: r#"iframe[src*="youtube.com"], iframe[src*="youtube-nocookie.com"], iframe[src*="player.vimeo.com"]"#,
    attribute: "src",
}];

const SERVES: &[Extraction] = &[
    Extraction::Text(".wprm-recipe-servings-container .wprm-recipe-servings"),
    Extraction::Attribute {
        selector: ".wprm-recipe-details[data-servings]",
        attribute: "data-servings",
    },
];

const PREP_TIME: &[Extraction] = &[
    Extraction::Text(".wprm-recipe-prep_time-container .wprm-recipe-time"),
    Extraction::Duration {
        selector: r#"meta[itemprop="prepTime"]"#,
        attribute: "content",
    },
];

const COOK_TIME: &[Extraction] = &[
    Extraction::Text(".wprm-recipe-cook_time-container .wprm-recipe-time"),
    Extraction::Duration {
        selector: r#"meta[itemprop="cookTime"]"#,
        attribute: "content",
    },
];

const INGREDIENT_GROUP: &str = ".wprm-recipe-ingredient-group";
const INGREDIENT_GROUP_NAME: &str = ".wprm-recipe-ingredient-group-name";
const INGREDIENT: &str = ".wprm-recipe-ingredient";
const INSTRUCTION: &str = ".wprm-recipe-instruction-text";

// Classic list, BEM label and text label layouts
const NUTRITION_ROW: &str = ".wprm-nutrition-label-container li, \
     .wprm-nutrition-label__item, \
     .wprm-nutrition-label-text-nutrition-container";
const NUTRITION_NAME: &str = ".wprm-nutrition-label-name, \
     .wprm-nutrition-label__name, \
     .wprm-nutrition-label-text-nutrition-label";
const NUTRITION_VALUE: &str = ".wprm-nutrition-label-value, \
     .wprm-nutrition-label__value, \
     .wprm-nutrition-label-text-nutrition-value";
const NUTRITION_UNIT: &str = ".wprm-nutrition-label-unit, \
     .wprm-nutrition-label__unit, \
     .wprm-nutrition-label-text-nutrition-unit";

/// Extracts recipes from pages rendered by the WP Recipe Maker plugin
pub struct WprmExtractor;

impl WprmExtractor {
    fn ingredient_groups(&self, document: &Html) -> Result<Vec<IngredientGroup>, ParsingError> {
        let group_selector = compile(INGREDIENT_GROUP)?;
        let name_selector = compile(INGREDIENT_GROUP_NAME)?;
        let item_selector = compile(INGREDIENT)?;

        let containers: Vec<ElementRef> = document.select(&group_selector).collect();

        if containers.is_empty() {
            let items = non_blank_texts(document.select(&item_selector));
            if items.is_empty() {
                return Ok(Vec::new());
            }
            debug!("Found {} ungrouped ingredients", items.len());
            return Ok(vec![IngredientGroup::new(DEFAULT_CATEGORY, items)]);
        }

        let mut groups = Vec::new();
        for (i, container) in containers.into_iter().enumerate() {
            let category = container
                .select(&name_selector)
                .next()
                .map(element_text)
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| format!("Ingredients {}", i + 1));

            let items = non_blank_texts(container.select(&item_selector));
            if items.is_empty() {
                debug!("Skipping empty ingredient group '{}'", category);
                continue;
            }
            groups.push(IngredientGroup::new(category, items));
        }

        Ok(groups)
    }

    fn nutrition(&self, document: &Html) -> Result<BTreeMap<String, String>, ParsingError> {
        let row_selector = compile(NUTRITION_ROW)?;
        let name_selector = compile(NUTRITION_NAME)?;
        let value_selector = compile(NUTRITION_VALUE)?;
        let unit_selector = compile(NUTRITION_UNIT)?;

        let mut nutrition = BTreeMap::new();

        for row in document.select(&row_selector) {
            let first_text = |selector: &Selector| {
                row.select(selector)
                    .next()
                    .map(element_text)
                    .unwrap_or_default()
            };

            let key = first_text(&name_selector)
                .replacen(':', "", 1)
                .trim()
                .to_lowercase();
            let value = first_text(&value_selector);
            let unit = first_text(&unit_selector);

            if key.is_empty() || value.is_empty() {
                continue;
            }

            let entry = if unit.is_empty() {
                value
            } else {
                format!("{value} {unit}")
            };
            nutrition.insert(key, entry);
        }

        Ok(nutrition)
    }
}

impl Extractor for WprmExtractor {
    fn parse(&self, document: &Html) -> Result<ScrapedRecipe, ParsingError> {
        debug!("Attempting to extract recipe using WPRM selectors");

        let instruction_selector = compile(INSTRUCTION)?;

        Ok(ScrapedRecipe {
            title: decode_html_symbols(&first_match(document, TITLE)?),
            description: decode_html_symbols(&first_match(document, DESCRIPTION)?),
            image: first_match(document, IMAGE)?,
            video: first_match(document, VIDEO)?,
            ingredient_groups: self.ingredient_groups(document)?,
            instructions: non_blank_texts(document.select(&instruction_selector)),
            serves: first_match(document, SERVES)?,
            prep_time: first_match(document, PREP_TIME)?,
            cook_time: first_match(document, COOK_TIME)?,
            nutrition: self.nutrition(document)?,
        })
    }
}
