use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use log::info;
use serde::Deserialize;
use serde_json::{json, Value};

use super::extract::AdminUser;
use super::{json_body, SharedState};
use crate::error::{CatalogError, CatalogResult};
use crate::importer::{import_html, ScrapedRecipeDraft};
use crate::model::{NewRecipe, Recipe, RecipePatch};
use crate::store::parse_id;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScrapeRequest {
    pub html_content: String,
}

pub async fn list_recipes(State(state): State<SharedState>) -> CatalogResult<Json<Vec<Recipe>>> {
    Ok(Json(state.store.list_recipes().await?))
}

pub async fn get_recipe(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> CatalogResult<Json<Recipe>> {
    let id = parse_id(&id)?;
    Ok(Json(state.store.get_recipe(id).await?))
}

pub async fn create_recipe(
    State(state): State<SharedState>,
    AdminUser(user): AdminUser,
    payload: Result<Json<NewRecipe>, JsonRejection>,
) -> CatalogResult<(StatusCode, Json<Recipe>)> {
    let recipe = json_body(payload)?;
    let recipe = state.store.create_recipe(recipe, user.id).await?;
    info!("{} created recipe {}", user.email, recipe.id);
    Ok((StatusCode::CREATED, Json(recipe)))
}

/// Partial update; an `author` in the body is ignored
pub async fn update_recipe(
    State(state): State<SharedState>,
    AdminUser(user): AdminUser,
    Path(id): Path<String>,
    payload: Result<Json<RecipePatch>, JsonRejection>,
) -> CatalogResult<Json<Recipe>> {
    let id = parse_id(&id)?;
    let patch = json_body(payload)?;
    let recipe = state.store.update_recipe(id, patch).await?;
    info!("{} updated recipe {}", user.email, recipe.id);
    Ok(Json(recipe))
}

pub async fn delete_recipe(
    State(state): State<SharedState>,
    AdminUser(user): AdminUser,
    Path(id): Path<String>,
) -> CatalogResult<Json<Value>> {
    let id = parse_id(&id)?;
    state.store.delete_recipe(id).await?;
    info!("{} removed recipe {}", user.email, id);
    Ok(Json(json!({ "message": "Recipe removed" })))
}

/// Turns pasted page markup into a draft for review. Nothing is stored.
pub async fn scrape_recipe(
    AdminUser(_): AdminUser,
    payload: Result<Json<ScrapeRequest>, JsonRejection>,
) -> CatalogResult<Json<ScrapedRecipeDraft>> {
    let request = json_body(payload)?;
    if request.html_content.trim().is_empty() {
        return Err(CatalogError::invalid("htmlContent", "HTML content is required"));
    }

    // html5ever parsing is CPU-bound
    let recipe = tokio::task::spawn_blocking(move || import_html(&request.html_content))
        .await
        .map_err(|e| CatalogError::Internal(format!("import task failed: {e}")))??;
    Ok(Json(recipe.into()))
}
