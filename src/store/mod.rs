//! Storage abstraction for recipes and users.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{CatalogError, CatalogResult};
use crate::model::{NewRecipe, NewUser, Recipe, RecipePatch, User};

#[async_trait]
pub trait RecipeStore: Send + Sync {
    /// Validates and stores a new recipe owned by `author`
    async fn create_recipe(&self, recipe: NewRecipe, author: Uuid) -> CatalogResult<Recipe>;

    /// Merges `patch` into the stored recipe; the author never changes
    async fn update_recipe(&self, id: Uuid, patch: RecipePatch) -> CatalogResult<Recipe>;

    async fn delete_recipe(&self, id: Uuid) -> CatalogResult<()>;

    /// All recipes, newest first
    async fn list_recipes(&self) -> CatalogResult<Vec<Recipe>>;

    async fn get_recipe(&self, id: Uuid) -> CatalogResult<Recipe>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with a validation error when the email is taken
    async fn create_user(&self, user: NewUser) -> CatalogResult<User>;

    async fn find_user_by_email(&self, email: &str) -> CatalogResult<Option<User>>;

    async fn get_user(&self, id: Uuid) -> CatalogResult<Option<User>>;
}

/// Everything the HTTP layer needs from storage
pub trait CatalogStore: RecipeStore + UserStore {}

impl<T: RecipeStore + UserStore> CatalogStore for T {}

/// Parses a recipe id from a path segment
pub fn parse_id(raw: &str) -> CatalogResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| CatalogError::InvalidId("recipe"))
}

/// Opens the store selected by `database_url`:
/// unset or `memory:` keeps everything in process, `file:<path>` also
/// snapshots to a JSON file.
pub async fn open(database_url: Option<&str>) -> CatalogResult<Arc<dyn CatalogStore>> {
    match database_url.map(str::trim) {
        None | Some("") | Some("memory:") => Ok(Arc::new(MemoryStore::new())),
        Some(url) => match url.strip_prefix("file:") {
            Some(path) if !path.is_empty() => {
                Ok(Arc::new(MemoryStore::open(PathBuf::from(path)).await?))
            }
            _ => Err(CatalogError::Config(config::ConfigError::Message(format!(
                "unsupported database_url '{url}', expected 'memory:' or 'file:<path>'"
            )))),
        },
    }
}
