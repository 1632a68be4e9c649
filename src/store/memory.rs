//! In-memory catalog store, optionally mirrored to a JSON snapshot file.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{RecipeStore, UserStore};
use crate::error::{CatalogError, CatalogResult};
use crate::model::{NewRecipe, NewUser, Recipe, RecipePatch, User};

#[derive(Debug, Default, Serialize, Deserialize)]
struct Records {
    users: Vec<User>,
    /// Insertion order, oldest first
    recipes: Vec<Recipe>,
}

/// Catalog store that keeps every record in process.
///
/// With a snapshot path, every successful write is flushed to that file
/// (written to a sibling temp file, then renamed into place) and the file is
/// loaded again on [`MemoryStore::open`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<Records>,
    snapshot: Option<PathBuf>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a store backed by the snapshot at `path`, starting empty when
    /// the file does not exist yet.
    pub async fn open(path: PathBuf) -> CatalogResult<Self> {
        let records = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<Records>(&bytes).map_err(|e| {
                CatalogError::Storage(format!("corrupt snapshot {}: {e}", path.display()))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No snapshot at {}, starting empty", path.display());
                Records::default()
            }
            Err(e) => return Err(e.into()),
        };

        info!(
            "Loaded {} users and {} recipes from {}",
            records.users.len(),
            records.recipes.len(),
            path.display()
        );

        Ok(Self {
            records: RwLock::new(records),
            snapshot: Some(path),
        })
    }

    /// Writes the current records out. Called with the write lock held so
    /// snapshots land in the same order as the changes.
    async fn persist(&self, records: &Records) -> CatalogResult<()> {
        let Some(path) = &self.snapshot else {
            return Ok(());
        };

        let bytes = serde_json::to_vec_pretty(records)
            .map_err(|e| CatalogError::Storage(format!("failed to encode snapshot: {e}")))?;
        let tmp = temp_path(path);
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, path).await?;

        debug!("Wrote snapshot to {}", path.display());
        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

#[async_trait]
impl RecipeStore for MemoryStore {
    async fn create_recipe(&self, recipe: NewRecipe, author: Uuid) -> CatalogResult<Recipe> {
        recipe.validate()?;

        let mut records = self.records.write().await;
        if !records.users.iter().any(|u| u.id == author) {
            return Err(CatalogError::invalid("author", "Author does not exist"));
        }

        let recipe = recipe.into_recipe(author, Utc::now());
        records.recipes.push(recipe.clone());
        if let Err(e) = self.persist(&records).await {
            records.recipes.pop();
            return Err(e);
        }

        Ok(recipe)
    }

    async fn update_recipe(&self, id: Uuid, patch: RecipePatch) -> CatalogResult<Recipe> {
        let mut records = self.records.write().await;
        let index = records
            .recipes
            .iter()
            .position(|r| r.id == id)
            .ok_or(CatalogError::NotFound("Recipe"))?;

        let updated = records.recipes[index].merged(patch, Utc::now());
        updated.validate()?;

        let previous = std::mem::replace(&mut records.recipes[index], updated.clone());
        if let Err(e) = self.persist(&records).await {
            records.recipes[index] = previous;
            return Err(e);
        }

        Ok(updated)
    }

    async fn delete_recipe(&self, id: Uuid) -> CatalogResult<()> {
        let mut records = self.records.write().await;
        let index = records
            .recipes
            .iter()
            .position(|r| r.id == id)
            .ok_or(CatalogError::NotFound("Recipe"))?;

        let removed = records.recipes.remove(index);
        if let Err(e) = self.persist(&records).await {
            records.recipes.insert(index, removed);
            return Err(e);
        }

        Ok(())
    }

    async fn list_recipes(&self) -> CatalogResult<Vec<Recipe>> {
        let records = self.records.read().await;
        // newest insertion first, then a stable sort keeps that order for
        // equal timestamps
        let mut recipes: Vec<Recipe> = records.recipes.iter().rev().cloned().collect();
        recipes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(recipes)
    }

    async fn get_recipe(&self, id: Uuid) -> CatalogResult<Recipe> {
        let records = self.records.read().await;
        records
            .recipes
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(CatalogError::NotFound("Recipe"))
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, user: NewUser) -> CatalogResult<User> {
        let mut records = self.records.write().await;
        if records
            .users
            .iter()
            .any(|u| u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(CatalogError::invalid("email", "User already exists"));
        }

        let user = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            phone: user.phone,
            role: user.role,
            created_at: Utc::now(),
        };
        records.users.push(user.clone());
        if let Err(e) = self.persist(&records).await {
            records.users.pop();
            return Err(e);
        }

        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> CatalogResult<Option<User>> {
        let records = self.records.read().await;
        Ok(records
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn get_user(&self, id: Uuid) -> CatalogResult<Option<User>> {
        let records = self.records.read().await;
        Ok(records.users.iter().find(|u| u.id == id).cloned())
    }
}
