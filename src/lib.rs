pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod importer;
pub mod model;
pub mod store;

pub use api::{create_app, AppState, SharedState};
pub use config::Settings;
pub use error::{CatalogError, CatalogResult, ParsingError};
pub use importer::{import_html, ScrapedRecipe, ScrapedRecipeDraft};
