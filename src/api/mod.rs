//! HTTP API.

pub mod auth;
pub mod extract;
pub mod recipes;

use std::sync::Arc;

use axum::{
    extract::rejection::JsonRejection,
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use log::warn;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::auth::{ApilayerVerifier, AuthService, EmailVerifier};
use crate::config::Settings;
use crate::error::{CatalogError, CatalogResult};
use crate::store::{self, CatalogStore};

/// Shared application state.
pub struct AppState {
    pub settings: Arc<Settings>,
    pub store: Arc<dyn CatalogStore>,
    pub auth: AuthService,
}

impl AppState {
    pub fn new(
        settings: Settings,
        store: Arc<dyn CatalogStore>,
        verifier: Arc<dyn EmailVerifier>,
    ) -> Self {
        let settings = Arc::new(settings);
        let auth = AuthService::new(settings.clone(), store.clone(), verifier);
        Self {
            settings,
            store,
            auth,
        }
    }

    /// Opens the configured store and builds the apilayer client.
    pub async fn from_settings(settings: Settings) -> CatalogResult<Self> {
        let store = store::open(settings.database_url.as_deref()).await?;
        let verifier = ApilayerVerifier::new(&settings.email_check)
            .map_err(|e| CatalogError::Internal(e.to_string()))?;
        if !verifier.is_configured() {
            warn!("No email check API key configured, deliverability checks are off");
        }
        Ok(Self::new(settings, store, Arc::new(verifier)))
    }
}

pub type SharedState = Arc<AppState>;

/// Unwraps a JSON body, turning axum's rejection into the catalog's 400 body.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> CatalogResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| CatalogError::invalid("body", rejection.body_text()))
}

async fn root() -> &'static str {
    "API is running"
}

pub fn create_router() -> Router<SharedState> {
    Router::new()
        .route("/", get(root))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route(
            "/api/recipes",
            get(recipes::list_recipes).post(recipes::create_recipe),
        )
        .route("/api/recipes/scrape", post(recipes::scrape_recipe))
        .route(
            "/api/recipes/:id",
            get(recipes::get_recipe)
                .put(recipes::update_recipe)
                .delete(recipes::delete_recipe),
        )
}

fn cors_layer(settings: &Settings) -> CorsLayer {
    let origins: Vec<HeaderValue> = settings
        .origins()
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

/// Creates the application router with all routes configured.
pub fn create_app(state: SharedState) -> Router {
    let cors = cors_layer(&state.settings);
    create_router().with_state(state).layer(cors)
}
