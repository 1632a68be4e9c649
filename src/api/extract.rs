use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use super::SharedState;
use crate::error::CatalogError;
use crate::model::User;

/// Extractor that validates the Authorization header and provides the
/// authenticated user.
pub struct AuthUser(pub User);

/// Like [`AuthUser`], but also requires the admin role.
pub struct AdminUser(pub User);

fn bearer_token(parts: &Parts) -> Result<&str, CatalogError> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| CatalogError::Auth("Not authorized, no token".to_string()))
}

#[async_trait]
impl FromRequestParts<SharedState> for AuthUser {
    type Rejection = CatalogError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let user = state.auth.authenticate(token).await?;
        Ok(AuthUser(user))
    }
}

#[async_trait]
impl FromRequestParts<SharedState> for AdminUser {
    type Rejection = CatalogError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(CatalogError::Forbidden(
                "Not authorized as an admin".to_string(),
            ));
        }
        Ok(AdminUser(user))
    }
}
