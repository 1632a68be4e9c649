use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};

use super::{json_body, SharedState};
use crate::auth::{Credentials, Registration, Session};
use crate::error::CatalogResult;

/// `POST /api/auth/register`
pub async fn register(
    State(state): State<SharedState>,
    payload: Result<Json<Registration>, JsonRejection>,
) -> CatalogResult<(StatusCode, Json<Session>)> {
    let registration = json_body(payload)?;
    let session = state.auth.register(registration).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// `POST /api/auth/login`
pub async fn login(
    State(state): State<SharedState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> CatalogResult<Json<Session>> {
    let credentials = json_body(payload)?;
    Ok(Json(state.auth.login(credentials).await?))
}
