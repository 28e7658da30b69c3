use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use super::{jwt::JwtKeys, repo::User};
use crate::{audit::UserStamp, error::ApiError, state::AppState};

/// Maps a bearer token to the caller's account. Token validity and account
/// existence are checked independently: a valid token whose subject no
/// longer resolves is NotFound, not Unauthorized.
pub async fn resolve_bearer(state: &AppState, headers: &HeaderMap) -> Result<User, ApiError> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".into()))?;

    let token = header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .ok_or_else(|| ApiError::Unauthorized("Invalid Authorization header".into()))?;

    let keys = JwtKeys::from_ref(state);
    let claims = keys.verify(token).map_err(|_| {
        warn!("invalid or expired token");
        ApiError::Unauthorized("Invalid or expired token".into())
    })?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    Ok(user)
}

/// Extractor used by the auth endpoints themselves.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = resolve_bearer(state, &parts.headers).await?;
        Ok(CurrentUser(user))
    }
}

/// Middleware for the gated CRUD collections: resolves the session once and
/// hands the mutation pipeline its audit stamp through request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = resolve_bearer(&state, request.headers()).await?;
    request.extensions_mut().insert(UserStamp::from(&user));
    Ok(next.run(request).await)
}
