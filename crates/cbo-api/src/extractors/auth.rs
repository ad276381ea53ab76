//! Authentication extractor
//!
//! Validates the bearer token and loads the caller's roles and profile state into a
//! [`SessionContext`].

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use cbo_service::services::SessionService;
use cbo_service::SessionContext;

use crate::response::ApiError;
use crate::state::AppState;

/// Authenticated caller with roles, permissions and session status resolved
#[derive(Debug, Clone)]
pub struct AuthSession(pub SessionContext);

impl std::ops::Deref for AuthSession {
    type Target = SessionContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthSession
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::MissingAuth)?;

        let app_state = AppState::from_ref(state);

        let claims = app_state
            .jwt_service()
            .validate_access_token(bearer.token())
            .map_err(|e| {
                tracing::warn!(error = %e, "Invalid access token");
                ApiError::App(e)
            })?;

        let user_id = claims.user_id().map_err(|e| {
            tracing::warn!(error = %e, "Invalid user ID in token");
            ApiError::App(e)
        })?;

        let session = SessionService::new(app_state.service_context())
            .load(user_id, claims.email, claims.email_verified)
            .await?;

        Ok(AuthSession(session))
    }
}
