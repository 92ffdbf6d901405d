use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::catalog::UserCatalog;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::jwt;
use crate::vault::Owner;

/// Authenticated owner extracted from the `Authorization: Bearer <token>` header.
///
/// The owner record is created on first sight with the configured default
/// quota, so every authenticated request has a catalog identity.
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub quota_bytes: i64,
}

impl AuthUser {
    pub fn owner(&self) -> Owner {
        Owner {
            id: self.user_id,
            quota_bytes: self.quota_bytes,
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::TokenMissing)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AppError::TokenInvalid)?;

        let claims = jwt::verify(token, &state.config.auth.jwt_secret)
            .map_err(|_| AppError::TokenInvalid)?;

        let user = UserCatalog::new(&state.db)
            .upsert(
                &claims.sub,
                claims.name.as_deref(),
                state.config.vault.default_quota_bytes,
            )
            .await?;

        Ok(AuthUser {
            user_id: user.id,
            email: user.email,
            name: user.name,
            quota_bytes: user.quota_bytes,
        })
    }
}
