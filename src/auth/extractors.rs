use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use crate::auth::claims::SessionUser;
use crate::auth::jwt::JwtKeys;
use crate::error::ApiError;
use crate::i18n::{self, Lang};
use crate::state::AppState;
use crate::users::repo_types::Role;

/// Verified session identity, attached to the request once and passed by
/// value to the handler. Claims are trusted as-is: a role change only
/// takes effect when the user logs in again.
pub struct AuthUser(pub SessionUser);

/// Same verification as [`AuthUser`] plus an ADMIN role requirement.
/// A valid token with the wrong role answers 403, never 401.
pub struct AdminUser(pub SessionUser);

fn header_lang(parts: &Parts, state: &AppState) -> Lang {
    parts
        .headers
        .get("lang")
        .and_then(|v| v.to_str().ok())
        .and_then(Lang::parse)
        .unwrap_or(state.config.default_lang)
}

fn verify_bearer(parts: &Parts, state: &AppState) -> Result<SessionUser, ApiError> {
    let lang = header_lang(parts, state);

    let auth = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::unauthorized(lang))?;

    let token = auth
        .strip_prefix("Bearer ")
        .or_else(|| auth.strip_prefix("bearer "))
        .ok_or_else(|| ApiError::unauthorized(lang))?;

    let keys = JwtKeys::from_ref(state);
    match keys.verify_session(token) {
        Ok(claims) => Ok(claims.user),
        Err(e) => {
            warn!(error = %e, "invalid or expired session token");
            Err(ApiError::unauthorized(lang))
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(AuthUser(verify_bearer(parts, state)?))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = verify_bearer(parts, state)?;
        if user.role != Role::Admin {
            let lang = i18n::resolve(
                parts
                    .headers
                    .get("lang")
                    .and_then(|v| v.to_str().ok())
                    .and_then(Lang::parse),
                user.lang,
                state.config.default_lang,
            );
            warn!(user_id = %user.id, "admin route denied for non-admin user");
            return Err(ApiError::forbidden(lang));
        }
        Ok(AdminUser(user))
    }
}
