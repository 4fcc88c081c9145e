use axum::{
    extract::{FromRef, State},
    routing::{post, put},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::auth::claims::SessionUser;
use crate::auth::dto::{
    ForgotPasswordRequest, LoginRequest, NewPasswordRequest, SignupRequest, TokenResponse,
};
use crate::auth::jwt::JwtKeys;
use crate::auth::password::{hash_password, verify_password};
use crate::error::{ApiError, MessageBody};
use crate::i18n::{Msg, RequestLang};
use crate::state::AppState;
use crate::users::repo::CreateUserError;
use crate::users::repo_types::{NewUser, Role, User};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/forgot_password", post(forgot_password))
        .route("/auth/new_password", put(new_password))
}

/// Unknown email and wrong password answer with the exact same body so the
/// response never reveals whether an account exists.
#[instrument(skip(state, payload))]
async fn login(
    State(state): State<AppState>,
    RequestLang(header_lang): RequestLang,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let lang = header_lang.unwrap_or(state.config.default_lang);
    let mut user = payload.user;
    user.normalize();
    user.validate(lang)?;

    let found = User::find_by_email(&state.db, &user.email)
        .await
        .map_err(|e| {
            error!(error = %e, "find_by_email failed");
            ApiError::unexpected(lang)
        })?;

    let Some(found) = found else {
        warn!("login with unknown email");
        return Err(ApiError::wrong_credentials(lang));
    };

    if !verify_password(&user.password, &found.password_hash) {
        warn!(user_id = %found.id, "login with wrong password");
        return Err(ApiError::wrong_credentials(lang));
    }

    let keys = JwtKeys::from_ref(&state);
    let jwt = keys
        .sign_session(SessionUser::from(&found))
        .map_err(|e| {
            error!(error = %e, "session token signing failed");
            ApiError::unexpected(lang)
        })?;

    info!(user_id = %found.id, "user logged in");
    Ok(Json(TokenResponse { jwt }))
}

#[instrument(skip(state, payload))]
async fn register(
    State(state): State<AppState>,
    RequestLang(header_lang): RequestLang,
    Json(payload): Json<SignupRequest>,
) -> Result<Json<MessageBody>, ApiError> {
    let lang = header_lang.unwrap_or(state.config.default_lang);
    let mut user = payload.user;
    user.normalize();
    user.validate(lang)?;

    let by_email = User::find_by_email(&state.db, &user.email)
        .await
        .map_err(|e| {
            error!(error = %e, "find_by_email failed");
            ApiError::unexpected(lang)
        })?;
    let by_document = User::find_by_document(&state.db, &user.document)
        .await
        .map_err(|e| {
            error!(error = %e, "find_by_document failed");
            ApiError::unexpected(lang)
        })?;

    // One generic outcome for either collision; no field-level detail
    if by_email.is_some() || by_document.is_some() {
        warn!("registration for an email or document already in use");
        return Err(ApiError::account_exists(lang));
    }

    let password_hash = hash_password(&user.password).map_err(|e| {
        error!(error = %e, "hash_password failed");
        ApiError::unexpected(lang)
    })?;

    let candidate = NewUser {
        name: user.name,
        lastname: user.lastname,
        email: user.email,
        password_hash,
        document: user.document,
        phone: user.phone,
        lang: user.lang,
        role: Role::User,
    };

    match User::create(&state.db, &candidate).await {
        Ok(created) => {
            info!(user_id = %created.id, "user registered");
            Ok(Json(MessageBody::new(lang, Msg::SignupSuccess)))
        }
        // Two registrations can race past the checks above; the store's
        // unique constraint settles it and maps to the same outcome
        Err(CreateUserError::Conflict) => {
            warn!("registration lost a unique-key race");
            Err(ApiError::account_exists(lang))
        }
        Err(CreateUserError::Db(e)) => {
            error!(error = %e, "create user failed");
            Err(ApiError::unexpected(lang))
        }
    }
}

#[instrument(skip(state, payload))]
async fn forgot_password(
    State(state): State<AppState>,
    RequestLang(header_lang): RequestLang,
    Json(mut payload): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageBody>, ApiError> {
    let lang = header_lang.unwrap_or(state.config.default_lang);
    payload.normalize();
    payload.validate(lang)?;

    let user = User::find_by_email(&state.db, &payload.email)
        .await
        .map_err(|e| {
            error!(error = %e, "find_by_email failed");
            ApiError::unexpected(lang)
        })?;

    let Some(user) = user else {
        warn!("password recovery for unknown email");
        return Err(ApiError::new(
            axum::http::StatusCode::BAD_REQUEST,
            lang,
            Msg::WrongCredentials,
        ));
    };

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign_reset(user.id).map_err(|e| {
        error!(error = %e, "reset token signing failed");
        ApiError::unexpected(lang)
    })?;

    User::set_reset_token(&state.db, user.id, &token)
        .await
        .map_err(|e| {
            error!(error = %e, user_id = %user.id, "set_reset_token failed");
            ApiError::unexpected(lang)
        })?;

    let reset_url = format!("{}?token={}", state.config.reset_password_url, token);
    state
        .mailer
        .send_recovery_email(&user.email, lang, &reset_url)
        .await
        .map_err(|e| {
            error!(error = %e, user_id = %user.id, "recovery email failed");
            ApiError::unexpected(lang)
        })?;

    info!(user_id = %user.id, "recovery email queued");
    Ok(Json(MessageBody::new(lang, Msg::CheckYourEmail)))
}

/// Every failure here collapses to the same generic outcome: a mismatched
/// confirmation, a bad or expired token, and a token that no longer
/// matches the persisted one are indistinguishable to the caller.
#[instrument(skip(state, payload))]
async fn new_password(
    State(state): State<AppState>,
    RequestLang(header_lang): RequestLang,
    Json(payload): Json<NewPasswordRequest>,
) -> Result<Json<MessageBody>, ApiError> {
    let lang = header_lang.unwrap_or(state.config.default_lang);
    payload.validate(lang)?;

    if payload.password != payload.confirmation_password {
        warn!("password reset with mismatched confirmation");
        return Err(ApiError::expired_reset_token(lang));
    }

    let keys = JwtKeys::from_ref(&state);
    let claims = match keys.verify_reset(&payload.token) {
        Ok(claims) => claims,
        Err(e) => {
            warn!(error = %e, "invalid or expired reset token");
            return Err(ApiError::expired_reset_token(lang));
        }
    };

    let user = User::find_by_id(&state.db, claims.sub)
        .await
        .map_err(|e| {
            error!(error = %e, "find_by_id failed");
            ApiError::unexpected(lang)
        })?;

    let Some(user) = user else {
        warn!(user_id = %claims.sub, "reset token for a missing user");
        return Err(ApiError::expired_reset_token(lang));
    };

    // Single use: the token must still be the one on the row
    if user.reset_token.is_empty() || user.reset_token != payload.token {
        warn!(user_id = %user.id, "reset token already consumed or replaced");
        return Err(ApiError::expired_reset_token(lang));
    }

    let password_hash = hash_password(&payload.password).map_err(|e| {
        error!(error = %e, "hash_password failed");
        ApiError::unexpected(lang)
    })?;

    User::update_password(&state.db, user.id, &password_hash)
        .await
        .map_err(|e| {
            error!(error = %e, user_id = %user.id, "update_password failed");
            ApiError::unexpected(lang)
        })?;

    User::clear_reset_token(&state.db, user.id)
        .await
        .map_err(|e| {
            error!(error = %e, user_id = %user.id, "clear_reset_token failed");
            ApiError::unexpected(lang)
        })?;

    info!(user_id = %user.id, "password reset completed");
    Ok(Json(MessageBody::new(lang, Msg::PasswordUpdated)))
}
