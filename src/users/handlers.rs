use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use tracing::{error, instrument, warn};

use crate::auth::extractors::{AdminUser, AuthUser};
use crate::error::{ApiError, MessageBody};
use crate::i18n::{self, Msg, RequestLang};
use crate::state::AppState;
use crate::users::dto::{
    ListUsersQuery, ListUsersResponse, UpdateMeRequest, UserDto, UserEnvelope,
};
use crate::users::repo_types::User;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/me", get(get_me).put(update_me))
}

#[instrument(skip(state, session))]
async fn get_me(
    State(state): State<AppState>,
    AuthUser(session): AuthUser,
    RequestLang(header_lang): RequestLang,
) -> Result<Json<UserEnvelope>, ApiError> {
    let lang = i18n::resolve(header_lang, session.lang, state.config.default_lang);

    let user = User::find_by_id(&state.db, session.id)
        .await
        .map_err(|e| {
            error!(error = %e, user_id = %session.id, "find_by_id failed");
            ApiError::unexpected(lang)
        })?;

    let Some(user) = user else {
        warn!(user_id = %session.id, "session user no longer exists");
        return Err(ApiError::not_found(lang));
    };

    Ok(Json(UserEnvelope {
        user: UserDto::from(user),
    }))
}

#[instrument(skip(state, session, payload))]
async fn update_me(
    State(state): State<AppState>,
    AuthUser(session): AuthUser,
    RequestLang(header_lang): RequestLang,
    Json(payload): Json<UpdateMeRequest>,
) -> Result<Json<MessageBody>, ApiError> {
    // A lang supplied in the update wins for this one response
    let lang = payload
        .user
        .lang
        .unwrap_or_else(|| i18n::resolve(header_lang, session.lang, state.config.default_lang));

    if payload.user.is_empty() {
        return Err(ApiError::invalid_payload(lang));
    }

    let changes = payload.user.into_changes(lang)?;
    if changes.is_empty() {
        // Every supplied field was blank; nothing to persist
        return Ok(Json(MessageBody::new(lang, Msg::Success)));
    }

    User::update(&state.db, session.id, &changes)
        .await
        .map_err(|e| {
            error!(error = %e, user_id = %session.id, "update user failed");
            ApiError::unexpected(lang)
        })?;

    Ok(Json(MessageBody::new(lang, Msg::Success)))
}

#[instrument(skip(state, admin))]
async fn list_users(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    RequestLang(header_lang): RequestLang,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<ListUsersResponse>, ApiError> {
    let lang = i18n::resolve(header_lang, admin.lang, state.config.default_lang);

    let filters = query.filters(lang)?;
    let page = query.page();
    let page_size = query.page_size();
    let skip = (page - 1) * page_size;

    // Rows and count are independent reads; a momentary skew between them
    // under concurrent writes is accepted
    let (rows, items_total) = tokio::try_join!(
        User::list_page(&state.db, skip, page_size, &filters),
        User::count(&state.db, &filters),
    )
    .map_err(|e| {
        error!(error = %e, "listing users failed");
        ApiError::unexpected(lang)
    })?;

    let users = rows.into_iter().map(UserDto::from).collect();
    Ok(Json(ListUsersResponse::new(users, items_total, page, page_size)))
}
