use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{FromRequest, FromRequestParts};
use axum::http::HeaderMap;
use axum::http::request::Parts;

use crate::db::users;
use crate::error::AppError;
use crate::models::User;
use crate::state::AppState;

/// Header carrying the caller's user id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// `axum::Json` whose rejections come back as `AppError` bodies.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// `axum::extract::Path` whose rejections come back as `AppError` bodies.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// Resolves the `X-User-Id` header. `Ok(None)` when the header is absent or blank;
/// an id naming no known user is `Unauthorized`.
pub async fn caller(headers: &HeaderMap, state: &AppState) -> Result<Option<User>, AppError> {
    let id = headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    match id {
        Some(id) => users::find_user_by_id(&state.db, id)
            .await?
            .map(Some)
            .ok_or(AppError::Unauthorized),
        None => Ok(None),
    }
}

/// The user a request acts on behalf of. Rejects with 401 when the header is
/// missing or names no known user.
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        caller(&parts.headers, state)
            .await?
            .map(Self)
            .ok_or(AppError::Unauthorized)
    }
}

/// Like [`CurrentUser`], but only admins get through (403 otherwise).
pub struct AdminUser(pub User);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(AppError::Forbidden);
        }
        Ok(Self(user))
    }
}
