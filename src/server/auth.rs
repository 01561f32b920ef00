//! Account routes and the bearer-token middleware

use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::json;
use crate::auth::{AuthService, UserProfile};
use crate::server::envelope::{ApiError, Envelope};
use crate::server::routes::ApiResult;
use crate::server::AppState;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// The user resolved by [`authenticate_user`]
#[derive(Debug, Clone)]
pub struct AuthUser(pub UserProfile);

pub async fn signup(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Credentials>, JsonRejection>,
) -> ApiResult {
    let Json(credentials) = body?;

    let store = state.store.lock().await;
    let session = AuthService::new(&store).signup(&credentials.username, &credentials.password)?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::success(json!({ "user": session.user, "token": session.token }))
            .with_message("Account created successfully!")),
    ))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Credentials>, JsonRejection>,
) -> ApiResult {
    let Json(credentials) = body?;

    let store = state.store.lock().await;
    let session = AuthService::new(&store).login(&credentials.username, &credentials.password)?;

    Ok((StatusCode::OK, Json(Envelope::success(json!({ "token": session.token })))))
}

pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    body: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> ApiResult {
    let Json(request) = body?;

    let store = state.store.lock().await;
    let session = AuthService::new(&store).change_password(
        &user.username,
        &request.current_password,
        &request.new_password,
    )?;

    Ok((
        StatusCode::OK,
        Json(Envelope::success(json!({ "token": session.token }))
            .with_message("Password changed successfully!")),
    ))
}

/// Require `Authorization: Bearer <token>` and attach the user to the request
pub async fn authenticate_user(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("missing bearer token".to_string()))?
        .to_string();

    let user = {
        let store = state.store.lock().await;
        AuthService::new(&store).authenticate(&token)?
    };
    tracing::debug!(user_id = user.id, "request authenticated");

    request.extensions_mut().insert(AuthUser(user));
    Ok(next.run(request).await)
}
