use axum::{
    extract::{rejection::{JsonRejection, PathRejection, QueryRejection}, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::json;
use crate::lang::{LangPatch, LangSummary, NewLang};
use crate::normalize::{capitalize_name, parse_feature_tags};
use crate::server::envelope::{ApiError, Envelope};
use crate::server::AppState;
use std::sync::Arc;

pub type ApiResult = Result<(StatusCode, Json<Envelope>), ApiError>;

pub const TAGS_MESSAGE: &str = r#"Invalid request! The "tags" parameter is empty."#;
pub const DELETE_NOT_FOUND_MESSAGE: &str = "Error! Resource was not found or has already been deleted!";

fn ok(status: StatusCode, envelope: Envelope) -> ApiResult {
    Ok((status, Json(envelope)))
}

pub async fn create_lang(
    State(state): State<Arc<AppState>>,
    body: Result<Json<NewLang>, JsonRejection>,
) -> ApiResult {
    let Json(new) = body?;

    let store = state.store.lock().await;
    let saved = store.insert_lang(new)?;
    tracing::info!(id = saved.id, name = %saved.name, "language created");

    ok(
        StatusCode::CREATED,
        Envelope::success(json!({ "savedLang": saved })).with_message("Resource created successfully!"),
    )
}

/// `GET /langs` lists every language, or filters by feature when the query
/// string carries `tags`.
pub async fn get_langs(
    State(state): State<Arc<AppState>>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> ApiResult {
    let Query(params) = query?;
    let tags: Vec<&str> = params
        .iter()
        .filter(|(key, _)| key == "tags")
        .map(|(_, value)| value.as_str())
        .collect();

    match tags.as_slice() {
        [] => list_langs(&state).await,
        [raw] => filter_langs(&state, raw).await,
        // `tags=a&tags=b` is an array, not the expected string
        _ => Err(ApiError::BadRequest(TAGS_MESSAGE.to_string())),
    }
}

async fn list_langs(state: &AppState) -> ApiResult {
    let store = state.store.lock().await;
    let langs = store.find_all_langs()?;
    if langs.is_empty() {
        return Err(ApiError::not_found());
    }

    let langs_list: Vec<LangSummary> = langs.into_iter().map(LangSummary::from).collect();
    ok(StatusCode::OK, Envelope::success(json!({ "langsList": langs_list })))
}

async fn filter_langs(state: &AppState, raw: &str) -> ApiResult {
    let features = parse_feature_tags(raw).map_err(|_| ApiError::BadRequest(TAGS_MESSAGE.to_string()))?;
    tracing::debug!(?features, "filtering by features");

    let store = state.store.lock().await;
    let languages = store.find_langs_by_features(&features)?;
    ok(StatusCode::OK, Envelope::success(json!({ "languages": languages })))
}

pub async fn get_lang(
    State(state): State<Arc<AppState>>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult {
    let Path(name) = path?;
    let name = capitalize_name(&name);

    let store = state.store.lock().await;
    let lang = store.find_lang_by_name(&name)?.ok_or_else(ApiError::not_found)?;
    ok(StatusCode::OK, Envelope::success(json!({ "lang": lang })))
}

pub async fn update_lang(
    State(state): State<Arc<AppState>>,
    path: Result<Path<String>, PathRejection>,
    body: Result<Json<LangPatch>, JsonRejection>,
) -> ApiResult {
    let Path(name) = path?;
    let name = capitalize_name(&name);
    let Json(patch) = body?;

    let store = state.store.lock().await;
    let updated = store.update_lang_by_name(&name, patch)?.ok_or_else(ApiError::not_found)?;
    tracing::info!(id = updated.id, name = %updated.name, "language updated");

    ok(
        StatusCode::OK,
        Envelope::success(json!({ "updatedlang": updated })).with_message("Resource updated successfully!"),
    )
}

pub async fn delete_lang(
    State(state): State<Arc<AppState>>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult {
    let Path(name) = path?;
    let name = capitalize_name(&name);

    let store = state.store.lock().await;
    let deleted = store
        .delete_lang_by_name(&name)?
        .ok_or_else(|| ApiError::NotFound(DELETE_NOT_FOUND_MESSAGE.to_string()))?;
    tracing::info!(id = deleted.id, name = %deleted.name, "language deleted");

    ok(
        StatusCode::OK,
        Envelope::done(format!("Resource named {} was deleted successfully!", deleted.name)),
    )
}

pub async fn not_found() -> ApiError {
    ApiError::not_found()
}

pub async fn method_not_allowed() -> (StatusCode, Json<Envelope>) {
    (StatusCode::METHOD_NOT_ALLOWED, Json(Envelope::fail("Method not allowed!")))
}
