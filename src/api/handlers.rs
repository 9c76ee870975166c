use crate::api::auth::Caller;
use crate::api::error::{ApiError, ApiResult};
use crate::api::AppState;
use crate::errors::ForgeError;
use crate::router::{GroupPatch, GroupSpec};
use crate::scheduler::{JobRequest, JobStatus};

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use serde::Deserialize;
use serde_json::{json, Value};

fn authenticate(state: &AppState, headers: &HeaderMap) -> ApiResult<Caller> {
    let token = crate::api::auth::bearer_token(headers).ok_or(ForgeError::Unauthorized)?;
    state
        .auth
        .authenticate(token)
        .ok_or_else(|| ApiError(ForgeError::Unauthorized))
}

fn require_superadmin(state: &AppState, headers: &HeaderMap) -> ApiResult<Caller> {
    let caller = authenticate(state, headers)?;
    if !caller.is_superadmin() {
        return Err(ApiError(ForgeError::Forbidden));
    }
    Ok(caller)
}

/// Deserialize a request body through serde, reporting failures as
/// validation errors rather than axum's default rejection.
fn parse_body<T: serde::de::DeserializeOwned>(body: Value) -> ApiResult<T> {
    serde_json::from_value(body)
        .map_err(|e| ApiError(ForgeError::Validation(format!("invalid request body: {}", e))))
}

// ============================================================================
// Job endpoints
// ============================================================================

pub async fn submit_job(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> ApiResult<impl IntoResponse> {
    let caller = authenticate(&state, &headers)?;
    let request: JobRequest = parse_body(body)?;
    let job = state.engine.submit_job(&caller.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

pub async fn get_job(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let caller = authenticate(&state, &headers)?;
    let job = state.engine.get_job(&id, &caller.user_id).await?;
    Ok(Json(job))
}

#[derive(Deserialize)]
pub struct ListJobsParams {
    status: Option<String>,
}

pub async fn list_jobs(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ListJobsParams>,
) -> ApiResult<impl IntoResponse> {
    let caller = authenticate(&state, &headers)?;

    let status = match params.status.as_deref() {
        Some(raw) => Some(raw.parse::<JobStatus>().map_err(ApiError)?),
        None => None,
    };

    let jobs = state.engine.list_jobs(&caller.user_id, status).await;
    Ok(Json(json!({ "jobs": jobs })))
}

pub async fn cancel_job(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let caller = authenticate(&state, &headers)?;
    let job = state.engine.cancel_job(&id, &caller.user_id).await?;
    Ok(Json(job))
}

// ============================================================================
// Model group administration
// ============================================================================

#[derive(Deserialize)]
pub struct ListGroupsParams {
    is_active: Option<bool>,
}

pub async fn list_groups(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ListGroupsParams>,
) -> ApiResult<impl IntoResponse> {
    require_superadmin(&state, &headers)?;
    let groups = state.engine.groups().list(params.is_active).await;
    Ok(Json(json!({ "model_groups": groups })))
}

pub async fn create_group(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> ApiResult<impl IntoResponse> {
    require_superadmin(&state, &headers)?;
    let spec: GroupSpec = parse_body(body)?;
    let group = state.engine.groups().create(spec).await?;
    Ok((StatusCode::CREATED, Json(group)))
}

pub async fn get_group(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    require_superadmin(&state, &headers)?;
    let group = state.engine.groups().get(&id).await?;
    Ok(Json(group))
}

pub async fn update_group(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<impl IntoResponse> {
    require_superadmin(&state, &headers)?;
    let patch: GroupPatch = parse_body(body)?;
    let group = state.engine.groups().update(&id, patch).await?;
    Ok(Json(group))
}

pub async fn delete_group(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    require_superadmin(&state, &headers)?;
    state.engine.groups().delete(&id).await?;
    Ok(Json(json!({ "deleted": id })))
}

// ============================================================================
// Configuration export/import
// ============================================================================

pub async fn export_config(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    require_superadmin(&state, &headers)?;
    let bundle = state.engine.export_config().await;
    Ok(Json(bundle))
}

pub async fn import_config(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> ApiResult<impl IntoResponse> {
    require_superadmin(&state, &headers)?;
    let bundle = parse_body(body)?;
    let summary = state.engine.import_config(bundle).await?;
    Ok(Json(summary))
}

// ============================================================================
// Backend administration
// ============================================================================

pub async fn list_backends(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    require_superadmin(&state, &headers)?;
    let backends = state.engine.backends().list();
    Ok(Json(json!({ "backends": backends })))
}

pub async fn list_backend_models(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    require_superadmin(&state, &headers)?;
    let models = state.engine.backends().list_models(&id).await?;
    Ok(Json(json!({ "models": models })))
}

pub async fn test_backend(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    require_superadmin(&state, &headers)?;
    if !state.engine.backends().contains(&id) {
        return Err(ApiError(ForgeError::NotFound(format!(
            "backend '{}' is not registered",
            id
        ))));
    }
    let probe = state.engine.backends().test_connection(&id).await;
    Ok(Json(probe))
}

#[derive(Deserialize)]
pub struct PullModelBody {
    model: String,
}

pub async fn pull_backend_model(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<impl IntoResponse> {
    require_superadmin(&state, &headers)?;
    let body: PullModelBody = parse_body(body)?;
    state.engine.backends().pull_model(&id, &body.model).await?;
    Ok(Json(json!({ "pulled": body.model })))
}
