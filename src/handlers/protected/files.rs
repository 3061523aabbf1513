use axum::{
    extract::{Extension, Path},
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::models::File;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::services::{CreateFileRequest, FileService, UpdateFileRequest};

#[derive(Debug, Deserialize)]
pub struct CodePayload {
    pub code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AlgoPayload {
    pub algo: Option<String>,
}

/// POST /api/files - Create a file owned by the authenticated user
pub async fn create(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<CreateFileRequest>,
) -> ApiResult<File> {
    let service = FileService::new().await?;
    let file = service.create(user.id, payload).await?;
    Ok(ApiResponse::created(file))
}

/// GET /api/files/user/:user_id - List files owned by :user_id
pub async fn list_by_user(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Vec<File>> {
    let service = FileService::new().await?;
    let files = service.list_by_owner(user.id, user_id).await?;
    Ok(ApiResponse::success(files))
}

/// GET /api/files/:id - Fetch a single file by id
pub async fn get(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<File> {
    let service = FileService::new().await?;
    let file = service.get_by_id(user.id, id).await?;
    Ok(ApiResponse::success(file))
}

/// PATCH /api/files/:id - Partially update the mutable fields of a file
pub async fn patch(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(updates): Json<UpdateFileRequest>,
) -> ApiResult<File> {
    let service = FileService::new().await?;
    let file = service.update_partial(user.id, id, updates).await?;
    Ok(ApiResponse::success(file))
}

/// PATCH /api/files/:id/code - Update the code field only
pub async fn patch_code(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CodePayload>,
) -> ApiResult<File> {
    let service = FileService::new().await?;
    let file = service.update_code(user.id, id, payload.code).await?;
    Ok(ApiResponse::success(file))
}

/// PATCH /api/files/:id/algo - Update the algo field only
pub async fn patch_algo(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AlgoPayload>,
) -> ApiResult<File> {
    let service = FileService::new().await?;
    let file = service.update_algo(user.id, id, payload.algo).await?;
    Ok(ApiResponse::success(file))
}

/// DELETE /api/files/:id - Permanently delete a file
pub async fn delete(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Value> {
    let service = FileService::new().await?;
    service.delete_by_id(user.id, id).await?;
    Ok(ApiResponse::success(
        json!({ "message": "File deleted successfully" }),
    ))
}
