//! User handlers: create, read by id, list.
//! Each one decodes and validates its input, then checks out the request's
//! session and makes exactly one call on it.

use crate::error::AppError;
use crate::extractors::DbSession;
use crate::model::{ListParams, NewUser, User};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query,
    },
    http::StatusCode,
    Json,
};

pub async fn create_user(
    mut db: DbSession,
    payload: Result<Json<NewUser>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let Json(new_user) = payload?;
    new_user.validate()?;
    let user = db.get().await?.create_user(&new_user).await?;
    tracing::info!(user_id = user.id, "created user");
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn read_user(
    mut db: DbSession,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<User>, AppError> {
    let Path(id) = id?;
    let user = db
        .get()
        .await?
        .find_user(id)
        .await?
        .ok_or(AppError::NotFound("User"))?;
    Ok(Json(user))
}

pub async fn list_users(
    mut db: DbSession,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<User>>, AppError> {
    let Query(params) = params?;
    let page = params.into_page()?;
    let users = db.get().await?.list_users(page).await?;
    Ok(Json(users))
}
