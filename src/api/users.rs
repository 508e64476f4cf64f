//! User account endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::user::{CreateUser, UpdateStaff, User},
    AppState,
};

use super::AuthenticatedUser;

/// Register a reader account
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    request_body = CreateUser,
    responses(
        (status = 201, description = "User registered", body = User),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::error::ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(user): Json<CreateUser>,
) -> AppResult<(StatusCode, Json<User>)> {
    let created = state.services.users.register(user).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Grant or revoke staff rights
#[utoipa::path(
    put,
    path = "/users/{id}/staff",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    request_body = UpdateStaff,
    responses(
        (status = 200, description = "User updated", body = User),
        (status = 403, description = "Staff only", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn set_staff(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(update): Json<UpdateStaff>,
) -> AppResult<Json<User>> {
    claims.require_staff()?;

    let user = state.services.users.set_staff(id, update.is_staff).await?;
    Ok(Json(user))
}
