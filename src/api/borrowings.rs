//! Borrowing endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{
        borrowing::{Borrowing, BorrowingDetails, BorrowingQuery, CreateBorrowing},
        payment::Payment,
    },
    AppState,
};

use super::AuthenticatedUser;

/// Outcome of a return
#[derive(Serialize, ToSchema)]
pub struct ReturnResponse {
    pub message: String,
    pub borrowing: Borrowing,
    /// Payment billed for the borrowing; carries the checkout link when one was opened
    pub payment: Payment,
}

/// List borrowings; readers only see their own
#[utoipa::path(
    get,
    path = "/borrowings",
    tag = "borrowings",
    security(("bearer_auth" = [])),
    params(
        ("is_active" = Option<bool>, Query, description = "Only open (true) or returned (false) borrowings"),
        ("user_id" = Option<i32>, Query, description = "Filter by borrower (staff only)")
    ),
    responses(
        (status = 200, description = "List of borrowings", body = Vec<Borrowing>),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_borrowings(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<BorrowingQuery>,
) -> AppResult<Json<Vec<Borrowing>>> {
    let borrowings = state.services.borrowings.list(&claims, query).await?;
    Ok(Json(borrowings))
}

/// Borrow a book
#[utoipa::path(
    post,
    path = "/borrowings",
    tag = "borrowings",
    security(("bearer_auth" = [])),
    request_body = CreateBorrowing,
    responses(
        (status = 201, description = "Borrowing created", body = Borrowing),
        (status = 400, description = "Book unavailable, bad return date or unpaid fees", body = crate::error::ErrorResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_borrowing(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateBorrowing>,
) -> AppResult<(StatusCode, Json<Borrowing>)> {
    let borrowing = state.services.borrowings.create(&claims, request).await?;
    Ok((StatusCode::CREATED, Json(borrowing)))
}

/// Get borrowing details with book, payments and amount due
#[utoipa::path(
    get,
    path = "/borrowings/{id}",
    tag = "borrowings",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Borrowing ID")
    ),
    responses(
        (status = 200, description = "Borrowing details", body = BorrowingDetails),
        (status = 404, description = "Borrowing not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_borrowing(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<BorrowingDetails>> {
    let details = state.services.borrowings.get(&claims, id).await?;
    Ok(Json(details))
}

/// Return a borrowed book
#[utoipa::path(
    post,
    path = "/borrowings/{id}/return",
    tag = "borrowings",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Borrowing ID")
    ),
    responses(
        (status = 200, description = "Book returned", body = ReturnResponse),
        (status = 400, description = "Borrowing already closed", body = crate::error::ErrorResponse),
        (status = 403, description = "Staff only", body = crate::error::ErrorResponse),
        (status = 404, description = "Borrowing not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn return_borrowing(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<ReturnResponse>> {
    claims.require_staff()?;

    let returned = state.services.borrowings.return_borrowing(id).await?;

    Ok(Json(ReturnResponse {
        message: "Book was successfully returned".to_string(),
        borrowing: returned.borrowing,
        payment: returned.payment,
    }))
}
