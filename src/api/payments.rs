//! Payment endpoints and checkout redirects

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::payment::{Payment, SessionQuery},
    AppState,
};

use super::AuthenticatedUser;

#[derive(Serialize, ToSchema)]
pub struct PaymentSuccessResponse {
    pub success: String,
}

#[derive(Serialize, ToSchema)]
pub struct PaymentCancelResponse {
    pub message: String,
}

/// List payments; readers only see their own
#[utoipa::path(
    get,
    path = "/payments",
    tag = "payments",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "List of payments", body = Vec<Payment>),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_payments(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<Payment>>> {
    let payments = state.services.payments.list(&claims).await?;
    Ok(Json(payments))
}

/// Get payment by ID
#[utoipa::path(
    get,
    path = "/payments/{id}",
    tag = "payments",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Payment ID")
    ),
    responses(
        (status = 200, description = "Payment details", body = Payment),
        (status = 404, description = "Payment not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_payment(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Payment>> {
    let payment = state.services.payments.get(&claims, id).await?;
    Ok(Json(payment))
}

/// Request a new checkout session for an unpaid payment
#[utoipa::path(
    post,
    path = "/payments/{id}/session",
    tag = "payments",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Payment ID")
    ),
    responses(
        (status = 200, description = "Payment with a fresh session", body = Payment),
        (status = 404, description = "Payment not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Payment already settled or has an open checkout session", body = crate::error::ErrorResponse),
        (status = 502, description = "Payment provider failed", body = crate::error::ErrorResponse)
    )
)]
pub async fn renew_session(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Payment>> {
    let payment = state.services.payments.renew_session(&claims, id).await?;
    Ok(Json(payment))
}

/// Checkout success redirect; marks the payment paid
#[utoipa::path(
    get,
    path = "/payments/success",
    tag = "payments",
    params(
        ("session_id" = String, Query, description = "Checkout session ID")
    ),
    responses(
        (status = 200, description = "Payment recorded", body = PaymentSuccessResponse),
        (status = 404, description = "Unknown session", body = crate::error::ErrorResponse)
    )
)]
pub async fn payment_success(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
) -> AppResult<Json<PaymentSuccessResponse>> {
    state.services.payments.confirm(&query.session_id).await?;

    Ok(Json(PaymentSuccessResponse {
        success: "Payment was successfully performed".to_string(),
    }))
}

/// Checkout cancel redirect; the payment stays open
#[utoipa::path(
    get,
    path = "/payments/cancel",
    tag = "payments",
    params(
        ("session_id" = String, Query, description = "Checkout session ID")
    ),
    responses(
        (status = 200, description = "Payment left open", body = PaymentCancelResponse),
        (status = 404, description = "Unknown session", body = crate::error::ErrorResponse)
    )
)]
pub async fn payment_cancel(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
) -> AppResult<Json<PaymentCancelResponse>> {
    state.services.payments.cancelled(&query.session_id).await?;

    Ok(Json(PaymentCancelResponse {
        message: "Oops, something went wrong, try again later".to_string(),
    }))
}
