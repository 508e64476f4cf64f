//! Payment model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use super::enums::PaymentStatus;

/// Payment record from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Payment {
    pub id: i32,
    pub status: PaymentStatus,
    pub borrowing_id: i32,
    /// Hosted checkout page for this payment
    pub session_url: Option<String>,
    pub session_id: Option<String>,
    /// Amount in cents
    pub payment_amount: i64,
    pub created_at: DateTime<Utc>,
}

/// Query carried by provider redirects
#[derive(Debug, Deserialize, IntoParams)]
pub struct SessionQuery {
    pub session_id: String,
}

/// Checkout session requested from the payment provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    /// Amount in cents
    pub amount: i64,
    pub product_name: String,
    pub success_url: String,
    pub cancel_url: String,
}

/// Session handle returned by the payment provider
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}
