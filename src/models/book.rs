//! Book catalog model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use super::enums::Cover;

/// Book record from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub cover: Cover,
    /// Number of copies currently available for borrowing
    pub inventory: i32,
    /// Fee charged per borrowed day
    #[schema(value_type = String, example = "0.77")]
    pub daily_fee: Decimal,
}

impl Book {
    pub fn is_available(&self) -> bool {
        self.inventory > 0
    }
}

impl std::fmt::Display for Book {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.title, self.author)
    }
}

/// Book list query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct BookQuery {
    /// Case-insensitive title search
    pub title: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl BookQuery {
    /// 1-based page, defaults to the first
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> i64 {
        self.per_page.unwrap_or(20).clamp(1, 100)
    }

    /// Pages past the end saturate instead of overflowing
    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.per_page())
    }
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, max = 100, message = "Title must be 1 to 100 characters"))]
    pub title: String,
    #[validate(length(min = 1, max = 100, message = "Author must be 1 to 100 characters"))]
    pub author: String,
    pub cover: Cover,
    #[validate(range(min = 0, message = "Inventory cannot be negative"))]
    pub inventory: i32,
    #[validate(custom(function = "validate_daily_fee"))]
    #[schema(value_type = String, example = "0.77")]
    pub daily_fee: Decimal,
}

/// Partial book update request
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, max = 100, message = "Title must be 1 to 100 characters"))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Author must be 1 to 100 characters"))]
    pub author: Option<String>,
    pub cover: Option<Cover>,
    #[validate(range(min = 0, message = "Inventory cannot be negative"))]
    pub inventory: Option<i32>,
    #[validate(custom(function = "validate_daily_fee"))]
    #[schema(value_type = Option<String>, example = "0.77")]
    pub daily_fee: Option<Decimal>,
}

/// NUMERIC(10, 2): non-negative, at most two decimals and eight integer digits
fn validate_daily_fee(fee: &Decimal) -> Result<(), ValidationError> {
    if fee.is_sign_negative() {
        return Err(ValidationError::new("negative_fee")
            .with_message("Daily fee cannot be negative".into()));
    }
    if fee.normalize().scale() > 2 {
        return Err(ValidationError::new("fee_precision")
            .with_message("Daily fee allows at most two decimal places".into()));
    }
    if *fee >= Decimal::from(100_000_000) {
        return Err(ValidationError::new("fee_range")
            .with_message("Daily fee is too large".into()));
    }
    Ok(())
}
