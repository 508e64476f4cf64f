//! Borrowing model, fee computation and lending rules

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use super::{book::Book, payment::Payment};
use crate::error::AppError;

/// Cents per currency unit
const CENTS: i64 = 100;

/// Borrowing record from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Borrowing {
    pub id: i32,
    pub borrow_date: NaiveDate,
    pub expected_return_date: NaiveDate,
    pub actual_return_date: Option<NaiveDate>,
    pub book_id: i32,
    pub user_id: i32,
    #[schema(value_type = Option<String>, example = "2.00")]
    pub penalty_for_delay: Option<Decimal>,
    /// True while the book has not been returned
    #[sqlx(skip)]
    #[serde(default)]
    pub is_active: bool,
}

impl Borrowing {
    /// Fill derived fields after loading a row
    pub fn with_derived(mut self) -> Self {
        self.is_active = self.actual_return_date.is_none();
        self
    }

    pub fn is_active(&self) -> bool {
        self.actual_return_date.is_none()
    }

    /// Amount due in cents, priced at the return date (or `today` while active).
    ///
    /// `100 * days borrowed * daily_fee`, plus `100 * days late * daily_fee * penalty`
    /// when returned after the expected date. A missing penalty rate counts as zero.
    /// The result is truncated toward zero.
    pub fn total_amount(&self, daily_fee: Decimal, today: NaiveDate) -> i64 {
        let returned = self.actual_return_date.unwrap_or(today);

        let borrowed_days = (returned - self.borrow_date).num_days().max(0);
        let mut total = Decimal::from(CENTS * borrowed_days) * daily_fee;

        if returned > self.expected_return_date {
            let late_days = (returned - self.expected_return_date).num_days();
            let penalty = self.penalty_for_delay.unwrap_or(Decimal::ZERO);
            total += Decimal::from(CENTS * late_days) * daily_fee * penalty;
        }

        total.trunc().to_i64().unwrap_or(i64::MAX)
    }
}

/// Borrowing with its book and payments, for the detail view
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BorrowingDetails {
    #[serde(flatten)]
    pub borrowing: Borrowing,
    pub book: Book,
    pub payments: Vec<Payment>,
    /// Amount due in cents if returned today (or the final amount once returned)
    pub total_amount: i64,
}

/// Borrowing list filters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct BorrowingQuery {
    /// Only open (`true`) or only returned (`false`) borrowings
    pub is_active: Option<bool>,
    /// Filter by borrower, honoured for staff only
    pub user_id: Option<i32>,
}

/// Create borrowing request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBorrowing {
    /// Book ID
    pub book: i32,
    pub expected_return_date: NaiveDate,
}

/// Fully resolved insert for a new borrowing
#[derive(Debug, Clone)]
pub struct NewBorrowing {
    pub book_id: i32,
    pub user_id: i32,
    pub borrow_date: NaiveDate,
    pub expected_return_date: NaiveDate,
    pub penalty_for_delay: Option<Decimal>,
}

/// A reason a borrowing cannot be created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LendingRule {
    BookUnavailable,
    ReturnDateNotInFuture,
    OutstandingPayment,
}

impl LendingRule {
    pub fn field(&self) -> &'static str {
        match self {
            LendingRule::BookUnavailable => "book",
            LendingRule::ReturnDateNotInFuture => "expected_return_date",
            LendingRule::OutstandingPayment => "payments",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            LendingRule::BookUnavailable => "Book is not available for borrowing.",
            LendingRule::ReturnDateNotInFuture => "Expected return date must be later than today.",
            LendingRule::OutstandingPayment => "You have to settle your existing payments first.",
        }
    }
}

impl From<LendingRule> for AppError {
    fn from(rule: LendingRule) -> Self {
        AppError::invalid_field(rule.field(), rule.message())
    }
}

/// Check the lending rules in order: stock, then date, then unpaid fees.
pub fn check_lending_rules(
    book: &Book,
    expected_return_date: NaiveDate,
    today: NaiveDate,
    outstanding_payments: i64,
) -> Result<(), LendingRule> {
    if !book.is_available() {
        return Err(LendingRule::BookUnavailable);
    }
    if expected_return_date <= today {
        return Err(LendingRule::ReturnDateNotInFuture);
    }
    if outstanding_payments > 0 {
        return Err(LendingRule::OutstandingPayment);
    }
    Ok(())
}
