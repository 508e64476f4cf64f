//! Payments repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::PaymentStatus,
        payment::{CheckoutSession, Payment},
    },
};

const PAYMENT_COLUMNS: &str =
    "p.id, p.status, p.borrowing_id, p.session_url, p.session_id, p.payment_amount, p.created_at";

#[derive(Clone)]
pub struct PaymentsRepository {
    pool: Pool<Postgres>,
}

impl PaymentsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get payment by ID together with the borrower's user ID
    pub async fn get_with_owner(&self, id: i32) -> AppResult<(Payment, i32)> {
        let payment = sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Payment with id {} not found", id)))?;

        let owner: i32 = sqlx::query_scalar("SELECT user_id FROM borrowings WHERE id = $1")
            .bind(payment.borrowing_id)
            .fetch_one(&self.pool)
            .await?;

        Ok((payment, owner))
    }

    /// List payments, optionally only those of one borrower
    pub async fn list(&self, user_id: Option<i32>) -> AppResult<Vec<Payment>> {
        let query = format!(
            r#"
            SELECT {PAYMENT_COLUMNS}
            FROM payments p
            JOIN borrowings b ON b.id = p.borrowing_id
            WHERE ($1::int IS NULL OR b.user_id = $1)
            ORDER BY p.created_at DESC, p.id DESC
            "#
        );
        let payments = sqlx::query_as::<_, Payment>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(payments)
    }

    /// Payments recorded for one borrowing, oldest first
    pub async fn list_for_borrowing(&self, borrowing_id: i32) -> AppResult<Vec<Payment>> {
        let payments = sqlx::query_as::<_, Payment>(
            "SELECT * FROM payments WHERE borrowing_id = $1 ORDER BY created_at, id",
        )
        .bind(borrowing_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(payments)
    }

    /// Store the provider session on a pending payment and mark it in process.
    ///
    /// A session is attached at most once, so the success redirect of the
    /// page the borrower was given always finds its payment.
    pub async fn attach_session(&self, id: i32, session: &CheckoutSession) -> AppResult<Payment> {
        sqlx::query_as::<_, Payment>(
            r#"
            UPDATE payments SET session_id = $2, session_url = $3, status = $4
            WHERE id = $1 AND status = $5
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&session.id)
        .bind(&session.url)
        .bind(PaymentStatus::InProcess)
        .bind(PaymentStatus::Pending)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| {
            AppError::Conflict(format!("Payment {} already has a checkout session", id))
        })
    }

    /// Flip the payment owning `session_id` to paid
    pub async fn mark_paid(&self, session_id: &str) -> AppResult<Payment> {
        sqlx::query_as::<_, Payment>(
            "UPDATE payments SET status = $2 WHERE session_id = $1 RETURNING *",
        )
        .bind(session_id)
        .bind(PaymentStatus::Paid)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No payment for session {}", session_id)))
    }

    /// Look up a payment by provider session
    pub async fn find_by_session(&self, session_id: &str) -> AppResult<Payment> {
        sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE session_id = $1")
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No payment for session {}", session_id)))
    }
}
