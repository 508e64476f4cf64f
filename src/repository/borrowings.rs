//! Borrowings repository: lending transactions and queries

use chrono::NaiveDate;
use sqlx::{Pool, Postgres, Row};

use crate::{
    error::{AppError, AppResult},
    models::{
        book::Book,
        borrowing::{check_lending_rules, Borrowing, BorrowingQuery, LendingRule, NewBorrowing},
        enums::PaymentStatus,
        payment::Payment,
    },
};

/// Open borrowing due soon, joined with what the reminder needs
#[derive(Debug, Clone)]
pub struct OverdueBorrowing {
    pub borrowing_id: i32,
    pub user_email: String,
    pub book_title: String,
    pub expected_return_date: NaiveDate,
}

/// Result of a committed return
#[derive(Debug, Clone)]
pub struct ReturnedBorrowing {
    pub borrowing: Borrowing,
    pub book: Book,
    pub payment: Payment,
}

#[derive(Clone)]
pub struct BorrowingsRepository {
    pool: Pool<Postgres>,
}

impl BorrowingsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get borrowing by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Borrowing> {
        sqlx::query_as::<_, Borrowing>("SELECT * FROM borrowings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Borrowing::with_derived)
            .ok_or_else(|| AppError::NotFound(format!("Borrowing with id {} not found", id)))
    }

    /// List borrowings; `user_id` must already be restricted for non-staff callers
    pub async fn list(&self, query: &BorrowingQuery) -> AppResult<Vec<Borrowing>> {
        let rows = sqlx::query_as::<_, Borrowing>(
            r#"
            SELECT * FROM borrowings
            WHERE ($1::int IS NULL OR user_id = $1)
              AND ($2::bool IS NULL OR (actual_return_date IS NULL) = $2)
            ORDER BY user_id, borrow_date, id
            "#,
        )
        .bind(query.user_id)
        .bind(query.is_active)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Borrowing::with_derived).collect())
    }

    /// Create a borrowing and take one copy out of stock, atomically.
    ///
    /// The book row stays locked until commit so concurrent borrowers
    /// observe the decremented inventory.
    pub async fn create(&self, new: &NewBorrowing) -> AppResult<(Borrowing, Book)> {
        let mut tx = self.pool.begin().await?;

        let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1 FOR UPDATE")
            .bind(new.book_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::invalid_field("book", "Invalid book id."))?;

        let outstanding: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM payments p
            JOIN borrowings b ON b.id = p.borrowing_id
            WHERE b.user_id = $1 AND p.status IN ($2, $3)
            "#,
        )
        .bind(new.user_id)
        .bind(PaymentStatus::Pending)
        .bind(PaymentStatus::InProcess)
        .fetch_one(&mut *tx)
        .await?;

        check_lending_rules(&book, new.expected_return_date, new.borrow_date, outstanding)?;

        let borrowing = sqlx::query_as::<_, Borrowing>(
            r#"
            INSERT INTO borrowings (borrow_date, expected_return_date, book_id, user_id, penalty_for_delay)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(new.borrow_date)
        .bind(new.expected_return_date)
        .bind(new.book_id)
        .bind(new.user_id)
        .bind(new.penalty_for_delay)
        .fetch_one(&mut *tx)
        .await?;

        let book = sqlx::query_as::<_, Book>(
            "UPDATE books SET inventory = inventory - 1 WHERE id = $1 AND inventory > 0 RETURNING *",
        )
        .bind(new.book_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::from(LendingRule::BookUnavailable))?;

        tx.commit().await?;

        Ok((borrowing.with_derived(), book))
    }

    /// Close a borrowing, restock its book and record the amount due, atomically.
    pub async fn return_borrowing(&self, id: i32, today: NaiveDate) -> AppResult<ReturnedBorrowing> {
        let mut tx = self.pool.begin().await?;

        let closed = sqlx::query_as::<_, Borrowing>(
            r#"
            UPDATE borrowings SET actual_return_date = $2
            WHERE id = $1 AND actual_return_date IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(today)
        .fetch_optional(&mut *tx)
        .await?;

        let borrowing = match closed {
            Some(borrowing) => borrowing.with_derived(),
            None => {
                let exists: bool =
                    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM borrowings WHERE id = $1)")
                        .bind(id)
                        .fetch_one(&mut *tx)
                        .await?;
                return Err(if exists {
                    AppError::Validation("This borrowing is closed already.".to_string())
                } else {
                    AppError::NotFound(format!("Borrowing with id {} not found", id))
                });
            }
        };

        let book = sqlx::query_as::<_, Book>(
            "UPDATE books SET inventory = inventory + 1 WHERE id = $1 RETURNING *",
        )
        .bind(borrowing.book_id)
        .fetch_one(&mut *tx)
        .await?;

        let amount = borrowing.total_amount(book.daily_fee, today);
        let status = if amount > 0 {
            PaymentStatus::Pending
        } else {
            PaymentStatus::Paid
        };

        let payment = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (status, borrowing_id, payment_amount)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(status)
        .bind(borrowing.id)
        .bind(amount)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(ReturnedBorrowing {
            borrowing,
            book,
            payment,
        })
    }

    /// Open borrowings expected back on or before `until`
    pub async fn due_by(&self, until: NaiveDate) -> AppResult<Vec<OverdueBorrowing>> {
        let rows = sqlx::query(
            r#"
            SELECT b.id, b.expected_return_date, u.email, bk.title
            FROM borrowings b
            JOIN users u ON u.id = b.user_id
            JOIN books bk ON bk.id = b.book_id
            WHERE b.expected_return_date <= $1 AND b.actual_return_date IS NULL
            ORDER BY b.expected_return_date, b.id
            "#,
        )
        .bind(until)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|r| OverdueBorrowing {
                borrowing_id: r.get("id"),
                user_email: r.get("email"),
                book_title: r.get("title"),
                expected_return_date: r.get("expected_return_date"),
            })
            .collect())
    }
}
