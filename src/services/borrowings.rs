//! Lending workflow: borrow, return, overdue reminders

use chrono::{Days, NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::{
    error::{AppError, AppResult},
    models::{
        borrowing::{Borrowing, BorrowingDetails, BorrowingQuery, CreateBorrowing, NewBorrowing},
        user::UserClaims,
    },
    repository::{borrowings::ReturnedBorrowing, Repository},
    services::{
        notifications::{
            borrowing_created_message, borrowing_returned_message, overdue_message,
            NotificationService,
        },
        payments::PaymentsService,
    },
};

#[derive(Clone)]
pub struct BorrowingsService {
    repository: Repository,
    payments: PaymentsService,
    notifications: NotificationService,
    penalty_for_delay: Option<Decimal>,
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Readers only ever see their own borrowings; staff may filter by user
pub fn scope_query(claims: &UserClaims, query: BorrowingQuery) -> BorrowingQuery {
    if claims.is_staff {
        query
    } else {
        BorrowingQuery {
            user_id: Some(claims.user_id),
            ..query
        }
    }
}

impl BorrowingsService {
    pub fn new(
        repository: Repository,
        payments: PaymentsService,
        notifications: NotificationService,
        penalty_for_delay: Option<Decimal>,
    ) -> Self {
        Self {
            repository,
            payments,
            notifications,
            penalty_for_delay,
        }
    }

    pub async fn list(&self, claims: &UserClaims, query: BorrowingQuery) -> AppResult<Vec<Borrowing>> {
        self.repository.borrowings.list(&scope_query(claims, query)).await
    }

    /// Borrowing with its book, payments and current amount due
    pub async fn get(&self, claims: &UserClaims, id: i32) -> AppResult<BorrowingDetails> {
        let borrowing = self.repository.borrowings.get_by_id(id).await?;
        if !claims.can_access_user(borrowing.user_id) {
            return Err(AppError::NotFound(format!("Borrowing with id {} not found", id)));
        }

        let book = self.repository.books.get_by_id(borrowing.book_id).await?;
        let payments = self.repository.payments.list_for_borrowing(id).await?;
        let total_amount = borrowing.total_amount(book.daily_fee, today());

        Ok(BorrowingDetails {
            borrowing,
            book,
            payments,
            total_amount,
        })
    }

    /// Lend a copy to the caller
    pub async fn create(&self, claims: &UserClaims, request: CreateBorrowing) -> AppResult<Borrowing> {
        let new = NewBorrowing {
            book_id: request.book,
            user_id: claims.user_id,
            borrow_date: today(),
            expected_return_date: request.expected_return_date,
            penalty_for_delay: self.penalty_for_delay,
        };

        let (borrowing, book) = self.repository.borrowings.create(&new).await?;

        tracing::info!(
            borrowing_id = borrowing.id,
            book_id = book.id,
            user_id = borrowing.user_id,
            inventory = book.inventory,
            "Book borrowed"
        );
        self.notifications
            .notify(borrowing_created_message(&book, &borrowing));

        Ok(borrowing)
    }

    /// Close a borrowing and bill it.
    ///
    /// The return is committed before the provider is contacted; a failed
    /// session request leaves the payment pending.
    pub async fn return_borrowing(&self, id: i32) -> AppResult<ReturnedBorrowing> {
        let mut returned = self.repository.borrowings.return_borrowing(id, today()).await?;

        match self.payments.open_session(&returned.payment, &returned.book.title).await {
            Ok(payment) => returned.payment = payment,
            Err(e) => tracing::error!(
                payment_id = returned.payment.id,
                "Failed to open payment session: {}",
                e
            ),
        }

        tracing::info!(
            borrowing_id = returned.borrowing.id,
            amount = returned.payment.payment_amount,
            "Book returned"
        );
        self.notifications.notify(borrowing_returned_message(
            &returned.book,
            &returned.borrowing,
            returned.payment.payment_amount,
        ));

        Ok(returned)
    }

    /// Remind about every open borrowing due by tomorrow; returns how many
    pub async fn run_overdue_sweep(&self) -> AppResult<usize> {
        let until = today()
            .checked_add_days(Days::new(1))
            .ok_or_else(|| AppError::Internal("Date out of range".to_string()))?;

        let due = self.repository.borrowings.due_by(until).await?;
        for overdue in &due {
            self.notifications.notify(overdue_message(overdue));
        }

        tracing::info!(count = due.len(), "Overdue sweep finished");
        Ok(due.len())
    }
}
