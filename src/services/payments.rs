//! Payment listing, checkout sessions and provider callbacks

use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::PaymentStatus,
        payment::{CheckoutRequest, Payment},
        user::UserClaims,
    },
    repository::Repository,
    services::checkout::PaymentGateway,
};

/// Placeholder the provider substitutes with the real session id
const SESSION_PLACEHOLDER: &str = "{CHECKOUT_SESSION_ID}";

#[derive(Clone)]
pub struct PaymentsService {
    repository: Repository,
    gateway: Arc<dyn PaymentGateway>,
    public_url: String,
}

/// Build the provider request for a payment on `product_name`
pub fn checkout_request(public_url: &str, payment: &Payment, product_name: &str) -> CheckoutRequest {
    let base = public_url.trim_end_matches('/');
    CheckoutRequest {
        amount: payment.payment_amount,
        product_name: product_name.to_string(),
        success_url: format!("{base}/api/v1/payments/success?session_id={SESSION_PLACEHOLDER}"),
        cancel_url: format!("{base}/api/v1/payments/cancel?session_id={SESSION_PLACEHOLDER}"),
    }
}

/// Only payments without a session may request one; an open session stays
/// the payment's single checkout page
pub fn ensure_renewable(payment: &Payment) -> AppResult<()> {
    match payment.status {
        PaymentStatus::Pending => Ok(()),
        PaymentStatus::InProcess => Err(AppError::Conflict(format!(
            "Payment {} already has a checkout session",
            payment.id
        ))),
        PaymentStatus::Paid => Err(AppError::Conflict(format!(
            "Payment {} is already settled",
            payment.id
        ))),
    }
}

impl PaymentsService {
    pub fn new(repository: Repository, gateway: Arc<dyn PaymentGateway>, public_url: &str) -> Self {
        Self {
            repository,
            gateway,
            public_url: public_url.to_string(),
        }
    }

    /// Payments visible to the caller, newest first
    pub async fn list(&self, claims: &UserClaims) -> AppResult<Vec<Payment>> {
        let owner = (!claims.is_staff).then_some(claims.user_id);
        self.repository.payments.list(owner).await
    }

    /// Other users' payments are reported as missing
    pub async fn get(&self, claims: &UserClaims, id: i32) -> AppResult<Payment> {
        let (payment, owner) = self.repository.payments.get_with_owner(id).await?;
        if !claims.can_access_user(owner) {
            return Err(AppError::NotFound(format!("Payment with id {} not found", id)));
        }
        Ok(payment)
    }

    /// Ask the provider for a checkout page and store it on the payment.
    ///
    /// Settled and zero-amount payments are returned unchanged.
    pub async fn open_session(&self, payment: &Payment, product_name: &str) -> AppResult<Payment> {
        if payment.status == PaymentStatus::Paid || payment.payment_amount == 0 {
            return Ok(payment.clone());
        }

        let request = checkout_request(&self.public_url, payment, product_name);
        let session = self.gateway.create_session(&request).await?;
        let payment = self.repository.payments.attach_session(payment.id, &session).await?;

        tracing::info!(
            payment_id = payment.id,
            session_id = %session.id,
            "Payment session opened"
        );
        Ok(payment)
    }

    /// Request the session a failed return could not open
    pub async fn renew_session(&self, claims: &UserClaims, id: i32) -> AppResult<Payment> {
        let payment = self.get(claims, id).await?;
        ensure_renewable(&payment)?;

        let borrowing = self.repository.borrowings.get_by_id(payment.borrowing_id).await?;
        let book = self.repository.books.get_by_id(borrowing.book_id).await?;

        self.open_session(&payment, &book.title).await
    }

    /// Provider success redirect; repeating it is harmless
    pub async fn confirm(&self, session_id: &str) -> AppResult<Payment> {
        let payment = self.repository.payments.mark_paid(session_id).await?;
        tracing::info!(payment_id = payment.id, "Payment confirmed");
        Ok(payment)
    }

    /// Provider cancel redirect; nothing changes
    pub async fn cancelled(&self, session_id: &str) -> AppResult<Payment> {
        let payment = self.repository.payments.find_by_session(session_id).await?;
        tracing::info!(payment_id = payment.id, "Payment cancelled by user");
        Ok(payment)
    }
}
