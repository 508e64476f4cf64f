//! Hosted checkout sessions (Stripe Checkout)

use async_trait::async_trait;

use crate::{
    config::PaymentsConfig,
    error::{AppError, AppResult},
    models::payment::{CheckoutRequest, CheckoutSession},
};

/// Creates a payment page the borrower is redirected to
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_session(&self, request: &CheckoutRequest) -> AppResult<CheckoutSession>;
}

pub struct StripeGateway {
    client: reqwest::Client,
    api_url: String,
    secret_key: Option<String>,
    currency: String,
}

impl StripeGateway {
    pub fn new(config: &PaymentsConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.stripe_api_url.trim_end_matches('/').to_string(),
            secret_key: config.stripe_secret_key.clone().filter(|k| !k.is_empty()),
            currency: config.currency.clone(),
        }
    }
}

/// Form body for `POST /v1/checkout/sessions`: one line item of quantity 1
pub fn session_form(request: &CheckoutRequest, currency: &str) -> Vec<(&'static str, String)> {
    vec![
        ("mode", "payment".to_string()),
        ("line_items[0][price_data][currency]", currency.to_string()),
        (
            "line_items[0][price_data][product_data][name]",
            request.product_name.clone(),
        ),
        ("line_items[0][price_data][unit_amount]", request.amount.to_string()),
        ("line_items[0][quantity]", "1".to_string()),
        ("success_url", request.success_url.clone()),
        ("cancel_url", request.cancel_url.clone()),
    ]
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_session(&self, request: &CheckoutRequest) -> AppResult<CheckoutSession> {
        let key = self
            .secret_key
            .as_deref()
            .ok_or_else(|| AppError::Provider("Payment provider is not configured".to_string()))?;

        let session = self
            .client
            .post(format!("{}/v1/checkout/sessions", self.api_url))
            .bearer_auth(key)
            .form(&session_form(request, &self.currency))
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| AppError::Provider(format!("Checkout session request failed: {}", e)))?
            .json::<CheckoutSession>()
            .await
            .map_err(|e| AppError::Provider(format!("Invalid checkout session response: {}", e)))?;

        tracing::debug!(session_id = %session.id, amount = request.amount, "Checkout session created");
        Ok(session)
    }
}
