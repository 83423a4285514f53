//! Checkout sessions with the payment provider.

pub mod initiation;
mod stripe;

pub use initiation::{
    start_media_pass_checkout, start_ticket_checkout, CheckoutRedirects, MediaPassCheckout,
    TicketCheckout, MINIMUM_TICKET_AMOUNT_CENTS,
};
pub use stripe::StripeClient;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("payment provider is not configured")]
    NotConfigured,

    #[error("payment provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("payment provider returned {status}: {message}")]
    Provider { status: u16, message: String },

    #[error("could not read payment provider response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Who the checkout session is billed to.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutCustomer {
    /// A customer the provider already knows.
    Existing(String),
    /// Let the provider create a customer from this email.
    Email(String),
    Anonymous,
}

/// A single-line-item checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutSessionRequest {
    pub amount_cents: i64,
    pub currency: String,
    pub product_name: String,
    pub customer: CheckoutCustomer,
    pub success_url: String,
    pub cancel_url: String,
    pub metadata: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Id of an existing customer with this email, if any.
    async fn find_customer_by_email(&self, email: &str) -> Result<Option<String>, PaymentError>;

    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, PaymentError>;
}
