use std::sync::Arc;

use crate::auth::JwtValidator;
use crate::payments::{PaymentError, PaymentProcessor};
use crate::qr::{QrIssuer, QrLinks};
use crate::store::{TicketStore, UserDirectory};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TicketStore>,
    pub users: Arc<dyn UserDirectory>,
    pub issuer: QrIssuer,
    /// `None` when no payment secret is configured.
    pub payments: Option<Arc<dyn PaymentProcessor>>,
    pub auth: Arc<JwtValidator>,
    pub links: QrLinks,
    pub public_app_url: String,
}

impl AppState {
    pub fn payments(&self) -> Result<&dyn PaymentProcessor, PaymentError> {
        self.payments.as_deref().ok_or(PaymentError::NotConfigured)
    }
}
