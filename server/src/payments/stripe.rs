use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use super::{CheckoutCustomer, CheckoutSession, CheckoutSessionRequest, PaymentError, PaymentProcessor};

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

#[derive(Clone)]
pub struct StripeClient {
    http: reqwest::Client,
    api_key: String,
    api_base: String,
}

impl StripeClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, STRIPE_API_BASE)
    }

    pub fn with_base_url(api_key: impl Into<String>, api_base: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            api_base: api_base.into(),
        }
    }

    async fn read<T: for<'de> Deserialize<'de>>(resp: reqwest::Response) -> Result<T, PaymentError> {
        let status = resp.status();
        let raw = resp.text().await?;
        if status != StatusCode::OK {
            return Err(provider_error(status, &raw));
        }
        Ok(serde_json::from_str(&raw)?)
    }
}

#[derive(Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
}

fn provider_error(status: StatusCode, raw: &str) -> PaymentError {
    let message = serde_json::from_str::<StripeErrorBody>(raw)
        .ok()
        .and_then(|body| body.error.message)
        .unwrap_or_else(|| "<no error message>".to_string());
    PaymentError::Provider {
        status: status.as_u16(),
        message,
    }
}

#[derive(Deserialize)]
struct CustomerList {
    data: Vec<CustomerId>,
}

#[derive(Deserialize)]
struct CustomerId {
    id: String,
}

#[derive(Deserialize)]
struct SessionResponse {
    id: String,
    url: Option<String>,
}

/// Form fields for `POST /v1/checkout/sessions`.
pub(crate) fn session_params(request: &CheckoutSessionRequest) -> Vec<(String, String)> {
    let mut params = vec![
        ("mode".to_string(), "payment".to_string()),
        ("line_items[0][quantity]".to_string(), "1".to_string()),
        (
            "line_items[0][price_data][currency]".to_string(),
            request.currency.clone(),
        ),
        (
            "line_items[0][price_data][unit_amount]".to_string(),
            request.amount_cents.to_string(),
        ),
        (
            "line_items[0][price_data][product_data][name]".to_string(),
            request.product_name.clone(),
        ),
        ("success_url".to_string(), request.success_url.clone()),
        ("cancel_url".to_string(), request.cancel_url.clone()),
    ];

    match &request.customer {
        CheckoutCustomer::Existing(id) => params.push(("customer".to_string(), id.clone())),
        CheckoutCustomer::Email(email) => {
            params.push(("customer_email".to_string(), email.clone()))
        }
        CheckoutCustomer::Anonymous => {}
    }

    for (key, value) in &request.metadata {
        params.push((format!("metadata[{}]", key), value.clone()));
    }
    params
}

#[async_trait]
impl PaymentProcessor for StripeClient {
    async fn find_customer_by_email(&self, email: &str) -> Result<Option<String>, PaymentError> {
        let resp = self
            .http
            .get(format!("{}/customers", self.api_base))
            .basic_auth(&self.api_key, Some(""))
            .query(&[("email", email), ("limit", "1")])
            .send()
            .await?;

        let customers: CustomerList = Self::read(resp).await?;
        Ok(customers.data.into_iter().next().map(|c| c.id))
    }

    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        let resp = self
            .http
            .post(format!("{}/checkout/sessions", self.api_base))
            .basic_auth(&self.api_key, Some(""))
            .form(&session_params(request))
            .send()
            .await?;

        let session: SessionResponse = Self::read(resp).await?;
        let url = session.url.ok_or_else(|| PaymentError::Provider {
            status: StatusCode::OK.as_u16(),
            message: format!("checkout session {} has no hosted url", session.id),
        })?;
        Ok(CheckoutSession {
            id: session.id,
            url,
        })
    }
}
