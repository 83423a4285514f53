use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use super::{CheckoutCustomer, CheckoutSessionRequest, PaymentProcessor};
use crate::auth::AuthUser;
use crate::models::{NewSubscription, NewTicket, PassType};
use crate::store::TicketStore;
use crate::utils::error::AppError;

/// $10.00
pub const MINIMUM_TICKET_AMOUNT_CENTS: i64 = 1_000;
const CURRENCY: &str = "usd";
const TICKET_PRODUCT_NAME: &str = "Event Ticket";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketCheckout {
    pub amount: Option<i64>,
    pub affiliate_code: Option<String>,
    pub event_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaPassCheckout {
    pub pass_type: Option<PassType>,
    pub name: Option<String>,
    pub instagram_handle: Option<String>,
}

/// Where the provider sends the buyer afterwards, rooted at the origin the
/// request came from.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutRedirects {
    pub success_url: String,
    pub cancel_url: String,
}

impl CheckoutRedirects {
    pub fn new(origin: &str, cancel_path: &str) -> Self {
        let origin = origin.trim_end_matches('/');
        Self {
            success_url: format!("{origin}/payment-success?session_id={{CHECKOUT_SESSION_ID}}"),
            cancel_url: format!("{origin}{cancel_path}"),
        }
    }
}

pub fn validate_amount(amount: Option<i64>) -> Result<i64, AppError> {
    match amount {
        None => Err(AppError::ValidationError("Amount is required".to_string())),
        Some(cents) if cents < MINIMUM_TICKET_AMOUNT_CENTS => Err(AppError::ValidationError(
            format!("Amount must be at least {MINIMUM_TICKET_AMOUNT_CENTS} cents"),
        )),
        Some(cents) => Ok(cents),
    }
}

fn required_text(value: Option<String>, field: &str) -> Result<String, AppError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::ValidationError(format!("{field} is required")))
}

async fn resolve_customer(
    processor: &dyn PaymentProcessor,
    email: Option<&str>,
) -> Result<CheckoutCustomer, AppError> {
    let Some(email) = email else {
        return Ok(CheckoutCustomer::Anonymous);
    };
    Ok(match processor.find_customer_by_email(email).await? {
        Some(id) => CheckoutCustomer::Existing(id),
        None => CheckoutCustomer::Email(email.to_string()),
    })
}

fn base_metadata(user: &AuthUser) -> Vec<(String, String)> {
    let mut metadata = vec![("user_id".to_string(), user.id.to_string())];
    if let Some(email) = &user.email {
        metadata.push(("email".to_string(), email.clone()));
    }
    metadata
}

/// Validate, open a checkout session and record a pending ticket linked to
/// it. Returns the hosted checkout URL.
pub async fn start_ticket_checkout(
    processor: &dyn PaymentProcessor,
    store: &dyn TicketStore,
    user: &AuthUser,
    origin: &str,
    checkout: TicketCheckout,
) -> Result<String, AppError> {
    let amount_cents = validate_amount(checkout.amount)?;
    let affiliate_code = checkout
        .affiliate_code
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());

    let customer = resolve_customer(processor, user.email.as_deref()).await?;
    let redirects = CheckoutRedirects::new(origin, "/tickets");

    let mut metadata = base_metadata(user);
    metadata.push(("kind".to_string(), "ticket".to_string()));
    if let Some(code) = &affiliate_code {
        metadata.push(("affiliate_code".to_string(), code.clone()));
    }
    if let Some(event_id) = checkout.event_id {
        metadata.push(("event_id".to_string(), event_id.to_string()));
    }

    let session = processor
        .create_checkout_session(&CheckoutSessionRequest {
            amount_cents,
            currency: CURRENCY.to_string(),
            product_name: TICKET_PRODUCT_NAME.to_string(),
            customer,
            success_url: redirects.success_url,
            cancel_url: redirects.cancel_url,
            metadata,
        })
        .await?;

    let ticket = store
        .create_pending_ticket(NewTicket {
            user_id: user.id,
            event_id: checkout.event_id,
            amount_cents,
            stripe_session_id: session.id.clone(),
            affiliate_code,
        })
        .await?;

    info!(ticket_id = %ticket.id, session_id = %session.id, amount_cents, "Started ticket checkout");
    Ok(session.url)
}

/// Media pass variant: fixed price per pass tier, pending subscription row.
pub async fn start_media_pass_checkout(
    processor: &dyn PaymentProcessor,
    store: &dyn TicketStore,
    user: &AuthUser,
    origin: &str,
    checkout: MediaPassCheckout,
) -> Result<String, AppError> {
    let pass_type = checkout
        .pass_type
        .ok_or_else(|| AppError::ValidationError("passType must be \"30\" or \"150\"".to_string()))?;
    let holder_name = required_text(checkout.name, "name")?;
    let instagram_handle = required_text(checkout.instagram_handle, "instagramHandle")?;

    let customer = resolve_customer(processor, user.email.as_deref()).await?;
    let redirects = CheckoutRedirects::new(origin, "/media-pass");

    let mut metadata = base_metadata(user);
    metadata.extend([
        ("kind".to_string(), "media_pass".to_string()),
        ("pass_type".to_string(), pass_type.as_str().to_string()),
        ("name".to_string(), holder_name.clone()),
        ("instagram_handle".to_string(), instagram_handle.clone()),
    ]);

    let session = processor
        .create_checkout_session(&CheckoutSessionRequest {
            amount_cents: pass_type.price_cents(),
            currency: CURRENCY.to_string(),
            product_name: pass_type.product_name().to_string(),
            customer,
            success_url: redirects.success_url,
            cancel_url: redirects.cancel_url,
            metadata,
        })
        .await?;

    let subscription = store
        .create_pending_subscription(NewSubscription {
            user_id: user.id,
            pass_type,
            holder_name,
            instagram_handle,
            stripe_session_id: session.id.clone(),
        })
        .await?;

    info!(subscription_id = %subscription.id, session_id = %session.id, pass_type = pass_type.as_str(), "Started media pass checkout");
    Ok(session.url)
}
