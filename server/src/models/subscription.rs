use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use super::qr::{EntityKind, QrPayload, QrSubject};
use super::ticket::PaymentStatus;

/// A recurring or media pass. Carries the same QR fields as a ticket.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Subscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub pass_type: String,
    pub holder_name: Option<String>,
    pub instagram_handle: Option<String>,
    pub amount_cents: i64,
    pub status: String,
    pub qr_token: Option<String>,
    pub qr_code_data: Option<Json<QrPayload>>,
    pub stripe_session_id: Option<String>,
    pub valid_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    pub fn payment_status(&self) -> PaymentStatus {
        PaymentStatus::parse(&self.status)
    }
}

impl From<Subscription> for QrSubject {
    fn from(sub: Subscription) -> Self {
        QrSubject {
            kind: EntityKind::Subscription,
            id: sub.id,
            user_id: sub.user_id,
            event_id: None,
            amount_cents: sub.amount_cents,
            status: sub.payment_status(),
            qr_token: sub.qr_token,
            qr_payload: sub.qr_code_data.map(|Json(payload)| payload),
            valid_until: sub.valid_until,
        }
    }
}

/// Media pass tiers sold through the media-pass checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PassType {
    #[serde(rename = "30")]
    Standard,
    #[serde(rename = "150")]
    Premium,
}

impl PassType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PassType::Standard => "30",
            PassType::Premium => "150",
        }
    }

    /// Price in minor units. The tier tag is the dollar price.
    pub fn price_cents(&self) -> i64 {
        match self {
            PassType::Standard => 3_000,
            PassType::Premium => 15_000,
        }
    }

    pub fn product_name(&self) -> &'static str {
        match self {
            PassType::Standard => "Media Pass ($30)",
            PassType::Premium => "Media Pass ($150)",
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewSubscription {
    pub user_id: Uuid,
    pub pass_type: PassType,
    pub holder_name: String,
    pub instagram_handle: String,
    pub stripe_session_id: String,
}
