use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use super::qr::{EntityKind, QrPayload, QrSubject};

/// Payment state of a ticket or pass row.
///
/// Rows carry the raw status text; anything other than `pending` or `paid`
/// (refunded, cancelled, ...) is kept as `Other`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentStatus {
    Pending,
    Paid,
    Other(String),
}

impl PaymentStatus {
    pub const PENDING: &'static str = "pending";
    pub const PAID: &'static str = "paid";

    pub fn parse(raw: &str) -> Self {
        match raw {
            Self::PENDING => PaymentStatus::Pending,
            Self::PAID => PaymentStatus::Paid,
            other => PaymentStatus::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PaymentStatus::Pending => Self::PENDING,
            PaymentStatus::Paid => Self::PAID,
            PaymentStatus::Other(raw) => raw,
        }
    }

    pub fn is_paid(&self) -> bool {
        matches!(self, PaymentStatus::Paid)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Ticket {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Option<Uuid>,
    pub amount_cents: i64,
    pub status: String,
    pub qr_token: Option<String>,
    pub qr_code_data: Option<Json<QrPayload>>,
    pub stripe_session_id: Option<String>,
    pub affiliate_code: Option<String>,
    pub valid_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    pub fn payment_status(&self) -> PaymentStatus {
        PaymentStatus::parse(&self.status)
    }
}

impl From<Ticket> for QrSubject {
    fn from(ticket: Ticket) -> Self {
        QrSubject {
            kind: EntityKind::Ticket,
            id: ticket.id,
            user_id: ticket.user_id,
            event_id: ticket.event_id,
            amount_cents: ticket.amount_cents,
            status: ticket.payment_status(),
            qr_token: ticket.qr_token,
            qr_payload: ticket.qr_code_data.map(|Json(payload)| payload),
            valid_until: ticket.valid_until,
        }
    }
}

/// A ticket row created when checkout starts, before the payment webhook
/// flips it to `paid`.
#[derive(Debug, Clone)]
pub struct NewTicket {
    pub user_id: Uuid,
    pub event_id: Option<Uuid>,
    pub amount_cents: i64,
    pub stripe_session_id: String,
    pub affiliate_code: Option<String>,
}
