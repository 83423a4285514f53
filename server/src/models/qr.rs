use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ticket::PaymentStatus;

/// Which table a QR token belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Ticket,
    Subscription,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Ticket => "ticket",
            EntityKind::Subscription => "subscription",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: Uuid,
}

impl EntityRef {
    pub fn ticket(id: Uuid) -> Self {
        Self {
            kind: EntityKind::Ticket,
            id,
        }
    }

    pub fn subscription(id: Uuid) -> Self {
        Self {
            kind: EntityKind::Subscription,
            id,
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// Descriptive record stored beside the token. Display and audit only: door
/// verification re-resolves the token instead of trusting these fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QrPayload {
    #[serde(rename = "type")]
    pub kind: EntityKind,
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub token: String,
    pub event_id: Option<Uuid>,
    /// Major currency units.
    pub amount: Decimal,
    pub valid_until: Option<DateTime<Utc>>,
}

impl QrPayload {
    pub fn build(subject: &QrSubject, user_name: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            kind: subject.kind,
            id: subject.id,
            user_id: subject.user_id,
            user_name: user_name.into(),
            token: token.into(),
            event_id: subject.event_id,
            amount: Decimal::new(subject.amount_cents, 2),
            valid_until: subject.valid_until,
        }
    }
}

/// The QR-relevant view shared by tickets and subscriptions.
#[derive(Debug, Clone)]
pub struct QrSubject {
    pub kind: EntityKind,
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Option<Uuid>,
    pub amount_cents: i64,
    pub status: PaymentStatus,
    pub qr_token: Option<String>,
    pub qr_payload: Option<QrPayload>,
    pub valid_until: Option<DateTime<Utc>>,
}

impl QrSubject {
    pub fn entity_ref(&self) -> EntityRef {
        EntityRef {
            kind: self.kind,
            id: self.id,
        }
    }

    /// The assigned token, if any. An empty string counts as unassigned.
    pub fn token(&self) -> Option<&str> {
        self.qr_token.as_deref().filter(|t| !t.is_empty())
    }

    pub fn needs_token(&self) -> bool {
        self.status.is_paid() && self.token().is_none()
    }
}
