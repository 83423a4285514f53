//! Row builders shared by unit tests.

use chrono::Utc;
use uuid::Uuid;

use crate::models::{PaymentStatus, Profile, Subscription, Ticket};

pub fn ticket(status: &str, token: Option<&str>) -> Ticket {
    let now = Utc::now();
    Ticket {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        event_id: Some(Uuid::new_v4()),
        amount_cents: 2_500,
        status: status.to_string(),
        qr_token: token.map(str::to_string),
        qr_code_data: None,
        stripe_session_id: Some("cs_test_fixture".to_string()),
        affiliate_code: None,
        valid_until: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn paid_ticket() -> Ticket {
    ticket(PaymentStatus::PAID, None)
}

pub fn subscription(status: &str, token: Option<&str>) -> Subscription {
    let now = Utc::now();
    Subscription {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        pass_type: "30".to_string(),
        holder_name: Some("Grace Hopper".to_string()),
        instagram_handle: Some("@grace".to_string()),
        amount_cents: 3_000,
        status: status.to_string(),
        qr_token: token.map(str::to_string),
        qr_code_data: None,
        stripe_session_id: None,
        valid_until: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn profile(id: Uuid, full_name: Option<&str>, email: Option<&str>) -> Profile {
    Profile {
        id,
        email: email.map(str::to_string),
        full_name: full_name.map(str::to_string),
        approval_status: Some("approved".to_string()),
    }
}
