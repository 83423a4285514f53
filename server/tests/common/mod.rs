//! Shared fixtures for router tests: in-memory stores, a stub payment
//! provider and helpers to mint tokens and send requests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use passgate_server::auth::JwtValidator;
use passgate_server::config::HttpConfig;
use passgate_server::models::{PaymentStatus, Profile, Role, Subscription, Ticket};
use passgate_server::payments::{
    CheckoutSession, CheckoutSessionRequest, PaymentError, PaymentProcessor,
};
use passgate_server::qr::{QrIssuer, QrLinks, RandomTokenGenerator};
use passgate_server::routes::create_routes;
use passgate_server::state::AppState;
use passgate_server::store::{InMemoryTicketStore, InMemoryUserDirectory};

pub const JWT_SECRET: &[u8] = b"router-test-secret";
pub const APP_URL: &str = "https://tickets.example.com";

/// Records every checkout it is asked to open.
#[derive(Default)]
pub struct StubPayments {
    pub sessions: Mutex<Vec<CheckoutSessionRequest>>,
    pub lookups: AtomicUsize,
}

impl StubPayments {
    pub fn session_count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }
}

#[async_trait]
impl PaymentProcessor for StubPayments {
    async fn find_customer_by_email(&self, _email: &str) -> Result<Option<String>, PaymentError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(None)
    }

    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        let mut sessions = self.sessions.lock().unwrap();
        sessions.push(request.clone());
        let id = format!("cs_test_{}", sessions.len());
        Ok(CheckoutSession {
            url: format!("https://checkout.stripe.com/c/pay/{id}"),
            id,
        })
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryTicketStore>,
    pub users: Arc<InMemoryUserDirectory>,
    pub payments: Arc<StubPayments>,
    pub auth: Arc<JwtValidator>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::build(true)
    }

    pub fn without_payments() -> Self {
        Self::build(false)
    }

    fn build(with_payments: bool) -> Self {
        let store = Arc::new(InMemoryTicketStore::new());
        let users = Arc::new(InMemoryUserDirectory::new());
        let payments = Arc::new(StubPayments::default());
        let auth = Arc::new(JwtValidator::new(JWT_SECRET));

        let issuer = QrIssuer::new(store.clone(), users.clone(), Arc::new(RandomTokenGenerator));
        let state = AppState {
            store: store.clone(),
            users: users.clone(),
            issuer,
            payments: with_payments.then(|| payments.clone() as Arc<dyn PaymentProcessor>),
            auth: auth.clone(),
            links: QrLinks::new(APP_URL, "https://api.qrserver.com/v1/create-qr-code/").unwrap(),
            public_app_url: APP_URL.to_string(),
        };

        Self {
            router: create_routes(state, &HttpConfig::default()),
            store,
            users,
            payments,
            auth,
        }
    }

    /// Register an approved user and return `(id, bearer token)`.
    pub async fn user(&self, name: &str, roles: &[Role]) -> (Uuid, String) {
        let id = Uuid::new_v4();
        let email = format!("{}@example.com", name.to_lowercase());
        self.users
            .insert_profile(Profile {
                id,
                email: Some(email.clone()),
                full_name: Some(name.to_string()),
                approval_status: Some("approved".to_string()),
            })
            .await;
        for role in roles {
            self.users.grant_role(id, *role).await;
        }
        let token = self
            .auth
            .issue(id, Some(&email), Duration::minutes(10))
            .unwrap();
        (id, token)
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        bearer: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if body.is_some() {
            builder = builder.header("content-type", "application/json");
        }
        if let Some(token) = bearer {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        let body = body
            .map(|v| Body::from(serde_json::to_vec(&v).unwrap()))
            .unwrap_or_else(Body::empty);

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            json!({})
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| json!({ "raw": String::from_utf8_lossy(&bytes) }))
        };
        (status, json)
    }
}

pub fn ticket_for(user_id: Uuid, status: &str, token: Option<&str>) -> Ticket {
    let now = Utc::now();
    Ticket {
        id: Uuid::new_v4(),
        user_id,
        event_id: Some(Uuid::new_v4()),
        amount_cents: 2_000,
        status: status.to_string(),
        qr_token: token.map(str::to_string),
        qr_code_data: None,
        stripe_session_id: None,
        affiliate_code: None,
        valid_until: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn paid_subscription_for(user_id: Uuid) -> Subscription {
    let now = Utc::now();
    Subscription {
        id: Uuid::new_v4(),
        user_id,
        pass_type: "30".to_string(),
        holder_name: Some("Grace".to_string()),
        instagram_handle: Some("@grace".to_string()),
        amount_cents: 3_000,
        status: PaymentStatus::PAID.to_string(),
        qr_token: None,
        qr_code_data: None,
        stripe_session_id: None,
        valid_until: Some(now + Duration::days(30)),
        created_at: now,
        updated_at: now,
    }
}
