//! Access to the managed Postgres database.
//!
//! Handlers and the QR workflow only see the two narrow traits below; the
//! `Pg*` types talk to the real database and the `InMemory*` types back
//! local development and tests.

mod memory;
mod postgres;

pub use memory::{InMemoryTicketStore, InMemoryUserDirectory};
pub use postgres::{PgTicketStore, PgUserDirectory};

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    EntityRef, NewSubscription, NewTicket, Profile, QrPayload, QrSubject, RoleSet, Subscription,
    Ticket,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Load the QR view of a ticket or subscription.
    async fn get_subject(&self, entity: EntityRef) -> Result<Option<QrSubject>, StoreError>;

    /// Write token and payload in one update, only if the row has no token
    /// yet. Returns `false` when the guard did not match (row missing or a
    /// token already assigned).
    async fn assign_qr_token(
        &self,
        entity: EntityRef,
        token: &str,
        payload: &QrPayload,
    ) -> Result<bool, StoreError>;

    /// Paid rows whose token is null or empty, tickets and subscriptions.
    async fn list_unresolved_paid(&self) -> Result<Vec<EntityRef>, StoreError>;

    async fn find_by_token(&self, token: &str) -> Result<Option<QrSubject>, StoreError>;

    async fn create_pending_ticket(&self, ticket: NewTicket) -> Result<Ticket, StoreError>;

    async fn create_pending_subscription(
        &self,
        subscription: NewSubscription,
    ) -> Result<Subscription, StoreError>;

    /// Returns `false` when no ticket had that id.
    async fn delete_ticket(&self, id: Uuid) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>, StoreError>;

    async fn get_roles(&self, user_id: Uuid) -> Result<RoleSet, StoreError>;
}
