use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{StoreError, TicketStore, UserDirectory};
use crate::models::{
    EntityKind, EntityRef, NewSubscription, NewTicket, PaymentStatus, Profile, QrPayload,
    QrSubject, Role, RoleSet, Subscription, Ticket,
};

/// In-memory ticket store for local development and tests.
///
/// Enforces the same guarded write and token uniqueness as the Postgres
/// schema. Writes can be made to fail per entity to exercise error paths.
#[derive(Default)]
pub struct InMemoryTicketStore {
    tickets: RwLock<HashMap<Uuid, Ticket>>,
    subscriptions: RwLock<HashMap<Uuid, Subscription>>,
    failing_writes: RwLock<HashSet<Uuid>>,
    fail_listing: AtomicBool,
}

impl InMemoryTicketStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_ticket(&self, ticket: Ticket) {
        self.tickets.write().await.insert(ticket.id, ticket);
    }

    pub async fn insert_subscription(&self, subscription: Subscription) {
        self.subscriptions
            .write()
            .await
            .insert(subscription.id, subscription);
    }

    pub async fn ticket(&self, id: Uuid) -> Option<Ticket> {
        self.tickets.read().await.get(&id).cloned()
    }

    pub async fn subscription(&self, id: Uuid) -> Option<Subscription> {
        self.subscriptions.read().await.get(&id).cloned()
    }

    pub async fn tickets(&self) -> Vec<Ticket> {
        self.tickets.read().await.values().cloned().collect()
    }

    /// Make every token write to `id` fail.
    pub async fn fail_writes_for(&self, id: Uuid) {
        self.failing_writes.write().await.insert(id);
    }

    pub async fn restore_writes_for(&self, id: Uuid) {
        self.failing_writes.write().await.remove(&id);
    }

    pub fn fail_listing(&self, fail: bool) {
        self.fail_listing.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl TicketStore for InMemoryTicketStore {
    async fn get_subject(&self, entity: EntityRef) -> Result<Option<QrSubject>, StoreError> {
        let subject = match entity.kind {
            EntityKind::Ticket => self.ticket(entity.id).await.map(QrSubject::from),
            EntityKind::Subscription => self.subscription(entity.id).await.map(QrSubject::from),
        };
        Ok(subject)
    }

    async fn assign_qr_token(
        &self,
        entity: EntityRef,
        token: &str,
        payload: &QrPayload,
    ) -> Result<bool, StoreError> {
        if self.failing_writes.read().await.contains(&entity.id) {
            return Err(StoreError::Unavailable(format!(
                "write to {} rejected",
                entity
            )));
        }
        // Both maps stay locked so the uniqueness check and the write are
        // one step, like the unique index in Postgres.
        let mut tickets = self.tickets.write().await;
        let mut subscriptions = self.subscriptions.write().await;

        let in_use = tickets.values().any(|t| t.qr_token.as_deref() == Some(token))
            || subscriptions
                .values()
                .any(|s| s.qr_token.as_deref() == Some(token));
        if in_use {
            return Err(StoreError::Unavailable(
                "duplicate key value violates unique constraint on qr_token".to_string(),
            ));
        }

        let now = Utc::now();
        let written = match entity.kind {
            EntityKind::Ticket => match tickets.get_mut(&entity.id) {
                Some(ticket) if QrSubject::from(ticket.clone()).needs_token() => {
                    ticket.qr_token = Some(token.to_string());
                    ticket.qr_code_data = Some(Json(payload.clone()));
                    ticket.updated_at = now;
                    true
                }
                _ => false,
            },
            EntityKind::Subscription => match subscriptions.get_mut(&entity.id) {
                Some(sub) if QrSubject::from(sub.clone()).needs_token() => {
                    sub.qr_token = Some(token.to_string());
                    sub.qr_code_data = Some(Json(payload.clone()));
                    sub.updated_at = now;
                    true
                }
                _ => false,
            },
        };
        Ok(written)
    }

    async fn list_unresolved_paid(&self) -> Result<Vec<EntityRef>, StoreError> {
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("listing rejected".to_string()));
        }

        let mut unresolved: Vec<EntityRef> = self
            .tickets
            .read()
            .await
            .values()
            .filter(|t| QrSubject::from((*t).clone()).needs_token())
            .map(|t| EntityRef::ticket(t.id))
            .collect();
        unresolved.extend(
            self.subscriptions
                .read()
                .await
                .values()
                .filter(|s| QrSubject::from((*s).clone()).needs_token())
                .map(|s| EntityRef::subscription(s.id)),
        );
        Ok(unresolved)
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<QrSubject>, StoreError> {
        if token.is_empty() {
            return Ok(None);
        }
        let ticket = self
            .tickets
            .read()
            .await
            .values()
            .find(|t| t.qr_token.as_deref() == Some(token))
            .cloned();
        if let Some(ticket) = ticket {
            return Ok(Some(ticket.into()));
        }
        Ok(self
            .subscriptions
            .read()
            .await
            .values()
            .find(|s| s.qr_token.as_deref() == Some(token))
            .cloned()
            .map(QrSubject::from))
    }

    async fn create_pending_ticket(&self, new: NewTicket) -> Result<Ticket, StoreError> {
        let now = Utc::now();
        let ticket = Ticket {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            event_id: new.event_id,
            amount_cents: new.amount_cents,
            status: PaymentStatus::PENDING.to_string(),
            qr_token: None,
            qr_code_data: None,
            stripe_session_id: Some(new.stripe_session_id),
            affiliate_code: new.affiliate_code,
            valid_until: None,
            created_at: now,
            updated_at: now,
        };
        self.insert_ticket(ticket.clone()).await;
        Ok(ticket)
    }

    async fn create_pending_subscription(
        &self,
        new: NewSubscription,
    ) -> Result<Subscription, StoreError> {
        let now = Utc::now();
        let subscription = Subscription {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            pass_type: new.pass_type.as_str().to_string(),
            holder_name: Some(new.holder_name),
            instagram_handle: Some(new.instagram_handle),
            amount_cents: new.pass_type.price_cents(),
            status: PaymentStatus::PENDING.to_string(),
            qr_token: None,
            qr_code_data: None,
            stripe_session_id: Some(new.stripe_session_id),
            valid_until: None,
            created_at: now,
            updated_at: now,
        };
        self.insert_subscription(subscription.clone()).await;
        Ok(subscription)
    }

    async fn delete_ticket(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.tickets.write().await.remove(&id).is_some())
    }
}

/// In-memory profiles and role assignments.
#[derive(Default)]
pub struct InMemoryUserDirectory {
    profiles: RwLock<HashMap<Uuid, Profile>>,
    roles: RwLock<HashMap<Uuid, Vec<Role>>>,
    fail_lookups: AtomicBool,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_profile(&self, profile: Profile) {
        self.profiles.write().await.insert(profile.id, profile);
    }

    pub async fn grant_role(&self, user_id: Uuid, role: Role) {
        self.roles.write().await.entry(user_id).or_default().push(role);
    }

    pub fn fail_lookups(&self, fail: bool) {
        self.fail_lookups.store(fail, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("user lookup rejected".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>, StoreError> {
        self.check_available()?;
        Ok(self.profiles.read().await.get(&user_id).cloned())
    }

    async fn get_roles(&self, user_id: Uuid) -> Result<RoleSet, StoreError> {
        self.check_available()?;
        let roles = self
            .roles
            .read()
            .await
            .get(&user_id)
            .cloned()
            .unwrap_or_default();
        Ok(RoleSet::new(roles))
    }
}
