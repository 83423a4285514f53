use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use super::{StoreError, TicketStore, UserDirectory};
use crate::models::{
    EntityKind, EntityRef, NewSubscription, NewTicket, Profile, QrPayload, QrSubject, Role,
    RoleSet, Subscription, Ticket,
};

const TICKET_COLUMNS: &str = "id, user_id, event_id, amount_cents, status, qr_token, qr_code_data, \
     stripe_session_id, affiliate_code, valid_until, created_at, updated_at";

const SUBSCRIPTION_COLUMNS: &str = "id, user_id, pass_type, holder_name, instagram_handle, \
     amount_cents, status, qr_token, qr_code_data, stripe_session_id, valid_until, created_at, \
     updated_at";

fn table(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Ticket => "tickets",
        EntityKind::Subscription => "subscriptions",
    }
}

#[derive(Clone)]
pub struct PgTicketStore {
    pool: PgPool,
}

impl PgTicketStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn ticket_by_id(&self, id: Uuid) -> Result<Option<Ticket>, StoreError> {
        let sql = format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE id = $1");
        Ok(sqlx::query_as::<_, Ticket>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn ticket_by_token(&self, token: &str) -> Result<Option<Ticket>, StoreError> {
        let sql = format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE qr_token = $1");
        Ok(sqlx::query_as::<_, Ticket>(&sql)
            .bind(token)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn subscription_by_id(&self, id: Uuid) -> Result<Option<Subscription>, StoreError> {
        let sql = format!("SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE id = $1");
        Ok(sqlx::query_as::<_, Subscription>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn subscription_by_token(&self, token: &str) -> Result<Option<Subscription>, StoreError> {
        let sql = format!("SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE qr_token = $1");
        Ok(sqlx::query_as::<_, Subscription>(&sql)
            .bind(token)
            .fetch_optional(&self.pool)
            .await?)
    }
}

#[async_trait]
impl TicketStore for PgTicketStore {
    async fn get_subject(&self, entity: EntityRef) -> Result<Option<QrSubject>, StoreError> {
        let subject = match entity.kind {
            EntityKind::Ticket => self.ticket_by_id(entity.id).await?.map(QrSubject::from),
            EntityKind::Subscription => self
                .subscription_by_id(entity.id)
                .await?
                .map(QrSubject::from),
        };
        Ok(subject)
    }

    async fn assign_qr_token(
        &self,
        entity: EntityRef,
        token: &str,
        payload: &QrPayload,
    ) -> Result<bool, StoreError> {
        let sql = format!(
            "UPDATE {} SET qr_token = $1, qr_code_data = $2, updated_at = NOW() \
             WHERE id = $3 AND status = 'paid' AND (qr_token IS NULL OR qr_token = '')",
            table(entity.kind)
        );
        let result = sqlx::query(&sql)
            .bind(token)
            .bind(Json(payload))
            .bind(entity.id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn list_unresolved_paid(&self) -> Result<Vec<EntityRef>, StoreError> {
        let mut unresolved = Vec::new();
        for kind in [EntityKind::Ticket, EntityKind::Subscription] {
            let sql = format!(
                "SELECT id FROM {} WHERE status = 'paid' AND (qr_token IS NULL OR qr_token = '') \
                 ORDER BY created_at",
                table(kind)
            );
            let ids: Vec<Uuid> = sqlx::query_scalar(&sql).fetch_all(&self.pool).await?;
            unresolved.extend(ids.into_iter().map(|id| EntityRef { kind, id }));
        }
        Ok(unresolved)
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<QrSubject>, StoreError> {
        if token.is_empty() {
            return Ok(None);
        }
        if let Some(ticket) = self.ticket_by_token(token).await? {
            return Ok(Some(ticket.into()));
        }
        Ok(self
            .subscription_by_token(token)
            .await?
            .map(QrSubject::from))
    }

    async fn create_pending_ticket(&self, ticket: NewTicket) -> Result<Ticket, StoreError> {
        let sql = format!(
            "INSERT INTO tickets (id, user_id, event_id, amount_cents, status, stripe_session_id, affiliate_code) \
             VALUES ($1, $2, $3, $4, 'pending', $5, $6) RETURNING {TICKET_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Ticket>(&sql)
            .bind(Uuid::new_v4())
            .bind(ticket.user_id)
            .bind(ticket.event_id)
            .bind(ticket.amount_cents)
            .bind(&ticket.stripe_session_id)
            .bind(&ticket.affiliate_code)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn create_pending_subscription(
        &self,
        subscription: NewSubscription,
    ) -> Result<Subscription, StoreError> {
        let sql = format!(
            "INSERT INTO subscriptions (id, user_id, pass_type, holder_name, instagram_handle, amount_cents, status, stripe_session_id) \
             VALUES ($1, $2, $3, $4, $5, $6, 'pending', $7) RETURNING {SUBSCRIPTION_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Subscription>(&sql)
            .bind(Uuid::new_v4())
            .bind(subscription.user_id)
            .bind(subscription.pass_type.as_str())
            .bind(&subscription.holder_name)
            .bind(&subscription.instagram_handle)
            .bind(subscription.pass_type.price_cents())
            .bind(&subscription.stripe_session_id)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn delete_ticket(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM tickets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(Clone)]
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>, StoreError> {
        Ok(sqlx::query_as::<_, Profile>(
            "SELECT id, email, full_name, approval_status FROM profiles WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn get_roles(&self, user_id: Uuid) -> Result<RoleSet, StoreError> {
        let tags: Vec<String> = sqlx::query_scalar("SELECT role FROM user_roles WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        let roles = tags.iter().filter_map(|tag| match tag.parse::<Role>() {
            Ok(role) => Some(role),
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Ignoring unrecognised role tag");
                None
            }
        });
        Ok(RoleSet::new(roles))
    }
}
