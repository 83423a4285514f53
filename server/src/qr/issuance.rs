use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use super::token::{TokenError, TokenGenerator};
use crate::models::user::display_name;
use crate::models::{EntityRef, QrPayload, QrSubject};
use crate::store::{StoreError, TicketStore, UserDirectory};

#[derive(Debug, Error)]
pub enum IssuanceError {
    #[error("{0} was not found")]
    NotFound(EntityRef),

    #[error("{0} is not paid")]
    NotPaid(EntityRef),

    #[error("token generation failed: {0}")]
    TokenGeneration(#[from] TokenError),

    #[error("failed to persist QR token: {0}")]
    Persistence(StoreError),

    #[error("failed to load {entity}: {source}")]
    Lookup {
        entity: EntityRef,
        source: StoreError,
    },
}

/// Result of an issuance call.
#[derive(Debug, Clone)]
pub struct Issued {
    pub entity: EntityRef,
    pub token: String,
    pub payload: QrPayload,
    /// `false` when the entity already carried a token and nothing was written.
    pub newly_issued: bool,
}

/// Issues QR tokens for paid tickets and subscriptions.
///
/// A row that already has a token is never rewritten. The write itself is
/// guarded on the token still being empty, so two concurrent callers for
/// the same row cannot both win; the loser discards its generated token and
/// reports the winner's.
#[derive(Clone)]
pub struct QrIssuer {
    store: Arc<dyn TicketStore>,
    users: Arc<dyn UserDirectory>,
    tokens: Arc<dyn TokenGenerator>,
}

impl QrIssuer {
    pub fn new(
        store: Arc<dyn TicketStore>,
        users: Arc<dyn UserDirectory>,
        tokens: Arc<dyn TokenGenerator>,
    ) -> Self {
        Self {
            store,
            users,
            tokens,
        }
    }

    pub fn store(&self) -> &Arc<dyn TicketStore> {
        &self.store
    }

    pub async fn issue(&self, entity: EntityRef) -> Result<Issued, IssuanceError> {
        let subject = self.load(entity).await?;
        self.issue_for(subject).await
    }

    pub async fn issue_for(&self, subject: QrSubject) -> Result<Issued, IssuanceError> {
        let entity = subject.entity_ref();

        if subject.token().is_some() {
            return self.existing(subject).await;
        }
        if !subject.status.is_paid() {
            return Err(IssuanceError::NotPaid(entity));
        }

        let user_name = self.user_name(&subject).await;
        let token = self.tokens.generate().await?;
        if token.is_empty() {
            return Err(TokenError::Empty.into());
        }
        let payload = QrPayload::build(&subject, user_name, token.as_str());

        let written = self
            .store
            .assign_qr_token(entity, &token, &payload)
            .await
            .map_err(IssuanceError::Persistence)?;

        if written {
            info!(entity = %entity, "Issued QR token");
            return Ok(Issued {
                entity,
                token,
                payload,
                newly_issued: true,
            });
        }

        // Guard did not match: another issuance got there first, the row is
        // no longer paid, or it went away. The token generated above is dropped.
        let current = self.load(entity).await?;
        if current.token().is_some() {
            info!(entity = %entity, "QR token already assigned concurrently; discarding generated token");
            return self.existing(current).await;
        }
        if !current.status.is_paid() {
            return Err(IssuanceError::NotPaid(entity));
        }
        Err(IssuanceError::Persistence(StoreError::Unavailable(format!(
            "{entity} changed during issuance"
        ))))
    }

    async fn load(&self, entity: EntityRef) -> Result<QrSubject, IssuanceError> {
        self.store
            .get_subject(entity)
            .await
            .map_err(|source| IssuanceError::Lookup { entity, source })?
            .ok_or(IssuanceError::NotFound(entity))
    }

    /// Report a token that is already stored. Rows tokenised before payloads
    /// existed get a payload rebuilt for display; it is not written back.
    async fn existing(&self, subject: QrSubject) -> Result<Issued, IssuanceError> {
        let entity = subject.entity_ref();
        let token = subject.token().unwrap_or_default().to_string();
        let payload = match subject.qr_payload.clone() {
            Some(payload) => payload,
            None => {
                let user_name = self.user_name(&subject).await;
                QrPayload::build(&subject, user_name, token.as_str())
            }
        };
        Ok(Issued {
            entity,
            token,
            payload,
            newly_issued: false,
        })
    }

    async fn user_name(&self, subject: &QrSubject) -> String {
        match self.users.get_profile(subject.user_id).await {
            Ok(profile) => display_name(profile.as_ref()),
            Err(e) => {
                warn!(user_id = %subject.user_id, error = %e, "Profile lookup failed; using fallback name");
                display_name(None)
            }
        }
    }
}
