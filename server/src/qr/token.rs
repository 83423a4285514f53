use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token generator call failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("token generator returned an empty token")]
    Empty,

    #[error("token generator unavailable: {0}")]
    Unavailable(String),
}

/// Source of fresh, unique QR tokens.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenGenerator: Send + Sync {
    async fn generate(&self) -> Result<String, TokenError>;
}

/// Delegates to the `generate_qr_token()` database function, which checks
/// candidates against both token columns before returning.
#[derive(Clone)]
pub struct PgTokenGenerator {
    pool: PgPool,
}

impl PgTokenGenerator {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenGenerator for PgTokenGenerator {
    async fn generate(&self) -> Result<String, TokenError> {
        let token: Option<String> = sqlx::query_scalar("SELECT generate_qr_token()")
            .fetch_one(&self.pool)
            .await?;
        token.filter(|t| !t.is_empty()).ok_or(TokenError::Empty)
    }
}

/// 128 random bits rendered as 32 lowercase hex characters.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomTokenGenerator;

#[async_trait]
impl TokenGenerator for RandomTokenGenerator {
    async fn generate(&self) -> Result<String, TokenError> {
        Ok(Uuid::new_v4().simple().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[tokio::test]
    async fn test_random_tokens_are_distinct_hex() {
        let generator = RandomTokenGenerator;
        let mut seen = HashSet::new();
        for _ in 0..1_000 {
            let token = generator.generate().await.unwrap();
            assert_eq!(token.len(), 32);
            assert!(token.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
            assert!(seen.insert(token));
        }
    }
}
