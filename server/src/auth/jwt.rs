use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AuthError;

/// Audience the auth platform stamps on signed-in user tokens.
pub const AUTHENTICATED_AUDIENCE: &str = "authenticated";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub aud: String,
    pub exp: i64,
    #[serde(default)]
    pub iat: i64,
    #[serde(default)]
    pub email: Option<String>,
}

pub struct JwtValidator {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtValidator {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[AUTHENTICATED_AUDIENCE]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Mint a user token. The platform does this in production; local tools
    /// and tests use it to act as a signed-in user.
    pub fn issue(
        &self,
        user_id: Uuid,
        email: Option<&str>,
        ttl: Duration,
    ) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            aud: AUTHENTICATED_AUDIENCE.to_string(),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
            email: email.map(str::to_string),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(AuthError::InvalidToken)
    }

    pub fn validate(&self, token: &str) -> Result<(Uuid, Option<String>), AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(AuthError::InvalidToken)?;
        let user_id = Uuid::parse_str(&data.claims.sub).map_err(|_| AuthError::InvalidSubject)?;
        Ok((user_id, data.claims.email))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_validate() {
        let validator = JwtValidator::new(b"test-secret");
        let user_id = Uuid::new_v4();

        let token = validator
            .issue(user_id, Some("ada@example.com"), Duration::minutes(5))
            .unwrap();
        let (id, email) = validator.validate(&token).unwrap();

        assert_eq!(id, user_id);
        assert_eq!(email.as_deref(), Some("ada@example.com"));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let issuer = JwtValidator::new(b"one-secret");
        let validator = JwtValidator::new(b"another-secret");
        let token = issuer
            .issue(Uuid::new_v4(), None, Duration::minutes(5))
            .unwrap();

        assert!(matches!(
            validator.validate(&token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let validator = JwtValidator::new(b"test-secret");
        let token = validator
            .issue(Uuid::new_v4(), None, Duration::hours(-2))
            .unwrap();

        assert!(validator.validate(&token).is_err());
    }

    #[test]
    fn test_non_uuid_subject_is_rejected() {
        let validator = JwtValidator::new(b"test-secret");
        let claims = Claims {
            sub: "service-role".to_string(),
            aud: AUTHENTICATED_AUDIENCE.to_string(),
            exp: (Utc::now() + Duration::minutes(5)).timestamp(),
            iat: Utc::now().timestamp(),
            email: None,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        assert!(matches!(
            validator.validate(&token),
            Err(AuthError::InvalidSubject)
        ));
    }
}
