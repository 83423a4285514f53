use std::env;
use std::net::SocketAddr;

use thiserror::Error;

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::create_security_headers_layer;

const DEFAULT_PUBLIC_APP_URL: &str = "http://localhost:3000";
const DEFAULT_QR_IMAGE_ENDPOINT: &str = "https://api.qrserver.com/v1/create-qr-code/";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3001";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Settings for the router's outer layers.
#[derive(Debug, Clone, Default)]
pub struct HttpConfig {
    /// Comma separated. When unset only the public app origin is allowed.
    pub cors_allowed_origins: Option<String>,
    /// `RUST_ENV=production`; turns on HSTS.
    pub production: bool,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    /// HS256 secret the hosted auth platform signs access tokens with.
    pub auth_jwt_secret: String,
    /// Absent in environments that do not sell tickets; payment endpoints
    /// then answer with a configuration error.
    pub stripe_secret_key: Option<String>,
    pub public_app_url: String,
    pub qr_image_endpoint: String,
    pub bind_addr: SocketAddr,
    pub http: HttpConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from any variable source. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let require = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let bind_raw = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr: SocketAddr = bind_raw.parse().map_err(|_| ConfigError::Invalid {
            name: "BIND_ADDR",
            value: bind_raw.clone(),
        })?;

        let database_max_connections = match get("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                name: "DATABASE_MAX_CONNECTIONS",
                value: raw,
            })?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        Ok(Self {
            database_url: require("DATABASE_URL")?,
            database_max_connections,
            auth_jwt_secret: require("AUTH_JWT_SECRET")?,
            stripe_secret_key: get("STRIPE_SECRET_KEY"),
            public_app_url: get("PUBLIC_APP_URL")
                .unwrap_or_else(|| DEFAULT_PUBLIC_APP_URL.to_string()),
            qr_image_endpoint: get("QR_IMAGE_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_QR_IMAGE_ENDPOINT.to_string()),
            bind_addr,
            http: HttpConfig {
                cors_allowed_origins: get("CORS_ALLOWED_ORIGINS"),
                production: get("RUST_ENV")
                    .is_some_and(|v| v.trim().eq_ignore_ascii_case("production")),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_applied() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/passgate"),
            ("AUTH_JWT_SECRET", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.public_app_url, DEFAULT_PUBLIC_APP_URL);
        assert_eq!(config.qr_image_endpoint, DEFAULT_QR_IMAGE_ENDPOINT);
        assert_eq!(config.bind_addr.port(), 3001);
        assert_eq!(config.database_max_connections, 5);
        assert!(config.stripe_secret_key.is_none());
        assert!(config.http.cors_allowed_origins.is_none());
        assert!(!config.http.production);
    }

    #[test]
    fn test_http_settings_read_from_lookup() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/passgate"),
            ("AUTH_JWT_SECRET", "secret"),
            ("CORS_ALLOWED_ORIGINS", "https://a.example.com,https://b.example.com"),
            ("RUST_ENV", "Production"),
        ]))
        .unwrap();
        assert_eq!(
            config.http.cors_allowed_origins.as_deref(),
            Some("https://a.example.com,https://b.example.com")
        );
        assert!(config.http.production);
    }

    #[test]
    fn test_missing_required_variable() {
        let err = Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/passgate")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Missing("AUTH_JWT_SECRET")));
    }

    #[test]
    fn test_blank_stripe_key_is_unset() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/passgate"),
            ("AUTH_JWT_SECRET", "secret"),
            ("STRIPE_SECRET_KEY", "  "),
        ]))
        .unwrap();
        assert!(config.stripe_secret_key.is_none());
    }

    #[test]
    fn test_invalid_bind_addr() {
        let err = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/passgate"),
            ("AUTH_JWT_SECRET", "secret"),
            ("BIND_ADDR", "nowhere"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "BIND_ADDR", .. }));
    }
}
