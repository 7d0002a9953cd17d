//! Cross-origin policy for browser clients.
//!
//! The CORS layer sits outside the rate limiter and the auth middleware, so a
//! preflight `OPTIONS` is answered without a bearer token and every
//! rejection still carries the CORS headers a browser needs to read it.
//!
//! A `*` origin list allows any origin without credentials. An explicit list
//! echoes matching origins and allows credentials.
use anyhow::{Result, bail};
use axum::http::{HeaderName, HeaderValue, Method, header};
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};

pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(12 * 60 * 60);
const ANY_ORIGIN: &str = "*";

const ALLOWED_METHODS: [Method; 6] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::OPTIONS,
];

const ALLOWED_HEADERS: [HeaderName; 7] = [
    header::ORIGIN,
    header::CONTENT_TYPE,
    header::CONTENT_LENGTH,
    header::ACCEPT,
    header::ACCEPT_ENCODING,
    header::AUTHORIZATION,
    HeaderName::from_static("x-requested-with"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsSettings {
    pub allowed_origins: Vec<String>,
    pub max_age: Duration,
}

impl Default for CorsSettings {
    fn default() -> Self {
        Self {
            allowed_origins: vec![ANY_ORIGIN.to_string()],
            max_age: DEFAULT_MAX_AGE,
        }
    }
}

impl CorsSettings {
    /// Parse a comma-separated origin list such as `LABGATE_CORS_ORIGINS`.
    pub fn parse_origins(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|origin| origin == ANY_ORIGIN)
    }

    pub fn validate(&self) -> Result<()> {
        if self.allowed_origins.is_empty() {
            bail!("cors origin list must not be empty; use \"*\" to allow any origin");
        }
        if self.allows_any_origin() {
            return Ok(());
        }
        for origin in &self.allowed_origins {
            if HeaderValue::from_str(origin).is_err() {
                bail!("invalid cors origin {origin:?}");
            }
        }
        Ok(())
    }

    pub fn layer(&self) -> CorsLayer {
        let layer = CorsLayer::new()
            .allow_methods(ALLOWED_METHODS)
            .allow_headers(ALLOWED_HEADERS)
            .expose_headers([header::CONTENT_LENGTH])
            .max_age(self.max_age);
        if self.allows_any_origin() {
            return layer.allow_origin(AllowOrigin::any());
        }
        let origins: Vec<HeaderValue> = self
            .allowed_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(%origin, "skipping invalid cors origin");
                    None
                }
            })
            .collect();
        layer
            .allow_origin(AllowOrigin::list(origins))
            .allow_credentials(true)
    }
}
