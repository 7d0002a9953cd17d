use crate::gateway::client_key::ClientKeySource;
use crate::gateway::cors::CorsSettings;
use anyhow::{Context, Result, bail};
use labgate_authz::{
    DEFAULT_ACCESS_TTL, DEFAULT_BURST, DEFAULT_ISSUER, DEFAULT_RATE_PER_SECOND,
    DEFAULT_REFRESH_TTL, DEFAULT_SWEEP_INTERVAL, RateLimitSettings, TokenSettings,
};
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

// Gateway configuration sourced from environment variables, optionally
// overridden by a YAML file.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub bind_addr: SocketAddr,
    pub metrics_bind: SocketAddr,
    pub tokens: TokenSettings,
    pub rate_limit: RateLimitSettings,
    pub client_keys: ClientKeySource,
    pub cors: CorsSettings,
}

#[derive(Debug, Deserialize)]
struct GatewayConfigOverride {
    bind_addr: Option<String>,
    metrics_bind: Option<String>,
    jwt_secret: Option<String>,
    jwt_issuer: Option<String>,
    access_ttl_secs: Option<u64>,
    refresh_ttl_secs: Option<u64>,
    leeway_secs: Option<u64>,
    rate_limit_rps: Option<f64>,
    rate_limit_burst: Option<u32>,
    rate_limit_sweep_secs: Option<u64>,
    client_key_source: Option<ClientKeySource>,
    cors_origins: Option<Vec<String>>,
    cors_max_age_secs: Option<u64>,
}

impl GatewayConfig {
    /// Read `LABGATE_*` variables. The result is not validated; call
    /// [`GatewayConfig::validate`] or use [`GatewayConfig::from_env_or_yaml`].
    pub fn from_env() -> Result<Self> {
        let bind_addr = std::env::var("LABGATE_BIND")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()
            .with_context(|| "parse LABGATE_BIND")?;
        let metrics_bind = std::env::var("LABGATE_METRICS_BIND")
            .unwrap_or_else(|_| "0.0.0.0:9090".to_string())
            .parse()
            .with_context(|| "parse LABGATE_METRICS_BIND")?;

        let secret = std::env::var("LABGATE_JWT_SECRET").unwrap_or_default();
        let issuer =
            std::env::var("LABGATE_JWT_ISSUER").unwrap_or_else(|_| DEFAULT_ISSUER.to_string());
        let mut tokens = TokenSettings::new(secret, issuer);
        tokens.access_ttl = env_secs("LABGATE_JWT_ACCESS_TTL_SECS", DEFAULT_ACCESS_TTL)?;
        tokens.refresh_ttl = env_secs("LABGATE_JWT_REFRESH_TTL_SECS", DEFAULT_REFRESH_TTL)?;
        tokens.leeway = env_secs("LABGATE_JWT_LEEWAY_SECS", Duration::ZERO)?;

        let rate_limit = RateLimitSettings {
            rate_per_second: env_parse("LABGATE_RATE_LIMIT_RPS", DEFAULT_RATE_PER_SECOND)?,
            burst: env_parse("LABGATE_RATE_LIMIT_BURST", DEFAULT_BURST)?,
            sweep_interval: env_secs("LABGATE_RATE_LIMIT_SWEEP_SECS", DEFAULT_SWEEP_INTERVAL)?,
        };
        let client_keys = match std::env::var("LABGATE_RATE_LIMIT_KEY") {
            Ok(value) => value
                .parse()
                .map_err(anyhow::Error::msg)
                .with_context(|| "parse LABGATE_RATE_LIMIT_KEY")?,
            Err(_) => ClientKeySource::default(),
        };
        let mut cors = CorsSettings::default();
        if let Ok(value) = std::env::var("LABGATE_CORS_ORIGINS") {
            cors.allowed_origins = CorsSettings::parse_origins(&value);
        }
        cors.max_age = env_secs("LABGATE_CORS_MAX_AGE_SECS", cors.max_age)?;

        Ok(Self {
            bind_addr,
            metrics_bind,
            tokens,
            rate_limit,
            client_keys,
            cors,
        })
    }

    pub fn from_env_or_yaml() -> Result<Self> {
        let mut config = Self::from_env()?;
        if let Ok(path) = std::env::var("LABGATE_CONFIG") {
            let contents =
                fs::read_to_string(&path).with_context(|| format!("read LABGATE_CONFIG: {path}"))?;
            let override_cfg: GatewayConfigOverride =
                serde_yaml::from_str(&contents).with_context(|| "parse gateway config yaml")?;
            config.apply(override_cfg)?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tokens.secret.is_empty() {
            bail!("LABGATE_JWT_SECRET must be set");
        }
        self.tokens.validate().context("token settings")?;
        self.rate_limit.validate().context("rate limit settings")?;
        self.cors.validate().context("cors settings")?;
        Ok(())
    }

    fn apply(&mut self, override_cfg: GatewayConfigOverride) -> Result<()> {
        if let Some(value) = override_cfg.bind_addr {
            self.bind_addr = value.parse().with_context(|| "parse bind_addr")?;
        }
        if let Some(value) = override_cfg.metrics_bind {
            self.metrics_bind = value.parse().with_context(|| "parse metrics_bind")?;
        }
        if let Some(value) = override_cfg.jwt_secret {
            self.tokens.secret = value;
        }
        if let Some(value) = override_cfg.jwt_issuer {
            self.tokens.issuer = value;
        }
        if let Some(value) = override_cfg.access_ttl_secs {
            self.tokens.access_ttl = Duration::from_secs(value);
        }
        if let Some(value) = override_cfg.refresh_ttl_secs {
            self.tokens.refresh_ttl = Duration::from_secs(value);
        }
        if let Some(value) = override_cfg.leeway_secs {
            self.tokens.leeway = Duration::from_secs(value);
        }
        if let Some(value) = override_cfg.rate_limit_rps {
            self.rate_limit.rate_per_second = value;
        }
        if let Some(value) = override_cfg.rate_limit_burst {
            self.rate_limit.burst = value;
        }
        if let Some(value) = override_cfg.rate_limit_sweep_secs {
            self.rate_limit.sweep_interval = Duration::from_secs(value);
        }
        if let Some(value) = override_cfg.client_key_source {
            self.client_keys = value;
        }
        if let Some(value) = override_cfg.cors_origins {
            self.cors.allowed_origins = value;
        }
        if let Some(value) = override_cfg.cors_max_age_secs {
            self.cors.max_age = Duration::from_secs(value);
        }
        Ok(())
    }
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(value) => value.trim().parse().with_context(|| format!("parse {key}")),
        Err(_) => Ok(default),
    }
}

fn env_secs(key: &str, default: Duration) -> Result<Duration> {
    env_parse(key, default.as_secs()).map(Duration::from_secs)
}
